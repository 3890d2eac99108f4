use chrono::NaiveDate;
use timeline_rs::TimelineEngineConfig;
use timeline_rs::api::MultiWindowDataModel;
use timeline_rs::core::{Event, EventKind, TimeRange, Viewport};

const DAY: i64 = 86_400;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn day_start(day: NaiveDate) -> i64 {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

fn config() -> TimelineEngineConfig {
    TimelineEngineConfig::new(Viewport::new(960, 600))
}

fn model() -> MultiWindowDataModel {
    MultiWindowDataModel::new(&config())
}

fn focus(id: i64, timestamp: i64, duration: f64, app: &str) -> Event {
    Event::new(EventKind::Activity, id, timestamp)
        .with_duration(duration)
        .with_lane(app)
        .with_label(app)
}

fn afk(id: i64, timestamp: i64, duration: f64) -> Event {
    Event::new(EventKind::Afk, id, timestamp)
        .with_duration(duration)
        .with_lane("afk")
}

#[test]
fn lanes_merge_case_insensitively_preferring_capitalized_names() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(
        day,
        vec![
            focus(1, start + 3_600, 300.0, "chrome"),
            focus(2, start + 4_200, 300.0, "Chrome"),
            focus(3, start + 4_800, 300.0, "CHROME"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("merged lane");

    assert_eq!(lane.count(), 3);
    assert_eq!(lane.display_name, "CHROME");
}

#[test]
fn display_name_resolution_is_deterministic_over_variants() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    // Lowercase seen first; the capitalized spelling still wins.
    model.insert_day(
        day,
        vec![
            focus(1, start + 3_600, 300.0, "code"),
            focus(2, start + 4_200, 300.0, "Code"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "code")
        .expect("merged lane");
    assert_eq!(lane.display_name, "Code");
}

#[test]
fn todays_events_are_capped_at_now_and_future_events_filtered() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 43_200; // noon
    let mut model = model();

    model.insert_day(
        day,
        vec![
            // Runs 11:00 -> 13:00; capped to end at noon.
            focus(1, start + 39_600, 7_200.0, "chrome"),
            // Starts at 13:00, after "now": filtered out.
            focus(2, start + 46_800, 600.0, "chrome"),
        ],
    );

    let snapshot = model.snapshot(now);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("chrome lane");

    assert_eq!(lane.count(), 1);
    assert!((lane.events[0].duration_or_zero() - 3_600.0).abs() <= 1e-9);
}

#[test]
fn past_day_events_are_never_capped() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(day, vec![focus(1, start + 39_600, 7_200.0, "chrome")]);

    // "Now" is two days later; the event keeps its full duration.
    let snapshot = model.snapshot(start + 2 * DAY + 100);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("chrome lane");
    assert!((lane.events[0].duration_or_zero() - 7_200.0).abs() <= 1e-9);
}

#[test]
fn future_dated_days_are_skipped_entirely() {
    let today = date(2024, 1, 15);
    let tomorrow = date(2024, 1, 16);
    let mut model = model();

    model.insert_day(
        tomorrow,
        vec![focus(1, day_start(tomorrow) + 3_600, 300.0, "chrome")],
    );

    let snapshot = model.snapshot(day_start(today) + 43_200);
    assert!(snapshot.lanes.iter().all(|lane| lane.key != "chrome"));
}

#[test]
fn events_are_clipped_to_their_day_boundaries() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(
        day,
        vec![
            // Crosses midnight into the next day: clipped at the boundary.
            focus(1, start + DAY - 600, 1_800.0, "chrome"),
            // Entirely on the next day: dropped.
            focus(2, start + DAY + 600, 300.0, "chrome"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("chrome lane");

    assert_eq!(lane.count(), 1);
    assert!(lane.events[0].duration_or_zero() <= 600.0);
}

#[test]
fn activity_spans_fill_gaps_between_afk_periods() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    // AFK 10:00 -> 10:30.
    model.insert_day(day, vec![afk(1, start + 36_000, 1_800.0)]);

    let snapshot = model.snapshot(start + 2 * DAY);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "activity")
        .expect("activity lane");

    assert_eq!(lane.count(), 2);
    assert_eq!(lane.events[0].timestamp, start);
    assert!((lane.events[0].duration_or_zero() - 36_000.0).abs() <= 1e-9);
    assert_eq!(lane.events[1].timestamp, start + 37_800);
}

#[test]
fn todays_activity_span_ends_at_now() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 43_200;
    let mut model = model();

    model.insert_day(day, vec![]);

    let snapshot = model.snapshot(now);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "activity")
        .expect("activity lane");

    assert_eq!(lane.count(), 1);
    assert!((lane.events[0].duration_or_zero() - 43_200.0).abs() <= 1e-9);
}

#[test]
fn tiny_activity_gaps_are_suppressed() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    // Two AFK periods separated by a 30s gap, below the 60s floor.
    model.insert_day(
        day,
        vec![afk(1, start, 36_000.0), afk(2, start + 36_030, DAY as f64)],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    assert!(snapshot.lanes.iter().all(|lane| lane.key != "activity"));
}

#[test]
fn noise_floor_drops_short_activity_events() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let config = config().with_min_event_duration_seconds(30.0);
    let mut model = MultiWindowDataModel::new(&config);

    model.insert_day(
        day,
        vec![
            focus(1, start + 3_600, 10.0, "chrome"),
            focus(2, start + 4_200, 300.0, "chrome"),
            // Non-activity kinds are not subject to the floor.
            Event::new(EventKind::Git, 3, start + 5_000).with_lane("git"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let chrome = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("chrome lane");
    assert_eq!(chrome.count(), 1);
    assert!(snapshot.lanes.iter().any(|lane| lane.key == "git"));
}

#[test]
fn domain_extends_as_days_load_and_loading_set_tracks_in_flight_days() {
    let monday = date(2024, 1, 15);
    let tuesday = date(2024, 1, 16);
    let mut model = model();

    model.begin_day_load(monday);
    model.begin_day_load(tuesday);
    assert!(model.is_loading(monday));

    model.insert_day(monday, vec![]);
    assert!(!model.is_loading(monday));
    assert!(model.is_loading(tuesday));

    let first_domain = model.domain().expect("domain after first day");
    assert_eq!(first_domain.start, day_start(monday));

    model.insert_day(tuesday, vec![]);
    let extended = model.domain().expect("domain after second day");
    assert_eq!(extended.start, day_start(monday));
    assert_eq!(extended.end, day_start(tuesday) + DAY - 1);

    let snapshot = model.snapshot(day_start(tuesday) + DAY);
    assert!(snapshot.loading_days.is_empty());
}

#[test]
fn eviction_never_shrinks_domain_below_the_visible_range() {
    let monday = date(2024, 1, 15);
    let tuesday = date(2024, 1, 16);
    let mut model = model();

    model.insert_day(monday, vec![]);
    model.insert_day(tuesday, vec![]);

    let visible = TimeRange::new(day_start(monday) + 3_600, day_start(monday) + 7_200);
    model.evict_day(tuesday, Some(visible));

    let domain = model.domain().expect("domain");
    assert_eq!(domain.start, day_start(monday));
    assert_eq!(domain.end, day_start(monday) + DAY - 1);

    // Evicting the last day keeps the protected range alive.
    model.evict_day(monday, Some(visible));
    assert_eq!(model.domain(), Some(visible));
}

#[test]
fn lanes_follow_the_pinned_dynamic_tail_ordering() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(
        day,
        vec![
            Event::new(EventKind::Git, 1, start + 3_600).with_lane("git"),
            focus(2, start + 3_600, 300.0, "code"),
            focus(3, start + 4_000, 300.0, "chrome"),
            focus(4, start + 4_400, 300.0, "chrome"),
            Event::new(EventKind::Session, 5, start + 3_600)
                .with_duration(1_800.0)
                .with_lane("sessions"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let keys: Vec<&str> = snapshot.lanes.iter().map(|lane| lane.key.as_str()).collect();

    // Pinned head (activity, sessions), dynamic by descending count
    // (chrome 2, code 1), fixed tail (git).
    assert_eq!(keys, vec!["activity", "sessions", "chrome", "code", "git"]);
}

#[test]
fn lane_color_comes_from_the_first_event() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(
        day,
        vec![
            focus(2, start + 4_200, 300.0, "chrome").with_color("#22d3ee"),
            focus(1, start + 3_600, 300.0, "chrome").with_color("#0ea5e9"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "chrome")
        .expect("chrome lane");
    assert_eq!(lane.color, "#0ea5e9");
}

#[test]
fn top_apps_rank_dynamic_lanes_by_total_duration() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    model.insert_day(
        day,
        vec![
            focus(1, start + 3_600, 600.0, "code"),
            focus(2, start + 6_000, 3_000.0, "chrome"),
            Event::new(EventKind::Git, 3, start + 7_000).with_lane("git"),
        ],
    );

    let snapshot = model.snapshot(start + 2 * DAY);
    let names: Vec<&str> = snapshot
        .top_apps
        .iter()
        .map(|app| app.lane_key.as_str())
        .collect();

    assert_eq!(names, vec!["chrome", "code"]);
    assert!((snapshot.top_apps[0].total_seconds - 3_000.0).abs() <= 1e-9);
}

#[test]
fn ongoing_sessions_run_up_to_now() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 43_200;
    let mut model = model();

    // A session that started at 10:00 and has not ended yet.
    model.insert_day(
        day,
        vec![Event::new(EventKind::Session, 1, start + 36_000).with_lane("sessions")],
    );

    let snapshot = model.snapshot(now);
    let lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "sessions")
        .expect("sessions lane");

    assert!((lane.events[0].duration_or_zero() - 7_200.0).abs() <= 1e-9);
}

#[test]
fn day_stats_report_breaks_and_longest_focus() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let mut model = model();

    // AFK 08:00 -> 08:30 splits the day into a 8h and a 15.5h block.
    model.insert_day(day, vec![afk(1, start + 28_800, 1_800.0)]);

    let snapshot = model.snapshot(start + 2 * DAY);
    let (stats_day, stats) = snapshot.day_stats[0];

    assert_eq!(stats_day, day);
    assert_eq!(stats.break_count, 1);
    assert!((stats.break_seconds - 1_800.0).abs() <= 1e-9);
    assert_eq!(stats.longest_focus_start, start + 30_600);
    assert!(stats.longest_focus_seconds > 28_800.0);
    assert!((stats.active_seconds + stats.break_seconds - (DAY - 1) as f64).abs() <= 2.0);
}
