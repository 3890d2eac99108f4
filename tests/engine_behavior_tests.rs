use chrono::NaiveDate;
use serde_json::json;
use timeline_rs::api::TimelineEngine;
use timeline_rs::core::{Event, EventKey, EventKind, RenderClassification, Viewport};
use timeline_rs::interaction::SelectionSet;
use timeline_rs::{TimelineEngineConfig, TimelineError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn day_start(day: NaiveDate) -> i64 {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

fn config() -> TimelineEngineConfig {
    TimelineEngineConfig::new(Viewport::new(960, 600))
}

#[test]
fn config_validation_rejects_bad_setups() {
    assert!(matches!(
        TimelineEngineConfig::new(Viewport::new(0, 600)).validate(),
        Err(TimelineError::InvalidViewport { .. })
    ));
    assert!(config().with_zoom_bounds(0.0, 10.0).validate().is_err());
    assert!(config().with_zoom_bounds(10.0, 1.0).validate().is_err());
    assert!(config().with_default_visible_seconds(0.0).validate().is_err());
    assert!(config().with_playhead_x(5_000.0).validate().is_err());
    assert!(config().validate().is_ok());
}

#[test]
fn config_round_trips_through_serde() {
    let config = config()
        .with_zoom_bounds(2.0, 200.0)
        .with_commit_debounce_ms(100);
    let json = serde_json::to_string(&config).expect("serialize");
    let restored: TimelineEngineConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(config, restored);
}

#[test]
fn controller_appears_once_the_first_day_loads() {
    let day = date(2024, 1, 15);
    let now = day_start(day) + 43_200;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    assert!(engine.zoom_pan().is_none());

    engine.begin_day_load(day);
    engine.insert_day(day, vec![]).expect("insert day");

    let controller = engine.zoom_pan().expect("controller after first day");
    assert_eq!(controller.committed().playhead, now);
}

#[test]
fn later_days_reproject_without_firing_the_commit_notification() {
    use std::cell::Cell;
    use std::rc::Rc;

    let monday = date(2024, 1, 15);
    let sunday = date(2024, 1, 14);
    let now = day_start(monday) + 43_200;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    engine.insert_day(monday, vec![]).expect("insert monday");

    let commits = Rc::new(Cell::new(0usize));
    let seen = Rc::clone(&commits);
    engine
        .zoom_pan_mut()
        .expect("controller")
        .set_on_commit(move |_| seen.set(seen.get() + 1));

    let playhead_before = engine.zoom_pan().expect("controller").committed().playhead;
    engine.insert_day(sunday, vec![]).expect("insert sunday");

    assert_eq!(commits.get(), 0);
    let controller = engine.zoom_pan().expect("controller");
    assert_eq!(controller.committed().playhead, playhead_before);
    assert_eq!(controller.domain().start, day_start(sunday));
}

#[test]
fn browser_lanes_aggregate_by_metadata_domain() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 2 * 86_400;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    let visit = |id: i64, offset: i64, domain: &str| {
        Event::new(EventKind::Browser, id, start + offset)
            .with_lane("browser")
            .with_label(domain)
            .with_metadata(json!({ "domain": domain }))
    };

    engine
        .insert_day(
            day,
            vec![
                visit(1, 32_400, "docs.example.com"),
                visit(2, 32_700, "docs.example.com"),
                visit(3, 33_000, "mail.example.com"),
            ],
        )
        .expect("insert day");

    let snapshot = engine.snapshot();
    let browser_lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "browser")
        .expect("browser lane");

    let groups = engine.lane_groups(browser_lane);
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().any(|group| group.merge_key == "docs.example.com"
        && group.merged_count == 2));
    assert!(groups.iter().any(|group| group.merge_key == "mail.example.com"));
}

#[test]
fn marker_kinds_only_collapse_overlapping_events() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 2 * 86_400;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    engine
        .insert_day(
            day,
            vec![
                Event::new(EventKind::Shell, 1, start + 1_000).with_lane("shell"),
                Event::new(EventKind::Shell, 2, start + 1_060).with_lane("shell"),
            ],
        )
        .expect("insert day");

    let snapshot = engine.snapshot();
    let shell_lane = snapshot
        .lanes
        .iter()
        .find(|lane| lane.key == "shell")
        .expect("shell lane");

    let groups = engine.lane_groups(shell_lane);
    assert_eq!(groups.len(), 2);
}

#[test]
fn classification_tracks_the_engine_zoom_level() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 43_200;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    let event = Event::new(EventKind::Activity, 1, start + 3_600)
        .with_duration(120.0)
        .with_lane("chrome");

    // No view established yet: everything is a marker.
    assert_eq!(engine.classify(&event), RenderClassification::Marker);

    engine.insert_day(day, vec![event.clone()]).expect("insert day");

    // 24h domain at the 3h default window: ~0.089 px/s, 120s -> ~10.7px.
    assert_eq!(engine.classify(&event), RenderClassification::Bar);

    // Zoom far out; the same event degrades back to a marker.
    let controller = engine.zoom_pan_mut().expect("controller");
    controller.zoom_by_factor(0.05, 0);
    assert_eq!(engine.classify(&event), RenderClassification::Marker);
}

#[test]
fn engine_tick_drives_the_controller_debounce() {
    let day = date(2024, 1, 15);
    let now = day_start(day) + 43_200;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");
    engine.insert_day(day, vec![]).expect("insert day");

    let controller = engine.zoom_pan_mut().expect("controller");
    let factor_applied = controller.zoom_by_factor(2.0, 1_000);
    assert!(factor_applied);

    assert!(engine.tick(1_100).is_none());
    assert!(engine.tick(1_150).is_some());
}

#[test]
fn eviction_keeps_the_domain_covering_the_committed_view() {
    let monday = date(2024, 1, 15);
    let tuesday = date(2024, 1, 16);
    let now = day_start(tuesday) + 43_200;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    engine.insert_day(monday, vec![]).expect("insert monday");
    engine.insert_day(tuesday, vec![]).expect("insert tuesday");

    // The view sits on tuesday; evicting tuesday must not strand it.
    engine.evict_day(tuesday).expect("evict tuesday");

    let controller = engine.zoom_pan().expect("controller");
    let domain = controller.domain();
    let committed = controller.committed();
    assert!(domain.start <= committed.visible_range.start);
    assert!(domain.end >= committed.visible_range.end);
}

#[test]
fn prune_selection_drops_keys_missing_from_the_universe() {
    let day = date(2024, 1, 15);
    let start = day_start(day);
    let now = start + 2 * 86_400;
    let mut engine = TimelineEngine::new(config(), now).expect("valid engine");

    engine
        .insert_day(
            day,
            vec![Event::new(EventKind::Git, 7, start + 3_600).with_lane("git")],
        )
        .expect("insert day");

    let mut selection = SelectionSet::new();
    selection.insert(EventKey::new(EventKind::Git, 7));
    selection.insert(EventKey::new(EventKind::Git, 8));

    engine.prune_selection(&mut selection);

    assert_eq!(selection.len(), 1);
    assert!(selection.contains(EventKey::new(EventKind::Git, 7)));
}
