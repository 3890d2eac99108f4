use timeline_rs::core::{
    ClassifyPolicy, Event, EventKind, RenderClassification, bar_width_px, classify_event,
};

fn span(duration_seconds: f64) -> Event {
    Event::new(EventKind::Activity, 1, 1_000)
        .with_duration(duration_seconds)
        .with_lane("firefox")
}

#[test]
fn classification_reacts_to_scale_changes() {
    let policy = ClassifyPolicy::default();
    let event = span(120.0);

    // 120s at 0.01 px/s projects to 1.2px: marker.
    assert_eq!(
        classify_event(&event, 0.01, policy),
        RenderClassification::Marker
    );
    // The same event at a 10x larger scale crosses the 6px floor: bar.
    assert_eq!(
        classify_event(&event, 0.1, policy),
        RenderClassification::Bar
    );
}

#[test]
fn short_durations_are_markers_at_any_scale() {
    let policy = ClassifyPolicy::default();
    let event = span(5.0);

    assert_eq!(
        classify_event(&event, 1_000.0, policy),
        RenderClassification::Marker
    );
}

#[test]
fn instantaneous_events_are_markers() {
    let policy = ClassifyPolicy::default();
    let event = Event::new(EventKind::Git, 1, 1_000).with_lane("git");

    assert_eq!(
        classify_event(&event, 1_000.0, policy),
        RenderClassification::Marker
    );
}

#[test]
fn duration_floor_is_checked_before_width() {
    let policy = ClassifyPolicy {
        min_duration_seconds: 10.0,
        min_width_px: 6.0,
    };

    // 9.9s would project to 99px, but misses the duration floor.
    assert_eq!(
        classify_event(&span(9.9), 10.0, policy),
        RenderClassification::Marker
    );
    assert_eq!(
        classify_event(&span(10.0), 10.0, policy),
        RenderClassification::Bar
    );
}

#[test]
fn degenerate_scale_degrades_to_marker() {
    let policy = ClassifyPolicy::default();
    let event = span(3_600.0);

    assert_eq!(
        classify_event(&event, 0.0, policy),
        RenderClassification::Marker
    );
    assert_eq!(
        classify_event(&event, f64::NAN, policy),
        RenderClassification::Marker
    );
}

#[test]
fn bar_width_is_clamped_to_the_pixel_floor() {
    let policy = ClassifyPolicy::default();

    // 60s at 0.05 px/s projects to 3px; clamped up to stay clickable.
    assert!((bar_width_px(&span(60.0), 0.05, policy) - 6.0).abs() <= 1e-9);
    // A wide bar keeps its real projection.
    assert!((bar_width_px(&span(600.0), 0.05, policy) - 30.0).abs() <= 1e-9);
}

#[test]
fn negative_durations_are_treated_as_zero() {
    let policy = ClassifyPolicy::default();
    let event = span(-50.0);

    assert_eq!(
        classify_event(&event, 1_000.0, policy),
        RenderClassification::Marker
    );
    assert!((bar_width_px(&event, 1_000.0, policy) - policy.min_width_px).abs() <= 1e-9);
}

#[test]
fn invalid_policy_is_rejected() {
    assert!(
        ClassifyPolicy {
            min_duration_seconds: -1.0,
            min_width_px: 6.0,
        }
        .validate()
        .is_err()
    );
    assert!(
        ClassifyPolicy {
            min_duration_seconds: 10.0,
            min_width_px: 0.0,
        }
        .validate()
        .is_err()
    );
}
