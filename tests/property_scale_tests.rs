use proptest::prelude::*;
use timeline_rs::TimelineEngineConfig;
use timeline_rs::api::ZoomPanController;
use timeline_rs::core::{LinearScale, TimeRange, TimeScale, Viewport, ZoomTransform};

proptest! {
    #[test]
    fn linear_scale_round_trip_property(
        domain_start in -1.0e9f64..1.0e9,
        domain_span in 1.0f64..1.0e9,
        value_factor in 0.0f64..1.0
    ) {
        let domain_end = domain_start + domain_span;
        let value = domain_start + value_factor * domain_span;

        let scale = LinearScale::new(domain_start, domain_end, 0.0, 1920.0).expect("valid scale");
        let px = scale.domain_to_pixel(value).expect("to pixel");
        let recovered = scale.pixel_to_domain(px).expect("from pixel");

        prop_assert!((recovered - value).abs() <= domain_span * 1e-9);
    }

    #[test]
    fn effective_scale_round_trip_property(
        zoom_scale in 0.01f64..1_000.0,
        translate_x in -1.0e5f64..1.0e5,
        value_factor in 0.0f64..1.0
    ) {
        let domain = TimeRange::new(0, 86_400);
        let scale = TimeScale::new(domain, Viewport::new(1920, 1080)).expect("valid scale");
        let zoom = ZoomTransform::new(zoom_scale, translate_x);
        let value = value_factor * 86_400.0;

        let px = scale.effective_to_pixel(value, zoom).expect("to pixel");
        let recovered = scale.effective_to_time(px, zoom).expect("from pixel");

        prop_assert!((recovered - value).abs() <= 1e-4);
    }

    #[test]
    fn playhead_never_escapes_domain_and_now(
        deltas in prop::collection::vec((0.01f64..2_000.0, -1.0e6f64..1.0e6), 1..24)
    ) {
        let now = 64_800;
        let config = TimelineEngineConfig::new(Viewport::new(960, 600));
        let mut controller =
            ZoomPanController::new(&config, TimeRange::new(0, 86_400), now).expect("controller");

        for (index, (scale, translate_x)) in deltas.into_iter().enumerate() {
            controller.apply_delta(ZoomTransform::new(scale, translate_x), index as i64 * 16);
            let playhead = controller.live().playhead_seconds;
            prop_assert!(playhead >= -1e-6);
            prop_assert!(playhead <= now as f64 + 1e-6);
        }
    }
}
