pub mod activity;
pub mod aggregate;
pub mod classify;
pub mod event;
pub mod lane;
pub mod scale;
pub mod time_scale;
pub mod types;

pub use activity::{DayStats, compute_day_stats, derive_activity_spans};
pub use aggregate::{AggregationConfig, MergedGroup, group_events};
pub use classify::{ClassifyPolicy, RenderClassification, bar_width_px, classify_event};
pub use event::{Event, EventKey, EventKind};
pub use lane::{
    ACTIVITY_LANE, Lane, LaneOrderPolicy, normalize_lane_key, resolve_display_name, sort_lanes,
};
pub use scale::LinearScale;
pub use time_scale::{TimeScale, ZoomTransform};
pub use types::{Rect, TimePoint, TimeRange, Viewport};
