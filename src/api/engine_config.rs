use serde::{Deserialize, Serialize};

use crate::core::{ClassifyPolicy, LaneOrderPolicy, Viewport};
use crate::error::{TimelineError, TimelineResult};

/// Per-kind merge gap thresholds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeGapConfig {
    /// Browser visits merged by domain.
    pub browser_gap_seconds: f64,
    /// Adjacent same-app activity blocks.
    pub activity_gap_seconds: f64,
    /// Project-assigned entries merged by project.
    pub project_gap_seconds: f64,
    /// Labels kept per merged group before overflowing into a count.
    pub label_cap: usize,
}

impl Default for MergeGapConfig {
    fn default() -> Self {
        Self {
            browser_gap_seconds: 900.0,
            activity_gap_seconds: 300.0,
            project_gap_seconds: 300.0,
            label_cap: 8,
        }
    }
}

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load timeline
/// setup without inventing their own ad-hoc format. The engine holds no
/// ambient state: every tunable enters through here at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEngineConfig {
    pub viewport: Viewport,
    #[serde(default = "default_min_zoom_scale")]
    pub min_zoom_scale: f64,
    #[serde(default = "default_max_zoom_scale")]
    pub max_zoom_scale: f64,
    /// Visible duration the initial placement and explicit navigation aim
    /// for, in seconds.
    #[serde(default = "default_visible_seconds")]
    pub default_visible_seconds: f64,
    #[serde(default = "default_commit_debounce_ms")]
    pub commit_debounce_ms: i64,
    /// Safety deadline for a zoom gesture that never ends.
    #[serde(default = "default_gesture_timeout_ms")]
    pub gesture_timeout_ms: i64,
    /// Fixed playhead pixel; `None` centers it in the viewport.
    #[serde(default)]
    pub playhead_x: Option<f64>,
    #[serde(default)]
    pub classify: ClassifyPolicy,
    #[serde(default)]
    pub merge_gaps: MergeGapConfig,
    #[serde(default)]
    pub lane_order: LaneOrderPolicy,
    /// Minimum synthetic activity span, in seconds.
    #[serde(default = "default_activity_min_span_seconds")]
    pub activity_min_span_seconds: f64,
    /// Noise floor: activity events shorter than this are dropped before
    /// lane placement. Zero disables the filter.
    #[serde(default)]
    pub min_event_duration_seconds: f64,
    #[serde(default = "default_top_app_count")]
    pub top_app_count: usize,
}

impl TimelineEngineConfig {
    /// Creates a config with defaults for everything but the viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            min_zoom_scale: default_min_zoom_scale(),
            max_zoom_scale: default_max_zoom_scale(),
            default_visible_seconds: default_visible_seconds(),
            commit_debounce_ms: default_commit_debounce_ms(),
            gesture_timeout_ms: default_gesture_timeout_ms(),
            playhead_x: None,
            classify: ClassifyPolicy::default(),
            merge_gaps: MergeGapConfig::default(),
            lane_order: LaneOrderPolicy::default(),
            activity_min_span_seconds: default_activity_min_span_seconds(),
            min_event_duration_seconds: 0.0,
            top_app_count: default_top_app_count(),
        }
    }

    /// Sets the zoom scale clamp bounds.
    #[must_use]
    pub fn with_zoom_bounds(mut self, min_zoom_scale: f64, max_zoom_scale: f64) -> Self {
        self.min_zoom_scale = min_zoom_scale;
        self.max_zoom_scale = max_zoom_scale;
        self
    }

    /// Sets the visible duration targeted by initial placement and navigation.
    #[must_use]
    pub fn with_default_visible_seconds(mut self, seconds: f64) -> Self {
        self.default_visible_seconds = seconds;
        self
    }

    /// Sets the commit debounce interval.
    #[must_use]
    pub fn with_commit_debounce_ms(mut self, ms: i64) -> Self {
        self.commit_debounce_ms = ms;
        self
    }

    /// Sets the stuck-gesture safety deadline.
    #[must_use]
    pub fn with_gesture_timeout_ms(mut self, ms: i64) -> Self {
        self.gesture_timeout_ms = ms;
        self
    }

    /// Pins the playhead to a specific pixel instead of the viewport center.
    #[must_use]
    pub fn with_playhead_x(mut self, x: f64) -> Self {
        self.playhead_x = Some(x);
        self
    }

    /// Sets bar/marker classification floors.
    #[must_use]
    pub fn with_classify_policy(mut self, policy: ClassifyPolicy) -> Self {
        self.classify = policy;
        self
    }

    /// Sets per-kind merge gap thresholds.
    #[must_use]
    pub fn with_merge_gaps(mut self, merge_gaps: MergeGapConfig) -> Self {
        self.merge_gaps = merge_gaps;
        self
    }

    /// Sets the lane ordering policy.
    #[must_use]
    pub fn with_lane_order(mut self, lane_order: LaneOrderPolicy) -> Self {
        self.lane_order = lane_order;
        self
    }

    /// Sets the noise floor for activity events.
    #[must_use]
    pub fn with_min_event_duration_seconds(mut self, seconds: f64) -> Self {
        self.min_event_duration_seconds = seconds;
        self
    }

    /// The pixel the playhead is anchored to.
    #[must_use]
    pub fn playhead_pixel(&self) -> f64 {
        self.playhead_x
            .unwrap_or_else(|| f64::from(self.viewport.width) / 2.0)
    }

    pub fn validate(&self) -> TimelineResult<()> {
        if !self.viewport.is_valid() {
            return Err(TimelineError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        if !self.min_zoom_scale.is_finite()
            || !self.max_zoom_scale.is_finite()
            || self.min_zoom_scale <= 0.0
            || self.max_zoom_scale < self.min_zoom_scale
        {
            return Err(TimelineError::InvalidData(
                "zoom bounds must be finite with 0 < min <= max".to_owned(),
            ));
        }

        if !self.default_visible_seconds.is_finite() || self.default_visible_seconds <= 0.0 {
            return Err(TimelineError::InvalidData(
                "default visible duration must be finite and > 0".to_owned(),
            ));
        }

        if self.commit_debounce_ms < 0 || self.gesture_timeout_ms <= 0 {
            return Err(TimelineError::InvalidData(
                "commit debounce must be >= 0 and gesture timeout > 0".to_owned(),
            ));
        }

        if let Some(x) = self.playhead_x {
            if !x.is_finite() || x < 0.0 || x > f64::from(self.viewport.width) {
                return Err(TimelineError::InvalidData(
                    "playhead pixel must lie within the viewport".to_owned(),
                ));
            }
        }

        if !self.activity_min_span_seconds.is_finite() || self.activity_min_span_seconds < 0.0 {
            return Err(TimelineError::InvalidData(
                "activity span floor must be finite and >= 0".to_owned(),
            ));
        }

        if !self.min_event_duration_seconds.is_finite() || self.min_event_duration_seconds < 0.0 {
            return Err(TimelineError::InvalidData(
                "event duration floor must be finite and >= 0".to_owned(),
            ));
        }

        self.classify.validate()?;
        Ok(())
    }
}

fn default_min_zoom_scale() -> f64 {
    1.0
}

fn default_max_zoom_scale() -> f64 {
    1000.0
}

fn default_visible_seconds() -> f64 {
    3.0 * 3600.0
}

fn default_commit_debounce_ms() -> i64 {
    150
}

fn default_gesture_timeout_ms() -> i64 {
    5000
}

fn default_activity_min_span_seconds() -> f64 {
    60.0
}

fn default_top_app_count() -> usize {
    6
}
