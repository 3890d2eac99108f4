use serde::{Deserialize, Serialize};

use crate::core::event::Event;
use crate::error::{TimelineError, TimelineResult};

/// How an event should be drawn at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderClassification {
    /// Duration span wide enough to draw as a bar.
    Bar,
    /// Fixed-width instant marker.
    Marker,
}

/// Floors deciding when a duration is worth a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyPolicy {
    pub min_duration_seconds: f64,
    pub min_width_px: f64,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            min_duration_seconds: 10.0,
            min_width_px: 6.0,
        }
    }
}

impl ClassifyPolicy {
    pub fn validate(self) -> TimelineResult<Self> {
        if !self.min_duration_seconds.is_finite() || self.min_duration_seconds < 0.0 {
            return Err(TimelineError::InvalidData(
                "minimum bar duration must be finite and >= 0".to_owned(),
            ));
        }
        if !self.min_width_px.is_finite() || self.min_width_px <= 0.0 {
            return Err(TimelineError::InvalidData(
                "minimum bar width must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Classifies one event at the current effective scale.
///
/// Classification is a function of (event, current zoom), never a stored
/// property: it must be re-evaluated whenever the effective scale changes.
#[must_use]
pub fn classify_event(
    event: &Event,
    pixels_per_second: f64,
    policy: ClassifyPolicy,
) -> RenderClassification {
    if !pixels_per_second.is_finite() || pixels_per_second <= 0.0 {
        return RenderClassification::Marker;
    }

    let duration = event.duration_or_zero();
    if duration < policy.min_duration_seconds {
        return RenderClassification::Marker;
    }

    if duration * pixels_per_second < policy.min_width_px {
        return RenderClassification::Marker;
    }

    RenderClassification::Bar
}

/// Bar width in pixels, clamped to the policy floor so short bars stay
/// visible and clickable.
#[must_use]
pub fn bar_width_px(event: &Event, pixels_per_second: f64, policy: ClassifyPolicy) -> f64 {
    if !pixels_per_second.is_finite() || pixels_per_second <= 0.0 {
        return policy.min_width_px;
    }
    (event.duration_or_zero() * pixels_per_second).max(policy.min_width_px)
}
