use serde::{Deserialize, Serialize};

use crate::core::scale::LinearScale;
use crate::core::types::{TimeRange, Viewport};
use crate::error::{TimelineError, TimelineResult};

/// Multiplicative zoom plus horizontal translation, applied on top of the
/// base time scale. Composes with the base mapping rather than replacing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate_x: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
    };

    #[must_use]
    pub fn new(scale: f64, translate_x: f64) -> Self {
        Self { scale, translate_x }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.translate_x.is_finite()
    }

    /// Maps a base-scale pixel into the zoomed coordinate space.
    #[must_use]
    pub fn apply(self, pixel: f64) -> f64 {
        pixel * self.scale + self.translate_x
    }

    /// Maps a zoomed-space pixel back into the base coordinate space.
    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        (pixel - self.translate_x) / self.scale
    }

    #[must_use]
    pub fn with_scale_clamped(self, min_scale: f64, max_scale: f64) -> Self {
        Self {
            scale: self.scale.max(min_scale).min(max_scale),
            translate_x: self.translate_x,
        }
    }
}

/// Base mapping from domain seconds to viewport pixels.
///
/// The effective (zoomed) mapping composes a `ZoomTransform` with this scale:
/// `effective_to_pixel` applies the transform after the base projection and
/// `effective_to_time` inverts it first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    linear: LinearScale,
}

impl TimeScale {
    pub fn new(domain: TimeRange, viewport: Viewport) -> TimelineResult<Self> {
        if !viewport.is_valid() {
            return Err(TimelineError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        // A single-instant domain still needs a non-empty mapping.
        let domain_end = if domain.start == domain.end {
            domain.end + 1
        } else {
            domain.end
        };

        let linear = LinearScale::new(
            domain.start as f64,
            domain_end as f64,
            0.0,
            f64::from(viewport.width),
        )?;
        Ok(Self { linear })
    }

    pub fn to_pixel(self, time_seconds: f64) -> TimelineResult<f64> {
        self.linear.domain_to_pixel(time_seconds)
    }

    pub fn to_time(self, pixel: f64) -> TimelineResult<f64> {
        self.linear.pixel_to_domain(pixel)
    }

    pub fn effective_to_pixel(self, time_seconds: f64, zoom: ZoomTransform) -> TimelineResult<f64> {
        if !zoom.is_valid() {
            return Err(TimelineError::InvalidData(
                "zoom transform must be finite with scale > 0".to_owned(),
            ));
        }
        Ok(zoom.apply(self.linear.domain_to_pixel(time_seconds)?))
    }

    pub fn effective_to_time(self, pixel: f64, zoom: ZoomTransform) -> TimelineResult<f64> {
        if !zoom.is_valid() {
            return Err(TimelineError::InvalidData(
                "zoom transform must be finite with scale > 0".to_owned(),
            ));
        }
        self.linear.pixel_to_domain(zoom.invert(pixel))
    }

    /// Pixels covered by one second of time at the given zoom.
    #[must_use]
    pub fn pixels_per_second(self, zoom: ZoomTransform) -> f64 {
        let (domain_start, domain_end) = self.linear.domain();
        let (pixel_start, pixel_end) = self.linear.pixel_range();
        let base = (pixel_end - pixel_start) / (domain_end - domain_start);
        base * zoom.scale
    }
}
