use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{TimePoint, TimeRange, TimeScale, Viewport, ZoomTransform};
use crate::error::TimelineResult;

use super::TimelineEngineConfig;

/// Gesture lifecycle of the zoom/pan state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureState {
    Idle,
    Zooming,
}

/// Committed view state, delivered to consumers on debounce/commit
/// boundaries only. Writes are last-write-wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCommit {
    /// Timestamp aligned to the fixed center pixel.
    pub playhead: TimePoint,
    pub visible_range: TimeRange,
    pub zoom_scale: f64,
}

/// Live view state, recomputed at input-event rate and read by the render
/// loop every frame. Mutating it never triggers consumer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveView {
    pub transform: ZoomTransform,
    pub playhead_seconds: f64,
    pub visible_start_seconds: f64,
    pub visible_end_seconds: f64,
}

type CommitHandler = Box<dyn FnMut(&ViewCommit)>;

/// Owns the live zoom transform and the two-tier live/committed view state.
///
/// All timers are caller-ticked millisecond deadlines: the controller never
/// reads the wall clock, so every timing path is deterministic under test.
/// Zoom-by-factor operations are anchored at the fixed center pixel (the
/// playhead), never at the cursor, so "now you are looking at time T" stays
/// stable under zoom.
pub struct ZoomPanController {
    viewport: Viewport,
    center_x: f64,
    min_scale: f64,
    max_scale: f64,
    default_visible_seconds: f64,
    commit_debounce_ms: i64,
    gesture_timeout_ms: i64,

    domain: TimeRange,
    now: TimePoint,
    base: TimeScale,

    live: LiveView,
    committed: ViewCommit,
    gesture: GestureState,
    commit_deadline_ms: Option<i64>,
    safety_deadline_ms: Option<i64>,
    restoring: bool,
    on_commit: Option<CommitHandler>,
}

impl fmt::Debug for ZoomPanController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomPanController")
            .field("domain", &self.domain)
            .field("now", &self.now)
            .field("gesture", &self.gesture)
            .field("live", &self.live)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl ZoomPanController {
    /// Builds the controller and performs initial placement: the playhead
    /// centers on `min(now, domain end)` at a scale that fills the viewport
    /// with the configured default visible duration.
    pub fn new(
        config: &TimelineEngineConfig,
        domain: TimeRange,
        now: TimePoint,
    ) -> TimelineResult<Self> {
        config.validate()?;
        let base = TimeScale::new(domain, config.viewport)?;

        let placeholder = ViewCommit {
            playhead: domain.start,
            visible_range: domain,
            zoom_scale: 1.0,
        };

        let mut controller = Self {
            viewport: config.viewport,
            center_x: config.playhead_pixel(),
            min_scale: config.min_zoom_scale,
            max_scale: config.max_zoom_scale,
            default_visible_seconds: config.default_visible_seconds,
            commit_debounce_ms: config.commit_debounce_ms,
            gesture_timeout_ms: config.gesture_timeout_ms,
            domain,
            now,
            base,
            live: LiveView {
                transform: ZoomTransform::IDENTITY,
                playhead_seconds: domain.start as f64,
                visible_start_seconds: domain.start as f64,
                visible_end_seconds: domain.end as f64,
            },
            committed: placeholder,
            gesture: GestureState::Idle,
            commit_deadline_ms: None,
            safety_deadline_ms: None,
            restoring: false,
            on_commit: None,
        };

        controller.place_initially();
        Ok(controller)
    }

    /// Registers the consumer notified on every non-restoration commit.
    pub fn set_on_commit(&mut self, handler: impl FnMut(&ViewCommit) + 'static) {
        self.on_commit = Some(Box::new(handler));
    }

    #[must_use]
    pub fn live(&self) -> LiveView {
        self.live
    }

    #[must_use]
    pub fn committed(&self) -> ViewCommit {
        self.committed
    }

    #[must_use]
    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    #[must_use]
    pub fn domain(&self) -> TimeRange {
        self.domain
    }

    #[must_use]
    pub fn now(&self) -> TimePoint {
        self.now
    }

    /// Effective pixels per second at the live zoom level. Feeds width-based
    /// render classification.
    #[must_use]
    pub fn pixels_per_second(&self) -> f64 {
        self.base.pixels_per_second(self.live.transform)
    }

    /// Enters the `Zooming` state and arms the stuck-gesture safety
    /// deadline.
    pub fn begin_gesture(&mut self, at_ms: i64) {
        self.gesture = GestureState::Zooming;
        self.safety_deadline_ms = Some(at_ms + self.gesture_timeout_ms);
    }

    /// Applies a raw transform at input-event rate.
    ///
    /// The transform is validated, scale-clamped and run through the
    /// center-pixel constraint before the live tier is updated; the commit
    /// debounce is re-armed (re-arming cancels the prior deadline). A
    /// non-finite transform is discarded and the last valid one retained.
    pub fn apply_delta(&mut self, raw: ZoomTransform, at_ms: i64) -> bool {
        let Some(constrained) = self.constrain(raw) else {
            warn!(scale = raw.scale, translate_x = raw.translate_x, "discarding invalid zoom delta");
            return false;
        };

        if !self.recompute_live(constrained) {
            return false;
        }

        self.commit_deadline_ms = Some(at_ms + self.commit_debounce_ms);
        true
    }

    /// Ends the gesture cleanly: cancels the safety deadline and commits the
    /// live state immediately.
    pub fn end_gesture(&mut self, _at_ms: i64) {
        self.safety_deadline_ms = None;
        self.commit_deadline_ms = None;
        self.gesture = GestureState::Idle;
        self.commit();
    }

    /// Fires any elapsed deadline. Returns the commit it produced, if any.
    pub fn tick(&mut self, at_ms: i64) -> Option<ViewCommit> {
        if self.safety_deadline_ms.is_some_and(|deadline| at_ms >= deadline) {
            warn!("zoom gesture exceeded safety deadline; forcing commit");
            self.safety_deadline_ms = None;
            self.commit_deadline_ms = None;
            self.gesture = GestureState::Idle;
            self.commit();
            return Some(self.committed);
        }

        if self.commit_deadline_ms.is_some_and(|deadline| at_ms >= deadline) {
            self.commit_deadline_ms = None;
            self.commit();
            return Some(self.committed);
        }

        None
    }

    /// Center-anchored zoom by a multiplicative factor (wheel/scroll).
    pub fn zoom_by_factor(&mut self, factor: f64, at_ms: i64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }

        let new_scale = (self.live.transform.scale * factor)
            .max(self.min_scale)
            .min(self.max_scale);
        let Some(translate_x) = self.translate_for_center(self.live.playhead_seconds, new_scale)
        else {
            return false;
        };

        self.apply_delta(ZoomTransform::new(new_scale, translate_x), at_ms)
    }

    /// Advances the "now" boundary and re-applies the center constraint.
    pub fn set_now(&mut self, now: TimePoint) {
        self.now = now;
        if let Some(constrained) = self.constrain(self.live.transform) {
            self.recompute_live(constrained);
        }
    }

    /// Re-projects the view after the loaded domain changed.
    ///
    /// The established playhead timestamp stays centered at the same zoom
    /// level, clamped into the new domain if it fell outside. The resulting
    /// commit is a restoration, not a user action, so the commit
    /// notification is suppressed for this one cycle.
    pub fn set_domain(&mut self, domain: TimeRange) -> TimelineResult<()> {
        let base = TimeScale::new(domain, self.viewport)?;
        self.domain = domain;
        self.base = base;
        self.restore_playhead();
        Ok(())
    }

    /// Re-projects the view after the viewport was resized.
    pub fn set_viewport(&mut self, viewport: Viewport, playhead_x: Option<f64>) -> TimelineResult<()> {
        let base = TimeScale::new(self.domain, viewport)?;
        self.viewport = viewport;
        self.center_x = playhead_x.unwrap_or_else(|| f64::from(viewport.width) / 2.0);
        self.base = base;
        self.restore_playhead();
        Ok(())
    }

    /// Snaps to a transform centering `target` at the default-visible
    /// duration scale, commits immediately and invokes the completion
    /// callback.
    pub fn navigate_to(&mut self, target: TimePoint, on_complete: impl FnOnce()) -> bool {
        let target = self.clamp_playhead(target as f64);
        let scale = self.default_scale();
        let Some(translate_x) = self.translate_for_center(target, scale) else {
            return false;
        };
        let Some(constrained) = self.constrain(ZoomTransform::new(scale, translate_x)) else {
            return false;
        };
        if !self.recompute_live(constrained) {
            return false;
        }

        self.commit_deadline_ms = None;
        self.commit();
        on_complete();
        true
    }

    /// Cancels all outstanding deadlines. Must run at teardown so nothing
    /// fires into freed state.
    pub fn cancel_timers(&mut self) {
        self.commit_deadline_ms = None;
        self.safety_deadline_ms = None;
        self.gesture = GestureState::Idle;
    }

    fn place_initially(&mut self) {
        let playhead = self.clamp_into_domain(self.now.min(self.domain.end) as f64);
        let scale = self.default_scale();
        if let Some(translate_x) = self.translate_for_center(playhead, scale) {
            if let Some(constrained) = self.constrain(ZoomTransform::new(scale, translate_x)) {
                if self.recompute_live(constrained) {
                    self.restoring = true;
                    self.commit();
                }
            }
        }
    }

    fn restore_playhead(&mut self) {
        let playhead = self.clamp_into_domain(self.live.playhead_seconds);
        let scale = self.live.transform.scale;
        let Some(translate_x) = self.translate_for_center(playhead, scale) else {
            return;
        };
        let Some(constrained) = self.constrain(ZoomTransform::new(scale, translate_x)) else {
            return;
        };
        if self.recompute_live(constrained) {
            self.restoring = true;
            self.commit_deadline_ms = None;
            self.commit();
        }
    }

    /// Scale that fills the viewport with the default visible duration.
    fn default_scale(&self) -> f64 {
        let domain_seconds = (self.domain.duration_seconds().max(1)) as f64;
        (domain_seconds / self.default_visible_seconds)
            .max(self.min_scale)
            .min(self.max_scale)
    }

    fn clamp_playhead(&self, seconds: f64) -> f64 {
        let floor = self.domain.start as f64;
        let ceiling = (self.now.max(self.domain.start)) as f64;
        seconds.max(floor).min(ceiling)
    }

    /// Restoration clamp: unlike the live constraint, a re-projected
    /// playhead must also land inside the (possibly shrunken) domain.
    fn clamp_into_domain(&self, seconds: f64) -> f64 {
        self.clamp_playhead(seconds)
            .min(self.domain.end as f64)
            .max(self.domain.start as f64)
    }

    /// Translation that puts `time_seconds` at the fixed center pixel.
    fn translate_for_center(&self, time_seconds: f64, scale: f64) -> Option<f64> {
        let base_px = self.base.to_pixel(time_seconds).ok()?;
        let translate_x = self.center_x - base_px * scale;
        translate_x.is_finite().then_some(translate_x)
    }

    /// Constraint algorithm: the timestamp at the fixed center pixel may
    /// neither precede the domain start nor exceed "now". Returns `None`
    /// when the transform (or any intermediate value) is not finite.
    fn constrain(&self, raw: ZoomTransform) -> Option<ZoomTransform> {
        if !raw.is_valid() {
            return None;
        }

        let clamped = raw.with_scale_clamped(self.min_scale, self.max_scale);
        let center_seconds = self.base.effective_to_time(self.center_x, clamped).ok()?;
        if !center_seconds.is_finite() {
            return None;
        }

        let corrected = self.clamp_playhead(center_seconds);
        if corrected == center_seconds {
            return Some(clamped);
        }

        let translate_x = self.translate_for_center(corrected, clamped.scale)?;
        Some(ZoomTransform::new(clamped.scale, translate_x))
    }

    /// Refreshes the live tier from a constrained transform. Any non-finite
    /// intermediate keeps the previous live state untouched.
    fn recompute_live(&mut self, transform: ZoomTransform) -> bool {
        let Ok(start) = self.base.effective_to_time(0.0, transform) else {
            return false;
        };
        let Ok(end) = self
            .base
            .effective_to_time(f64::from(self.viewport.width), transform)
        else {
            return false;
        };
        let Ok(playhead) = self.base.effective_to_time(self.center_x, transform) else {
            return false;
        };

        if !start.is_finite() || !end.is_finite() || !playhead.is_finite() {
            return false;
        }

        self.live = LiveView {
            transform,
            playhead_seconds: playhead,
            visible_start_seconds: start,
            visible_end_seconds: end,
        };
        true
    }

    fn commit(&mut self) {
        let commit = ViewCommit {
            playhead: self.live.playhead_seconds.round() as TimePoint,
            visible_range: TimeRange::new(
                self.live.visible_start_seconds.floor() as TimePoint,
                self.live.visible_end_seconds.ceil() as TimePoint,
            ),
            zoom_scale: self.live.transform.scale,
        };
        self.committed = commit;

        if self.restoring {
            self.restoring = false;
            debug!(playhead = commit.playhead, "restored view commit, notification suppressed");
            return;
        }

        debug!(
            playhead = commit.playhead,
            zoom_scale = commit.zoom_scale,
            "view commit"
        );
        if let Some(handler) = self.on_commit.as_mut() {
            handler(&commit);
        }
    }
}
