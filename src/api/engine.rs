use chrono::NaiveDate;
use tracing::debug;

use crate::core::{
    AggregationConfig, Event, EventKey, EventKind, Lane, MergedGroup, RenderClassification,
    TimePoint, bar_width_px, classify_event, group_events,
};
use crate::error::TimelineResult;
use crate::interaction::SelectionSet;

use super::{
    ModelSnapshot, MultiWindowDataModel, TimelineEngineConfig, ViewCommit, ZoomPanController,
};

/// Umbrella over the data model and the zoom/pan controller.
///
/// The engine wires domain changes from day loading into the controller's
/// restoration path and exposes aggregation/classification at the current
/// effective scale. All methods are synchronous; the caller drives timers
/// through `tick`.
pub struct TimelineEngine {
    config: TimelineEngineConfig,
    model: MultiWindowDataModel,
    zoom_pan: Option<ZoomPanController>,
    now: TimePoint,
}

impl TimelineEngine {
    pub fn new(config: TimelineEngineConfig, now: TimePoint) -> TimelineResult<Self> {
        config.validate()?;
        let model = MultiWindowDataModel::new(&config);
        Ok(Self {
            config,
            model,
            zoom_pan: None,
            now,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TimelineEngineConfig {
        &self.config
    }

    #[must_use]
    pub fn model(&self) -> &MultiWindowDataModel {
        &self.model
    }

    /// The controller exists once the first day has loaded and a domain is
    /// established.
    #[must_use]
    pub fn zoom_pan(&self) -> Option<&ZoomPanController> {
        self.zoom_pan.as_ref()
    }

    pub fn zoom_pan_mut(&mut self) -> Option<&mut ZoomPanController> {
        self.zoom_pan.as_mut()
    }

    pub fn begin_day_load(&mut self, date: NaiveDate) {
        self.model.begin_day_load(date);
    }

    pub fn clear_loading(&mut self, date: NaiveDate) {
        self.model.clear_loading(date);
    }

    /// Delivers a day's events and re-projects the view onto the grown
    /// domain (a restoration, so no commit notification fires).
    pub fn insert_day(&mut self, date: NaiveDate, events: Vec<Event>) -> TimelineResult<()> {
        self.model.insert_day(date, events);
        self.sync_domain()
    }

    /// Evicts a day, protecting the committed visible range from domain
    /// shrinkage.
    pub fn evict_day(&mut self, date: NaiveDate) -> TimelineResult<()> {
        let keep_visible = self
            .zoom_pan
            .as_ref()
            .map(|controller| controller.committed().visible_range);
        self.model.evict_day(date, keep_visible);
        self.sync_domain()
    }

    /// Advances the wall clock used for "now" capping and constraints.
    pub fn set_now(&mut self, now: TimePoint) {
        self.now = now;
        if let Some(controller) = self.zoom_pan.as_mut() {
            controller.set_now(now);
        }
    }

    /// Fires any elapsed controller deadline.
    pub fn tick(&mut self, at_ms: i64) -> Option<ViewCommit> {
        self.zoom_pan
            .as_mut()
            .and_then(|controller| controller.tick(at_ms))
    }

    #[must_use]
    pub fn snapshot(&self) -> ModelSnapshot {
        self.model.snapshot(self.now)
    }

    /// Aggregates one lane into merged display groups with the gap threshold
    /// appropriate for its event kind. Kinds outside the aggregated set
    /// collapse only overlapping events (gap zero).
    #[must_use]
    pub fn lane_groups(&self, lane: &Lane) -> Vec<MergedGroup> {
        let kind = lane.events.first().map(|event| event.kind);
        let gaps = self.config.merge_gaps;
        let gap_threshold_seconds = match kind {
            Some(EventKind::Browser) => gaps.browser_gap_seconds,
            Some(EventKind::Activity) => gaps.activity_gap_seconds,
            Some(EventKind::ProjectEntry) => gaps.project_gap_seconds,
            _ => 0.0,
        };
        let config = AggregationConfig {
            gap_threshold_seconds,
            label_cap: gaps.label_cap,
        };

        group_events(&lane.events, config, merge_key, self.now)
    }

    /// Classifies one event at the current effective scale. Without an
    /// established view the event degrades to a marker.
    #[must_use]
    pub fn classify(&self, event: &Event) -> RenderClassification {
        let pixels_per_second = self
            .zoom_pan
            .as_ref()
            .map_or(0.0, ZoomPanController::pixels_per_second);
        classify_event(event, pixels_per_second, self.config.classify)
    }

    /// Bar width for an event already classified as a bar.
    #[must_use]
    pub fn bar_width(&self, event: &Event) -> f64 {
        let pixels_per_second = self
            .zoom_pan
            .as_ref()
            .map_or(0.0, ZoomPanController::pixels_per_second);
        bar_width_px(event, pixels_per_second, self.config.classify)
    }

    /// Drops selection keys that no longer exist in the loaded universe.
    pub fn prune_selection(&self, selection: &mut SelectionSet) {
        let snapshot = self.snapshot();
        let universe: std::collections::HashSet<EventKey> = snapshot
            .lanes
            .iter()
            .flat_map(|lane| lane.events.iter().map(Event::key))
            .collect();
        selection.retain_valid(|key| universe.contains(key));
    }

    fn sync_domain(&mut self) -> TimelineResult<()> {
        let Some(domain) = self.model.domain() else {
            self.teardown_controller();
            return Ok(());
        };

        match self.zoom_pan.as_mut() {
            Some(controller) => controller.set_domain(domain),
            None => {
                debug!(?domain, "domain established, creating zoom/pan controller");
                let controller = ZoomPanController::new(&self.config, domain, self.now)?;
                self.zoom_pan = Some(controller);
                Ok(())
            }
        }
    }

    fn teardown_controller(&mut self) {
        if let Some(controller) = self.zoom_pan.as_mut() {
            controller.cancel_timers();
        }
        self.zoom_pan = None;
    }
}

impl Drop for TimelineEngine {
    fn drop(&mut self) {
        self.teardown_controller();
    }
}

/// Type-specific merge identity: domain for browser visits, project for
/// project entries, lane key otherwise.
fn merge_key(event: &Event) -> String {
    match event.kind {
        EventKind::Browser => event
            .metadata
            .get("domain")
            .and_then(|value| value.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| event.lane_key.clone()),
        EventKind::ProjectEntry => event
            .metadata
            .get("projectId")
            .map(std::string::ToString::to_string)
            .unwrap_or_else(|| event.label.clone()),
        _ => event.lane_key.clone(),
    }
}
