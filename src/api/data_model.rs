use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    DayStats, Event, EventKind, Lane, TimePoint, TimeRange, compute_day_stats,
    derive_activity_spans, normalize_lane_key, resolve_display_name, sort_lanes,
};

use super::TimelineEngineConfig;

const DAY_SECONDS: i64 = 86_400;

/// One lane's standing in the top-apps ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopApp {
    pub lane_key: String,
    pub display_name: String,
    pub total_seconds: f64,
}

/// Point-in-time view of the loaded data: merged lanes, the loaded domain,
/// per-day stats and which days are still in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub lanes: Vec<Lane>,
    pub domain: Option<TimeRange>,
    pub loading_days: Vec<NaiveDate>,
    pub day_stats: Vec<(NaiveDate, DayStats)>,
    pub top_apps: Vec<TopApp>,
}

/// Maintains the set of currently-loaded days and merges their event
/// collections into one global lane model.
///
/// Day loading is fire-and-forget from the engine's perspective: the caller
/// marks days loading, delivers them with `insert_day` when its fetch lands,
/// and owns any eviction/backpressure policy. Day boundaries are computed in
/// UTC; callers working in another timezone shift timestamps before insert.
#[derive(Debug)]
pub struct MultiWindowDataModel {
    lane_order: crate::core::LaneOrderPolicy,
    activity_min_span_seconds: f64,
    min_event_duration_seconds: f64,
    top_app_count: usize,

    days: BTreeMap<NaiveDate, Vec<Event>>,
    loading: BTreeSet<NaiveDate>,
    domain: Option<TimeRange>,
}

impl MultiWindowDataModel {
    #[must_use]
    pub fn new(config: &TimelineEngineConfig) -> Self {
        Self {
            lane_order: config.lane_order.clone(),
            activity_min_span_seconds: config.activity_min_span_seconds,
            min_event_duration_seconds: config.min_event_duration_seconds,
            top_app_count: config.top_app_count,
            days: BTreeMap::new(),
            loading: BTreeSet::new(),
            domain: None,
        }
    }

    /// Marks a day as in flight until `insert_day` (or `clear_loading`)
    /// resolves it.
    pub fn begin_day_load(&mut self, date: NaiveDate) {
        if !self.days.contains_key(&date) {
            self.loading.insert(date);
        }
    }

    /// Drops the in-flight marker without delivering data (failed fetch).
    pub fn clear_loading(&mut self, date: NaiveDate) {
        self.loading.remove(&date);
    }

    /// Stores a day's events and extends the loaded domain.
    ///
    /// Events are clipped to the day's boundaries: spans crossing midnight
    /// are shortened, and events wholly outside the day are dropped.
    /// Activity events shorter than the configured noise floor are dropped.
    pub fn insert_day(&mut self, date: NaiveDate, events: Vec<Event>) {
        let bounds = day_bounds(date);
        let mut kept: Vec<Event> = events
            .into_iter()
            .filter_map(|event| clip_to_day(event, bounds))
            .filter(|event| {
                event.kind != EventKind::Activity
                    || self.min_event_duration_seconds <= 0.0
                    || event.duration_or_zero() >= self.min_event_duration_seconds
            })
            .collect();
        kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        debug!(%date, events = kept.len(), "day inserted");
        self.days.insert(date, kept);
        self.loading.remove(&date);
        self.domain = Some(match self.domain {
            Some(domain) => domain.union(bounds),
            None => bounds,
        });
    }

    /// Removes a day. The domain is recomputed from the remaining days but
    /// never shrinks below `keep_visible`, so eviction cannot pull the rug
    /// from under the current view.
    pub fn evict_day(&mut self, date: NaiveDate, keep_visible: Option<TimeRange>) {
        self.days.remove(&date);
        self.loading.remove(&date);

        let mut domain: Option<TimeRange> = None;
        for day in self.days.keys() {
            let bounds = day_bounds(*day);
            domain = Some(match domain {
                Some(range) => range.union(bounds),
                None => bounds,
            });
        }
        if let Some(visible) = keep_visible {
            domain = Some(match domain {
                Some(range) => range.union(visible),
                None => visible,
            });
        }
        self.domain = domain;
    }

    #[must_use]
    pub fn domain(&self) -> Option<TimeRange> {
        self.domain
    }

    #[must_use]
    pub fn is_loading(&self, date: NaiveDate) -> bool {
        self.loading.contains(&date)
    }

    #[must_use]
    pub fn loaded_days(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    /// Builds the merged lane model at `now`.
    ///
    /// Per-day "now" capping compares the event's own day against today:
    /// today's events are capped at `now`, past days are left untouched, and
    /// future-dated events are filtered out entirely. Synthetic activity
    /// spans are derived per day from AFK boundaries.
    #[must_use]
    pub fn snapshot(&self, now: TimePoint) -> ModelSnapshot {
        let today = date_of(now);
        let mut lanes: IndexMap<String, LaneDraft> = IndexMap::new();
        let mut day_stats = Vec::with_capacity(self.days.len());

        for (date, events) in &self.days {
            let bounds = day_bounds(*date);
            let is_today = today == Some(*date);
            let is_future = today.is_some_and(|t| *date > t);
            if is_future {
                debug!(%date, "skipping future-dated day");
                continue;
            }

            let span_end = if is_today {
                bounds.clamp(now)
            } else {
                bounds.end
            };

            let afk: Vec<Event> = events
                .iter()
                .filter(|event| event.kind == EventKind::Afk)
                .cloned()
                .collect();
            let spans = derive_activity_spans(
                &afk,
                bounds.start,
                span_end,
                now,
                self.activity_min_span_seconds,
            );
            day_stats.push((
                *date,
                compute_day_stats(&spans, &afk, bounds.start, span_end, now),
            ));
            for span in spans {
                place(&mut lanes, span);
            }

            for event in events {
                if is_today && event.timestamp > now {
                    continue;
                }
                let mut event = event.clone();
                if is_today {
                    // An ongoing session has no end yet; it runs up to "now".
                    if event.kind == EventKind::Session && event.duration_seconds.is_none() {
                        event.duration_seconds = Some((now - event.timestamp).max(0) as f64);
                    }
                    cap_at(&mut event, now);
                }
                place(&mut lanes, event);
            }
        }

        let mut merged: Vec<Lane> = lanes.into_values().map(LaneDraft::finish).collect();
        sort_lanes(&mut merged, &self.lane_order);

        let top_apps = self.rank_top_apps(&merged);

        ModelSnapshot {
            lanes: merged,
            domain: self.domain,
            loading_days: self.loading.iter().copied().collect(),
            day_stats,
            top_apps,
        }
    }

    /// Top-N dynamic lanes by total event duration.
    fn rank_top_apps(&self, lanes: &[Lane]) -> Vec<TopApp> {
        let mut ranked: Vec<TopApp> = lanes
            .iter()
            .filter(|lane| {
                !self.lane_order.pinned_head.contains(&lane.key)
                    && !self.lane_order.fixed_tail.contains(&lane.key)
            })
            .map(|lane| TopApp {
                lane_key: lane.key.clone(),
                display_name: lane.display_name.clone(),
                total_seconds: lane.events.iter().map(Event::duration_or_zero).sum(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.total_seconds
                .total_cmp(&a.total_seconds)
                .then_with(|| a.lane_key.cmp(&b.lane_key))
        });
        ranked.truncate(self.top_app_count);
        ranked
    }
}

struct LaneDraft {
    key: String,
    variants: Vec<String>,
    events: Vec<Event>,
}

impl LaneDraft {
    fn finish(mut self) -> Lane {
        self.events
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        let mut display_name = resolve_display_name(&self.variants);
        if display_name.is_empty() {
            display_name = self.key.clone();
        }
        Lane {
            display_name,
            color: self
                .events
                .first()
                .map(|event| event.color.clone())
                .unwrap_or_default(),
            key: self.key,
            events: self.events,
        }
    }
}

fn place(lanes: &mut IndexMap<String, LaneDraft>, event: Event) {
    let raw = if event.lane_key.is_empty() {
        event.kind.as_str()
    } else {
        event.lane_key.as_str()
    };
    let key = normalize_lane_key(raw);

    let draft = lanes.entry(key.clone()).or_insert_with(|| LaneDraft {
        key,
        variants: Vec::new(),
        events: Vec::new(),
    });
    if !event.lane_key.is_empty() && !draft.variants.contains(&event.lane_key) {
        draft.variants.push(event.lane_key.clone());
    }
    draft.events.push(event);
}

fn cap_at(event: &mut Event, now: TimePoint) {
    if let Some(duration) = event.duration_seconds {
        let overrun = event.timestamp as f64 + duration - now as f64;
        if overrun > 0.0 {
            event.duration_seconds = Some((duration - overrun).max(0.0));
        }
    }
}

fn clip_to_day(mut event: Event, bounds: TimeRange) -> Option<Event> {
    let end = event.timestamp as f64 + event.duration_or_zero();
    if end < bounds.start as f64 || event.timestamp > bounds.end {
        return None;
    }

    if event.timestamp < bounds.start {
        let trimmed = (bounds.start - event.timestamp) as f64;
        event.timestamp = bounds.start;
        if let Some(duration) = event.duration_seconds {
            event.duration_seconds = Some((duration - trimmed).max(0.0));
        }
    }

    if let Some(duration) = event.duration_seconds {
        let overrun = event.timestamp as f64 + duration - bounds.end as f64;
        if overrun > 0.0 {
            event.duration_seconds = Some((duration - overrun).max(0.0));
        }
    }

    Some(event)
}

/// `[midnight, next midnight)` expressed as an inclusive second range, UTC.
fn day_bounds(date: NaiveDate) -> TimeRange {
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    TimeRange::new(start, start + DAY_SECONDS - 1)
}

fn date_of(timestamp: TimePoint) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|datetime| datetime.date_naive())
}
