use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[cfg(feature = "parallel-aggregation")]
use rayon::prelude::*;

use crate::core::event::{Event, EventKey};
use crate::core::types::TimePoint;

/// Tuning for temporal merge grouping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum gap between an event and the running group end that still
    /// merges, in seconds. The boundary is inclusive: a gap exactly equal to
    /// the threshold merges.
    pub gap_threshold_seconds: f64,
    /// Labels kept per group; the remainder is reported as
    /// `extra_label_count`.
    pub label_cap: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_seconds: 900.0,
            label_cap: 8,
        }
    }
}

/// A cluster of temporally-adjacent same-key events collapsed into one
/// visual unit.
///
/// Members are contiguous in time once sorted, no two neighbors are farther
/// apart than the gap threshold, and every member belongs to exactly one
/// group.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    pub id: String,
    pub merge_key: String,
    /// Start of the first member, unix seconds.
    pub start: TimePoint,
    /// End of the latest-ending member, unix seconds, capped at "now".
    pub end_seconds: f64,
    pub total_duration_seconds: f64,
    pub member_keys: Vec<EventKey>,
    /// Distinct member labels, capped at `label_cap`.
    pub labels: SmallVec<[String; 8]>,
    /// Distinct labels that did not fit under the cap.
    pub extra_label_count: usize,
    pub merged_count: usize,
}

/// Groups events by `key_fn`, merging temporal neighbors within the gap
/// threshold.
///
/// Pure function of the input list, the threshold and the key function:
/// events are fully ordered by (key, timestamp, id) before the walk, so
/// identical inputs produce identical groups regardless of upstream
/// iteration order. Event ends are truncated at `now` before grouping;
/// zero-duration events participate with their timestamp only.
pub fn group_events<F>(
    events: &[Event],
    config: AggregationConfig,
    key_fn: F,
    now: TimePoint,
) -> Vec<MergedGroup>
where
    F: Fn(&Event) -> String,
{
    let gap = config.gap_threshold_seconds.max(0.0);

    let mut keyed: Vec<(String, &Event)> = events
        .iter()
        .map(|event| (key_fn(event), event))
        .collect();
    keyed.sort_by(|(left_key, left), (right_key, right)| {
        left_key
            .cmp(right_key)
            .then(left.timestamp.cmp(&right.timestamp))
            .then(left.id.cmp(&right.id))
    });

    let mut runs: Vec<(String, Vec<&Event>)> = Vec::new();
    for (key, event) in keyed {
        match runs.last_mut() {
            Some((run_key, run)) if *run_key == key => run.push(event),
            _ => runs.push((key, vec![event])),
        }
    }

    #[cfg(feature = "parallel-aggregation")]
    {
        runs.par_iter()
            .flat_map(|(key, run)| merge_run(key, run, gap, config.label_cap, now))
            .collect()
    }

    #[cfg(not(feature = "parallel-aggregation"))]
    {
        runs.iter()
            .flat_map(|(key, run)| merge_run(key, run, gap, config.label_cap, now))
            .collect()
    }
}

fn merge_run(
    key: &str,
    run: &[&Event],
    gap_seconds: f64,
    label_cap: usize,
    now: TimePoint,
) -> Vec<MergedGroup> {
    let mut groups = Vec::new();
    let mut open: Option<OpenGroup> = None;

    for event in run {
        match open.as_mut() {
            Some(group) if (event.timestamp as f64) <= group.end_seconds + gap_seconds => {
                group.absorb(event, label_cap, now);
            }
            _ => {
                if let Some(finished) = open.take() {
                    groups.push(finished.finish(key));
                }
                open = Some(OpenGroup::new(event, label_cap, now));
            }
        }
    }

    if let Some(finished) = open {
        groups.push(finished.finish(key));
    }

    groups
}

struct OpenGroup {
    start: TimePoint,
    end_seconds: f64,
    member_keys: Vec<EventKey>,
    labels: SmallVec<[String; 8]>,
    extra_label_count: usize,
}

impl OpenGroup {
    fn new(event: &Event, label_cap: usize, now: TimePoint) -> Self {
        let mut group = Self {
            start: event.timestamp,
            end_seconds: f64::NEG_INFINITY,
            member_keys: Vec::new(),
            labels: SmallVec::new(),
            extra_label_count: 0,
        };
        group.absorb(event, label_cap, now);
        group
    }

    fn absorb(&mut self, event: &Event, label_cap: usize, now: TimePoint) {
        self.end_seconds = self.end_seconds.max(event.end_seconds(now));
        self.member_keys.push(event.key());

        if !event.label.is_empty() && !self.labels.iter().any(|label| *label == event.label) {
            if self.labels.len() < label_cap {
                self.labels.push(event.label.clone());
            } else {
                self.extra_label_count += 1;
            }
        }
    }

    fn finish(self, key: &str) -> MergedGroup {
        let merged_count = self.member_keys.len();
        MergedGroup {
            id: format!("{key}:{}", self.start),
            merge_key: key.to_owned(),
            start: self.start,
            end_seconds: self.end_seconds,
            total_duration_seconds: (self.end_seconds - self.start as f64).max(0.0),
            member_keys: self.member_keys,
            labels: self.labels,
            extra_label_count: self.extra_label_count,
            merged_count,
        }
    }
}
