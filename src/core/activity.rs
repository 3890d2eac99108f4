use serde::{Deserialize, Serialize};

use crate::core::event::{Event, EventKind};
use crate::core::lane::ACTIVITY_LANE;
use crate::core::types::TimePoint;

/// Aggregate statistics for one day, derived from the same AFK walk that
/// produces the synthetic activity spans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DayStats {
    pub active_seconds: f64,
    pub break_count: usize,
    pub break_seconds: f64,
    pub longest_focus_seconds: f64,
    pub longest_focus_start: TimePoint,
    pub longest_focus_end: TimePoint,
}

/// Emits a synthetic activity span for every gap between AFK periods: day
/// start to the first AFK, between AFK periods, and from the last AFK to the
/// day end (or "now" for today). Spans shorter than `min_span_seconds` are
/// dropped to avoid visual noise.
///
/// Span ids are the span's start timestamp, which is unique within the
/// activity kind because spans never overlap.
#[must_use]
pub fn derive_activity_spans(
    afk_events: &[Event],
    span_start: TimePoint,
    span_end: TimePoint,
    now: TimePoint,
    min_span_seconds: f64,
) -> Vec<Event> {
    if span_end <= span_start {
        return Vec::new();
    }

    let intervals = clamped_afk_intervals(afk_events, span_start, span_end, now);
    let mut spans = Vec::new();
    let mut cursor = span_start as f64;

    for (afk_start, afk_end) in &intervals {
        push_span(&mut spans, cursor, *afk_start, min_span_seconds);
        cursor = cursor.max(*afk_end);
    }
    push_span(&mut spans, cursor, span_end as f64, min_span_seconds);

    spans
}

/// Walks the derived spans and AFK periods into per-day statistics.
#[must_use]
pub fn compute_day_stats(
    activity_spans: &[Event],
    afk_events: &[Event],
    span_start: TimePoint,
    span_end: TimePoint,
    now: TimePoint,
) -> DayStats {
    let intervals = clamped_afk_intervals(afk_events, span_start, span_end, now);

    let mut stats = DayStats {
        break_count: intervals.len(),
        break_seconds: intervals.iter().map(|(start, end)| end - start).sum(),
        ..DayStats::default()
    };

    for span in activity_spans {
        let duration = span.duration_or_zero();
        stats.active_seconds += duration;
        if duration > stats.longest_focus_seconds {
            stats.longest_focus_seconds = duration;
            stats.longest_focus_start = span.timestamp;
            stats.longest_focus_end = span.timestamp + duration.round() as i64;
        }
    }

    stats
}

/// AFK periods clamped to the span, merged where they overlap, in time order.
fn clamped_afk_intervals(
    afk_events: &[Event],
    span_start: TimePoint,
    span_end: TimePoint,
    now: TimePoint,
) -> Vec<(f64, f64)> {
    let mut intervals: Vec<(f64, f64)> = afk_events
        .iter()
        .filter(|event| event.kind == EventKind::Afk)
        .filter_map(|event| {
            let start = (event.timestamp.max(span_start)) as f64;
            let end = event.end_seconds(now).min(span_end as f64);
            (end > start).then_some((start, end))
        })
        .collect();

    intervals.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = last_end.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn push_span(spans: &mut Vec<Event>, from: f64, to: f64, min_span_seconds: f64) {
    let duration = to - from;
    if duration < min_span_seconds.max(0.0) || duration <= 0.0 {
        return;
    }

    let start = from.round() as TimePoint;
    spans.push(
        Event::new(EventKind::Activity, start, start)
            .with_duration(duration)
            .with_lane(ACTIVITY_LANE)
            .with_label("Active"),
    );
}
