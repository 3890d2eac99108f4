use serde::{Deserialize, Serialize};

use crate::core::event::Event;

/// Lane name for the merged activity row synthesized from AFK gaps.
pub const ACTIVITY_LANE: &str = "activity";

/// Partial fixed ordering for timeline rows: a pinned head group, then
/// dynamically-discovered lanes by descending event count, then a fixed tail
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneOrderPolicy {
    /// Lane keys that always sort first, in this order.
    pub pinned_head: Vec<String>,
    /// Lane keys that always sort last, in this order.
    pub fixed_tail: Vec<String>,
}

impl Default for LaneOrderPolicy {
    fn default() -> Self {
        Self {
            pinned_head: vec![
                ACTIVITY_LANE.to_owned(),
                "screenshots".to_owned(),
                "sessions".to_owned(),
            ],
            fixed_tail: vec![
                "git".to_owned(),
                "shell".to_owned(),
                "files".to_owned(),
                "browser".to_owned(),
            ],
        }
    }
}

impl LaneOrderPolicy {
    fn head_index(&self, key: &str) -> Option<usize> {
        self.pinned_head.iter().position(|name| name == key)
    }

    fn tail_index(&self, key: &str) -> Option<usize> {
        self.fixed_tail.iter().position(|name| name == key)
    }
}

/// A named timeline row holding its events in timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Normalized (lowercased) lane key.
    pub key: String,
    /// Human-facing name resolved from the spellings seen in the data.
    pub display_name: String,
    /// Taken from the lane's first event.
    pub color: String,
    pub events: Vec<Event>,
}

impl Lane {
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

/// Case-insensitive lane identity.
#[must_use]
pub fn normalize_lane_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Resolves a display name from every spelling seen for a lane key.
///
/// Deterministic reduction over the sorted variants: prefer spellings whose
/// first character is uppercase, then the lexicographically smallest. Never
/// depends on map iteration order.
#[must_use]
pub fn resolve_display_name(variants: &[String]) -> String {
    let mut sorted: Vec<&String> = variants.iter().filter(|v| !v.is_empty()).collect();
    sorted.sort();
    sorted
        .iter()
        .find(|v| v.chars().next().is_some_and(char::is_uppercase))
        .or_else(|| sorted.first())
        .map(|v| (*v).clone())
        .unwrap_or_default()
}

/// Sorts lanes by the pinned-head / descending-count / fixed-tail policy.
/// Dynamic lanes with equal counts tie-break on key for determinism.
pub fn sort_lanes(lanes: &mut [Lane], policy: &LaneOrderPolicy) {
    lanes.sort_by(|a, b| lane_sort_rank(a, policy).cmp(&lane_sort_rank(b, policy)));
}

type LaneRank<'a> = (u8, usize, std::cmp::Reverse<usize>, &'a str);

fn lane_sort_rank<'a>(lane: &'a Lane, policy: &LaneOrderPolicy) -> LaneRank<'a> {
    if let Some(index) = policy.head_index(&lane.key) {
        (0, index, std::cmp::Reverse(0), lane.key.as_str())
    } else if let Some(index) = policy.tail_index(&lane.key) {
        (2, index, std::cmp::Reverse(0), lane.key.as_str())
    } else {
        (1, 0, std::cmp::Reverse(lane.count()), lane.key.as_str())
    }
}
