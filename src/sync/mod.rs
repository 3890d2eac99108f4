use serde::{Deserialize, Serialize};

/// Pixel metrics for one hour section of the hour-grouped list panel.
///
/// `hour` is the hour index measured from the shared timeline origin (hour
/// zero sits at the top of the grid panel), so both panels agree on what an
/// hour means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourSection {
    pub hour: i64,
    pub offset_top: f64,
    pub height: f64,
}

/// Fixed-row-height grid panel metrics: every hour occupies `hour_height`
/// pixels below the header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    pub header_height: f64,
    pub hour_height: f64,
    pub viewport_height: f64,
}

impl GridMetrics {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.header_height.is_finite()
            && self.hour_height.is_finite()
            && self.hour_height > 0.0
            && self.viewport_height.is_finite()
            && self.viewport_height > 0.0
    }
}

/// Hour-grouped list panel metrics: each section's height is proportional to
/// its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMetrics {
    pub viewport_height: f64,
    pub sections: Vec<HourSection>,
}

/// Which panel originated the in-flight scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncSource {
    Grid,
    List,
}

/// Bidirectionally synchronizes the grid and list panels' scroll positions.
///
/// Both handlers map the source panel's viewport-center hour onto the other
/// panel and return the scroll offset that recenters it there. While one
/// side is marked as the scroll source, the opposite handler ignores
/// incoming events — those are echoes of the programmatic scroll it just
/// issued. The marker clears after a quiet period with no further events.
/// Missing layout metadata makes either handler a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSyncBridge {
    quiet_ms: i64,
    source: Option<SyncSource>,
    quiet_deadline_ms: i64,
    grid: Option<GridMetrics>,
    list: Option<ListMetrics>,
}

impl Default for ScrollSyncBridge {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ScrollSyncBridge {
    #[must_use]
    pub fn new(quiet_ms: i64) -> Self {
        Self {
            quiet_ms: quiet_ms.max(0),
            source: None,
            quiet_deadline_ms: 0,
            grid: None,
            list: None,
        }
    }

    /// Recomputed once per layout change, not per scroll event.
    pub fn set_grid_metrics(&mut self, metrics: GridMetrics) {
        self.grid = metrics.is_valid().then_some(metrics);
    }

    /// Recomputed once per data/layout change. Sections are kept sorted by
    /// hour so lookups are deterministic.
    pub fn set_list_metrics(&mut self, mut metrics: ListMetrics) {
        metrics.sections.retain(|section| {
            section.offset_top.is_finite() && section.height.is_finite() && section.height > 0.0
        });
        metrics.sections.sort_by_key(|section| section.hour);
        self.list = (metrics.viewport_height.is_finite() && metrics.viewport_height > 0.0)
            .then_some(metrics);
    }

    #[must_use]
    pub fn source(&self) -> Option<SyncSource> {
        self.source
    }

    /// Maps a grid scroll offset to the list offset that recenters the same
    /// fractional hour. Returns `None` for echoes, missing metadata or
    /// non-finite input.
    pub fn on_grid_scroll(&mut self, scroll_top: f64, at_ms: i64) -> Option<f64> {
        if self.is_echo(SyncSource::Grid, at_ms) || !scroll_top.is_finite() {
            return None;
        }

        let grid = self.grid?;
        let target = {
            let list = self.list.as_ref()?;
            if list.sections.is_empty() {
                return None;
            }

            let hour_f =
                (scroll_top + grid.viewport_height / 2.0 - grid.header_height) / grid.hour_height;
            let center_point = list_center_for_hour(list, hour_f);
            (center_point - list.viewport_height / 2.0).max(0.0)
        };

        self.mark_source(SyncSource::Grid, at_ms);
        Some(target)
    }

    /// Maps a list scroll offset back to the grid offset for the same
    /// fractional hour.
    pub fn on_list_scroll(&mut self, scroll_top: f64, at_ms: i64) -> Option<f64> {
        if self.is_echo(SyncSource::List, at_ms) || !scroll_top.is_finite() {
            return None;
        }

        let grid = self.grid?;
        let target = {
            let list = self.list.as_ref()?;
            if list.sections.is_empty() {
                return None;
            }

            let center = scroll_top + list.viewport_height / 2.0;
            let hour_f = hour_for_list_center(list, center);
            let grid_point = grid.header_height + hour_f * grid.hour_height;
            (grid_point - grid.viewport_height / 2.0).max(0.0)
        };

        self.mark_source(SyncSource::List, at_ms);
        Some(target)
    }

    /// An event from the panel opposite the marked source, inside the quiet
    /// window, is an echo of our own programmatic scroll.
    fn is_echo(&mut self, incoming: SyncSource, at_ms: i64) -> bool {
        match self.source {
            Some(source) if at_ms < self.quiet_deadline_ms => source != incoming,
            Some(_) => {
                self.source = None;
                false
            }
            None => false,
        }
    }

    fn mark_source(&mut self, source: SyncSource, at_ms: i64) {
        self.source = Some(source);
        self.quiet_deadline_ms = at_ms + self.quiet_ms;
    }
}

/// List-space center point for a fractional grid hour. An exact section is
/// interpolated by the fractional part; a missing hour snaps to the
/// temporally nearest section, clamping at the ends of the range.
fn list_center_for_hour(list: &ListMetrics, hour_f: f64) -> f64 {
    let hour = hour_f.floor();
    let fraction = hour_f - hour;
    let hour = hour as i64;

    if let Some(section) = list.sections.iter().find(|section| section.hour == hour) {
        return section.offset_top + fraction * section.height;
    }

    let first = &list.sections[0];
    let last = &list.sections[list.sections.len() - 1];
    if hour < first.hour {
        return first.offset_top;
    }
    if hour > last.hour {
        return last.offset_top + last.height;
    }

    let nearest = list
        .sections
        .iter()
        .min_by_key(|section| (section.hour - hour).abs())
        .unwrap_or(first);
    nearest.offset_top + nearest.height / 2.0
}

/// Fractional hour whose section span contains the list-space center point.
/// Points between sections resolve to the nearest section edge.
fn hour_for_list_center(list: &ListMetrics, center: f64) -> f64 {
    let mut best: Option<(f64, f64)> = None;

    for section in &list.sections {
        let top = section.offset_top;
        let bottom = section.offset_top + section.height;
        let distance = if center < top {
            top - center
        } else if center > bottom {
            center - bottom
        } else {
            0.0
        };

        let fraction = ((center - top) / section.height).clamp(0.0, 1.0);
        let hour_f = section.hour as f64 + fraction;
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, hour_f)),
        }

        if distance == 0.0 {
            break;
        }
    }

    best.map_or(0.0, |(_, hour_f)| hour_f)
}
