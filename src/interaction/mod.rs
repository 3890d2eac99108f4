use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{EventKey, Rect};

/// Modifier keys relevant to selection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickModifier {
    None,
    Shift,
    Ctrl,
}

/// Committed selection across the full loaded event universe.
///
/// Mutated only by the lasso controller and the explicit entry points below;
/// never persisted by the engine. Iteration order is insertion order, so
/// consumers see a stable sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: IndexSet<EventKey>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: EventKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn insert(&mut self, key: EventKey) -> bool {
        self.keys.insert(key)
    }

    pub fn toggle(&mut self, key: EventKey) {
        if !self.keys.shift_remove(&key) {
            self.keys.insert(key);
        }
    }

    pub fn extend(&mut self, keys: impl IntoIterator<Item = EventKey>) {
        for key in keys {
            self.keys.insert(key);
        }
    }

    pub fn replace_with(&mut self, keys: impl IntoIterator<Item = EventKey>) {
        self.keys.clear();
        self.extend(keys);
    }

    /// Silently drops keys that fail the validity predicate (stale keys
    /// referencing events no longer in the data model).
    pub fn retain_valid(&mut self, is_valid: impl Fn(&EventKey) -> bool) {
        let before = self.keys.len();
        self.keys.retain(|key| is_valid(key));
        let dropped = before - self.keys.len();
        if dropped > 0 {
            debug!(dropped, "dropped stale selection keys");
        }
    }
}

/// Applies the click mutation policy: a plain click replaces the selection
/// with the clicked item, shift adds, ctrl toggles.
pub fn apply_click(selection: &mut SelectionSet, key: EventKey, modifier: ClickModifier) {
    match modifier {
        ClickModifier::None => selection.replace_with([key]),
        ClickModifier::Shift => {
            selection.insert(key);
        }
        ClickModifier::Ctrl => selection.toggle(key),
    }
}

/// Adds the inclusive index range between `anchor` and `target` from the
/// caller-supplied display order (shift-click in a list). Returns `false`
/// when either endpoint is absent from the order.
pub fn select_range(
    selection: &mut SelectionSet,
    ordered: &[EventKey],
    anchor: EventKey,
    target: EventKey,
) -> bool {
    let Some(anchor_index) = ordered.iter().position(|key| *key == anchor) else {
        return false;
    };
    let Some(target_index) = ordered.iter().position(|key| *key == target) else {
        return false;
    };

    let (low, high) = if anchor_index <= target_index {
        (anchor_index, target_index)
    } else {
        (target_index, anchor_index)
    };
    selection.extend(ordered[low..=high].iter().copied());
    true
}

/// One rendered block plus the events it stands for. A merged block carries
/// every member key, so selecting it selects all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedItem {
    pub bounds: Rect,
    pub keys: Vec<EventKey>,
}

/// Freeform rectangular drag-selection over the renderer-supplied manifest.
///
/// `move_to` emits a live preview key set on every call without touching the
/// committed selection; `end` replaces the selection with the intersecting
/// set (or adds to it in additive mode).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LassoSelectionController {
    origin: Option<(f64, f64)>,
    current: (f64, f64),
    additive: bool,
}

impl LassoSelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests additive mode for the next `end`.
    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Drag rectangle normalized so width/height are non-negative regardless
    /// of drag direction.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        let (x0, y0) = self.origin?;
        let (x1, y1) = self.current;
        Some(Rect::from_corners(x0, y0, x1, y1))
    }

    pub fn start(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.origin = Some((x, y));
        self.current = (x, y);
    }

    /// Updates the drag corner and returns the preview key set. Non-finite
    /// coordinates leave the rectangle where it was.
    pub fn move_to(&mut self, x: f64, y: f64, manifest: &[RenderedItem]) -> Vec<EventKey> {
        if self.origin.is_none() {
            return Vec::new();
        }
        if x.is_finite() && y.is_finite() {
            self.current = (x, y);
        }
        self.hits(manifest)
    }

    /// Finishes the drag: the intersecting set replaces the selection, or
    /// extends it when additive mode was requested.
    pub fn end(&mut self, manifest: &[RenderedItem], selection: &mut SelectionSet) -> Vec<EventKey> {
        let hits = self.hits(manifest);
        if self.origin.take().is_some() {
            if self.additive {
                selection.extend(hits.iter().copied());
            } else {
                selection.replace_with(hits.iter().copied());
            }
        }
        self.additive = false;
        hits
    }

    /// Abandons the drag without mutating the selection (escape).
    pub fn cancel(&mut self) {
        self.origin = None;
        self.additive = false;
    }

    fn hits(&self, manifest: &[RenderedItem]) -> Vec<EventKey> {
        let Some(rect) = self.rect() else {
            return Vec::new();
        };
        if !rect.is_finite() {
            return Vec::new();
        }

        let mut keys: IndexSet<EventKey> = IndexSet::new();
        for item in manifest {
            if item.bounds.is_finite() && rect.intersects(item.bounds) {
                keys.extend(item.keys.iter().copied());
            }
        }
        keys.into_iter().collect()
    }
}
