use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::TimePoint;

/// Closed set of event kinds the engine understands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Activity,
    Git,
    Shell,
    Browser,
    File,
    Afk,
    Screenshot,
    Session,
    ProjectEntry,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Git => "git",
            Self::Shell => "shell",
            Self::Browser => "browser",
            Self::File => "file",
            Self::Afk => "afk",
            Self::Screenshot => "screenshot",
            Self::Session => "session",
            Self::ProjectEntry => "project-entry",
        }
    }
}

/// Composite identity, unique across the loaded event universe.
///
/// This is the only identity type the selection and sync subsystems reason
/// about; it renders as `"kind:id"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EventKey {
    pub kind: EventKind,
    pub id: i64,
}

impl EventKey {
    #[must_use]
    pub const fn new(kind: EventKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// A single timeline event as delivered by the data collaborator.
///
/// `duration_seconds` absent means the event is instantaneous. Kind-specific
/// payload rides along in `metadata` and is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub kind: EventKind,
    /// Start time, unix seconds.
    pub timestamp: TimePoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub lane_key: String,
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub metadata: Value,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, id: i64, timestamp: TimePoint) -> Self {
        Self {
            id,
            kind,
            timestamp,
            duration_seconds: None,
            lane_key: String::new(),
            label: String::new(),
            color: String::new(),
            metadata: Value::Null,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_lane(mut self, lane_key: impl Into<String>) -> Self {
        self.lane_key = lane_key.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey::new(self.kind, self.id)
    }

    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.duration_seconds.is_none()
    }

    /// Duration with negative and missing values collapsed to zero.
    #[must_use]
    pub fn duration_or_zero(&self) -> f64 {
        self.duration_seconds
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// End in unix seconds, capped so the event never extends past `now`.
    #[must_use]
    pub fn end_seconds(&self, now: TimePoint) -> f64 {
        let raw = self.timestamp as f64 + self.duration_or_zero();
        raw.min(now as f64)
    }
}
