//! timeline-rs: timeline viewport and event aggregation engine.
//!
//! This crate provides the headless core of a zoomable, pannable
//! activity-history timeline: time/pixel scale math, temporal event
//! aggregation, width-based render classification, a multi-day data model,
//! dual-panel scroll synchronization and lasso selection. Rendering, data
//! fetching and presentation belong entirely to the host application.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod sync;
pub mod telemetry;

pub use api::{TimelineEngine, TimelineEngineConfig};
pub use error::{TimelineError, TimelineResult};
