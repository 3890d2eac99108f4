mod data_model;
mod engine;
mod engine_config;
mod zoom_pan;

pub use data_model::{ModelSnapshot, MultiWindowDataModel, TopApp};
pub use engine::TimelineEngine;
pub use engine_config::{MergeGapConfig, TimelineEngineConfig};
pub use zoom_pan::{GestureState, LiveView, ViewCommit, ZoomPanController};
