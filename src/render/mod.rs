//! Render module
//!
//! Decouples the unbounded inbound message rate from a bounded display
//! refresh rate: frames are staged unconditionally, then sampled into the
//! display state on a timer.

mod display;
mod scheduler;
mod staging;

pub use display::{ConnectionStatus, DisplayRow, DisplayState, MetricsSurface, SharedDisplay};
pub use scheduler::{periodic, RenderScheduler};
pub use staging::{StagedFrame, StagingCell};
