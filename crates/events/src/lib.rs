//! Event system for sitesmith
//!
//! Pipeline progress is broadcast on an [`EventBus`] so that anything
//! interested (logs, tests, future dashboards) can follow a task without the
//! pipeline knowing about it.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
