//! # Core Runtime
//!
//! Ambient services shared by the queue engine crates:
//!
//! - [`events`] - typed event bus carrying every externally observable state
//!   change (the "apply update" delivery channel)
//! - [`logging`] - `tracing` subscriber setup with configurable format and
//!   filtering
//! - [`error`] - runtime setup error type

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, QueueEvent, RunEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
