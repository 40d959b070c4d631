//! Timer engine module.
//!
//! - `timer`: countdown state machine, completion and persistence
//! - `session`: break scheduling and the daily session counter
//! - `service`: async task that drives the tick loop

pub mod service;
pub mod session;
pub mod timer;

pub use service::{ServiceError, TimerHandle, TimerService};
pub use timer::{CompletionListener, TickOutcome, TimerEngine, TICK_INTERVAL};
