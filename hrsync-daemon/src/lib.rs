//! Long-running side of hrsync: file logging with rotation and the daily
//! sync scheduler.

mod error;
pub mod log_rotation;
pub mod logging;
mod runtime;
pub mod scheduler;

pub use error::DaemonError;
pub use logging::{init as init_logging, init_console, LogFormat};
pub use runtime::{run, start_blocking};
pub use scheduler::{run_until, Schedule};
