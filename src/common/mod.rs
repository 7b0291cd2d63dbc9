//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod ids;
pub mod log;
pub mod time;

pub use config::{AppCfg, LogFormat};
pub use error::{ErrorCode, LifecycleError, LifecycleResult};
