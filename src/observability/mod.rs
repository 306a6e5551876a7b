//! Observability: structured logging for the monitor and its stages.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
