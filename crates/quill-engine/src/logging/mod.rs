//! Logging utilities.
//!
//! This module centralizes logger initialization. It sticks to the `log`
//! facade; `env_logger` is the only backend wired in.

mod init;

pub use init::{LoggingConfig, init_logging};
