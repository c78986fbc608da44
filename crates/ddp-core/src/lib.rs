//! Core types for the driver platform layer
//!
//! Everything in this crate is independent of the native provider:
//!
//! - `result` - The closed `ResultCode` enumeration and its stringification
//! - `log` - Log levels, the `Logger` filter, sinks and the process logger
//! - `assert` - Boolean-only assert/warn checks with a configurable break action
//! - `random` - 48-bit linear-congruential PRNG
//! - `config` - Serde-backed configuration for logging and asserts
//!
//! # Process Logger
//!
//! The `dd_print!`/`dd_assert!` family routes through the process logger
//! returned by [`log::logger`]. Install a custom one with
//! [`log::install_logger`] before the first diagnostic is emitted; after
//! that the logger is fixed for the lifetime of the process.

pub mod assert;
pub mod config;
pub mod log;
pub mod random;
pub mod result;

mod macros;

pub use assert::{AssertAction, ASSERTS_ENABLED};
pub use config::{AssertConfig, ConfigError, LogConfig, PlatformConfig, SinkKind};
pub use log::{install_logger, logger, LogLevel, LogSink, Logger, TracingSink};
pub use random::Random;
pub use result::{result_to_str, DdResult, ResultCode, UNRECOGNIZED_RESULT};
