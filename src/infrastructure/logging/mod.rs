//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber. Console output
//! goes to stderr; an optional rolling JSON file is written via
//! tracing-appender.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
