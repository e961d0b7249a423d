//! Logging infrastructure: structured, stdout-only `tracing` setup.

pub mod logger;

pub use logger::LoggerImpl;
