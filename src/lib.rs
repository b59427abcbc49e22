//! Signs Library
//!
//! Backend for conference signage displays. Periodically fetches the
//! conference schedule (JSON or XML), keeps a normalized snapshot in memory
//! and serves it over HTTP alongside sponsor logos and the display frontend.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
