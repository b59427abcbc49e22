//! Background schedule refresh
//!
//! This module ties the fetcher, decoder and cache together:
//!
//! - [`scheduler`] - The [`RefreshScheduler`] lifecycle and periodic loop
//! - [`signals`] - Ctrl-C / SIGTERM handling and the shutdown broadcast
//! - [`config`] - Interval and stop timeout settings
//!
//! The scheduler is the only writer to the [`ScheduleCache`]; the HTTP layer
//! only reads. They share nothing else.
//!
//! [`ScheduleCache`]: crate::app::cache::ScheduleCache

pub mod config;
pub mod scheduler;
pub mod signals;

pub use config::RefreshConfig;
pub use scheduler::{RefreshScheduler, SchedulerState};
pub use signals::{create_shutdown_channel, wait_for_shutdown_signal, SignalHandler};
