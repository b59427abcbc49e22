//! Periodic refresh loop with an explicit lifecycle
//!
//! ```text
//! Idle --start()--> Running --stop()--> Stopping --loop exits--> Stopped
//! ```
//!
//! `start` runs one refresh inline so the cache is warm before the loop is
//! spawned, then ticks at a fixed period. Fetch and decode failures are
//! logged and absorbed; the next tick is the retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::config::RefreshConfig;
use super::signals::create_shutdown_channel;
use crate::app::cache::{ScheduleCache, SnapshotStore, UpdateOutcome};
use crate::app::client::ScheduleFetcher;
use crate::app::feed::FeedDecoder;
use crate::errors::{Result, SchedulerError, SchedulerResult};

/// Lifecycle state of a [`RefreshScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopping => "stopping",
            SchedulerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// One fetch, decode and update cycle; shared by `start` and the loop task
#[derive(Clone)]
struct RefreshWorker {
    cache: Arc<ScheduleCache>,
    fetcher: Arc<dyn ScheduleFetcher>,
    decoder: Arc<dyn FeedDecoder>,
    store: Option<SnapshotStore>,
}

impl RefreshWorker {
    async fn run_once(&self) -> Result<UpdateOutcome> {
        let raw = match self.fetcher.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                self.cache.record_refresh_attempt();
                warn!(
                    source = %self.fetcher.describe(),
                    timeout = e.is_timeout(),
                    "Schedule fetch failed, keeping cached schedule: {}",
                    e
                );
                return Err(e.into());
            }
        };

        // Decoding parses the whole document, so keep it off the async workers
        let bytes = raw.len();
        let cache = Arc::clone(&self.cache);
        let decoder = Arc::clone(&self.decoder);
        let update = tokio::task::spawn_blocking(move || cache.try_update(&raw, decoder.as_ref()))
            .await
            .map_err(SchedulerError::from)?;

        match update {
            Ok(outcome @ UpdateOutcome::Replaced { session_count, .. }) => {
                info!("Schedule updated with {} presentations", session_count);
                self.persist().await;
                Ok(outcome)
            }
            Ok(UpdateOutcome::Unchanged) => {
                debug!("Schedule unchanged");
                Ok(UpdateOutcome::Unchanged)
            }
            Err(e) => {
                error!(
                    source = %self.fetcher.describe(),
                    bytes,
                    "Schedule decode failed, keeping cached schedule: {}",
                    e
                );
                Err(e.into())
            }
        }
    }

    async fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.cache.snapshot()).await {
                warn!("Failed to save schedule snapshot: {}", e);
            }
        }
    }
}

struct Lifecycle {
    state: SchedulerState,
    task: Option<JoinHandle<()>>,
}

/// Owns the background refresh task
pub struct RefreshScheduler {
    worker: RefreshWorker,
    config: RefreshConfig,
    lifecycle: Mutex<Lifecycle>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshScheduler {
    /// Create an idle scheduler feeding `cache`
    pub fn new(
        cache: Arc<ScheduleCache>,
        fetcher: Arc<dyn ScheduleFetcher>,
        decoder: Arc<dyn FeedDecoder>,
        config: RefreshConfig,
    ) -> Self {
        let (shutdown_tx, _) = create_shutdown_channel();
        Self {
            worker: RefreshWorker {
                cache,
                fetcher,
                decoder,
                store: None,
            },
            config,
            lifecycle: Mutex::new(Lifecycle {
                state: SchedulerState::Idle,
                task: None,
            }),
            shutdown_tx,
        }
    }

    /// Save every replaced snapshot to `store`
    pub fn with_snapshot_store(mut self, store: SnapshotStore) -> Self {
        self.worker.store = Some(store);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.lock().state
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Run a single refresh cycle outside the loop
    ///
    /// # Errors
    ///
    /// Returns the fetch or decode error. The cache is left serving its
    /// previous snapshot in either case.
    pub async fn refresh_once(&self) -> Result<UpdateOutcome> {
        self.worker.run_once().await
    }

    /// Warm the cache with one refresh, then spawn the periodic loop
    ///
    /// A failing warm-up refresh is logged and does not prevent the loop
    /// from starting.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidTransition` unless the scheduler is idle.
    pub async fn start(&self) -> SchedulerResult<()> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != SchedulerState::Idle {
                return Err(invalid_transition(lifecycle.state, SchedulerState::Running));
            }
            lifecycle.state = SchedulerState::Running;
        }

        info!(
            interval = ?self.config.interval,
            source = %self.worker.fetcher.describe(),
            "Starting schedule refresh"
        );
        if let Err(e) = self.worker.run_once().await {
            debug!(category = e.category(), "Initial refresh did not update the cache");
        }

        // The subscription must exist before anyone can call stop
        let shutdown_rx = self.shutdown_tx.subscribe();

        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != SchedulerState::Running {
            debug!("Scheduler stopped during initial refresh, not spawning loop");
            return Ok(());
        }
        lifecycle.task = Some(tokio::spawn(refresh_loop(
            self.worker.clone(),
            self.config.interval,
            shutdown_rx,
        )));
        Ok(())
    }

    /// Signal the loop to exit and wait up to `timeout` for it to finish
    ///
    /// An iteration already in progress runs to completion. Stopping an
    /// already stopped scheduler is a no-op.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::ShutdownTimeout` if the loop is still busy when the
    ///   timeout elapses; the scheduler stays `Stopping` and `stop` may be
    ///   called again
    /// - `SchedulerError::TaskFailed` if the loop task panicked
    /// - `SchedulerError::InvalidTransition` if the scheduler was never started
    pub async fn stop(&self, timeout: Duration) -> SchedulerResult<()> {
        let task = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.state {
                SchedulerState::Running | SchedulerState::Stopping => {
                    lifecycle.state = SchedulerState::Stopping;
                    lifecycle.task.take()
                }
                SchedulerState::Stopped => return Ok(()),
                SchedulerState::Idle => {
                    return Err(invalid_transition(
                        SchedulerState::Idle,
                        SchedulerState::Stopping,
                    ))
                }
            }
        };

        let _ = self.shutdown_tx.send(());

        let Some(mut task) = task else {
            self.set_state(SchedulerState::Stopped);
            return Ok(());
        };

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => {
                self.set_state(SchedulerState::Stopped);
                joined?;
                info!("Schedule refresh stopped");
                Ok(())
            }
            Err(_) => {
                warn!(
                    "Refresh loop did not stop within {:?}, abandoning wait",
                    timeout
                );
                self.lifecycle.lock().task = Some(task);
                Err(SchedulerError::ShutdownTimeout {
                    millis: timeout.as_millis(),
                })
            }
        }
    }

    fn set_state(&self, state: SchedulerState) {
        self.lifecycle.lock().state = state;
    }
}

fn invalid_transition(from: SchedulerState, to: SchedulerState) -> SchedulerError {
    SchedulerError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

async fn refresh_loop(
    worker: RefreshWorker,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                debug!("Refresh loop received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = worker.run_once().await {
                    debug!(
                        category = e.category(),
                        recoverable = e.is_recoverable(),
                        "Refresh tick failed"
                    );
                }
            }
        }
    }
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}
