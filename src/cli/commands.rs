//! Command handlers for the signs CLI
//!
//! This module wires configuration into the core components and runs them.
//! `serve` is the long-running service; `check` and `init-config` are one-shot
//! helpers for operators.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::refresh::{create_shutdown_channel, wait_for_shutdown_signal, SignalHandler};
use crate::app::server::router;
use crate::app::{
    AppState, HttpFetcher, HttpServer, RefreshScheduler, Schedule, ScheduleCache, SnapshotStore,
    UpdateOutcome,
};
use crate::cli::{Cli, CheckArgs, InitConfigArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Load the config file, apply CLI overrides and validate
pub async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    config.apply_overrides(&cli.overrides());
    config.validate()?;
    Ok(config)
}

/// Handle the serve command
///
/// Binds the listener first so a taken port fails fast, then runs the HTTP
/// server and the refresh scheduler side by side until a shutdown signal.
/// On shutdown the scheduler stop and the server drain run concurrently,
/// each bounded by its own timeout.
pub async fn handle_serve(config: AppConfig) -> Result<()> {
    config.log_warnings();
    let url = config.feed.parsed_url()?;
    let cache = Arc::new(ScheduleCache::new());

    let store = config.persistence.path.clone().map(SnapshotStore::new);
    if let Some(store) = &store {
        restore_snapshot(&cache, store).await;
    }

    let fetcher = Arc::new(HttpFetcher::new(url, &config.client)?);
    let mut scheduler = RefreshScheduler::new(
        Arc::clone(&cache),
        fetcher,
        Arc::new(config.feed.format),
        config.refresh.clone(),
    );
    if let Some(store) = store {
        scheduler = scheduler.with_snapshot_store(store);
    }
    let scheduler = Arc::new(scheduler);

    let state = AppState::new(Arc::clone(&cache), &config.assets);
    let app = router(state, &config.assets, config.server.request_timeout);
    let server = HttpServer::bind(&config.server, app).await?;

    println!("🚀 Serving schedule on http://{}", server.local_addr());
    println!(
        "   Refreshing {} every {:?}",
        config.feed.url, config.refresh.interval
    );

    let (shutdown_tx, _) = create_shutdown_channel();
    let _signal_task = SignalHandler::new(shutdown_tx.clone()).setup();
    let shutdown_rx = shutdown_tx.subscribe();

    let server_shutdown = wait_for_shutdown_signal(shutdown_tx.subscribe());
    let server_task = tokio::spawn(server.serve(server_shutdown));

    // Warm-up runs alongside the server so requests are answered from the
    // first moment, even if the upstream is slow
    let start_task = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.start().await })
    };

    wait_for_shutdown_signal(shutdown_rx).await;
    println!("\n🛑 Shutting down...");

    let stop_timeout = config.refresh.stop_timeout;
    let drain_timeout = config.server.shutdown_timeout;
    let (stop_result, drain_result) = tokio::join!(
        scheduler.stop(stop_timeout),
        tokio::time::timeout(drain_timeout, server_task),
    );

    if start_task.is_finished() {
        if let Ok(Err(e)) = start_task.await {
            warn!("Scheduler failed to start: {}", e);
        }
    } else {
        debug!("Initial refresh still in flight at shutdown");
    }

    let mut shutdown_errors = Vec::new();
    if let Err(e) = stop_result {
        shutdown_errors.push(AppError::from(e));
    }
    match drain_result {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => shutdown_errors.push(e.into()),
        Ok(Err(join_error)) => {
            shutdown_errors.push(AppError::generic(format!("Server task failed: {join_error}")))
        }
        Err(_) => warn!(
            "HTTP server did not drain within {:?}, dropping remaining connections",
            drain_timeout
        ),
    }

    println!("\n📊 Final schedule:");
    print_schedule_summary(&cache.snapshot());

    if shutdown_errors.is_empty() {
        println!("✅ Shutdown complete");
        Ok(())
    } else {
        println!("\nShutdown errors:");
        for error in &shutdown_errors {
            println!("  • {}", error);
        }
        // A scheduler stop timeout is reported but still exits cleanly
        match shutdown_errors.into_iter().find(|e| !e.is_recoverable()) {
            Some(fatal) => Err(fatal),
            None => Ok(()),
        }
    }
}

async fn restore_snapshot(cache: &ScheduleCache, store: &SnapshotStore) {
    match store.load().await {
        Ok(Some(schedule)) => {
            info!(
                "Restored {} presentations from {}",
                schedule.session_count,
                store.path().display()
            );
            cache.restore(schedule);
        }
        Ok(None) => debug!("No snapshot at {}", store.path().display()),
        Err(e) => warn!("Ignoring unusable snapshot: {}", e),
    }
}

/// Handle the check command
///
/// Runs one fetch and decode against a fresh cache and prints what a
/// display would see.
pub async fn handle_check(config: AppConfig, args: CheckArgs) -> Result<()> {
    let url = config.feed.parsed_url()?;
    let cache = Arc::new(ScheduleCache::new());
    let fetcher = Arc::new(HttpFetcher::new(url, &config.client)?);
    let scheduler = RefreshScheduler::new(
        Arc::clone(&cache),
        fetcher,
        Arc::new(config.feed.format),
        config.refresh.clone(),
    );

    println!("🔍 Checking {} (format: {})", config.feed.url, config.feed.format);
    let started = Instant::now();

    match scheduler.refresh_once().await {
        Ok(UpdateOutcome::Replaced { .. }) | Ok(UpdateOutcome::Unchanged) => {
            println!("✅ Feed decoded in {:?}", started.elapsed());
        }
        Err(e) => {
            println!("❌ Feed check failed ({})", e.category());
            return Err(e);
        }
    }

    let snapshot = cache.snapshot();
    print_schedule_summary(&snapshot);

    if args.limit > 0 {
        println!();
        for presentation in snapshot.presentations.iter().take(args.limit) {
            println!(
                "  {}  {:<24}  {}",
                presentation.start_time().format("%a %H:%M"),
                truncate(&presentation.event.location, 24),
                presentation.name()
            );
        }
        if snapshot.session_count > args.limit {
            println!("  ... and {} more", snapshot.session_count - args.limit);
        }
    }

    Ok(())
}

fn print_schedule_summary(schedule: &Schedule) {
    let rooms: BTreeSet<&str> = schedule
        .presentations
        .iter()
        .map(|p| p.event.location.as_str())
        .collect();
    let first = schedule.presentations.iter().map(|p| p.start_time()).min();
    let last = schedule.presentations.iter().map(|p| p.end_time()).max();

    println!("  Presentations: {}", schedule.session_count);
    println!("  Rooms: {}", rooms.len());
    if let (Some(first), Some(last)) = (first, last) {
        println!("  Span: {} to {}", first.to_rfc3339(), last.to_rfc3339());
    }
    if let Some(hash) = &schedule.content_hash {
        println!("  Content hash: {}", hash);
    }
    if let Some(updated) = schedule.last_update_time {
        println!("  Last update: {}", updated.to_rfc3339());
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

/// Handle the init-config command
pub async fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => AppConfig::default_config_path()?,
    };

    if AppConfig::write_default_config(&path, args.force).await? {
        println!("📁 Created default configuration file:");
        println!("   {}", path.display());
        println!("   You can customize settings by editing this file.");
    } else {
        println!("ℹ️  Configuration file already exists: {}", path.display());
        println!("   Use --force to overwrite it.");
    }
    Ok(())
}
