//! Schedule Simulation Binary
//!
//! Serves archived conference feeds as if a conference were happening right
//! now, so displays can be exercised outside conference week. One archive is
//! picked as the primary conference and moved forward by whole days until its
//! first day is today; every other archive is merged in with its original
//! dates. The result is served as a JSON feed that `signs serve --url` can
//! point at.
//!
//! Run with: `cargo run --bin simulate -- --archive scale22x.xml --archive scale23x.json`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use signs::app::{FeedDecoder, FeedFormat, Presentation};

/// Simulated upstream schedule feed
#[derive(Parser, Debug)]
#[command(
    name = "simulate",
    version,
    about = "Serve archived conference schedules shifted to the current date"
)]
struct Args {
    /// Archived feed, JSON or XML (repeat for several conferences)
    #[arg(short, long = "archive", value_name = "FILE", required = true)]
    archives: Vec<PathBuf>,

    /// Index of the archive to date-shift (random when omitted)
    #[arg(long, value_name = "N")]
    primary: Option<usize>,

    /// Listen port
    #[arg(short, long, default_value_t = 2018)]
    port: u16,

    /// Bind host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

/// One archived conference
#[derive(Debug, Clone)]
struct Conference {
    name: String,
    presentations: Vec<Presentation>,
}

impl Conference {
    async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read archive {}", path.display()))?;
        let presentations = FeedFormat::Auto
            .decode(&raw)
            .with_context(|| format!("Failed to decode archive {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Loaded {} presentations from {}", presentations.len(), name);

        Ok(Self {
            name,
            presentations,
        })
    }
}

/// The merged feed and the archives it is rebuilt from
struct Simulation {
    conferences: Vec<Conference>,
    primary: Option<usize>,
    current: RwLock<Arc<Vec<Presentation>>>,
}

impl Simulation {
    fn new(conferences: Vec<Conference>, primary: Option<usize>) -> Result<Self> {
        if conferences.is_empty() {
            bail!("At least one archive is required");
        }
        if let Some(index) = primary {
            if index >= conferences.len() {
                bail!(
                    "Primary index {} is out of range for {} archives",
                    index,
                    conferences.len()
                );
            }
        }

        Ok(Self {
            conferences,
            primary,
            current: RwLock::new(Arc::new(Vec::new())),
        })
    }

    /// Current merged feed, rebuilt when nothing is running or upcoming
    fn feed_at(&self, now: DateTime<Utc>) -> Arc<Vec<Presentation>> {
        let current = Arc::clone(&self.current.read());
        if has_running_or_upcoming(&current, now) {
            return current;
        }

        let mut current = self.current.write();
        if !has_running_or_upcoming(&current, now) {
            *current = Arc::new(self.generate(now));
        }
        Arc::clone(&current)
    }

    fn generate(&self, now: DateTime<Utc>) -> Vec<Presentation> {
        let index = self
            .primary
            .unwrap_or_else(|| fastrand::usize(..self.conferences.len()));
        let primary = &self.conferences[index];
        info!("Selected {} as primary conference", primary.name);

        let mut merged = shift_to_today(&primary.presentations, now);
        for (i, conference) in self.conferences.iter().enumerate() {
            if i != index {
                debug!(
                    "Adding {} presentations from {} with original dates",
                    conference.presentations.len(),
                    conference.name
                );
                merged.extend(conference.presentations.iter().cloned());
            }
        }

        info!("Generated simulated feed with {} presentations", merged.len());
        merged
    }
}

/// Move every presentation by the same whole number of days so the earliest
/// one falls on today
///
/// Today is taken in the offset of the earliest presentation. Time of day and
/// offset are unchanged.
fn shift_to_today(presentations: &[Presentation], now: DateTime<Utc>) -> Vec<Presentation> {
    let Some(first) = presentations.iter().map(|p| p.start_time()).min() else {
        return Vec::new();
    };

    let today = now.with_timezone(first.offset()).date_naive();
    let shift = Duration::days(today.signed_duration_since(first.date_naive()).num_days());

    presentations
        .iter()
        .cloned()
        .map(|mut presentation| {
            presentation.event.start_time += shift;
            presentation.event.end_time += shift;
            presentation
        })
        .collect()
}

/// True when a presentation is in progress or starts within a day
fn has_running_or_upcoming(presentations: &[Presentation], now: DateTime<Utc>) -> bool {
    let horizon = now + Duration::hours(24);
    presentations.iter().any(|p| {
        let start = p.start_time().with_timezone(&Utc);
        p.event.is_running_at(now) || (start > now && start < horizon)
    })
}

// GET /signs
async fn signs(State(simulation): State<Arc<Simulation>>) -> Json<Vec<Presentation>> {
    Json(simulation.feed_at(Utc::now()).as_ref().clone())
}

fn router(simulation: Arc<Simulation>) -> Router {
    Router::new()
        .route("/signs", get(signs))
        .layer(TraceLayer::new_for_http())
        .with_state(simulation)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut conferences = Vec::with_capacity(args.archives.len());
    for path in &args.archives {
        conferences.push(Conference::load(path).await?);
    }
    let simulation = Arc::new(Simulation::new(conferences, args.primary)?);
    simulation.feed_at(Utc::now());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local_addr: SocketAddr = listener.local_addr()?;
    println!("🎭 Simulated feed at http://{}/signs", local_addr);

    axum::serve(listener, router(simulation))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl+C received, stopping simulator");
        })
        .await
        .context("Simulator server failed")?;

    Ok(())
}
