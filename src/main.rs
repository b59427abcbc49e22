//! Signs CLI application
//!
//! Conference schedule backend for signage displays. Fetches the upstream
//! schedule on a fixed interval and serves the last good copy over HTTP.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signs::cli::{handle_check, handle_init_config, handle_serve, load_config, Cli, Commands};
use signs::config::AppConfig;
use signs::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // init-config must work even when the existing config file is broken
    let config = match cli.command {
        Commands::InitConfig(_) => None,
        _ => Some(load_config(&cli).await?),
    };

    init_logging(&log_level(&cli, config.as_ref()), cli.global.very_verbose);
    info!("Signs v{} starting", env!("CARGO_PKG_VERSION"));

    match (cli.command, config) {
        (Commands::Serve(_), Some(config)) => {
            info!("Executing serve command");
            handle_serve(config).await
        }
        (Commands::Check(args), Some(config)) => {
            info!("Executing check command");
            handle_check(config, args).await
        }
        (Commands::InitConfig(args), _) => handle_init_config(args).await,
        (_, None) => Err(AppError::generic("configuration was not loaded")),
    }
}

/// Verbosity flags win over the `[logging] level` value
fn log_level(cli: &Cli, config: Option<&AppConfig>) -> String {
    match (cli.log_level(), config) {
        (Some(level), _) => level.to_string().to_lowercase(),
        (None, Some(config)) => config.logging.level.clone(),
        (None, None) => "warn".to_string(),
    }
}

/// Initialize logging
///
/// `RUST_LOG` directives are kept; the chosen level applies to this crate.
fn init_logging(level: &str, show_target: bool) {
    let mut filter = EnvFilter::from_default_env();
    match format!("signs={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level {:?}: {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(show_target)
        .init();
}
