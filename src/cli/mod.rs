//! Command-line interface components
//!
//! Argument parsing and the handlers behind each subcommand.

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, FeedArgs, GlobalArgs, InitConfigArgs, ServeArgs};
pub use commands::{handle_check, handle_init_config, handle_serve, load_config};
