//! Last.fm top tracks → Spotify playlist sync.
//!
//! One sync run fetches a user's most played tracks from Last.fm, looks each
//! one up on Spotify and overwrites a playlist with the hits, in rank order.
//! Runs are triggered from the command line or through a small HTTP service.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the sync trigger and the authorization helper
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration loaded from environment variables
//! - `error` - Error types for every stage of a run
//! - `lastfm` - Last.fm top tracks adapter
//! - `server` - Router assembly and server bootstrapping
//! - `spotify` - Spotify Web API client and OAuth flows
//! - `sync` - The fetch → match → replace procedure
//! - `types` - Data structures and wire types
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use topsync::{config, sync, utils};
//!
//! #[tokio::main]
//! async fn main() -> topsync::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     let http = utils::http_client(config.request_timeout)?;
//!     let report = sync::run_with_config(&config, &http).await?;
//!     println!("{} tracks written", report.written);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod lastfm;
pub mod server;
pub mod spotify;
pub mod sync;
pub mod types;
pub mod utils;

/// Result alias for glue code that only needs to report a failure.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// ```
/// info!("Fetched {} top tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with code 1.
///
/// Only the binary's command layer uses this; library code returns errors.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
