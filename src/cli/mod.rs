//! # CLI Module
//!
//! Command implementations for the `topsync` binary. Each command loads the
//! configuration it needs, builds the shared HTTP client and delegates to the
//! library. Fatal problems are reported with [`crate::error!`], which exits.
//!
//! - [`auth`] - one-time interactive authorization; prints the refresh token
//! - [`serve`] - HTTP trigger service, one sync pass per request
//! - [`sync`] - one sync pass from the terminal, optionally as a dry run
//!
//! ```bash
//! topsync auth                 # once, then store SPOTIFY_REFRESH_TOKEN
//! topsync sync --dry-run       # see what would be written
//! topsync sync --limit 50      # overwrite the playlist with the top 50
//! topsync serve                # curl -X POST http://127.0.0.1:8080/
//! ```

mod auth;
mod serve;
mod sync;

pub use auth::auth;
pub use serve::serve;
pub use sync::sync;
