//! # API Module
//!
//! HTTP handlers for the two small servers topsync runs.
//!
//! ## Sync service (`topsync serve`)
//!
//! - [`trigger_sync`] - `GET`/`POST /`, runs one sync pass; `200` with a
//!   confirmation or `500` with the failing stage and cause
//! - [`health`] - `GET /health`
//!
//! ## Authorization helper (`topsync auth`)
//!
//! - [`login`] - `GET /login`, redirects to the Spotify consent page
//! - [`callback`] - `GET /callback`, exchanges the code and hands the token
//!   to the waiting command
//! - [`health`] - `GET /health`
//!
//! Routers are assembled in [`crate::server`].

mod callback;
mod health;
mod login;
mod sync;

pub use callback::callback;
pub use health::health;
pub use login::login;
pub use sync::trigger_sync;
