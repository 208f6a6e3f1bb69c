//! Playlister — Spotify playlist helper
//!
//! Authenticates against the Spotify Web API with the OAuth2
//! authorization-code grant and keeps the credentials in a small TOML file so
//! later runs reuse (or refresh) the stored token instead of asking again.
//!
//! # Quick Start
//!
//! ```no_run
//! use playlister::prelude::*;
//!
//! # async fn example() -> playlister::error::Result<()> {
//! let mut manager = TokenManager::new(CredentialStore::new_default());
//! let token = manager.current_token().await?;
//! let track = SpotifyClient::new().search(&token, "Portishead", "Roads").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
