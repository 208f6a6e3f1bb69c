//! Command-line surface for playlister.

pub mod commands;
pub mod errors;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Playlister CLI
#[derive(Parser, Debug)]
#[command(name = "playlister", version, about = "Spotify playlist helper")]
pub struct Cli {
    /// Access token to use for this run instead of the stored one (not saved)
    #[arg(short, long, env = "PLAYLISTER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Spotify client id (saved to the config file)
    #[arg(short, long, env = "PLAYLISTER_CLIENT_ID")]
    pub client: Option<String>,

    /// Spotify client secret (saved to the config file)
    #[arg(short, long, env = "PLAYLISTER_CLIENT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Redirect URL registered for the client
    #[arg(short, long, env = "PLAYLISTER_REDIRECT_URI")]
    pub redirect: Option<String>,

    /// Path to the config file
    #[arg(short, long, env = "PLAYLISTER_CONFIG")]
    pub path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "PLAYLISTER_LOG", default_value = "info")]
    pub log_level: String,

    /// Seconds to wait for the browser authorization to complete
    #[arg(long, default_value_t = 300)]
    pub auth_timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make sure a valid access token is on record
    Auth(AuthArgs),
    /// Print the current access token
    Token,
    /// Search for a track
    Search(SearchArgs),
    /// Read or write config fields
    Config(ConfigArgs),
    /// Manage named playlists
    Playlist(PlaylistArgs),
}

/// Arguments for `playlister auth`.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    /// Run the browser authorization even if a token is on record
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `playlister search`.
#[derive(Parser, Debug)]
pub struct SearchArgs {
    #[arg(long)]
    pub artist: String,
    #[arg(long)]
    pub title: String,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print a field (client, secret, token, refresh, validity, playlists)
    Get { field: String },
    /// Set the client id or secret
    Set { field: String, value: String },
}

#[derive(Parser, Debug)]
pub struct PlaylistArgs {
    #[command(subcommand)]
    pub command: PlaylistCommands,
}

#[derive(Subcommand, Debug)]
pub enum PlaylistCommands {
    /// Map a name to a Spotify playlist id
    Add { name: String, id: String },
    /// Forget a named playlist
    Remove { name: String },
    /// List named playlists
    List,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
