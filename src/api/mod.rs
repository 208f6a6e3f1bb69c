//! Spotify Web API calls made with an access token.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PlaylisterError, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// A track returned by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
}

/// Thin Web API client; tokens come from the caller.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: reqwest::Client,
    api_url: String,
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotifyClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Look up the best match for `artist` - `title`.
    pub async fn search(&self, token: &str, artist: &str, title: &str) -> Result<Option<Track>> {
        info!("Searching for {artist} - {title}");
        let query = format!("artist:{artist} track:{title}");
        let resp = self
            .client
            .get(format!("{}/search", self.api_url.trim_end_matches('/')))
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            return Err(PlaylisterError::api(
                status.as_u16(),
                format!("Failed with code {}: {reason}", status.as_u16()),
            ));
        }
        let payload: SearchResponse = resp.json().await?;
        let track = payload.tracks.items.into_iter().next().map(|item| Track {
            id: item.id,
            name: item.name,
            artist: item
                .artists
                .into_iter()
                .next()
                .map(|artist| artist.name)
                .unwrap_or_default(),
        });
        match &track {
            Some(_) => debug!("Track found"),
            None => debug!("Track not found"),
        }
        Ok(track)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}
