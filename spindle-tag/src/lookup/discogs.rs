//! Discogs lookup provider (fallback)
//!
//! Database search against the Discogs API, authenticated with the user's
//! personal access token from the config file. Only constructed when a
//! token is configured; without one the fallback stays disabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Candidate, LookupError, LookupProvider};

const DISCOGS_BASE_URL: &str = "https://api.discogs.com";
const USER_AGENT: &str = "spindle/0.1.0 (https://github.com/spindle/spindle)";
const SEARCH_LIMIT: usize = 10;

/// Discogs database search response
#[derive(Debug, Deserialize)]
struct DiscogsSearch {
    #[serde(default)]
    results: Vec<DiscogsResult>,
}

#[derive(Debug, Deserialize)]
struct DiscogsResult {
    /// "Artist - Album" for release results
    title: String,
    year: Option<String>,
}

/// Discogs lookup provider
pub struct DiscogsProvider {
    http_client: reqwest::Client,
    token: String,
}

impl DiscogsProvider {
    pub fn new(token: String) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self { http_client, token })
    }

    fn to_candidate(result: DiscogsResult) -> Candidate {
        // Release titles come as "Artist - Album"; fall back to album-only
        // when the separator is missing.
        let (artist, album) = match result.title.split_once(" - ") {
            Some((artist, album)) => (Some(artist.trim().to_string()), album.trim().to_string()),
            None => (None, result.title),
        };

        Candidate {
            source: "Discogs".to_string(),
            artist,
            album: Some(album),
            year: result.year.filter(|y| !y.is_empty()),
        }
    }
}

#[async_trait]
impl LookupProvider for DiscogsProvider {
    fn name(&self) -> &'static str {
        "Discogs"
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, LookupError> {
        let url = format!("{}/database/search", DISCOGS_BASE_URL);

        tracing::debug!(query = %query, "Querying Discogs");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query), ("type", "release"), ("token", &self.token)])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LookupError::Api(status.as_u16(), error_text));
        }

        let search: DiscogsSearch = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(search
            .results
            .into_iter()
            .take(SEARCH_LIMIT)
            .map(Self::to_candidate)
            .collect())
    }
}
