//! MusicBrainz lookup provider (primary)
//!
//! Release search against the public MusicBrainz API. No authentication,
//! but the API requires a meaningful User-Agent and allows one request per
//! second, enforced here with a local rate limiter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{Candidate, LookupError, LookupProvider};

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = "spindle/0.1.0 (https://github.com/spindle/spindle)";
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second
const SEARCH_LIMIT: u32 = 10;

/// MusicBrainz release search response
#[derive(Debug, Deserialize)]
struct MBReleaseSearch {
    #[serde(default)]
    releases: Vec<MBRelease>,
}

#[derive(Debug, Deserialize)]
struct MBRelease {
    /// Release title
    title: String,
    /// Release date in YYYY-MM-DD format
    date: Option<String>,
    /// Artist credits for this release
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MBArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct MBArtistCredit {
    /// Display name (may differ from the artist name for collaborations)
    name: String,
}

/// Rate limiter enforcing the provider's request interval
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// MusicBrainz lookup provider
pub struct MusicBrainzProvider {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl MusicBrainzProvider {
    pub fn new() -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    fn to_candidate(release: MBRelease) -> Candidate {
        let artist = if release.artist_credit.is_empty() {
            None
        } else {
            Some(
                release
                    .artist_credit
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        // "YYYY-MM-DD" or "YYYY"; keep the year only
        let year = release
            .date
            .as_deref()
            .map(|d| d.chars().take(4).collect::<String>())
            .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()));

        Candidate {
            source: "MusicBrainz".to_string(),
            artist,
            album: Some(release.title),
            year,
        }
    }
}

#[async_trait]
impl LookupProvider for MusicBrainzProvider {
    fn name(&self) -> &'static str {
        "MusicBrainz"
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, LookupError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/release/", MUSICBRAINZ_BASE_URL);

        tracing::debug!(query = %query, "Querying MusicBrainz");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("fmt", "json"),
                ("limit", &SEARCH_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LookupError::Api(status.as_u16(), error_text));
        }

        let search: MBReleaseSearch = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(search
            .releases
            .into_iter()
            .map(Self::to_candidate)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        assert!(MusicBrainzProvider::new().is_ok());
    }

    #[test]
    fn test_candidate_from_release_json() {
        let json = r#"{
            "releases": [
                {
                    "title": "Blue Album",
                    "date": "1994-05-10",
                    "artist-credit": [{"name": "Weezer"}]
                },
                {
                    "title": "Untitled",
                    "artist-credit": []
                }
            ]
        }"#;

        let search: MBReleaseSearch = serde_json::from_str(json).unwrap();
        let candidates: Vec<_> = search
            .releases
            .into_iter()
            .map(MusicBrainzProvider::to_candidate)
            .collect();

        assert_eq!(candidates[0].artist.as_deref(), Some("Weezer"));
        assert_eq!(candidates[0].album.as_deref(), Some("Blue Album"));
        assert_eq!(candidates[0].year.as_deref(), Some("1994"));
        assert_eq!(candidates[0].source, "MusicBrainz");

        assert!(candidates[1].artist.is_none());
        assert!(candidates[1].year.is_none());
    }

    #[test]
    fn test_bad_date_is_dropped() {
        let release = MBRelease {
            title: "T".to_string(),
            date: Some("??".to_string()),
            artist_credit: vec![],
        };
        let candidate = MusicBrainzProvider::to_candidate(release);
        assert!(candidate.year.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200); // short interval to keep the test fast

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }
}
