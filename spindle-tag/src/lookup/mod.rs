//! Online metadata lookup
//!
//! Providers are tried strictly in order; the first non-empty result set
//! wins and later providers are never consulted, nor are results merged.
//! A provider failure counts the same as an empty result. Candidates are
//! only suggestions: the caller must explicitly accept one before anything
//! flows into an edit.

pub mod discogs;
pub mod musicbrainz;

use async_trait::async_trait;
use thiserror::Error;

pub use discogs::DiscogsProvider;
pub use musicbrainz::MusicBrainzProvider;

/// Lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network-level failure (DNS, timeout, connection)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One candidate field set returned by a provider, in provider-ranked order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Provider that produced this candidate
    pub source: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
}

/// A metadata lookup provider
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Provider name for display and logging
    fn name(&self) -> &'static str;

    /// Search for release candidates matching `query`
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, LookupError>;
}

/// Ordered chain of lookup providers, first non-empty result wins
pub struct LookupChain {
    providers: Vec<Box<dyn LookupProvider>>,
}

impl LookupChain {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn push(&mut self, provider: Box<dyn LookupProvider>) {
        self.providers.push(provider);
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Query providers sequentially until one returns candidates
    ///
    /// Failures are logged and treated like an empty result; an empty
    /// return means no provider had anything, which is non-fatal.
    pub async fn search(&self, query: &str) -> Vec<Candidate> {
        for provider in &self.providers {
            match provider.search(query).await {
                Ok(candidates) if !candidates.is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        count = candidates.len(),
                        "Lookup matched"
                    );
                    return candidates;
                }
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), "No results, trying next");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Lookup failed, trying next");
                }
            }
        }

        Vec::new()
    }
}

impl Default for LookupChain {
    fn default() -> Self {
        Self::new()
    }
}
