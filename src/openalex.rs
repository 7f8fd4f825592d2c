//! OpenAlex publication-volume client.
//!
//! Resolves a venue's total publication volume via the OpenAlex sources API,
//! used by the rate-context enricher to turn retraction counts into rates.
//!
//! API Best Practices (per OpenAlex docs):
//! - Use `mailto:email` parameter for polite pool (10 req/s vs 1 req/s)
//! - Prefer the canonical `sources/issn:` route when an ISSN is available
//!
//! Volume lookup is strictly fail-open: every network, status, or parse
//! problem surfaces as "no data", never as an error into the core.

use crate::enrich::PublicationLookup;
use crate::error::{GuardError, Result};
use crate::identity::NormalizedIdentity;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// OpenAlex API base URL
const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Email for polite pool access
const POLITE_EMAIL: &str = "scholarguard@example.com";

/// HTTP deadline for one volume lookup
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenAlex sources API response structures
#[derive(Debug, Deserialize)]
struct SourcesResponse {
    results: Vec<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    display_name: Option<String>,
    works_count: Option<i64>,
}

/// Publication-volume lookup backed by the OpenAlex sources API.
///
/// Responses are memoized per process; the durable cache/TTL lives with the
/// out-of-scope cache engine.
pub struct OpenAlexVolumeClient {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, Option<u64>>>,
}

impl OpenAlexVolumeClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("scholarguard/1.0 (mailto:{})", POLITE_EMAIL))
            .build()
            .map_err(|e| GuardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cache_key(identity: &NormalizedIdentity) -> String {
        identity
            .issn
            .clone()
            .unwrap_or_else(|| identity.normalized_name.clone())
    }

    async fn fetch_count(&self, identity: &NormalizedIdentity) -> Option<u64> {
        let url = match &identity.issn {
            Some(issn) => build_issn_url(issn),
            None => build_search_url(&identity.normalized_name),
        };
        debug!(url = %url, "Querying OpenAlex sources");

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "OpenAlex request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "OpenAlex API error");
            return None;
        }

        let source = if identity.issn.is_some() {
            // The issn: route returns a single source object
            match response.json::<Source>().await {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(error = %e, "Failed to parse OpenAlex source");
                    None
                }
            }
        } else {
            match response.json::<SourcesResponse>().await {
                Ok(body) => body.results.into_iter().next(),
                Err(e) => {
                    warn!(error = %e, "Failed to parse OpenAlex sources response");
                    None
                }
            }
        };

        let source = source?;
        let count = source.works_count.filter(|c| *c >= 0).map(|c| c as u64);
        if let Some(count) = count {
            info!(
                venue = source.display_name.as_deref().unwrap_or("?"),
                works = count,
                "Resolved publication volume"
            );
        }
        count
    }
}

#[async_trait]
impl PublicationLookup for OpenAlexVolumeClient {
    async fn publication_count(&self, identity: &NormalizedIdentity) -> Option<u64> {
        let key = Self::cache_key(identity);

        {
            let cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(&key) {
                debug!(key = %key, "Volume cache hit");
                return *cached;
            }
        }

        let count = self.fetch_count(identity).await;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, count);
        }

        count
    }
}

/// Build the canonical sources URL for an ISSN
fn build_issn_url(issn: &str) -> String {
    format!(
        "{}/sources/issn:{}?mailto={}&select=display_name,works_count",
        OPENALEX_API_BASE, issn, POLITE_EMAIL
    )
}

/// Build a name-search sources URL
fn build_search_url(name: &str) -> String {
    format!(
        "{}/sources?search={}&per-page=1&mailto={}&select=display_name,works_count",
        OPENALEX_API_BASE,
        urlencoding::encode(name),
        POLITE_EMAIL
    )
}
