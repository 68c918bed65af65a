//! Retrieval of remote sources.
//!
//! [`Fetcher`] is the seam between reconcilers and the network: copies of
//! URL sources ask it for the bytes and never talk HTTP themselves.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context as _, Result};

/// Total time allowed for one request, including connect and body transfer.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can turn a URL into bytes.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Download the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success HTTP status.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetcher`] backed by a blocking [`ureq`] agent.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and a `dotlink/<version>` user agent.
    #[must_use]
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            user_agent: format!("dotlink/{}", crate::version()),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url} returned HTTP {status}");
        }
        response
            .body_mut()
            .read_to_vec()
            .with_context(|| format!("reading response body from {url}"))
    }
}

/// Memoises another [`Fetcher`] for the lifetime of one run.
///
/// Only successful downloads are remembered; a failed URL is retried the
/// next time an action asks for it.
#[derive(Debug)]
pub struct CachingFetcher {
    inner: Arc<dyn Fetcher>,
    cache: Mutex<HashMap<String, Vec<u8>>>,
}

impl CachingFetcher {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Fetcher>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl Fetcher for CachingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(url)
            .cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let bytes = self.inner.fetch(url)?;
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(url.to_string(), bytes.clone());
        Ok(bytes)
    }
}
