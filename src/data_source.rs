//! Document sources for DDS text
//!
//! Dimension discovery only needs the text behind a URL. The [`DocumentSource`]
//! trait keeps that seam narrow so the parser can be driven by the HTTP client in
//! a live session and by an in-memory map in tests or offline runs.

use crate::errors::{OceanDapError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Default request timeout for remote documents
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Basic interface for fetching the text of a document
#[async_trait]
pub trait DocumentSource {
    /// Fetch the full body of `url` as text
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP-backed source used against live OPeNDAP servers
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a source with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oceandap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        info!(url, "fetching document");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let text = response.text().await?;
        debug!(url, bytes = text.len(), "document received");
        Ok(text)
    }
}

/// In-memory source keyed by URL
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` as the body served for `url`
    pub fn insert(&mut self, url: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(url.into(), text.into());
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| OceanDapError::Generic(format!("no document registered for {url}")))
    }
}
