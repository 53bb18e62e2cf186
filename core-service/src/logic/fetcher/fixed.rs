//! Fixed Fetcher - canned responses, no network
//!
//! Backs `--offline` extraction and every test that must not touch the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{FetchError, FetchedPage, PageFetcher};

#[derive(Debug, Default)]
pub struct FixedFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    /// Answer for URLs without an entry; None means offline
    default: Option<Result<String, FetchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedFetcher {
    /// Every fetch fails with `Connect("offline")` unless a page is registered
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.pages.insert(url.into(), Err(error));
        self
    }

    /// Serve `body` for any URL that has no explicit entry
    pub fn serve_all(mut self, body: impl Into<String>) -> Self {
        self.default = Some(Ok(body.into()));
        self
    }

    /// Fail with `error` for any URL that has no explicit entry
    pub fn fail_all(mut self, error: FetchError) -> Self {
        self.default = Some(Err(error));
        self
    }

    /// Sleep before answering, to simulate slow sites
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl PageFetcher for FixedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.pages.get(url).or(self.default.as_ref()) {
            Some(Ok(body)) => Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                redirects: Vec::new(),
                body: body.clone(),
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Connect("offline".to_string())),
        }
    }
}
