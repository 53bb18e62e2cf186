//! Page Fetcher - one timed GET with redirect following
//!
//! Redirects are followed by hand so the chain can be reported. The whole
//! exchange (every hop plus the body) runs under one hard timeout. No retries.

mod fixed;
mod types;


pub use fixed::FixedFetcher;
pub use types::{FetchConfig, FetchError, FetchedPage};

use std::future::Future;

use reqwest::{header::LOCATION, redirect::Policy, Client, Url};

/// Anything that can turn a URL into a page.
///
/// The collector and the predictor are generic over this so tests can run
/// without a network.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_inner(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        let mut redirects = Vec::new();

        loop {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                if redirects.len() >= self.config.max_redirects {
                    return Err(FetchError::TooManyRedirects(self.config.max_redirects));
                }
                let next = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| current.join(loc).ok())
                    .ok_or(FetchError::MissingLocation(status.as_u16()))?;

                log::trace!("{} -> {} ({})", current, next, status.as_u16());
                redirects.push(next.to_string());
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.text().await.map_err(|e| FetchError::Body(e.to_string()))?;
            return Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url: current.to_string(),
                status: status.as_u16(),
                redirects,
                body,
            });
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }
}
