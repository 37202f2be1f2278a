use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use turnover_core::config::SyncConfig;

use super::{FeedError, FeedResult, FeedSource, normalize_url};

/// Fetches feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    /// ## Summary
    /// Builds a client with the configured timeout and user agent.
    ///
    /// ## Errors
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &SyncConfig) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpFeedSource {
    #[tracing::instrument(skip(self))]
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = FeedResult<String>> + Send + 'a>> {
        Box::pin(async move {
            let url = normalize_url(url)?;
            let response = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, "text/calendar, */*;q=0.5")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(%status, "Feed responded with an error status");
                return Err(FeedError::Status {
                    status: status.as_u16(),
                });
            }

            let body = response.text().await?;
            tracing::debug!(bytes = body.len(), "Feed fetched");
            Ok(body)
        })
    }
}
