use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use super::{FeedError, FeedResult, FeedSource};

/// In-memory feed bodies keyed by URL, replaceable between syncs.
///
/// URLs without a body fail as unavailable.
#[derive(Debug, Default)]
pub struct MemoryFeedSource {
    bodies: Mutex<HashMap<String, Result<String, String>>>,
}

impl MemoryFeedSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.set_body(url, body);
        self
    }

    /// Serves `body` at `url` from now on.
    pub fn set_body(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), Ok(body.to_string()));
    }

    /// Makes fetches of `url` fail with `reason`.
    pub fn set_failure(&self, url: &str, reason: &str) {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), Err(reason.to_string()));
    }
}

impl FeedSource for MemoryFeedSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = FeedResult<String>> + Send + 'a>> {
        let entry = self
            .bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();
        Box::pin(async move {
            match entry {
                Some(Ok(body)) => Ok(body),
                Some(Err(reason)) => Err(FeedError::Unavailable(reason)),
                None => Err(FeedError::Unavailable(format!("no feed at {url}"))),
            }
        })
    }
}
