//! Ordered provider fallback with short-circuit on first hit.

use crate::error::Result;
use crate::provider::ImageProvider;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Tries providers in order and returns the first non-empty result set.
///
/// A provider that errors, times out, or returns nothing is skipped; later
/// providers are only consulted when every earlier one came up empty. A
/// single jittered delay runs before the first attempt to avoid a
/// recognizable cadence.
pub struct ProviderCascade {
    providers: Vec<Box<dyn ImageProvider>>,
    timeout: Duration,
    jitter_ms: (u64, u64),
}

impl ProviderCascade {
    pub fn new(providers: Vec<Box<dyn ImageProvider>>, timeout: Duration) -> Self {
        Self {
            providers,
            timeout,
            jitter_ms: (500, 1500),
        }
    }

    /// Override the pre-attempt jitter range. `(0, 0)` disables it.
    pub fn with_jitter(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.jitter_ms = (min_ms, max_ms);
        self
    }

    /// Resolve up to `limit` image URLs for the query.
    ///
    /// Returns an empty vec when every provider failed or found nothing;
    /// exhaustion is not an error.
    pub async fn resolve(&self, query: &str, limit: usize) -> Vec<String> {
        let delay = {
            let (min, max) = self.jitter_ms;
            rand::thread_rng().gen_range(min..=max)
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.fetch(query, limit)).await {
                Ok(Ok(images)) if !images.is_empty() => {
                    debug!(
                        provider = provider.name(),
                        count = images.len(),
                        "provider produced images"
                    );
                    let mut images = images;
                    images.truncate(limit);
                    return images;
                }
                Ok(Ok(_)) => {
                    debug!(provider = provider.name(), "provider returned no images");
                }
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), "provider failed: {}", e);
                }
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        timeout_secs = self.timeout.as_secs(),
                        "provider timed out"
                    );
                }
            }
        }
        Vec::new()
    }
}
