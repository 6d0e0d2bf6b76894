//! Parallel fan-out of one image reference to every reverse-image engine.
//!
//! Each engine runs in its own freshly-identified browser context. The
//! orchestrator joins when every engine has reported; results come back in
//! the fixed engine order with one slot per engine, failures included as
//! empty slots.

use crate::consent::ConsentResolver;
use crate::engine::EngineSpec;
use crate::error::{Result, SearchError};
use crate::scrape::extract_candidates;
use futures::future::join_all;
use rand::Rng;
use revlens_browser::{BrowserContext, BrowserSession, ContextIdentity, WaitUntil};
use revlens_core::{CandidateUrl, EngineResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct EngineOrchestrator {
    session: Arc<dyn BrowserSession>,
    specs: Vec<EngineSpec>,
    timeout: Duration,
    top_k: usize,
}

impl EngineOrchestrator {
    pub fn new(session: Arc<dyn BrowserSession>, timeout: Duration, top_k: usize) -> Self {
        Self::with_specs(session, EngineSpec::builtin(), timeout, top_k)
    }

    pub fn with_specs(
        session: Arc<dyn BrowserSession>,
        specs: Vec<EngineSpec>,
        timeout: Duration,
        top_k: usize,
    ) -> Self {
        Self {
            session,
            specs,
            timeout,
            top_k,
        }
    }

    /// Run every engine against one image reference and join on completion.
    ///
    /// Always returns one `EngineResult` per configured engine, in spec
    /// order. An engine that fails or times out contributes an empty slot.
    pub async fn search(&self, image_url: &str) -> Vec<EngineResult> {
        let runs = self
            .specs
            .iter()
            .map(|spec| self.run_engine(spec, image_url));
        join_all(runs).await
    }

    async fn run_engine(&self, spec: &EngineSpec, image_url: &str) -> EngineResult {
        match self.try_engine(spec, image_url).await {
            Ok(candidates) => {
                debug!(
                    engine = spec.name,
                    count = candidates.len(),
                    "engine produced candidates"
                );
                EngineResult {
                    engine: spec.name.to_string(),
                    candidates,
                }
            }
            Err(e) => {
                warn!(engine = spec.name, "engine failed: {}", e);
                EngineResult {
                    engine: spec.name.to_string(),
                    candidates: Vec::new(),
                }
            }
        }
    }

    async fn try_engine(&self, spec: &EngineSpec, image_url: &str) -> Result<Vec<CandidateUrl>> {
        let context = self
            .session
            .new_context(ContextIdentity::randomized())
            .await?;

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.scrape_engine(&*context, spec, image_url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SearchError::Engine {
                engine: spec.name.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        };

        let _ = context.close().await;
        outcome
    }

    async fn scrape_engine(
        &self,
        context: &dyn BrowserContext,
        spec: &EngineSpec,
        image_url: &str,
    ) -> Result<Vec<CandidateUrl>> {
        let page = context.new_page().await?;

        let outcome = async {
            let url = (spec.query_url)(image_url);
            page.navigate(&url, self.timeout, WaitUntil::DomContentLoaded)
                .await?;

            if !spec.consent.is_empty() {
                ConsentResolver::new().dismiss(&*page, spec.consent).await;
            }

            let settle = {
                let (min, max) = spec.settle_ms;
                rand::thread_rng().gen_range(min..=max)
            };
            tokio::time::sleep(Duration::from_millis(settle)).await;

            let html = page.content().await?;
            let candidates = extract_candidates(&html, spec.selectors, &spec.filter)
                .into_iter()
                .take(self.top_k)
                .map(|url| CandidateUrl {
                    engine: spec.name.to_string(),
                    url,
                })
                .collect();
            Ok::<Vec<CandidateUrl>, SearchError>(candidates)
        }
        .await;

        let _ = page.close().await;
        outcome
    }
}
