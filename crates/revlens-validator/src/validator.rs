//! Browser-backed validation of candidate profile URLs.

use crate::classify::{classify, PageEvidence};
use revlens_browser::{
    BrowserContext, BrowserSession, ContextIdentity, Result as BrowserResult, WaitUntil,
};
use revlens_core::{ValidationConfig, ValidationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Renders candidates one at a time and classifies each outcome.
///
/// Every candidate gets a fresh context with the fixed validator identity.
/// Browsing failures are verdicts, not errors: a candidate whose page
/// cannot be rendered is rejected with the failure as its reason.
pub struct ProfileValidator {
    session: Arc<dyn BrowserSession>,
    config: ValidationConfig,
}

impl ProfileValidator {
    pub fn new(session: Arc<dyn BrowserSession>, config: ValidationConfig) -> Self {
        Self { session, config }
    }

    /// Validate one candidate URL.
    pub async fn validate(&self, url: &str) -> ValidationResult {
        match self.render_and_classify(url).await {
            Ok(result) => result,
            Err(e) => {
                debug!(url, "candidate could not be rendered: {}", e);
                ValidationResult::rejected(url, format!("Browsing error: {e}"))
            }
        }
    }

    /// Validate candidates in order, stopping at a cancellation request.
    ///
    /// The token is checked between candidates only; a candidate already
    /// being rendered finishes and its verdict is kept.
    pub async fn validate_all(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
    ) -> Vec<ValidationResult> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            if cancel.is_cancelled() {
                info!(
                    checked = results.len(),
                    remaining = urls.len() - results.len(),
                    "validation cancelled"
                );
                break;
            }
            results.push(self.validate(url).await);
        }
        results
    }

    async fn render_and_classify(&self, url: &str) -> BrowserResult<ValidationResult> {
        let context = self.session.new_context(ContextIdentity::validator()).await?;
        let outcome = self.render_in_context(&*context, url).await;
        let _ = context.close().await;
        outcome
    }

    async fn render_in_context(
        &self,
        context: &dyn BrowserContext,
        url: &str,
    ) -> BrowserResult<ValidationResult> {
        let page = context.new_page().await?;

        let outcome = async {
            let response = page
                .navigate(
                    url,
                    Duration::from_secs(self.config.timeout_secs),
                    WaitUntil::DomContentLoaded,
                )
                .await?;

            let evidence = PageEvidence {
                response,
                title: page.title().await?,
                body_text: page.body_text().await?,
                final_url: page.current_url().await?,
            };
            Ok(classify(url, &evidence, &self.config))
        }
        .await;

        let _ = page.close().await;
        outcome
    }
}
