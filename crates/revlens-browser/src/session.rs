//! The capability contract every browser backend satisfies.
//!
//! A `BrowserSession` owns zero or more `BrowserContext`s, each with its own
//! identity; a context owns its `BrowserPage`s. Ownership is strictly
//! downward: closing a context releases its remaining pages, closing a
//! session releases everything.

use crate::error::Result;
use crate::identity::ContextIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How long `navigate` waits before handing the page back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// DOM is parsed; sub-resources may still be loading. Tolerates slow
    /// third-party pages.
    DomContentLoaded,
    /// Full load event.
    Load,
}

/// The response a navigation produced, when one was obtained at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResponse {
    /// HTTP status of the main document, when the backend could observe it.
    pub status: Option<u16>,
}

/// A running browser process.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open an isolated context presenting the given identity.
    async fn new_context(&self, identity: ContextIdentity) -> Result<Box<dyn BrowserContext>>;

    /// Shut the browser down.
    async fn close(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn BrowserSession")
    }
}

/// An isolated cookie/identity scope inside a session.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    /// Open a fresh page (tab) in this context.
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>>;

    /// Close this context and any pages still open in it.
    async fn close(&self) -> Result<()>;
}

/// A single tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate, bounded by `timeout`. `Ok(None)` means the navigation
    /// settled without a response object (e.g. aborted by the site).
    async fn navigate(
        &self,
        url: &str,
        timeout: Duration,
        wait: WaitUntil,
    ) -> Result<Option<NavigationResponse>>;

    /// Evaluate a script in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Current page title.
    async fn title(&self) -> Result<String>;

    /// Current (post-redirect) URL.
    async fn current_url(&self) -> Result<String>;

    /// Rendered document HTML.
    async fn content(&self) -> Result<String> {
        let value = self
            .evaluate("document.documentElement ? document.documentElement.outerHTML : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Visible body text, as a user would see it.
    async fn body_text(&self) -> Result<String> {
        let value = self
            .evaluate("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Release this page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Acquires browser sessions.
///
/// The job runner and the validator fallback go through this seam so tests
/// can hand out scripted sessions instead of real browsers.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launch (or hand out) a session.
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>>;
}
