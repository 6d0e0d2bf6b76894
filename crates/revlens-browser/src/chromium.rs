//! Chromium-backed implementation of the browser capability traits,
//! via chromiumoxide.

use crate::error::{BrowserError, Result};
use crate::identity::ContextIdentity;
use crate::session::{
    BrowserContext, BrowserPage, BrowserSession, NavigationResponse, SessionLauncher, WaitUntil,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use revlens_core::BrowserConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Reads the main document's HTTP status from the Navigation Timing API.
/// chromiumoxide does not expose the response object directly.
const NAV_STATUS_JS: &str = r"(() => {
    const entries = performance.getEntriesByType('navigation');
    if (!entries.length) return 0;
    return entries[0].responseStatus || 0;
})()";

/// A launched headless Chromium process.
pub struct ChromiumSession {
    browser: Arc<Mutex<Browser>>,
}

impl ChromiumSession {
    /// Launch Chromium with the given settings and spawn its event handler.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .arg("--disable-blink-features=AutomationControlled");
        if !config.headless {
            builder = builder.with_head();
        }
        let chromium_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drive the CDP event stream for the lifetime of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_context(&self, identity: ContextIdentity) -> Result<Box<dyn BrowserContext>> {
        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            identity,
            pages: Mutex::new(Vec::new()),
        }))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::debug!("browser close reported: {}", e);
        }
        Ok(())
    }
}

/// A page group with one identity. Pages still open when the context closes
/// are released with it.
pub struct ChromiumContext {
    browser: Arc<Mutex<Browser>>,
    identity: ContextIdentity,
    pages: Mutex<Vec<Page>>,
}

#[async_trait]
impl BrowserContext for ChromiumContext {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))?
        };

        // The identity covers all three fingerprint axes: the locale rides
        // along as the Accept-Language header.
        let agent = SetUserAgentOverrideParams::builder()
            .user_agent(self.identity.user_agent.as_str())
            .accept_language(self.identity.locale.as_str())
            .build()
            .map_err(BrowserError::Chromium)?;
        page.execute(agent)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(self.identity.viewport_width))
            .height(i64::from(self.identity.viewport_height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(BrowserError::Chromium)?;
        page.execute(metrics)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        self.pages.lock().await.push(page.clone());
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<()> {
        let pages: Vec<Page> = self.pages.lock().await.drain(..).collect();
        for page in pages {
            let _ = page.close().await;
        }
        Ok(())
    }
}

/// A single Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(
        &self,
        url: &str,
        timeout: Duration,
        wait: WaitUntil,
    ) -> Result<Option<NavigationResponse>> {
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            if wait == WaitUntil::Load {
                let _ = self.page.wait_for_navigation().await;
            }
            Ok::<(), BrowserError>(())
        };

        tokio::time::timeout(timeout, nav)
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url} exceeded {timeout:?}")))??;

        let status = self
            .evaluate(NAV_STATUS_JS)
            .await
            .ok()
            .and_then(|v| v.as_i64())
            .filter(|s| *s > 0)
            .and_then(|s| u16::try_from(s).ok());

        Ok(Some(NavigationResponse { status }))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    async fn title(&self) -> Result<String> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(url.map(|u| u.to_string()).unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

/// Launches one `ChromiumSession` per call.
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>> {
        let session = ChromiumSession::launch(&self.config).await?;
        Ok(Arc::new(session))
    }
}
