//! Scripted in-memory browser double.
//!
//! Used by the scanner, validator and job tests to exercise the full
//! pipeline without a real browser, and to audit resource hygiene by
//! counting open/close calls.

use crate::error::{BrowserError, Result};
use crate::identity::ContextIdentity;
use crate::session::{
    BrowserContext, BrowserPage, BrowserSession, NavigationResponse, SessionLauncher, WaitUntil,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counts every acquisition and release that passes through the double.
#[derive(Debug, Default)]
pub struct CallLedger {
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub navigations: AtomicUsize,
}

impl CallLedger {
    /// True when every opened context and page has been closed again.
    pub fn balanced(&self) -> bool {
        self.contexts_opened.load(Ordering::SeqCst) == self.contexts_closed.load(Ordering::SeqCst)
            && self.pages_opened.load(Ordering::SeqCst)
                == self.pages_closed.load(Ordering::SeqCst)
    }
}

/// What a navigation to one URL should produce.
#[derive(Debug, Clone)]
pub struct PageScript {
    /// Navigation settles without a response object.
    pub no_response: bool,
    /// HTTP status of the main document.
    pub status: Option<u16>,
    pub title: String,
    pub body_text: String,
    pub html: String,
    /// Post-redirect URL; defaults to the navigated URL.
    pub final_url: Option<String>,
    /// Navigation raises instead of rendering.
    pub navigation_error: Option<String>,
    /// Value returned by `evaluate` (consent probes and the like).
    pub evaluate_value: serde_json::Value,
}

impl Default for PageScript {
    fn default() -> Self {
        Self {
            no_response: false,
            status: Some(200),
            title: String::new(),
            body_text: String::new(),
            html: String::new(),
            final_url: None,
            navigation_error: None,
            evaluate_value: serde_json::Value::Bool(false),
        }
    }
}

struct MockState {
    scripts: Mutex<HashMap<String, PageScript>>,
    fallback: Mutex<PageScript>,
    ledger: Arc<CallLedger>,
    fail_contexts: AtomicBool,
}

/// A scripted browser session.
pub struct MockSession {
    state: Arc<MockState>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                scripts: Mutex::new(HashMap::new()),
                fallback: Mutex::new(PageScript::default()),
                ledger: Arc::new(CallLedger::default()),
                fail_contexts: AtomicBool::new(false),
            }),
        }
    }

    /// Script the page served for an exact URL.
    pub fn script_page(&self, url: impl Into<String>, script: PageScript) {
        self.state
            .scripts
            .lock()
            .expect("scripts lock")
            .insert(url.into(), script);
    }

    /// Script the page served for any URL without an exact entry.
    pub fn script_fallback(&self, script: PageScript) {
        *self.state.fallback.lock().expect("fallback lock") = script;
    }

    /// Make every `new_context` call fail.
    pub fn refuse_contexts(&self) {
        self.state.fail_contexts.store(true, Ordering::SeqCst);
    }

    pub fn ledger(&self) -> Arc<CallLedger> {
        Arc::clone(&self.state.ledger)
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn new_context(&self, _identity: ContextIdentity) -> Result<Box<dyn BrowserContext>> {
        if self.state.fail_contexts.load(Ordering::SeqCst) {
            return Err(BrowserError::Chromium("context refused".to_string()));
        }
        self.state
            .ledger
            .contexts_opened
            .fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockContext {
            state: Arc::clone(&self.state),
            pages: Mutex::new(Vec::new()),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.state
            .ledger
            .sessions_closed
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// Lets the context release pages whose owning future was dropped.
struct PageSlot {
    closed: AtomicBool,
}

struct MockContext {
    state: Arc<MockState>,
    pages: Mutex<Vec<Arc<PageSlot>>>,
}

#[async_trait]
impl BrowserContext for MockContext {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>> {
        self.state
            .ledger
            .pages_opened
            .fetch_add(1, Ordering::SeqCst);
        let slot = Arc::new(PageSlot {
            closed: AtomicBool::new(false),
        });
        self.pages.lock().expect("pages lock").push(Arc::clone(&slot));
        Ok(Box::new(MockPage {
            state: Arc::clone(&self.state),
            current: Mutex::new(None),
            slot,
        }))
    }

    async fn close(&self) -> Result<()> {
        // Downward ownership: pages never closed individually go with us.
        let slots: Vec<Arc<PageSlot>> = self.pages.lock().expect("pages lock").drain(..).collect();
        for slot in slots {
            if !slot.closed.swap(true, Ordering::SeqCst) {
                self.state
                    .ledger
                    .pages_closed
                    .fetch_add(1, Ordering::SeqCst);
            }
        }
        self.state
            .ledger
            .contexts_closed
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockPage {
    state: Arc<MockState>,
    current: Mutex<Option<(String, PageScript)>>,
    slot: Arc<PageSlot>,
}

impl MockPage {
    fn current_script(&self) -> Option<(String, PageScript)> {
        self.current.lock().expect("current lock").clone()
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn navigate(
        &self,
        url: &str,
        _timeout: Duration,
        _wait: WaitUntil,
    ) -> Result<Option<NavigationResponse>> {
        self.state
            .ledger
            .navigations
            .fetch_add(1, Ordering::SeqCst);

        let script = {
            let scripts = self.state.scripts.lock().expect("scripts lock");
            scripts
                .get(url)
                .cloned()
                .unwrap_or_else(|| self.state.fallback.lock().expect("fallback lock").clone())
        };

        if let Some(message) = &script.navigation_error {
            return Err(BrowserError::Navigation(message.clone()));
        }

        let response = if script.no_response {
            None
        } else {
            Some(NavigationResponse {
                status: script.status,
            })
        };

        *self.current.lock().expect("current lock") = Some((url.to_string(), script));
        Ok(response)
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(self
            .current_script()
            .map(|(_, s)| s.evaluate_value)
            .unwrap_or(serde_json::Value::Null))
    }

    async fn title(&self) -> Result<String> {
        Ok(self.current_script().map(|(_, s)| s.title).unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .current_script()
            .map(|(url, s)| s.final_url.unwrap_or(url))
            .unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.current_script().map(|(_, s)| s.html).unwrap_or_default())
    }

    async fn body_text(&self) -> Result<String> {
        Ok(self
            .current_script()
            .map(|(_, s)| s.body_text)
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if !self.slot.closed.swap(true, Ordering::SeqCst) {
            self.state
                .ledger
                .pages_closed
                .fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out one shared scripted session, or refuses to.
pub struct MockLauncher {
    session: Option<Arc<MockSession>>,
}

impl MockLauncher {
    pub fn new(session: Arc<MockSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// A launcher that cannot acquire a session.
    pub fn failing() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>> {
        match &self.session {
            Some(session) => Ok(Arc::clone(session) as Arc<dyn BrowserSession>),
            None => Err(BrowserError::Launch("mock launcher refused".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_navigation() {
        let session = MockSession::new();
        session.script_page(
            "https://example.com/u/jane",
            PageScript {
                status: Some(200),
                title: "Jane Doe (@jane)".to_string(),
                body_text: "Jane's profile".to_string(),
                ..PageScript::default()
            },
        );

        let context = session
            .new_context(ContextIdentity::randomized())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");

        let response = page
            .navigate(
                "https://example.com/u/jane",
                Duration::from_secs(5),
                WaitUntil::DomContentLoaded,
            )
            .await
            .expect("navigate")
            .expect("response");
        assert_eq!(response.status, Some(200));
        assert_eq!(page.title().await.expect("title"), "Jane Doe (@jane)");
        assert_eq!(
            page.current_url().await.expect("url"),
            "https://example.com/u/jane"
        );

        page.close().await.expect("close page");
        context.close().await.expect("close context");
        assert!(session.ledger().balanced());
    }

    #[tokio::test]
    async fn test_ledger_counts_every_acquisition() {
        let session = MockSession::new();
        let ledger = session.ledger();

        let context = session
            .new_context(ContextIdentity::randomized())
            .await
            .expect("context");
        let page_a = context.new_page().await.expect("page a");
        let page_b = context.new_page().await.expect("page b");

        assert_eq!(ledger.pages_opened.load(Ordering::SeqCst), 2);
        assert!(!ledger.balanced());

        page_a.close().await.expect("close a");
        page_b.close().await.expect("close b");
        context.close().await.expect("close context");
        assert!(ledger.balanced());
    }

    #[tokio::test]
    async fn test_context_close_releases_abandoned_pages() {
        let session = MockSession::new();
        let ledger = session.ledger();

        let context = session
            .new_context(ContextIdentity::randomized())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");
        // The page handle is dropped without close, as when the future
        // driving it is cancelled by a timeout.
        drop(page);
        assert!(!ledger.balanced());

        context.close().await.expect("close context");
        assert!(ledger.balanced());
    }

    #[tokio::test]
    async fn test_failing_launcher() {
        let launcher = MockLauncher::failing();
        let err = launcher.launch().await.expect_err("launch must fail");
        assert!(matches!(err, BrowserError::Launch(_)));
    }

    #[tokio::test]
    async fn test_navigation_error_script() {
        let session = MockSession::new();
        session.script_page(
            "https://broken.example",
            PageScript {
                navigation_error: Some("net::ERR_CONNECTION_RESET".to_string()),
                ..PageScript::default()
            },
        );

        let context = session
            .new_context(ContextIdentity::randomized())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");
        let err = page
            .navigate(
                "https://broken.example",
                Duration::from_secs(5),
                WaitUntil::DomContentLoaded,
            )
            .await
            .expect_err("navigation must fail");
        assert!(err.to_string().contains("ERR_CONNECTION_RESET"));

        page.close().await.expect("close page");
        context.close().await.expect("close context");
    }
}
