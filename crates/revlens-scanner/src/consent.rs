//! Best-effort dismissal of cookie/consent overlays.
//!
//! Each trigger is polled under a short bounded visibility wait; the first
//! visible match is clicked. Absence of a match, or a click failure, is not
//! an error - the page is used as-is.

use revlens_browser::BrowserPage;
use std::time::{Duration, Instant};

const BUTTON_CLICK_JS: &str = r#"(() => {
    const label = '__LABEL__';
    const candidates = Array.from(document.querySelectorAll('button, div[role="button"]'));
    const hit = candidates.find(el => el.textContent.trim() === label && el.offsetParent !== null);
    if (!hit) return false;
    hit.click();
    return true;
})()"#;

const SELECTOR_CLICK_JS: &str = r#"(() => {
    const hit = document.querySelector('__SELECTOR__');
    if (!hit || hit.offsetParent === null) return false;
    hit.click();
    return true;
})()"#;

/// One known consent-dismissal trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentTrigger {
    /// A button matched by its visible label ("Reject all" / "Accept all").
    Button(&'static str),
    /// A provider-specific CSS selector.
    Css(&'static str),
}

impl ConsentTrigger {
    fn click_script(self) -> String {
        match self {
            ConsentTrigger::Button(label) => BUTTON_CLICK_JS.replace("__LABEL__", label),
            ConsentTrigger::Css(selector) => SELECTOR_CLICK_JS.replace("__SELECTOR__", selector),
        }
    }
}

/// Polls a fixed trigger list and clicks the first visible match.
#[derive(Debug, Clone)]
pub struct ConsentResolver {
    wait: Duration,
    poll: Duration,
}

impl Default for ConsentResolver {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(2),
            poll: Duration::from_millis(250),
        }
    }
}

impl ConsentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-trigger visibility wait.
    pub fn with_wait(mut self, wait: Duration, poll: Duration) -> Self {
        self.wait = wait;
        self.poll = poll;
        self
    }

    /// Try each trigger in order; returns whether anything was clicked.
    /// Evaluation errors are swallowed.
    pub async fn dismiss(&self, page: &dyn BrowserPage, triggers: &[ConsentTrigger]) -> bool {
        for trigger in triggers {
            let script = trigger.click_script();
            let deadline = Instant::now() + self.wait;
            loop {
                match page.evaluate(&script).await {
                    Ok(value) if value.as_bool() == Some(true) => {
                        tracing::debug!(?trigger, "consent overlay dismissed");
                        return true;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(?trigger, "consent probe failed: {}", e);
                        break;
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(self.poll).await;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revlens_browser::mock::{MockSession, PageScript};
    use revlens_browser::{BrowserSession, ContextIdentity, WaitUntil};

    async fn page_with_consent(clicks: bool) -> Box<dyn BrowserPage> {
        let session = MockSession::new();
        session.script_fallback(PageScript {
            evaluate_value: serde_json::Value::Bool(clicks),
            ..PageScript::default()
        });
        let context = session
            .new_context(ContextIdentity::randomized())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");
        page.navigate(
            "https://engine.example/results",
            Duration::from_secs(5),
            WaitUntil::DomContentLoaded,
        )
        .await
        .expect("navigate");
        page
    }

    #[tokio::test]
    async fn test_dismiss_clicks_first_visible_trigger() {
        let page = page_with_consent(true).await;
        let resolver = ConsentResolver::new().with_wait(
            Duration::from_millis(50),
            Duration::from_millis(10),
        );
        let clicked = resolver
            .dismiss(
                &*page,
                &[
                    ConsentTrigger::Button("Reject all"),
                    ConsentTrigger::Button("Accept all"),
                ],
            )
            .await;
        assert!(clicked);
    }

    #[tokio::test]
    async fn test_dismiss_without_overlay_is_not_an_error() {
        let page = page_with_consent(false).await;
        let resolver = ConsentResolver::new().with_wait(
            Duration::from_millis(50),
            Duration::from_millis(10),
        );
        let clicked = resolver
            .dismiss(&*page, &[ConsentTrigger::Css("#bnp_btn_reject")])
            .await;
        assert!(!clicked);
    }

    #[test]
    fn test_click_scripts_embed_trigger() {
        let script = ConsentTrigger::Button("Reject all").click_script();
        assert!(script.contains("'Reject all'"));

        let script = ConsentTrigger::Css("#bnp_btn_reject").click_script();
        assert!(script.contains("#bnp_btn_reject"));
    }
}
