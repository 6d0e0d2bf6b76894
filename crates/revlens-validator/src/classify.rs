//! Pure classification of a rendered candidate page.

use revlens_browser::NavigationResponse;
use revlens_core::{ValidationConfig, ValidationResult};

/// Everything the validator observed about one rendered candidate.
#[derive(Debug, Clone)]
pub struct PageEvidence {
    /// Main-document response, if navigation produced one.
    pub response: Option<NavigationResponse>,
    pub title: String,
    pub body_text: String,
    /// Post-redirect URL.
    pub final_url: String,
}

/// Classify one candidate. Rules apply in order; the first hit decides.
///
/// Only the snippet window of body text (the first `snippet_len` chars) is
/// consulted by the body lexicon; a denial phrase buried deeper in the page
/// does not reject it.
pub fn classify(url: &str, evidence: &PageEvidence, config: &ValidationConfig) -> ValidationResult {
    let Some(response) = &evidence.response else {
        return ValidationResult::rejected(url, "No response");
    };

    if let Some(status) = response.status {
        if status >= 400 {
            return ValidationResult::rejected(url, format!("HTTP {status}"));
        }
    }

    let title = evidence.title.to_lowercase();
    if config.title_denylist.iter().any(|p| title.contains(p)) {
        return ValidationResult::rejected(url, "Title indicated 404");
    }

    let snippet: String = evidence.body_text.chars().take(config.snippet_len).collect();
    let body = snippet.to_lowercase();
    if config.body_denylist.iter().any(|p| body.contains(p)) {
        return ValidationResult::rejected(url, "Body content indicated 404");
    }

    ValidationResult {
        url: url.to_string(),
        confirmed: true,
        reason: None,
        title: Some(evidence.title.clone()),
        final_url: Some(evidence.final_url.clone()),
        snippet: Some(snippet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://social.example.com/u/jane";

    fn live_evidence() -> PageEvidence {
        PageEvidence {
            response: Some(NavigationResponse { status: Some(200) }),
            title: "Jane Doe (@jane)".to_string(),
            body_text: "Jane Doe. 120 followers. Posts about photography.".to_string(),
            final_url: URL.to_string(),
        }
    }

    #[test]
    fn test_confirmed_profile() {
        let result = classify(URL, &live_evidence(), &ValidationConfig::default());
        assert!(result.confirmed);
        assert!(result.reason.is_none());
        assert_eq!(result.title.as_deref(), Some("Jane Doe (@jane)"));
        assert_eq!(result.final_url.as_deref(), Some(URL));
        assert!(result.snippet.as_deref().unwrap().starts_with("Jane Doe."));
    }

    #[test]
    fn test_missing_response_wins_over_everything() {
        let mut evidence = live_evidence();
        evidence.response = None;
        evidence.title = "Page not found".to_string();

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert_eq!(result.reason.as_deref(), Some("No response"));
    }

    #[test]
    fn test_http_error_wins_over_lexicons() {
        let mut evidence = live_evidence();
        evidence.response = Some(NavigationResponse { status: Some(404) });
        evidence.title = "Page not found".to_string();

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert_eq!(result.reason.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn test_unknown_status_falls_through_to_lexicons() {
        let mut evidence = live_evidence();
        evidence.response = Some(NavigationResponse { status: None });

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert!(result.confirmed);
    }

    #[test]
    fn test_title_lexicon_is_case_insensitive() {
        let mut evidence = live_evidence();
        evidence.title = "This Page Doesn't Exist - Example".to_string();

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert_eq!(result.reason.as_deref(), Some("Title indicated 404"));
    }

    #[test]
    fn test_body_lexicon_only_reads_snippet_window() {
        let mut evidence = live_evidence();
        let mut body = "a".repeat(1500);
        body.push_str("this page isn't available");
        evidence.body_text = body;

        // The denial phrase starts past the 1000-char window.
        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert!(result.confirmed);
        assert_eq!(result.snippet.as_deref().unwrap().chars().count(), 1000);
    }

    #[test]
    fn test_body_lexicon() {
        let mut evidence = live_evidence();
        evidence.body_text =
            "Sorry, this content isn't available right now. Go back home.".to_string();

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert_eq!(result.reason.as_deref(), Some("Body content indicated 404"));
    }

    #[test]
    fn test_snippet_is_capped_on_char_boundary() {
        let mut config = ValidationConfig::default();
        config.snippet_len = 10;
        let mut evidence = live_evidence();
        evidence.body_text = "aéîöü-aéîöü-aéîöü".to_string();

        let result = classify(URL, &evidence, &config);
        assert_eq!(result.snippet.as_deref().unwrap().chars().count(), 10);
    }

    #[test]
    fn test_redirect_target_is_reported() {
        let mut evidence = live_evidence();
        evidence.final_url = "https://social.example.com/profile/jane".to_string();

        let result = classify(URL, &evidence, &ValidationConfig::default());
        assert!(result.confirmed);
        assert_eq!(result.url, URL);
        assert_eq!(
            result.final_url.as_deref(),
            Some("https://social.example.com/profile/jane")
        );
    }
}
