//! Candidate extraction from rendered engine result pages.
//!
//! Each engine brings its own selector set; the filter contract is shared:
//! a candidate must be an absolute http(s) URL, longer than the engine's
//! minimum (inline icons and sprites are short), and not hosted on the
//! engine's own asset domains.

use scraper::{Html, Selector};

/// The shared filter contract, parameterized per engine.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeFilter {
    /// Minimum URL length; anything shorter is treated as a sprite/icon.
    pub min_len: usize,
    /// Substrings marking the engine's own asset hosts.
    pub denylist: &'static [&'static str],
}

impl ScrapeFilter {
    pub fn accepts(&self, url: &str) -> bool {
        (url.starts_with("http://") || url.starts_with("https://"))
            && url.len() > self.min_len
            && !self.denylist.iter().any(|deny| url.contains(deny))
    }
}

/// Extract candidate URLs from rendered HTML in DOM discovery order.
///
/// `src` falls back to `data-src` (lazy-loaded results). Deduplication is
/// the caller's responsibility.
pub fn extract_candidates(html: &str, selectors: &str, filter: &ScrapeFilter) -> Vec<String> {
    let selector = match Selector::parse(selectors) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("invalid selector set '{}': {}", selectors, e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|element| {
            element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))
        })
        .filter(|src| filter.accepts(src))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERMISSIVE: ScrapeFilter = ScrapeFilter {
        min_len: 0,
        denylist: &[],
    };

    #[test]
    fn test_filter_requires_absolute_http() {
        let filter = PERMISSIVE;
        assert!(filter.accepts("https://cdn.example.com/a.jpg"));
        assert!(filter.accepts("http://cdn.example.com/a.jpg"));
        assert!(!filter.accepts("/relative/a.jpg"));
        assert!(!filter.accepts("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_filter_min_len() {
        let filter = ScrapeFilter {
            min_len: 30,
            denylist: &[],
        };
        assert!(!filter.accepts("https://e.com/x.png"));
        assert!(filter.accepts("https://cdn.example.com/photos/very-long-name.png"));
    }

    #[test]
    fn test_filter_denylist() {
        let filter = ScrapeFilter {
            min_len: 0,
            denylist: &["gstatic", "google"],
        };
        assert!(!filter.accepts("https://www.gstatic.com/images/logo.png"));
        assert!(!filter.accepts("https://www.google.com/logos/doodle.png"));
        assert!(filter.accepts("https://photos.example.com/jane.jpg"));
    }

    #[test]
    fn test_extract_preserves_dom_order() {
        let html = r#"
            <div>
                <img src="https://a.example.com/first.jpg">
                <img src="https://b.example.com/second.jpg">
                <img src="https://c.example.com/third.jpg">
            </div>
        "#;
        let urls = extract_candidates(html, "img", &PERMISSIVE);
        assert_eq!(
            urls,
            vec![
                "https://a.example.com/first.jpg",
                "https://b.example.com/second.jpg",
                "https://c.example.com/third.jpg",
            ]
        );
    }

    #[test]
    fn test_extract_falls_back_to_data_src() {
        let html = r#"<img data-src="https://lazy.example.com/a.jpg"><img src="https://eager.example.com/b.jpg">"#;
        let urls = extract_candidates(html, "img", &PERMISSIVE);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://lazy.example.com/a.jpg");
    }

    #[test]
    fn test_extract_with_engine_selectors() {
        let html = r#"
            <div class="serp-item__thumb"><img src="https://x.example.com/skip-me.jpg"></div>
            <img class="serp-item__img" src="https://match.example.com/photos/jane-profile.jpg">
            <img src="https://plain.example.com/also-skipped.jpg">
        "#;
        let urls = extract_candidates(html, "img.serp-item__img", &PERMISSIVE);
        assert_eq!(urls, vec!["https://match.example.com/photos/jane-profile.jpg"]);
    }

    #[test]
    fn test_extract_does_not_deduplicate() {
        let html = r#"<img src="https://a.example.com/same.jpg"><img src="https://a.example.com/same.jpg">"#;
        let urls = extract_candidates(html, "img", &PERMISSIVE);
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_invalid_selector_yields_empty() {
        let urls = extract_candidates("<img src='https://a.example.com/x.jpg'>", ":::", &PERMISSIVE);
        assert!(urls.is_empty());
    }
}
