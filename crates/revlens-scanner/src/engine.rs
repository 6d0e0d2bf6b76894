//! Reverse-image engine definitions.
//!
//! Each engine is a data-only spec: how to build its query URL from an
//! image reference, which consent overlays to clear, where candidate
//! thumbnails live in its result DOM, and how long to let the page settle
//! before scraping.

use crate::consent::ConsentTrigger;
use crate::scrape::ScrapeFilter;
use url::Url;

/// One reverse-image engine, fanned out in parallel by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct EngineSpec {
    pub name: &'static str,
    pub query_url: fn(&str) -> String,
    pub consent: &'static [ConsentTrigger],
    pub selectors: &'static str,
    pub filter: ScrapeFilter,
    /// Post-navigation settle range in milliseconds.
    pub settle_ms: (u64, u64),
}

fn google_query(image_url: &str) -> String {
    Url::parse_with_params(
        "https://www.google.com/searchbyimage",
        &[("image_url", image_url), ("safe", "off")],
    )
    .expect("static base URL")
    .to_string()
}

fn bing_query(image_url: &str) -> String {
    Url::parse_with_params(
        "https://www.bing.com/images/search",
        &[
            ("view", "detailv2"),
            ("iss", "sbi"),
            ("form", "SBIHMP"),
            ("q", &format!("imgurl:{image_url}")),
            ("adlt", "off"),
        ],
    )
    .expect("static base URL")
    .to_string()
}

fn yandex_query(image_url: &str) -> String {
    Url::parse_with_params(
        "https://yandex.com/images/search",
        &[("rpt", "imageview"), ("url", image_url)],
    )
    .expect("static base URL")
    .to_string()
}

fn tineye_query(image_url: &str) -> String {
    Url::parse_with_params("https://tineye.com/search", &[("url", image_url)])
        .expect("static base URL")
        .to_string()
}

impl EngineSpec {
    /// The four built-in engines, in the fixed reporting order.
    pub fn builtin() -> Vec<EngineSpec> {
        vec![
            EngineSpec {
                name: "google",
                query_url: google_query,
                consent: &[ConsentTrigger::Button("Reject all")],
                selectors: "img",
                filter: ScrapeFilter {
                    min_len: 80,
                    denylist: &["gstatic", "google"],
                },
                settle_ms: (2500, 4000),
            },
            EngineSpec {
                name: "bing",
                query_url: bing_query,
                consent: &[ConsentTrigger::Css("#bnp_btn_reject")],
                selectors: "img",
                filter: ScrapeFilter {
                    min_len: 50,
                    denylist: &["bing.com"],
                },
                settle_ms: (2000, 3500),
            },
            EngineSpec {
                name: "yandex",
                query_url: yandex_query,
                consent: &[],
                selectors: ".serp-item__thumb, img.serp-item__img, .CbirSites-ItemThumb",
                filter: ScrapeFilter {
                    min_len: 50,
                    denylist: &[],
                },
                settle_ms: (3000, 5000),
            },
            EngineSpec {
                name: "tineye",
                query_url: tineye_query,
                consent: &[],
                selectors: ".match-thumb img, .result-match img",
                filter: ScrapeFilter {
                    min_len: 0,
                    denylist: &[],
                },
                settle_ms: (2000, 4000),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "https://photos.example.com/jane doe.jpg";

    #[test]
    fn test_builtin_order_is_fixed() {
        let names: Vec<_> = EngineSpec::builtin().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["google", "bing", "yandex", "tineye"]);
    }

    #[test]
    fn test_google_query_encodes_image_url() {
        let url = google_query(IMAGE);
        assert!(url.starts_with("https://www.google.com/searchbyimage?"));
        assert!(url.contains("safe=off"));
        assert!(!url.contains(' '), "image URL must be percent-encoded");
    }

    #[test]
    fn test_bing_query_uses_imgurl_operator() {
        let url = bing_query("https://photos.example.com/jane.jpg");
        assert!(url.contains("iss=sbi"));
        assert!(url.contains("form=SBIHMP"));
        assert!(url.contains("imgurl%3Ahttps") || url.contains("imgurl:https"));
        assert!(url.contains("adlt=off"));
    }

    #[test]
    fn test_yandex_and_tineye_queries() {
        let url = yandex_query("https://photos.example.com/jane.jpg");
        assert!(url.contains("rpt=imageview"));
        assert!(url.contains("url=https"));

        let url = tineye_query("https://photos.example.com/jane.jpg");
        assert!(url.starts_with("https://tineye.com/search?url="));
    }

    #[test]
    fn test_google_filter_rejects_own_assets() {
        let google = &EngineSpec::builtin()[0];
        assert!(!google
            .filter
            .accepts("https://encrypted-tbn0.gstatic.com/images?q=tbn:longenoughtoken1234567890abcdef"));
        let long_external =
            "https://media.example-social.com/profile-images/2024/08/jane-doe-avatar-full-size.jpg";
        assert!(google.filter.accepts(long_external));
    }
}
