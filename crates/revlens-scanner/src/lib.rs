//! Revlens Scanner - image sourcing and reverse-image orchestration.
//!
//! This crate provides the two lookup stages that run against the open web:
//!
//! - the **provider cascade**: an ordered fallback chain of image providers
//!   (DuckDuckGo API first, then browser-scraped Bing and Google) that
//!   short-circuits on the first provider returning results;
//! - the **engine orchestrator**: a parallel fan-out of one image reference
//!   to four reverse-image search engines (Google, Bing, Yandex, TinEye),
//!   each in its own isolated browser context, joined when every engine has
//!   produced a result or timed out.
//!
//! Failures below the orchestration boundary are never fatal: a provider
//! that errors is skipped, an engine that errors contributes an empty slot.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cascade;
pub mod consent;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod scrape;

pub use cascade::ProviderCascade;
pub use consent::{ConsentResolver, ConsentTrigger};
pub use engine::EngineSpec;
pub use error::{Result, SearchError};
pub use orchestrator::EngineOrchestrator;
pub use provider::{
    BrowserImageProvider, DuckDuckGoProvider, ImageProvider, ScrapeProviderSpec,
};
pub use scrape::{extract_candidates, ScrapeFilter};
