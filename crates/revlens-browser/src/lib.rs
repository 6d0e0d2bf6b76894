//! Browser automation capability layer for Revlens.
//!
//! Defines the `BrowserSession` / `BrowserContext` / `BrowserPage` traits
//! that the scanner, orchestrator and validator are written against, a
//! chromiumoxide-backed implementation, per-context identity randomization,
//! and a scripted in-memory double for tests.

pub mod chromium;
pub mod error;
pub mod identity;
pub mod mock;
pub mod session;

pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use error::{BrowserError, Result};
pub use identity::ContextIdentity;
pub use session::{
    BrowserContext, BrowserPage, BrowserSession, NavigationResponse, SessionLauncher, WaitUntil,
};
