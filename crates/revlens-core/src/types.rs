//! Shared types used across the Revlens crawler.
//!
//! This module defines the common domain types that flow between the
//! provider cascade, the engine orchestrator and the profile validator.

use crate::error::RevlensError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for job identifiers with validation.
///
/// Job IDs must be valid UUIDs (v4 format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Create a new `JobId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not a valid UUID.
    pub fn new(id: impl Into<String>) -> Result<Self, RevlensError> {
        let id = id.into();
        uuid::Uuid::parse_str(&id).map_err(|_| {
            RevlensError::Validation(format!("invalid job ID: must be a valid UUID, got '{id}'"))
        })?;
        Ok(Self(id))
    }

    /// Create a new random `JobId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of value a lookup starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A username or handle, e.g. `chadi0x`.
    Username,
    /// A direct image URL.
    Image,
    /// A free-form query string.
    Query,
}

/// Immutable input to a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    /// What kind of value this is.
    pub kind: TargetKind,
    /// The raw value.
    pub value: String,
}

impl SearchTarget {
    /// Build a username target.
    #[must_use]
    pub fn username(value: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Username,
            value: value.into(),
        }
    }

    /// Build an image-URL target.
    #[must_use]
    pub fn image(value: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Image,
            value: value.into(),
        }
    }

    /// Build a free-form query target.
    #[must_use]
    pub fn query(value: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Query,
            value: value.into(),
        }
    }
}

/// An unvalidated URL surfaced by a reverse-image engine as a possible match.
///
/// Candidates are not deduplicated at this layer; callers that aggregate
/// across engines own deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUrl {
    /// Engine that surfaced the candidate.
    pub engine: String,
    /// The candidate URL itself.
    pub url: String,
}

/// One engine's slot in an orchestrated reverse-image search.
///
/// The orchestrator produces exactly one of these per configured engine,
/// in fixed engine-identity order, even when the engine failed (empty list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Engine identity.
    pub engine: String,
    /// Ordered candidates, capped at the orchestrator's top-K.
    pub candidates: Vec<CandidateUrl>,
}

/// Validator outcome for a single candidate profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The candidate URL that was checked.
    pub url: String,
    /// Whether the page looked like a real profile.
    pub confirmed: bool,
    /// Why the candidate was rejected, when it was.
    pub reason: Option<String>,
    /// Page title, when a page was rendered.
    pub title: Option<String>,
    /// Final post-redirect URL.
    pub final_url: Option<String>,
    /// First N characters of visible body text (N from config).
    pub snippet: Option<String>,
}

impl ValidationResult {
    /// A not-confirmed result carrying only a reason.
    #[must_use]
    pub fn rejected(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            confirmed: false,
            reason: Some(reason.into()),
            title: None,
            final_url: None,
            snippet: None,
        }
    }
}
