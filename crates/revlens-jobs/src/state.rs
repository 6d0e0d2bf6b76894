//! Job state as seen by pollers.

use revlens_core::EngineResult;
use serde::{Deserialize, Serialize};

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Validating,
    Stopped,
    Completed,
    Error,
}

impl JobStatus {
    /// Terminal jobs never change again and become eligible for eviction.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Error)
    }
}

/// How a candidate profile was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    /// The site answered and the profile URL looked present.
    Found,
    /// The site's WAF or bot wall blocked the probe; presence unknown.
    WafBlocked,
}

/// Where a candidate stands in the validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Checking,
    Verified,
    FalsePositive,
}

/// One discovered candidate profile, updated in place as validation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Site the candidate belongs to ("github", "instagram", ...).
    pub site: String,
    pub url: String,
    pub discovery: DiscoveryStatus,
    pub validation: ValidationStatus,
    /// Rejection reason, set when validation lands on `FalsePositive`.
    pub reason: Option<String>,
    pub page_title: Option<String>,
    pub snippet: Option<String>,
}

impl CandidateRecord {
    /// A freshly discovered candidate awaiting validation.
    #[must_use]
    pub fn found(site: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            url: url.into(),
            discovery: DiscoveryStatus::Found,
            validation: ValidationStatus::Pending,
            reason: None,
            page_title: None,
            snippet: None,
        }
    }

    /// A probe the site's bot wall rejected; never validated.
    #[must_use]
    pub fn waf_blocked(site: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            url: url.into(),
            discovery: DiscoveryStatus::WafBlocked,
            validation: ValidationStatus::Pending,
            reason: None,
            page_title: None,
            snippet: None,
        }
    }
}

/// Everything a poller can observe about one job.
///
/// Written by exactly one runner task; pollers clone a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    /// Images sourced by the provider cascade.
    pub images: Vec<String>,
    /// One slot per reverse-image engine, in fixed engine order.
    pub engine_results: Vec<EngineResult>,
    /// Discovered candidates, updated in place during validation.
    pub records: Vec<CandidateRecord>,
}

impl JobState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: JobStatus::Running,
            images: Vec::new(),
            engine_results: Vec::new(),
            records: Vec::new(),
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Validating.is_terminal());
        assert!(JobStatus::Stopped.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Validating).expect("serialize");
        assert_eq!(json, "\"validating\"");
    }

    #[test]
    fn test_record_serialization_shape() {
        let record = CandidateRecord::found("github", "https://github.com/chadi0x");
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"discovery\":\"found\""));
        assert!(json.contains("\"validation\":\"pending\""));

        let mut record = record;
        record.validation = ValidationStatus::FalsePositive;
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"false_positive\""));
    }

    #[test]
    fn test_new_job_is_running_and_empty() {
        let state = JobState::new();
        assert_eq!(state.status, JobStatus::Running);
        assert!(state.images.is_empty());
        assert!(state.engine_results.is_empty());
        assert!(state.records.is_empty());
    }
}
