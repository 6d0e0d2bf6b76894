//! Seam for the external candidate-discovery collaborator.

use crate::state::CandidateRecord;
use async_trait::async_trait;

/// Discovers candidate profiles for a query across known sites.
///
/// Implementations probe site-specific profile URL patterns; records carry
/// the probe outcome, including WAF-blocked probes whose presence could not
/// be established. Discovery failures for individual sites are the
/// implementation's problem and never abort a job.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn discover(&self, query: &str) -> Vec<CandidateRecord>;
}
