//! Background job execution.
//!
//! One tokio task per job drives the pipeline: image sourcing, reverse-image
//! fan-out, candidate discovery, validation. The task is the only writer of
//! its `JobState`; pollers read snapshots through the store.

use crate::error::Result;
use crate::source::CandidateSource;
use crate::state::{DiscoveryStatus, JobStatus, ValidationStatus};
use crate::store::JobStore;
use crate::JobState;
use revlens_browser::{BrowserSession, SessionLauncher};
use revlens_core::{AppConfig, EngineResult, JobId, SearchTarget};
use revlens_scanner::{EngineOrchestrator, EngineSpec, ProviderCascade};
use revlens_validator::ProfileValidator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Spawns and sequences lookup jobs.
pub struct JobRunner {
    store: Arc<JobStore>,
    cascade: Arc<ProviderCascade>,
    launcher: Arc<dyn SessionLauncher>,
    source: Arc<dyn CandidateSource>,
    engine_specs: Vec<EngineSpec>,
    config: AppConfig,
}

impl JobRunner {
    pub fn new(
        store: Arc<JobStore>,
        cascade: Arc<ProviderCascade>,
        launcher: Arc<dyn SessionLauncher>,
        source: Arc<dyn CandidateSource>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            cascade,
            launcher,
            source,
            engine_specs: EngineSpec::builtin(),
            config,
        }
    }

    /// Replace the default engine set.
    #[must_use]
    pub fn with_engine_specs(mut self, specs: Vec<EngineSpec>) -> Self {
        self.engine_specs = specs;
        self
    }

    /// Start a job for the target and return its ID immediately.
    pub fn submit(&self, target: SearchTarget) -> JobId {
        let id = JobId::generate();
        let (state, cancel) = self.store.create(id.clone());

        let worker = JobWorker {
            id: id.clone(),
            target,
            state,
            cancel,
            cascade: Arc::clone(&self.cascade),
            launcher: Arc::clone(&self.launcher),
            source: Arc::clone(&self.source),
            engine_specs: self.engine_specs.clone(),
            config: self.config.clone(),
        };
        tokio::spawn(worker.run());
        id
    }

    /// Current state of a job.
    pub async fn snapshot(&self, id: &JobId) -> Result<JobState> {
        self.store.snapshot(id).await
    }

    /// Cooperative stop; already-produced results are kept.
    pub fn request_stop(&self, id: &JobId) -> Result<()> {
        self.store.request_stop(id)
    }

    /// One-shot reverse-image lookup outside the job machinery: launch a
    /// session, fan the image out to every engine, release the session.
    pub async fn deep_search(&self, image_url: &str) -> Result<Vec<EngineResult>> {
        info!(image = image_url, "deep search");
        let session = self.launcher.launch().await?;
        let orchestrator = EngineOrchestrator::with_specs(
            Arc::clone(&session),
            self.engine_specs.clone(),
            Duration::from_secs(self.config.engines.timeout_secs),
            self.config.engines.top_k,
        );
        let results = orchestrator.search(image_url).await;
        let _ = session.close().await;
        Ok(results)
    }
}

struct JobWorker {
    id: JobId,
    target: SearchTarget,
    state: Arc<RwLock<JobState>>,
    cancel: CancellationToken,
    cascade: Arc<ProviderCascade>,
    launcher: Arc<dyn SessionLauncher>,
    source: Arc<dyn CandidateSource>,
    engine_specs: Vec<EngineSpec>,
    config: AppConfig,
}

impl JobWorker {
    async fn run(self) {
        info!(job = %self.id, target = %self.target.value, "job started");
        match self.drive().await {
            Ok(status) => info!(job = %self.id, ?status, "job finished"),
            Err(e) => {
                error!(job = %self.id, "job failed: {}", e);
                self.state.write().await.status = JobStatus::Error;
            }
        }
    }

    async fn drive(&self) -> Result<JobStatus> {
        let query = self.target.value.clone();

        // 1. Image sourcing through the provider cascade.
        let images = self
            .cascade
            .resolve(&query, self.config.jobs.image_limit)
            .await;
        self.state.write().await.images = images.clone();
        if self.cancel.is_cancelled() {
            return self.finish(None, JobStatus::Stopped).await;
        }

        // 2. Reverse-image fan-out on the first sourced image. Failing to
        // acquire a session is the one fatal condition a job has.
        let mut session: Option<Arc<dyn BrowserSession>> = None;
        if let Some(image) = images.first() {
            let acquired = self.launcher.launch().await?;
            let orchestrator = EngineOrchestrator::with_specs(
                Arc::clone(&acquired),
                self.engine_specs.clone(),
                Duration::from_secs(self.config.engines.timeout_secs),
                self.config.engines.top_k,
            );
            let results = orchestrator.search(image).await;
            self.state.write().await.engine_results = results;
            session = Some(acquired);
        }
        if self.cancel.is_cancelled() {
            return self.finish(session, JobStatus::Stopped).await;
        }

        // 3. Candidate discovery. A query with spaces is also checked with
        // the spaces stripped, since handles rarely contain them.
        let mut records = self.source.discover(&query).await;
        if query.contains(' ') {
            let stripped: String = query.split_whitespace().collect();
            debug!(job = %self.id, variant = %stripped, "checking stripped variant");
            records.extend(self.source.discover(&stripped).await);
        }
        {
            let mut state = self.state.write().await;
            state.records = records;
            state.status = JobStatus::Validating;
        }
        if self.cancel.is_cancelled() {
            return self.finish(session, JobStatus::Stopped).await;
        }

        // 4. Validate every candidate discovered as Found, in place.
        let found: Vec<(usize, String)> = {
            let state = self.state.read().await;
            state
                .records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.discovery == DiscoveryStatus::Found)
                .map(|(i, r)| (i, r.url.clone()))
                .collect()
        };
        if !found.is_empty() {
            let validating = match &session {
                Some(existing) => Arc::clone(existing),
                None => {
                    let acquired = self.launcher.launch().await?;
                    session = Some(Arc::clone(&acquired));
                    acquired
                }
            };
            let validator =
                ProfileValidator::new(validating, self.config.validation.clone());
            for (index, url) in found {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.state.write().await.records[index].validation =
                    ValidationStatus::Checking;
                let verdict = validator.validate(&url).await;

                let mut state = self.state.write().await;
                let record = &mut state.records[index];
                record.validation = if verdict.confirmed {
                    ValidationStatus::Verified
                } else {
                    ValidationStatus::FalsePositive
                };
                record.reason = verdict.reason;
                record.page_title = verdict.title;
                record.snippet = verdict.snippet;
            }
        }

        let status = if self.cancel.is_cancelled() {
            JobStatus::Stopped
        } else {
            JobStatus::Completed
        };
        self.finish(session, status).await
    }

    async fn finish(
        &self,
        session: Option<Arc<dyn BrowserSession>>,
        status: JobStatus,
    ) -> Result<JobStatus> {
        if let Some(session) = session {
            let _ = session.close().await;
        }
        self.state.write().await.status = status;
        Ok(status)
    }
}
