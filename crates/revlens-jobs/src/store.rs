//! In-process job store.
//!
//! The store is explicit and injectable; nothing in the workspace holds a
//! process-wide global. Terminal jobs stay readable for a retention window
//! and are swept on each new job creation.

use crate::error::{JobError, Result};
use crate::state::JobState;
use revlens_core::JobId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct JobHandle {
    state: Arc<RwLock<JobState>>,
    cancel: CancellationToken,
    created_at: Instant,
}

/// Registry of all jobs the process knows about.
pub struct JobStore {
    jobs: Mutex<HashMap<JobId, JobHandle>>,
    retention: Duration,
}

impl JobStore {
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Register a new job and hand its state and stop token to the runner.
    ///
    /// Sweeps expired terminal jobs first.
    pub fn create(&self, id: JobId) -> (Arc<RwLock<JobState>>, CancellationToken) {
        let state = Arc::new(RwLock::new(JobState::new()));
        let cancel = CancellationToken::new();

        let mut jobs = self.jobs.lock().expect("job map lock");
        Self::sweep(&mut jobs, self.retention);
        jobs.insert(
            id,
            JobHandle {
                state: Arc::clone(&state),
                cancel: cancel.clone(),
                created_at: Instant::now(),
            },
        );
        (state, cancel)
    }

    /// A structurally consistent copy of the job's current state.
    pub async fn snapshot(&self, id: &JobId) -> Result<JobState> {
        let state = {
            let jobs = self.jobs.lock().expect("job map lock");
            let handle = jobs
                .get(id)
                .ok_or_else(|| JobError::UnknownJob(id.to_string()))?;
            Arc::clone(&handle.state)
        };
        let snapshot = state.read().await.clone();
        Ok(snapshot)
    }

    /// Ask the job to stop. Takes effect at the next stage or candidate
    /// boundary; already-produced results are kept.
    pub fn request_stop(&self, id: &JobId) -> Result<()> {
        let jobs = self.jobs.lock().expect("job map lock");
        let handle = jobs
            .get(id)
            .ok_or_else(|| JobError::UnknownJob(id.to_string()))?;
        handle.cancel.cancel();
        Ok(())
    }

    fn sweep(jobs: &mut HashMap<JobId, JobHandle>, retention: Duration) {
        jobs.retain(|id, handle| {
            if handle.created_at.elapsed() <= retention {
                return true;
            }
            // A held write lock means the runner is still active; keep it.
            let terminal = handle
                .state
                .try_read()
                .map(|state| state.status.is_terminal())
                .unwrap_or(false);
            if terminal {
                debug!(job = %id, "evicting expired job");
            }
            !terminal
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.jobs.lock().expect("job map lock").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JobStatus;

    #[tokio::test]
    async fn test_create_snapshot_roundtrip() {
        let store = JobStore::new(Duration::from_secs(3600));
        let id = JobId::generate();
        let (state, _cancel) = store.create(id.clone());

        state.write().await.images.push("https://img.example.com/a.jpg".to_string());

        let snapshot = store.snapshot(&id).await.expect("snapshot");
        assert_eq!(snapshot.status, JobStatus::Running);
        assert_eq!(snapshot.images.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job_is_an_error() {
        let store = JobStore::new(Duration::from_secs(3600));
        let id = JobId::generate();
        assert!(matches!(
            store.snapshot(&id).await,
            Err(JobError::UnknownJob(_))
        ));
        assert!(matches!(store.request_stop(&id), Err(JobError::UnknownJob(_))));
    }

    #[tokio::test]
    async fn test_request_stop_fires_token() {
        let store = JobStore::new(Duration::from_secs(3600));
        let id = JobId::generate();
        let (_state, cancel) = store.create(id.clone());

        assert!(!cancel.is_cancelled());
        store.request_stop(&id).expect("stop");
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_expired_terminal_jobs_are_swept_on_create() {
        let store = JobStore::new(Duration::ZERO);

        let done = JobId::generate();
        let (state, _cancel) = store.create(done.clone());
        state.write().await.status = JobStatus::Completed;

        let running = JobId::generate();
        let (_state, _cancel) = store.create(running.clone());

        assert!(matches!(
            store.snapshot(&done).await,
            Err(JobError::UnknownJob(_))
        ));
        assert!(store.snapshot(&running).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_but_running_jobs_survive_the_sweep() {
        let store = JobStore::new(Duration::ZERO);

        let id = JobId::generate();
        let (_state, _cancel) = store.create(id.clone());
        // Still Running: age alone must not evict it.
        store.create(JobId::generate());

        assert!(store.snapshot(&id).await.is_ok());
        assert_eq!(store.len(), 2);
    }
}
