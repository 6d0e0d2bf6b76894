//! Revlens Jobs - background lookup jobs and their in-process store.
//!
//! A job sequences the full pipeline for one [`revlens_core::SearchTarget`]:
//! image sourcing through the provider cascade, reverse-image fan-out,
//! candidate discovery through an injected [`CandidateSource`], and profile
//! validation. Each job runs on its own tokio task; its state lives behind a
//! single-writer `RwLock` in the [`JobStore`] and is polled by snapshot.
//!
//! Stopping is cooperative: a cancellation token is observed between stages
//! and between candidates, and everything produced before the stop sticks.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod runner;
pub mod source;
pub mod state;
pub mod store;

pub use error::{JobError, Result};
pub use runner::JobRunner;
pub use source::CandidateSource;
pub use state::{CandidateRecord, DiscoveryStatus, JobState, JobStatus, ValidationStatus};
pub use store::JobStore;
