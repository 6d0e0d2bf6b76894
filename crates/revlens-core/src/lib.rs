//! Revlens Core - Foundation crate for the Revlens lookup crawler.
//!
//! This crate provides the shared types, error handling and configuration
//! management that all other Revlens crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`SearchTarget`, `CandidateUrl`, `ValidationResult`, `JobId`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, EngineConfig, JobConfig, ProviderConfig, ValidationConfig,
};
pub use error::{ConfigError, ConfigResult, Result, RevlensError};
pub use types::{CandidateUrl, EngineResult, JobId, SearchTarget, TargetKind, ValidationResult};
