//! Revlens Validator - existence checks for candidate profile URLs.
//!
//! Candidates surfaced by the reverse-image engines are only *possible*
//! matches; many are dead profiles, soft-404 pages or redirects to a login
//! wall. This crate renders each candidate in a real browser context and
//! classifies the outcome:
//!
//! 1. no main-document response at all,
//! 2. an HTTP error status,
//! 3. a title from the dead-profile lexicon,
//! 4. body text from the dead-profile lexicon,
//! 5. otherwise: confirmed, with title, final URL and a body snippet.
//!
//! The rules are checked in that order; the first match decides.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod validator;

pub use classify::{classify, PageEvidence};
pub use validator::ProfileValidator;
