use revlens_browser::BrowserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("browser session unavailable: {0}")]
    Session(#[from] BrowserError),
}

pub type Result<T> = std::result::Result<T, JobError>;
