use revlens_browser::BrowserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("provider {name} failed: {reason}")]
    Provider { name: String, reason: String },

    #[error("engine {engine} failed: {reason}")]
    Engine { engine: String, reason: String },

    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
