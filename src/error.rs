use thiserror::Error;

/// Why the projects document could not be loaded
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed projects document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl LoadError {
    /// Transport-level failures are worth one more attempt; bad answers are not
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Transport(_) | LoadError::Timeout(_))
    }
}

/// Why a form submission could not be relayed
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp relay failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("relay task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
