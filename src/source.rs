//! Where the projects document comes from.
//!
//! A source performs exactly one attempt per `fetch_once` call. Timeouts and
//! the retry budget are applied on top by [`fetch_with_policy`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LoadError;
use crate::models::{ProjectList, ProjectsDocument};

#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// One attempt at fetching and parsing the document
    async fn fetch_once(&self) -> Result<ProjectList, LoadError>;

    /// Human readable location, used in logs
    fn location(&self) -> &str;
}

/// Parse a raw body into the record list
pub fn parse_document(body: &[u8]) -> Result<ProjectList, LoadError> {
    let document: ProjectsDocument = serde_json::from_slice(body)?;
    Ok(document.into_list())
}

/// Fetches the document over HTTP(S)
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ProjectSource for HttpSource {
    async fn fetch_once(&self) -> Result<ProjectList, LoadError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        parse_document(&body)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Reads the document from disk
pub struct FileSource {
    path: PathBuf,
    display: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl ProjectSource for FileSource {
    async fn fetch_once(&self) -> Result<ProjectList, LoadError> {
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.display.clone(),
                source,
            })?;
        parse_document(&body)
    }

    fn location(&self) -> &str {
        &self.display
    }
}

/// Timeout per attempt and number of extra attempts after a transport failure
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.fetch_timeout(),
            retries: config.fetch_retries,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 1,
        }
    }
}

pub async fn fetch_with_policy(
    source: &dyn ProjectSource,
    policy: RetryPolicy,
) -> Result<ProjectList, LoadError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match tokio::time::timeout(policy.timeout, source.fetch_once()).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout(policy.timeout)),
        };

        match result {
            Ok(list) => {
                debug!(location = source.location(), attempt, records = list.len(), "projects fetched");
                return Ok(list);
            }
            Err(err) if err.is_retryable() && attempt <= policy.retries => {
                warn!(location = source.location(), attempt, error = %err, "fetch failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Pick the source named by the configuration
pub fn from_config(config: &Config) -> Result<Box<dyn ProjectSource>, LoadError> {
    if config.is_remote_source() {
        Ok(Box::new(HttpSource::new(config.source.clone())?))
    } else {
        Ok(Box::new(FileSource::new(config.site_root.join(&config.source))))
    }
}
