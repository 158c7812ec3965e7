use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the gallery and the site handlers
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the projects document lives: an http(s) URL or a file path
    #[serde(default = "default_source")]
    pub source: String,
    /// Root used for relative file sources and local image paths
    #[serde(default = "default_site_root")]
    pub site_root: PathBuf,
    /// Image shown when a card's own image cannot be loaded
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,
    /// Transition delay added per card position
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Extra attempts after a transport failure
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
    /// Probe every card image before rendering
    #[serde(default)]
    pub check_images: bool,
}

/// SMTP relay for form submissions; all fields must be present to enable it
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

fn default_source() -> String {
    "data/projects.json".to_string()
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_fallback_image() -> String {
    "assets/images/logo.png".to_string()
}

fn default_stagger_ms() -> u64 {
    100
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_fetch_retries() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            site_root: default_site_root(),
            fallback_image: default_fallback_image(),
            stagger_ms: default_stagger_ms(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_retries: default_fetch_retries(),
            check_images: false,
        }
    }
}

impl Config {
    /// Load configuration from `GALLERY_*` environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize the prefixed environment variables into Config
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::prefixed("GALLERY_").from_env::<Config>()?;

        Ok(config)
    }

    /// Build a configuration from explicit key/value pairs (unprefixed keys)
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(pairs)?)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Whether the source should be fetched over HTTP
    pub fn is_remote_source(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

impl SmtpConfig {
    /// Load the relay settings from `SMTP_*` variables, `None` when any is missing
    pub fn load() -> Option<Self> {
        dotenv().ok();

        envy::prefixed("SMTP_").from_env::<SmtpConfig>().ok()
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    dotenv().ok();

    let config = Config::load()?;

    Ok(config)
}
