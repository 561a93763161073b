use std::{io, path::PathBuf, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid start url {url}: {source}")]
    InvalidStartUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Start url has no host: {0}")]
    MissingHost(String),
    #[error("Missing start url")]
    MissingStartUrl,
    #[error("Navigation timeout must be greater than zero")]
    ZeroTimeout,
    #[error("Invalid url pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("Output directory {path} is not writable: {source}")]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("Cannot read config file {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("Cannot parse config file: {0}")]
    ParseFile(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("Render task for {url} crashed")]
    Crashed { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Cannot write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot save visited links: {0}")]
    VisitedLinks(#[source] WriteError),
}
