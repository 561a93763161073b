use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub mod config;
pub mod renderer;
pub mod scope;
pub mod writer;

mod engine;
mod error;
mod utils;
mod visited;

pub use config::{OutputFormat, PatternMode, RawConfig, ScopeConfig, UrlPattern};
pub use engine::{run_crawl, run_crawl_until, CrawlOptions};
pub use error::{ConfigError, CrawlerError, RenderError, WriteError};
pub use renderer::{HttpRenderer, RenderedPage};
pub use visited::{VisitedRegistry, VISITED_LINKS_FILE};
pub use writer::{Document, FsContentWriter};

/// Loads a page and reports its title, markup and anchors.
///
/// Each call owns whatever session it opens and must release it on every
/// exit path. The engine may also drop the call once `navigation_timeout`
/// has elapsed.
#[async_trait::async_trait]
pub trait Renderer {
    async fn render(
        &self,
        url: &str,
        navigation_timeout: Duration,
    ) -> Result<RenderedPage, RenderError>;
}

/// Persists one document per crawled page.
#[async_trait::async_trait]
pub trait ContentWriter {
    async fn write(
        &self,
        document: &Document,
        output_dir: &Path,
        format: OutputFormat,
    ) -> Result<PathBuf, WriteError>;
}
