use clap::Parser;
use scoped_crawler::{
    run_crawl_until, CrawlOptions, CrawlerError, FsContentWriter, HttpRenderer, OutputFormat,
    PatternMode, RawConfig,
};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing::error;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Crawl a site from a start url, saving every in-scope page to disk.
#[derive(Parser, Debug)]
#[command(name = "scoped-crawler", version)]
struct Cli {
    /// Url the crawl starts from
    start_url: Option<String>,

    /// Only follow urls matching this pattern
    #[arg(long)]
    pattern: Option<String>,

    /// How the pattern is applied
    #[arg(long, value_enum)]
    pattern_type: Option<PatternMode>,

    /// Host to stay on, defaults to the start url's host
    #[arg(long)]
    base_domain: Option<String>,

    /// Directory for saved pages and the visitedLinks file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Format of saved pages
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON file with startUrl, baseDomain, urlPattern, patternType, outputDir
    /// and fileFormat; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pages rendered at the same time
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Seconds to wait for one page
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
}

impl Cli {
    fn raw_config(&self) -> RawConfig {
        RawConfig {
            start_url: self.start_url.clone(),
            base_domain: self.base_domain.clone(),
            url_pattern: self.pattern.clone(),
            pattern_type: self.pattern_type,
            output_dir: self.output_dir.clone(),
            file_format: self.format,
        }
    }
}

async fn run(cli: Cli) -> Result<Vec<String>, CrawlerError> {
    let file = match &cli.config {
        Some(path) => RawConfig::from_file(path)?,
        None => RawConfig::default(),
    };
    let config = file.merge(cli.raw_config()).build()?;

    let options = CrawlOptions {
        concurrency: cli.concurrency,
        navigation_timeout: Duration::from_secs(cli.timeout),
    };

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    run_crawl_until(
        config,
        options,
        HttpRenderer::default(),
        FsContentWriter,
        shutdown,
    )
    .await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    match run(Cli::parse()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(CrawlerError::Config(e)) => {
            error!("Crawl not started, invalid configuration: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
