use crate::{
    scope, utils, ConfigError, ContentWriter, CrawlerError, Document, RenderError, RenderedPage,
    Renderer, ScopeConfig, VisitedRegistry,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Upper bound of pages rendered at the same time. With `1` pages are
    /// visited in depth-first order of their anchors.
    pub concurrency: usize,
    pub navigation_timeout: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        CrawlOptions {
            concurrency: DEFAULT_CONCURRENCY,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }
}

struct Context<R, W> {
    config: Arc<ScopeConfig>,
    renderer: Arc<R>,
    writer: W,
    visited: Arc<VisitedRegistry>,
    navigation_timeout: Duration,
}

/// Crawls everything reachable from the configured start url that stays in
/// scope, and returns the visited urls in the order they were claimed.
pub async fn run_crawl<R, W>(
    config: ScopeConfig,
    options: CrawlOptions,
    renderer: R,
    writer: W,
) -> Result<Vec<String>, CrawlerError>
where
    R: Renderer + Send + Sync + 'static,
    W: ContentWriter + Send + Sync + 'static,
{
    run_crawl_until(config, options, renderer, writer, std::future::pending::<()>()).await
}

/// Like [`run_crawl`], but stops scheduling new pages once `shutdown`
/// resolves. Pages already being rendered are finished and the visited
/// links collected so far are still saved.
pub async fn run_crawl_until<R, W, F>(
    config: ScopeConfig,
    options: CrawlOptions,
    renderer: R,
    writer: W,
    shutdown: F,
) -> Result<Vec<String>, CrawlerError>
where
    R: Renderer + Send + Sync + 'static,
    W: ContentWriter + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    if options.navigation_timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout.into());
    }
    tokio::fs::create_dir_all(config.output_dir())
        .await
        .map_err(|source| ConfigError::OutputDir {
            path: config.output_dir().to_path_buf(),
            source,
        })?;

    let ctx = Arc::new(Context {
        config: Arc::new(config),
        renderer: Arc::new(renderer),
        writer,
        visited: Arc::new(VisitedRegistry::new()),
        navigation_timeout: options.navigation_timeout,
    });
    let concurrency = options.concurrency.max(1);

    info!(
        "Crawling from {} (base domain {}, {} {})",
        ctx.config.start_url(),
        ctx.config.base_hostname(),
        concurrency,
        if concurrency == 1 { "worker" } else { "workers" }
    );

    let mut stack = vec![ctx.config.start_url().to_string()];
    let mut tasks = JoinSet::new();
    let mut cancelled = false;
    tokio::pin!(shutdown);

    loop {
        while !cancelled && tasks.len() < concurrency {
            let Some(link) = stack.pop() else {
                break;
            };
            let Some(url) = scope::normalize(&link) else {
                continue;
            };
            if !ctx.visited.try_visit(&url) {
                debug!("Skipping: {} (already visited)", url);
                continue;
            }
            info!("Crawling: {}", url);
            tasks.spawn(visit(Arc::clone(&ctx), url));
        }

        if tasks.is_empty() {
            break;
        }

        let joined = tokio::select! {
            biased;
            _ = &mut shutdown, if !cancelled => {
                warn!("Crawl cancelled, waiting for {} page(s) in flight", tasks.len());
                cancelled = true;
                continue;
            }
            joined = tasks.join_next() => joined,
        };

        match joined {
            // Links already on the stack are pushed again so the pop order
            // stays depth-first; the claim at pop time drops the extra copies.
            Some(Ok(links)) if !cancelled => stack.extend(links.into_iter().rev()),
            Some(Ok(_)) => {}
            Some(Err(e)) => error!("Crawl task failed: {}", e),
            None => break,
        }
    }

    let visited = ctx.visited.snapshot();
    ctx.visited
        .persist(ctx.config.output_dir())
        .await
        .map_err(CrawlerError::VisitedLinks)?;
    info!("Crawling completed: {} page(s) visited", visited.len());

    Ok(visited)
}

/// Renders, saves and filters one claimed page. Returns the in-scope links
/// found on it, in anchor order.
async fn visit<R, W>(ctx: Arc<Context<R, W>>, url: String) -> Vec<String>
where
    R: Renderer + Send + Sync + 'static,
    W: ContentWriter + Send + Sync + 'static,
{
    let page = match render(&ctx, &url).await {
        Ok(page) => page,
        Err(e) => {
            warn!("Error crawling {}: {}", url, e);
            return vec![];
        }
    };

    let document = Document::from_page(&page, utils::get_now());
    if let Err(e) = ctx
        .writer
        .write(&document, ctx.config.output_dir(), ctx.config.format())
        .await
    {
        error!("Error saving {}: {}", url, e);
    }

    debug!("Found {} links on {}", page.links.len(), url);
    page.links
        .into_iter()
        .filter(|link| scope::is_in_scope(link, &ctx.config, &ctx.visited))
        .collect()
}

/// Runs the renderer on its own task so a timeout can abort it and a panic
/// only loses this page.
async fn render<R, W>(ctx: &Context<R, W>, url: &str) -> Result<RenderedPage, RenderError>
where
    R: Renderer + Send + Sync + 'static,
{
    let timeout = ctx.navigation_timeout;
    let mut handle = {
        let renderer = Arc::clone(&ctx.renderer);
        let url = url.to_string();
        tokio::spawn(async move { renderer.render(&url, timeout).await })
    };

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(rendered)) => rendered,
        Ok(Err(_)) => Err(RenderError::Crashed {
            url: url.to_string(),
        }),
        Err(_) => {
            handle.abort();
            Err(RenderError::Timeout {
                url: url.to_string(),
                timeout,
            })
        }
    }
}
