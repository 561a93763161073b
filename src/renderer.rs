use crate::{RenderError, Renderer};
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

const E: &str = "Invalid selector";
lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect(E);
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

/// What a renderer hands back for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub title: String,
    pub markup: String,
    /// Absolute hrefs of every anchor, in document order.
    pub links: Vec<String>,
}

/// Renderer backed by a plain HTTP client. Pages that build their content
/// with scripts come back as served.
#[derive(Debug, Clone, Default)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        HttpRenderer { client }
    }
}

#[async_trait::async_trait]
impl Renderer for HttpRenderer {
    async fn render(
        &self,
        url: &str,
        navigation_timeout: Duration,
    ) -> Result<RenderedPage, RenderError> {
        let navigation = |e: reqwest::Error| {
            if e.is_timeout() {
                RenderError::Timeout {
                    url: url.to_string(),
                    timeout: navigation_timeout,
                }
            } else {
                RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        debug!("Visit {}", url);
        let response = self
            .client
            .get(url)
            .timeout(navigation_timeout)
            .send()
            .await
            .map_err(navigation)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let base = response.url().clone();
        let markup = response.text().await.map_err(navigation)?;
        let (title, links) = extract(&markup, &base);

        Ok(RenderedPage {
            url: url.to_string(),
            title,
            markup,
            links,
        })
    }
}

/// Title and resolved anchor hrefs of `markup`, as a browser would report
/// them for a page loaded from `base`.
pub fn extract(markup: &str, base: &Url) -> (String, Vec<String>) {
    let doc = Html::parse_document(markup);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let links = doc
        .select(&A)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .collect();

    (title, links)
}
