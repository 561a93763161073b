use crate::{utils, ContentWriter, OutputFormat, RenderedPage, WriteError};
use chrono::{DateTime, Utc};
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tracing::info;

const E: &str = "Invalid selector";
lazy_static! {
    static ref BODY: Selector = Selector::parse("body").expect(E);
}

const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub markup: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

impl Document {
    pub fn from_page(page: &RenderedPage, timestamp: DateTime<Utc>) -> Self {
        Document {
            title: page.title.clone(),
            markup: page.markup.clone(),
            url: page.url.clone(),
            timestamp,
        }
    }

    /// Serialized file content for `format`.
    pub fn render(&self, format: OutputFormat) -> String {
        let timestamp = utils::format_timestamp(&self.timestamp);
        match format {
            OutputFormat::Markdown => format!(
                "# {}\n\n- URL: {}\n- Timestamp: {}\n\n{}",
                self.title,
                self.url,
                timestamp,
                html2md::parse_html(&body_html(&self.markup))
            ),
            OutputFormat::Html => format!(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="crawler-url" content="{}">
    <meta name="crawler-timestamp" content="{}">
    <title>{}</title>
</head>
<body>
{}
</body>
</html>"#,
                self.url, timestamp, self.title, self.markup
            ),
        }
    }
}

/// Inner html of `<body>`, or the whole markup when there is no body.
fn body_html(markup: &str) -> String {
    let doc = Html::parse_document(markup);
    doc.select(&BODY)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_else(|| markup.to_string())
}

/// Every character outside `[A-Za-z0-9]` becomes `_`.
///
/// Distinct titles can map to the same name; the later page then overwrites
/// the earlier file.
pub fn sanitize_title(title: &str) -> String {
    regex!("[^a-zA-Z0-9]").replace_all(title, "_").into_owned()
}

pub fn file_name(title: &str, format: OutputFormat) -> String {
    let stem = sanitize_title(title);
    let stem: &str = if stem.is_empty() { UNTITLED } else { &stem };
    format!("{}.{}", stem, format.extension())
}

/// Writes documents as files named after their titles.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentWriter;

#[async_trait::async_trait]
impl ContentWriter for FsContentWriter {
    async fn write(
        &self,
        document: &Document,
        output_dir: &Path,
        format: OutputFormat,
    ) -> Result<PathBuf, WriteError> {
        let path = output_dir.join(file_name(&document.title, format));
        utils::write_atomic(&path, &document.render(format)).await?;
        info!("Saved {} file: {}", format, path.display());
        Ok(path)
    }
}
