use crate::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use url::Url;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PatternMode {
    #[default]
    Contains,
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

/// Inclusion predicate over candidate urls.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Contains(String),
    Regex(Regex),
}

impl UrlPattern {
    /// Builds the pattern for `mode`. Regular expressions are compiled here so
    /// a bad one is rejected before any page is fetched.
    pub fn new(pattern: &str, mode: PatternMode) -> Result<Self, ConfigError> {
        match mode {
            PatternMode::Contains => Ok(UrlPattern::Contains(pattern.to_string())),
            PatternMode::Regex => Ok(UrlPattern::Regex(Regex::new(pattern)?)),
        }
    }

    pub fn mode(&self) -> PatternMode {
        match self {
            UrlPattern::Contains(_) => PatternMode::Contains,
            UrlPattern::Regex(_) => PatternMode::Regex,
        }
    }

    pub fn is_match(&self, url: &str) -> bool {
        match self {
            UrlPattern::Contains(needle) => url.contains(needle.as_str()),
            UrlPattern::Regex(re) => re.is_match(url),
        }
    }
}

impl Default for UrlPattern {
    fn default() -> Self {
        UrlPattern::Contains(String::new())
    }
}

/// Everything a run needs to decide what to crawl and where to put it.
///
/// Built once before the run and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    start_url: Url,
    base_hostname: String,
    pattern: UrlPattern,
    output_dir: PathBuf,
    format: OutputFormat,
}

impl ScopeConfig {
    pub fn new<P: Into<PathBuf>>(
        start_url: &str,
        pattern: UrlPattern,
        output_dir: P,
        format: OutputFormat,
    ) -> Result<Self, ConfigError> {
        let parsed = Url::parse(start_url).map_err(|source| ConfigError::InvalidStartUrl {
            url: start_url.to_string(),
            source,
        })?;
        let base_hostname = parsed
            .host_str()
            .ok_or_else(|| ConfigError::MissingHost(start_url.to_string()))?
            .to_string();

        Ok(ScopeConfig {
            start_url: parsed,
            base_hostname,
            pattern,
            output_dir: output_dir.into(),
            format,
        })
    }

    /// Restricts the crawl to `hostname` instead of the start url's host.
    /// Hosts compare in the lowercase form urls report them in.
    pub fn with_base_hostname<S: AsRef<str>>(mut self, hostname: S) -> Self {
        self.base_hostname = hostname.as_ref().trim().to_ascii_lowercase();
        self
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn base_hostname(&self) -> &str {
        &self.base_hostname
    }

    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Unvalidated settings, as read from a JSON config file or collected from
/// the command line. Field names follow the control panel form.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    pub start_url: Option<String>,
    pub base_domain: Option<String>,
    pub url_pattern: Option<String>,
    pub pattern_type: Option<PatternMode>,
    pub output_dir: Option<PathBuf>,
    pub file_format: Option<OutputFormat>,
}

impl RawConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Values set in `other` win over values set in `self`.
    pub fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            start_url: other.start_url.or(self.start_url),
            base_domain: other.base_domain.or(self.base_domain),
            url_pattern: other.url_pattern.or(self.url_pattern),
            pattern_type: other.pattern_type.or(self.pattern_type),
            output_dir: other.output_dir.or(self.output_dir),
            file_format: other.file_format.or(self.file_format),
        }
    }

    pub fn build(self) -> Result<ScopeConfig, ConfigError> {
        let start_url = self.start_url.ok_or(ConfigError::MissingStartUrl)?;
        let pattern = UrlPattern::new(
            self.url_pattern.as_deref().unwrap_or_default(),
            self.pattern_type.unwrap_or_default(),
        )?;
        let config = ScopeConfig::new(
            &start_url,
            pattern,
            self.output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            self.file_format.unwrap_or_default(),
        )?;

        Ok(match self.base_domain {
            Some(domain) if !domain.trim().is_empty() => {
                config.with_base_hostname(domain.trim())
            }
            _ => config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contains_pattern() {
        let pattern = UrlPattern::new("guide", PatternMode::Contains).unwrap();
        assert!(pattern.is_match("https://docs.example.com/guide/page1"));
        assert!(!pattern.is_match("https://docs.example.com/ref/page2"));
    }

    #[test]
    fn test_contains_does_not_interpret_regex() {
        let pattern = UrlPattern::new("a.b", PatternMode::Contains).unwrap();
        assert!(pattern.is_match("https://x.test/a.b"));
        assert!(!pattern.is_match("https://x.test/axb"));
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = UrlPattern::new(r"^.*\/guide\/.*$", PatternMode::Regex).unwrap();
        assert_eq!(pattern.mode(), PatternMode::Regex);
        assert!(pattern.is_match("https://docs.example.com/guide/page1"));
        assert!(!pattern.is_match("https://docs.example.com/ref/page2"));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let res = UrlPattern::new("guide/(unclosed", PatternMode::Regex);
        assert!(matches!(res, Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_base_hostname_from_start_url() {
        let config = ScopeConfig::new(
            "https://docs.example.com/start#top",
            UrlPattern::default(),
            "out",
            OutputFormat::Markdown,
        )
        .unwrap();
        assert_eq!(config.base_hostname(), "docs.example.com");
        assert_eq!(config.output_dir(), Path::new("out"));
    }

    #[test]
    fn test_relative_start_url_is_rejected() {
        let res = ScopeConfig::new(
            "/guide/page1",
            UrlPattern::default(),
            "out",
            OutputFormat::Html,
        );
        assert!(matches!(res, Err(ConfigError::InvalidStartUrl { .. })));
    }

    #[test]
    fn test_start_url_without_host_is_rejected() {
        let res = ScopeConfig::new(
            "mailto:someone@example.com",
            UrlPattern::default(),
            "out",
            OutputFormat::Html,
        );
        assert!(matches!(res, Err(ConfigError::MissingHost(_))));
    }

    #[test]
    fn test_raw_config_from_json() {
        let raw = RawConfig::from_json(
            r#"{
                "startUrl": "https://google.github.io/eng-practices/review/developer/small-cls.html",
                "baseDomain": "google.github.io",
                "urlPattern": "eng-practices/review",
                "patternType": "contains",
                "outputDir": "output",
                "fileFormat": "html"
            }"#,
        )
        .unwrap();
        assert_eq!(raw.pattern_type, Some(PatternMode::Contains));
        assert_eq!(raw.file_format, Some(OutputFormat::Html));

        let config = raw.build().unwrap();
        assert_eq!(config.base_hostname(), "google.github.io");
        assert_eq!(config.format(), OutputFormat::Html);
        assert!(config
            .pattern()
            .is_match("https://google.github.io/eng-practices/review/index.html"));
    }

    #[test]
    fn test_raw_config_merge_prefers_override() {
        let file = RawConfig {
            start_url: Some("https://x.test/a".to_string()),
            url_pattern: Some("docs".to_string()),
            file_format: Some(OutputFormat::Html),
            ..Default::default()
        };
        let cli = RawConfig {
            url_pattern: Some("guide".to_string()),
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.start_url.as_deref(), Some("https://x.test/a"));
        assert_eq!(merged.url_pattern.as_deref(), Some("guide"));
        assert_eq!(merged.file_format, Some(OutputFormat::Html));
    }

    #[test]
    fn test_raw_config_defaults() {
        let config = RawConfig {
            start_url: Some("https://x.test/a".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(config.format(), OutputFormat::Markdown);
        assert_eq!(config.pattern().mode(), PatternMode::Contains);
        assert_eq!(config.output_dir(), Path::new(DEFAULT_OUTPUT_DIR));
        assert!(config.pattern().is_match("https://x.test/anything"));
    }

    #[test]
    fn test_base_domain_is_lowercased() {
        let config = RawConfig {
            start_url: Some("https://docs.example.com/guide".to_string()),
            base_domain: Some(" Docs.Example.COM ".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(config.base_hostname(), "docs.example.com");
    }

    #[test]
    fn test_raw_config_without_start_url() {
        let res = RawConfig::default().build();
        assert!(matches!(res, Err(ConfigError::MissingStartUrl)));
    }

    #[test]
    fn test_raw_config_invalid_regex() {
        let res = RawConfig {
            start_url: Some("https://x.test/a".to_string()),
            url_pattern: Some("[".to_string()),
            pattern_type: Some(PatternMode::Regex),
            ..Default::default()
        }
        .build();
        assert!(matches!(res, Err(ConfigError::InvalidPattern(_))));
    }
}
