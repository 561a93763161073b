use crate::{ScopeConfig, VisitedRegistry};
use tracing::debug;
use url::Url;

/// Parses `url` as an absolute url and drops its fragment.
///
/// Returns `None` for anything that is not an absolute url.
pub fn normalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Whether `candidate` should be crawled: same host as the run, matching the
/// url pattern, and not visited yet. Never fails; unparsable links are simply
/// out of scope.
pub fn is_in_scope(candidate: &str, config: &ScopeConfig, visited: &VisitedRegistry) -> bool {
    let Ok(mut url) = Url::parse(candidate.trim()) else {
        debug!("Skipping link: {} (malformed)", candidate);
        return false;
    };

    if !matches!(url.scheme(), "http" | "https") {
        debug!("Skipping link: {} (not http)", candidate);
        return false;
    }

    if url.host_str() != Some(config.base_hostname()) {
        debug!("Skipping link: {} (not in base domain)", candidate);
        return false;
    }

    if !config.pattern().is_match(candidate) {
        debug!("Skipping link: {} (does not match url pattern)", candidate);
        return false;
    }

    url.set_fragment(None);
    if visited.contains(url.as_str()) {
        debug!("Skipping link: {} (already visited)", candidate);
        return false;
    }

    true
}
