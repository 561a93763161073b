use crate::{scope, utils, WriteError};
use itertools::Itertools;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::info;

pub const VISITED_LINKS_FILE: &str = "visitedLinks";

#[derive(Debug, Default)]
struct Ledger {
    seen: HashSet<String>,
    order: Vec<String>,
}

/// De-duplication ledger of one crawl run.
///
/// Urls are keyed without their fragment. The set only grows.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    ledger: Mutex<Ledger>,
}

fn key(url: &str) -> String {
    scope::normalize(url).unwrap_or_else(|| {
        url.split('#')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    })
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for this run. Returns `false` when it was claimed before,
    /// possibly by another task.
    pub fn try_visit(&self, url: &str) -> bool {
        let key = key(url);
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        if ledger.seen.contains(&key) {
            return false;
        }
        ledger.seen.insert(key.clone());
        ledger.order.push(key);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        let key = key(url);
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .seen
            .contains(&key)
    }

    pub fn len(&self) -> usize {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visited urls in the order they were claimed.
    pub fn snapshot(&self) -> Vec<String> {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .order
            .clone()
    }

    /// Saves the snapshot to `<dir>/visitedLinks`, one url per line.
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf, WriteError> {
        let links = self.snapshot();
        let path = dir.join(VISITED_LINKS_FILE);
        utils::write_atomic(&path, &links.iter().join("\n")).await?;
        info!("Saved {} visited links to {}", links.len(), path.display());
        Ok(path)
    }
}
