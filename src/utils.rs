use crate::WriteError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::{
    io::{self, Write},
    path::Path,
};
use tempfile::NamedTempFile;

pub(crate) fn get_now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Writes `contents` to a fresh temp file in the target directory and
/// renames it into place, so readers never observe a half written file.
/// Every call gets its own temp file; concurrent writes to the same `path`
/// all succeed and the last rename wins.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), WriteError> {
    let target = path.to_path_buf();
    let contents = contents.to_string();

    let written = tokio::task::spawn_blocking(move || -> io::Result<()> {
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .unwrap_or_else(|e| Err(io::Error::new(io::ErrorKind::Other, e)));

    written.map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T12:30:05.000Z");
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.md");

        write_atomic(&path, "first").await.unwrap();
        write_atomic(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_write_atomic_same_path_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Same_Title.html");

        let mut writes = tokio::task::JoinSet::new();
        for i in 0..64 {
            let path = path.clone();
            writes.spawn(async move { write_atomic(&path, &format!("write {}", i)).await });
        }

        let mut errors = 0;
        while let Some(res) = writes.join_next().await {
            if res.unwrap().is_err() {
                errors += 1;
            }
        }

        assert_eq!(errors, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("write "));
    }

    #[tokio::test]
    async fn test_write_atomic_into_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("page.md");

        let res = write_atomic(&path, "content").await;
        assert!(matches!(res, Err(WriteError::Io { .. })));
    }
}
