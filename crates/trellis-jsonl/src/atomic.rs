//! Atomic write operations for JSONL files.
//!
//! Data is written to a sibling temporary file, flushed, and then renamed
//! over the target. On POSIX systems a rename within one filesystem is
//! atomic, so readers see either the old file or the new one.
//!
//! If a crash occurs before the rename, the original file remains intact and
//! the temporary file may be left behind.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tracing::debug;

/// Atomically writes a slice of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, a value fails to
/// serialize, a write fails, or the final rename fails. On failure the target
/// file is left unchanged.
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await
}

/// Atomically writes an iterator of values to a JSONL file.
///
/// Parent directories are created when missing.
///
/// # Errors
///
/// See [`write_jsonl_atomic`].
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        // Best-effort cleanup of temp file
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    debug!(path = %path.display(), "Atomically replaced JSONL file");

    Ok(())
}

/// Builds the temporary path by appending `.tmp` to the file name.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Serialize;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Record {
        id: u32,
    }

    #[rstest]
    #[case::with_extension("/path/to/graph.jsonl", "/path/to/graph.jsonl.tmp")]
    #[case::without_extension("/path/to/graph", "/path/to/graph.tmp")]
    #[case::multiple_extensions("/path/to/file.tar.gz", "/path/to/file.tar.gz.tmp")]
    #[case::relative("graph.jsonl", "graph.jsonl.tmp")]
    fn temp_path_appends_tmp(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(input)), Path::new(expected));
    }

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("graph.jsonl");
        tokio::fs::write(&target, "old content\n").await.unwrap();

        write_jsonl_atomic(&target, &[Record { id: 42 }]).await.unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents, "{\"id\":42}\n");
        assert!(!dir.path().join("graph.jsonl.tmp").exists());
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("sessions.jsonl");

        write_jsonl_atomic_iter(&target, (0..3).map(|id| Record { id }))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[tokio::test]
    async fn atomic_write_empty_slice_creates_empty_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("empty.jsonl");
        let records: Vec<Record> = vec![];

        write_jsonl_atomic(&target, &records).await.unwrap();

        assert_eq!(tokio::fs::metadata(&target).await.unwrap().len(), 0);
    }
}
