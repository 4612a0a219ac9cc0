//! JSONL reading operations.
//!
//! This module provides async functionality for reading JSONL data
//! line-by-line with line number tracking for warning and error reporting.

use crate::{Result, Warning};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

/// Async reader for JSONL (JSON Lines) data.
///
/// `JsonlReader` wraps an async reader in a [`BufReader`] and tracks the
/// 1-based number of the last line read.
///
/// # Examples
///
/// ```no_run
/// use trellis_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("graph.jsonl").await?;
/// let reader = JsonlReader::new(file);
/// let (values, warnings) = reader.read_resilient::<serde_json::Value>().await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    /// Buffered reader wrapping the underlying async reader.
    reader: BufReader<R>,
    /// Current line number (0 before any lines are read).
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
        }
    }

    /// Returns the 1-based number of the last line read, or 0 before any read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next raw line without its trailing newline.
    ///
    /// Returns `Ok(None)` at end of input. The bytes are returned unchecked so
    /// that callers can decide how to treat invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub async fn read_line_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Reads every remaining line, decoding each into `T`.
    ///
    /// Blank lines are ignored. Lines that are not valid UTF-8 or do not
    /// decode into `T` are skipped and reported as [`Warning`]s; reading
    /// continues with the next line.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying reader fails.
    pub async fn read_resilient<T: DeserializeOwned>(mut self) -> Result<(Vec<T>, Vec<Warning>)> {
        let mut values = Vec::new();
        let mut warnings = Vec::new();

        while let Some(bytes) = self.read_line_bytes().await? {
            let line_number = self.line_number;
            let Ok(line) = String::from_utf8(bytes) else {
                warnings.push(Warning::SkippedLine {
                    line_number,
                    reason: "invalid UTF-8".to_string(),
                });
                continue;
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(value) => values.push(value),
                Err(e) => warnings.push(Warning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                }),
            }
        }

        Ok((values, warnings))
    }

    /// Consumes the reader, returning the underlying buffered reader.
    #[must_use]
    pub fn into_inner(self) -> BufReader<R> {
        self.reader
    }
}

/// Reads a JSONL file, skipping unusable lines instead of failing.
///
/// Each skipped line is logged at `warn` level and returned as a [`Warning`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read. A missing file is
/// reported as an IO error; see [`crate::Error::is_not_found`].
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).await?;
    let (values, warnings) = JsonlReader::new(file).read_resilient().await?;

    for warning in &warnings {
        warn!(path = %path.display(), "{warning}");
    }
    debug!(
        path = %path.display(),
        records = values.len(),
        warnings = warnings.len(),
        "Read JSONL file"
    );

    Ok((values, warnings))
}
