//! Output formatting for CLI commands.
//!
//! Every command prints a single JSON document to stdout.

use serde::Serialize;
use std::io::{self, Write};

/// JSON layout for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Indented, one field per line
    Pretty,
    /// Single line
    Compact,
}

/// Serialize `value` to `w` in the requested layout, followed by a newline.
pub fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T, mode: OutputMode) -> io::Result<()> {
    let json = match mode {
        OutputMode::Pretty => serde_json::to_string_pretty(value),
        OutputMode::Compact => serde_json::to_string(value),
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

/// Print `value` to stdout as JSON.
pub fn print_json<T: Serialize>(value: &T, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value, mode)
}
