//! JSONL (JSON Lines) persistence primitives for trellis.
//!
//! This crate provides line-tracking async reading, buffered writing,
//! resilient loading that reports bad lines as warnings instead of failing,
//! and crash-safe atomic file replacement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl_resilient};
pub use warning::Warning;
pub use writer::JsonlWriter;
