//! Hash-based session id generation.
//!
//! Ids have the form `session_<hash>` where `<hash>` is a base36 encoding of
//! a SHA256 digest over a caller seed, the current time and a nonce. A
//! collision with a known id is retried with the next nonce.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Prefix of every session id.
pub const SESSION_PREFIX: &str = "session_";

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const ID_LENGTH: usize = 10;
const FALLBACK_LENGTH: usize = 12;

/// Generates session ids that do not collide with `existing`.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    existing: HashSet<String>,
}

impl SessionIdGenerator {
    /// Create a generator aware of `existing` ids.
    pub fn new(existing: impl IntoIterator<Item = String>) -> Self {
        Self {
            existing: existing.into_iter().collect(),
        }
    }

    /// Generate a fresh id derived from `seed`.
    pub fn generate(&mut self, seed: &str) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        for nonce in 0..MAX_NONCE {
            let id = hash_id(seed, timestamp, nonce, ID_LENGTH);
            if !self.existing.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, "Generated unique session id after collision retries");
                }
                self.existing.insert(id.clone());
                return id;
            }
        }

        warn!(max_nonce = MAX_NONCE, "All nonces exhausted, using a longer session id");
        let id = hash_id(seed, timestamp, MAX_NONCE, FALLBACK_LENGTH);
        self.existing.insert(id.clone());
        id
    }
}

fn hash_id(seed: &str, timestamp: i64, nonce: u32, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{seed}|{timestamp}|{nonce}").as_bytes());
    let digest = hasher.finalize();
    format!("{SESSION_PREFIX}{}", encode_base36(&digest[..8], length))
}

/// Encode up to eight bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n: u64 = 0;
    for &byte in bytes {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut digits = Vec::with_capacity(length);
    while digits.len() < length {
        digits.push(char::from(BASE36_CHARS[(n % 36) as usize]));
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// Returns `true` if `id` looks like a generated session id.
#[must_use]
pub fn is_session_id(id: &str) -> bool {
    id.strip_prefix(SESSION_PREFIX).is_some_and(|hash| {
        (ID_LENGTH..=FALLBACK_LENGTH).contains(&hash.len())
            && hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    })
}
