//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so invalid values are rejected at
//! parse time.

/// Longest entity name accepted on the command line.
pub const MAX_NAME_LENGTH: usize = 500;

/// Validate an entity name: trimmed, non-empty, bounded length.
pub fn validate_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name cannot exceed {MAX_NAME_LENGTH} characters"));
    }
    Ok(trimmed.to_string())
}

/// Validate a traversal depth (1 to 10 hops).
pub fn validate_depth(s: &str) -> Result<usize, String> {
    let depth: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid depth: '{s}'. Expected a positive integer"))?;
    if !(1..=10).contains(&depth) {
        return Err(format!("Depth must be between 1 and 10, got {depth}"));
    }
    Ok(depth)
}
