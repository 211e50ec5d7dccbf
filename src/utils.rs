//! Utility functions for text metrics, filename handling, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Phrase counting and money detection for each search result
//! - Filename sanitization for downloaded images
//! - String truncation for logging
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// `$1,200.50`, `$15`, `20 USD`, `50 dollars`, `1 dollar`.
static MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$\d{1,3}(,\d{3})*(\.\d{2})?)|(\d+(\.\d{2})?\s*(USD|dollars?))")
        .expect("static regex")
});

/// Count case-insensitive occurrences of `phrase` in a title and description.
///
/// Occurrences are non-overlapping and counted separately in each text, so a
/// phrase split across the title/description boundary is not counted. An
/// empty description contributes nothing and an empty phrase counts zero.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(count_phrase("economy", "Economy grows", "the ECONOMY"), 2);
/// ```
pub fn count_phrase(phrase: &str, title: &str, description: &str) -> usize {
    let needle = phrase.to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    let mut count = title.to_lowercase().matches(needle.as_str()).count();
    if !description.is_empty() {
        count += description.to_lowercase().matches(needle.as_str()).count();
    }
    count
}

/// Whether the title or description mentions an amount of money.
pub fn contains_money(title: &str, description: &str) -> bool {
    MONEY.is_match(title) || (!description.is_empty() && MONEY.is_match(description))
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_` and keep at
/// most `max_chars` characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("L.A. fires: what's next?", 30), "L_A__fires__what_s_next_");
/// ```
pub fn sanitize_filename(title: &str, max_chars: usize) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(max_chars)
        .collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes
/// with an ellipsis and byte count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::File::create(&probe_path).await?;
    if let Err(e) = fs::remove_file(&probe_path).await {
        warn!(probe = %probe_path.display(), error = %e, "Failed to remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}
