//! Parsing of the dates shown under each search result.
//!
//! The site prints dates such as `"Aug. 26, 2024"`, `"Sept. 3, 2024"` or
//! `"June 7, 2024"`. Two independent normalization rules exist:
//!
//! - [`parse_published_date`] rewrites the first month spelling it finds to
//!   the full month name and parses `"<Month> <day>, <year>"`. Used for every
//!   article.
//! - [`parse_abbreviated_date`] only strips the period after a three letter
//!   abbreviation and parses `"<Mon> <day>, <year>"`. Used once, for the
//!   first article of the first page.
//!
//! The two rules disagree on some inputs (`"Sept. 3, 2024"`, full month
//! names) and are kept apart on purpose.

use crate::error::DateParseError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

const FULL_MONTH_LAYOUT: &str = "%B %d, %Y";
const SHORT_MONTH_LAYOUT: &str = "%b %d, %Y";

/// Month spellings and their full names, in lookup order.
///
/// The first entry found anywhere in the input wins. Full names come before
/// their abbreviations so `"March"` is never rewritten to `"Marchch"`, and
/// the longer `"Sept."` precedes `"Sep."`. An input holding several month
/// like substrings resolves by this order, not by position in the string.
const MONTH_SPELLINGS: &[(&str, &str)] = &[
    ("January", "January"),
    ("Jan.", "January"),
    ("Jan", "January"),
    ("February", "February"),
    ("Feb.", "February"),
    ("Feb", "February"),
    ("March", "March"),
    ("Mar.", "March"),
    ("Mar", "March"),
    ("April", "April"),
    ("Apr.", "April"),
    ("Apr", "April"),
    ("May", "May"),
    ("June", "June"),
    ("Jun.", "June"),
    ("Jun", "June"),
    ("July", "July"),
    ("Jul.", "July"),
    ("Jul", "July"),
    ("August", "August"),
    ("Aug.", "August"),
    ("Aug", "August"),
    ("September", "September"),
    ("Sept.", "September"),
    ("Sep.", "September"),
    ("Sept", "September"),
    ("Sep", "September"),
    ("October", "October"),
    ("Oct.", "October"),
    ("Oct", "October"),
    ("November", "November"),
    ("Nov.", "November"),
    ("Nov", "November"),
    ("December", "December"),
    ("Dec.", "December"),
    ("Dec", "December"),
];

static ABBREVIATION_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\w{3})\.\s").expect("static regex"));

/// Rewrite the first known month spelling found in `raw` to its full name.
///
/// Returns `None` when no spelling occurs. Every occurrence of the matching
/// spelling is replaced.
pub fn expand_month(raw: &str) -> Option<String> {
    MONTH_SPELLINGS
        .iter()
        .find(|(spelling, _)| raw.contains(spelling))
        .map(|(spelling, full)| raw.replace(spelling, full))
}

/// Parse a site date such as `"Aug. 26, 2024"` to midnight of that day.
///
/// Failures are logged and returned; the caller decides whether the
/// article is dropped or kept with a sentinel.
pub fn parse_published_date(raw: &str) -> Result<NaiveDateTime, DateParseError> {
    let result = expand_month(raw.trim())
        .ok_or_else(|| DateParseError::UnknownMonth(raw.to_string()))
        .and_then(|expanded| {
            NaiveDate::parse_from_str(&expanded, FULL_MONTH_LAYOUT).map_err(|_| {
                DateParseError::Layout {
                    input: expanded,
                    layout: FULL_MONTH_LAYOUT,
                }
            })
        })
        .map(|date| date.and_time(NaiveTime::MIN));

    if let Err(ref e) = result {
        warn!(raw, error = %e, "Date format error");
    }
    result
}

/// The stricter rule used by the first-page range check.
///
/// Every `"<abc>. "` becomes `"<abc> "` and the result must match
/// `"<Mon> <day>, <year>"` with a three letter month.
pub fn parse_abbreviated_date(raw: &str) -> Result<NaiveDateTime, DateParseError> {
    let normalized = ABBREVIATION_PERIOD.replace_all(raw.trim(), "${1} ");
    NaiveDate::parse_from_str(&normalized, SHORT_MONTH_LAYOUT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| DateParseError::Layout {
            input: normalized.into_owned(),
            layout: SHORT_MONTH_LAYOUT,
        })
}
