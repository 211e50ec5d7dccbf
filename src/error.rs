//! Error types for each failure domain of a scrape run.
//!
//! Every collaborator boundary returns its own error so the failure path is
//! visible in the signature:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`DateParseError`] | [`crate::dates`] | article skipped or kept with a sentinel |
//! | [`NavigationError`] | [`crate::browser::Navigator`] | run ends as if pagination finished |
//! | [`FetchError`] | [`crate::images::ImageFetcher`] | item records `"No Image Found"` |
//! | [`SinkError`] | [`crate::outputs::excel::ResultSink`] | propagated, the work item fails |
//! | [`ConfigError`] | [`crate::config`], [`crate::workitems`] | startup aborts |

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A site-displayed date that could not be turned into a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// None of the known month spellings occur in the input.
    #[error("no recognised month in `{0}`")]
    UnknownMonth(String),
    /// A month was found but the rest does not follow `<Month> <day>, <year>`.
    #[error("`{input}` does not match `{layout}`")]
    Layout { input: String, layout: &'static str },
}

/// Failure talking to the browser page.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },
    #[error("no element matches `{0}`")]
    ElementNotFound(String),
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    #[error("{0}")]
    Other(String),
}

/// Failure downloading an article image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image url `{0}`")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure persisting rows to the spreadsheet.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
}

/// Unreadable or inconsistent startup input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parse_error_display() {
        let e = DateParseError::UnknownMonth("yesterday".to_string());
        assert_eq!(e.to_string(), "no recognised month in `yesterday`");

        let e = DateParseError::Layout {
            input: "August 2024".to_string(),
            layout: "%B %d, %Y",
        };
        assert_eq!(e.to_string(), "`August 2024` does not match `%B %d, %Y`");
    }

    #[test]
    fn test_navigation_timeout_display() {
        let e = NavigationError::Timeout {
            selector: "button".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert!(e.to_string().contains("`button`"));
        assert!(e.to_string().contains("2s"));
    }
}
