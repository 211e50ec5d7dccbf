//! Reading the work item queue from a local JSON file.
//!
//! Two layouts are accepted: the Robocorp local work item file, an array of
//! `{"payload": {...}}` objects, and a bare array of payloads.

use crate::error::ConfigError;
use crate::models::{Payload, WorkItem};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkItemFile {
    Wrapped(Vec<WorkItem>),
    Bare(Vec<Payload>),
}

/// Parse the payloads in `raw`, in queue order.
pub fn parse_work_items(raw: &str) -> Result<Vec<Payload>, serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        WorkItemFile::Wrapped(items) => items.into_iter().map(|item| item.payload).collect(),
        WorkItemFile::Bare(payloads) => payloads,
    })
}

#[instrument(level = "info", fields(path = %path.display()))]
pub async fn load_work_items(path: &Path) -> Result<Vec<Payload>, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let payloads = parse_work_items(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(count = payloads.len(), "Loaded work items");
    Ok(payloads)
}
