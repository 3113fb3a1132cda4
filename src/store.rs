//! On-disk job ledger.
//!
//! The whole collection lives in one JSON array that is read in full and
//! rewritten in full whenever a new record is added.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fs_utils::write_atomic;

/// Format of `added_at`, local clock with second precision.
pub const ADDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read job store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("job store {path} is not a valid job list: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize job store: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write job store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A video that yielded at least one job link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub source: String,
    pub video_title: String,
    #[serde(rename = "channel")]
    pub channel_name: String,
    pub added_at: String,
    pub job_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl JobRecord {
    /// Build a record stamped with the current local time.
    #[must_use]
    pub fn new(
        source: &str,
        video_title: &str,
        channel_name: &str,
        video_url: &str,
        job_links: Vec<String>,
    ) -> Self {
        Self {
            source: source.to_string(),
            video_title: video_title.to_string(),
            channel_name: channel_name.to_string(),
            added_at: Local::now().format(ADDED_AT_FORMAT).to_string(),
            job_links,
            video_url: Some(video_url.to_string()),
        }
    }
}

/// Whether any record carries exactly this title.
#[must_use]
pub fn exists(records: &[JobRecord], video_title: &str) -> bool {
    records.iter().any(|r| r.video_title == video_title)
}

/// Whether a record already covers this video, by title or by URL.
#[must_use]
pub fn contains(records: &[JobRecord], video_title: &str, video_url: &str) -> bool {
    exists(records, video_title)
        || records
            .iter()
            .any(|r| r.video_url.as_deref() == Some(video_url))
}

/// JSON-file backed job store.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored record. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Vec<JobRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No job store yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Replace the stored collection with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub async fn save(&self, records: &[JobRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records).map_err(StoreError::Serialize)?;

        write_atomic(&self.path, &json)
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })?;

        debug!(path = %self.path.display(), count = records.len(), "Job store saved");
        Ok(())
    }
}
