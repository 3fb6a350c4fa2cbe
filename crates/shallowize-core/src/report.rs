//! Per-repository results of a run

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::compact::Strategy;
use crate::error::Result;

/// What happened to a repository's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// History was truncated
    Done,
    /// Refused before any change was made
    Aborted,
    /// A compaction step failed
    Failed,
    /// Not compacted (list mode or interrupted run)
    Skipped,
}

/// Result for one discovered repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    #[serde(serialize_with = "serialize_lossy_path")]
    pub path: PathBuf,
    /// `None` only when the measurement itself failed
    pub size_before_bytes: Option<u64>,
    pub size_after_bytes: Option<u64>,
    pub outcome: Outcome,
    pub strategy: Strategy,
    pub error: Option<String>,
}

impl RepositoryRecord {
    pub fn new(path: impl Into<PathBuf>, strategy: Strategy) -> Self {
        let mut record = Self {
            path: path.into(),
            size_before_bytes: None,
            size_after_bytes: None,
            outcome: Outcome::Skipped,
            strategy,
            error: None,
        };
        if record.path.to_str().is_none() {
            record.push_error("path is not valid UTF-8; invalid bytes are shown as U+FFFD");
        }
        record
    }

    /// Append an error message, keeping any earlier one
    pub fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error = Some(match self.error.take() {
            Some(existing) => format!("{}\n{}", existing, message),
            None => message,
        });
    }

    /// Bytes reclaimed, negative if the repository grew
    pub fn bytes_saved(&self) -> Option<i128> {
        match (self.size_before_bytes, self.size_after_bytes) {
            (Some(before), Some(after)) => Some(i128::from(before) - i128::from(after)),
            _ => None,
        }
    }
}

/// All records of one run, keyed by repository path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportMap {
    records: BTreeMap<PathBuf, RepositoryRecord>,
}

impl Serialize for ReportMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (path, record) in &self.records {
            map.serialize_entry(&path.to_string_lossy(), record)?;
        }
        map.end()
    }
}

/// JSON strings must be UTF-8, so undecodable path bytes are replaced
fn serialize_lossy_path<S: Serializer>(
    path: &Path,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

impl ReportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any earlier record for the same path
    pub fn insert(&mut self, record: RepositoryRecord) {
        self.records.insert(record.path.clone(), record);
    }

    pub fn get(&self, path: &Path) -> Option<&RepositoryRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.records.values()
    }

    /// Number of records with the given outcome
    pub fn count(&self, outcome: Outcome) -> usize {
        self.records().filter(|r| r.outcome == outcome).count()
    }

    /// Total bytes reclaimed across repositories with both measurements
    pub fn total_saved(&self) -> i128 {
        self.records().filter_map(RepositoryRecord::bytes_saved).sum()
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
