// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intent record: the 8-field (legacy 5-field) colon-delimited log line
//! that is the unit of the append-only intent log.

use crate::error::IntentRecordError;
use chrono::{DateTime, Local, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    UploadRemote,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::UploadRemote => "upload-remote",
            Operation::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Result<Self, IntentRecordError> {
        match s {
            "upload" => Ok(Operation::Upload),
            "upload-remote" => Ok(Operation::UploadRemote),
            "delete" => Ok(Operation::Delete),
            other => Err(IntentRecordError::UnknownOperation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Queued,
    InProgress,
    Error,
    Complete,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::InProgress => "in-progress",
            Status::Error => "error",
            Status::Complete => "complete",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Complete)
    }

    fn parse(s: &str) -> Result<Self, IntentRecordError> {
        match s {
            "queued" => Ok(Status::Queued),
            "in-progress" => Ok(Status::InProgress),
            "error" => Ok(Status::Error),
            "complete" => Ok(Status::Complete),
            other => Err(IntentRecordError::UnknownStatus(other.to_string())),
        }
    }
}

const TIMESTAMP_FMT: &str = "%Y%m%d.%H%M%S.%6f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRecord {
    pub uid: String,
    pub filesystem: String,
    pub snapshot: String,
    pub operation: Operation,
    pub status: Status,
    pub timestamp: NaiveDateTime,
    pub locator: Option<String>,
    pub bucket: Option<String>,
}

impl IntentRecord {
    pub fn new(
        uid: impl Into<String>,
        filesystem: impl Into<String>,
        snapshot: impl Into<String>,
        operation: Operation,
        status: Status,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            uid: uid.into(),
            filesystem: filesystem.into(),
            snapshot: snapshot.into(),
            operation,
            status,
            timestamp: at.naive_local(),
            locator: None,
            bucket: None,
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Serialise as one 8-field colon-delimited line, no trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.uid,
            self.filesystem,
            self.snapshot,
            self.operation.as_str(),
            self.status.as_str(),
            self.timestamp.format(TIMESTAMP_FMT),
            self.locator.as_deref().unwrap_or(""),
            self.bucket.as_deref().unwrap_or(""),
        )
    }

    /// Parse either the current 8-field shape or the legacy 5-field shape.
    /// For the legacy shape, the timestamp is derived from the snapshot
    /// name's dotted numeric suffix, and locator/bucket are empty.
    pub fn parse(line: &str) -> Result<Self, IntentRecordError> {
        let fields: Vec<&str> = line.split(':').collect();
        match fields.len() {
            8 => {
                let timestamp = NaiveDateTime::parse_from_str(fields[5], TIMESTAMP_FMT)
                    .map_err(|_| IntentRecordError::BadTimestamp(fields[5].to_string()))?;
                Ok(IntentRecord {
                    uid: fields[0].to_string(),
                    filesystem: fields[1].to_string(),
                    snapshot: fields[2].to_string(),
                    operation: Operation::parse(fields[3])?,
                    status: Status::parse(fields[4])?,
                    timestamp,
                    locator: non_empty(fields[6]),
                    bucket: non_empty(fields[7]),
                })
            }
            5 => {
                let snapshot = fields[2];
                let timestamp = timestamp_from_snapshot_suffix(snapshot)
                    .ok_or_else(|| IntentRecordError::BadTimestamp(snapshot.to_string()))?;
                Ok(IntentRecord {
                    uid: fields[0].to_string(),
                    filesystem: fields[1].to_string(),
                    snapshot: snapshot.to_string(),
                    operation: Operation::parse(fields[3])?,
                    status: Status::parse(fields[4])?,
                    timestamp,
                    locator: None,
                    bucket: None,
                })
            }
            other => Err(IntentRecordError::WrongFieldCount(other)),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Derive a local timestamp from a snapshot name's `{entry}.{YYMMDDhhmm}`
/// dotted suffix, for legacy 5-field records.
fn timestamp_from_snapshot_suffix(snapshot: &str) -> Option<NaiveDateTime> {
    let (_, suffix) = snapshot.rsplit_once('.')?;
    if suffix.len() != 10 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{suffix}00"), "%y%m%d%H%M%S").ok()
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
