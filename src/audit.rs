//! Append-only audit trail of guard decisions.
//!
//! Writes one JSON object per line. Records carry only the anonymous session
//! token, the logical origin/region labels, the event severity and reason,
//! and the post-event flags. Never add network addresses, device identifiers,
//! or any other personal data here.
//!
//! Delivery is best-effort. Failures are returned as [`AuditError`] and the
//! guard logs and drops them. The log is never rotated by this crate.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::guard::state::SecurityState;

/// Default audit log file, relative to the working directory.
pub const DEFAULT_AUDIT_LOG: &str = "tcds_security_audit.log";

/// Errors from appending to the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The log file could not be opened or written.
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be encoded.
    #[error("audit record encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writer lock was poisoned.
    #[error("audit lock poisoned")]
    Poisoned,
}

/// A single audit entry, one per registered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC time, ISO-8601 with a trailing `Z`.
    pub timestamp: String,
    /// Anonymous per-process session token.
    pub session_id: String,
    /// Logical origin label.
    pub origin: String,
    /// Logical region label.
    pub region: String,
    /// Normalised severity string.
    pub severity: String,
    /// Caller-supplied reason.
    pub reason: String,
    /// Alert flag after the event was processed.
    pub alert_flag: bool,
    /// Permanent lock flag after the event was processed.
    pub lock_permanent: bool,
}

impl AuditRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        session_id: &str,
        origin: &str,
        region: &str,
        severity: &str,
        reason: &str,
        state: &SecurityState,
    ) -> Self {
        Self {
            timestamp: format_timestamp(Utc::now()),
            session_id: session_id.to_owned(),
            origin: origin.to_owned(),
            region: region.to_owned(),
            severity: severity.to_owned(),
            reason: reason.to_owned(),
            alert_flag: state.alert_flag,
            lock_permanent: state.lock_permanent,
        }
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Destination for audit records.
pub trait AuditSink: Send {
    /// Append one record after all previously appended ones.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

enum Target {
    /// Reopened in append mode for every record.
    File(PathBuf),
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// JSON-lines audit log.
pub struct AuditLog {
    target: Target,
}

impl AuditLog {
    /// Audit log appending to the given file path.
    ///
    /// The file is created on first append, not here, so constructing a log
    /// in a read-only directory never fails.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
        }
    }

    /// Audit log over an arbitrary writer (for testing).
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            target: Target::Writer(Mutex::new(writer)),
        }
    }

    /// Backing file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path.as_path()),
            Target::Writer(_) => None,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_LOG)
    }
}

impl AuditSink for AuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        match &self.target {
            Target::File(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                writeln!(file, "{line}")?;
                file.flush()?;
            }
            Target::Writer(writer) => {
                let mut writer = writer.lock().map_err(|_| AuditError::Poisoned)?;
                writeln!(writer, "{line}")?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}

/// Read back a JSON-lines audit log. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a record.
pub fn read_records(path: &Path) -> Result<Vec<AuditRecord>, AuditError> {
    let contents = std::fs::read_to_string(path)?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AuditError::from))
        .collect()
}
