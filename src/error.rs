//! Error types for report building, ingest and writing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Failure reported by a screenshot capture future
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("screenshot capture failed: {reason}")]
pub struct CaptureError {
    pub reason: String,
}

impl CaptureError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Where in an event log a bad record sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPosition {
    /// 1-based line of a JSON Lines log, or of a JSON array log that does not parse
    Line(usize),
    /// 1-based element of a JSON array log
    Record(usize),
}

impl fmt::Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogPosition::Line(line) => write!(f, "line {line}"),
            LogPosition::Record(index) => write!(f, "record #{index}"),
        }
    }
}

/// Error types for report operations
#[derive(Debug, Error)]
pub enum ReportError {
    /// A pending screenshot of a step failed to resolve
    #[error("screenshot for step '{step}' failed: {source}")]
    Screenshot {
        step: String,
        #[source]
        source: CaptureError,
    },

    /// The event sequence is not well formed (strict mode only)
    #[error("malformed event sequence at event #{index}: {details}")]
    MalformedEvents { index: usize, details: String },

    /// An event log record could not be parsed
    #[error("event log {at}: {details}")]
    Ingest { at: LogPosition, details: String },

    /// I/O error
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(index: usize, details: impl Into<String>) -> Self {
        Self::MalformedEvents {
            index,
            details: details.into(),
        }
    }
}
