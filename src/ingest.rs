//! Event log parsing.
//!
//! An event log is either JSON Lines (one record per line) or a single JSON
//! array of records. Every record names its kind in `type` and carries a
//! millisecond `timestamp`:
//!
//! ```json
//! {"type": "ScenarioStarted", "timestamp": 0, "scenario": {"id": "s1", "name": "Login", "category": "Auth", "path": "auth.feature"}}
//! {"type": "StepStarted", "timestamp": 1, "step": {"name": "enter creds", "screenshots": ["shots/1.png"]}}
//! {"type": "StepCompleted", "timestamp": 5, "outcome": {"subject": {"name": "enter creds"}, "result": "SUCCESS"}}
//! {"type": "ScenarioCompleted", "timestamp": 6, "outcome": {"subject": {"id": "s1", "name": "Login", "category": "Auth", "path": "auth.feature"}, "result": "SUCCESS"}}
//! ```
//!
//! Screenshots in a log are already stored, so they become ready captures.
//! Records of any other `type` are kept as [`Event::Unrecognized`].

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{ErrorInfo, Event, Outcome, PendingScreenshot, Scenario, Step, TestResult};
use crate::error::{LogPosition, ReportError, ReportResult};

const KNOWN_KINDS: [&str; 4] = ["ScenarioStarted", "StepStarted", "StepCompleted", "ScenarioCompleted"];

#[derive(Debug, Deserialize)]
struct RecordHeader {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Record {
    ScenarioStarted {
        timestamp: i64,
        scenario: Scenario,
    },
    StepStarted {
        timestamp: i64,
        step: StepRecord,
    },
    StepCompleted {
        timestamp: i64,
        outcome: OutcomeRecord<StepRecord>,
    },
    ScenarioCompleted {
        timestamp: i64,
        outcome: OutcomeRecord<Scenario>,
    },
}

#[derive(Debug, Deserialize)]
struct StepRecord {
    name: String,
    #[serde(default)]
    screenshots: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct OutcomeRecord<T> {
    subject: T,
    result: TestResult,
    #[serde(default)]
    error: Option<ErrorInfo>,
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        Step {
            name: record.name,
            screenshots: record.screenshots.into_iter().map(PendingScreenshot::ready).collect(),
        }
    }
}

impl<T, U: From<T>> From<OutcomeRecord<T>> for Outcome<U> {
    fn from(record: OutcomeRecord<T>) -> Self {
        Outcome {
            subject: record.subject.into(),
            result: record.result,
            error: record.error,
        }
    }
}

impl From<Record> for Event {
    fn from(record: Record) -> Self {
        match record {
            Record::ScenarioStarted { timestamp, scenario } => Event::ScenarioStarted { scenario, timestamp },
            Record::StepStarted { timestamp, step } => Event::StepStarted {
                step: step.into(),
                timestamp,
            },
            Record::StepCompleted { timestamp, outcome } => Event::StepCompleted {
                outcome: outcome.into(),
                timestamp,
            },
            Record::ScenarioCompleted { timestamp, outcome } => Event::ScenarioCompleted {
                outcome: outcome.into(),
                timestamp,
            },
        }
    }
}

/// Parse an event log held in memory
pub fn parse_events(text: &str) -> ReportResult<Vec<Event>> {
    if text.trim_start().starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(text).map_err(|e| ReportError::Ingest {
            at: LogPosition::Line(e.line()),
            details: e.to_string(),
        })?;
        return records
            .into_iter()
            .enumerate()
            .map(|(i, record)| parse_record(record, LogPosition::Record(i + 1)))
            .collect();
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let at = LogPosition::Line(i + 1);
            let record: Value = serde_json::from_str(line).map_err(|e| ReportError::Ingest {
                at,
                details: e.to_string(),
            })?;
            parse_record(record, at)
        })
        .collect()
}

/// Read and parse an event log file
pub async fn read_events(path: impl AsRef<Path>) -> ReportResult<Vec<Event>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReportError::io(path, e))?;
    let events = parse_events(&text)?;
    debug!(path = %path.display(), events = events.len(), "read event log");
    Ok(events)
}

fn parse_record(record: Value, at: LogPosition) -> ReportResult<Event> {
    let ingest_error = |e: serde_json::Error| ReportError::Ingest {
        at,
        details: e.to_string(),
    };

    let header: RecordHeader = serde_json::from_value(record.clone()).map_err(ingest_error)?;
    if !KNOWN_KINDS.contains(&header.kind.as_str()) {
        return Ok(Event::Unrecognized {
            kind: header.kind,
            timestamp: header.timestamp,
        });
    }

    let record: Record = serde_json::from_value(record).map_err(ingest_error)?;
    Ok(record.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"
{"type": "ScenarioStarted", "timestamp": 0, "scenario": {"id": "s1", "name": "Login", "category": "Auth", "path": "auth.feature"}}
{"type": "StepStarted", "timestamp": 1, "step": {"name": "enter creds", "screenshots": ["shots/1.png"]}}

{"type": "StepCompleted", "timestamp": 5, "outcome": {"subject": {"name": "enter creds", "screenshots": ["shots/2.png"]}, "result": "FAILURE", "error": {"name": "AssertionError", "message": "expected true"}}}
{"type": "TestRunFinished", "timestamp": 6}
"#;

    #[test]
    fn test_parse_json_lines() {
        let events = parse_events(LOG).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind().to_string()).collect();
        assert_eq!(kinds, vec!["ScenarioStarted", "StepStarted", "StepCompleted", "TestRunFinished"]);

        match &events[2] {
            Event::StepCompleted { outcome, timestamp } => {
                assert_eq!(*timestamp, 5);
                assert_eq!(outcome.result, TestResult::Failure);
                assert_eq!(outcome.subject.screenshots.len(), 1);
                assert_eq!(outcome.error.as_ref().unwrap().message, "expected true");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_array() {
        let text = r#"[{"type": "StepStarted", "timestamp": 3, "step": {"name": "click"}}]"#;
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp(), 3);
    }

    #[test]
    fn test_bad_record_reports_line() {
        let text = "{\"type\": \"StepStarted\", \"timestamp\": 1, \"step\": {\"name\": \"a\"}}\n{\"type\": \"StepStarted\", \"timestamp\": 2}";
        match parse_events(text) {
            Err(ReportError::Ingest { at, .. }) => assert_eq!(at, LogPosition::Line(2)),
            other => panic!("expected ingest error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let err = parse_events("\n{not json").unwrap_err();
        assert!(matches!(err, ReportError::Ingest { at: LogPosition::Line(2), .. }));
    }

    #[test]
    fn test_bad_array_element_reports_record() {
        let text = "[\n{\"type\": \"StepStarted\", \"timestamp\": 1, \"step\": {\"name\": \"a\"}},\n{\"type\": \"StepStarted\", \"timestamp\": 2}\n]";
        let err = parse_events(text).unwrap_err();
        assert!(matches!(err, ReportError::Ingest { at: LogPosition::Record(2), .. }));
    }

    #[test]
    fn test_unparsable_array_reports_line() {
        let err = parse_events("[\n{\"type\": \"StepStarted\"},\n{oops}\n]").unwrap_err();
        assert!(matches!(err, ReportError::Ingest { at: LogPosition::Line(3), .. }));
    }
}
