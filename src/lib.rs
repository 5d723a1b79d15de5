//! Serenity Scribe - Serenity JSON reports from BDD test-runner events.
//!
//! This crate provides:
//! - Folding of a flat scenario/step event stream into per-scenario report trees
//! - Asynchronous serialization that awaits pending screenshot captures
//! - Stack trace extraction for failure causes
//! - Event log parsing and a report writer
//!
//! # Example
//!
//! ```rust,no_run
//! use serenity_scribe::{Event, Outcome, Scenario, SerenityReporter, Step, TestResult};
//!
//! # async fn run() -> serenity_scribe::ReportResult<()> {
//! let scenario = Scenario::new("s1", "Login", "Auth", "features/auth.feature");
//! let events = vec![
//!     Event::ScenarioStarted { scenario: scenario.clone(), timestamp: 0 },
//!     Event::StepStarted { step: Step::new("enter creds"), timestamp: 1 },
//!     Event::StepCompleted { outcome: Outcome::new(Step::new("enter creds"), TestResult::Success), timestamp: 5 },
//!     Event::ScenarioCompleted { outcome: Outcome::new(scenario, TestResult::Success), timestamp: 6 },
//! ];
//!
//! let reports = SerenityReporter::new().report_on(events).await?;
//! assert_eq!(reports[0]["duration"], 6);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod report;
pub mod scribe;

// Re-export domain types
pub use domain::{ErrorInfo, Event, Outcome, PendingScreenshot, Scenario, Screenshot, Step, TestResult};

// Re-export errors
pub use error::{CaptureError, LogPosition, ReportError, ReportResult};

// Re-export the reporter and report tree
pub use report::{
    RenderedReport, ReportBuilder, ScenarioReport, SerenityReporter, StackFrameExtractor, StackTraceParser,
    StepReport,
};

// Re-export ingest and writer
pub use ingest::{parse_events, read_events};
pub use scribe::{Scribe, report_file_name};
