use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::CaptureError;

/// A scenario as reported by the test runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier, unique within a run
    pub id: String,

    /// Human readable scenario name
    pub name: String,

    /// Grouping the scenario belongs to (the "user story")
    pub category: String,

    /// Source location of the scenario
    pub path: String,
}

impl Scenario {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            path: path.into(),
        }
    }
}

/// A resolved screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Where the capture was stored
    pub path: PathBuf,
}

/// A screenshot capture that may still be in flight.
///
/// Captures are only awaited when the owning step is serialized.
pub struct PendingScreenshot(BoxFuture<'static, Result<Screenshot, CaptureError>>);

impl PendingScreenshot {
    /// Wrap an in-flight capture
    pub fn from_future<F>(capture: F) -> Self
    where
        F: Future<Output = Result<Screenshot, CaptureError>> + Send + 'static,
    {
        Self(capture.boxed())
    }

    /// A capture that has already been stored at `path`
    pub fn ready(path: impl Into<PathBuf>) -> Self {
        let screenshot = Screenshot { path: path.into() };
        Self(futures::future::ready(Ok(screenshot)).boxed())
    }

    /// A capture that is known to have failed
    pub fn failed(reason: impl Into<String>) -> Self {
        let err = CaptureError::new(reason);
        Self(futures::future::ready(Err(err)).boxed())
    }

    pub(crate) async fn resolve(self) -> Result<Screenshot, CaptureError> {
        self.0.await
    }
}

impl fmt::Debug for PendingScreenshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingScreenshot(..)")
    }
}

/// A step of a scenario, possibly carrying screenshot captures
#[derive(Debug)]
pub struct Step {
    pub name: String,
    pub screenshots: Vec<PendingScreenshot>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            screenshots: Vec::new(),
        }
    }

    /// Attach a screenshot capture
    pub fn with_screenshot(mut self, screenshot: PendingScreenshot) -> Self {
        self.screenshots.push(screenshot);
        self
    }
}

/// Result label of a finished scenario or step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    Pending,
    Ignored,
    Skipped,
    Compromised,
    Failure,
    Error,
    Success,
}

impl TestResult {
    /// Label used by the report viewer
    pub fn label(self) -> &'static str {
        match self {
            TestResult::Pending => "PENDING",
            TestResult::Ignored => "IGNORED",
            TestResult::Skipped => "SKIPPED",
            TestResult::Compromised => "COMPROMISED",
            TestResult::Failure => "FAILURE",
            TestResult::Error => "ERROR",
            TestResult::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error raised by the code under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error kind, e.g. "AssertionError"
    pub name: String,

    pub message: String,

    /// Raw stack trace text, if the runner captured one
    #[serde(default)]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Completion payload: the subject plus how it ended
#[derive(Debug)]
pub struct Outcome<T> {
    pub subject: T,
    pub result: TestResult,
    pub error: Option<ErrorInfo>,
}

impl<T> Outcome<T> {
    pub fn new(subject: T, result: TestResult) -> Self {
        Self {
            subject,
            result,
            error: None,
        }
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }
}

/// A test-execution domain event
#[derive(Debug)]
pub enum Event {
    ScenarioStarted {
        scenario: Scenario,
        timestamp: i64,
    },
    StepStarted {
        step: Step,
        timestamp: i64,
    },
    StepCompleted {
        outcome: Outcome<Step>,
        timestamp: i64,
    },
    ScenarioCompleted {
        outcome: Outcome<Scenario>,
        timestamp: i64,
    },
    /// An event kind this crate does not know about; folded as a no-op
    Unrecognized {
        kind: String,
        timestamp: i64,
    },
}

impl Event {
    /// Milliseconds since the epoch at which the event happened
    pub fn timestamp(&self) -> i64 {
        match self {
            Event::ScenarioStarted { timestamp, .. }
            | Event::StepStarted { timestamp, .. }
            | Event::StepCompleted { timestamp, .. }
            | Event::ScenarioCompleted { timestamp, .. }
            | Event::Unrecognized { timestamp, .. } => *timestamp,
        }
    }

    /// Name of the event kind, as it appears in event logs
    pub fn kind(&self) -> &str {
        match self {
            Event::ScenarioStarted { .. } => "ScenarioStarted",
            Event::StepStarted { .. } => "StepStarted",
            Event::StepCompleted { .. } => "StepCompleted",
            Event::ScenarioCompleted { .. } => "ScenarioCompleted",
            Event::Unrecognized { kind, .. } => kind,
        }
    }
}
