pub mod types;

pub use types::{ErrorInfo, Event, Outcome, PendingScreenshot, Scenario, Screenshot, Step, TestResult};
