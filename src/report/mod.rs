pub mod builder;
pub mod schema;
pub mod serialize;
pub mod stack;
pub mod tree;

pub use builder::{RenderedReport, ReportBuilder, SerenityReporter};
pub use schema::dashify;
pub use serialize::{ScenarioReport, StepReport};
pub use stack::{RawFrame, StackFrameExtractor, StackTraceParser};
