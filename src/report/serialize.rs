//! Owned report tree and its asynchronous serialization.
//!
//! Once folding is done the arena is split into owned [`ScenarioReport`] and
//! [`StepReport`] trees. Serializing a step awaits its pending screenshots and
//! its children together; sibling order is always the order the steps started.

use futures::FutureExt;
use futures::future::{BoxFuture, try_join, try_join_all};
use serde_json::Value;
use tracing::debug;

use super::schema::{FailureCause, ScenarioPayload, ScreenshotEntry, StepPayload, UserStory, dashify};
use super::stack::{StackFrameExtractor, frames_of};
use super::tree::{Completion, NodeId, NodeKind, ReportArena, ReportNode};
use crate::domain::{ErrorInfo, PendingScreenshot, Scenario};
use crate::error::{ReportError, ReportResult};

/// Finished (or abandoned) report of one scenario
#[derive(Debug)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub started_at: i64,
    pub completion: Option<Completion>,
    pub steps: Vec<StepReport>,
    failure: Option<FailureCause>,
}

#[derive(Debug)]
pub struct StepReport {
    pub name: String,
    pub started_at: i64,
    pub completion: Option<Completion>,
    pub screenshots: Vec<PendingScreenshot>,
    pub children: Vec<StepReport>,
    failure: Option<FailureCause>,
}

impl ScenarioReport {
    pub fn id(&self) -> &str {
        &self.scenario.id
    }

    /// Serialize to the Serenity scenario schema
    pub async fn to_serialized(self) -> ReportResult<Value> {
        debug!(scenario = %self.scenario.id, steps = self.steps.len(), "serializing scenario");

        let test_steps = try_join_all(self.steps.into_iter().map(StepReport::to_serialized)).await?;
        let scenario = self.scenario;

        let payload = ScenarioPayload {
            title: scenario.name.clone(),
            name: scenario.name,
            description: String::new(),
            tags: Vec::new(),
            start_time: self.started_at,
            manual: false,
            duration: self.completion.as_ref().map(|c| c.duration),
            result: self.completion.as_ref().map(|c| c.result),
            test_steps,
            user_story: UserStory {
                id: dashify(&scenario.category),
                story_name: scenario.category,
                path: scenario.path,
                kind: "feature".to_string(),
            },
            test_failure_cause: self.failure,
        };

        Ok(serde_json::to_value(payload)?)
    }
}

impl StepReport {
    /// Serialize to the Serenity step schema.
    ///
    /// Fails if any screenshot capture of this step or a nested step fails.
    pub fn to_serialized(self) -> BoxFuture<'static, ReportResult<Value>> {
        async move {
            let StepReport {
                name,
                started_at,
                completion,
                screenshots,
                children,
                failure,
            } = self;

            let resolved = try_join_all(screenshots.into_iter().map(|pending| {
                let step = name.clone();
                async move {
                    pending
                        .resolve()
                        .await
                        .map_err(|source| ReportError::Screenshot { step, source })
                }
            }));
            let nested = try_join_all(children.into_iter().map(StepReport::to_serialized));

            let (resolved, children) = try_join(resolved, nested).await?;

            let payload = StepPayload {
                description: name,
                start_time: started_at,
                duration: completion.as_ref().map(|c| c.duration),
                result: completion.as_ref().map(|c| c.result),
                children,
                exception: failure,
                screenshots: resolved
                    .into_iter()
                    .map(|shot| ScreenshotEntry {
                        screenshot: shot.path.display().to_string(),
                    })
                    .collect(),
            };

            Ok(serde_json::to_value(payload)?)
        }
        .boxed()
    }
}

/// Split the arena into owned scenario trees, one per root, in `roots` order
pub(crate) fn detach(
    arena: ReportArena,
    roots: &[NodeId],
    extractor: &dyn StackFrameExtractor,
) -> Vec<ScenarioReport> {
    let mut slots = arena.into_slots();
    roots
        .iter()
        .filter_map(|&root| {
            let node = slots[root.index()].take()?;
            let steps = detach_children(&mut slots, &node.children, extractor);
            let failure = failure_of(node.completion.as_ref(), extractor);
            match node.kind {
                NodeKind::Scenario(scenario) => Some(ScenarioReport {
                    scenario,
                    started_at: node.started_at,
                    completion: node.completion,
                    steps,
                    failure,
                }),
                NodeKind::Step { .. } => None,
            }
        })
        .collect()
}

fn detach_children(
    slots: &mut [Option<ReportNode>],
    children: &[NodeId],
    extractor: &dyn StackFrameExtractor,
) -> Vec<StepReport> {
    children
        .iter()
        .filter_map(|&child| {
            let node = slots[child.index()].take()?;
            let nested = detach_children(slots, &node.children, extractor);
            let failure = failure_of(node.completion.as_ref(), extractor);
            match node.kind {
                NodeKind::Step { name, screenshots } => Some(StepReport {
                    name,
                    started_at: node.started_at,
                    completion: node.completion,
                    screenshots,
                    children: nested,
                    failure,
                }),
                NodeKind::Scenario(_) => None,
            }
        })
        .collect()
}

fn failure_of(completion: Option<&Completion>, extractor: &dyn StackFrameExtractor) -> Option<FailureCause> {
    completion
        .and_then(|c| c.error.as_ref())
        .map(|error| failure_cause(error, extractor))
}

fn failure_cause(error: &ErrorInfo, extractor: &dyn StackFrameExtractor) -> FailureCause {
    FailureCause {
        error_type: error.name.clone(),
        message: error.message.clone(),
        stack_trace: frames_of(error, extractor),
    }
}
