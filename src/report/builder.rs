//! Folds a flat stream of test-execution events into per-scenario report trees.
//!
//! The builder keeps a stack of open nodes. Every started event pushes a node,
//! every step completion pops one, and scenarios are looked up by id when they
//! complete. A scenario completing does not touch the stack: if steps of that
//! scenario are still open they simply stay incomplete in the report.
//!
//! Malformed sequences are handled in one of two ways. In lenient mode (the
//! default) offending events are logged and skipped and the rest of the report
//! is still produced. In strict mode the fold stops with
//! [`ReportError::MalformedEvents`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::serialize::{ScenarioReport, detach};
use super::stack::{StackFrameExtractor, StackTraceParser};
use super::tree::{NodeId, NodeKind, ReportArena};
use crate::config::Config;
use crate::domain::{Event, Outcome, Scenario, Step};
use crate::error::{ReportError, ReportResult};

/// Fold state for one batch of events
#[derive(Debug, Default)]
pub struct ReportBuilder {
    arena: ReportArena,
    /// Scenario roots in the order they were first started
    scenarios: Vec<NodeId>,
    /// Scenario id -> position in `scenarios`
    index: HashMap<String, usize>,
    /// Open nodes; the last one is the cursor
    open: Vec<NodeId>,
    strict: bool,
    folded: usize,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on malformed sequences instead of skipping the offending events
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The most recently opened node that is not yet closed
    pub fn cursor(&self) -> Option<NodeId> {
        self.open.last().copied()
    }

    pub fn arena(&self) -> &ReportArena {
        &self.arena
    }

    /// Scenario root registered under `id`
    pub fn scenario(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).map(|&pos| self.scenarios[pos])
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Apply one event
    pub fn fold(&mut self, event: Event) -> ReportResult<()> {
        let index = self.folded;
        self.folded += 1;
        debug!(index, kind = event.kind(), timestamp = event.timestamp(), "folding event");

        match event {
            Event::ScenarioStarted { scenario, timestamp } => {
                self.scenario_started(scenario, timestamp);
                Ok(())
            }
            Event::StepStarted { step, timestamp } => self.step_started(index, step, timestamp),
            Event::StepCompleted { outcome, timestamp } => self.step_completed(index, outcome, timestamp),
            Event::ScenarioCompleted { outcome, timestamp } => {
                self.scenario_completed(index, outcome, timestamp)
            }
            Event::Unrecognized { kind, .. } => {
                debug!(index, kind = %kind, "ignoring unrecognized event");
                Ok(())
            }
        }
    }

    /// Hand over the scenario trees, in first-start order
    pub fn finish(self, extractor: &dyn StackFrameExtractor) -> Vec<ScenarioReport> {
        if !self.open.is_empty() {
            debug!(open = self.open.len(), "event stream ended with open nodes");
        }
        detach(self.arena, &self.scenarios, extractor)
    }

    fn scenario_started(&mut self, scenario: Scenario, timestamp: i64) {
        let id = scenario.id.clone();
        let node = self.arena.add_scenario(scenario, timestamp);

        match self.index.get(&id) {
            Some(&pos) => {
                warn!(scenario = %id, "scenario started twice; keeping the latest run");
                self.scenarios[pos] = node;
            }
            None => {
                self.index.insert(id, self.scenarios.len());
                self.scenarios.push(node);
            }
        }

        self.open.clear();
        self.open.push(node);
    }

    fn step_started(&mut self, index: usize, step: Step, timestamp: i64) -> ReportResult<()> {
        let Some(parent) = self.cursor() else {
            return self.reject(index, format!("step '{}' started outside of any scenario", step.name));
        };

        let node = self.arena.add_step(parent, step.name, step.screenshots, timestamp);
        self.open.push(node);
        Ok(())
    }

    fn step_completed(&mut self, index: usize, mut outcome: Outcome<Step>, timestamp: i64) -> ReportResult<()> {
        let Some(cursor) = self.cursor() else {
            return self.reject(
                index,
                format!("step '{}' completed but no step is open", outcome.subject.name),
            );
        };
        if self.arena.get(cursor).is_scenario() {
            return self.reject(
                index,
                format!("step '{}' completed while only its scenario is open", outcome.subject.name),
            );
        }

        let late_screenshots = std::mem::take(&mut outcome.subject.screenshots);
        let node = self.arena.get_mut(cursor);
        node.complete(&outcome, timestamp);
        if let NodeKind::Step { screenshots, .. } = &mut node.kind {
            screenshots.extend(late_screenshots);
        }

        self.open.pop();
        Ok(())
    }

    fn scenario_completed(
        &mut self,
        index: usize,
        outcome: Outcome<Scenario>,
        timestamp: i64,
    ) -> ReportResult<()> {
        let Some(node) = self.scenario(&outcome.subject.id) else {
            return self.reject(
                index,
                format!("scenario '{}' completed but never started", outcome.subject.id),
            );
        };

        let open_steps = self
            .open
            .iter()
            .filter(|&&id| !self.arena.get(id).is_scenario())
            .count();
        if open_steps > 0 {
            if self.strict {
                return Err(ReportError::malformed(
                    index,
                    format!(
                        "scenario '{}' completed with {} step(s) still open",
                        outcome.subject.id, open_steps
                    ),
                ));
            }
            warn!(
                index,
                scenario = %outcome.subject.id,
                open_steps,
                "scenario completed with open steps; they stay incomplete"
            );
        }

        self.arena.get_mut(node).complete(&outcome, timestamp);
        Ok(())
    }

    fn reject(&self, index: usize, details: String) -> ReportResult<()> {
        if self.strict {
            return Err(ReportError::malformed(index, details));
        }
        warn!(index, "skipping malformed event: {}", details);
        Ok(())
    }
}

/// A serialized scenario report together with the id of its scenario
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub scenario_id: String,
    pub value: Value,
}

/// Turns event sequences into Serenity JSON reports
#[derive(Clone)]
pub struct SerenityReporter {
    strict: bool,
    extractor: Arc<dyn StackFrameExtractor>,
}

impl Default for SerenityReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SerenityReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityReporter")
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl SerenityReporter {
    /// Lenient reporter using the default stack trace parser
    pub fn new() -> Self {
        Self {
            strict: false,
            extractor: Arc::new(StackTraceParser),
        }
    }

    /// Reporter configured from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new().strict(config.report.strict)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_extractor(mut self, extractor: impl StackFrameExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Fold `events` into report trees without serializing them
    pub fn build<I>(&self, events: I) -> ReportResult<Vec<ScenarioReport>>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut builder = ReportBuilder::new().strict(self.strict);
        for event in events {
            builder.fold(event)?;
        }
        Ok(builder.finish(self.extractor.as_ref()))
    }

    /// Build and serialize one report per started scenario, in start order.
    ///
    /// A failing screenshot capture fails the whole batch.
    pub async fn report_on<I>(&self, events: I) -> ReportResult<Vec<Value>>
    where
        I: IntoIterator<Item = Event>,
    {
        let rendered = self.render(events).await?;
        Ok(rendered.into_iter().map(|report| report.value).collect())
    }

    /// Like [`report_on`](Self::report_on), keeping each report's scenario id
    pub async fn render<I>(&self, events: I) -> ReportResult<Vec<RenderedReport>>
    where
        I: IntoIterator<Item = Event>,
    {
        let scenarios = self.build(events)?;
        debug!(scenarios = scenarios.len(), "serializing reports");

        try_join_all(scenarios.into_iter().map(|report| async move {
            let scenario_id = report.id().to_string();
            let value = report.to_serialized().await?;
            Ok::<_, ReportError>(RenderedReport { scenario_id, value })
        }))
        .await
    }
}
