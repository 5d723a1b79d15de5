//! Arena of report nodes built up while folding events.
//!
//! Nodes refer to each other by [`NodeId`]. The arena owns every node; the
//! parent index only serves navigation.

use crate::domain::{ErrorInfo, Outcome, PendingScreenshot, Scenario, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub finished_at: i64,
    pub duration: i64,
    pub result: TestResult,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug)]
pub enum NodeKind {
    Scenario(Scenario),
    Step {
        name: String,
        screenshots: Vec<PendingScreenshot>,
    },
}

#[derive(Debug)]
pub struct ReportNode {
    pub started_at: i64,
    pub completion: Option<Completion>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl ReportNode {
    fn new(kind: NodeKind, started_at: i64) -> Self {
        Self {
            started_at,
            completion: None,
            children: Vec::new(),
            parent: None,
            kind,
        }
    }

    pub fn is_scenario(&self) -> bool {
        matches!(self.kind, NodeKind::Scenario(_))
    }

    /// Record how the node ended. Only one completion is expected per node.
    pub fn complete<T>(&mut self, outcome: &Outcome<T>, finished_at: i64) {
        self.completion = Some(Completion {
            finished_at,
            duration: finished_at - self.started_at,
            result: outcome.result,
            error: outcome.error.clone(),
        });
    }
}

#[derive(Debug, Default)]
pub struct ReportArena {
    nodes: Vec<ReportNode>,
}

impl ReportArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a root scenario node
    pub fn add_scenario(&mut self, scenario: Scenario, started_at: i64) -> NodeId {
        self.push(ReportNode::new(NodeKind::Scenario(scenario), started_at))
    }

    /// Add a step node as the last child of `parent`
    pub fn add_step(
        &mut self,
        parent: NodeId,
        name: String,
        screenshots: Vec<PendingScreenshot>,
        started_at: i64,
    ) -> NodeId {
        let mut node = ReportNode::new(NodeKind::Step { name, screenshots }, started_at);
        node.parent = Some(parent);
        let id = self.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> &ReportNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut ReportNode {
        &mut self.nodes[id.0]
    }

    /// Hand the arena's nodes over by value, indexed by `NodeId`
    pub(crate) fn into_slots(self) -> Vec<Option<ReportNode>> {
        self.nodes.into_iter().map(Some).collect()
    }

    fn push(&mut self, node: ReportNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}
