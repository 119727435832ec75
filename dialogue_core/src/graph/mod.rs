//! Dialogue Graph - the authored structure of a conversation.
//!
//! The graph consists of:
//! - **Nodes**: Start, Lead, Answer, Complete and Return steps
//! - **Edges**: Ordered parent -> child links, checked against connection rules
//! - **Conditions**: Per-node eligibility checks evaluated during traversal

mod condition;
mod loader;
mod node;

pub use condition::*;
pub use node::*;

use dialogue_data::RowLookup;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or loading a graph.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GraphError {
    /// The .toml source could not be parsed.
    #[error("error parsing graph: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown node '{0}'")]
    UnknownNodeName(String),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("duplicate node name '{0}'")]
    DuplicateName(String),
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    #[error("graph already has a start node")]
    DuplicateStartNode,
    #[error("node '{0}' names a row but no table")]
    MissingTable(String),
    #[error("{kind} node '{node}' cannot have a {field}")]
    UnexpectedField {
        node: String,
        kind: NodeKind,
        field: &'static str,
    },
    #[error("cannot connect {from} -> {to}: {reason}")]
    ConnectionRejected {
        from: NodeId,
        to: NodeId,
        reason: ConnectionRejection,
    },
}

/// A problem found by [`DialogueGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Offending node; `None` for graph-level problems.
    pub node: Option<NodeId>,
    pub message: String,
}

/// A conversation graph.
///
/// Nodes are stored by ID; insertion order is kept so iteration and
/// validation output are deterministic.
///
/// Serialized as a node list. Deserializing rebuilds the graph through
/// [`add_node`](Self::add_node) and [`connect`](Self::connect), so the
/// same rules apply as when building it by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphRecord", try_from = "GraphRecord")]
pub struct DialogueGraph {
    pub name: String,
    nodes: HashMap<NodeId, DialogueNode>,
    order: Vec<NodeId>,
    start: Option<NodeId>,
}

/// Serialized form of [`DialogueGraph`].
#[derive(Debug, Serialize, Deserialize)]
struct GraphRecord {
    name: String,
    #[serde(default)]
    nodes: Vec<DialogueNode>,
}

impl From<DialogueGraph> for GraphRecord {
    fn from(mut graph: DialogueGraph) -> Self {
        let nodes = graph
            .order
            .iter()
            .filter_map(|id| graph.nodes.remove(id))
            .collect();
        Self {
            name: graph.name,
            nodes,
        }
    }
}

impl TryFrom<GraphRecord> for DialogueGraph {
    type Error = GraphError;

    fn try_from(record: GraphRecord) -> Result<Self, Self::Error> {
        let mut graph = DialogueGraph::new(record.name);
        let mut edges = Vec::new();

        for mut node in record.nodes {
            edges.extend(node.children.drain(..).map(|child| (node.id, child)));
            graph.add_node(node)?;
        }
        for (from, to) in edges {
            graph.connect(from, to)?;
        }

        Ok(graph)
    }
}

impl DialogueGraph {
    /// Create a new empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a node to the graph.
    ///
    /// Names must be unique and there can be only one Start node.
    /// Edges are added afterwards with [`connect`](Self::connect).
    pub fn add_node(&mut self, node: DialogueNode) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if self.find_by_name(&node.name).is_some() {
            return Err(GraphError::DuplicateName(node.name));
        }
        if node.kind == NodeKind::Start {
            if self.start.is_some() {
                return Err(GraphError::DuplicateStartNode);
            }
            self.start = Some(node.id);
        }

        let id = node.id;
        self.order.push(id);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Add an edge `from -> to` after checking the connection rules.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let parent = self.nodes.get(&from).ok_or(GraphError::UnknownNode(from))?;
        let child = self.nodes.get(&to).ok_or(GraphError::UnknownNode(to))?;

        child
            .accepts_input_from(parent)
            .map_err(|reason| GraphError::ConnectionRejected { from, to, reason })?;

        if let Some(parent) = self.nodes.get_mut(&from) {
            parent.children.push(to);
        }
        Ok(())
    }

    /// Remove the edge `from -> to`. Returns whether it existed.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.nodes.get_mut(&from) {
            Some(parent) => {
                let before = parent.children.len();
                parent.children.retain(|c| *c != to);
                parent.children.len() != before
            }
            None => false,
        }
    }

    /// Get node by ID.
    pub fn node(&self, id: NodeId) -> Option<&DialogueNode> {
        self.nodes.get(&id)
    }

    /// Get mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut DialogueNode> {
        self.nodes.get_mut(&id)
    }

    /// Find a node by its authored name.
    pub fn find_by_name(&self, name: &str) -> Option<&DialogueNode> {
        self.nodes().find(|n| n.name == name)
    }

    /// Children of a node in edge order. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn start_node(&self) -> Option<NodeId> {
        self.start
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DialogueNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Get the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Collect authoring problems across the whole graph.
    pub fn validate(&self, rows: &dyn RowLookup) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();

        if self.start.is_none() {
            messages.push(ValidationMessage {
                node: None,
                message: format!("graph '{}' has no start node", self.name),
            });
        }

        for node in self.nodes() {
            messages.extend(node.validate(rows).into_iter().map(|message| ValidationMessage {
                node: Some(node.id),
                message,
            }));

            if let Some(target) = node.target {
                if !self.nodes.contains_key(&target) {
                    messages.push(ValidationMessage {
                        node: Some(node.id),
                        message: format!("{} targets a node outside the graph", node.description()),
                    });
                }
            }
        }

        if let Some(start) = self.start {
            let reachable = self.reachable_from(start);
            for node in self.nodes().filter(|n| !reachable.contains(&n.id)) {
                messages.push(ValidationMessage {
                    node: Some(node.id),
                    message: format!("{} is unreachable from the start node", node.description()),
                });
            }
        }

        debug!(
            "Validated graph '{}': {} problem(s)",
            self.name,
            messages.len()
        );
        messages
    }

    /// Breadth-first walk over edges and Return targets.
    fn reachable_from(&self, start: NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                queue.extend(node.children.iter().copied());
                if node.kind == NodeKind::Return {
                    queue.extend(node.target);
                }
            }
        }

        seen
    }
}
