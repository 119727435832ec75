//! Node definitions - vertices of the dialogue graph.

use dialogue_data::{RowKey, RowLookup};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Condition, ConditionScope};

/// Unique identifier for nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a stable node ID from the graph and node names.
    pub fn from_name(graph: &str, node: &str) -> Self {
        let key = format!("{graph}/{node}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of nodes in a dialogue graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point. Advances on its own.
    Start,
    /// A line spoken by a non-player participant.
    Lead,
    /// An option the player can pick.
    Answer,
    /// Ends the dialogue.
    Complete,
    /// Jumps to another node of the same graph.
    Return,
}

impl NodeKind {
    /// Parent kinds a node of this kind may be connected from.
    pub fn allowed_input_kinds(&self) -> &'static [NodeKind] {
        use NodeKind::*;
        match self {
            Start => &[],
            Lead | Answer => &[Start, Lead, Answer],
            Complete => &[Start, Lead, Answer],
            Return => &[Lead, Answer],
        }
    }

    /// Whether nodes of this kind may have outgoing edges.
    pub fn can_have_children(&self) -> bool {
        !matches!(self, NodeKind::Complete | NodeKind::Return)
    }

    /// Lead and Answer nodes carry dialogue rows.
    pub fn is_dialogue(&self) -> bool {
        matches!(self, NodeKind::Lead | NodeKind::Answer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Lead => "lead",
            NodeKind::Answer => "answer",
            NodeKind::Complete => "complete",
            NodeKind::Return => "return",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an edge between two nodes is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejection {
    #[error("{0} nodes cannot have children")]
    TerminalParent(NodeKind),
    #[error("{child} nodes do not accept input from {parent} nodes")]
    InputNotAllowed { parent: NodeKind, child: NodeKind },
    #[error("a node cannot connect to itself")]
    SelfConnection,
    #[error("nodes are already connected")]
    AlreadyConnected,
}

/// A single step of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: NodeId,
    /// Author-facing name, unique within a graph.
    pub name: String,
    pub kind: NodeKind,
    /// Row displayed while this node is active. Only used by dialogue nodes.
    pub row: Option<RowKey>,
    /// Whether the node is entered without player input once its parent
    /// finishes.
    pub auto_starts: bool,
    /// All must hold for the node to be offered.
    pub conditions: Vec<Condition>,
    /// Jump target of Return nodes.
    pub target: Option<NodeId>,
    /// Outgoing edges, in authoring order.
    pub children: Vec<NodeId>,
}

impl DialogueNode {
    /// Create a node of the given kind with a random ID.
    ///
    /// Answer nodes wait for a selection by default, other kinds auto-start.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            kind,
            row: None,
            auto_starts: kind != NodeKind::Answer,
            conditions: Vec::new(),
            target: None,
            children: Vec::new(),
        }
    }

    pub fn start(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Start)
    }

    pub fn lead(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Lead)
    }

    pub fn answer(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Answer)
    }

    pub fn complete(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Complete)
    }

    /// Create a Return node jumping to `target`.
    pub fn return_to(name: impl Into<String>, target: NodeId) -> Self {
        let mut node = Self::new(name, NodeKind::Return);
        node.target = Some(target);
        node
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_row(mut self, table: impl Into<String>, row: impl Into<String>) -> Self {
        self.row = Some(RowKey::new(table, row));
        self
    }

    pub fn with_auto_start(mut self, auto_starts: bool) -> Self {
        self.auto_starts = auto_starts;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_dialogue_node(&self) -> bool {
        self.kind.is_dialogue()
    }

    /// Human-readable summary for tooling and logs.
    pub fn description(&self) -> String {
        match &self.row {
            Some(row) if self.is_dialogue_node() => {
                format!("{} node '{}' showing {}", self.kind, self.name, row)
            }
            _ => format!("{} node '{}'", self.kind, self.name),
        }
    }

    /// Parent kinds this node may be connected from.
    pub fn allowed_input_kinds(&self) -> &'static [NodeKind] {
        self.kind.allowed_input_kinds()
    }

    /// Check whether an edge `parent -> self` is allowed.
    pub fn accepts_input_from(&self, parent: &DialogueNode) -> Result<(), ConnectionRejection> {
        if parent.id == self.id {
            return Err(ConnectionRejection::SelfConnection);
        }
        if !parent.kind.can_have_children() {
            return Err(ConnectionRejection::TerminalParent(parent.kind));
        }
        if !self.allowed_input_kinds().contains(&parent.kind) {
            return Err(ConnectionRejection::InputNotAllowed {
                parent: parent.kind,
                child: self.kind,
            });
        }
        if parent.children.contains(&self.id) {
            return Err(ConnectionRejection::AlreadyConnected);
        }
        Ok(())
    }

    /// Whether all of this node's conditions hold.
    pub fn is_eligible(&self, scope: &ConditionScope<'_>) -> bool {
        self.conditions.iter().all(|c| c.evaluate(scope))
    }

    /// Authoring problems with this node. Empty when the node is fine.
    pub fn validate(&self, rows: &dyn RowLookup) -> Vec<String> {
        let mut messages = Vec::new();

        if self.is_dialogue_node() {
            match &self.row {
                None => messages.push(format!("{} has no dialogue row", self.description())),
                Some(key) => match rows.find_row(key) {
                    None => messages.push(format!(
                        "{} node '{}' references missing row {}",
                        self.kind, self.name, key
                    )),
                    Some(row) if !row.is_valid() => messages.push(format!(
                        "{} node '{}' references invalid row {}",
                        self.kind, self.name, key
                    )),
                    Some(_) => {}
                },
            }
        }

        if self.kind == NodeKind::Return && self.target.is_none() {
            messages.push(format!("{} has no target", self.description()));
        }
        if self.kind != NodeKind::Return && self.target.is_some() {
            messages.push(format!("{} has a target but is not a return node", self.description()));
        }

        if self.kind.can_have_children() && self.children.is_empty() {
            messages.push(format!("{} has no children", self.description()));
        }

        messages
    }

    /// Texts of the node's row, for authoring previews.
    pub fn preview(&self, rows: &dyn RowLookup) -> Vec<String> {
        self.row
            .as_ref()
            .and_then(|key| rows.find_row(key))
            .map(|row| row.texts().into_iter().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}
