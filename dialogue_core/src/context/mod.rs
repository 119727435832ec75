//! Dialogue Context - live state of one dialogue session.
//!
//! One context is created per session and recycled for the session's whole
//! duration. It is a passive record: the session computes which nodes are
//! eligible and which row to show, then writes the results here. Presentation
//! layers only read it.

use dialogue_data::{DialogueRow, DialogueRowData};
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// Tracks the active node, its eligible children and the displayed row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DialogueContext {
    /// Node currently presented. Might be absent.
    active_node: Option<NodeId>,

    /// Nodes reachable from the active node, already filtered to those that
    /// can be entered. Might be empty.
    allowed_child_nodes: Vec<NodeId>,

    /// Row of the active node. Might be invalid.
    active_dialogue_row: DialogueRow,

    /// Index into the active row's sub-entries.
    active_dialogue_row_data_index: usize,
}

impl DialogueContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the context points at a node.
    pub fn is_valid(&self) -> bool {
        self.active_node.is_some()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    /// Eligible children of the active node, in graph order.
    pub fn children_nodes(&self) -> &[NodeId] {
        &self.allowed_child_nodes
    }

    pub fn active_dialogue_row(&self) -> &DialogueRow {
        &self.active_dialogue_row
    }

    pub fn active_dialogue_row_data_index(&self) -> usize {
        self.active_dialogue_row_data_index
    }

    /// The sub-entry currently displayed, if the row is valid and the index
    /// is in range.
    pub fn active_row_data(&self) -> Option<&DialogueRowData> {
        if !self.active_dialogue_row.is_valid() {
            return None;
        }
        self.active_dialogue_row
            .data(self.active_dialogue_row_data_index)
    }

    /// Replace the active node and its children together.
    ///
    /// The caller guarantees `new_allowed_child_nodes` are children of
    /// `new_active_node`; nothing is checked here.
    pub fn set_dialogue_context(
        &mut self,
        new_active_node: impl Into<Option<NodeId>>,
        new_allowed_child_nodes: Vec<NodeId>,
    ) {
        self.active_node = new_active_node.into();
        self.allowed_child_nodes = new_allowed_child_nodes;
    }

    /// Replace only the active node. Children are left as they are.
    pub fn update_active_dialogue_node(&mut self, new_active_node: impl Into<Option<NodeId>>) {
        self.active_node = new_active_node.into();
    }

    pub fn update_active_dialogue_row(&mut self, new_active_row: DialogueRow) {
        self.active_dialogue_row = new_active_row;
    }

    /// Replace the sub-entry index. Not checked against the row's length.
    pub fn update_active_dialogue_row_data_index(&mut self, new_index: usize) {
        self.active_dialogue_row_data_index = new_index;
    }

    /// Recycle the context to its empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
