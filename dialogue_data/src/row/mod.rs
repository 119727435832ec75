//! Dialogue rows - the displayable line records referenced by dialogue nodes.

mod data;

pub use data::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for dialogue rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub Uuid);

impl RowId {
    /// Create a new random row ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a row ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derive a stable row ID from a namespace (usually the table name) and
    /// the row name. The same pair always yields the same ID.
    pub fn from_name(namespace: &str, name: &str) -> Self {
        let key = format!("{namespace}/{name}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }

    /// Create a nil/empty row ID. Rows carrying it are never valid.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::nil()
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line of dialogue as shown to the player.
///
/// One row may hold several sub-entries ([`DialogueRowData`]) that are
/// displayed one after another. The default row is the invalid row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DialogueRow {
    pub id: RowId,
    /// Short title, mostly used for answer options.
    pub title: String,
    /// Name of the speaking participant.
    pub participant: String,
    pub row_data: Vec<DialogueRowData>,
    /// Lets the UI pick a layout for this row.
    pub ui_row_id: i32,

    // Host-specific data in a flexible map
    #[serde(default)]
    pub extra_data: HashMap<String, serde_json::Value>,
}

impl DialogueRow {
    /// Create a new row with a random ID and no sub-entries.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: RowId::new(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: RowId) -> Self {
        self.id = id;
        self
    }

    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = participant.into();
        self
    }

    /// Append a sub-entry.
    pub fn with_data(mut self, data: DialogueRowData) -> Self {
        self.row_data.push(data);
        self
    }

    pub fn with_ui_row_id(mut self, ui_row_id: i32) -> Self {
        self.ui_row_id = ui_row_id;
        self
    }

    /// A row is valid when it has an identity and at least one sub-entry.
    pub fn is_valid(&self) -> bool {
        !self.id.is_nil() && !self.row_data.is_empty()
    }

    /// Get the sub-entry at `index`, if any.
    pub fn data(&self, index: usize) -> Option<&DialogueRowData> {
        self.row_data.get(index)
    }

    /// Number of sub-entries in this row.
    pub fn data_count(&self) -> usize {
        self.row_data.len()
    }

    /// Texts of all sub-entries, in display order.
    pub fn texts(&self) -> Vec<&str> {
        self.row_data.iter().map(|d| d.text.as_str()).collect()
    }
}
