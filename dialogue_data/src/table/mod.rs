//! Row-keyed tables of dialogue rows.
//!
//! Dialogue nodes only ever hold a [`RowKey`]. Everything that resolves a key
//! into a [`DialogueRow`] goes through the [`RowLookup`] trait, so hosts can
//! plug in their own storage.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

use crate::row::{DialogueRow, DialogueRowData, RowId};

/// Address of a row: table name plus row name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey {
    pub table: String,
    pub row: String,
}

impl RowKey {
    pub fn new(table: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row: row.into(),
        }
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.row)
    }
}

/// Anything that can turn a [`RowKey`] into a row.
pub trait RowLookup {
    /// Find a row by key.
    fn find_row(&self, key: &RowKey) -> Option<&DialogueRow>;

    /// Names of all rows in `table`. Empty if the table is unknown.
    fn row_names(&self, table: &str) -> Vec<&str>;
}

/// Errors that can occur when loading tables.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TableError {
    /// The .toml source could not be parsed.
    #[error("error parsing table '{table}': {source}")]
    Toml {
        table: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate row '{row}' in table '{table}'")]
    DuplicateRow { table: String, row: String },
    #[error("row '{row}' in table '{table}' has no data")]
    EmptyRow { table: String, row: String },
}

/// A named in-memory table of rows, ordered by row name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueTable {
    pub name: String,
    rows: BTreeMap<String, DialogueRow>,
}

#[derive(Debug, Deserialize)]
struct ParsedTable {
    #[serde(default, rename = "row")]
    rows: Vec<ParsedRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParsedRow {
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    participant: String,
    #[serde(default)]
    ui_row_id: i32,
    #[serde(default)]
    data: Vec<DialogueRowData>,
    #[serde(default)]
    extra: HashMap<String, serde_json::Value>,
}

impl DialogueTable {
    /// Create a new empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Parse a table from its TOML representation.
    ///
    /// Row IDs are derived from the table and row names, so the same source
    /// always produces the same IDs.
    pub fn from_toml_str(name: impl Into<String>, source: &str) -> Result<Self, TableError> {
        let name = name.into();
        let parsed: ParsedTable = toml::from_str(source).map_err(|source| TableError::Toml {
            table: name.clone(),
            source,
        })?;

        let mut table = Self::new(name);
        for row in parsed.rows {
            if row.data.is_empty() {
                return Err(TableError::EmptyRow {
                    table: table.name.clone(),
                    row: row.name,
                });
            }

            let dialogue_row = DialogueRow {
                id: RowId::from_name(&table.name, &row.name),
                title: row.title.unwrap_or_else(|| row.name.clone()),
                participant: row.participant,
                row_data: row.data,
                ui_row_id: row.ui_row_id,
                extra_data: row.extra,
            };
            table.insert_row(row.name, dialogue_row)?;
        }

        debug!("Loaded table '{}' with {} rows", table.name, table.len());
        Ok(table)
    }

    /// Insert a row under `name`. Names must be unique within the table.
    pub fn insert_row(&mut self, name: impl Into<String>, row: DialogueRow) -> Result<(), TableError> {
        let name = name.into();
        if self.rows.contains_key(&name) {
            return Err(TableError::DuplicateRow {
                table: self.name.clone(),
                row: name,
            });
        }
        self.rows.insert(name, row);
        Ok(())
    }

    /// Get a row by name.
    pub fn row(&self, name: &str) -> Option<&DialogueRow> {
        self.rows.get(name)
    }

    /// Iterate over rows in name order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &DialogueRow)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowLookup for DialogueTable {
    fn find_row(&self, key: &RowKey) -> Option<&DialogueRow> {
        if key.table != self.name {
            return None;
        }
        self.row(&key.row)
    }

    fn row_names(&self, table: &str) -> Vec<&str> {
        if table != self.name {
            return Vec::new();
        }
        self.rows.keys().map(String::as_str).collect()
    }
}

/// A set of tables addressed by name.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, DialogueTable>,
}

impl TableRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any table with the same name.
    ///
    /// Returns the replaced table.
    pub fn add_table(&mut self, table: DialogueTable) -> Option<DialogueTable> {
        let replaced = self.tables.insert(table.name.clone(), table);
        if let Some(old) = &replaced {
            warn!("Replacing already registered table '{}'", old.name);
        }
        replaced
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&DialogueTable> {
        self.tables.get(name)
    }

    /// Get the total number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl RowLookup for TableRegistry {
    fn find_row(&self, key: &RowKey) -> Option<&DialogueRow> {
        self.tables.get(&key.table)?.row(&key.row)
    }

    fn row_names(&self, table: &str) -> Vec<&str> {
        self.tables
            .get(table)
            .map(|t| t.row_names(table))
            .unwrap_or_default()
    }
}
