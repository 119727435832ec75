//! Blackboard - flags shared between dialogue sessions and the host game.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flag value types for the blackboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FlagValue {
    /// `false`, `0`, `0.0` and `""` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Int(i) => *i != 0,
            FlagValue::Float(f) => *f != 0.0,
            FlagValue::String(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_owned())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

/// Global flags and variables that dialogue conditions read.
///
/// Owned by the host; a session borrows it for its duration and hands it back
/// when it ends.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Blackboard {
    flags: HashMap<String, FlagValue>,
}

impl Blackboard {
    /// Create a new empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, returning the previous value.
    pub fn set_flag(&mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Option<FlagValue> {
        self.flags.insert(key.into(), value.into())
    }

    /// Get flag by key.
    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.get(key)
    }

    /// Check if a flag exists and is truthy.
    pub fn is_set(&self, key: &str) -> bool {
        self.flag(key).is_some_and(FlagValue::is_truthy)
    }

    pub fn remove_flag(&mut self, key: &str) -> Option<FlagValue> {
        self.flags.remove(key)
    }

    /// Add `by` to an integer flag and return the new value.
    ///
    /// Missing or non-integer flags start from zero. The result saturates
    /// at the bounds of `i64`.
    pub fn increment(&mut self, key: impl Into<String>, by: i64) -> i64 {
        let entry = self.flags.entry(key.into()).or_insert(FlagValue::Int(0));
        let next = match entry {
            FlagValue::Int(current) => current.saturating_add(by),
            _ => by,
        };
        *entry = FlagValue::Int(next);
        next
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
