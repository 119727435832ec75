//! # Dialogue Data
//!
//! The data side of the dialogue runtime: display rows, the row-keyed tables
//! that hold them, and the blackboard of flags that dialogue conditions read.
//! This crate knows nothing about graphs or traversal.

pub mod blackboard;
pub mod row;
pub mod table;

pub use blackboard::*;
pub use row::*;
pub use table::*;
