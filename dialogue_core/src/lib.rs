//! # Dialogue Core
//!
//! Runtime for branching conversations. Conversations are graphs of typed
//! nodes; dialogue nodes point at rows in `dialogue_data` tables.
//!
//! ## Core Components
//!
//! - **graph**: Nodes, edges, connection rules, eligibility conditions and the TOML loader
//! - **context**: The recyclable per-session [`DialogueContext`]
//! - **session**: The traversal engine that walks a graph and keeps the context current
//!
//! ## Design Philosophy
//!
//! - **Passive context**: The context is a plain record; only the session mutates it
//! - **Opaque storage**: Rows are resolved through [`dialogue_data::RowLookup`]
//! - **UI at arm's length**: Presentation layers implement [`DialogueWidget`] and read the context

pub mod context;
pub mod graph;
pub mod session;

pub use context::*;
pub use graph::*;
pub use session::*;
