//! Dialogue Session - walks a graph and keeps a [`DialogueContext`] current.
//!
//! A session moves through the graph like this:
//! 1. **Start**: Enter the start node and advance to its first eligible child
//! 2. **Play**: Show the active row's sub-entries one by one
//! 3. **Branch**: Auto-start the next node, or offer the eligible children as options
//! 4. **Select**: Enter the option picked by the player, then continue at 2
//! 5. **Finish**: Complete nodes, dead ends and explicit calls close the dialogue

mod config;
mod widget;

pub use config::*;
pub use widget::*;

use dialogue_data::{Blackboard, DialogueRow, RowKey, RowLookup};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::DialogueContext;
use crate::graph::{ConditionScope, DialogueGraph, DialogueNode, NodeId, NodeKind};

/// Where a session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotStarted,
    /// A row is on screen; the host reports when each sub-entry is done.
    PlayingRow,
    /// Options are on screen; waiting for the player.
    AwaitingSelection,
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::PlayingRow => "playing a row",
            SessionState::AwaitingSelection => "awaiting a selection",
            SessionState::Finished => "finished",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while driving a session.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("graph '{0}' has no start node")]
    MissingStartNode(String),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node '{node}' has no valid dialogue row")]
    MissingRow { node: String, key: Option<RowKey> },
    #[error("return node '{0}' has no target")]
    MissingTarget(String),
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("node {0} is not one of the current options")]
    InvalidSelection(NodeId),
    #[error("option {index} is out of range ({count} options)")]
    InvalidOptionIndex { index: usize, count: usize },
    #[error("more than {0} automatic steps without player input")]
    AutoStepLimit(usize),
}

/// Where a chain of automatic hops stops.
struct Landing<'a> {
    node: &'a DialogueNode,
    children: Vec<NodeId>,
    /// Set for Lead and Answer nodes; `None` ends the dialogue.
    row: Option<&'a DialogueRow>,
    /// Every node entered, the landing node last.
    path: Vec<NodeId>,
}

/// One run through a dialogue graph.
///
/// Borrows the graph and the row lookup, owns the blackboard for its
/// duration and recycles a single [`DialogueContext`].
pub struct DialogueSession<'a, L: RowLookup + ?Sized> {
    graph: &'a DialogueGraph,
    rows: &'a L,
    blackboard: Blackboard,
    context: DialogueContext,
    visits: HashMap<NodeId, u32>,
    config: TraversalConfig,
    state: SessionState,
    widgets: Vec<Box<dyn DialogueWidget + 'a>>,
}

impl<'a, L: RowLookup + ?Sized> DialogueSession<'a, L> {
    /// Create a session. Nothing happens until [`start`](Self::start).
    pub fn new(
        graph: &'a DialogueGraph,
        rows: &'a L,
        blackboard: Blackboard,
        config: TraversalConfig,
    ) -> Self {
        Self {
            graph,
            rows,
            blackboard,
            context: DialogueContext::new(),
            visits: HashMap::new(),
            config,
            state: SessionState::NotStarted,
            widgets: Vec::new(),
        }
    }

    /// Register a widget to be refreshed on every context change.
    pub fn add_widget(&mut self, widget: Box<dyn DialogueWidget + 'a>) {
        self.widgets.push(widget);
    }

    /// Open the dialogue and enter the start node.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_state("start", SessionState::NotStarted)?;
        let start = self
            .graph
            .start_node()
            .ok_or_else(|| SessionError::MissingStartNode(self.graph.name.clone()))?;

        info!("Starting dialogue '{}'", self.graph.name);
        self.enter(start, &[WidgetCommand::CreateDialogueWidget])
    }

    /// Report that the current sub-entry has been displayed long enough.
    ///
    /// Moves to the next sub-entry, or branches once the row is exhausted.
    pub fn row_data_finished(&mut self) -> Result<(), SessionError> {
        self.expect_state("finish row data", SessionState::PlayingRow)?;

        let next_index = self.context.active_dialogue_row_data_index() + 1;
        if next_index < self.context.active_dialogue_row().data_count() {
            self.context.update_active_dialogue_row_data_index(next_index);
            self.refresh(WidgetCommand::UpdateDialogueRow);
            return Ok(());
        }

        let graph = self.graph;
        let Some(&first) = self.context.children_nodes().first() else {
            debug!("Dead end reached, finishing dialogue");
            self.refresh(WidgetCommand::HideDialogueRow);
            self.finish();
            return Ok(());
        };

        if graph.node(first).is_some_and(|n| n.auto_starts) {
            self.enter(first, &[WidgetCommand::HideDialogueRow])
        } else {
            self.refresh(WidgetCommand::HideDialogueRow);
            self.state = SessionState::AwaitingSelection;
            self.refresh(WidgetCommand::AddDialogueOptions);
            Ok(())
        }
    }

    /// Pick one of the offered options.
    pub fn select_node(&mut self, node: NodeId) -> Result<(), SessionError> {
        self.expect_state("select an option", SessionState::AwaitingSelection)?;
        if !self.context.children_nodes().contains(&node) {
            return Err(SessionError::InvalidSelection(node));
        }

        self.enter(node, &[WidgetCommand::RemoveDialogueOptions])
    }

    /// Pick one of the offered options by position.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.expect_state("select an option", SessionState::AwaitingSelection)?;
        let options = self.context.children_nodes();
        let node = options
            .get(index)
            .copied()
            .ok_or(SessionError::InvalidOptionIndex {
                index,
                count: options.len(),
            })?;
        self.select_node(node)
    }

    /// End the dialogue. Calling it again does nothing.
    ///
    /// A session that never started has no widget to close.
    pub fn finish(&mut self) {
        if self.state == SessionState::Finished {
            return;
        }

        info!("Finishing dialogue '{}'", self.graph.name);
        // Entering a node sets the context, even when the chain ends at once
        let opened = self.state != SessionState::NotStarted || self.context.is_valid();
        self.state = SessionState::Finished;
        if opened && self.config.close_on_finish {
            self.refresh(WidgetCommand::CloseDialogueWidget);
        }
        self.context.reset();
    }

    pub fn context(&self) -> &DialogueContext {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Mutable access to flags, e.g. for effects triggered by the host.
    /// Eligibility is re-evaluated the next time a node is entered.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// End the session and hand the blackboard back.
    pub fn into_blackboard(self) -> Blackboard {
        self.blackboard
    }

    /// How many times `node` was entered in this session.
    pub fn visits(&self, node: NodeId) -> u32 {
        self.visits.get(&node).copied().unwrap_or(0)
    }

    /// The currently offered nodes, in graph order.
    pub fn options(&self) -> Vec<&'a DialogueNode> {
        let graph = self.graph;
        self.context
            .children_nodes()
            .iter()
            .filter_map(|id| graph.node(*id))
            .collect()
    }

    /// Rows of the currently offered nodes, for option lists.
    pub fn option_rows(&self) -> Vec<(NodeId, &'a DialogueRow)> {
        let rows = self.rows;
        self.options()
            .into_iter()
            .filter_map(|node| {
                let row = rows.find_row(node.row.as_ref()?)?;
                Some((node.id, row))
            })
            .collect()
    }

    /// Seconds the active sub-entry should stay on screen.
    pub fn current_row_duration(&self) -> Option<f32> {
        self.context
            .active_row_data()
            .map(|data| data.effective_duration(self.config.chars_per_second))
    }

    /// Enter `id`, following automatic hops until the session needs input.
    ///
    /// The whole chain is resolved before anything changes, so an error
    /// leaves the session, its visit counts and its widgets untouched.
    /// `before` is sent to widgets once the chain is known to be valid.
    fn enter(&mut self, id: NodeId, before: &[WidgetCommand]) -> Result<(), SessionError> {
        let landing = self.resolve(id)?;

        for command in before {
            self.refresh(*command);
        }
        for entered in &landing.path {
            *self.visits.entry(*entered).or_default() += 1;
        }
        debug!(
            "Entering {} after {} automatic hop(s), {} eligible children",
            landing.node.description(),
            landing.path.len() - 1,
            landing.children.len()
        );

        self.context.set_dialogue_context(landing.node.id, landing.children);
        match landing.row {
            Some(row) => {
                self.context.update_active_dialogue_row(row.clone());
                self.context.update_active_dialogue_row_data_index(0);
                self.state = SessionState::PlayingRow;
                self.refresh(WidgetCommand::ShowDialogueRow);
            }
            None => {
                if landing.node.kind == NodeKind::Start {
                    warn!("Start node of '{}' has no eligible children", self.graph.name);
                }
                self.finish();
            }
        }
        Ok(())
    }

    /// Follow automatic hops from `id` without touching session state.
    ///
    /// At most `max_auto_steps` hops are taken past `id` itself.
    fn resolve(&self, mut id: NodeId) -> Result<Landing<'a>, SessionError> {
        let graph = self.graph;
        let rows = self.rows;
        let mut path = Vec::new();

        for _ in 0..=self.config.max_auto_steps {
            let node = graph.node(id).ok_or(SessionError::UnknownNode(id))?;
            path.push(id);

            match node.kind {
                NodeKind::Start => {
                    let children = self.eligible_children(node, &path);
                    match children.first().copied() {
                        Some(next) => id = next,
                        None => {
                            return Ok(Landing {
                                node,
                                children,
                                row: None,
                                path,
                            })
                        }
                    }
                }
                NodeKind::Lead | NodeKind::Answer => {
                    let row = node
                        .row
                        .as_ref()
                        .and_then(|key| rows.find_row(key))
                        .filter(|row| row.is_valid())
                        .ok_or_else(|| SessionError::MissingRow {
                            node: node.name.clone(),
                            key: node.row.clone(),
                        })?;
                    let children = self.eligible_children(node, &path);
                    return Ok(Landing {
                        node,
                        children,
                        row: Some(row),
                        path,
                    });
                }
                NodeKind::Complete => {
                    let children = self.eligible_children(node, &path);
                    return Ok(Landing {
                        node,
                        children,
                        row: None,
                        path,
                    });
                }
                NodeKind::Return => {
                    id = node
                        .target
                        .ok_or_else(|| SessionError::MissingTarget(node.name.clone()))?;
                }
            }
        }

        warn!(
            "Dialogue '{}' exceeded {} automatic steps",
            graph.name, self.config.max_auto_steps
        );
        Err(SessionError::AutoStepLimit(self.config.max_auto_steps))
    }

    /// Children of `node` whose conditions currently hold, in graph order.
    ///
    /// `pending` holds nodes entered by the chain being resolved; they
    /// count as visited.
    fn eligible_children(&self, node: &DialogueNode, pending: &[NodeId]) -> Vec<NodeId> {
        node.children
            .iter()
            .copied()
            .filter(|child| match self.graph.node(*child) {
                Some(child_node) => {
                    let pending_visits = pending.iter().filter(|id| *id == child).count() as u32;
                    child_node.is_eligible(&ConditionScope {
                        blackboard: &self.blackboard,
                        visits: self.visits(*child) + pending_visits,
                    })
                }
                None => {
                    warn!("{} links to unknown node {}", node.description(), child);
                    false
                }
            })
            .collect()
    }

    fn expect_state(&self, operation: &'static str, expected: SessionState) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn refresh(&mut self, command: WidgetCommand) {
        debug!("Refreshing {} widget(s): {}", self.widgets.len(), command);
        for widget in &mut self.widgets {
            widget.refresh_dialogue_widget(&self.context, command);
        }
    }
}
