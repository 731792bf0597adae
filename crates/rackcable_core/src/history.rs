// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history for cable edits.
//!
//! Actions refer to cables by their engine cable ID and endpoints, never by
//! connection object, so they stay valid after a connection is destroyed
//! and recreated. All actions from one drag gesture are collected in a
//! [`ComplexAction`] and collapsed before being pushed.

use crate::cable::CableId;
use crate::color::CableColor;
use crate::connection::CableConnection;
use crate::endpoint::{ModuleId, PortEndpoint};
use crate::settings::DEFAULT_HISTORY_DEPTH;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// History errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// A complete cable as it was when an action was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableSnapshot {
    /// Engine cable ID
    pub cable_id: CableId,
    /// Output endpoint
    pub output: PortEndpoint,
    /// Input endpoint
    pub input: PortEndpoint,
    /// Display color
    pub color: CableColor,
}

impl CableSnapshot {
    /// Capture a complete connection. `None` if it has no engine cable.
    pub fn of(connection: &CableConnection) -> Option<Self> {
        Some(Self {
            cable_id: connection.cable()?,
            output: connection.output()?,
            input: connection.input()?,
            color: connection.color,
        })
    }

    /// Same cable: same ID and same endpoints. Color is not compared.
    pub fn is_cable(&self, other: &CableSnapshot) -> bool {
        self.cable_id == other.cable_id && self.output == other.output && self.input == other.input
    }
}

/// One reversible cable edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CableAction {
    /// A cable was connected
    Add(CableSnapshot),
    /// A cable was disconnected
    Remove(CableSnapshot),
    /// A cable changed color
    ColorChange {
        /// Engine cable ID
        cable_id: CableId,
        /// Color before
        old: CableColor,
        /// Color after
        new: CableColor,
    },
}

impl CableAction {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add cable",
            Self::Remove(_) => "remove cable",
            Self::ColorChange { .. } => "change cable color",
        }
    }

    /// Engine cable ID the action refers to
    pub fn cable_id(&self) -> CableId {
        match self {
            Self::Add(snapshot) | Self::Remove(snapshot) => snapshot.cable_id,
            Self::ColorChange { cable_id, .. } => *cable_id,
        }
    }

    /// Whether the action names an endpoint on `module`
    pub fn touches_module(&self, module: ModuleId) -> bool {
        match self {
            Self::Add(snapshot) | Self::Remove(snapshot) => {
                snapshot.output.module == module || snapshot.input.module == module
            }
            Self::ColorChange { .. } => false,
        }
    }

    /// The action that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            Self::Add(snapshot) => Self::Remove(snapshot.clone()),
            Self::Remove(snapshot) => Self::Add(snapshot.clone()),
            Self::ColorChange { cable_id, old, new } => Self::ColorChange {
                cable_id: *cable_id,
                old: *new,
                new: *old,
            },
        }
    }
}

/// Actions undone and redone together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexAction {
    /// Human-readable name
    pub name: String,
    /// Actions in the order they happened
    pub actions: Vec<CableAction>,
}

impl ComplexAction {
    /// Create an empty batch
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Record an action
    pub fn push(&mut self, action: CableAction) {
        self.actions.push(action);
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of recorded actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Record that `snapshot` was connected, unless the same cable was
    /// disconnected earlier in this batch. In that case the two cancel out
    /// and the earlier removal is dropped. Returns whether they cancelled.
    pub fn record_add(&mut self, snapshot: CableSnapshot) -> bool {
        let earlier = self
            .actions
            .iter()
            .position(|action| matches!(action, CableAction::Remove(removed) if removed.is_cable(&snapshot)));
        match earlier {
            Some(index) => {
                self.actions.remove(index);
                true
            }
            None => {
                self.push(CableAction::Add(snapshot));
                false
            }
        }
    }

    /// Collapse for the undo stack: nothing when empty, the bare action
    /// when there is exactly one, the whole batch otherwise.
    pub fn finalize(mut self) -> Option<HistoryAction> {
        match self.actions.len() {
            0 => None,
            1 => self.actions.pop().map(HistoryAction::Cable),
            _ => Some(HistoryAction::Complex(self)),
        }
    }
}

/// An entry on the undo stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    /// A single edit
    Cable(CableAction),
    /// A batch of edits
    Complex(ComplexAction),
}

impl HistoryAction {
    /// Human-readable name
    pub fn name(&self) -> &str {
        match self {
            Self::Cable(action) => action.name(),
            Self::Complex(batch) => &batch.name,
        }
    }

    /// The edits in this entry, in the order they happened
    pub fn actions(&self) -> &[CableAction] {
        match self {
            Self::Cable(action) => std::slice::from_ref(action),
            Self::Complex(batch) => &batch.actions,
        }
    }

    /// Edits that undo this entry, in application order
    pub fn undo_steps(&self) -> Vec<CableAction> {
        match self {
            Self::Cable(action) => vec![action.inverse()],
            Self::Complex(batch) => batch.actions.iter().rev().map(CableAction::inverse).collect(),
        }
    }

    /// Edits that redo this entry, in application order
    pub fn redo_steps(&self) -> Vec<CableAction> {
        match self {
            Self::Cable(action) => vec![action.clone()],
            Self::Complex(batch) => batch.actions.clone(),
        }
    }
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Undo stack
    undo_stack: VecDeque<HistoryAction>,
    /// Redo stack
    redo_stack: VecDeque<HistoryAction>,
    /// Maximum history depth
    max_depth: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push an action. Clears the redo stack.
    pub fn push(&mut self, action: HistoryAction) {
        tracing::debug!("History push: {}", action.name());
        self.redo_stack.clear();
        self.undo_stack.push_back(action);

        // Enforce history limit
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Pop the last action for undoing
    pub fn undo(&mut self) -> Result<HistoryAction> {
        let action = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push_back(action.clone());
        Ok(action)
    }

    /// Pop the last undone action for redoing
    pub fn redo(&mut self) -> Result<HistoryAction> {
        let action = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        self.undo_stack.push_back(action.clone());
        Ok(action)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The entry the next undo would revert
    pub fn peek_undo(&self) -> Option<&HistoryAction> {
        self.undo_stack.back()
    }

    /// The entry the next redo would reapply
    pub fn peek_redo(&self) -> Option<&HistoryAction> {
        self.redo_stack.back()
    }

    /// Drop every entry that refers to a cable which ever had an end on
    /// `module`. Returns how many entries were dropped.
    pub fn forget_module(&mut self, module: ModuleId) -> usize {
        let cables: HashSet<CableId> = self
            .undo_stack
            .iter()
            .chain(&self.redo_stack)
            .flat_map(HistoryAction::actions)
            .filter(|action| action.touches_module(module))
            .map(CableAction::cable_id)
            .collect();
        if cables.is_empty() {
            return 0;
        }

        let before = self.undo_stack.len() + self.redo_stack.len();
        let keep = |entry: &HistoryAction| !entry.actions().iter().any(|a| cables.contains(&a.cable_id()));
        self.undo_stack.retain(keep);
        self.redo_stack.retain(keep);
        before - (self.undo_stack.len() + self.redo_stack.len())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(HistoryAction::name)
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(HistoryAction::name)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ModuleId;

    fn snapshot(id: i64) -> CableSnapshot {
        CableSnapshot {
            cable_id: CableId(id),
            output: PortEndpoint::output(ModuleId(1), 0),
            input: PortEndpoint::input(ModuleId(2), 0),
            color: CableColor::WHITE,
        }
    }

    #[test]
    fn test_finalize_collapses() {
        assert_eq!(ComplexAction::new("move cable").finalize(), None);

        let mut single = ComplexAction::new("move cable");
        single.push(CableAction::Remove(snapshot(1)));
        assert_eq!(
            single.finalize(),
            Some(HistoryAction::Cable(CableAction::Remove(snapshot(1))))
        );

        let mut batch = ComplexAction::new("move cable");
        batch.push(CableAction::Remove(snapshot(1)));
        batch.push(CableAction::Remove(snapshot(2)));
        assert!(matches!(batch.finalize(), Some(HistoryAction::Complex(b)) if b.len() == 2));
    }

    #[test]
    fn test_add_cancels_matching_remove() {
        let mut batch = ComplexAction::new("move cable");
        batch.push(CableAction::Remove(snapshot(1)));

        let mut recolored = snapshot(1);
        recolored.color = CableColor::rgb(1, 2, 3);
        assert!(batch.record_add(recolored));
        assert!(batch.is_empty());

        batch.push(CableAction::Remove(snapshot(1)));
        let mut moved = snapshot(1);
        moved.input = PortEndpoint::input(ModuleId(3), 0);
        assert!(!batch.record_add(moved));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_undo_steps_reverse_batches() {
        let mut batch = ComplexAction::new("move cable");
        batch.push(CableAction::Remove(snapshot(1)));
        batch.push(CableAction::Add(snapshot(2)));
        let action = HistoryAction::Complex(batch);

        assert_eq!(
            action.undo_steps(),
            vec![CableAction::Remove(snapshot(2)), CableAction::Add(snapshot(1))]
        );
        assert_eq!(
            action.redo_steps(),
            vec![CableAction::Remove(snapshot(1)), CableAction::Add(snapshot(2))]
        );
    }

    #[test]
    fn test_color_change_inverse() {
        let action = CableAction::ColorChange {
            cable_id: CableId(1),
            old: CableColor::WHITE,
            new: CableColor::rgb(0, 0, 0),
        };
        assert_eq!(
            action.inverse(),
            CableAction::ColorChange {
                cable_id: CableId(1),
                old: CableColor::rgb(0, 0, 0),
                new: CableColor::WHITE,
            }
        );
    }

    #[test]
    fn test_forget_module_drops_entries_naming_its_cables() {
        let mut history = History::new();
        history.push(HistoryAction::Cable(CableAction::Add(snapshot(1))));
        history.push(HistoryAction::Cable(CableAction::ColorChange {
            cable_id: CableId(1),
            old: CableColor::WHITE,
            new: CableColor::rgb(0, 0, 0),
        }));
        let mut elsewhere = snapshot(2);
        elsewhere.input = PortEndpoint::input(ModuleId(3), 0);
        history.push(HistoryAction::Cable(CableAction::Add(elsewhere.clone())));

        assert_eq!(history.forget_module(ModuleId(2)), 2);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(
            history.peek_undo(),
            Some(&HistoryAction::Cable(CableAction::Add(elsewhere)))
        );
        assert_eq!(history.forget_module(ModuleId(9)), 0);
    }

    #[test]
    fn test_undo_redo_stacks() {
        let mut history = History::with_max_depth(2);
        assert_eq!(history.undo(), Err(HistoryError::NothingToUndo));

        history.push(HistoryAction::Cable(CableAction::Add(snapshot(1))));
        history.push(HistoryAction::Cable(CableAction::Add(snapshot(2))));
        history.push(HistoryAction::Cable(CableAction::Add(snapshot(3))));
        assert_eq!(history.undo_depth(), 2);

        let undone = history.undo().unwrap();
        assert_eq!(undone, HistoryAction::Cable(CableAction::Add(snapshot(3))));
        assert!(history.can_redo());
        assert_eq!(history.redo_description(), Some("add cable"));

        history.redo().unwrap();
        assert!(!history.can_redo());

        history.undo().unwrap();
        history.push(HistoryAction::Cable(CableAction::Remove(snapshot(2))));
        assert!(!history.can_redo());
        assert_eq!(history.redo(), Err(HistoryError::NothingToRedo));
    }
}
