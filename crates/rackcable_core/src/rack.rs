// SPDX-License-Identifier: MIT OR Apache-2.0
//! The rack: connections, their engine cables and their history.
//!
//! [`Rack`] owns everything the cable subsystem mutates. It is handed the
//! processing graph and settings at construction and is driven from a
//! single thread by the surrounding event loop.

use crate::cable::CableId;
use crate::color::{CableColor, CablePalette};
use crate::connection::{CableConnection, ConnectionId};
use crate::endpoint::{ModuleId, PortDirection, PortEndpoint};
use crate::engine::{Engine, EngineError, ProcessingGraph};
use crate::geometry::CanvasTransform;
use crate::gesture::PortController;
use crate::history::{CableAction, CableSnapshot, ComplexAction, History, HistoryAction, HistoryError};
use crate::registry::ConnectionRegistry;
use crate::settings::CableSettings;
use egui::Pos2;
use std::collections::HashMap;

/// Error raised by rack operations. Scoped to a single connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RackError {
    /// A referenced module or port does not exist
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(PortEndpoint),

    /// Connection not found
    #[error("Connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),

    /// No connection carries this cable ID
    #[error("Cable not found: {0}")]
    CableNotFound(CableId),

    /// Processing graph rejected a change
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// History error
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// A rack of modules and the cables between them
pub struct Rack<G: ProcessingGraph> {
    pub(crate) graph: G,
    pub(crate) cables: ConnectionRegistry,
    pub(crate) history: History,
    pub(crate) palette: CablePalette,
    pub(crate) settings: CableSettings,
    pub(crate) transform: CanvasTransform,
    /// Pointer position in rack space
    pub(crate) pointer: Pos2,
    /// Port under the pointer when not dragging
    pub(crate) hovered_port: Option<PortEndpoint>,
    /// Port centers in rack space, supplied by the module layout
    pub(crate) port_positions: HashMap<PortEndpoint, Pos2>,
    /// Gesture state per port
    pub(crate) controllers: HashMap<PortEndpoint, PortController>,
}

impl<G: ProcessingGraph> Rack<G> {
    /// Create a rack over a processing graph
    pub fn new(graph: G, settings: CableSettings) -> Self {
        Self {
            graph,
            cables: ConnectionRegistry::new(),
            history: History::with_max_depth(settings.history_depth),
            palette: settings.palette(),
            settings,
            transform: CanvasTransform::default(),
            pointer: Pos2::ZERO,
            hovered_port: None,
            port_positions: HashMap::new(),
            controllers: HashMap::new(),
        }
    }

    /// The processing graph
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Mutable processing graph
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// The connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.cables
    }

    /// A connection by ID
    pub fn connection(&self, id: ConnectionId) -> Option<&CableConnection> {
        self.cables.get(id)
    }

    /// The undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The color palette for new cables
    pub fn palette(&self) -> &CablePalette {
        &self.palette
    }

    /// Mutable color palette
    pub fn palette_mut(&mut self) -> &mut CablePalette {
        &mut self.palette
    }

    /// Active settings
    pub fn settings(&self) -> &CableSettings {
        &self.settings
    }

    /// Set the screen to rack transform
    pub fn set_transform(&mut self, transform: CanvasTransform) {
        self.transform = transform;
    }

    /// Screen to rack transform
    pub fn transform(&self) -> CanvasTransform {
        self.transform
    }

    /// Pointer position in rack space
    pub fn pointer(&self) -> Pos2 {
        self.pointer
    }

    /// Record where a port's center sits in rack space
    pub fn set_port_position(&mut self, endpoint: PortEndpoint, center: Pos2) {
        self.port_positions.insert(endpoint, center);
    }

    /// Center of a port in rack space
    pub fn port_position(&self, endpoint: &PortEndpoint) -> Option<Pos2> {
        self.port_positions.get(endpoint).copied()
    }

    /// Port under the pointer, outside of drags
    pub fn hovered_port(&self) -> Option<PortEndpoint> {
        self.hovered_port
    }

    /// The complete connection on top of a port's stack
    pub fn top_connection(&self, endpoint: &PortEndpoint) -> Option<ConnectionId> {
        self.cables.top_connection(endpoint)
    }

    /// Connect two ports directly and record it for undo
    pub fn connect(&mut self, output: PortEndpoint, input: PortEndpoint) -> Result<ConnectionId, RackError> {
        let color = self.palette.next_color();
        self.connect_with_color(output, input, color)
    }

    /// Connect two ports with a given color and record it for undo
    pub fn connect_with_color(
        &mut self,
        output: PortEndpoint,
        input: PortEndpoint,
        color: CableColor,
    ) -> Result<ConnectionId, RackError> {
        if output.direction != PortDirection::Output || input.direction != PortDirection::Input {
            return Err(EngineError::DirectionMismatch.into());
        }
        let mut connection = CableConnection::new(color);
        connection.set_endpoint(PortDirection::Output, Some(output));
        connection.set_endpoint(PortDirection::Input, Some(input));
        connection.update_cable(&mut self.graph)?;

        if let Some(snapshot) = CableSnapshot::of(&connection) {
            self.history.push(HistoryAction::Cable(CableAction::Add(snapshot)));
        }
        tracing::info!("Connected {} to {}", output, input);
        Ok(self.cables.add(connection))
    }

    /// Remove a connection and destroy its engine cable. Not recorded.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<CableConnection> {
        let mut connection = self.cables.remove(id)?;
        connection.disconnect(&mut self.graph);
        Some(connection)
    }

    /// Delete the top cable on a port and record it for undo
    pub fn delete_top_cable(&mut self, endpoint: &PortEndpoint) -> Option<ConnectionId> {
        let id = self.cables.top_connection(endpoint)?;
        if let Some(snapshot) = self.cables.get(id).and_then(CableSnapshot::of) {
            self.history.push(HistoryAction::Cable(CableAction::Remove(snapshot)));
        }
        self.remove_connection(id);
        tracing::info!("Deleted top cable on {}", endpoint);
        Some(id)
    }

    /// Recolor a connection, recording it for undo when it is complete
    pub fn set_cable_color(&mut self, id: ConnectionId, color: CableColor) -> Result<(), RackError> {
        let connection = self.cables.get_mut(id).ok_or(RackError::ConnectionNotFound(id))?;
        if connection.color == color {
            return Ok(());
        }
        if let Some(cable_id) = connection.cable() {
            self.history.push(HistoryAction::Cable(CableAction::ColorChange {
                cable_id,
                old: connection.color,
                new: color,
            }));
        }
        connection.color = color;
        Ok(())
    }

    /// Remove every connection touching a module and forget its ports.
    /// The module itself stays in the processing graph, so the removal is
    /// recorded as one history entry.
    pub fn clear_cables_on_module(&mut self, module: ModuleId) -> Vec<ConnectionId> {
        let mut batch = ComplexAction::new("clear cables");
        let removed = self.detach_module(module, &mut batch);
        if let Some(action) = batch.finalize() {
            self.history.push(action);
        }
        removed
    }

    /// Remove a module's connections top first, recording each complete one
    /// into `batch`, and drop all per-port state for the module
    fn detach_module(&mut self, module: ModuleId, batch: &mut ComplexAction) -> Vec<ConnectionId> {
        let removed = self.cables.connections_on_module(module);
        for id in removed.iter().rev() {
            if let Some(snapshot) = self.cables.get(*id).and_then(CableSnapshot::of) {
                batch.push(CableAction::Remove(snapshot));
            }
            self.remove_connection(*id);
        }

        let on_module = |e: &Option<PortEndpoint>| e.is_some_and(|e| e.module == module);
        let ids: Vec<ConnectionId> = self.cables.ids().collect();
        for id in ids {
            if let Some(connection) = self.cables.get_mut(id) {
                for direction in [PortDirection::Output, PortDirection::Input] {
                    if on_module(&connection.hovered(direction)) {
                        connection.set_hovered(direction, None);
                    }
                }
            }
        }
        if on_module(&self.hovered_port) {
            self.hovered_port = None;
        }
        self.port_positions.retain(|e, _| e.module != module);
        self.controllers.retain(|e, _| e.module != module);

        if !removed.is_empty() {
            tracing::info!("Removed {} cables from module {}", removed.len(), module);
        }
        removed
    }

    /// Undo the last history entry. On failure the rack and both stacks are
    /// left as they were.
    pub fn undo(&mut self) -> Result<(), RackError> {
        let action = self.history.peek_undo().ok_or(HistoryError::NothingToUndo)?;
        let steps = action.undo_steps();
        tracing::info!("Undo {}", action.name());
        self.apply_all(&steps)?;
        self.history.undo()?;
        Ok(())
    }

    /// Redo the last undone history entry. On failure the rack and both
    /// stacks are left as they were.
    pub fn redo(&mut self) -> Result<(), RackError> {
        let action = self.history.peek_redo().ok_or(HistoryError::NothingToRedo)?;
        let steps = action.redo_steps();
        tracing::info!("Redo {}", action.name());
        self.apply_all(&steps)?;
        self.history.redo()?;
        Ok(())
    }

    /// Apply edits in order. If one fails, the ones already applied are
    /// reverted before the error is returned.
    fn apply_all(&mut self, steps: &[CableAction]) -> Result<(), RackError> {
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = self.apply(step) {
                tracing::warn!("History step {} ({}) failed: {}", index, step.name(), e);
                for applied in steps[..index].iter().rev() {
                    if let Err(e) = self.apply(&applied.inverse()) {
                        tracing::error!("Could not revert {}: {}", applied.name(), e);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Apply one cable edit without recording it
    fn apply(&mut self, action: &CableAction) -> Result<(), RackError> {
        match action {
            CableAction::Add(snapshot) => {
                let mut connection = CableConnection::new(snapshot.color).with_cable_id(Some(snapshot.cable_id));
                connection.set_endpoint(PortDirection::Output, Some(snapshot.output));
                connection.set_endpoint(PortDirection::Input, Some(snapshot.input));
                connection.update_cable(&mut self.graph)?;
                self.cables.add(connection);
            }
            CableAction::Remove(snapshot) => {
                let id = self
                    .cables
                    .find_by_cable(snapshot.cable_id)
                    .ok_or(RackError::CableNotFound(snapshot.cable_id))?;
                self.remove_connection(id);
            }
            CableAction::ColorChange { cable_id, new, .. } => {
                let id = self
                    .cables
                    .find_by_cable(*cable_id)
                    .ok_or(RackError::CableNotFound(*cable_id))?;
                if let Some(connection) = self.cables.get_mut(id) {
                    connection.color = *new;
                }
            }
        }
        Ok(())
    }
}

impl Rack<Engine> {
    /// Remove a module from the rack and the engine. The module cannot
    /// come back, so history entries naming its cables are forgotten.
    pub fn remove_module(&mut self, module: ModuleId) -> Result<Vec<ConnectionId>, RackError> {
        if !self.graph.has_module(module) {
            return Err(EngineError::ModuleNotFound(module).into());
        }
        let removed = self.detach_module(module, &mut ComplexAction::new("remove module"));
        self.graph.remove_module(module)?;
        let forgotten = self.history.forget_module(module);
        if forgotten > 0 {
            tracing::debug!("Forgot {} history entries for module {}", forgotten, module);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack() -> Rack<Engine> {
        let mut engine = Engine::new();
        engine.add_module(ModuleId(1), 0, 2).unwrap();
        engine.add_module(ModuleId(2), 2, 0).unwrap();
        engine.add_module(ModuleId(3), 2, 0).unwrap();
        Rack::new(engine, CableSettings::default())
    }

    #[test]
    fn test_connect_records_add_and_undo_removes() {
        let mut rack = rack();
        let id = rack
            .connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();
        assert!(rack.connection(id).unwrap().cable().is_some());
        assert_eq!(rack.history().undo_depth(), 1);

        rack.undo().unwrap();
        assert!(rack.registry().is_empty());
        assert_eq!(rack.graph().cable_count(), 0);

        rack.redo().unwrap();
        assert_eq!(rack.registry().len(), 1);
        assert_eq!(rack.graph().cable_count(), 1);
    }

    #[test]
    fn test_duplicate_connect_is_rejected() {
        let mut rack = rack();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let inp = PortEndpoint::input(ModuleId(2), 0);
        rack.connect(out, inp).unwrap();
        assert!(matches!(
            rack.connect(out, inp),
            Err(RackError::Engine(EngineError::DuplicateCable { .. }))
        ));
        assert_eq!(rack.registry().len(), 1);
    }

    #[test]
    fn test_delete_top_cable_leaves_the_other_on_top() {
        let mut rack = rack();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let c1 = rack.connect(out, PortEndpoint::input(ModuleId(2), 0)).unwrap();
        let c2 = rack.connect(out, PortEndpoint::input(ModuleId(3), 0)).unwrap();

        assert_eq!(rack.delete_top_cable(&out), Some(c2));
        assert_eq!(rack.top_connection(&out), Some(c1));
        assert_eq!(rack.graph().cable_count(), 1);

        rack.undo().unwrap();
        assert_eq!(rack.registry().len(), 2);
        assert_eq!(rack.graph().cable_count(), 2);
    }

    #[test]
    fn test_color_change_undo() {
        let mut rack = rack();
        let id = rack
            .connect_with_color(
                PortEndpoint::output(ModuleId(1), 0),
                PortEndpoint::input(ModuleId(2), 0),
                CableColor::WHITE,
            )
            .unwrap();
        let red = CableColor::rgb(255, 0, 0);
        rack.set_cable_color(id, red).unwrap();
        assert_eq!(rack.history().undo_description(), Some("change cable color"));

        rack.undo().unwrap();
        assert_eq!(rack.connection(id).unwrap().color, CableColor::WHITE);
        rack.redo().unwrap();
        assert_eq!(rack.connection(id).unwrap().color, red);
    }

    #[test]
    fn test_remove_module_clears_cables() {
        let mut rack = rack();
        rack.connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();
        let kept = rack
            .connect(PortEndpoint::output(ModuleId(1), 1), PortEndpoint::input(ModuleId(3), 0))
            .unwrap();

        let removed = rack.remove_module(ModuleId(2)).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(rack.registry().ids().collect::<Vec<_>>(), vec![kept]);
        assert_eq!(rack.graph().cable_count(), 1);
    }

    #[test]
    fn test_clear_cables_on_module_is_one_undo_entry() {
        let mut rack = rack();
        rack.connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();
        rack.connect(PortEndpoint::output(ModuleId(1), 1), PortEndpoint::input(ModuleId(2), 1))
            .unwrap();

        assert_eq!(rack.clear_cables_on_module(ModuleId(2)).len(), 2);
        assert_eq!(rack.graph().cable_count(), 0);
        assert_eq!(rack.history().undo_depth(), 3);
        assert_eq!(rack.history().undo_description(), Some("clear cables"));

        rack.undo().unwrap();
        assert_eq!(rack.registry().len(), 2);
        assert_eq!(rack.graph().cable_count(), 2);
        assert_eq!(rack.history().undo_depth(), 2);
    }

    #[test]
    fn test_remove_module_forgets_its_history() {
        let mut rack = rack();
        rack.connect(PortEndpoint::output(ModuleId(1), 1), PortEndpoint::input(ModuleId(3), 0))
            .unwrap();
        rack.connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();

        rack.remove_module(ModuleId(2)).unwrap();
        assert_eq!(rack.history().undo_depth(), 1);

        rack.undo().unwrap();
        assert!(rack.registry().is_empty());
        assert_eq!(
            rack.undo(),
            Err(RackError::History(HistoryError::NothingToUndo))
        );

        rack.redo().unwrap();
        assert_eq!(rack.registry().len(), 1);
        assert_eq!(rack.graph().cable_count(), 1);
        assert!(!rack.history().can_redo());
    }

    #[test]
    fn test_remove_unknown_module_changes_nothing() {
        let mut rack = rack();
        rack.connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();
        assert_eq!(
            rack.remove_module(ModuleId(9)),
            Err(RackError::Engine(EngineError::ModuleNotFound(ModuleId(9))))
        );
        assert_eq!(rack.registry().len(), 1);
        assert_eq!(rack.history().undo_depth(), 1);
    }

    #[test]
    fn test_failed_undo_leaves_rack_and_stacks_untouched() {
        let mut rack = rack();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let c1 = rack.connect(out, PortEndpoint::input(ModuleId(2), 0)).unwrap();
        let c2 = rack.connect(out, PortEndpoint::input(ModuleId(3), 0)).unwrap();
        let s1 = CableSnapshot::of(rack.connection(c1).unwrap()).unwrap();
        let s2 = CableSnapshot::of(rack.connection(c2).unwrap()).unwrap();

        rack.history.clear();
        let mut batch = ComplexAction::new("move cable");
        batch.push(CableAction::Add(s1.clone()));
        batch.push(CableAction::Add(s2.clone()));
        rack.history.push(batch.finalize().unwrap());

        // The first cable goes away without a history entry
        rack.remove_connection(c1);

        assert_eq!(rack.undo(), Err(RackError::CableNotFound(s1.cable_id)));
        assert_eq!(rack.registry().len(), 1);
        assert_eq!(rack.graph().cable_count(), 1);
        assert!(rack.registry().find_by_cable(s2.cable_id).is_some());
        assert_eq!(rack.history().undo_depth(), 1);
        assert_eq!(rack.history().redo_depth(), 0);
    }

    #[test]
    fn test_failed_redo_stays_on_redo_stack() {
        let mut rack = rack();
        let id = rack
            .connect(PortEndpoint::output(ModuleId(1), 0), PortEndpoint::input(ModuleId(2), 0))
            .unwrap();
        let red = CableColor::rgb(255, 0, 0);
        rack.set_cable_color(id, red).unwrap();
        rack.undo().unwrap();
        rack.remove_connection(id);

        assert!(matches!(rack.redo(), Err(RackError::CableNotFound(_))));
        assert_eq!(rack.history().redo_depth(), 1);
        assert_eq!(rack.history().redo_description(), Some("change cable color"));
        assert_eq!(rack.history().undo_depth(), 1);
    }
}
