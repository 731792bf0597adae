// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rack-wide collection of connections and their plug stacking order.
//!
//! Every connection contributes two plugs to a single z-ordered list; the
//! last plug is drawn on top. The same list answers "which cable is on top
//! of this port", so what looks grabbable is what gets grabbed.

use crate::cable::CableId;
use crate::connection::{CableConnection, ConnectionId};
use crate::endpoint::{ModuleId, PortDirection, PortEndpoint};
use indexmap::IndexMap;

/// All connections on the rack
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connections in insertion order, which is also cable draw order
    connections: IndexMap<ConnectionId, CableConnection>,
    /// Plug z-order, bottom first
    plug_order: Vec<(ConnectionId, PortDirection)>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Both of its plugs go on top.
    pub fn add(&mut self, connection: CableConnection) -> ConnectionId {
        let id = connection.id;
        if self.connections.insert(id, connection).is_none() {
            self.plug_order.push((id, PortDirection::Output));
            self.plug_order.push((id, PortDirection::Input));
        }
        id
    }

    /// Remove a connection and its plugs. Does not touch the engine cable.
    pub fn remove(&mut self, id: ConnectionId) -> Option<CableConnection> {
        let connection = self.connections.shift_remove(&id)?;
        self.plug_order.retain(|(plug_id, _)| *plug_id != id);
        Some(connection)
    }

    /// Get a connection by ID
    pub fn get(&self, id: ConnectionId) -> Option<&CableConnection> {
        self.connections.get(&id)
    }

    /// Get a mutable connection by ID
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut CableConnection> {
        self.connections.get_mut(&id)
    }

    /// Whether a connection is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// All connections in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CableConnection> {
        self.connections.values()
    }

    /// All connection IDs in insertion order
    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.keys().copied()
    }

    /// Number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether there are no connections
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Plugs bottom to top
    pub fn plug_order(&self) -> &[(ConnectionId, PortDirection)] {
        &self.plug_order
    }

    /// The complete connection whose plug is highest on `endpoint`
    pub fn top_connection(&self, endpoint: &PortEndpoint) -> Option<ConnectionId> {
        self.plug_order
            .iter()
            .rev()
            .find(|(id, direction)| *direction == endpoint.direction && self.is_complete_on(*id, endpoint))
            .map(|(id, _)| *id)
    }

    /// Complete connections on `endpoint`, bottom to top
    pub fn connections_on(&self, endpoint: &PortEndpoint) -> Vec<ConnectionId> {
        self.plug_order
            .iter()
            .filter(|(id, direction)| *direction == endpoint.direction && self.is_complete_on(*id, endpoint))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The complete connection joining exactly `output` and `input`
    pub fn find_connection(&self, output: &PortEndpoint, input: &PortEndpoint) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|c| c.is_complete() && c.output() == Some(*output) && c.input() == Some(*input))
            .map(|c| c.id)
    }

    /// The connection currently backed by, or remembering, an engine cable ID
    pub fn find_by_cable(&self, cable: CableId) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|c| c.cable() == Some(cable) || (c.cable().is_none() && c.cable_id() == Some(cable)))
            .map(|c| c.id)
    }

    /// Connections still missing an endpoint
    pub fn incomplete_connections(&self) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| !c.is_complete())
            .map(|c| c.id)
            .collect()
    }

    /// Connections with either end bound to a module
    pub fn connections_on_module(&self, module: ModuleId) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| {
                c.output().is_some_and(|e| e.module == module) || c.input().is_some_and(|e| e.module == module)
            })
            .map(|c| c.id)
            .collect()
    }

    /// Move both plugs of a connection to the top of the stack
    pub fn promote_to_top(&mut self, id: ConnectionId) {
        self.promote_plug(id, PortDirection::Output);
        self.promote_plug(id, PortDirection::Input);
    }

    /// Move one plug of a connection to the top of the stack
    pub fn promote_plug(&mut self, id: ConnectionId, direction: PortDirection) {
        if let Some(index) = self.plug_order.iter().position(|plug| *plug == (id, direction)) {
            let plug = self.plug_order.remove(index);
            self.plug_order.push(plug);
        }
    }

    fn is_complete_on(&self, id: ConnectionId, endpoint: &PortEndpoint) -> bool {
        self.connections
            .get(&id)
            .is_some_and(|c| c.is_complete() && c.touches(endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CableColor;

    fn complete(output: PortEndpoint, input: PortEndpoint) -> CableConnection {
        let mut cc = CableConnection::new(CableColor::WHITE);
        cc.set_endpoint(PortDirection::Output, Some(output));
        cc.set_endpoint(PortDirection::Input, Some(input));
        cc
    }

    #[test]
    fn test_top_connection_follows_promotion() {
        let mut registry = ConnectionRegistry::new();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let c1 = registry.add(complete(out, PortEndpoint::input(ModuleId(2), 0)));
        let c2 = registry.add(complete(out, PortEndpoint::input(ModuleId(3), 0)));
        assert_eq!(registry.top_connection(&out), Some(c2));

        registry.promote_to_top(c1);
        assert_eq!(registry.top_connection(&out), Some(c1));
        assert_eq!(registry.connections_on(&out), vec![c2, c1]);
    }

    #[test]
    fn test_top_connection_ignores_incomplete() {
        let mut registry = ConnectionRegistry::new();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let c1 = registry.add(complete(out, PortEndpoint::input(ModuleId(2), 0)));

        let mut partial = CableConnection::new(CableColor::WHITE);
        partial.set_endpoint(PortDirection::Output, Some(out));
        let p = registry.add(partial);

        assert_eq!(registry.top_connection(&out), Some(c1));
        assert_eq!(registry.incomplete_connections(), vec![p]);
        assert_eq!(registry.top_connection(&PortEndpoint::output(ModuleId(9), 0)), None);
    }

    #[test]
    fn test_find_connection_exact_pair() {
        let mut registry = ConnectionRegistry::new();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let inp = PortEndpoint::input(ModuleId(2), 0);
        let c1 = registry.add(complete(out, inp));

        assert_eq!(registry.find_connection(&out, &inp), Some(c1));
        assert_eq!(registry.find_connection(&out, &PortEndpoint::input(ModuleId(2), 1)), None);
    }

    #[test]
    fn test_remove_drops_plugs() {
        let mut registry = ConnectionRegistry::new();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let c1 = registry.add(complete(out, PortEndpoint::input(ModuleId(2), 0)));
        let c2 = registry.add(complete(out, PortEndpoint::input(ModuleId(3), 0)));

        assert!(registry.remove(c2).is_some());
        assert_eq!(registry.plug_order().len(), 2);
        assert_eq!(registry.top_connection(&out), Some(c1));
        assert!(registry.remove(c2).is_none());
    }

    #[test]
    fn test_connections_on_module() {
        let mut registry = ConnectionRegistry::new();
        let c1 = registry.add(complete(
            PortEndpoint::output(ModuleId(1), 0),
            PortEndpoint::input(ModuleId(2), 0),
        ));
        registry.add(complete(
            PortEndpoint::output(ModuleId(3), 0),
            PortEndpoint::input(ModuleId(4), 0),
        ));
        assert_eq!(registry.connections_on_module(ModuleId(2)), vec![c1]);
    }
}
