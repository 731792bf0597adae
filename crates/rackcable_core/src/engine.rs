// SPDX-License-Identifier: MIT OR Apache-2.0
//! The processing graph seam and an in-memory engine.
//!
//! The rack never touches audio processing directly. It only needs to
//! register and unregister cables, resolve modules by their stable ID,
//! and read a little live state back for drawing (channel counts and
//! plug light brightness).

use crate::cable::{Cable, CableId};
use crate::endpoint::{ModuleId, PortDirection, PortEndpoint};
use indexmap::IndexMap;

/// Number of color channels in a plug light (red, green, blue)
pub const PLUG_LIGHT_CHANNELS: usize = 3;

/// What the rack consumes from the audio processing graph.
pub trait ProcessingGraph {
    /// Register a cable. Assigns an ID when the cable has none.
    fn add_cable(&mut self, cable: Cable) -> Result<CableId, EngineError>;

    /// Unregister a cable
    fn remove_cable(&mut self, id: CableId) -> Option<Cable>;

    /// Get a registered cable
    fn cable(&self, id: CableId) -> Option<&Cable>;

    /// Whether a module with this stable ID exists
    fn has_module(&self, module: ModuleId) -> bool;

    /// Whether the endpoint names an existing port
    fn has_port(&self, endpoint: &PortEndpoint) -> bool;

    /// Polyphony channel count at a port (0 means inactive)
    fn channels(&self, endpoint: &PortEndpoint) -> u8;

    /// Plug light brightness at a port
    fn plug_lights(&self, endpoint: &PortEndpoint) -> [f32; PLUG_LIGHT_CHANNELS];
}

/// Live state of a single port
#[derive(Debug, Clone, Default)]
struct PortState {
    channels: u8,
    lights: [f32; PLUG_LIGHT_CHANNELS],
}

/// A module slot: just enough to validate endpoints
#[derive(Debug, Clone, Default)]
struct ModuleSlot {
    inputs: Vec<PortState>,
    outputs: Vec<PortState>,
}

impl ModuleSlot {
    fn ports(&self, direction: PortDirection) -> &[PortState] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    fn ports_mut(&mut self, direction: PortDirection) -> &mut Vec<PortState> {
        match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        }
    }
}

/// In-memory processing graph
#[derive(Debug, Default)]
pub struct Engine {
    modules: IndexMap<ModuleId, ModuleSlot>,
    cables: IndexMap<CableId, Cable>,
    next_cable_id: i64,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module with the given number of inputs and outputs
    pub fn add_module(&mut self, module: ModuleId, inputs: usize, outputs: usize) -> Result<(), EngineError> {
        if self.modules.contains_key(&module) {
            return Err(EngineError::ModuleIdInUse(module));
        }
        self.modules.insert(
            module,
            ModuleSlot {
                inputs: vec![PortState::default(); inputs],
                outputs: vec![PortState::default(); outputs],
            },
        );
        Ok(())
    }

    /// Remove a module and every cable touching it
    pub fn remove_module(&mut self, module: ModuleId) -> Result<Vec<Cable>, EngineError> {
        if self.modules.shift_remove(&module).is_none() {
            return Err(EngineError::ModuleNotFound(module));
        }
        let removed: Vec<Cable> = self
            .cables
            .values()
            .filter(|c| c.involves_module(module))
            .cloned()
            .collect();
        self.cables.retain(|_, c| !c.involves_module(module));
        Ok(removed)
    }

    /// Get all module IDs
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.keys().copied()
    }

    /// Get all registered cables
    pub fn cables(&self) -> impl Iterator<Item = &Cable> {
        self.cables.values()
    }

    /// Get the number of registered cables
    pub fn cable_count(&self) -> usize {
        self.cables.len()
    }

    /// Set the polyphony channel count of a port
    pub fn set_channels(&mut self, endpoint: &PortEndpoint, channels: u8) -> Result<(), EngineError> {
        self.port_mut(endpoint)?.channels = channels;
        Ok(())
    }

    /// Set the plug light brightness of a port
    pub fn set_plug_lights(
        &mut self,
        endpoint: &PortEndpoint,
        lights: [f32; PLUG_LIGHT_CHANNELS],
    ) -> Result<(), EngineError> {
        self.port_mut(endpoint)?.lights = lights;
        Ok(())
    }

    fn port(&self, endpoint: &PortEndpoint) -> Option<&PortState> {
        self.modules
            .get(&endpoint.module)?
            .ports(endpoint.direction)
            .get(endpoint.port)
    }

    fn port_mut(&mut self, endpoint: &PortEndpoint) -> Result<&mut PortState, EngineError> {
        self.modules
            .get_mut(&endpoint.module)
            .ok_or(EngineError::ModuleNotFound(endpoint.module))?
            .ports_mut(endpoint.direction)
            .get_mut(endpoint.port)
            .ok_or(EngineError::PortNotFound(*endpoint))
    }

    fn allocate_id(&mut self) -> CableId {
        loop {
            self.next_cable_id += 1;
            let id = CableId(self.next_cable_id);
            if !self.cables.contains_key(&id) {
                return id;
            }
        }
    }
}

impl ProcessingGraph for Engine {
    fn add_cable(&mut self, mut cable: Cable) -> Result<CableId, EngineError> {
        // Validate direction of both ends
        if cable.output.direction != PortDirection::Output || cable.input.direction != PortDirection::Input {
            return Err(EngineError::DirectionMismatch);
        }

        // Validate ports exist
        for endpoint in [&cable.output, &cable.input] {
            if !self.has_module(endpoint.module) {
                return Err(EngineError::ModuleNotFound(endpoint.module));
            }
            if !self.has_port(endpoint) {
                return Err(EngineError::PortNotFound(*endpoint));
            }
        }

        // At most one cable per exact output/input pair
        if self.cables.values().any(|c| c.joins(&cable.output, &cable.input)) {
            return Err(EngineError::DuplicateCable {
                output: cable.output,
                input: cable.input,
            });
        }

        let id = match cable.id {
            Some(id) if self.cables.contains_key(&id) => return Err(EngineError::CableIdInUse(id)),
            Some(id) => {
                self.next_cable_id = self.next_cable_id.max(id.0);
                id
            }
            None => self.allocate_id(),
        };

        cable.id = Some(id);
        self.cables.insert(id, cable);
        Ok(id)
    }

    fn remove_cable(&mut self, id: CableId) -> Option<Cable> {
        self.cables.shift_remove(&id)
    }

    fn cable(&self, id: CableId) -> Option<&Cable> {
        self.cables.get(&id)
    }

    fn has_module(&self, module: ModuleId) -> bool {
        self.modules.contains_key(&module)
    }

    fn has_port(&self, endpoint: &PortEndpoint) -> bool {
        self.port(endpoint).is_some()
    }

    fn channels(&self, endpoint: &PortEndpoint) -> u8 {
        match endpoint.direction {
            PortDirection::Output => self.port(endpoint).map_or(0, |p| p.channels),
            // Inputs carry whatever their connected outputs carry
            PortDirection::Input => self
                .cables
                .values()
                .filter(|c| c.input == *endpoint)
                .map(|c| self.port(&c.output).map_or(0, |p| p.channels))
                .max()
                .unwrap_or(0),
        }
    }

    fn plug_lights(&self, endpoint: &PortEndpoint) -> [f32; PLUG_LIGHT_CHANNELS] {
        self.port(endpoint).map_or([0.0; PLUG_LIGHT_CHANNELS], |p| p.lights)
    }
}

/// Error raised by the processing graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Module not found
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// Module ID already used
    #[error("Module ID already in use: {0}")]
    ModuleIdInUse(ModuleId),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(PortEndpoint),

    /// Output/input ends swapped or equal
    #[error("Cable must run from an output to an input")]
    DirectionMismatch,

    /// A cable already joins these two endpoints
    #[error("Cable already exists between {output} and {input}")]
    DuplicateCable {
        /// Output endpoint
        output: PortEndpoint,
        /// Input endpoint
        input: PortEndpoint,
    },

    /// Cable ID already used
    #[error("Cable ID already in use: {0}")]
    CableIdInUse(CableId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.add_module(ModuleId(1), 1, 2).unwrap();
        engine.add_module(ModuleId(2), 2, 1).unwrap();
        engine
    }

    #[test]
    fn test_add_cable_assigns_ids() {
        let mut engine = engine();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let a = engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 0))).unwrap();
        let b = engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 1))).unwrap();
        assert_ne!(a, b);
        assert_eq!(engine.cable(a).unwrap().id, Some(a));
        assert_eq!(engine.cable_count(), 2);
    }

    #[test]
    fn test_add_cable_rejects_duplicates_and_bad_ports() {
        let mut engine = engine();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let inp = PortEndpoint::input(ModuleId(2), 0);
        engine.add_cable(Cable::new(out, inp)).unwrap();

        assert!(matches!(
            engine.add_cable(Cable::new(out, inp)),
            Err(EngineError::DuplicateCable { .. })
        ));
        assert_eq!(
            engine.add_cable(Cable::new(inp, out)),
            Err(EngineError::DirectionMismatch)
        );
        assert_eq!(
            engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 5))),
            Err(EngineError::PortNotFound(PortEndpoint::input(ModuleId(2), 5)))
        );
        assert_eq!(
            engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(9), 0))),
            Err(EngineError::ModuleNotFound(ModuleId(9)))
        );
    }

    #[test]
    fn test_requested_id_is_kept_and_not_reallocated() {
        let mut engine = engine();
        let out = PortEndpoint::output(ModuleId(1), 0);
        let id = engine
            .add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 0)).with_id(Some(CableId(40))))
            .unwrap();
        assert_eq!(id, CableId(40));

        assert_eq!(
            engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 1)).with_id(Some(CableId(40)))),
            Err(EngineError::CableIdInUse(CableId(40)))
        );
        let next = engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 1))).unwrap();
        assert!(next.0 > 40);
    }

    #[test]
    fn test_input_channels_follow_output() {
        let mut engine = engine();
        let out = PortEndpoint::output(ModuleId(1), 1);
        let inp = PortEndpoint::input(ModuleId(2), 0);
        engine.set_channels(&out, 4).unwrap();
        assert_eq!(engine.channels(&inp), 0);

        engine.add_cable(Cable::new(out, inp)).unwrap();
        assert_eq!(engine.channels(&inp), 4);
        assert_eq!(engine.channels(&out), 4);
    }

    #[test]
    fn test_remove_module_drops_its_cables() {
        let mut engine = engine();
        let out = PortEndpoint::output(ModuleId(1), 0);
        engine.add_cable(Cable::new(out, PortEndpoint::input(ModuleId(2), 0))).unwrap();

        let removed = engine.remove_module(ModuleId(2)).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(engine.cable_count(), 0);
        assert!(!engine.has_module(ModuleId(2)));
        assert_eq!(engine.remove_module(ModuleId(2)), Err(EngineError::ModuleNotFound(ModuleId(2))));
    }
}
