// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual cable connections.
//!
//! A [`CableConnection`] is what the user sees and drags. It pairs up to two
//! endpoints with an optional engine-level [`Cable`]. The engine cable
//! exists exactly when both endpoints are bound; every endpoint change goes
//! through [`CableConnection::update_cable`], which destroys and recreates
//! the engine cable in the same call.

use crate::cable::{Cable, CableId};
use crate::color::CableColor;
use crate::endpoint::{PortDirection, PortEndpoint};
use crate::engine::{EngineError, ProcessingGraph};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a visual connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No endpoints bound
    Empty,
    /// One endpoint bound, only while dragging
    Partial,
    /// Both endpoints bound, engine cable registered
    Complete,
}

/// Plug marker at one end of a connection
#[derive(Debug, Clone, PartialEq)]
pub struct PlugVisual {
    /// Which end this plug sits on
    pub direction: PortDirection,
    /// Rotation, initially pointing up
    pub angle: f32,
    /// Whether this plug is on top of its port's stack. Only top plugs show lights.
    pub top: bool,
    /// Tint, always opaque
    pub color: CableColor,
    /// Light brightness (red, green, blue)
    pub lights: [f32; 3],
}

impl PlugVisual {
    fn new(direction: PortDirection) -> Self {
        Self {
            direction,
            angle: std::f32::consts::FRAC_PI_2,
            top: false,
            color: CableColor::default(),
            lights: [0.0; 3],
        }
    }
}

/// A cable as shown on the rack
#[derive(Debug, Clone)]
pub struct CableConnection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Display color
    pub color: CableColor,
    output: Option<PortEndpoint>,
    input: Option<PortEndpoint>,
    hovered_output: Option<PortEndpoint>,
    hovered_input: Option<PortEndpoint>,
    /// Live engine cable
    cable: Option<CableId>,
    /// Last engine cable ID, reused on reconnect so history stays linked
    cable_id: Option<CableId>,
    output_plug: PlugVisual,
    input_plug: PlugVisual,
}

impl CableConnection {
    /// Create an empty connection
    pub fn new(color: CableColor) -> Self {
        Self {
            id: ConnectionId::new(),
            color,
            output: None,
            input: None,
            hovered_output: None,
            hovered_input: None,
            cable: None,
            cable_id: None,
            output_plug: PlugVisual::new(PortDirection::Output),
            input_plug: PlugVisual::new(PortDirection::Input),
        }
    }

    /// Remember an engine cable ID to request when the cable is next created
    pub fn with_cable_id(mut self, id: Option<CableId>) -> Self {
        self.cable_id = id;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        match (self.output, self.input) {
            (Some(_), Some(_)) => ConnectionState::Complete,
            (None, None) => ConnectionState::Empty,
            _ => ConnectionState::Partial,
        }
    }

    /// Whether both endpoints are bound
    pub fn is_complete(&self) -> bool {
        self.output.is_some() && self.input.is_some()
    }

    /// Bound endpoint on one side
    pub fn endpoint(&self, direction: PortDirection) -> Option<PortEndpoint> {
        match direction {
            PortDirection::Output => self.output,
            PortDirection::Input => self.input,
        }
    }

    /// Bound output endpoint
    pub fn output(&self) -> Option<PortEndpoint> {
        self.output
    }

    /// Bound input endpoint
    pub fn input(&self) -> Option<PortEndpoint> {
        self.input
    }

    /// Bind or unbind one side. Call [`Self::update_cable`] afterwards.
    pub fn set_endpoint(&mut self, direction: PortDirection, endpoint: Option<PortEndpoint>) {
        debug_assert!(endpoint.map_or(true, |e| e.direction == direction));
        match direction {
            PortDirection::Output => self.output = endpoint,
            PortDirection::Input => self.input = endpoint,
        }
    }

    /// Hovered candidate on one side, only set while dragging
    pub fn hovered(&self, direction: PortDirection) -> Option<PortEndpoint> {
        match direction {
            PortDirection::Output => self.hovered_output,
            PortDirection::Input => self.hovered_input,
        }
    }

    /// Set or clear the hovered candidate on one side
    pub fn set_hovered(&mut self, direction: PortDirection, endpoint: Option<PortEndpoint>) {
        match direction {
            PortDirection::Output => self.hovered_output = endpoint,
            PortDirection::Input => self.hovered_input = endpoint,
        }
    }

    /// Clear both hovered candidates
    pub fn clear_hovered(&mut self) {
        self.hovered_output = None;
        self.hovered_input = None;
    }

    /// Whether either bound endpoint is `endpoint`
    pub fn touches(&self, endpoint: &PortEndpoint) -> bool {
        self.endpoint(endpoint.direction) == Some(*endpoint)
    }

    /// Live engine cable, if complete
    pub fn cable(&self) -> Option<CableId> {
        self.cable
    }

    /// Remembered engine cable ID
    pub fn cable_id(&self) -> Option<CableId> {
        self.cable_id
    }

    /// Plug on one side
    pub fn plug(&self, direction: PortDirection) -> &PlugVisual {
        match direction {
            PortDirection::Output => &self.output_plug,
            PortDirection::Input => &self.input_plug,
        }
    }

    /// Mutable plug on one side
    pub fn plug_mut(&mut self, direction: PortDirection) -> &mut PlugVisual {
        match direction {
            PortDirection::Output => &mut self.output_plug,
            PortDirection::Input => &mut self.input_plug,
        }
    }

    /// Bring the engine cable in line with the bound endpoints.
    ///
    /// An existing cable that already joins the bound endpoints is left
    /// alone. Otherwise it is removed, and a new one is registered when both
    /// endpoints are bound. On error the connection is left without a cable.
    pub fn update_cable<G: ProcessingGraph + ?Sized>(&mut self, graph: &mut G) -> Result<(), EngineError> {
        if let (Some(id), Some(output), Some(input)) = (self.cable, self.output, self.input) {
            if graph.cable(id).is_some_and(|c| c.joins(&output, &input)) {
                return Ok(());
            }
        }

        if let Some(id) = self.cable.take() {
            graph.remove_cable(id);
            tracing::debug!("Destroyed cable {}", id);
        }

        if let (Some(output), Some(input)) = (self.output, self.input) {
            let id = graph.add_cable(Cable::new(output, input).with_id(self.cable_id))?;
            self.cable = Some(id);
            self.cable_id = Some(id);
            tracing::debug!("Created cable {} from {} to {}", id, output, input);
        }
        Ok(())
    }

    /// Unbind both endpoints and destroy the engine cable. Forgets the cable ID.
    pub fn disconnect<G: ProcessingGraph + ?Sized>(&mut self, graph: &mut G) {
        self.output = None;
        self.input = None;
        self.clear_hovered();
        if let Some(id) = self.cable.take() {
            graph.remove_cable(id);
            tracing::debug!("Destroyed cable {}", id);
        }
        self.cable_id = None;
    }
}
