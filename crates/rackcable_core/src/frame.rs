// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame cable layout.
//!
//! [`Rack::step_frame`] runs once per frame after input handling and before
//! drawing. It resolves where every cable end sits, updates the plug
//! visuals stored on each connection and returns a [`RackFrame`] for the
//! painter. Nothing computed here is persisted.

use crate::color::CableColor;
use crate::connection::{CableConnection, ConnectionId};
use crate::endpoint::{PortDirection, PortEndpoint};
use crate::engine::{ProcessingGraph, PLUG_LIGHT_CHANNELS};
use crate::geometry::{plug_angle, pull_towards, slump_pos};
use crate::rack::Rack;
use egui::Pos2;
use std::collections::HashMap;

/// Stroke width of a mono cable
pub const CABLE_THICKNESS: f32 = 6.0;

/// Stroke width of a polyphonic cable
pub const POLY_CABLE_THICKNESS: f32 = 9.0;

/// How far the drawn cable ends are pulled in from the plug centers
pub const CABLE_END_INSET: f32 = 14.0;

/// One cable, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct CableFrame {
    /// Connection drawn
    pub connection: ConnectionId,
    /// Output plug center
    pub output: Pos2,
    /// Input plug center
    pub input: Pos2,
    /// Sagging control point
    pub slump: Pos2,
    /// Stroke start, pulled in from `output`
    pub start: Pos2,
    /// Stroke end, pulled in from `input`
    pub end: Pos2,
    /// Stroke width
    pub thickness: f32,
    /// Opacity before the display curve
    pub opacity: f32,
    /// Cable color
    pub color: CableColor,
}

impl CableFrame {
    /// Alpha actually drawn
    pub fn alpha(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0).powf(1.5)
    }

    /// Whether the cable is visible at all
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// One plug, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct PlugFrame {
    /// Owning connection
    pub connection: ConnectionId,
    /// Which end
    pub direction: PortDirection,
    /// Plug center
    pub pos: Pos2,
    /// Rotation
    pub angle: f32,
    /// Whether this plug is on top of its port
    pub top: bool,
    /// Opaque tint
    pub color: CableColor,
    /// Light brightness, zero unless `top`
    pub lights: [f32; PLUG_LIGHT_CHANNELS],
}

/// Everything the painter needs for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RackFrame {
    /// Cables in draw order
    pub cables: Vec<CableFrame>,
    /// Plugs bottom to top
    pub plugs: Vec<PlugFrame>,
    /// Known ports, with their centers, drawn dimmed because the active
    /// drag cannot plug into them
    pub dimmed_ports: Vec<(PortEndpoint, Pos2)>,
}

/// Resolved end positions of one connection
#[derive(Debug, Clone, Copy)]
struct Ends {
    output: Pos2,
    input: Pos2,
    slump: Pos2,
}

impl Ends {
    fn get(&self, direction: PortDirection) -> Pos2 {
        match direction {
            PortDirection::Output => self.output,
            PortDirection::Input => self.input,
        }
    }
}

impl<G: ProcessingGraph> Rack<G> {
    /// Lay out all cables and plugs for this frame
    pub fn step_frame(&mut self) -> RackFrame {
        let tension = self.settings.tension;

        let mut ends = HashMap::new();
        let mut cables = Vec::with_capacity(self.cables.len());
        for connection in self.cables.iter() {
            let (Some(output), Some(input)) = (
                self.end_position(connection, PortDirection::Output),
                self.end_position(connection, PortDirection::Input),
            ) else {
                continue;
            };
            let slump = slump_pos(output, input, tension);
            ends.insert(connection.id, Ends { output, input, slump });

            cables.push(CableFrame {
                connection: connection.id,
                output,
                input,
                slump,
                start: pull_towards(output, slump, CABLE_END_INSET),
                end: pull_towards(input, slump, CABLE_END_INSET),
                thickness: self.cable_thickness(connection),
                opacity: self.cable_opacity(connection),
                color: connection.color,
            });
        }

        let mut plugs = Vec::with_capacity(self.cables.plug_order().len());
        for &(id, direction) in self.cables.plug_order() {
            let (Some(connection), Some(ends)) = (self.cables.get(id), ends.get(&id)) else {
                continue;
            };
            let endpoint = connection.endpoint(direction);
            let top = endpoint.is_some_and(|e| self.cables.top_connection(&e) == Some(id));
            let lights = match endpoint {
                Some(e) if top => self.graph.plug_lights(&e),
                _ => [0.0; PLUG_LIGHT_CHANNELS],
            };
            let pos = ends.get(direction);
            plugs.push(PlugFrame {
                connection: id,
                direction,
                pos,
                angle: plug_angle(pos, ends.slump),
                top,
                color: connection.color.opaque(),
                lights,
            });
        }

        for plug in &plugs {
            if let Some(connection) = self.cables.get_mut(plug.connection) {
                let visual = connection.plug_mut(plug.direction);
                visual.angle = plug.angle;
                visual.top = plug.top;
                visual.color = plug.color;
                visual.lights = plug.lights;
            }
        }

        let dimmed_ports = self
            .port_positions
            .iter()
            .filter(|(port, _)| self.port_dimmed(port))
            .map(|(port, center)| (*port, *center))
            .collect();

        RackFrame {
            cables,
            plugs,
            dimmed_ports,
        }
    }

    /// Whether a port should be drawn dimmed: a drag is active and its
    /// loose end cannot go into this port
    pub fn port_dimmed(&self, port: &PortEndpoint) -> bool {
        self.active_drag_direction().is_some_and(|dragged| dragged != port.direction)
    }

    /// Where one end of a connection sits: its port, else the hovered
    /// candidate, else the pointer. `None` when a bound port has no known
    /// position yet.
    fn end_position(&self, connection: &CableConnection, direction: PortDirection) -> Option<Pos2> {
        match connection.endpoint(direction).or(connection.hovered(direction)) {
            Some(endpoint) => self.port_position(&endpoint),
            None => Some(self.pointer),
        }
    }

    fn cable_thickness(&self, connection: &CableConnection) -> f32 {
        let channels = connection.output().map_or(0, |o| self.graph.channels(&o));
        if channels > 1 {
            POLY_CABLE_THICKNESS
        } else {
            CABLE_THICKNESS
        }
    }

    fn cable_opacity(&self, connection: &CableConnection) -> f32 {
        if !connection.is_complete() {
            return 1.0;
        }
        // Opaque while the pointer is on one of its ports
        if self.hovered_port.is_some_and(|port| connection.touches(&port)) {
            return 1.0;
        }
        let opacity = self.settings.opacity;
        match connection.output() {
            Some(output) if self.graph.channels(&output) == 0 => opacity * 0.5,
            _ => opacity,
        }
    }
}
