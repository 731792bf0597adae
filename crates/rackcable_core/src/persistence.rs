// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and restoring cables.
//!
//! A saved cable names its engine cable ID, both module IDs and port
//! indices, and its color as a hex string. Loading resolves the ports
//! against the live module graph one record at a time, so a record that
//! points at a missing module only loses that one cable.

use crate::cable::CableId;
use crate::color::CableColor;
use crate::connection::{CableConnection, ConnectionId};
use crate::endpoint::{ModuleId, PortDirection, PortEndpoint};
use crate::engine::ProcessingGraph;
use crate::rack::{Rack, RackError};
use serde::{Deserialize, Serialize};

/// A saved cable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchCable {
    /// Engine cable ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CableId>,
    /// Module with the output port
    pub output_module_id: ModuleId,
    /// Output port index
    pub output_id: usize,
    /// Module with the input port
    pub input_module_id: ModuleId,
    /// Input port index
    pub input_id: usize,
    /// Hex color string. Anything else falls back to the next palette color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<serde_json::Value>,
}

impl PatchCable {
    /// Record a complete connection. `None` for loose cables.
    pub fn of(connection: &CableConnection) -> Option<Self> {
        let output = connection.output()?;
        let input = connection.input()?;
        Some(Self {
            id: connection.cable().or(connection.cable_id()),
            output_module_id: output.module,
            output_id: output.port,
            input_module_id: input.module,
            input_id: input.port,
            color: Some(serde_json::Value::String(connection.color.to_hex())),
        })
    }

    /// Output endpoint named by this record
    pub fn output(&self) -> PortEndpoint {
        PortEndpoint::output(self.output_module_id, self.output_id)
    }

    /// Input endpoint named by this record
    pub fn input(&self) -> PortEndpoint {
        PortEndpoint::input(self.input_module_id, self.input_id)
    }

    /// Saved color, if it is a valid hex string
    pub fn parsed_color(&self) -> Option<CableColor> {
        match &self.color {
            Some(serde_json::Value::String(hex)) => match CableColor::from_hex(hex) {
                Ok(color) => Some(color),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            },
            _ => None,
        }
    }
}

/// Result of loading a list of cables
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Restored connections, in record order
    pub loaded: Vec<ConnectionId>,
    /// Record index and reason for every cable that could not be restored
    pub failed: Vec<(usize, RackError)>,
}

impl LoadReport {
    /// Whether every record was restored
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<G: ProcessingGraph> Rack<G> {
    /// Save every complete connection, in draw order
    pub fn save_cables(&self) -> Vec<PatchCable> {
        self.cables.iter().filter_map(PatchCable::of).collect()
    }

    /// Restore one saved cable. Not recorded in history.
    pub fn restore_cable(&mut self, record: &PatchCable) -> Result<ConnectionId, RackError> {
        let output = record.output();
        let input = record.input();
        for endpoint in [output, input] {
            if !self.graph.has_port(&endpoint) {
                return Err(RackError::EndpointNotFound(endpoint));
            }
        }

        let color = match record.parsed_color() {
            Some(color) => color,
            None => self.palette.next_color(),
        };
        let mut connection = CableConnection::new(color).with_cable_id(record.id);
        connection.set_endpoint(PortDirection::Output, Some(output));
        connection.set_endpoint(PortDirection::Input, Some(input));
        connection.update_cable(&mut self.graph)?;
        Ok(self.cables.add(connection))
    }

    /// Restore saved cables. Each record succeeds or fails on its own.
    pub fn load_cables(&mut self, records: &[PatchCable]) -> LoadReport {
        let mut report = LoadReport::default();
        for (index, record) in records.iter().enumerate() {
            match self.restore_cable(record) {
                Ok(id) => report.loaded.push(id),
                Err(e) => {
                    tracing::warn!("Skipping cable {}: {}", index, e);
                    report.failed.push((index, e));
                }
            }
        }
        tracing::info!(
            "Loaded {} of {} cables",
            report.loaded.len(),
            records.len()
        );
        report
    }
}
