// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine-level cable records.

use crate::endpoint::{ModuleId, PortEndpoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable cable identifier, persisted across save/load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CableId(pub i64);

impl fmt::Display for CableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A voltage connection between one output and one input, as the
/// processing graph sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    /// Cable ID. `None` asks the processing graph to assign one.
    pub id: Option<CableId>,
    /// Output endpoint
    pub output: PortEndpoint,
    /// Input endpoint
    pub input: PortEndpoint,
}

impl Cable {
    /// Create a cable without an ID
    pub fn new(output: PortEndpoint, input: PortEndpoint) -> Self {
        Self {
            id: None,
            output,
            input,
        }
    }

    /// Request a specific ID
    pub fn with_id(mut self, id: Option<CableId>) -> Self {
        self.id = id;
        self
    }

    /// Check if this cable involves a specific module
    pub fn involves_module(&self, module: ModuleId) -> bool {
        self.output.module == module || self.input.module == module
    }

    /// Check if this cable involves a specific endpoint
    pub fn involves_endpoint(&self, endpoint: &PortEndpoint) -> bool {
        self.output == *endpoint || self.input == *endpoint
    }

    /// Check if this cable joins exactly `output` and `input`
    pub fn joins(&self, output: &PortEndpoint, input: &PortEndpoint) -> bool {
        self.output == *output && self.input == *input
    }
}
