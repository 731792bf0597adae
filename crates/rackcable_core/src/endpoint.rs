// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port endpoints that cables attach to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a module in the rack.
///
/// Survives save/load, so persisted cables can find their modules again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub i64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The direction a cable end must have to plug into this one
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }

    /// Lowercase name, used in logs and menu labels
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// One terminal a cable can attach to: module, port index and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortEndpoint {
    /// Owning module
    pub module: ModuleId,
    /// Port index within the module's inputs or outputs
    pub port: usize,
    /// Port direction
    pub direction: PortDirection,
}

impl PortEndpoint {
    /// Create an endpoint
    pub fn new(module: ModuleId, port: usize, direction: PortDirection) -> Self {
        Self {
            module,
            port,
            direction,
        }
    }

    /// Create an input endpoint
    pub fn input(module: ModuleId, port: usize) -> Self {
        Self::new(module, port, PortDirection::Input)
    }

    /// Create an output endpoint
    pub fn output(module: ModuleId, port: usize) -> Self {
        Self::new(module, port, PortDirection::Output)
    }

    /// Whether a cable end hanging off `self` may plug into `other`
    pub fn can_connect(&self, other: &PortEndpoint) -> bool {
        self.direction != other.direction
    }
}

impl fmt::Display for PortEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {} {} {}", self.module, self.direction.name(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_direction() {
        assert_eq!(PortDirection::Input.opposite(), PortDirection::Output);
        assert_eq!(PortDirection::Output.opposite(), PortDirection::Input);
    }

    #[test]
    fn test_can_connect_requires_opposite_directions() {
        let out = PortEndpoint::output(ModuleId(1), 0);
        let inp = PortEndpoint::input(ModuleId(2), 0);
        let other_out = PortEndpoint::output(ModuleId(2), 1);

        assert!(out.can_connect(&inp));
        assert!(inp.can_connect(&out));
        assert!(!out.can_connect(&other_out));
    }

    #[test]
    fn test_display() {
        let out = PortEndpoint::output(ModuleId(7), 3);
        assert_eq!(out.to_string(), "module 7 output 3");
    }
}
