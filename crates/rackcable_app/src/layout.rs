// SPDX-License-Identifier: MIT OR Apache-2.0
//! Column layout for modules loaded without a panel description.

use crate::patch::PatchModule;
use egui::Pos2;
use rackcable_core::PortEndpoint;

/// Module column width in rack units
const MODULE_WIDTH: f32 = 120.0;

/// Distance from a column edge to its ports
const PORT_MARGIN: f32 = 20.0;

/// Vertical distance between ports
const PORT_SPACING: f32 = 40.0;

/// Port centers of the module in `column`: inputs on the left edge,
/// outputs on the right edge
pub fn layout_ports(column: usize, module: &PatchModule) -> Vec<(PortEndpoint, Pos2)> {
    let left = column as f32 * MODULE_WIDTH + PORT_MARGIN;
    let right = (column + 1) as f32 * MODULE_WIDTH - PORT_MARGIN;
    let row = |port: usize| PORT_SPACING * (port as f32 + 1.0);

    let inputs = (0..module.inputs).map(|port| (PortEndpoint::input(module.id, port), Pos2::new(left, row(port))));
    let outputs = (0..module.outputs).map(|port| (PortEndpoint::output(module.id, port), Pos2::new(right, row(port))));
    inputs.chain(outputs).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackcable_core::ModuleId;

    #[test]
    fn test_layout_columns() {
        let module = PatchModule {
            id: ModuleId(3),
            inputs: 2,
            outputs: 1,
        };
        let ports = layout_ports(1, &module);
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0], (PortEndpoint::input(ModuleId(3), 0), Pos2::new(140.0, 40.0)));
        assert_eq!(ports[1].1, Pos2::new(140.0, 80.0));
        assert_eq!(ports[2], (PortEndpoint::output(ModuleId(3), 0), Pos2::new(220.0, 40.0)));
    }
}
