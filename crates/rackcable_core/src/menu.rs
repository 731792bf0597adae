// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port context menu model.
//!
//! The menu is plain data. A front end renders the items however it likes
//! and hands the chosen one back to [`Rack::activate_menu_item`]. Items
//! that start a drag arm a [`PendingOverride`] and start the gesture on the
//! port directly; the front end then routes pointer events as for any drag.

use crate::color::CableColor;
use crate::connection::ConnectionId;
use crate::endpoint::{PortDirection, PortEndpoint};
use crate::engine::ProcessingGraph;
use crate::gesture::PendingOverride;
use crate::rack::{Rack, RackError};

/// One entry of a port's context menu
#[derive(Debug, Clone, PartialEq)]
pub enum PortMenuItem {
    /// Non-interactive text
    Label(String),
    /// Visual divider
    Separator,
    /// Delete the top cable on the port
    DeleteTopCable {
        /// Whether there is a cable to delete
        enabled: bool,
    },
    /// Start dragging a copy of the top cable
    DuplicateTopCable {
        /// The top cable, if any
        connection: Option<ConnectionId>,
    },
    /// Start dragging a new cable even though the port has cables
    CreateCableOnTop,
    /// Start dragging a new cable of a given palette color
    CreateCable {
        /// Palette index
        color_index: usize,
        /// Palette label
        label: String,
        /// Palette color
        color: CableColor,
    },
    /// Start dragging one of the cables on the port
    GrabCable {
        /// Cable to grab
        connection: ConnectionId,
        /// The cable's far end
        other_end: PortEndpoint,
        /// Current color
        color: CableColor,
        /// Color submenu
        submenu: Vec<PortMenuItem>,
    },
    /// Start dragging all cables on the port together
    GrabAllCables(Vec<ConnectionId>),
    /// Recolor a cable
    SetCableColor {
        /// Cable to recolor
        connection: ConnectionId,
        /// New color
        color: CableColor,
        /// Disabled for the current color
        enabled: bool,
    },
}

impl PortMenuItem {
    /// Display text
    pub fn text(&self) -> String {
        match self {
            Self::Label(text) => text.clone(),
            Self::Separator => String::new(),
            Self::DeleteTopCable { .. } => "Delete top cable".to_string(),
            Self::DuplicateTopCable { .. } => "Duplicate top cable".to_string(),
            Self::CreateCableOnTop => "Create cable on top".to_string(),
            Self::CreateCable { label, .. } => format!("Create cable: {}", label),
            Self::GrabCable { other_end, .. } => other_end.to_string(),
            Self::GrabAllCables(_) => "All cables".to_string(),
            Self::SetCableColor { .. } => "Set color".to_string(),
        }
    }

    /// Shortcut hint shown on the right
    pub fn shortcut(&self) -> Option<&'static str> {
        match self {
            Self::DeleteTopCable { .. } => Some("Shift+click"),
            Self::DuplicateTopCable { .. } => Some("Ctrl+Shift+drag"),
            Self::CreateCableOnTop => Some("Ctrl+drag"),
            _ => None,
        }
    }

    /// Whether the item can be activated
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Label(_) | Self::Separator => false,
            Self::DeleteTopCable { enabled } | Self::SetCableColor { enabled, .. } => *enabled,
            Self::DuplicateTopCable { connection } => connection.is_some(),
            _ => true,
        }
    }

    /// Color dot shown next to the text
    pub fn color(&self) -> Option<CableColor> {
        match self {
            Self::CreateCable { color, .. } | Self::GrabCable { color, .. } | Self::SetCableColor { color, .. } => {
                Some(*color)
            }
            _ => None,
        }
    }
}

/// What activating a menu item did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuActivation {
    /// Nothing; the item was disabled or inert
    Nothing,
    /// A drag gesture started on the port
    GestureStarted,
    /// The rack was edited and the edit recorded
    Edited,
}

impl<G: ProcessingGraph> Rack<G> {
    /// Build the context menu for a port
    pub fn port_menu(&self, port: &PortEndpoint) -> Vec<PortMenuItem> {
        let on_port = self.cables.connections_on(port);
        let top = on_port.last().copied();

        let mut items = vec![
            PortMenuItem::Label(port.to_string()),
            PortMenuItem::DeleteTopCable { enabled: top.is_some() },
            PortMenuItem::DuplicateTopCable { connection: top },
            PortMenuItem::CreateCableOnTop,
            PortMenuItem::Separator,
        ];

        for (index, color) in self.palette.colors().iter().enumerate() {
            items.push(PortMenuItem::CreateCable {
                color_index: index,
                label: self.palette.label(index),
                color: *color,
            });
        }

        if on_port.is_empty() {
            return items;
        }

        items.push(PortMenuItem::Separator);
        items.push(PortMenuItem::Label("Click+drag to grab cable".to_string()));

        // Top cable first
        for id in on_port.iter().rev() {
            let Some(connection) = self.cables.get(*id) else {
                continue;
            };
            let Some(other_end) = connection.endpoint(port.direction.opposite()) else {
                continue;
            };
            let submenu = self
                .palette
                .colors()
                .iter()
                .map(|color| PortMenuItem::SetCableColor {
                    connection: *id,
                    color: *color,
                    enabled: *color != connection.color,
                })
                .collect();
            items.push(PortMenuItem::GrabCable {
                connection: *id,
                other_end,
                color: connection.color,
                submenu,
            });
        }

        if on_port.len() > 1 {
            items.push(PortMenuItem::GrabAllCables(on_port));
        }
        items
    }

    /// Tooltip lines for a port: its name, then where each complete cable
    /// on it leads, top cable first
    pub fn port_summary(&self, port: &PortEndpoint) -> Vec<String> {
        let lead = match port.direction {
            PortDirection::Input => "From",
            PortDirection::Output => "To",
        };
        let mut lines = vec![port.to_string()];
        for id in self.cables.connections_on(port).iter().rev() {
            if let Some(other_end) = self.cables.get(*id).and_then(|c| c.endpoint(port.direction.opposite())) {
                lines.push(format!("{} {}", lead, other_end));
            }
        }
        lines
    }

    /// Activate a menu item opened on `port`
    pub fn activate_menu_item(&mut self, port: PortEndpoint, item: &PortMenuItem) -> Result<MenuActivation, RackError> {
        if !item.is_enabled() {
            return Ok(MenuActivation::Nothing);
        }

        let pending = match item {
            PortMenuItem::DeleteTopCable { .. } => {
                return Ok(match self.delete_top_cable(&port) {
                    Some(_) => MenuActivation::Edited,
                    None => MenuActivation::Nothing,
                });
            }
            PortMenuItem::SetCableColor { connection, color, .. } => {
                self.set_cable_color(*connection, *color)?;
                return Ok(MenuActivation::Edited);
            }
            PortMenuItem::DuplicateTopCable { connection } => match connection {
                Some(id) => PendingOverride::CloneCable(*id),
                None => return Ok(MenuActivation::Nothing),
            },
            PortMenuItem::CreateCableOnTop => PendingOverride::CreateCable { color_index: None },
            PortMenuItem::CreateCable { color_index, .. } => PendingOverride::CreateCable {
                color_index: Some(*color_index),
            },
            PortMenuItem::GrabCable { connection, .. } => PendingOverride::GrabCables(vec![*connection]),
            PortMenuItem::GrabAllCables(ids) => PendingOverride::GrabCables(ids.clone()),
            PortMenuItem::Label(_) | PortMenuItem::Separator => return Ok(MenuActivation::Nothing),
        };

        tracing::debug!("Menu item {:?} on {}", item.text(), port);
        self.begin_gesture(port, pending);
        Ok(MenuActivation::GestureStarted)
    }
}
