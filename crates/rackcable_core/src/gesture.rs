// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port drag gestures: creating, grabbing, cloning and dropping cables.
//!
//! A gesture is one pointer-down to pointer-up sequence that started on a
//! port. The event loop reports it as discrete callbacks:
//!
//! - [`Rack::drag_start`] on the origin port
//! - [`Rack::pointer_moved`] every time the pointer moves
//! - [`Rack::drag_enter`] / [`Rack::drag_leave`] on ports passed over
//! - [`Rack::drag_drop`] on the port under the pointer at release
//! - [`Rack::drag_end`] on the origin port
//!
//! Loose cables are removed at the end of every gesture, which is also the
//! only way a gesture gets cancelled. All history produced by one gesture
//! is pushed as a single undo entry.

use crate::connection::{CableConnection, ConnectionId};
use crate::endpoint::{PortDirection, PortEndpoint};
use crate::engine::ProcessingGraph;
use crate::history::{CableAction, CableSnapshot, ComplexAction};
use crate::menu::PortMenuItem;
use crate::rack::Rack;
use egui::Pos2;

/// History name of a gesture batch
const GESTURE_NAME: &str = "move cable";

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Middle button
    Middle,
}

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift
    pub shift: bool,
    /// Ctrl (Cmd on macOS)
    pub ctrl: bool,
    /// Alt
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };
    /// Shift only
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
    /// Ctrl only
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
    /// Ctrl and Shift
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        ctrl: true,
        alt: false,
    };
}

/// Where a drag started. Only drags from ports carry cables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrigin {
    /// A port; a cable end is being dragged
    Port(PortEndpoint),
    /// Any other widget
    Other,
}

impl DragOrigin {
    /// The origin port, if the drag carries a cable
    pub fn port(&self) -> Option<PortEndpoint> {
        match self {
            Self::Port(port) => Some(*port),
            Self::Other => None,
        }
    }
}

/// Override for the next gesture start on a port, set by menu items.
///
/// Consumed by the next [`Rack::drag_start`] on that port and reset
/// whatever the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingOverride {
    /// Use modifier keys as usual
    #[default]
    None,
    /// Start a new cable, optionally with a palette color
    CreateCable {
        /// Palette index of the color to use
        color_index: Option<usize>,
    },
    /// Clone this connection instead of the top one
    CloneCable(ConnectionId),
    /// Grab these connections instead of the top one
    GrabCables(Vec<ConnectionId>),
}

/// Where a port's gesture is at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GesturePhase {
    /// No gesture
    #[default]
    Idle,
    /// Dragging over empty canvas
    Dragging,
    /// Dragging over a candidate port
    Hovering(PortEndpoint),
    /// Released over a port
    Dropped(PortEndpoint),
}

/// What a finished gesture did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEnd {
    /// Whether the gesture was released over a port
    pub dropped: bool,
    /// Loose cables removed
    pub loose_removed: usize,
    /// Whether an undo entry was pushed
    pub recorded: bool,
}

/// What a button press on a port did
#[derive(Debug, Clone, PartialEq)]
pub enum PortButtonOutcome {
    /// Right click: the port's context menu
    ContextMenu(Vec<PortMenuItem>),
    /// Shift+left click: the deleted top cable, if any. No drag follows.
    DeletedTopCable(Option<ConnectionId>),
    /// Not handled; a left press may go on to start a drag
    Ignored,
}

/// Per-port gesture state
#[derive(Debug, Default)]
pub struct PortController {
    pending: PendingOverride,
    /// Direction of the loose cable end(s) while dragging
    dragged_direction: Option<PortDirection>,
    /// History batch, alive from drag start to drag end
    batch: Option<ComplexAction>,
    phase: GesturePhase,
}

impl PortController {
    /// Current phase
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Direction of the loose end while dragging
    pub fn dragged_direction(&self) -> Option<PortDirection> {
        self.dragged_direction
    }

    /// Whether a gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.batch.is_some()
    }
}

enum StartIntent {
    Create(Option<usize>),
    Clone(Option<ConnectionId>),
    Grab(Vec<ConnectionId>),
}

impl StartIntent {
    fn resolve(pending: PendingOverride, mods: Modifiers) -> Self {
        match (pending, mods) {
            (PendingOverride::CreateCable { color_index }, _) => Self::Create(color_index),
            (_, Modifiers::CTRL) => Self::Create(None),
            (PendingOverride::CloneCable(id), _) => Self::Clone(Some(id)),
            (_, Modifiers::CTRL_SHIFT) => Self::Clone(None),
            (PendingOverride::GrabCables(ids), _) => Self::Grab(ids),
            (PendingOverride::None, _) => Self::Grab(Vec::new()),
        }
    }
}

impl<G: ProcessingGraph> Rack<G> {
    /// Gesture state of a port
    pub fn controller(&self, port: &PortEndpoint) -> Option<&PortController> {
        self.controllers.get(port)
    }

    /// Arm a one-shot override for the next gesture start on `port`
    pub fn arm_override(&mut self, port: PortEndpoint, pending: PendingOverride) {
        self.controllers.entry(port).or_default().pending = pending;
    }

    /// Start a left-button gesture on `port` as if it had been pressed,
    /// with `pending` in effect
    pub fn begin_gesture(&mut self, port: PortEndpoint, pending: PendingOverride) {
        self.arm_override(port, pending);
        self.drag_start(port, MouseButton::Left, Modifiers::NONE);
    }

    /// Button press on a port
    pub fn port_button(&mut self, port: PortEndpoint, button: MouseButton, mods: Modifiers) -> PortButtonOutcome {
        match button {
            MouseButton::Right => PortButtonOutcome::ContextMenu(self.port_menu(&port)),
            MouseButton::Left if mods == Modifiers::SHIFT => {
                PortButtonOutcome::DeletedTopCable(self.delete_top_cable(&port))
            }
            _ => PortButtonOutcome::Ignored,
        }
    }

    /// Pointer entered a port outside of a drag
    pub fn port_enter(&mut self, port: PortEndpoint) {
        self.hovered_port = Some(port);
    }

    /// Pointer left a port outside of a drag
    pub fn port_leave(&mut self, port: PortEndpoint) {
        if self.hovered_port == Some(port) {
            self.hovered_port = None;
        }
    }

    /// Pointer moved, in screen space
    pub fn pointer_moved(&mut self, screen_pos: Pos2) {
        self.pointer = self.transform.screen_to_rack(screen_pos);
    }

    /// A drag started on `port`
    pub fn drag_start(&mut self, port: PortEndpoint, button: MouseButton, mods: Modifiers) {
        if button != MouseButton::Left {
            return;
        }

        let mut controller = self.controllers.remove(&port).unwrap_or_default();
        let pending = std::mem::take(&mut controller.pending);

        if controller.batch.is_some() {
            tracing::warn!("Discarding unfinished gesture on {}", port);
        }
        controller.batch = Some(ComplexAction::new(GESTURE_NAME));

        let mut reused = Vec::new();
        match StartIntent::resolve(pending, mods) {
            StartIntent::Create(color_index) => {
                if let Some(index) = color_index {
                    self.palette.set_next(index);
                }
            }
            StartIntent::Clone(source) => {
                if let Some(id) = self.clone_cable(port, source) {
                    controller.dragged_direction = Some(port.direction);
                    reused.push(id);
                }
            }
            StartIntent::Grab(ids) => {
                let ids = if ids.is_empty() {
                    self.cables.top_connection(&port).into_iter().collect()
                } else {
                    ids
                };
                for id in ids {
                    if self.grab_cable(port, id, &mut controller) {
                        reused.push(id);
                    }
                }
            }
        }

        // Nothing grabbed or cloned: start a new cable from this port
        if reused.is_empty() {
            let mut connection = CableConnection::new(self.palette.next_color());
            connection.set_endpoint(port.direction, Some(port));
            self.cables.add(connection);
            controller.dragged_direction = Some(port.direction.opposite());
        }

        controller.phase = GesturePhase::Dragging;
        tracing::debug!(
            "Drag started on {}, {} cable(s) reused, dragging {:?} end",
            port,
            reused.len(),
            controller.dragged_direction
        );
        self.controllers.insert(port, controller);
    }

    /// A drag from `origin` entered `target`
    pub fn drag_enter(&mut self, target: PortEndpoint, button: MouseButton, origin: DragOrigin) {
        if button != MouseButton::Left {
            return;
        }
        let Some(origin_port) = origin.port() else {
            return;
        };

        for id in self.cables.incomplete_connections() {
            if self.can_bind(id, &target) {
                if let Some(connection) = self.cables.get_mut(id) {
                    connection.set_hovered(target.direction, Some(target));
                }
            }
        }
        if let Some(controller) = self.controllers.get_mut(&origin_port) {
            controller.phase = GesturePhase::Hovering(target);
        }
    }

    /// A drag from `origin` left `target`
    pub fn drag_leave(&mut self, target: PortEndpoint, button: MouseButton, origin: DragOrigin) {
        if button != MouseButton::Left {
            return;
        }
        let Some(origin_port) = origin.port() else {
            return;
        };

        for id in self.cables.incomplete_connections() {
            if let Some(connection) = self.cables.get_mut(id) {
                connection.set_hovered(target.direction, None);
            }
        }
        if let Some(controller) = self.controllers.get_mut(&origin_port) {
            if controller.phase == GesturePhase::Hovering(target) {
                controller.phase = GesturePhase::Dragging;
            }
        }
    }

    /// A drag from `origin` was released over `target`. Returns how many
    /// loose cables were plugged in.
    pub fn drag_drop(&mut self, target: PortEndpoint, button: MouseButton, origin: DragOrigin) -> usize {
        if button != MouseButton::Left {
            return 0;
        }
        let Some(origin_port) = origin.port() else {
            return 0;
        };

        let mut bound = 0;
        for id in self.cables.incomplete_connections() {
            let allowed = self.can_bind(id, &target);
            let Some(connection) = self.cables.get_mut(id) else {
                continue;
            };
            connection.clear_hovered();
            if !allowed {
                continue;
            }

            connection.set_endpoint(target.direction, Some(target));
            if let Err(e) = connection.update_cable(&mut self.graph) {
                tracing::warn!("Could not plug cable into {}: {}", target, e);
                connection.set_endpoint(target.direction, None);
                continue;
            }
            bound += 1;

            let snapshot = CableSnapshot::of(connection);
            let batch = self.controllers.get_mut(&origin_port).and_then(|c| c.batch.as_mut());
            if let (Some(batch), Some(snapshot)) = (batch, snapshot) {
                if batch.record_add(snapshot) {
                    tracing::debug!("Cable returned to {}, nothing to record", target);
                }
            }
        }

        if let Some(controller) = self.controllers.get_mut(&origin_port) {
            controller.phase = GesturePhase::Dropped(target);
        }
        bound
    }

    /// The drag that started on `port` ended
    pub fn drag_end(&mut self, port: PortEndpoint, button: MouseButton) -> Option<GestureEnd> {
        if button != MouseButton::Left {
            return None;
        }

        // Remove all incomplete cables
        let loose = self.cables.incomplete_connections();
        for id in &loose {
            self.remove_connection(*id);
        }

        let mut controller = self.controllers.remove(&port).unwrap_or_default();
        let recorded = match controller.batch.take().and_then(ComplexAction::finalize) {
            Some(action) => {
                self.history.push(action);
                true
            }
            None => false,
        };
        let dropped = matches!(controller.phase, GesturePhase::Dropped(_));
        controller.phase = GesturePhase::Idle;
        controller.dragged_direction = None;
        if controller.pending != PendingOverride::None {
            self.controllers.insert(port, controller);
        }

        tracing::debug!(
            "Drag ended on {}: dropped={}, loose={}, recorded={}",
            port,
            dropped,
            loose.len(),
            recorded
        );
        Some(GestureEnd {
            dropped,
            loose_removed: loose.len(),
            recorded,
        })
    }

    /// Direction of the loose end of the active left drag, if any
    pub fn active_drag_direction(&self) -> Option<PortDirection> {
        self.controllers
            .values()
            .filter(|c| c.is_dragging())
            .find_map(PortController::dragged_direction)
    }

    /// Whether plugging `target` into incomplete connection `id` is allowed:
    /// right direction, and no complete connection already joins the pair.
    fn can_bind(&self, id: ConnectionId, target: &PortEndpoint) -> bool {
        let Some(connection) = self.cables.get(id) else {
            return false;
        };
        match target.direction {
            PortDirection::Output => {
                connection.output().is_none()
                    && connection
                        .input()
                        .is_some_and(|input| self.cables.find_connection(target, &input).is_none())
            }
            PortDirection::Input => {
                connection.input().is_none()
                    && connection
                        .output()
                        .is_some_and(|output| self.cables.find_connection(&output, target).is_none())
            }
        }
    }

    /// Start a copy of `source` (or the top cable) that keeps the far end
    /// and leaves this port's end loose
    fn clone_cable(&mut self, port: PortEndpoint, source: Option<ConnectionId>) -> Option<ConnectionId> {
        let source = source.or_else(|| self.cables.top_connection(&port))?;
        let source = self.cables.get(source)?;
        let far = port.direction.opposite();
        let far_end = source.endpoint(far)?;

        let mut connection = CableConnection::new(source.color);
        connection.set_endpoint(far, Some(far_end));
        Some(self.cables.add(connection))
    }

    /// Pull this port's end of a connection out. Records the removal.
    fn grab_cable(&mut self, port: PortEndpoint, id: ConnectionId, controller: &mut PortController) -> bool {
        let Some(connection) = self.cables.get_mut(id) else {
            return false;
        };
        if !connection.touches(&port) {
            tracing::debug!("Connection {:?} is not on {}, not grabbing", id, port);
            return false;
        }

        if let (Some(batch), Some(snapshot)) = (controller.batch.as_mut(), CableSnapshot::of(connection)) {
            batch.push(CableAction::Remove(snapshot));
        }

        connection.set_endpoint(port.direction, None);
        if let Err(e) = connection.update_cable(&mut self.graph) {
            tracing::warn!("Could not detach cable from {}: {}", port, e);
        }
        controller.dragged_direction = Some(port.direction);

        // Grabbed cable goes to the top of the stack
        self.cables.promote_to_top(id);
        true
    }
}
