// SPDX-License-Identifier: MIT OR Apache-2.0
//! Patch cables for a modular synthesizer rack.
//!
//! This crate models the cables a user drags between module ports:
//! - Visual connections and their plugs, stacked per port
//! - Drag gestures that create, grab, clone and drop cables
//! - Undo/redo of cable edits, one entry per gesture
//! - Port context menus, colors and settings
//! - Save/load of cables against a live module graph
//!
//! ## Architecture
//!
//! A [`Rack`] owns the connection registry, the history, the palette and
//! the processing graph it registers engine cables with. The graph sits
//! behind the [`ProcessingGraph`] trait; [`Engine`] is an in-memory
//! implementation. Everything runs on one thread, driven by the event
//! loop through discrete callbacks.

pub mod endpoint;
pub mod cable;
pub mod engine;
pub mod color;
pub mod settings;
pub mod geometry;
pub mod connection;
pub mod registry;
pub mod history;
pub mod rack;
pub mod gesture;
pub mod menu;
pub mod frame;
pub mod persistence;
pub mod ui;

pub use endpoint::{ModuleId, PortDirection, PortEndpoint};
pub use cable::{Cable, CableId};
pub use engine::{Engine, EngineError, ProcessingGraph};
pub use color::{CableColor, CablePalette};
pub use settings::CableSettings;
pub use connection::{CableConnection, ConnectionId, ConnectionState};
pub use registry::ConnectionRegistry;
pub use history::{CableAction, History, HistoryAction};
pub use rack::{Rack, RackError};
pub use gesture::{DragOrigin, Modifiers, MouseButton, PendingOverride};
pub use menu::PortMenuItem;
pub use frame::RackFrame;
pub use persistence::{LoadReport, PatchCable};
