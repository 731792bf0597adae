// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui rendering of a computed [`RackFrame`].
//!
//! Cables go first, then plugs bottom to top, then the dimming overlay on
//! ports the active drag cannot reach. All positions are rack space and
//! go through the canvas transform here.

use crate::frame::{CableFrame, PlugFrame, RackFrame};
use crate::geometry::CanvasTransform;
use egui::epaint::QuadraticBezierShape;
use egui::{Color32, Pos2, Shape, Stroke, Vec2};

/// Plug body radius
const PLUG_RADIUS: f32 = 9.0;

/// Length of the plug's cable boot, drawn along the plug angle
const PLUG_BOOT_LENGTH: f32 = 12.0;

/// Plug light radius
const PLUG_LIGHT_RADIUS: f32 = 3.0;

/// Port radius, for the dimming overlay
const PORT_RADIUS: f32 = 11.0;

/// Cable shadows sag this much further than the cable
const SHADOW_OFFSET: Vec2 = Vec2::new(0.0, 30.0);

/// Shadow opacity before the cable's own alpha
const SHADOW_ALPHA: f32 = 0.1;

/// Overlay drawn over dimmed ports
const DIMMED_PORT_OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 128);

/// Paint a frame
pub fn paint_frame(painter: &egui::Painter, frame: &RackFrame, transform: &CanvasTransform) {
    painter.extend(frame_shapes(frame, transform));
}

/// Shapes for a frame, in paint order
pub fn frame_shapes(frame: &RackFrame, transform: &CanvasTransform) -> Vec<Shape> {
    let mut shapes = Vec::new();

    for cable in frame.cables.iter().filter(|c| c.is_visible()) {
        cable_shapes(&mut shapes, cable, transform);
    }

    for plug in &frame.plugs {
        plug_shapes(&mut shapes, plug, transform);
    }

    for (_, center) in &frame.dimmed_ports {
        shapes.push(Shape::circle_filled(
            transform.rack_to_screen(*center),
            PORT_RADIUS * transform.zoom,
            DIMMED_PORT_OVERLAY,
        ));
    }

    shapes
}

fn cable_shapes(shapes: &mut Vec<Shape>, cable: &CableFrame, transform: &CanvasTransform) {
    let points = [cable.start, cable.slump, cable.end].map(|p| transform.rack_to_screen(p));
    let width = cable.thickness * transform.zoom;
    let inner = ((cable.thickness - 1.0) * transform.zoom).max(1.0);
    let alpha = cable.alpha();

    let shadow_slump = transform.rack_to_screen(cable.slump + SHADOW_OFFSET);
    let shadow = Color32::from_black_alpha((SHADOW_ALPHA * alpha * 255.0).round() as u8);
    shapes.push(bezier([points[0], shadow_slump, points[2]], Stroke::new(inner, shadow)));

    let outline = cable.color.scaled(0.8).to_color32(alpha);
    shapes.push(bezier(points, Stroke::new(width, outline)));
    let body = cable.color.scaled(0.95).to_color32(alpha);
    shapes.push(bezier(points, Stroke::new(inner, body)));
}

fn plug_shapes(shapes: &mut Vec<Shape>, plug: &PlugFrame, transform: &CanvasTransform) {
    let center = transform.rack_to_screen(plug.pos);
    let zoom = transform.zoom;
    let color = plug.color.to_color32(1.0);

    let boot = center + Vec2::angled(plug.angle) * PLUG_BOOT_LENGTH * zoom;
    shapes.push(Shape::line_segment([center, boot], Stroke::new(PLUG_RADIUS * zoom, color)));
    shapes.push(Shape::circle_filled(center, PLUG_RADIUS * zoom, color));
    shapes.push(Shape::circle_stroke(
        center,
        PLUG_RADIUS * zoom,
        Stroke::new(1.0, Color32::from_gray(30)),
    ));

    if plug.top && plug.lights.iter().any(|l| *l > 0.0) {
        let [r, g, b] = plug.lights.map(|l| (l.clamp(0.0, 1.0) * 255.0) as u8);
        shapes.push(Shape::circle_filled(
            center,
            PLUG_LIGHT_RADIUS * zoom,
            Color32::from_rgb(r, g, b),
        ));
    }
}

fn bezier(points: [Pos2; 3], stroke: Stroke) -> Shape {
    Shape::QuadraticBezier(QuadraticBezierShape::from_points_stroke(
        points,
        false,
        Color32::TRANSPARENT,
        stroke,
    ))
}
