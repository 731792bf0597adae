// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas coordinates and cable curve geometry.

use egui::{Pos2, Vec2};

/// Base sag of a cable midpoint at zero tension
const SLUMP_BASE: f32 = 150.0;

/// Extra sag per unit of endpoint distance at zero tension
const SLUMP_PER_DISTANCE: f32 = 1.0;

/// Maps screen space to rack-canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    /// Screen position of the rack origin
    pub offset: Vec2,
    /// Screen pixels per rack unit
    pub zoom: f32,
}

impl CanvasTransform {
    /// Create a transform
    pub fn new(offset: Vec2, zoom: f32) -> Self {
        Self { offset, zoom }
    }

    /// Convert screen position to rack position
    pub fn screen_to_rack(&self, screen_pos: Pos2) -> Pos2 {
        ((screen_pos.to_vec2() - self.offset) / self.zoom).to_pos2()
    }

    /// Convert rack position to screen position
    pub fn rack_to_screen(&self, rack_pos: Pos2) -> Pos2 {
        (rack_pos.to_vec2() * self.zoom + self.offset).to_pos2()
    }
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }
}

/// The sagging control point of a cable between two plugs.
///
/// Lower tension and longer cables sag further.
pub fn slump_pos(a: Pos2, b: Pos2, tension: f32) -> Pos2 {
    let dist = a.distance(b);
    let mut avg = a.lerp(b, 0.5);
    avg.y += (1.0 - tension) * (SLUMP_BASE + SLUMP_PER_DISTANCE * dist);
    avg
}

/// Angle of a plug at `plug` whose cable heads towards `slump`
pub fn plug_angle(plug: Pos2, slump: Pos2) -> f32 {
    (slump - plug).angle()
}

/// Move `from` by `dist` towards `to`. Stays put when the points coincide.
pub fn pull_towards(from: Pos2, to: Pos2, dist: f32) -> Pos2 {
    let dir = to - from;
    if dir.length_sq() == 0.0 {
        return from;
    }
    from + dir.normalized() * dist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_round_trip() {
        let transform = CanvasTransform::new(Vec2::new(100.0, 50.0), 2.0);
        let rack = transform.screen_to_rack(Pos2::new(300.0, 250.0));
        assert_eq!(rack, Pos2::new(100.0, 100.0));
        assert_eq!(transform.rack_to_screen(rack), Pos2::new(300.0, 250.0));
    }

    #[test]
    fn test_slump_sags_with_distance() {
        let a = Pos2::new(0.0, 0.0);
        let near = slump_pos(a, Pos2::new(10.0, 0.0), 0.5);
        let far = slump_pos(a, Pos2::new(200.0, 0.0), 0.5);
        assert_eq!(near.x, 5.0);
        assert_eq!(near.y, 0.5 * (150.0 + 10.0));
        assert!(far.y > near.y);
    }

    #[test]
    fn test_full_tension_is_straight() {
        let slump = slump_pos(Pos2::new(0.0, 0.0), Pos2::new(100.0, 40.0), 1.0);
        assert_eq!(slump, Pos2::new(50.0, 20.0));
    }

    #[test]
    fn test_plug_points_down_at_slack_cable() {
        let plug = Pos2::new(0.0, 0.0);
        let slump = Pos2::new(0.0, 100.0);
        assert!((plug_angle(plug, slump) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_pull_towards() {
        let pulled = pull_towards(Pos2::new(0.0, 0.0), Pos2::new(0.0, 100.0), 14.0);
        assert_eq!(pulled, Pos2::new(0.0, 14.0));
        assert_eq!(pull_towards(Pos2::ZERO, Pos2::ZERO, 14.0), Pos2::ZERO);
    }
}
