use std::f32::consts::PI;
use glam::{Vec2, Vec3};
use crate::renderer::util::spherical_to_cartesian;

/// Which drag gesture a pointer move belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Zoom,
}

/// Orbit parameters of the camera around the origin plus the last pointer position
pub struct CameraController {
    theta: f32,
    phi: f32,
    radius: f32,
    last_pointer_pos: Vec2,

    rotation_sensitivity: f32,
    zoom_sensitivity: f32,
}

impl CameraController {
    pub const MIN_PHI: f32 = 0.1;
    pub const MAX_PHI: f32 = PI - 0.1;
    pub const MIN_RADIUS: f32 = 3.0;
    pub const MAX_RADIUS: f32 = 15.0;

    pub fn new() -> Self {
        Self {
            theta: 1.5 * PI,
            phi: 0.25 * PI,
            radius: 5.0,
            last_pointer_pos: Vec2::ZERO,

            // A quarter of a degree per pixel
            rotation_sensitivity: 0.25_f32.to_radians(),
            // 0.005 world units per pixel
            zoom_sensitivity: 0.005,
        }
    }

    #[cfg(test)]
    pub fn get_theta(&self) -> f32 {
        self.theta
    }

    #[cfg(test)]
    pub fn get_phi(&self) -> f32 {
        self.phi
    }

    #[cfg(test)]
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn get_eye_position(&self) -> Vec3 {
        spherical_to_cartesian(self.radius, self.theta, self.phi)
    }

    pub fn on_pointer_down(&mut self, pos: Vec2) {
        self.last_pointer_pos = pos;
    }

    pub fn on_pointer_up(&mut self, pos: Vec2) {
        self.last_pointer_pos = pos;
    }

    pub fn on_pointer_move(&mut self, mode: Option<DragMode>, pos: Vec2) {
        let delta = pos - self.last_pointer_pos;

        match mode {
            Some(DragMode::Orbit) => {
                self.theta += delta.x * self.rotation_sensitivity;
                self.phi = (self.phi + delta.y * self.rotation_sensitivity)
                    .clamp(Self::MIN_PHI, Self::MAX_PHI);
            }
            Some(DragMode::Zoom) => {
                let dx = delta.x * self.zoom_sensitivity;
                let dy = delta.y * self.zoom_sensitivity;
                self.radius = (self.radius + dx - dy)
                    .clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
            }
            None => {}
        }

        self.last_pointer_pos = pos;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(controller: &mut CameraController, mode: DragMode, from: Vec2, to: Vec2) {
        controller.on_pointer_down(from);
        controller.on_pointer_move(Some(mode), to);
        controller.on_pointer_up(to);
    }

    #[test]
    fn starts_at_default_orbit() {
        let c = CameraController::new();
        assert_eq!(c.get_theta(), 1.5 * PI);
        assert_eq!(c.get_phi(), 0.25 * PI);
        assert_eq!(c.get_radius(), 5.0);
    }

    #[test]
    fn orbit_maps_pixels_to_quarter_degrees() {
        let mut c = CameraController::new();
        drag(&mut c, DragMode::Orbit, Vec2::ZERO, Vec2::new(40.0, 20.0));
        assert!((c.get_theta() - (1.5 * PI + 10.0_f32.to_radians())).abs() < 1e-5);
        assert!((c.get_phi() - (0.25 * PI + 5.0_f32.to_radians())).abs() < 1e-5);
    }

    #[test]
    fn phi_stays_away_from_poles() {
        let deltas = [-100_000.0, -720.0, -1.0, 0.0, 3.0, 360.0, 99_999.0];
        for dy in deltas {
            let mut c = CameraController::new();
            drag(&mut c, DragMode::Orbit, Vec2::ZERO, Vec2::new(0.0, dy));
            assert!(c.get_phi() >= CameraController::MIN_PHI, "dy = {dy}");
            assert!(c.get_phi() <= CameraController::MAX_PHI, "dy = {dy}");
        }
    }

    #[test]
    fn radius_stays_in_range() {
        let deltas = [
            Vec2::new(10_000.0, 0.0),
            Vec2::new(0.0, 10_000.0),
            Vec2::new(-10_000.0, -10_000.0),
            Vec2::new(100.0, -100.0),
        ];
        for delta in deltas {
            let mut c = CameraController::new();
            for _ in 0..5 {
                let start = Vec2::new(500.0, 500.0);
                drag(&mut c, DragMode::Zoom, start, start + delta);
            }
            assert!(c.get_radius() >= CameraController::MIN_RADIUS);
            assert!(c.get_radius() <= CameraController::MAX_RADIUS);
        }
    }

    #[test]
    fn zoom_adds_dx_minus_dy() {
        let mut c = CameraController::new();
        drag(&mut c, DragMode::Zoom, Vec2::ZERO, Vec2::new(100.0, -100.0));
        assert!((c.get_radius() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn hover_only_tracks_pointer() {
        let mut c = CameraController::new();
        c.on_pointer_move(None, Vec2::new(300.0, 300.0));
        assert_eq!(c.get_theta(), 1.5 * PI);
        assert_eq!(c.get_radius(), 5.0);
        // Next drag starts from the hovered position
        c.on_pointer_move(Some(DragMode::Orbit), Vec2::new(304.0, 300.0));
        assert!((c.get_theta() - (1.5 * PI + 1.0_f32.to_radians())).abs() < 1e-5);
    }
}
