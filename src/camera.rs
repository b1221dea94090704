use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Radians of rotation per pixel of pointer travel.
pub const ROTATE_SPEED: f32 = 0.01;
/// Zoom change per wheel delta unit.
pub const ZOOM_SPEED: f32 = 0.001;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;

/// Orbit camera state read by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Accumulated rotation about X (`x`) and Y (`y`), never wrapped.
    pub rotation: Vec2,
    /// Uniform model scale, kept in `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f32,
    pub is_dragging: bool,
    pub last_pointer: Vec2,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            rotation: Vec2::ZERO,
            zoom: 1.0,
            is_dragging: false,
            last_pointer: Vec2::ZERO,
        }
    }
}

/// Turns pointer drags into rotation and wheel deltas into zoom.
///
/// Rotation stops as soon as the drag ends; there is no inertia.
#[derive(Debug, Clone, Default)]
pub struct OrbitCamera {
    state: CameraState,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.state.is_dragging = true;
        self.state.last_pointer = position;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if !self.state.is_dragging {
            return;
        }
        let delta = position - self.state.last_pointer;
        self.state.rotation.x += delta.y * ROTATE_SPEED;
        self.state.rotation.y += delta.x * ROTATE_SPEED;
        self.state.last_pointer = position;
    }

    /// Ends a drag. Also used when the pointer leaves the surface.
    pub fn pointer_up(&mut self) {
        self.state.is_dragging = false;
    }

    pub fn wheel(&mut self, delta: f32) {
        self.state.zoom = (self.state.zoom - delta * ZOOM_SPEED).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Clears rotation. Zoom is kept.
    pub fn reset(&mut self) {
        self.state.rotation = Vec2::ZERO;
    }

    /// Zoom as a whole percentage, for overlay labels.
    pub fn zoom_percent(&self) -> u32 {
        (self.state.zoom * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_drag_rotates_about_y_only() {
        let mut camera = OrbitCamera::new();
        camera.pointer_down(Vec2::new(10.0, 20.0));
        camera.pointer_move(Vec2::new(110.0, 20.0));
        assert_eq!(camera.state().rotation.y, 1.0);
        assert_eq!(camera.state().rotation.x, 0.0);
        assert_eq!(camera.state().last_pointer, Vec2::new(110.0, 20.0));
    }

    #[test]
    fn vertical_drag_rotates_about_x() {
        let mut camera = OrbitCamera::new();
        camera.pointer_down(Vec2::ZERO);
        camera.pointer_move(Vec2::new(0.0, -50.0));
        assert!((camera.state().rotation.x + 0.5).abs() < 1e-6);
        assert_eq!(camera.state().rotation.y, 0.0);
    }

    #[test]
    fn moves_without_drag_are_ignored() {
        let mut camera = OrbitCamera::new();
        camera.pointer_move(Vec2::new(300.0, 300.0));
        assert_eq!(camera.state().rotation, Vec2::ZERO);

        camera.pointer_down(Vec2::ZERO);
        camera.pointer_up();
        camera.pointer_move(Vec2::new(300.0, 300.0));
        assert_eq!(camera.state().rotation, Vec2::ZERO);
        assert!(!camera.state().is_dragging);
    }

    #[test]
    fn rotation_accumulates_without_wrapping() {
        let mut camera = OrbitCamera::new();
        camera.pointer_down(Vec2::ZERO);
        for step in 1..=10 {
            camera.pointer_move(Vec2::new(step as f32 * 100.0, 0.0));
        }
        assert!((camera.state().rotation.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_clamps_at_both_ends() {
        let mut camera = OrbitCamera::new();
        for _ in 0..500 {
            camera.wheel(-100.0);
        }
        assert_eq!(camera.state().zoom, MAX_ZOOM);
        assert_eq!(camera.zoom_percent(), 300);

        for _ in 0..500 {
            camera.wheel(100.0);
        }
        assert_eq!(camera.state().zoom, MIN_ZOOM);
    }

    #[test]
    fn single_wheel_step_scales_by_speed() {
        let mut camera = OrbitCamera::new();
        camera.wheel(100.0);
        assert!((camera.state().zoom - 0.9).abs() < 1e-6);
    }

    #[test]
    fn reset_keeps_zoom() {
        let mut camera = OrbitCamera::new();
        camera.pointer_down(Vec2::ZERO);
        camera.pointer_move(Vec2::new(40.0, 70.0));
        camera.wheel(-500.0);
        camera.reset();
        assert_eq!(camera.state().rotation, Vec2::ZERO);
        assert!((camera.state().zoom - 1.5).abs() < 1e-6);
    }
}
