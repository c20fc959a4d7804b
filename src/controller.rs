use glam::Vec2;

use crate::camera::{CameraInput, MoveDirection};
use crate::config::RendererConfig;

/// Translates key tags and pointer motion into camera requests.
///
/// Pointer deltas are differences between successive positions; the first
/// event after a tracking gap has no reference point and contributes zero.
pub struct KeyboardCameraController {
    azimuth_sensitivity: f32,
    elevation_sensitivity: f32,
    pointer_position: Option<Vec2>,
}

impl KeyboardCameraController {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            azimuth_sensitivity: config.azimuth_sensitivity,
            elevation_sensitivity: config.elevation_sensitivity,
            pointer_position: None,
        }
    }

    pub fn key_down(&self, camera: &mut impl CameraInput, direction: MoveDirection) {
        camera.set_directional_move(Some(direction));
    }

    pub fn key_up(&self, camera: &mut impl CameraInput) {
        camera.set_directional_move(None);
    }

    pub fn pointer_moved(&mut self, camera: &mut impl CameraInput, position: Vec2) {
        if let Some(previous) = self.pointer_position {
            let delta = position - previous;
            camera.apply_rotation_delta(
                self.azimuth_sensitivity * delta.x,
                self.elevation_sensitivity * delta.y,
            );
        }
        self.pointer_position = Some(position);
    }

    /// Forget the pointer reference point, e.g. on focus loss or when the
    /// cursor leaves the surface. The next move event contributes zero.
    pub fn reset_pointer(&mut self) {
        self.pointer_position = None;
    }
}

/// Finger roles for the touch modality: the first touch on the left half of
/// the viewport moves, the first on the right half looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchRole {
    Move,
    Look,
}

/// Translates two-finger touch input into camera requests.
///
/// Roles are tracked by touch identity. Losing a tracked touch clears that
/// role only; any touch beyond the two tracked ones is ignored.
pub struct TouchCameraController {
    azimuth_sensitivity: f32,
    elevation_sensitivity: f32,
    viewport_width: f32,
    move_finger: Option<(u64, Vec2)>,
    look_finger: Option<(u64, Vec2)>,
}

impl TouchCameraController {
    pub fn new(config: &RendererConfig, viewport_width: f32) -> Self {
        Self {
            azimuth_sensitivity: config.azimuth_sensitivity,
            elevation_sensitivity: config.elevation_sensitivity,
            viewport_width,
            move_finger: None,
            look_finger: None,
        }
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.viewport_width = viewport_width;
    }

    fn half(&self) -> f32 {
        self.viewport_width / 2.0
    }

    fn role_of(&self, id: u64) -> Option<TouchRole> {
        if self.move_finger.map(|(tracked, _)| tracked) == Some(id) {
            Some(TouchRole::Move)
        } else if self.look_finger.map(|(tracked, _)| tracked) == Some(id) {
            Some(TouchRole::Look)
        } else {
            None
        }
    }

    pub fn touch_began(&mut self, id: u64, position: Vec2) {
        if self.role_of(id).is_some() {
            return;
        }
        if self.look_finger.is_none() && position.x > self.half() {
            self.look_finger = Some((id, position));
        } else if self.move_finger.is_none() && position.x < self.half() {
            self.move_finger = Some((id, position));
        }
        // A third touch, or one landing exactly on the seam, takes no role.
    }

    pub fn touch_moved(&mut self, camera: &mut impl CameraInput, id: u64, position: Vec2) {
        if let Some((tracked, previous)) = self.look_finger {
            if tracked == id {
                // The reference point advances even when the finger strays
                // across the seam; rotation only applies on the look half.
                if position.x > self.half() {
                    let delta = position - previous;
                    camera.apply_rotation_delta(
                        self.azimuth_sensitivity * delta.x,
                        self.elevation_sensitivity * delta.y,
                    );
                }
                self.look_finger = Some((id, position));
                return;
            }
        }
        if let Some((tracked, previous)) = self.move_finger {
            if tracked == id {
                if position.x < self.half() {
                    camera.set_freeform_move(position - previous);
                }
                self.move_finger = Some((id, position));
            }
        }
    }

    pub fn touch_ended(&mut self, camera: &mut impl CameraInput, id: u64) {
        match self.role_of(id) {
            Some(TouchRole::Move) => {
                self.move_finger = None;
                camera.set_directional_move(None);
            }
            Some(TouchRole::Look) => {
                self.look_finger = None;
            }
            None => {}
        }
    }
}
