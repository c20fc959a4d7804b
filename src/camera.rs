use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

use crate::config::RendererConfig;
use crate::math;

/// Keeps the elevation angle away from +-pi/2, where the right vector
/// (forward x up) degenerates and the basis collapses to NaNs.
pub const GIMBAL_EPSILON: f32 = 1e-4;

const ELEVATION_LIMIT: f32 = FRAC_PI_2 - GIMBAL_EPSILON;

/// Direction classes for discrete (key-driven) movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
}

/// The camera's pending displacement request for the current tick.
///
/// `Directional` is level-triggered: it stays active until a key-up clears
/// it. `Freeform` is edge-triggered: `update_state` consumes it once and
/// resets to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MoveRequest {
    #[default]
    None,
    Directional(MoveDirection),
    Freeform(Vec2),
}

/// The narrow input sink the camera controllers drive.
///
/// Implemented by [`Camera`] for same-thread use and by
/// [`crate::input::InputMailbox`] when events arrive off the tick thread.
pub trait CameraInput {
    /// Accumulate a rotation delta into the azimuth/elevation angles.
    fn apply_rotation_delta(&mut self, d_azimuth: f32, d_elevation: f32);

    /// Set or clear the active discrete direction. A new direction replaces
    /// the previous one; there is never more than one active at a time.
    fn set_directional_move(&mut self, direction: Option<MoveDirection>);

    /// Queue a one-shot drag displacement in local (x right, y down) pixels.
    fn set_freeform_move(&mut self, delta: Vec2);
}

/// First-person camera.
///
/// Angles accumulate from input deltas; the view basis is rederived from
/// sin/cos every tick, so repeated rotation never drifts the way an
/// incrementally multiplied rotation matrix would.
pub struct Camera {
    position: Vec3,
    /// Azimuth w.r.t. the -z axis, free-running.
    azimuth: f32,
    /// Elevation w.r.t. the x-z plane, clamped to (-pi/2, pi/2) open.
    elevation: f32,
    pending: MoveRequest,
    move_sensitivity: f32,
    touch_sensitivity: f32,
    fov_y: f32,
    near: f32,
    far: f32,
    view_matrix: Mat4,
    rotation_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Expects an already-validated config; see `RendererConfig::validate`.
    pub fn new(config: &RendererConfig, position: Vec3) -> Self {
        let projection_matrix = math::perspective_projection(
            config.fov_y,
            config.aspect_ratio,
            config.near,
            config.far,
        );

        let mut camera = Self {
            position,
            azimuth: 0.0,
            elevation: 0.0,
            pending: MoveRequest::None,
            move_sensitivity: config.move_sensitivity,
            touch_sensitivity: config.touch_sensitivity,
            fov_y: config.fov_y,
            near: config.near,
            far: config.far,
            view_matrix: Mat4::IDENTITY,
            rotation_matrix: Mat4::IDENTITY,
            projection_matrix,
        };
        // Seed the view matrix so frame 0 reads a coherent one even if the
        // caller samples it before the first tick.
        camera.update_state();
        camera
    }

    /// The orthonormal view basis derived from the current angles.
    /// Returns (forward, up, right).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();

        let forward = Vec3::new(-cos_el * sin_az, -sin_el, -cos_el * cos_az).normalize();
        let up = Vec3::new(-sin_el * sin_az, cos_el, -sin_el * cos_az).normalize();
        let right = forward.cross(up).normalize();

        (forward, up, right)
    }

    /// Advance the camera one tick: rederive the basis, resolve the pending
    /// displacement, and rebuild the view matrix.
    ///
    /// Must be called exactly once per rendered frame, from the producer
    /// thread only, and never concurrently with a view-matrix read.
    pub fn update_state(&mut self) {
        let (forward, up, right) = self.basis();

        let azimuth_rotation = math::axis_rotation(-self.azimuth, up);
        let elevation_rotation = math::axis_rotation(self.elevation, right);
        self.rotation_matrix = elevation_rotation * azimuth_rotation;

        let displacement = self.resolve_displacement(forward, right);

        let translation1 = math::translation(-self.position);
        let translation2 = math::translation(-displacement);
        self.position += displacement;

        // World -> camera-local for the post-update position.
        self.view_matrix = self.rotation_matrix * translation2 * translation1;

        if matches!(self.pending, MoveRequest::Freeform(_)) {
            self.pending = MoveRequest::None;
        }
    }

    /// Displacing the camera never alters the basis vectors; a key step or a
    /// drag moves along the horizontal projection of forward and along right,
    /// with no vertical contribution.
    fn resolve_displacement(&self, forward: Vec3, right: Vec3) -> Vec3 {
        match self.pending {
            MoveRequest::None => Vec3::ZERO,
            MoveRequest::Directional(direction) => {
                let flat_forward = Self::flatten(forward);
                let step = match direction {
                    MoveDirection::Forward => flat_forward,
                    MoveDirection::Back => -flat_forward,
                    MoveDirection::Left => -right,
                    MoveDirection::Right => right,
                };
                self.move_sensitivity * step
            }
            MoveRequest::Freeform(delta) => {
                // Screen y grows downward; a drag toward the top of the
                // screen moves the camera forward.
                let flat_forward = Self::flatten(forward);
                self.touch_sensitivity * (delta.x * right - delta.y * flat_forward)
            }
        }
    }

    /// Horizontal projection of the forward vector. Nonzero for all clamped
    /// elevations, so the normalize is safe.
    fn flatten(forward: Vec3) -> Vec3 {
        Vec3::new(forward.x, 0.0, forward.z).normalize()
    }

    /// Rebuild the projection for a resized drawable.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.projection_matrix =
            math::perspective_projection(self.fov_y, aspect_ratio, self.near, self.far);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Rotation-only part of the view transform; the skybox MVP is
    /// projection * rotation.
    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation_matrix
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn pending(&self) -> MoveRequest {
        self.pending
    }
}

impl CameraInput for Camera {
    fn apply_rotation_delta(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth += d_azimuth;
        self.elevation = (self.elevation + d_elevation).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    fn set_directional_move(&mut self, direction: Option<MoveDirection>) {
        self.pending = match direction {
            Some(direction) => MoveRequest::Directional(direction),
            None => MoveRequest::None,
        };
    }

    fn set_freeform_move(&mut self, delta: Vec2) {
        self.pending = MoveRequest::Freeform(delta);
    }
}
