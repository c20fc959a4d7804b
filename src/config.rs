use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Number of frames the CPU may run ahead of the GPU by default.
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 3;

/// Renderer and camera tuning parameters.
///
/// Validated once at renderer construction; an invalid config never produces
/// a partially constructed renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Constant-buffer slots in the ring, and capacity of the frame gate.
    pub frames_in_flight: usize,
    /// World units per tick for a held directional key.
    pub move_sensitivity: f32,
    /// Radians of azimuth per pixel of pointer/look-finger travel.
    /// Negative inverts the drag direction, which matches natural mouse look.
    pub azimuth_sensitivity: f32,
    /// Radians of elevation per pixel of pointer/look-finger travel.
    pub elevation_sensitivity: f32,
    /// World units per pixel of move-finger travel.
    pub touch_sensitivity: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
            move_sensitivity: 0.3,
            azimuth_sensitivity: -0.01,
            elevation_sensitivity: -0.01,
            touch_sensitivity: 0.025,
            fov_y: 65.0_f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("frames_in_flight must be at least 1, got {0}")]
    NoFramesInFlight(usize),
    #[error("fov_y must lie in (0, pi) radians, got {0}")]
    DegenerateFov(f32),
    #[error("aspect_ratio must be positive and finite, got {0}")]
    DegenerateAspect(f32),
    #[error("near/far planes must satisfy 0 < near < far, got near={near} far={far}")]
    DegenerateDepthRange { near: f32, far: f32 },
    #[error("sensitivity {name} must be finite, got {value}")]
    NonFiniteSensitivity { name: &'static str, value: f32 },
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_in_flight < 1 {
            return Err(ConfigError::NoFramesInFlight(self.frames_in_flight));
        }
        if !(self.fov_y > 0.0 && self.fov_y < PI) {
            return Err(ConfigError::DegenerateFov(self.fov_y));
        }
        if !(self.aspect_ratio > 0.0 && self.aspect_ratio.is_finite()) {
            return Err(ConfigError::DegenerateAspect(self.aspect_ratio));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(ConfigError::DegenerateDepthRange {
                near: self.near,
                far: self.far,
            });
        }
        for (name, value) in [
            ("move_sensitivity", self.move_sensitivity),
            ("azimuth_sensitivity", self.azimuth_sensitivity),
            ("elevation_sensitivity", self.elevation_sensitivity),
            ("touch_sensitivity", self.touch_sensitivity),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteSensitivity { name, value });
            }
        }
        Ok(())
    }
}
