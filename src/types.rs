use glam::{Mat3, Mat4};
use static_assertions::const_assert_eq;

/// Stride of the per-frame block inside a constant-buffer slot.
pub const PER_FRAME_STRIDE: usize = std::mem::size_of::<PerFrameConstants>();

/// Stride of one object's transform block inside a constant-buffer slot.
pub const OBJECT_STRIDE: usize = std::mem::size_of::<ObjectTransforms>();

/// Data shared by every object in a single frame.
///
/// Padded to 256 bytes so per-frame and per-object regions can be addressed
/// with buffer offsets on APIs that require 256-byte offset alignment.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PerFrameConstants {
    pub projection: [[f32; 4]; 4],
    pub _pad: [[f32; 4]; 12],
}

const_assert_eq!(std::mem::size_of::<PerFrameConstants>(), 256);

impl PerFrameConstants {
    pub fn new(projection: Mat4) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            _pad: [[0.0; 4]; 12],
        }
    }
}

/// Per-object view-space transform data, recomputed every frame.
///
/// The normal matrix is stored as three vec4 columns because 3x3 matrices
/// are padded to vec4 columns in shader-visible memory.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectTransforms {
    pub model_view: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub _pad: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<ObjectTransforms>(), 128);

impl ObjectTransforms {
    pub fn new(model_view: Mat4, normal: Mat3) -> Self {
        let n = |col: glam::Vec3| [col.x, col.y, col.z, 0.0];
        Self {
            model_view: model_view.to_cols_array_2d(),
            normal: [n(normal.x_axis), n(normal.y_axis), n(normal.z_axis)],
            _pad: [0.0; 4],
        }
    }
}

/// Skybox constants, passed inline per frame rather than through the shared
/// constant region. The skybox follows the camera's rotation only, so its
/// MVP is projection * rotation with no translation.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxTransforms {
    pub model_view_projection: [[f32; 4]; 4],
}

impl SkyboxTransforms {
    pub fn new(model_view_projection: Mat4) -> Self {
        Self {
            model_view_projection: model_view_projection.to_cols_array_2d(),
        }
    }
}

/// Opaque handle to a mesh owned by the asset collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Opaque handle to a texture owned by the asset collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);
