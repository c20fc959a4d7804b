use glam::Mat4;

use crate::math;
use crate::types::{MeshHandle, ObjectTransforms, TextureHandle};

/// One drawable: a model matrix plus opaque handles into the asset
/// collaborator. The scene list is fixed for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct SceneObject {
    pub model_matrix: Mat4,
    pub mesh: MeshHandle,
    pub texture: TextureHandle,
}

/// Immutable object list supplied by the scene provider at initialization.
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Combine an object's model matrix with the camera's view matrix into the
/// view-space transform block written to the active constant region.
pub fn view_space_transforms(view_matrix: &Mat4, model_matrix: &Mat4) -> ObjectTransforms {
    let model_view = *view_matrix * *model_matrix;
    let normal = math::normal_matrix(&model_view);
    ObjectTransforms::new(model_view, normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat3, Vec3};

    #[test]
    fn identity_view_passes_the_model_through() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let transforms = view_space_transforms(&Mat4::IDENTITY, &model);
        assert_eq!(
            Mat4::from_cols_array_2d(&transforms.model_view),
            model
        );
    }

    #[test]
    fn normal_matrix_tracks_the_model_view() {
        let view = math::axis_rotation(0.5, Vec3::Y);
        let model = Mat4::from_scale(Vec3::splat(3.0));
        let transforms = view_space_transforms(&view, &model);

        let model_view = view * model;
        let expected = math::normal_matrix(&model_view);
        let packed = Mat3::from_cols(
            Vec3::new(
                transforms.normal[0][0],
                transforms.normal[0][1],
                transforms.normal[0][2],
            ),
            Vec3::new(
                transforms.normal[1][0],
                transforms.normal[1][1],
                transforms.normal[1][2],
            ),
            Vec3::new(
                transforms.normal[2][0],
                transforms.normal[2][1],
                transforms.normal[2][2],
            ),
        );

        let v = Vec3::new(0.2, -0.5, 0.8);
        assert!((packed * v - expected * v).length() < 1e-5);
    }
}
