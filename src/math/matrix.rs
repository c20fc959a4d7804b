use glam::{Mat3, Mat4, Vec3, Vec4};

/// Rotation of `radians` about `axis`, built with Rodrigues' rotation formula.
///
/// `axis` must be unit length; the camera always derives its axes from
/// normalized trig/cross products, so no renormalization happens here.
pub fn axis_rotation(radians: f32, axis: Vec3) -> Mat4 {
    let s = radians.sin();
    let c = radians.cos();
    let k = 1.0 - c;

    let (x, y, z) = (axis.x, axis.y, axis.z);

    Mat4::from_cols(
        Vec4::new(x * x * k + c, x * y * k + z * s, x * z * k - y * s, 0.0),
        Vec4::new(x * y * k - z * s, y * y * k + c, y * z * k + x * s, 0.0),
        Vec4::new(x * z * k + y * s, y * z * k - x * s, z * z * k + c, 0.0),
        Vec4::W,
    )
}

/// Translation by `vector`.
pub fn translation(vector: Vec3) -> Mat4 {
    Mat4::from_translation(vector)
}

/// Right-handed perspective projection.
///
/// Clip-space convention: depth runs 0 at `near` to 1 at `far`, and the
/// fourth row is `[0, 0, -1, 0]`, so view-space -Z (the camera's forward)
/// maps to positive clip-space w.
pub fn perspective_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let ys = 1.0 / (0.5 * fov_y).tan();
    let xs = ys / aspect;
    let zs = far / (near - far);

    Mat4::from_cols(
        Vec4::new(xs, 0.0, 0.0, 0.0),
        Vec4::new(0.0, ys, 0.0, 0.0),
        Vec4::new(0.0, 0.0, zs, -1.0),
        Vec4::new(0.0, 0.0, zs * near, 0.0),
    )
}

/// Upper-left 3x3 block of a 4x4 matrix.
pub fn upper_left_3x3(matrix: &Mat4) -> Mat3 {
    Mat3::from_cols(
        matrix.x_axis.truncate(),
        matrix.y_axis.truncate(),
        matrix.z_axis.truncate(),
    )
}

/// Normal matrix of a model-view matrix: inverse transpose of the
/// upper-left 3x3 block.
pub fn normal_matrix(model_view: &Mat4) -> Mat3 {
    upper_left_3x3(model_view).inverse().transpose()
}
