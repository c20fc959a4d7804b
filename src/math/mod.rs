mod matrix;

pub use matrix::{axis_rotation, normal_matrix, perspective_projection, translation, upper_left_3x3};
