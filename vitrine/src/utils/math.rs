use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};

/// Composes `Translate * Rotate * Scale`.
pub fn compose_trs(
    translation: &Vector3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale: &Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::new_translation(translation)
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(scale)
}

/// Transforms a point, dividing by `w` unless it degenerated to zero.
pub fn transform_point(transform: &Matrix4<f32>, point: &Vector3<f32>) -> Vector3<f32> {
    let pos = transform * Vector4::new(point.x, point.y, point.z, 1.0);
    let w = if pos.w.abs() > f32::EPSILON {
        pos.w
    } else {
        1.0
    };

    Vector3::new(pos.x / w, pos.y / w, pos.z / w)
}

/// All eight corners of the box spanned by `min` and `max`.
pub fn box_corners(min: &Vector3<f32>, max: &Vector3<f32>) -> [Vector3<f32>; 8] {
    let min_max = [min, max];
    let mut corners = [Vector3::zeros(); 8];

    for (i, corner) in corners.iter_mut().enumerate() {
        let x = min_max[i & 1].x;
        let y = min_max[(i >> 1) & 1].y;
        let z = min_max[(i >> 2) & 1].z;
        *corner = Vector3::new(x, y, z);
    }

    corners
}
