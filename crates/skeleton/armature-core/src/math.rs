//! Numeric types and transform composition.
//!
//! Everything is `f64`. Orientations are plain (not unit) quaternions because
//! component-wise interpolation does not preserve unit length.

pub type Vector3 = nalgebra::Vector3<f64>;
pub type Quaternion = nalgebra::Quaternion<f64>;
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Identity orientation (x, y, z, w) = (0, 0, 0, 1).
#[inline]
pub fn quaternion_identity() -> Quaternion {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Build a quaternion from [x, y, z, w] components.
#[inline]
pub fn quaternion_xyzw(x: f64, y: f64, z: f64, w: f64) -> Quaternion {
    Quaternion::new(w, x, y, z)
}

#[inline]
pub fn translation_matrix(t: &Vector3) -> Matrix4 {
    Matrix4::new_translation(t)
}

/// Rotation matrix of `q` as given. Uses the unit-quaternion formula without
/// normalising first.
#[inline]
pub fn rotation_matrix(q: &Quaternion) -> Matrix4 {
    nalgebra::UnitQuaternion::new_unchecked(*q).to_homogeneous()
}

#[inline]
pub fn scale_matrix(s: &Vector3) -> Matrix4 {
    Matrix4::new_nonuniform_scaling(s)
}

/// `T(translation) × R(orientation) × S(scale)` written into `out`, using `tmp`
/// for the intermediate product.
pub fn compose_trs_into(
    translation: &Vector3,
    orientation: &Quaternion,
    scale: &Vector3,
    out: &mut Matrix4,
    tmp: &mut Matrix4,
) {
    translation_matrix(translation).mul_to(&rotation_matrix(orientation), tmp);
    tmp.mul_to(&scale_matrix(scale), out);
}

/// Allocating form of [`compose_trs_into`].
pub fn compose_trs(translation: &Vector3, orientation: &Quaternion, scale: &Vector3) -> Matrix4 {
    let mut out = Matrix4::identity();
    let mut tmp = Matrix4::identity();
    compose_trs_into(translation, orientation, scale, &mut out, &mut tmp);
    out
}

/// Transform a point (w = 1) by a homogeneous matrix.
#[inline]
pub fn transform_point(m: &Matrix4, p: &Vector3) -> Vector3 {
    m.transform_point(&nalgebra::Point3::from(*p)).coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn identity_trs_is_identity_matrix() {
        let m = compose_trs(
            &Vector3::zeros(),
            &quaternion_identity(),
            &Vector3::new(1.0, 1.0, 1.0),
        );
        assert_relative_eq!(m, Matrix4::identity());
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        // 90 degrees about Z
        let q = quaternion_xyzw(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let m = compose_trs(&Vector3::new(10.0, 0.0, 0.0), &q, &Vector3::new(2.0, 2.0, 2.0));
        let p = transform_point(&m, &Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vector3::new(10.0, 2.0, 0.0), epsilon = 1e-12);
    }
}
