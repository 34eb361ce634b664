//! Keyframe interpolation.
//!
//! - `Constant`: step to the upper keyframe's value
//! - `Linear`: component-wise lerp, quaternions included (no slerp, no renormalisation)
//! - `Quadratic`, `Exponential`: not implemented; selecting them panics

use crate::definition::{Easing, Interpolation};
use crate::math::{Quaternion, Vector3};

/// Values that can be blended component-wise.
pub trait Interpolate: Copy {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Interpolate for f64 {
    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        lerp_f64(*self, *other, t)
    }
}

impl Interpolate for Vector3 {
    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self.zip_map(other, |a, b| lerp_f64(a, b, t))
    }
}

impl Interpolate for Quaternion {
    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Quaternion::from(self.coords.zip_map(&other.coords, |a, b| lerp_f64(a, b, t)))
    }
}

/// Blend from `lower` toward `upper` by `alpha` in `[0, 1]`.
///
/// `easing` is accepted for every kind but does not change the result yet.
pub fn interpolate<T: Interpolate>(
    kind: Interpolation,
    _easing: Easing,
    lower: &T,
    upper: &T,
    alpha: f64,
) -> T {
    match kind {
        Interpolation::Constant => *upper,
        Interpolation::Linear => {
            if alpha <= 0.0 {
                *lower
            } else if alpha >= 1.0 {
                *upper
            } else {
                lower.lerp(upper, alpha)
            }
        }
        Interpolation::Quadratic | Interpolation::Exponential => {
            panic!("{} interpolation is not implemented", kind.name())
        }
    }
}
