use nalgebra::{Quaternion, UnitQuaternion};
use rand::Rng;
use std::f64::consts::TAU;

/// Samples a rotation uniformly over SO(3).
///
/// Uses Shoemake's subgroup algorithm: three independent uniform variates map
/// to a unit quaternion distributed uniformly on the 3-sphere.
pub fn random_rotation<R: Rng>(rng: &mut R) -> UnitQuaternion<f64> {
    let u1: f64 = rng.gen_range(0.0..1.0);
    let theta1: f64 = rng.gen_range(0.0..TAU);
    let theta2: f64 = rng.gen_range(0.0..TAU);
    let s1 = (1.0 - u1).sqrt();
    let s2 = u1.sqrt();
    UnitQuaternion::from_quaternion(Quaternion::new(
        s2 * theta2.cos(),
        s1 * theta1.sin(),
        s1 * theta1.cos(),
        s2 * theta2.sin(),
    ))
}
