//! # Camera Orientation
//!
//! Explicit yaw/pitch state for the first-person observer.
//!
//! The orientation is only ever updated through [`Orientation::apply_mouse_delta`] and
//! converted to vectors on demand, so there is a single rotation order in the crate:
//! yaw about +Y, then pitch about the rotated +X.
//!
//! With both angles at zero the observer looks down -Z with +Y up.

use cgmath::{InnerSpace, Matrix3, Point3, Rad, Vector3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Yaw and pitch of the observer, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Rotation about +Y, wrapped into `[-PI, PI)`
    pub yaw: f64,
    /// Rotation about +X, clamped to `[-PI/2, PI/2]`
    pub pitch: f64,
}

impl Orientation {
    /// Creates an orientation, normalizing both angles.
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw: wrap_angle(yaw),
            pitch: pitch.clamp(-FRAC_PI_2, FRAC_PI_2),
        }
    }

    /// Orientation facing from `from` towards `to`.
    ///
    /// Coincident points keep the default orientation.
    pub fn looking_at(from: Point3<f64>, to: Point3<f64>) -> Self {
        let d = to - from;
        if d.magnitude2() == 0.0 {
            return Self::default();
        }
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        Self::new((-d.x).atan2(-d.z), d.y.atan2(horizontal))
    }

    /// Applies a mouse movement in pixels.
    ///
    /// Moving right turns the view right (yaw decreases) and moving down looks down.
    pub fn apply_mouse_delta(&mut self, dx: f64, dy: f64, sensitivity: f64) {
        *self = Self::new(self.yaw - dx * sensitivity, self.pitch - dy * sensitivity);
    }

    /// Rotation taking observer-local vectors to world space.
    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_angle_y(Rad(self.yaw)) * Matrix3::from_angle_x(Rad(self.pitch))
    }

    /// Unit vector the observer is looking along.
    pub fn forward(&self) -> Vector3<f64> {
        self.rotation() * -Vector3::unit_z()
    }

    /// Rotates an observer-local vector into world space.
    pub fn to_world(&self, local: Vector3<f64>) -> Vector3<f64> {
        self.rotation() * local
    }
}

/// Wraps an angle into `[-PI, PI)`.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU itself.
    if wrapped >= PI {
        -PI
    } else {
        wrapped
    }
}
