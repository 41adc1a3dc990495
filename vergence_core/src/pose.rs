// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal rigid-body math for tracked poses.
//!
//! Covers what the session needs (vectors, unit quaternions, poses, and the
//! column-major matrices consumers build view transforms from) without
//! pulling in a full linear-algebra crate.

use core::ops::{Add, Mul, Neg, Sub};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A 3-D vector in meters (or world units once scaled).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    /// X component (right).
    pub x: f64,
    /// Y component (up).
    pub y: f64,
    /// Z component (toward the viewer).
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// The forward direction (−Z).
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns `true` if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A rotation stored as a unit quaternion `(x, y, z, w)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    /// Vector part, X.
    pub x: f64,
    /// Vector part, Y.
    pub y: f64,
    /// Vector part, Z.
    pub z: f64,
    /// Scalar part.
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a quaternion from its components.
    #[inline]
    #[must_use]
    pub const fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `radians` around the Y (up) axis.
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let half = radians * 0.5;
        Self::from_xyzw(0.0, half.sin(), 0.0, half.cos())
    }

    /// Returns the quaternion scaled to unit length, or identity if it is
    /// degenerate.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len <= f64::EPSILON || !len.is_finite() {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::from_xyzw(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// The inverse rotation (conjugate of a unit quaternion).
    #[inline]
    #[must_use]
    pub fn conjugate(self) -> Self {
        Self::from_xyzw(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }
}

impl Mul for Quat {
    type Output = Self;

    /// Hamilton product: applies `rhs` first, then `self`.
    fn mul(self, rhs: Self) -> Self {
        Self::from_xyzw(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

/// A rigid transform: orientation followed by translation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// Position in tracking space.
    pub position: Vec3,
    /// Orientation in tracking space.
    pub orientation: Quat,
}

impl Pose {
    /// The pose at the tracking origin, facing forward.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Creates a pose.
    #[inline]
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The forward direction of this pose.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate(Vec3::FORWARD)
    }

    /// Returns this pose with its position multiplied by `scale`.
    ///
    /// Orientation is unaffected by world scale.
    #[must_use]
    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(self.position * scale, self.orientation)
    }

    /// The pose-to-tracking-space matrix.
    #[must_use]
    pub fn to_transform(&self) -> Transform3d {
        Transform3d::from_pose(self)
    }

    /// The tracking-space-to-pose (view) matrix.
    #[must_use]
    pub fn view_transform(&self) -> Transform3d {
        let inv = self.orientation.conjugate();
        let t = inv.rotate(-self.position);
        Transform3d::from_pose(&Self::new(t, inv))
    }
}

/// A column-major 4×4 affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Builds the matrix of a rigid pose.
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        let q = pose.orientation;
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, yy, zz) = (q.x * x2, q.y * y2, q.z * z2);
        let (xy, xz, yz) = (q.x * y2, q.x * z2, q.y * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);
        let p = pose.position;
        Self {
            cols: [
                [1.0 - (yy + zz), xy + wz, xz - wy, 0.0],
                [xy - wz, 1.0 - (xx + zz), yz + wx, 0.0],
                [xz + wy, yz - wx, 1.0 - (xx + yy), 0.0],
                [p.x, p.y, p.z, 1.0],
            ],
        }
    }

    /// Transforms a point (w = 1).
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1],
            c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2],
        )
    }

    /// Returns the matrix as `f32` columns for GPU upload.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub fn to_cols_f32(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, v) in self.cols.iter().flatten().enumerate() {
            out[i] = *v as f32;
        }
        out
    }
}

impl Mul for Transform3d {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, v) in out_col.iter_mut().enumerate() {
                *v = a[0][row] * b[col][0]
                    + a[1][row] * b[col][1]
                    + a[2][row] * b[col][2]
                    + a[3][row] * b[col][3];
            }
        }
        Self { cols: out }
    }
}

/// A ray in tracking space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
        }
    }
}

impl Ray {
    /// The point `distance` along the ray.
    #[must_use]
    pub fn at(&self, distance: f64) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn quarter_turn_rotates_forward_to_left() {
        let q = Quat::from_rotation_y(FRAC_PI_2);
        let v = q.rotate(Vec3::FORWARD);
        assert!(approx(v, Vec3::new(-1.0, 0.0, 0.0)), "got {v:?}");
    }

    #[test]
    fn view_transform_inverts_pose() {
        let pose = Pose::new(Vec3::new(1.0, 1.7, -2.0), Quat::from_rotation_y(0.4));
        let m = pose.view_transform() * pose.to_transform();
        let p = Vec3::new(0.3, -0.2, 5.0);
        assert!(approx(m.transform_point(p), p), "view * model should be identity");
    }

    #[test]
    fn scaled_pose_keeps_orientation() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(1.0));
        let scaled = pose.scaled(2.0);
        assert_eq!(scaled.position, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(scaled.orientation, pose.orientation);
    }

    #[test]
    fn degenerate_quat_normalizes_to_identity() {
        assert_eq!(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0).normalize(), Quat::IDENTITY);
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, 2.0).normalize();
        assert_eq!(q, Quat::IDENTITY);
    }
}
