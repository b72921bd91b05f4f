use std::ops::{Add, Mul, Sub};

/// A point or offset in world space.
///
/// Layout follows the engine convention used by the host: `x` to the right,
/// `y` up and `z` forward. Tiles sit on the `x`/`z` plane and levels stack
/// along `y`.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3([f32; 3]);

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Vec3([0.0, 0.0, 0.0]);
    /// One unit up.
    pub const UP: Self = Vec3([0.0, 1.0, 0.0]);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3([x, y, z])
    }

    pub fn length(&self) -> f32 {
        (self.x().powi(2) + self.y().powi(2) + self.z().powi(2)).sqrt()
    }

    /// Straight-line distance to `other`.
    pub fn distance(&self, other: &Self) -> f32 {
        (*other - *self).length()
    }

    /// Linear interpolation towards `target`.
    ///
    /// `t` is clamped to `[0, 1]`; `t >= 1` returns `target` exactly so that
    /// finished transitions land on grid-aligned positions without drift.
    pub fn lerp(self, target: Self, t: f32) -> Self {
        if t >= 1.0 {
            return target;
        }
        let t = t.max(0.0);
        self + (target - self) * t
    }

    /// Returns a copy with the vertical component replaced.
    pub fn with_y(self, y: f32) -> Self {
        Vec3([self.x(), y, self.z()])
    }

    pub fn as_array(&self) -> &[f32; 3] {
        &self.0
    }
    pub fn x(&self) -> f32 {
        self.0[0]
    }
    pub fn y(&self) -> f32 {
        self.0[1]
    }
    pub fn z(&self) -> f32 {
        self.0[2]
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(values: [f32; 3]) -> Self {
        Vec3(values)
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(vec: Vec3) -> Self {
        vec.0
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self([
            self.x() + other.x(),
            self.y() + other.y(),
            self.z() + other.z(),
        ])
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self([
            self.x() - other.x(),
            self.y() - other.y(),
            self.z() - other.z(),
        ])
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self([self.x() * scalar, self.y() * scalar, self.z() * scalar])
    }
}
