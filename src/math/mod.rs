//! Math utilities for world-space positions and grid coordinates.
//!
//! # Module Organization
//!
//! - [`vec`] holds the [`Vec3`] world-space type (re-exported at root level)
//! - [`coordinates`] maps between integer grid cells and world positions
//! - [`lerp`] is the scalar interpolation used for alpha fades

pub mod coordinates;
pub mod vec;

pub use vec::Vec3;

/// Linear interpolation between two scalars, with `t` clamped to `[0, 1]`.
///
/// # Example
/// ```
/// use rolling_cube::math::lerp;
///
/// assert_eq!(lerp(1.0, 0.0, 0.25), 0.75);
/// assert_eq!(lerp(1.0, 0.0, 2.0), 0.0);
/// ```
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    start + (end - start) * t
}
