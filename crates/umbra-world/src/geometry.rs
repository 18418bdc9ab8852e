//! 3D geometry for detection: vectors, rays and axis-aligned boxes.
//!
//! Plain `f64` maths. The simulation is a single authoritative process, so
//! there is no cross-machine determinism requirement to satisfy.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Below this length a vector is treated as zero.
const EPSILON: f64 = 1e-9;

// =============================================================================
// Vec3
// =============================================================================

/// A point or direction in world space. `y` is up.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component (height).
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Unit +X.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit +Y (up).
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit +Z.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Builds a vector from components.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length. Prefer this for comparisons.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len > EPSILON).then(|| self * (1.0 / len))
    }

    /// Angle between two vectors in radians, `0..=π`.
    ///
    /// Returns `None` if either vector is zero.
    pub fn angle_to(self, other: Self) -> Option<f64> {
        let denom = self.length() * other.length();
        if denom <= EPSILON {
            return None;
        }
        Some((self.dot(other) / denom).clamp(-1.0, 1.0).acos())
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

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// =============================================================================
// Ray
// =============================================================================

/// A half-line with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Ray from `origin` towards `target`, or `None` if they coincide.
    pub fn towards(origin: Vec3, target: Vec3) -> Option<Self> {
        let direction = (target - origin).normalized()?;
        Some(Self { origin, direction })
    }
}

// =============================================================================
// Aabb
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Lowest corner.
    pub min: Vec3,
    /// Highest corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box centred on `center` with the given full size.
    pub fn from_center(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Whether `point` lies inside or on the boundary.
    pub fn contains(&self, point: Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// Entry parameter of `ray` into the box (slab test), if the ray
    /// reaches it within `max_t`. A ray starting inside hits at `t = 0`.
    pub fn ray_hit(&self, ray: &Ray, max_t: f64) -> Option<f64> {
        let mut t_enter = 0.0_f64;
        let mut t_exit = max_t;

        let axes = [
            (ray.origin.x, ray.direction.x, self.min.x, self.max.x),
            (ray.origin.y, ray.direction.y, self.min.y, self.max.y),
            (ray.origin.z, ray.direction.z, self.min.z, self.max.z),
        ];

        for (origin, dir, lo, hi) in axes {
            if dir.abs() < EPSILON {
                // Parallel to this slab: must already be between its planes.
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (mut t0, mut t1) = ((lo - origin) * inv, (hi - origin) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }
}
