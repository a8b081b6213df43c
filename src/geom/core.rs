use std::ops::{Add, Mul, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Fallback normal for vertices without a usable face.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);
    /// Identity for component-wise scaling.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; `None` for zero or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len.is_finite() && len > 0.0).then(|| Self::new(self.x / len, self.y / len, self.z / len))
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[must_use]
    pub const fn component(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn from_array(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Vector from `rhs` to `self`.
    #[must_use]
    pub const fn sub_point(self, rhs: Self) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    #[must_use]
    pub const fn component(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, v: Vec3) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Vec3 {
        self.sub_point(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Axis / BBox
// ─────────────────────────────────────────────────────────────────────────────

/// A coordinate axis of the mesh frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Bounding box of raw positions; `None` when `positions` is empty.
    #[must_use]
    pub fn from_positions(positions: &[[f64; 3]]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let first = Point3::from_array(*first);
        Some(rest.iter().fold(Self::new(first, first), |bbox, p| {
            Self::new(
                Point3::new(bbox.min.x.min(p[0]), bbox.min.y.min(p[1]), bbox.min.z.min(p[2])),
                Point3::new(bbox.max.x.max(p[0]), bbox.max.y.max(p[1]), bbox.max.z.max(p[2])),
            )
        }))
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    #[must_use]
    pub const fn size(self) -> Vec3 {
        self.max.sub_point(self.min)
    }

    /// `(min, max)` along one axis.
    #[must_use]
    pub const fn span(self, axis: Axis) -> (f64, f64) {
        (self.min.component(axis), self.max.component(axis))
    }

    /// Axis with the largest extent. Ties resolve to the earlier of X, Y, Z.
    #[must_use]
    pub fn longest_axis(self) -> Axis {
        let size = self.size();
        [Axis::Y, Axis::Z].into_iter().fold(Axis::X, |best, axis| {
            if size.component(axis) > size.component(best) { axis } else { best }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Length below which an extent counts as degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn default_geom() -> Self {
        Self::DEFAULT
    }

    #[must_use]
    pub fn is_zero_length(self, len: f64) -> bool {
        len.abs() <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.cross(b), Vec3::new(-3.0, 6.0, -3.0));

        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p + Vec3::ONE, Point3::new(2.0, 3.0, 4.0));
        assert_eq!(Point3::new(4.0, 5.0, 6.0) - p, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn test_bbox_from_positions() {
        let bbox = BBox::from_positions(&[[0.0, 4.0, -1.0], [2.0, 0.0, 1.0], [1.0, 1.0, 0.0]])
            .unwrap();
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, -1.0));
        assert_eq!(bbox.max, Point3::new(2.0, 4.0, 1.0));
        assert_eq!(bbox.center(), Point3::new(1.0, 2.0, 0.0));
        assert_eq!(bbox.span(Axis::Y), (0.0, 4.0));
        assert_eq!(bbox.longest_axis(), Axis::Y);
        assert!(BBox::from_positions(&[]).is_none());
    }

    #[test]
    fn test_longest_axis_tie_prefers_x() {
        let bbox = BBox::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(bbox.longest_axis(), Axis::X);

        let bbox = BBox::new(Point3::ORIGIN, Point3::new(1.0, 2.0, 2.0));
        assert_eq!(bbox.longest_axis(), Axis::Y);
    }

    #[test]
    fn test_normalized_rejects_zero() {
        assert!(Vec3::ZERO.normalized().is_none());
        assert!(Vec3::new(f64::NAN, 0.0, 0.0).normalized().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }
}
