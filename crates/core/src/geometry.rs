//! Vector and bounding-box primitives shared by the damage model and search.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Continuous position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Distance on the horizontal plane only.
    pub fn xz_distance_to(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Block containing this point.
    pub fn floored(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
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

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Integer-aligned block coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Minimum corner as a continuous position.
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Where a detonatable entity stands once placed on top of this block.
    pub fn spawn_point(self) -> Vec3 {
        self.as_vec3().offset(0.5, 1.0, 0.5)
    }

    pub fn distance_to(self, point: Vec3) -> f64 {
        self.as_vec3().distance_to(point)
    }

    pub fn xz_distance_to(self, point: Vec3) -> f64 {
        self.as_vec3().xz_distance_to(point)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Height of the volume a freshly spawned detonatable entity claims.
pub const SPAWN_VOLUME_HEIGHT: f64 = 2.01;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box anchored at an entity's feet with horizontal half-extent `half_width`.
    pub fn anchored(position: Vec3, half_width: f64, height: f64) -> Self {
        Self::new(
            position.offset(-half_width, 0.0, -half_width),
            position.offset(half_width, height, half_width),
        )
    }

    /// Volume claimed by a detonatable entity spawned on top of `block`.
    ///
    /// Half-extent equals half the height, so simultaneous placements closer
    /// than three blocks apart on the same layer always collide.
    pub fn spawn_volume(block: BlockPos) -> Self {
        Self::anchored(
            block.spawn_point(),
            SPAWN_VOLUME_HEIGHT / 2.0,
            SPAWN_VOLUME_HEIGHT,
        )
    }

    /// The two block cells directly above `block` that a placement needs free.
    pub fn placement_cell(block: BlockPos) -> Self {
        let base = block.above().as_vec3();
        Self::new(base, base.offset(1.0, 2.0, 1.0))
    }

    /// Strict overlap test; boxes that only touch on a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn offset(&self, delta: Vec3) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_volumes_of_neighbouring_blocks_collide() {
        let a = Aabb::spawn_volume(BlockPos::new(0, 64, 0));
        assert!(a.intersects(&Aabb::spawn_volume(BlockPos::new(1, 64, 0))));
        assert!(a.intersects(&Aabb::spawn_volume(BlockPos::new(2, 64, 2))));
        assert!(!a.intersects(&Aabb::spawn_volume(BlockPos::new(3, 64, 0))));
        assert!(!a.intersects(&Aabb::spawn_volume(BlockPos::new(0, 67, 0))));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        let b = a.offset(Vec3::new(1.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        assert!(a.intersects(&a.offset(Vec3::new(0.5, 0.5, 0.5))));
    }

    #[test]
    fn spawn_point_is_centred_on_top_face() {
        let p = BlockPos::new(-3, 10, 7).spawn_point();
        assert_eq!(p, Vec3::new(-2.5, 11.0, 7.5));
        assert_eq!(p.floored(), BlockPos::new(-3, 11, 7));
    }

    #[test]
    fn normalize_handles_zero_vector() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let n = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }
}
