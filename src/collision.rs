//! Axis-aligned bounding boxes.
//!
//! Buildings and the player body are both represented as [`Aabb`]s. The
//! player integrator in [`crate::player`] resolves movement one axis at a
//! time against a slice of these boxes.

use cgmath::{Point3, Vector3};

/// An axis-aligned box. `min <= max` holds on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Build a box from two opposite corners in any order.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// A box standing on `base_y`, centred on `(center_x, center_z)`.
    pub fn from_base(center_x: f32, base_y: f32, center_z: f32, size: Vector3<f32>) -> Self {
        let half_x = size.x.abs() / 2.0;
        let half_z = size.z.abs() / 2.0;
        Self::new(
            Point3::new(center_x - half_x, base_y, center_z - half_z),
            Point3::new(center_x + half_x, base_y + size.y.abs(), center_z + half_z),
        )
    }

    pub fn around(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Strict overlap: boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Grow every face outwards by `amount`. Negative values shrink the box,
    /// collapsing to the centre rather than inverting.
    pub fn inflate(&self, amount: f32) -> Self {
        let center = self.center();
        let half = self.size() / 2.0;
        let grown = Vector3::new(
            (half.x + amount).max(0.0),
            (half.y + amount).max(0.0),
            (half.z + amount).max(0.0),
        );
        Self::around(center, grown)
    }

    pub fn translate(&self, offset: Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Penetration depth along each axis, zero on axes without overlap.
    pub(crate) fn overlap(&self, other: &Aabb) -> Vector3<f32> {
        let axis = |min_a: f32, max_a: f32, min_b: f32, max_b: f32| {
            (max_a.min(max_b) - min_a.max(min_b)).max(0.0)
        };
        Vector3::new(
            axis(self.min.x, self.max.x, other.min.x, other.max.x),
            axis(self.min.y, self.max.y, other.min.y, other.max.y),
            axis(self.min.z, self.max.z, other.min.z, other.max.z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::around(Point3::new(x, y, z), Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(Point3::new(1.0, -2.0, 3.0), Point3::new(-1.0, 2.0, -3.0));
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn from_base_stands_on_ground() {
        let aabb = Aabb::from_base(10.0, 0.0, -4.0, Vector3::new(4.0, 12.0, 2.0));
        assert_eq!(aabb.min, Point3::new(8.0, 0.0, -5.0));
        assert_eq!(aabb.max, Point3::new(12.0, 12.0, -3.0));
        assert_eq!(aabb.center(), Point3::new(10.0, 6.0, -4.0));
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let a = unit_at(0.0, 0.0, 0.0);
        let b = unit_at(1.0, 0.0, 0.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&unit_at(0.9, 0.2, -0.3)));
    }

    #[test]
    fn intersection_needs_all_axes() {
        let a = unit_at(0.0, 0.0, 0.0);
        assert!(!a.intersects(&unit_at(0.5, 3.0, 0.5)));
        assert!(a.intersects(&unit_at(0.5, 0.5, 0.5)));
    }

    #[test]
    fn contains_is_inclusive() {
        let a = unit_at(0.0, 0.0, 0.0);
        assert!(a.contains(Point3::new(0.5, 0.5, 0.5)));
        assert!(!a.contains(Point3::new(0.51, 0.0, 0.0)));
    }

    #[test]
    fn inflate_grows_and_never_inverts() {
        let a = unit_at(0.0, 0.0, 0.0);
        let grown = a.inflate(1.0);
        assert_eq!(grown.size(), Vector3::new(3.0, 3.0, 3.0));
        let collapsed = a.inflate(-2.0);
        assert_eq!(collapsed.size(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(collapsed.center(), a.center());
    }

    #[test]
    fn overlap_measures_penetration() {
        let a = unit_at(0.0, 0.0, 0.0);
        let b = a.translate(Vector3::new(0.75, 0.0, 2.0));
        assert_eq!(a.overlap(&b), Vector3::new(0.25, 1.0, 0.0));
    }
}
