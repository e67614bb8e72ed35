//! Primitive collision shapes
//!
//! Provides the geometric primitives (triangles, boxes, spheres) that the
//! separating-axis tests and k-DOP queries operate on.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// A triangle given by three vertex positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Edges `v1 - v0`, `v2 - v1`, `v0 - v2`
    pub fn edges(&self) -> [Vec3; 3] {
        [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2]
    }

    /// Unnormalized face normal `(v1 - v0) x (v2 - v1)`
    pub fn face_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v1))
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Projects all three vertices onto `axis`, returning `(min, max)`
    pub fn project(&self, axis: &Vec3) -> (f32, f32) {
        let d0 = axis.dot(&self.v0);
        let d1 = axis.dot(&self.v1);
        let d2 = axis.dot(&self.v2);
        (d0.min(d1).min(d2), d0.max(d1).max(d2))
    }
}

/// A box with arbitrary (not necessarily unit) axes
///
/// Used to sweep or place a world aligned box inside a mesh's local space:
/// `extent` stays in world units while `axes` are the world axes expressed in
/// local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Half size along each axis
    pub extent: Vec3,
    /// Box X, Y and Z axes
    pub axes: [Vec3; 3],
}

impl OrientedBox {
    /// Creates a box from its extent and axes
    pub fn new(extent: Vec3, axes: [Vec3; 3]) -> Self {
        Self { extent, axes }
    }

    /// A box aligned with the coordinate axes
    pub fn axis_aligned(extent: Vec3) -> Self {
        Self::new(extent, [Vec3::x(), Vec3::y(), Vec3::z()])
    }

    /// Projected half size along one of the box's own axes
    pub fn face_extent(&self, axis_index: usize) -> f32 {
        self.extent[axis_index] * self.axes[axis_index].magnitude_squared()
    }

    /// Projected half size along an arbitrary axis
    pub fn projected_extent(&self, axis: &Vec3) -> f32 {
        self.extent.x * axis.dot(&self.axes[0]).abs()
            + self.extent.y * axis.dot(&self.axes[1]).abs()
            + self.extent.z * axis.dot(&self.axes[2]).abs()
    }
}

/// Axis aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Smallest box containing this box after an affine transform
    pub fn transform_by(&self, matrix: &Mat4) -> Aabb {
        let center = matrix.transform_position(&self.center());
        let extents = self.extents();
        let [c0, c1, c2] = matrix.basis_columns();
        let new_extents = c0.abs() * extents.x + c1.abs() * extents.y + c2.abs() * extents.z;
        Self::from_center_extents(center, new_extents)
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Box enclosing the sphere
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec3::repeat(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_face_normal_and_projection() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        // (1,0,0) x (-1,1,0)
        assert_relative_eq!(tri.face_normal(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tri.project(&Vec3::new(1.0, 1.0, 0.0)), (0.0, 1.0));
        assert_relative_eq!(tri.centroid(), Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0));
    }

    #[test]
    fn test_oriented_box_projected_extent() {
        let obb = OrientedBox::axis_aligned(Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(obb.projected_extent(&Vec3::new(1.0, 1.0, 0.0)), 3.0);
        assert_relative_eq!(obb.face_extent(2), 3.0);
    }

    #[test]
    fn test_aabb_transform_by_rotation() {
        let aabb = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        let quarter_turn = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let matrix = Transform::from_position_rotation(Vec3::new(10.0, 0.0, 0.0), quarter_turn).to_matrix();

        let moved = aabb.transform_by(&matrix);
        assert_relative_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(moved.extents(), Vec3::new(2.0, 1.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_aabb_from_points() {
        assert!(Aabb::from_points(&[]).is_none());
        let aabb = Aabb::from_points(&[Vec3::new(1.0, -1.0, 0.0), Vec3::new(-2.0, 3.0, 0.5)])
            .expect("non-empty");
        assert_eq!(aabb.min, Vec3::new(-2.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(aabb.contains_point(&Vec3::new(0.0, 0.0, 0.25)));
    }

    #[test]
    fn test_sphere_bounding_box() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 1.0, 1.0), 2.0);
        let aabb = sphere.bounding_box();
        assert_eq!(aabb.min, Vec3::new(-1.0, -1.0, -1.0));
        assert!(aabb.intersects(&Aabb::new(Vec3::new(2.5, 2.5, 2.5), Vec3::new(4.0, 4.0, 4.0))));
    }
}
