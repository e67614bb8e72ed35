//! k-DOP bounding volume
//!
//! A discrete oriented polytope bounded by a min and max distance along a
//! fixed set of plane normals. With the three coordinate axes as normals it
//! is an axis aligned box, which is what the tree uses.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants::MAX_FLT, Vec3};
use crate::physics::collision::Aabb;

use super::kdop_check::KdopLineCheck;
use super::kdop_tree::CollisionTriangle;

/// Number of plane normals bounding a [`Kdop`]
pub const NUM_PLANES: usize = 3;

/// Slack allowed when validating a line check's entry point
pub const FUDGE_SIZE: f32 = 0.1;

/// Bounding volume along the X, Y and Z plane normals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kdop {
    /// Minimum distance along each plane normal
    pub min: [f32; NUM_PLANES],
    /// Maximum distance along each plane normal
    pub max: [f32; NUM_PLANES],
}

impl Default for Kdop {
    fn default() -> Self {
        Self::new()
    }
}

impl Kdop {
    /// An inside-out volume that contains nothing until a point is added
    pub fn new() -> Self {
        Self {
            min: [MAX_FLT; NUM_PLANES],
            max: [-MAX_FLT; NUM_PLANES],
        }
    }

    /// Volume tightly enclosing the given triangles
    pub(crate) fn from_triangles<'a>(
        vertices: &[Vec3],
        triangles: impl IntoIterator<Item = &'a CollisionTriangle>,
    ) -> Self {
        let mut kdop = Self::new();
        kdop.add_triangles(vertices, triangles);
        kdop
    }

    /// Reset to the inside-out state
    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// True once at least one point has been added
    pub fn is_valid(&self) -> bool {
        (0..NUM_PLANES).all(|plane| self.min[plane] <= self.max[plane])
    }

    /// Grow the volume to include `point`
    pub fn add_point(&mut self, point: &Vec3) {
        for plane in 0..NUM_PLANES {
            // Plane normals are the coordinate axes
            let dist = point[plane];
            self.min[plane] = self.min[plane].min(dist);
            self.max[plane] = self.max[plane].max(dist);
        }
    }

    /// Reset, then add every vertex of every triangle
    pub(crate) fn add_triangles<'a>(
        &mut self,
        vertices: &[Vec3],
        triangles: impl IntoIterator<Item = &'a CollisionTriangle>,
    ) {
        self.init();
        for triangle in triangles {
            for index in triangle.indices() {
                self.add_point(&vertices[index as usize]);
            }
        }
    }

    /// Minkowski sum with a box of the given half size
    pub fn expanded(&self, extent: &Vec3) -> Self {
        let mut expanded = *self;
        for plane in 0..NUM_PLANES {
            expanded.min[plane] -= extent[plane];
            expanded.max[plane] += extent[plane];
        }
        expanded
    }

    /// Slab test of a local segment against the volume.
    ///
    /// Returns the entry time, `0.0` when the segment starts inside.
    pub fn line_check(&self, check: &KdopLineCheck) -> Option<f32> {
        let mut inside = true;
        let mut times = [0.0_f32; NUM_PLANES];

        for plane in 0..NUM_PLANES {
            let start = check.start[plane];
            let direction = check.direction[plane];
            if start < self.min[plane] {
                if direction <= 0.0 {
                    return None;
                }
                inside = false;
                times[plane] = (self.min[plane] - start) * check.one_over_direction[plane];
            } else if start > self.max[plane] {
                if direction >= 0.0 {
                    return None;
                }
                inside = false;
                times[plane] = (self.max[plane] - start) * check.one_over_direction[plane];
            }
        }

        if inside {
            return Some(0.0);
        }

        let hit_time = times.into_iter().fold(0.0_f32, f32::max);
        if !(0.0..=1.0).contains(&hit_time) {
            return None;
        }

        let hit_location = check.start + check.direction * hit_time;
        let within = (0..NUM_PLANES).all(|plane| {
            hit_location[plane] > self.min[plane] - FUDGE_SIZE
                && hit_location[plane] < self.max[plane] + FUDGE_SIZE
        });
        within.then_some(hit_time)
    }

    /// Inclusive containment test
    pub fn point_check(&self, point: &Vec3) -> bool {
        (0..NUM_PLANES).all(|plane| point[plane] >= self.min[plane] && point[plane] <= self.max[plane])
    }

    /// Overlap test against an axis aligned box
    pub fn aabb_overlap_check(&self, aabb: &Aabb) -> bool {
        (0..NUM_PLANES).all(|plane| self.min[plane] <= aabb.max[plane] && aabb.min[plane] <= self.max[plane])
    }

    /// The same volume as an [`Aabb`], `None` while inside-out
    pub fn to_aabb(&self) -> Option<Aabb> {
        self.is_valid().then(|| {
            Aabb::new(
                Vec3::new(self.min[0], self.min[1], self.min[2]),
                Vec3::new(self.max[0], self.max[1], self.max[2]),
            )
        })
    }
}
