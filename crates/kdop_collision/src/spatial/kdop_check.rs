//! Per-query state for k-DOP tree checks
//!
//! A check is built once per query: world-space inputs go through the
//! inverse of the mesh's local-to-world transform so the tree only ever sees
//! local coordinates. The running best result lives in a separate
//! accumulator ([`KdopHit`] or [`KdopPointHit`]) handed to the tree by
//! exclusive reference.

use crate::foundation::math::{constants::MAX_FLT, Mat4, Mat4Ext, Vec3};
use crate::physics::collision::{Aabb, BoundingSphere, OrientedBox, DEFAULT_BEST_DISTANCE};

/// Segment in the tree's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopLineCheck {
    /// Local start
    pub start: Vec3,
    /// Local end
    pub end: Vec3,
    /// `end - start`
    pub direction: Vec3,
    /// Per-component reciprocal of `direction`, zero where the direction is zero
    pub one_over_direction: Vec3,
}

impl KdopLineCheck {
    /// Segment already expressed in local space
    pub fn new(start: Vec3, end: Vec3) -> Self {
        let direction = end - start;
        let one_over_direction = direction.map(|d| if d != 0.0 { 1.0 / d } else { 0.0 });
        Self {
            start,
            end,
            direction,
            one_over_direction,
        }
    }

    /// Segment given in world space
    pub fn from_world(world_to_local: &Mat4, start: &Vec3, end: &Vec3) -> Self {
        Self::new(
            world_to_local.transform_position(start),
            world_to_local.transform_position(end),
        )
    }
}

/// World aligned box swept along a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopBoxCheck {
    /// Swept center in local space
    pub line: KdopLineCheck,
    /// Local extent of the world box, used to inflate node volumes
    pub local_extent: Vec3,
    /// World extent with the world axes expressed in local space
    pub local_box: OrientedBox,
}

impl KdopBoxCheck {
    /// Box sweep already expressed in local space
    pub fn new(start: Vec3, end: Vec3, extent: Vec3) -> Self {
        Self {
            line: KdopLineCheck::new(start, end),
            local_extent: extent,
            local_box: OrientedBox::axis_aligned(extent),
        }
    }

    /// Box sweep given in world space
    pub fn from_world(world_to_local: &Mat4, start: &Vec3, end: &Vec3, extent: &Vec3) -> Self {
        let local_extent = Aabb::new(-extent, *extent).transform_by(world_to_local).extents();
        let local_box = OrientedBox::new(
            *extent,
            [Vec3::x(), Vec3::y(), Vec3::z()].map(|axis| world_to_local.transform_direction(&axis)),
        );
        Self {
            line: KdopLineCheck::from_world(world_to_local, start, end),
            local_extent,
            local_box,
        }
    }
}

/// Box placed at a single point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopPointCheck {
    /// Zero length box check at the point
    pub box_check: KdopBoxCheck,
}

impl KdopPointCheck {
    /// Point check already expressed in local space
    pub fn new(location: Vec3, extent: Vec3) -> Self {
        Self {
            box_check: KdopBoxCheck::new(location, location, extent),
        }
    }

    /// Point check given in world space
    pub fn from_world(world_to_local: &Mat4, location: &Vec3, extent: &Vec3) -> Self {
        Self {
            box_check: KdopBoxCheck::from_world(world_to_local, location, location, extent),
        }
    }

    /// Local location being tested
    pub fn location(&self) -> &Vec3 {
        &self.box_check.line.start
    }
}

/// Box in local space gathering candidate triangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopSphereQuery {
    /// Local bounds of the query sphere
    pub local_box: Aabb,
}

impl KdopSphereQuery {
    /// Query for a sphere given in world space
    pub fn from_world(world_to_local: &Mat4, sphere: &BoundingSphere) -> Self {
        Self {
            local_box: sphere.bounding_box().transform_by(world_to_local),
        }
    }
}

/// Best line or box hit found so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopHit {
    /// Fraction along the segment; `MAX_FLT` until something is hit
    pub time: f32,
    /// Local space normal of the hit triangle
    pub normal: Vec3,
    /// Material index of the hit triangle
    pub material_index: u16,
}

impl KdopHit {
    /// Accumulator with nothing hit yet
    pub fn new() -> Self {
        Self {
            time: MAX_FLT,
            normal: Vec3::zeros(),
            material_index: 0,
        }
    }
}

impl Default for KdopHit {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallowest penetration found so far by a point check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdopPointHit {
    /// Penetration depth along `normal`
    pub best_distance: f32,
    /// Local space push out direction
    pub normal: Vec3,
    /// Material index of the triangle providing `best_distance`
    pub material_index: u16,
}

impl KdopPointHit {
    /// Accumulator with nothing found yet
    pub fn new() -> Self {
        Self {
            best_distance: DEFAULT_BEST_DISTANCE,
            normal: Vec3::zeros(),
            material_index: 0,
        }
    }
}

impl Default for KdopPointHit {
    fn default() -> Self {
        Self::new()
    }
}
