//! Collision world
//!
//! Holds every collidable primitive behind a stable handle and runs traces
//! across all of them. Primitives whose world bounds miss a query are skipped
//! before their own narrow phase runs.

use crate::foundation::collections::{PrimitiveKey, PrimitiveMap};
use crate::foundation::logging::trace;
use crate::foundation::math::Vec3;
use crate::physics::check_result::CheckResult;
use crate::physics::collision::{Aabb, BoundingSphere};
use crate::physics::static_mesh::StaticMeshComponent;
use crate::physics::terrain::Heightfield;
use crate::physics::trace_flags::TraceFlags;

/// Anything a collision world can trace against
pub trait CollisionPrimitive: Send + Sync {
    /// Line (zero `extent`) or swept box check in world space
    fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3, flags: TraceFlags) -> Option<CheckResult>;

    /// Box overlap check in world space
    fn point_check(&self, location: &Vec3, extent: &Vec3) -> Option<CheckResult>;

    /// World space bounds, `None` for primitives with no geometry
    fn bounds(&self) -> Option<Aabb>;

    /// Candidate triangle indices near a sphere. Primitives without an
    /// indexed triangle list report none.
    fn sphere_query(&self, _sphere: &BoundingSphere) -> Vec<u32> {
        Vec::new()
    }
}

impl CollisionPrimitive for StaticMeshComponent {
    fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3, _flags: TraceFlags) -> Option<CheckResult> {
        StaticMeshComponent::line_check(self, start, end, extent)
    }

    fn point_check(&self, location: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        StaticMeshComponent::point_check(self, location, extent)
    }

    fn bounds(&self) -> Option<Aabb> {
        StaticMeshComponent::bounds(self)
    }

    fn sphere_query(&self, sphere: &BoundingSphere) -> Vec<u32> {
        StaticMeshComponent::sphere_query(self, sphere)
    }
}

impl CollisionPrimitive for Heightfield {
    fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3, flags: TraceFlags) -> Option<CheckResult> {
        Heightfield::line_check(self, start, end, extent, flags)
    }

    fn point_check(&self, location: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        Heightfield::point_check(self, location, extent)
    }

    fn bounds(&self) -> Option<Aabb> {
        Heightfield::bounds(self)
    }
}

/// All primitives that traces can hit
#[derive(Default)]
pub struct CollisionWorld {
    primitives: PrimitiveMap<Box<dyn CollisionPrimitive>>,
}

impl CollisionWorld {
    /// Creates an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a primitive and returns its handle
    pub fn add<P: CollisionPrimitive + 'static>(&mut self, primitive: P) -> PrimitiveKey {
        self.primitives.insert(Box::new(primitive))
    }

    /// Removes a primitive; stale handles return `None`
    pub fn remove(&mut self, key: PrimitiveKey) -> Option<Box<dyn CollisionPrimitive>> {
        self.primitives.remove(key)
    }

    /// Looks up a primitive
    pub fn get(&self, key: PrimitiveKey) -> Option<&dyn CollisionPrimitive> {
        self.primitives.get(key).map(|primitive| primitive.as_ref())
    }

    /// Number of primitives
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// True when the world holds no primitives
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Nearest hit of a line or swept box over every primitive.
    ///
    /// With [`TraceFlags::STOP_AT_FIRST_HIT`] the first primitive that
    /// reports a hit wins.
    pub fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3, flags: TraceFlags) -> Option<CheckResult> {
        let trace_bounds = Aabb::new(start.inf(end) - extent, start.sup(end) + extent);
        let mut best: Option<CheckResult> = None;

        for (key, primitive) in self.candidates(&trace_bounds) {
            let Some(mut result) = primitive.line_check(start, end, extent, flags) else {
                continue;
            };
            result.primitive = Some(key);
            if best.map_or(true, |best| result.time < best.time) {
                best = Some(result);
            }
            if flags.stops_at_first_hit() {
                break;
            }
        }

        trace!(
            "World line check {:?} -> {:?} hit {:?}",
            start,
            end,
            best.and_then(|result| result.primitive)
        );
        best
    }

    /// First primitive overlapping a box of half size `extent` at `location`
    pub fn point_check(&self, location: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        let query_bounds = Aabb::from_center_extents(*location, *extent);
        let overlap = self.candidates(&query_bounds).find_map(|(key, primitive)| {
            primitive.point_check(location, extent).map(|result| CheckResult {
                primitive: Some(key),
                ..result
            })
        });
        overlap
    }

    /// Candidate triangles near a sphere, grouped by primitive
    pub fn sphere_query(&self, sphere: &BoundingSphere) -> Vec<(PrimitiveKey, Vec<u32>)> {
        self.candidates(&sphere.bounding_box())
            .filter_map(|(key, primitive)| {
                let triangles = primitive.sphere_query(sphere);
                (!triangles.is_empty()).then_some((key, triangles))
            })
            .collect()
    }

    fn candidates<'a>(
        &'a self,
        query_bounds: &'a Aabb,
    ) -> impl Iterator<Item = (PrimitiveKey, &'a dyn CollisionPrimitive)> + 'a {
        self.primitives.iter().filter_map(move |(key, primitive)| {
            let bounds = primitive.bounds()?;
            bounds.intersects(query_bounds).then_some((key, primitive.as_ref()))
        })
    }
}
