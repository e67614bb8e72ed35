//! Height field terrain collision
//!
//! Local space has one unit per sample in X and Y and the sample height in Z.
//! Each grid cell is a patch made of two triangles. Patches keep their height
//! range so a trace can skip most of them with a slab test before touching
//! any triangle.

use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::foundation::logging::debug;
use crate::foundation::math::{constants::DELTA, safe_normal, Mat4, Mat4Ext, Vec3};
use crate::physics::check_result::{pull_back_time, CheckResult};
use crate::physics::collision::{
    find_separating_axis, line_check_triangle_one_sided, Aabb, OrientedBox, Triangle,
};
use crate::physics::error::CollisionError;
use crate::physics::trace_flags::TraceFlags;

/// Height range of one patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchBounds {
    /// Lowest corner height
    pub min_height: f32,
    /// Highest corner height
    pub max_height: f32,
}

impl PatchBounds {
    fn center_height(&self) -> f32 {
        (self.min_height + self.max_height) / 2.0
    }
}

/// A regular grid of height samples placed in the world
#[derive(Debug, Clone)]
pub struct Heightfield {
    size_x: usize,
    size_y: usize,
    heights: Vec<f32>,
    patch_bounds: Vec<PatchBounds>,
    local_to_world: Mat4,
    world_to_local: Mat4,
    trace: TraceConfig,
}

impl Heightfield {
    /// Creates a height field from `size_x * size_y` samples stored row by
    /// row (X varies fastest)
    pub fn new(size_x: usize, size_y: usize, heights: Vec<f32>, local_to_world: Mat4) -> Result<Self, CollisionError> {
        let expected = size_x * size_y;
        if heights.len() != expected {
            return Err(CollisionError::HeightfieldSize {
                size_x,
                size_y,
                expected,
                actual: heights.len(),
            });
        }
        let world_to_local = local_to_world.try_inverse().ok_or(CollisionError::SingularTransform)?;

        let mut field = Self {
            size_x,
            size_y,
            heights,
            patch_bounds: Vec::new(),
            local_to_world,
            world_to_local,
            trace: TraceConfig::terrain(),
        };

        let (patches_x, patches_y) = field.patch_counts();
        let patch_bounds = (0..patches_y)
            .flat_map(|y| (0..patches_x).map(move |x| (x, y)))
            .map(|(x, y)| field.compute_patch_bounds(x, y))
            .collect();
        field.patch_bounds = patch_bounds;

        debug!("Created {}x{} height field with {} patches", size_x, size_y, patches_x * patches_y);
        Ok(field)
    }

    /// Override how far hits are pulled back
    pub fn with_trace_config(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Number of samples along X and Y
    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    /// Number of patches along X and Y
    pub fn patch_counts(&self) -> (usize, usize) {
        (self.size_x.saturating_sub(1), self.size_y.saturating_sub(1))
    }

    /// Sample height in local units
    pub fn height(&self, x: usize, y: usize) -> f32 {
        self.heights[y * self.size_x + x]
    }

    /// Height range of a patch
    pub fn patch_bounds(&self, x: usize, y: usize) -> &PatchBounds {
        &self.patch_bounds[y * self.patch_counts().0 + x]
    }

    /// Current placement
    pub fn local_to_world(&self) -> &Mat4 {
        &self.local_to_world
    }

    /// Local space bounds, `None` when there are no patches
    pub fn local_bounds(&self) -> Option<Aabb> {
        let (patches_x, patches_y) = self.patch_counts();
        if patches_x == 0 || patches_y == 0 {
            return None;
        }
        let min_height = self.heights.iter().copied().fold(f32::MAX, f32::min);
        let max_height = self.heights.iter().copied().fold(f32::MIN, f32::max);
        Some(Aabb::new(
            Vec3::new(0.0, 0.0, min_height),
            Vec3::new(patches_x as f32, patches_y as f32, max_height),
        ))
    }

    /// World space bounds
    pub fn bounds(&self) -> Option<Aabb> {
        self.local_bounds().map(|bounds| bounds.transform_by(&self.local_to_world))
    }

    fn vertex(&self, x: usize, y: usize) -> Vec3 {
        Vec3::new(x as f32, y as f32, self.height(x, y))
    }

    fn compute_patch_bounds(&self, x: usize, y: usize) -> PatchBounds {
        let corners = [self.height(x, y), self.height(x + 1, y), self.height(x, y + 1), self.height(x + 1, y + 1)];
        PatchBounds {
            min_height: corners.iter().copied().fold(f32::MAX, f32::min),
            max_height: corners.iter().copied().fold(f32::MIN, f32::max),
        }
    }

    fn patch_triangles(&self, x: usize, y: usize) -> [Triangle; 2] {
        let v00 = self.vertex(x, y);
        let v10 = self.vertex(x + 1, y);
        let v01 = self.vertex(x, y + 1);
        let v11 = self.vertex(x + 1, y + 1);
        [Triangle::new(v00, v01, v11), Triangle::new(v11, v10, v00)]
    }

    /// Traces a line (zero `extent`) or swept box from `start` to `end`.
    ///
    /// Line traces only hit the upward facing side of the surface. Returns
    /// the nearest hit, or the first one found with
    /// [`TraceFlags::STOP_AT_FIRST_HIT`], pulled back toward `start`.
    pub fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3, flags: TraceFlags) -> Option<CheckResult> {
        let (patches_x, patches_y) = self.patch_counts();
        if patches_x == 0 || patches_y == 0 {
            return None;
        }

        let zero_extent = *extent == Vec3::zeros();
        let world_bounds = Aabb::new(start.inf(end) - extent, start.sup(end) + extent);
        let local_bounds = world_bounds.transform_by(&self.world_to_local);
        let (min_x, max_x) = (patch_index(local_bounds.min.x, patches_x), patch_index(local_bounds.max.x, patches_x));
        let (min_y, max_y) = (patch_index(local_bounds.min.y, patches_y), patch_index(local_bounds.max.y, patches_y));

        let local_start = self.world_to_local.transform_position(start);
        let local_end = self.world_to_local.transform_position(end);
        let local_direction = local_end - local_start;
        let one_over_direction = local_direction.map(|d| if d * d > DELTA * DELTA { 1.0 / d } else { 0.0 });
        let local_extent = Aabb::new(-extent, *extent).transform_by(&self.world_to_local).extents();
        let local_box = OrientedBox::new(
            *extent,
            [Vec3::x(), Vec3::y(), Vec3::z()].map(|axis| self.world_to_local.transform_direction(&axis)),
        );

        let mut best: Option<(f32, Vec3)> = None;
        'patches: for y in min_y..=max_y {
            for x in min_x..=max_x {
                let bounds = self.patch_bounds(x, y);
                let center = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, bounds.center_height());
                let radii = Vec3::new(0.5, 0.5, bounds.max_height - center.z) + local_extent;
                if !line_check_with_box(&center, &radii, &local_start, &one_over_direction) {
                    continue;
                }

                let mut quad_hit = false;
                for triangle in self.patch_triangles(x, y) {
                    let best_time = best.map_or(1.0, |(time, _)| time);
                    let hit = if zero_extent {
                        line_check_triangle_one_sided(&triangle, &local_start, &local_direction, best_time)
                            .map(|hit| (hit.time, hit.normal))
                    } else {
                        find_separating_axis(&triangle, &local_start, &local_end, &local_box, best_time)
                            .map(|hit| (hit.time, hit.normal))
                    };
                    if hit.is_some() {
                        best = hit;
                        quad_hit = true;
                    }
                }

                // Zero extent traces keep looking for the nearest quad too
                if quad_hit && flags.stops_at_first_hit() {
                    break 'patches;
                }
            }
        }

        let (time, local_normal) = best?;
        let time = pull_back_time(time, (end - start).magnitude(), &self.trace);
        let normal = safe_normal(&self.local_to_world.transform_direction(&local_normal));
        Some(CheckResult::on_trace(start, end, time, normal))
    }

    /// Tests a box of half size `extent` centered at `point`.
    ///
    /// Runs a vertical sweep of the box's footprint through its height and
    /// reports the sweep's hit raised by `extent.z`.
    pub fn point_check(&self, point: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        let offset = Vec3::new(0.0, 0.0, extent.z);
        let footprint = Vec3::new(extent.x, extent.y, 0.0);
        let mut result = self.line_check(&(point - offset), &(point + offset), &footprint, TraceFlags::empty())?;
        result.location.z += extent.z;
        Some(result)
    }
}

/// Patch containing a local coordinate, clamped to the grid
fn patch_index(coordinate: f32, patch_count: usize) -> usize {
    let last = patch_count.saturating_sub(1);
    // Truncation toward zero; `as` saturates for out of range values
    (coordinate as i64).clamp(0, last as i64) as usize
}

/// Slab test of the segment `start + direction * t`, `t` in `[0, 1]`,
/// against a box given by center and radii. Axes with a zero reciprocal
/// direction are treated as parallel.
fn line_check_with_box(center: &Vec3, radii: &Vec3, start: &Vec3, one_over_direction: &Vec3) -> bool {
    let local_start = start - center;
    let mut t_near = 0.0_f32;
    let mut t_far = 1.0_f32;

    for axis in 0..3 {
        let inverse = one_over_direction[axis];
        if inverse == 0.0 {
            if local_start[axis].abs() > radii[axis] {
                return false;
            }
            continue;
        }

        let t_front = -(local_start[axis] * inverse) - radii[axis] * inverse.abs();
        let t_back = -(local_start[axis] * inverse) + radii[axis] * inverse.abs();
        t_near = t_near.max(t_front);
        t_far = t_far.min(t_back);
        if t_far < t_near {
            return false;
        }
    }
    true
}
