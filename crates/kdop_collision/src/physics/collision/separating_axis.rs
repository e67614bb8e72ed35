//! Separating axis tests between a box and a triangle
//!
//! Two flavours share the same 13 candidate axes: the three box axes, the
//! triangle normal, and the nine cross products of a box axis with a triangle
//! edge.
//!
//! - [`find_separating_axis`] sweeps the box from `start` to `end` and
//!   reports the earliest time of contact.
//! - [`SeparatingAxisPointCheck`] places the box at a single point and
//!   reports the shallowest penetration.

use crate::foundation::math::{constants::DELTA, Vec3};

use super::primitives::{OrientedBox, Triangle};

/// Penetration distance a point check starts from
pub const DEFAULT_BEST_DISTANCE: f32 = 100_000.0;

/// Time of first contact of a swept box with a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptHit {
    /// Fraction of the sweep at which the box first touches the triangle
    pub time: f32,
    /// Unnormalized normal of the separating axis that was crossed last
    pub normal: Vec3,
}

/// Overlap window along the sweep, narrowed axis by axis
struct SweepWindow {
    min_time: f32,
    max_time: f32,
    normal: Vec3,
}

impl SweepWindow {
    fn check_min_time(&mut self, time: f32, normal: Vec3) {
        // First axis to reach the latest entry keeps its normal
        if time > self.min_time {
            self.min_time = time;
            self.normal = normal;
        }
    }

    fn test_axis(
        &mut self,
        triangle: &Triangle,
        axis: &Vec3,
        start: &Vec3,
        end: &Vec3,
        projected_extent: f32,
    ) -> bool {
        let projected_start = axis.dot(start);
        let projected_direction = axis.dot(end) - projected_start;

        let (tri_min, tri_max) = triangle.project(axis);
        let tri_min = tri_min - projected_extent;
        let tri_max = tri_max + projected_extent;

        if projected_start < tri_min {
            if projected_direction < DELTA {
                return false;
            }
            self.check_min_time((tri_min - projected_start) / projected_direction, -axis);
            self.max_time = self.max_time.min((tri_max - projected_start) / projected_direction);
        } else if projected_start > tri_max {
            if projected_direction > -DELTA {
                return false;
            }
            self.check_min_time((tri_max - projected_start) / projected_direction, *axis);
            self.max_time = self.max_time.min((tri_min - projected_start) / projected_direction);
        } else if projected_direction > DELTA {
            self.max_time = self.max_time.min((tri_max - projected_start) / projected_direction);
        } else if projected_direction < -DELTA {
            self.max_time = self.max_time.min((tri_min - projected_start) / projected_direction);
        }

        self.max_time >= self.min_time
    }

    fn test_cross_axis(
        &mut self,
        triangle: &Triangle,
        box_edge: &Vec3,
        triangle_edge: &Vec3,
        start: &Vec3,
        end: &Vec3,
        obb: &OrientedBox,
    ) -> bool {
        let axis = box_edge.cross(triangle_edge);
        if axis.magnitude_squared() < DELTA {
            return true;
        }
        self.test_axis(triangle, &axis, start, end, obb.projected_extent(&axis))
    }
}

/// Sweeps `obb` from `start` to `end` against `triangle`.
///
/// `hit_time` caps the search window; pass `1.0` for a fresh sweep or the
/// best time found so far to only accept closer contacts. Returns `None` when
/// a separating axis exists over the whole window, when the box starts in
/// contact, or when the contact lies beyond `hit_time`.
pub fn find_separating_axis(
    triangle: &Triangle,
    start: &Vec3,
    end: &Vec3,
    obb: &OrientedBox,
    hit_time: f32,
) -> Option<SweptHit> {
    let mut window = SweepWindow {
        min_time: -1.0,
        max_time: hit_time,
        normal: Vec3::zeros(),
    };

    for (index, axis) in obb.axes.iter().enumerate() {
        if !window.test_axis(triangle, axis, start, end, obb.face_extent(index)) {
            return None;
        }
    }

    let edges = triangle.edges();

    // Triangle normal
    if !window.test_cross_axis(triangle, &edges[0], &edges[1], start, end, obb) {
        return None;
    }

    for box_axis in &obb.axes {
        for edge in &edges {
            if !window.test_cross_axis(triangle, box_axis, edge, start, end, obb) {
                return None;
            }
        }
    }

    (window.min_time >= 0.0).then_some(SweptHit {
        time: window.min_time,
        normal: window.normal,
    })
}

/// Static overlap test of a box centered at a point against a triangle prism.
///
/// `hit` is false as soon as any axis separates. Otherwise `best_dist` holds
/// the smallest penetration found on any axis (never larger than the value
/// passed in) and `hit_normal` the unit direction to push out along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparatingAxisPointCheck {
    /// Unit push out direction for `best_dist`
    pub hit_normal: Vec3,
    /// Shallowest penetration seen so far
    pub best_dist: f32,
    /// Whether every axis overlapped
    pub hit: bool,
}

impl SeparatingAxisPointCheck {
    /// Runs the check, starting from an existing best distance
    pub fn new(triangle: &Triangle, point: &Vec3, obb: &OrientedBox, best_dist: f32) -> Self {
        let mut check = Self {
            hit_normal: Vec3::zeros(),
            best_dist,
            hit: false,
        };
        check.hit = check.find_separating_axis(triangle, point, obb);
        check
    }

    fn test_axis(&mut self, triangle: &Triangle, axis: &Vec3, point: &Vec3, projected_extent: f32) -> bool {
        let projected_point = axis.dot(point);
        let (tri_min, tri_max) = triangle.project(axis);
        let tri_min = tri_min - projected_extent;
        let tri_max = tri_max + projected_extent;

        if projected_point < tri_min || projected_point > tri_max {
            return false;
        }

        let axis_magnitude = axis.magnitude();
        if axis_magnitude <= 0.0 {
            return true;
        }

        let min_penetration = projected_point - tri_min;
        let max_penetration = tri_max - projected_point;
        if min_penetration < self.best_dist * axis_magnitude {
            self.best_dist = min_penetration / axis_magnitude;
            self.hit_normal = -axis / axis_magnitude;
        }
        if max_penetration < self.best_dist * axis_magnitude {
            self.best_dist = max_penetration / axis_magnitude;
            self.hit_normal = axis / axis_magnitude;
        }
        true
    }

    fn test_cross_axis(&mut self, triangle: &Triangle, box_edge: &Vec3, triangle_edge: &Vec3, point: &Vec3, obb: &OrientedBox) -> bool {
        let axis = box_edge.cross(triangle_edge);
        if axis.magnitude_squared() < DELTA {
            return true;
        }
        self.test_axis(triangle, &axis, point, obb.projected_extent(&axis))
    }

    fn find_separating_axis(&mut self, triangle: &Triangle, point: &Vec3, obb: &OrientedBox) -> bool {
        for (index, axis) in obb.axes.iter().enumerate() {
            if !self.test_axis(triangle, axis, point, obb.face_extent(index)) {
                return false;
            }
        }

        let edges = triangle.edges();
        if !self.test_cross_axis(triangle, &edges[0], &edges[1], point, obb) {
            return false;
        }

        obb.axes.iter().all(|box_axis| {
            edges
                .iter()
                .all(|edge| self.test_cross_axis(triangle, box_axis, edge, point, obb))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-10.0, -10.0, 0.0),
            Vec3::new(10.0, -10.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
        )
    }

    #[test]
    fn test_zero_extent_sweep_hits_at_plane() {
        let hit = find_separating_axis(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, 1.0),
            &Vec3::new(0.0, 0.0, -1.0),
            &OrientedBox::axis_aligned(Vec3::zeros()),
            1.0,
        )
        .expect("sweep should hit");

        assert_relative_eq!(hit.time, 0.5, epsilon = 1e-6);
        assert_relative_eq!(hit.normal.normalize(), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_box_extent_moves_contact_earlier() {
        let hit = find_separating_axis(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, 1.0),
            &Vec3::new(0.0, 0.0, -1.0),
            &OrientedBox::axis_aligned(Vec3::repeat(0.5)),
            1.0,
        )
        .expect("sweep should hit");

        assert_relative_eq!(hit.time, 0.25, epsilon = 1e-6);
        assert_relative_eq!(hit.normal.normalize(), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_hit_time_caps_the_window() {
        let result = find_separating_axis(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, 1.0),
            &Vec3::new(0.0, 0.0, -1.0),
            &OrientedBox::axis_aligned(Vec3::zeros()),
            0.4,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_separated_sweeps_report_no_hit() {
        let triangle = ground_triangle();
        let obb = OrientedBox::axis_aligned(Vec3::repeat(0.5));
        let cases = [
            // parallel above the plane
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0)),
            // moving away
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 3.0)),
            // passes beside the triangle
            (Vec3::new(20.0, 0.0, 1.0), Vec3::new(20.0, 0.0, -1.0)),
            // too short to reach
            (Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 2.0)),
            // starts overlapping
            (Vec3::new(0.0, 0.0, 0.1), Vec3::new(0.0, 0.0, -1.0)),
        ];

        for (start, end) in cases {
            assert!(
                find_separating_axis(&triangle, &start, &end, &obb, 1.0).is_none(),
                "unexpected hit sweeping {start:?} -> {end:?}"
            );
        }
    }

    #[test]
    fn test_degenerate_triangle_does_not_panic() {
        let sliver = Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let result = find_separating_axis(
            &sliver,
            &Vec3::new(1.0, 0.0, 1.0),
            &Vec3::new(1.0, 0.0, -1.0),
            &OrientedBox::axis_aligned(Vec3::repeat(0.1)),
            1.0,
        );
        if let Some(hit) = result {
            assert!((0.0..=1.0).contains(&hit.time));
        }
    }

    #[test]
    fn test_point_check_reports_shallowest_axis() {
        let check = SeparatingAxisPointCheck::new(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, 0.2),
            &OrientedBox::axis_aligned(Vec3::repeat(0.5)),
            DEFAULT_BEST_DISTANCE,
        );

        assert!(check.hit);
        assert_relative_eq!(check.best_dist, 0.3, epsilon = 1e-5);
        assert_relative_eq!(check.hit_normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_point_check_below_plane_pushes_down() {
        let check = SeparatingAxisPointCheck::new(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, -0.4),
            &OrientedBox::axis_aligned(Vec3::repeat(0.5)),
            DEFAULT_BEST_DISTANCE,
        );

        assert!(check.hit);
        assert_relative_eq!(check.best_dist, 0.1, epsilon = 1e-5);
        assert_relative_eq!(check.hit_normal, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_point_check_outside_prism_misses() {
        let obb = OrientedBox::axis_aligned(Vec3::repeat(0.5));
        let above = SeparatingAxisPointCheck::new(&ground_triangle(), &Vec3::new(0.0, 0.0, 1.0), &obb, DEFAULT_BEST_DISTANCE);
        let beside = SeparatingAxisPointCheck::new(&ground_triangle(), &Vec3::new(12.0, 0.0, 0.0), &obb, DEFAULT_BEST_DISTANCE);
        assert!(!above.hit);
        assert!(!beside.hit);
    }

    #[test]
    fn test_point_check_keeps_smaller_incoming_distance() {
        let check = SeparatingAxisPointCheck::new(
            &ground_triangle(),
            &Vec3::new(0.0, 0.0, 0.2),
            &OrientedBox::axis_aligned(Vec3::repeat(0.5)),
            0.05,
        );
        assert!(check.hit);
        assert_relative_eq!(check.best_dist, 0.05);
    }
}
