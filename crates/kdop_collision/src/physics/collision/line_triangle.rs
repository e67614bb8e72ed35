//! Line segment vs triangle tests

use crate::foundation::math::{constants::DELTA, safe_normal, Vec3};

use super::primitives::Triangle;

/// Both endpoints must be at least this far on opposite sides of a
/// triangle's plane for a segment to cross it
pub const PLANE_SIDE_EPSILON: f32 = 0.001;

/// Where a segment crosses a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Fraction of the segment at the crossing
    pub time: f32,
    /// Unit normal of the triangle
    pub normal: Vec3,
}

/// Two-sided segment test used by k-DOP tree leaves.
///
/// The normal is `(v1 - v2) x (v0 - v2)`, normalized. Only crossings strictly
/// before `best_time` are reported. Points on an edge count as inside, so a
/// segment through an edge shared by two triangles cannot slip between them.
pub fn line_check_triangle(triangle: &Triangle, start: &Vec3, end: &Vec3, best_time: f32) -> Option<TriangleHit> {
    let normal = safe_normal(&(triangle.v1 - triangle.v2).cross(&(triangle.v0 - triangle.v2)));
    let plane_w = normal.dot(&triangle.v0);

    let start_dist = normal.dot(start) - plane_w;
    let end_dist = normal.dot(end) - plane_w;

    if (start_dist > -PLANE_SIDE_EPSILON && end_dist > -PLANE_SIDE_EPSILON)
        || (start_dist < PLANE_SIDE_EPSILON && end_dist < PLANE_SIDE_EPSILON)
    {
        return None;
    }

    let time = -start_dist / (end_dist - start_dist);
    if time >= best_time {
        return None;
    }

    let intersection = start + (end - start) * time;
    let vertices = triangle.vertices();
    for index in 0..3 {
        let a = vertices[index];
        let b = vertices[(index + 1) % 3];
        let side_direction = normal.cross(&(b - a));
        if side_direction.dot(&intersection) - side_direction.dot(&a) > 0.0 {
            return None;
        }
    }

    Some(TriangleHit { time, normal })
}

/// One-sided Möller-Trumbore test used for height fields.
///
/// Only triangles facing against `direction` are hit. The returned time is
/// recomputed from the triangle plane so adjacent triangles agree exactly.
pub fn line_check_triangle_one_sided(
    triangle: &Triangle,
    start: &Vec3,
    direction: &Vec3,
    best_time: f32,
) -> Option<TriangleHit> {
    let edge1 = triangle.v2 - triangle.v0;
    let edge2 = triangle.v1 - triangle.v0;
    let p = direction.cross(&edge2);
    let determinant = edge1.dot(&p);

    if determinant < DELTA {
        return None;
    }

    let t = start - triangle.v0;
    let u = t.dot(&p);
    if u < 0.0 || u > determinant {
        return None;
    }

    let q = t.cross(&edge1);
    let v = direction.dot(&q);
    if v < 0.0 || u + v > determinant {
        return None;
    }

    let time = edge2.dot(&q) / determinant;
    if time < 0.0 || time > best_time {
        return None;
    }

    let normal = safe_normal(&(triangle.v2 - triangle.v1).cross(&(triangle.v1 - triangle.v0)));
    let time = (triangle.v0 - start).dot(&normal) / normal.dot(direction);

    Some(TriangleHit { time, normal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Wound so that (v1 - v2) x (v0 - v2) points up
    fn floor() -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        )
    }

    #[test]
    fn test_segment_crossing_plane_hits() {
        let hit = line_check_triangle(&floor(), &Vec3::new(0.0, 0.0, 1.0), &Vec3::new(0.0, 0.0, -3.0), 1.0)
            .expect("segment crosses the triangle");
        assert_relative_eq!(hit.time, 0.25, epsilon = 1e-6);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_hit_from_behind_keeps_triangle_normal() {
        let hit = line_check_triangle(&floor(), &Vec3::new(0.0, 0.0, -1.0), &Vec3::new(0.0, 0.0, 1.0), 1.0)
            .expect("test is two-sided");
        assert_relative_eq!(hit.time, 0.5, epsilon = 1e-6);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_near_plane_endpoints_are_rejected() {
        let start = Vec3::new(0.0, 0.0, 0.0005);
        let end = Vec3::new(0.0, 0.0, -1.0);
        assert!(line_check_triangle(&floor(), &start, &end, 1.0).is_none());
    }

    #[test]
    fn test_outside_edges_and_worse_times_are_rejected() {
        let start = Vec3::new(3.0, 0.0, 1.0);
        let end = Vec3::new(3.0, 0.0, -1.0);
        assert!(line_check_triangle(&floor(), &start, &end, 1.0).is_none());

        let start = Vec3::new(0.0, 0.0, 1.0);
        let end = Vec3::new(0.0, 0.0, -1.0);
        assert!(line_check_triangle(&floor(), &start, &end, 0.5).is_none());
    }

    #[test]
    fn test_point_on_shared_edge_counts_as_inside() {
        // Crosses the edge from (-1,-1) to (0,1) at its midpoint
        let start = Vec3::new(-0.5, 0.0, 1.0);
        let end = Vec3::new(-0.5, 0.0, -1.0);
        assert!(line_check_triangle(&floor(), &start, &end, 1.0).is_some());
    }

    #[test]
    fn test_degenerate_triangle_is_never_hit() {
        let sliver = Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert!(line_check_triangle(&sliver, &Vec3::new(1.0, 0.0, 1.0), &Vec3::new(1.0, 0.0, -1.0), 1.0).is_none());
    }

    #[test]
    fn test_one_sided_hits_only_front_face() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        );
        let down = Vec3::new(0.0, 0.0, -2.0);
        let hit = line_check_triangle_one_sided(&tri, &Vec3::new(0.25, 0.5, 1.0), &down, 1.0)
            .expect("downward segment hits the upward face");
        assert_relative_eq!(hit.time, 0.5, epsilon = 1e-6);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        let up = Vec3::new(0.0, 0.0, 2.0);
        assert!(line_check_triangle_one_sided(&tri, &Vec3::new(0.25, 0.5, -1.0), &up, 1.0).is_none());
    }
}
