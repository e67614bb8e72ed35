//! Collision detection primitives and narrow phase tests
//!
//! Provides the shapes and exact per-triangle tests that the k-DOP tree and
//! the terrain run at their leaves.

pub mod primitives;
pub mod separating_axis;
pub mod line_triangle;

pub use primitives::{Aabb, BoundingSphere, OrientedBox, Triangle};
pub use separating_axis::{find_separating_axis, SeparatingAxisPointCheck, SweptHit, DEFAULT_BEST_DISTANCE};
pub use line_triangle::{line_check_triangle, line_check_triangle_one_sided, TriangleHit, PLANE_SIDE_EPSILON};
