//! Physics module for collision queries
//!
//! Narrow phase triangle tests live in [`collision`]. Static meshes and
//! height field terrain wrap them with world placement, and a
//! [`CollisionWorld`] traces across everything registered with it.

pub mod collision;
pub mod check_result;
pub mod collision_world;
pub mod error;
pub mod static_mesh;
pub mod terrain;
pub mod trace_flags;

#[cfg(test)]
pub(crate) mod tests;

pub use check_result::{pull_back_time, CheckResult, MaterialHandle};
pub use collision::{Aabb, BoundingSphere, OrientedBox, Triangle};
pub use collision_world::{CollisionPrimitive, CollisionWorld};
pub use error::CollisionError;
pub use static_mesh::{StaticMesh, StaticMeshComponent};
pub use terrain::{Heightfield, PatchBounds};
pub use trace_flags::TraceFlags;
