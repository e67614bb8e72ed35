//! # k-DOP Collision
//!
//! Static mesh collision built on k-DOP bounding volume trees.
//!
//! ## Features
//!
//! - **k-DOP Trees**: Axis aligned bounding volume hierarchy built with the
//!   splatter heuristic and stored as a flat, serializable node array
//! - **Exact Queries**: Line, swept box and point (box overlap) checks against
//!   triangles using separating-axis tests
//! - **World Placement**: Static mesh components and height field terrain
//!   answer queries in world space under any invertible transform
//! - **Collision World**: Nearest hit traces across every registered primitive
//! - **Configuration**: TOML or RON files for build and trace settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kdop_collision::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A single upward facing triangle
//!     let vertices = vec![
//!         Vec3::new(-1.0, -1.0, 0.0),
//!         Vec3::new(1.0, 1.0, 0.0),
//!         Vec3::new(1.0, -1.0, 0.0),
//!     ];
//!     let triangles = [CollisionTriangle::new(0, 1, 2, 0)];
//!     let mesh = Arc::new(StaticMesh::new(vertices, &triangles)?);
//!
//!     let mut world = CollisionWorld::new();
//!     world.add(StaticMeshComponent::new(mesh, Transform::identity().to_matrix())?);
//!
//!     let start = Vec3::new(0.5, -0.5, 10.0);
//!     let end = Vec3::new(0.5, -0.5, -10.0);
//!     if let Some(hit) = world.line_check(&start, &end, &Vec3::zeros(), TraceFlags::empty()) {
//!         println!("hit at {:?} facing {:?}", hit.location, hit.normal);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, KdopBuildConfig, TraceConfig},
        foundation::{
            collections::PrimitiveKey,
            math::{Mat4, Transform, Vec3},
        },
        physics::{
            BoundingSphere, CheckResult, CollisionError, CollisionPrimitive, CollisionWorld, Heightfield,
            MaterialHandle, StaticMesh, StaticMeshComponent, TraceFlags,
        },
        spatial::{CollisionTriangle, KdopTree},
    };
}
