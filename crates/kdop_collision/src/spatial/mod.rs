//! Spatial partitioning data structures
//!
//! A k-DOP tree over static triangle meshes, its bounding volume, and the
//! per-query state used to walk it.

pub mod kdop;
pub mod kdop_check;
pub mod kdop_tree;

pub use kdop::{Kdop, FUDGE_SIZE, NUM_PLANES};
pub use kdop_check::{KdopBoxCheck, KdopHit, KdopLineCheck, KdopPointCheck, KdopPointHit, KdopSphereQuery};
pub use kdop_tree::{CollisionTriangle, KdopNode, KdopNodeKind, KdopTree, MAX_TRIS_PER_LEAF};
