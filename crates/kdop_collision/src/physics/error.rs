//! Collision error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building collision data
#[derive(Error, Debug)]
pub enum CollisionError {
    /// A triangle references a vertex that does not exist
    #[error("triangle {triangle} references vertex {index} but the mesh has {vertex_count} vertices")]
    VertexIndexOutOfRange {
        /// Position of the offending triangle in the input list
        triangle: usize,
        /// The out of range vertex index
        index: u32,
        /// Number of vertices supplied
        vertex_count: usize,
    },

    /// A height field's sample grid does not match its dimensions
    #[error("height field of {size_x}x{size_y} samples needs {expected} heights, got {actual}")]
    HeightfieldSize {
        /// Samples along X
        size_x: usize,
        /// Samples along Y
        size_y: usize,
        /// Required number of heights
        expected: usize,
        /// Supplied number of heights
        actual: usize,
    },

    /// A loaded tree refers to a node or triangle it does not have
    #[error("k-DOP tree node {node} refers outside the tree")]
    CorruptTree {
        /// Index of the offending node
        node: usize,
    },

    /// A local-to-world transform cannot be inverted
    #[error("local-to-world transform is singular")]
    SingularTransform,

    /// Configuration was rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
