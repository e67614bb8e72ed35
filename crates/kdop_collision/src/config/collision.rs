//! Collision configuration

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::spatial::kdop_tree::MAX_TRIS_PER_LEAF;

/// Top level collision configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// k-DOP tree build settings
    pub build: KdopBuildConfig,
    /// Static mesh trace settings
    pub static_mesh_trace: TraceConfig,
    /// Terrain trace settings
    pub terrain_trace: TraceConfig,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            build: KdopBuildConfig::default(),
            static_mesh_trace: TraceConfig::static_mesh(),
            terrain_trace: TraceConfig::terrain(),
        }
    }
}

impl CollisionConfig {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build.validate()?;
        self.static_mesh_trace.validate()?;
        self.terrain_trace.validate()
    }
}

impl Config for CollisionConfig {}

/// Settings for building k-DOP trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdopBuildConfig {
    /// Triangle count at or below which a node becomes a leaf
    pub max_tris_per_leaf: usize,
}

impl Default for KdopBuildConfig {
    fn default() -> Self {
        Self {
            max_tris_per_leaf: MAX_TRIS_PER_LEAF,
        }
    }
}

impl KdopBuildConfig {
    /// Set the leaf size
    pub fn with_max_tris_per_leaf(mut self, max_tris_per_leaf: usize) -> Self {
        self.max_tris_per_leaf = max_tris_per_leaf;
        self
    }

    /// Validate the build settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tris_per_leaf == 0 {
            return Err(ConfigError::Invalid("max_tris_per_leaf must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// How far a reported hit is pulled back along the trace.
///
/// The hit time is reduced by `pull_back_fraction` of the trace, as long as
/// that distance stays within `[min_pull_back, max_pull_back]` world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Preferred pull back as a fraction of the trace length
    pub pull_back_fraction: f32,
    /// Shortest pull back distance
    pub min_pull_back: f32,
    /// Longest pull back distance
    pub max_pull_back: f32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self::static_mesh()
    }
}

impl TraceConfig {
    /// Pull back used for static meshes
    pub fn static_mesh() -> Self {
        Self {
            pull_back_fraction: 0.1,
            min_pull_back: 0.1,
            max_pull_back: 4.0,
        }
    }

    /// Pull back used for terrain
    pub fn terrain() -> Self {
        Self {
            max_pull_back: 1.0,
            ..Self::static_mesh()
        }
    }

    /// Validate the trace settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pull_back < 0.0 || self.min_pull_back > self.max_pull_back {
            return Err(ConfigError::Invalid(format!(
                "pull back range [{}, {}] is empty",
                self.min_pull_back, self.max_pull_back
            )));
        }
        Ok(())
    }
}
