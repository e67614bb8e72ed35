//! World space results of collision queries

use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::foundation::collections::PrimitiveKey;
use crate::foundation::math::{utils, Vec3};

/// Opaque handle to a material owned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// Outcome of a line, box or point check against a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckResult {
    /// Fraction of the trace at the (pulled back) hit; zero for point checks
    pub time: f32,
    /// World space hit location
    pub location: Vec3,
    /// Unit world space surface normal
    pub normal: Vec3,
    /// Material of the surface hit, when the primitive has one
    pub material: Option<MaterialHandle>,
    /// Primitive that was hit, filled in by [`crate::physics::CollisionWorld`]
    pub primitive: Option<PrimitiveKey>,
}

impl CheckResult {
    /// Result for a trace from `start` to `end` stopping at `time`
    pub fn on_trace(start: &Vec3, end: &Vec3, time: f32, normal: Vec3) -> Self {
        Self {
            time,
            location: start + (end - start) * time,
            normal,
            material: None,
            primitive: None,
        }
    }
}

/// Moves a hit time back toward the trace start so the reported location
/// sits just off the surface, then clamps it to `[0, 1]`
pub fn pull_back_time(time: f32, trace_length: f32, config: &TraceConfig) -> f32 {
    let pull_back = utils::clamp(
        config.pull_back_fraction,
        config.min_pull_back / trace_length,
        config.max_pull_back / trace_length,
    );
    utils::clamp(time - pull_back, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pull_back_uses_fraction_for_medium_traces() {
        // 10 units long: fraction 0.1 lies within [0.01, 0.4]
        assert_relative_eq!(pull_back_time(0.5, 10.0, &TraceConfig::static_mesh()), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_pull_back_distance_is_clamped() {
        // 100 units long: at most 4 units back
        assert_relative_eq!(pull_back_time(0.5, 100.0, &TraceConfig::static_mesh()), 0.46, epsilon = 1e-6);
        // Terrain caps at 1 unit
        assert_relative_eq!(pull_back_time(0.5, 100.0, &TraceConfig::terrain()), 0.49, epsilon = 1e-6);
        // 0.5 units long: at least 0.1 units back
        assert_relative_eq!(pull_back_time(0.5, 0.5, &TraceConfig::static_mesh()), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_pull_back_never_goes_negative() {
        assert_relative_eq!(pull_back_time(0.01, 10.0, &TraceConfig::static_mesh()), 0.0);
        assert_relative_eq!(pull_back_time(0.0, 0.0, &TraceConfig::static_mesh()), 0.0);
    }

    #[test]
    fn test_on_trace_interpolates_location() {
        let result = CheckResult::on_trace(&Vec3::zeros(), &Vec3::new(10.0, 0.0, 0.0), 0.25, Vec3::x());
        assert_relative_eq!(result.location, Vec3::new(2.5, 0.0, 0.0));
    }
}
