//! Math utilities and types
//!
//! Provides the nalgebra aliases used throughout the crate, a simple
//! position/rotation/scale transform and the affine helpers collision code
//! needs to move queries between world and local space.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a local-to-world matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Largest finite single precision value, used for "no hit yet" times
    pub const MAX_FLT: f32 = f32::MAX;

    /// Generic small tolerance for parallel and degenerate tests
    pub const DELTA: f32 = 0.000_01;

    /// Tolerance used when a vector is about to be normalized
    pub const SMALL_NUMBER: f32 = 1.0e-8;
}

/// Math utility functions
pub mod utils {
    /// Clamp a value between min and max.
    ///
    /// Unlike `f32::clamp` this never panics, which matters when the bounds
    /// come from dividing by a trace length that may be zero.
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Sign of a value, with zero mapping to zero
    pub fn sign(value: f32) -> f32 {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

/// Normalize `v`, returning zero for vectors too short to have a direction
pub fn safe_normal(v: &Vec3) -> Vec3 {
    v.try_normalize(constants::SMALL_NUMBER).unwrap_or_else(Vec3::zeros)
}

/// Affine helpers for 4x4 local-to-world style matrices
pub trait Mat4Ext {
    /// Transform a position (applies translation)
    fn transform_position(&self, position: &Vec3) -> Vec3;

    /// Transform a direction (ignores translation)
    fn transform_direction(&self, direction: &Vec3) -> Vec3;

    /// Columns of the upper 3x3 basis
    fn basis_columns(&self) -> [Vec3; 3];

    /// Determinant of the upper 3x3 basis
    fn basis_determinant(&self) -> f32;

    /// Transpose of the adjugate of the upper 3x3 basis.
    ///
    /// Transforms normals correctly under non-uniform scale without needing
    /// an inverse; multiply the result by the sign of
    /// [`Mat4Ext::basis_determinant`] for mirrored transforms.
    fn transpose_adjoint(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn transform_position(&self, position: &Vec3) -> Vec3 {
        let p = self * Vec4::new(position.x, position.y, position.z, 1.0);
        Vec3::new(p.x, p.y, p.z)
    }

    fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.transform_vector(direction)
    }

    fn basis_columns(&self) -> [Vec3; 3] {
        [0, 1, 2].map(|c| Vec3::new(self[(0, c)], self[(1, c)], self[(2, c)]))
    }

    fn basis_determinant(&self) -> f32 {
        let [c0, c1, c2] = self.basis_columns();
        c0.dot(&c1.cross(&c2))
    }

    fn transpose_adjoint(&self) -> Mat3 {
        let [c0, c1, c2] = self.basis_columns();
        Mat3::from_columns(&[c1.cross(&c2), c2.cross(&c0), c0.cross(&c1)])
    }
}
