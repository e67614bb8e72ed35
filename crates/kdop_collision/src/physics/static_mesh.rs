//! Static mesh collision
//!
//! A [`StaticMesh`] owns vertex positions and the k-DOP tree built over its
//! triangles. A [`StaticMeshComponent`] places a shared mesh in the world and
//! answers world space queries by moving them into the mesh's local space,
//! running the tree query, and moving the result back out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{KdopBuildConfig, TraceConfig};
use crate::foundation::logging::warn;
use crate::foundation::math::{safe_normal, utils, Mat4, Mat4Ext, Vec3};
use crate::physics::check_result::{pull_back_time, CheckResult, MaterialHandle};
use crate::physics::collision::{Aabb, BoundingSphere};
use crate::physics::error::CollisionError;
use crate::spatial::kdop_check::{
    KdopBoxCheck, KdopHit, KdopLineCheck, KdopPointCheck, KdopPointHit, KdopSphereQuery,
};
use crate::spatial::kdop_tree::{CollisionTriangle, KdopTree};

/// Collision geometry for one mesh asset
///
/// Loading checks the stored tree against the stored vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StaticMeshData")]
pub struct StaticMesh {
    vertices: Vec<Vec3>,
    tree: KdopTree,
}

#[derive(Serialize, Deserialize)]
struct StaticMeshData {
    vertices: Vec<Vec3>,
    tree: KdopTree,
}

impl TryFrom<StaticMeshData> for StaticMesh {
    type Error = CollisionError;

    fn try_from(data: StaticMeshData) -> Result<Self, Self::Error> {
        data.tree.validate(&data.vertices)?;
        Ok(Self {
            vertices: data.vertices,
            tree: data.tree,
        })
    }
}

impl StaticMesh {
    /// Builds collision with the default tree settings
    pub fn new(vertices: Vec<Vec3>, triangles: &[CollisionTriangle]) -> Result<Self, CollisionError> {
        Self::with_config(vertices, triangles, &KdopBuildConfig::default())
    }

    /// Builds collision with custom tree settings
    pub fn with_config(
        vertices: Vec<Vec3>,
        triangles: &[CollisionTriangle],
        config: &KdopBuildConfig,
    ) -> Result<Self, CollisionError> {
        let tree = KdopTree::from_triangles(&vertices, triangles, config)?;
        Ok(Self { vertices, tree })
    }

    /// Vertex positions in local space
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// The collision tree
    pub fn tree(&self) -> &KdopTree {
        &self.tree
    }

    /// Local space bounds, `None` for a mesh without triangles
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.tree.root_bounds().and_then(|kdop| kdop.to_aabb())
    }
}

/// A static mesh placed in the world
#[derive(Debug, Clone)]
pub struct StaticMeshComponent {
    mesh: Arc<StaticMesh>,
    local_to_world: Mat4,
    world_to_local: Mat4,
    materials: Vec<MaterialHandle>,
    trace: TraceConfig,
}

impl StaticMeshComponent {
    /// Places `mesh` with the given transform
    pub fn new(mesh: Arc<StaticMesh>, local_to_world: Mat4) -> Result<Self, CollisionError> {
        let world_to_local = local_to_world.try_inverse().ok_or(CollisionError::SingularTransform)?;
        Ok(Self {
            mesh,
            local_to_world,
            world_to_local,
            materials: Vec::new(),
            trace: TraceConfig::static_mesh(),
        })
    }

    /// Material handles indexed by triangle material index
    pub fn with_materials(mut self, materials: Vec<MaterialHandle>) -> Self {
        self.materials = materials;
        self
    }

    /// Override how far hits are pulled back
    pub fn with_trace_config(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Moves the component
    pub fn set_local_to_world(&mut self, local_to_world: Mat4) -> Result<(), CollisionError> {
        self.world_to_local = local_to_world.try_inverse().ok_or(CollisionError::SingularTransform)?;
        self.local_to_world = local_to_world;
        Ok(())
    }

    /// The shared mesh
    pub fn mesh(&self) -> &Arc<StaticMesh> {
        &self.mesh
    }

    /// Current placement
    pub fn local_to_world(&self) -> &Mat4 {
        &self.local_to_world
    }

    /// Material for a triangle material index, if one was assigned
    pub fn material(&self, material_index: u16) -> Option<MaterialHandle> {
        self.materials.get(usize::from(material_index)).copied()
    }

    /// World space bounds
    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh.local_bounds().map(|bounds| bounds.transform_by(&self.local_to_world))
    }

    /// Traces a line (zero `extent`) or swept box from `start` to `end`.
    ///
    /// Returns the nearest hit with its time pulled back slightly toward
    /// `start`.
    pub fn line_check(&self, start: &Vec3, end: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        let tree = self.mesh.tree();
        if tree.is_empty() {
            return None;
        }

        let vertices = self.mesh.vertices();
        let mut hit = KdopHit::new();
        let found = if *extent == Vec3::zeros() {
            let check = KdopLineCheck::from_world(&self.world_to_local, start, end);
            tree.line_check(vertices, &check, &mut hit)
        } else {
            let check = KdopBoxCheck::from_world(&self.world_to_local, start, end, extent);
            tree.box_check(vertices, &check, &mut hit)
        };

        if !found {
            return None;
        }

        let time = pull_back_time(hit.time, (end - start).magnitude(), &self.trace);
        Some(CheckResult {
            material: self.material(hit.material_index),
            ..CheckResult::on_trace(start, end, time, self.world_normal(&hit.normal))
        })
    }

    /// Tests a box of half size `extent` centered at `location`.
    ///
    /// On overlap the result's location is the point pushed out of the
    /// shallowest penetrated surface and the normal is the push direction.
    pub fn point_check(&self, location: &Vec3, extent: &Vec3) -> Option<CheckResult> {
        let tree = self.mesh.tree();
        if tree.is_empty() {
            return None;
        }

        let check = KdopPointCheck::from_world(&self.world_to_local, location, extent);
        let mut hit = KdopPointHit::new();
        if !tree.point_check(self.mesh.vertices(), &check, &mut hit) {
            return None;
        }

        let local_location = check.location() + hit.normal * hit.best_distance;
        Some(CheckResult {
            time: 0.0,
            location: self.local_to_world.transform_position(&local_location),
            normal: self.world_normal(&hit.normal),
            material: self.material(hit.material_index),
            primitive: None,
        })
    }

    /// Indices into the mesh tree's triangle list of every triangle whose
    /// leaf overlaps the sphere's bounds
    pub fn sphere_query(&self, sphere: &BoundingSphere) -> Vec<u32> {
        let mut triangles = Vec::new();
        if sphere.radius < 0.0 {
            warn!("Sphere query with negative radius {}", sphere.radius);
            return triangles;
        }
        let query = KdopSphereQuery::from_world(&self.world_to_local, sphere);
        self.mesh.tree().sphere_query(&query, &mut triangles);
        triangles
    }

    fn world_normal(&self, local_normal: &Vec3) -> Vec3 {
        let determinant_sign = utils::sign(self.local_to_world.basis_determinant());
        safe_normal(&(self.local_to_world.transpose_adjoint() * local_normal)) * determinant_sign
    }
}
