//! k-DOP tree
//!
//! A binary bounding volume hierarchy over a static triangle mesh. Nodes
//! live in a flat array and refer to their children by index; leaves refer to
//! a contiguous run of the tree's reordered triangle list.
//!
//! The tree is built top down with the splatter heuristic: each node is split
//! around the mean triangle centroid along the axis where centroids have the
//! greatest variance.

use serde::{Deserialize, Serialize};

use crate::config::KdopBuildConfig;
use crate::foundation::logging::{debug, trace};
use crate::foundation::math::Vec3;
use crate::physics::collision::{
    find_separating_axis, line_check_triangle, SeparatingAxisPointCheck, Triangle,
};
use crate::physics::error::CollisionError;

use super::kdop::{Kdop, NUM_PLANES};
use super::kdop_check::{
    KdopBoxCheck, KdopHit, KdopLineCheck, KdopPointCheck, KdopPointHit, KdopSphereQuery,
};

/// Default triangle count at or below which a node becomes a leaf
pub const MAX_TRIS_PER_LEAF: usize = 5;

/// A triangle as stored by the tree: three vertex indices and a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionTriangle {
    /// First vertex index
    pub v1: u32,
    /// Second vertex index
    pub v2: u32,
    /// Third vertex index
    pub v3: u32,
    /// Index into the owning component's material list
    pub material_index: u16,
}

impl CollisionTriangle {
    /// Creates a collision triangle
    pub fn new(v1: u32, v2: u32, v3: u32, material_index: u16) -> Self {
        Self { v1, v2, v3, material_index }
    }

    /// The three vertex indices in winding order
    pub fn indices(&self) -> [u32; 3] {
        [self.v1, self.v2, self.v3]
    }

    /// Resolves the vertex positions
    pub fn to_triangle(&self, vertices: &[Vec3]) -> Triangle {
        Triangle::new(
            vertices[self.v1 as usize],
            vertices[self.v2 as usize],
            vertices[self.v3 as usize],
        )
    }
}

/// A triangle plus its centroid, used only while building
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BuildTriangle {
    triangle: CollisionTriangle,
    centroid: Vec3,
}

impl BuildTriangle {
    fn validated(position: usize, triangle: CollisionTriangle, vertices: &[Vec3]) -> Result<Self, CollisionError> {
        check_indices(position, &triangle, vertices.len())?;
        Ok(Self {
            triangle,
            centroid: triangle.to_triangle(vertices).centroid(),
        })
    }
}

fn check_indices(position: usize, triangle: &CollisionTriangle, vertex_count: usize) -> Result<(), CollisionError> {
    match triangle.indices().into_iter().find(|&i| i as usize >= vertex_count) {
        Some(index) => Err(CollisionError::VertexIndexOutOfRange {
            triangle: position,
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// What a node holds besides its bounding volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdopNodeKind {
    /// A run of `count` triangles starting at `start`
    Leaf {
        /// First triangle index
        start: u32,
        /// Number of triangles
        count: u32,
    },
    /// Two child nodes
    Internal {
        /// Left child node index
        left: u32,
        /// Right child node index
        right: u32,
    },
}

/// A node of the tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdopNode {
    /// Bounds of every triangle below this node
    pub bounding_volume: Kdop,
    /// Leaf range or child indices
    pub kind: KdopNodeKind,
}

impl KdopNode {
    fn placeholder() -> Self {
        Self {
            bounding_volume: Kdop::new(),
            kind: KdopNodeKind::Leaf { start: 0, count: 0 },
        }
    }
}

/// Bounding volume hierarchy over a triangle mesh
///
/// Vertices are owned by the mesh, not the tree; every query takes the same
/// vertex slice the tree was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KdopTree {
    nodes: Vec<KdopNode>,
    triangles: Vec<CollisionTriangle>,
}

impl KdopTree {
    /// Validates raw triangles, then builds
    pub fn from_triangles(
        vertices: &[Vec3],
        triangles: &[CollisionTriangle],
        config: &KdopBuildConfig,
    ) -> Result<Self, CollisionError> {
        config.validate()?;
        let build_triangles = triangles
            .iter()
            .enumerate()
            .map(|(position, triangle)| BuildTriangle::validated(position, *triangle, vertices))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build_unchecked(vertices, build_triangles, config.max_tris_per_leaf))
    }

    /// Checks that every node, leaf range and vertex index is in bounds for
    /// `vertices`. Trees from [`KdopTree::from_triangles`] always pass; loaded
    /// trees should be checked before they are queried.
    pub fn validate(&self, vertices: &[Vec3]) -> Result<(), CollisionError> {
        for (index, node) in self.nodes.iter().enumerate() {
            let in_bounds = match node.kind {
                KdopNodeKind::Leaf { start, count } => {
                    (start as usize).checked_add(count as usize).is_some_and(|end| end <= self.triangles.len())
                }
                KdopNodeKind::Internal { left, right } => {
                    // Children always follow their parent
                    let child_ok = |child: u32| (child as usize) > index && (child as usize) < self.nodes.len();
                    child_ok(left) && child_ok(right)
                }
            };
            if !in_bounds {
                return Err(CollisionError::CorruptTree { node: index });
            }
        }
        for (position, triangle) in self.triangles.iter().enumerate() {
            check_indices(position, triangle, vertices.len())?;
        }
        Ok(())
    }

    fn build_unchecked(vertices: &[Vec3], mut build_triangles: Vec<BuildTriangle>, max_tris_per_leaf: usize) -> Self {
        if build_triangles.is_empty() {
            return Self::default();
        }

        let mut nodes = Vec::with_capacity(build_triangles.len() * 2);
        nodes.push(KdopNode::placeholder());

        // (node, start, count, depth); popping left before right keeps node
        // indices in depth first order
        let mut pending = vec![(0_usize, 0_usize, build_triangles.len(), 1_usize)];
        let mut max_depth = 0;
        let mut leaf_count = 0;

        while let Some((node_index, start, count, depth)) = pending.pop() {
            max_depth = max_depth.max(depth);
            let range = &mut build_triangles[start..start + count];
            let bounding_volume = Kdop::from_triangles(vertices, range.iter().map(|b| &b.triangle));

            let kind = if count > max_tris_per_leaf {
                let split = partition_by_splatter(range);
                let left = nodes.len();
                nodes.push(KdopNode::placeholder());
                nodes.push(KdopNode::placeholder());
                pending.push((left + 1, start + split, count - split, depth + 1));
                pending.push((left, start, split, depth + 1));
                KdopNodeKind::Internal {
                    left: left as u32,
                    right: (left + 1) as u32,
                }
            } else {
                leaf_count += 1;
                KdopNodeKind::Leaf {
                    start: start as u32,
                    count: count as u32,
                }
            };

            nodes[node_index] = KdopNode { bounding_volume, kind };
        }

        nodes.shrink_to_fit();
        let triangles: Vec<CollisionTriangle> = build_triangles.iter().map(|b| b.triangle).collect();

        debug!(
            "Built k-DOP tree: {} triangles, {} nodes, {} leaves, depth {}",
            triangles.len(),
            nodes.len(),
            leaf_count,
            max_depth
        );

        Self { nodes, triangles }
    }

    /// True when the tree has no triangles
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[KdopNode] {
        &self.nodes
    }

    /// Triangles in tree order; leaf ranges index into this
    pub fn triangles(&self) -> &[CollisionTriangle] {
        &self.triangles
    }

    /// Bounds of the whole mesh
    pub fn root_bounds(&self) -> Option<&Kdop> {
        self.nodes.first().map(|node| &node.bounding_volume)
    }

    /// Nearest crossing of a local segment with any triangle.
    ///
    /// Only hits closer than `hit.time` are recorded. Returns true when `hit`
    /// was improved.
    ///
    /// # Panics
    ///
    /// If `vertices` is not the slice the tree was built from and is too
    /// short for its indices. See [`KdopTree::validate`].
    pub fn line_check(&self, vertices: &[Vec3], check: &KdopLineCheck, hit: &mut KdopHit) -> bool {
        match self.nodes.first() {
            Some(root) if root.bounding_volume.line_check(check).is_some() => {
                self.line_check_node(0, vertices, check, hit)
            }
            _ => false,
        }
    }

    fn line_check_node(&self, node_index: usize, vertices: &[Vec3], check: &KdopLineCheck, hit: &mut KdopHit) -> bool {
        let (left, right) = match self.nodes[node_index].kind {
            KdopNodeKind::Leaf { start, count } => {
                return self.leaf_triangles(start, count).fold(false, |found, triangle| {
                    Self::line_check_triangle(triangle, vertices, check, hit) | found
                });
            }
            KdopNodeKind::Internal { left, right } => (left as usize, right as usize),
        };

        let left_time = self.nodes[left].bounding_volume.line_check(check);
        let right_time = self.nodes[right].bounding_volume.line_check(check);
        let Some((near, near_time, far)) = order_children(left, left_time, right, right_time) else {
            return false;
        };

        let mut found = false;
        if hit.time > near_time {
            found = self.line_check_node(near, vertices, check, hit);
        }
        if let Some((far, far_time)) = far {
            if hit.time > far_time {
                found |= self.line_check_node(far, vertices, check, hit);
            }
        }
        found
    }

    fn line_check_triangle(triangle: &CollisionTriangle, vertices: &[Vec3], check: &KdopLineCheck, hit: &mut KdopHit) -> bool {
        let Some(crossing) = line_check_triangle(&triangle.to_triangle(vertices), &check.start, &check.end, hit.time) else {
            return false;
        };
        hit.time = crossing.time;
        hit.normal = crossing.normal;
        hit.material_index = triangle.material_index;
        true
    }

    /// Earliest contact of a swept box with any triangle
    pub fn box_check(&self, vertices: &[Vec3], check: &KdopBoxCheck, hit: &mut KdopHit) -> bool {
        match self.nodes.first() {
            Some(root) if root.bounding_volume.expanded(&check.local_extent).line_check(&check.line).is_some() => {
                self.box_check_node(0, vertices, check, hit)
            }
            _ => false,
        }
    }

    fn box_check_node(&self, node_index: usize, vertices: &[Vec3], check: &KdopBoxCheck, hit: &mut KdopHit) -> bool {
        let (left, right) = match self.nodes[node_index].kind {
            KdopNodeKind::Leaf { start, count } => {
                return self.leaf_triangles(start, count).fold(false, |found, triangle| {
                    Self::box_check_triangle(triangle, vertices, check, hit) | found
                });
            }
            KdopNodeKind::Internal { left, right } => (left as usize, right as usize),
        };

        let expanded_time = |index: usize| {
            self.nodes[index]
                .bounding_volume
                .expanded(&check.local_extent)
                .line_check(&check.line)
        };
        let Some((near, _, far)) = order_children(left, expanded_time(left), right, expanded_time(right)) else {
            return false;
        };

        // The near child is always searched; the far one also whenever the
        // near subtree produced nothing
        let mut found = self.box_check_node(near, vertices, check, hit);
        if let Some((far, far_time)) = far {
            if hit.time > far_time || !found {
                found |= self.box_check_node(far, vertices, check, hit);
            }
        }
        found
    }

    fn box_check_triangle(triangle: &CollisionTriangle, vertices: &[Vec3], check: &KdopBoxCheck, hit: &mut KdopHit) -> bool {
        let swept = find_separating_axis(
            &triangle.to_triangle(vertices),
            &check.line.start,
            &check.line.end,
            &check.local_box,
            1.0,
        );
        match swept {
            Some(swept) if swept.time < hit.time => {
                hit.time = swept.time;
                hit.normal = swept.normal;
                hit.material_index = triangle.material_index;
                true
            }
            _ => false,
        }
    }

    /// Shallowest penetration of a box placed at a point
    pub fn point_check(&self, vertices: &[Vec3], check: &KdopPointCheck, hit: &mut KdopPointHit) -> bool {
        let extent = &check.box_check.local_extent;
        match self.nodes.first() {
            Some(root) if root.bounding_volume.expanded(extent).point_check(check.location()) => {
                self.point_check_node(0, vertices, check, hit)
            }
            _ => false,
        }
    }

    fn point_check_node(&self, node_index: usize, vertices: &[Vec3], check: &KdopPointCheck, hit: &mut KdopPointHit) -> bool {
        match self.nodes[node_index].kind {
            KdopNodeKind::Leaf { start, count } => self.leaf_triangles(start, count).fold(false, |found, triangle| {
                Self::point_check_triangle(triangle, vertices, check, hit) | found
            }),
            KdopNodeKind::Internal { left, right } => {
                let extent = &check.box_check.local_extent;
                let mut found = false;
                for child in [left as usize, right as usize] {
                    if self.nodes[child].bounding_volume.expanded(extent).point_check(check.location()) {
                        found |= self.point_check_node(child, vertices, check, hit);
                    }
                }
                found
            }
        }
    }

    fn point_check_triangle(triangle: &CollisionTriangle, vertices: &[Vec3], check: &KdopPointCheck, hit: &mut KdopPointHit) -> bool {
        let overlap = SeparatingAxisPointCheck::new(
            &triangle.to_triangle(vertices),
            check.location(),
            &check.box_check.local_box,
            hit.best_distance,
        );
        if overlap.hit && overlap.best_dist < hit.best_distance {
            hit.best_distance = overlap.best_dist;
            hit.normal = overlap.hit_normal;
            hit.material_index = triangle.material_index;
            true
        } else {
            false
        }
    }

    /// Appends the index of every triangle in a leaf whose bounds overlap
    /// the query box. Indices refer to [`KdopTree::triangles`].
    pub fn sphere_query(&self, query: &KdopSphereQuery, triangles: &mut Vec<u32>) {
        match self.nodes.first() {
            Some(root) if root.bounding_volume.aabb_overlap_check(&query.local_box) => {
                self.sphere_query_node(0, query, triangles);
            }
            _ => {}
        }
    }

    fn sphere_query_node(&self, node_index: usize, query: &KdopSphereQuery, triangles: &mut Vec<u32>) {
        match self.nodes[node_index].kind {
            KdopNodeKind::Leaf { start, count } => triangles.extend(start..start + count),
            KdopNodeKind::Internal { left, right } => {
                for child in [left as usize, right as usize] {
                    if self.nodes[child].bounding_volume.aabb_overlap_check(&query.local_box) {
                        self.sphere_query_node(child, query, triangles);
                    }
                }
            }
        }
    }

    fn leaf_triangles(&self, start: u32, count: u32) -> impl Iterator<Item = &CollisionTriangle> {
        self.triangles[start as usize..(start + count) as usize].iter()
    }
}

/// Orders two children by entry time. Returns the near child and its time,
/// plus the far child when both were entered.
fn order_children(
    left: usize,
    left_time: Option<f32>,
    right: usize,
    right_time: Option<f32>,
) -> Option<(usize, f32, Option<(usize, f32)>)> {
    match (left_time, right_time) {
        (Some(lt), Some(rt)) if rt < lt => Some((right, rt, Some((left, lt)))),
        (Some(lt), Some(rt)) => Some((left, lt, Some((right, rt)))),
        (Some(lt), None) => Some((left, lt, None)),
        (None, Some(rt)) => Some((right, rt, None)),
        (None, None) => None,
    }
}

/// Picks the plane with the greatest centroid variance, later planes winning
/// ties, and returns it with the centroid mean along it
fn splatter_plane(range: &[BuildTriangle]) -> (usize, f32) {
    let count = range.len() as f32;
    let mut best = (0, 0.0);
    let mut best_variance = 0.0;

    for plane in 0..NUM_PLANES {
        let mean = range.iter().map(|b| b.centroid[plane]).sum::<f32>() / count;
        let variance = range
            .iter()
            .map(|b| {
                let offset = b.centroid[plane] - mean;
                offset * offset
            })
            .sum::<f32>()
            / count;

        if variance >= best_variance {
            best = (plane, mean);
            best_variance = variance;
        }
    }
    best
}

/// Reorders `range` so triangles with centroids below the mean come first.
/// Returns the size of the left half, never zero or `range.len()`.
fn partition_by_splatter(range: &mut [BuildTriangle]) -> usize {
    let (plane, mean) = splatter_plane(range);
    let count = range.len() as isize;
    let below = |b: &BuildTriangle| b.centroid[plane] < mean;

    let mut left: isize = -1;
    let mut right: isize = count;
    while left < right {
        loop {
            left += 1;
            if left >= right || !below(&range[left as usize]) {
                break;
            }
        }
        loop {
            right -= 1;
            if right <= left || below(&range[right as usize]) {
                break;
            }
        }
        if left < right {
            range.swap(left as usize, right as usize);
        }
    }

    if left == count || right == 0 {
        trace!("Splatter split of {} triangles was one sided, halving", count);
        left = count / 2;
    }
    left as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::tests::fixtures::{cube_vertices, cube_triangles, grid_mesh};
    use approx::assert_relative_eq;

    fn build(vertices: &[Vec3], triangles: &[CollisionTriangle]) -> KdopTree {
        KdopTree::from_triangles(vertices, triangles, &KdopBuildConfig::default()).expect("valid mesh")
    }

    fn leaf_ranges(tree: &KdopTree) -> Vec<(u32, u32)> {
        tree.nodes()
            .iter()
            .filter_map(|node| match node.kind {
                KdopNodeKind::Leaf { start, count } => Some((start, count)),
                KdopNodeKind::Internal { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_mesh_builds_empty_tree() {
        let tree = build(&[], &[]);
        assert!(tree.is_empty());
        assert!(tree.root_bounds().is_none());

        let mut hit = KdopHit::new();
        let check = KdopLineCheck::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!tree.line_check(&[], &check, &mut hit));

        let mut found = Vec::new();
        let query = KdopSphereQuery { local_box: crate::physics::collision::Aabb::new(Vec3::repeat(-1.0), Vec3::repeat(1.0)) };
        tree.sphere_query(&query, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn test_small_mesh_is_single_leaf() {
        let vertices = cube_vertices();
        let triangles = &cube_triangles()[..4];
        let tree = build(&vertices, triangles);

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.nodes()[0].kind, KdopNodeKind::Leaf { start: 0, count: 4 });
    }

    #[test]
    fn test_leaves_respect_size_bound_and_cover_all_triangles() {
        let (vertices, triangles) = grid_mesh(12, 9);
        let tree = build(&vertices, &triangles);

        let mut covered = vec![false; triangles.len()];
        for (start, count) in leaf_ranges(&tree) {
            assert!(count as usize <= MAX_TRIS_PER_LEAF);
            assert!(count > 0);
            for index in start..start + count {
                assert!(!covered[index as usize], "triangle {index} is in two leaves");
                covered[index as usize] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn test_reordered_triangles_are_a_permutation() {
        let (vertices, triangles) = grid_mesh(7, 5);
        let tree = build(&vertices, &triangles);

        let mut expected = triangles.clone();
        let mut actual = tree.triangles().to_vec();
        let key = |t: &CollisionTriangle| (t.v1, t.v2, t.v3, t.material_index);
        expected.sort_by_key(key);
        actual.sort_by_key(key);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_node_volumes_contain_their_triangles() {
        let (vertices, triangles) = grid_mesh(6, 6);
        let tree = build(&vertices, &triangles);

        fn check(tree: &KdopTree, vertices: &[Vec3], index: usize) -> Vec<u32> {
            let node = &tree.nodes()[index];
            let below: Vec<u32> = match node.kind {
                KdopNodeKind::Leaf { start, count } => (start..start + count).collect(),
                KdopNodeKind::Internal { left, right } => {
                    let mut all = check(tree, vertices, left as usize);
                    all.extend(check(tree, vertices, right as usize));
                    all
                }
            };
            for &triangle in &below {
                for vertex in tree.triangles()[triangle as usize].indices() {
                    assert!(node.bounding_volume.point_check(&vertices[vertex as usize]));
                }
            }
            below
        }

        assert_eq!(check(&tree, &vertices, 0).len(), triangles.len());
    }

    #[test]
    fn test_internal_nodes_are_allocated_depth_first() {
        let (vertices, triangles) = grid_mesh(8, 8);
        let tree = build(&vertices, &triangles);

        // Children always follow their parent and come in adjacent pairs
        for (index, node) in tree.nodes().iter().enumerate() {
            if let KdopNodeKind::Internal { left, right } = node.kind {
                assert!(left as usize > index);
                assert_eq!(right, left + 1);
            }
        }
        assert_eq!(tree.nodes().len(), 2 * leaf_ranges(&tree).len() - 1);
    }

    #[test]
    fn test_coincident_centroids_split_in_half() {
        // Ten copies of the same triangle
        let vertices = vec![Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let triangles: Vec<_> = (0..10).map(|m| CollisionTriangle::new(0, 1, 2, m)).collect();
        let tree = build(&vertices, &triangles);

        let root = tree.nodes()[0];
        let KdopNodeKind::Internal { left, right } = root.kind else {
            panic!("root should split");
        };
        assert_eq!(tree.nodes()[left as usize].kind, KdopNodeKind::Leaf { start: 0, count: 5 });
        assert_eq!(tree.nodes()[right as usize].kind, KdopNodeKind::Leaf { start: 5, count: 5 });
    }

    #[test]
    fn test_invalid_vertex_index_is_rejected() {
        let vertices = cube_vertices();
        let triangles = [CollisionTriangle::new(0, 1, 2, 0), CollisionTriangle::new(0, 1, 99, 0)];
        let result = KdopTree::from_triangles(&vertices, &triangles, &KdopBuildConfig::default());
        assert!(matches!(
            result,
            Err(CollisionError::VertexIndexOutOfRange { triangle: 1, index: 99, vertex_count: 8 })
        ));
    }

    #[test]
    fn test_validate_checks_vertices_against_tree() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());
        assert!(tree.validate(&vertices).is_ok());

        let result = tree.validate(&vertices[..4]);
        assert!(matches!(
            result,
            Err(CollisionError::VertexIndexOutOfRange { vertex_count: 4, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_node_links() {
        let vertices = cube_vertices();
        let mut tree = build(&vertices, &cube_triangles());

        let mut dangling = tree.clone();
        dangling.nodes[0].kind = KdopNodeKind::Internal { left: 1, right: 99 };
        assert!(matches!(dangling.validate(&vertices), Err(CollisionError::CorruptTree { node: 0 })));

        // A child pointing back at its parent would never terminate
        let KdopNodeKind::Internal { left, .. } = tree.nodes[0].kind else {
            panic!("cube root should split");
        };
        tree.nodes[0].kind = KdopNodeKind::Internal { left, right: 0 };
        assert!(matches!(tree.validate(&vertices), Err(CollisionError::CorruptTree { node: 0 })));

        let mut overrun = build(&vertices, &cube_triangles()[..3]);
        overrun.nodes[0].kind = KdopNodeKind::Leaf { start: 2, count: 5 };
        assert!(matches!(overrun.validate(&vertices), Err(CollisionError::CorruptTree { node: 0 })));
    }

    #[test]
    fn test_zero_leaf_size_is_rejected() {
        let vertices = cube_vertices();
        let config = KdopBuildConfig::default().with_max_tris_per_leaf(0);
        let result = KdopTree::from_triangles(&vertices, &cube_triangles(), &config);
        assert!(matches!(result, Err(CollisionError::Config(_))));
    }

    #[test]
    fn test_cube_line_check_hits_top_face() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        let check = KdopLineCheck::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let mut hit = KdopHit::new();
        assert!(tree.line_check(&vertices, &check, &mut hit));
        assert_relative_eq!(hit.time, 0.4, epsilon = 1e-5);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_line_check_keeps_better_incoming_hit() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        let check = KdopLineCheck::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let mut hit = KdopHit { time: 0.2, ..KdopHit::new() };
        assert!(!tree.line_check(&vertices, &check, &mut hit));
        assert_relative_eq!(hit.time, 0.2);
    }

    #[test]
    fn test_cube_box_check_contacts_earlier_than_line() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        let check = KdopBoxCheck::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0), Vec3::repeat(0.5));
        let mut hit = KdopHit::new();
        assert!(tree.box_check(&vertices, &check, &mut hit));
        assert_relative_eq!(hit.time, 0.35, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.normalize(), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_cube_point_check_pushes_out_of_nearest_face() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        // Box of half size 0.25 poking 0.1 into the +x face
        let check = KdopPointCheck::new(Vec3::new(1.15, 0.5, -0.5), Vec3::repeat(0.25));
        let mut hit = KdopPointHit::new();
        assert!(tree.point_check(&vertices, &check, &mut hit));
        assert_relative_eq!(hit.best_distance, 0.1, epsilon = 1e-5);
        assert_relative_eq!(hit.normal, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_point_check_far_from_mesh_misses() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        let check = KdopPointCheck::new(Vec3::new(4.0, 0.0, 0.0), Vec3::repeat(0.25));
        let mut hit = KdopPointHit::new();
        assert!(!tree.point_check(&vertices, &check, &mut hit));
    }

    #[test]
    fn test_sphere_query_returns_nearby_triangles_only() {
        let (vertices, triangles) = grid_mesh(10, 10);
        let tree = build(&vertices, &triangles);

        let query = KdopSphereQuery {
            local_box: crate::physics::collision::Aabb::from_center_extents(Vec3::new(0.5, 0.5, 0.0), Vec3::repeat(0.25)),
        };
        let mut found = Vec::new();
        tree.sphere_query(&query, &mut found);

        // Both triangles of the cell under the box are candidates
        let under: Vec<u32> = (0..tree.triangles().len() as u32)
            .filter(|&i| {
                let t = tree.triangles()[i as usize].to_triangle(&vertices);
                t.vertices().iter().all(|v| v.x <= 1.0 && v.y <= 1.0)
            })
            .collect();
        assert_eq!(under.len(), 2);
        for index in &under {
            assert!(found.contains(index));
        }
        assert!(found.len() < tree.triangles().len());
    }

    #[test]
    fn test_tree_survives_ron_round_trip() {
        let vertices = cube_vertices();
        let tree = build(&vertices, &cube_triangles());

        let text = ron::to_string(&tree).expect("serialize");
        let restored: KdopTree = ron::from_str(&text).expect("deserialize");
        assert_eq!(restored, tree);
    }
}
