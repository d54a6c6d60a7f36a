//! Side decomposition: triangles (2D) or tetrahedra (3D) anchored at
//! centroids.
//!
//! Each element is walked down to its lines through LOCAL associations, so
//! every line keeps the direction its owning element gave it. A side is that
//! line's two endpoints followed by the centroids of the enclosing entities,
//! innermost first:
//! - 2D: line start, line end, face centroid.
//! - 3D: line start, line end, face centroid, cell centroid.
//!
//! The output coordset holds the original points, then the face centroids,
//! then (3D) the cell centroids. Lines get no centroid.

use std::collections::VecDeque;

use log::debug;

use crate::algs::centroids::entity_centroids;
use crate::algs::field_transfer::{SidesOptions, map_fields_to_sides};
use crate::algs::DerivedMesh;
use crate::coordset::Coords;
use crate::data::{DataType, Node, O2MRelation};
use crate::mesh;
use crate::mesh_error::MeshError;
use crate::topology::{ElementLayout, IndexType, ShapeType, TopologyMetadata, TopologyType};

/// Raw side decomposition shared by the topology builder and field remap.
#[derive(Clone, Debug)]
pub(crate) struct SideDecomposition {
    pub(crate) dim: usize,
    /// `dim + 1` point ids per side.
    pub(crate) connectivity: Vec<usize>,
    /// Source element of each side.
    pub(crate) parents: Vec<usize>,
    /// Sides of each source element.
    pub(crate) element_sides: O2MRelation,
    pub(crate) coords: Coords,
    /// Points `0..original_points` are the source coordset's points.
    pub(crate) original_points: usize,
    int_dtype: DataType,
    float_dtype: DataType,
}

impl SideDecomposition {
    pub(crate) fn build(topo: &Node, coordset: &Node) -> Result<Self, MeshError> {
        let meta = TopologyMetadata::new(topo, coordset)?;
        let dim = meta.dim();
        if dim < 2 {
            return Err(MeshError::UnsupportedOperation(format!(
                "sides of a {dim}D topology; input must be 2D or 3D"
            )));
        }
        let line_dim = 1;

        // original points, then centroids of every dimension above the lines
        let base = Coords::from_coordset(coordset)?;
        let original_points = base.len();
        let mut coords = base.clone();
        let mut dim_offsets = vec![0usize; dim + 1];
        for d in 1..=dim {
            dim_offsets[d] = coords.len();
            if d == line_dim {
                continue;
            }
            let centers = entity_centroids(
                &base,
                (0..meta.get_length(d)).map(|g| meta.entity_vertices(d, g)),
            );
            for i in 0..centers.len() {
                coords.push(&centers.point(i)[..coords.dim()]);
            }
        }

        let degree = dim + 1;
        let mut connectivity = Vec::with_capacity(degree * meta.get_embed_length(dim, line_dim));
        let mut parents = Vec::new();
        let mut element_sides = O2MRelation::default();
        let mut side = Vec::with_capacity(degree);

        for elem in 0..meta.get_local_length(dim) {
            let first = parents.len();
            let mut queue: VecDeque<(usize, usize, Vec<usize>)> = VecDeque::new();
            queue.push_back((elem, dim, Vec::new()));
            while let Some((lid, d, mut chain)) = queue.pop_front() {
                let children = meta.get_entity_assocs(IndexType::Local, lid, d, d - 1);
                if d > line_dim {
                    chain.push(lid);
                    for &child in children {
                        queue.push_back((child, d - 1, chain.clone()));
                    }
                    continue;
                }
                side.clear();
                side.extend(children.iter().map(|&p| meta.local_to_global(0, p)));
                for (depth, &parent) in chain.iter().rev().enumerate() {
                    let parent_dim = line_dim + depth + 1;
                    side.push(dim_offsets[parent_dim] + meta.local_to_global(parent_dim, parent));
                }
                connectivity.extend_from_slice(&side);
                parents.push(elem);
            }
            element_sides.push_group(&(first..parents.len()).collect::<Vec<_>>());
        }

        debug!(
            "generated {} sides over {} points from {} elements",
            parents.len(),
            coords.len(),
            element_sides.len()
        );
        Ok(Self {
            dim,
            connectivity,
            parents,
            element_sides,
            coords,
            original_points,
            int_dtype: meta.int_dtype,
            float_dtype: meta.float_dtype,
        })
    }

    pub(crate) fn shape(&self) -> ShapeType {
        if self.dim == 3 { ShapeType::Tet } else { ShapeType::Tri }
    }

    pub(crate) fn len(&self) -> usize {
        self.parents.len()
    }

    /// Point ids of side `s`.
    pub(crate) fn side(&self, s: usize) -> &[usize] {
        let n = self.dim + 1;
        &self.connectivity[s * n..(s + 1) * n]
    }

    fn into_mesh(self, dest_coordset: &str) -> Result<DerivedMesh, MeshError> {
        let mut topology = Node::object();
        topology.set_path("type", TopologyType::Unstructured.name());
        topology.set_path("coordset", dest_coordset);
        let shape = self.shape();
        let d2s = O2MRelation::from_groups(self.parents.iter().map(|&e| [e]));
        ElementLayout::Uniform {
            shape,
            connectivity: self.connectivity,
        }
        .write(&mut topology, self.int_dtype)?;
        Ok(DerivedMesh {
            topology,
            coordset: self.coords.to_node(self.float_dtype)?,
            s2dmap: self.element_sides.to_node(self.int_dtype)?,
            d2smap: d2s.to_node(self.int_dtype)?,
        })
    }
}

/// Decompose every element of a 2D or 3D topology into sides.
///
/// The new explicit coordset, named `dest_coordset`, holds the original
/// points followed by the generated centroids.
pub fn generate_sides(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<DerivedMesh, MeshError> {
    SideDecomposition::build(topo, coordset)?.into_mesh(dest_coordset)
}

/// [`generate_sides`] on topology `topo_name` of `domain`, also remapping the
/// domain's fields onto the sides.
///
/// `options` is validated (see [`SidesOptions::from_node`]) before anything
/// is computed. Returns the sides mesh and the generated `fields` tree.
pub fn generate_sides_with_fields(
    domain: &Node,
    topo_name: &str,
    dest_coordset: &str,
    options: &Node,
) -> Result<(DerivedMesh, Node), MeshError> {
    let options = SidesOptions::from_node(options)?;
    let empty = Node::object();
    let fields = domain.fetch("fields").unwrap_or(&empty);
    options.check_fields(fields, topo_name)?;
    let (topo, coordset) = mesh::topology_and_coordset(domain, topo_name)?;

    let sides = SideDecomposition::build(topo, coordset)?;
    let out_fields = map_fields_to_sides(&sides, topo_name, fields, &options)?;
    Ok((sides.into_mesh(dest_coordset)?, out_fields))
}
