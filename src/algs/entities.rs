//! Points, lines and faces of a topology as standalone topologies.

use log::debug;

use crate::algs::DerivedEntities;
use crate::data::Node;
use crate::mesh_error::MeshError;
use crate::topology::{IndexType, TopologyMetadata};

fn derive_dim(topo: &Node, coordset: &Node, dim: usize) -> Result<DerivedEntities, MeshError> {
    let meta = TopologyMetadata::new(topo, coordset)?;
    let top = meta.dim();
    if dim > top {
        return Err(MeshError::UnsupportedOperation(format!(
            "dimension {dim} entities of a {top}D topology"
        )));
    }
    let s2d = meta.get_dim_map(IndexType::Global, top, dim);
    let d2s = meta.get_dim_map(IndexType::Global, dim, top);
    debug!(
        "derived {} dimension {dim} entities from {} elements",
        meta.get_length(dim),
        meta.get_length(top)
    );
    Ok(DerivedEntities {
        topology: meta.dim_topo(dim).clone(),
        s2dmap: s2d.to_node(meta.int_dtype)?,
        d2smap: d2s.to_node(meta.int_dtype)?,
    })
}

/// Every point of `topo` as a `point` topology.
pub fn generate_points(topo: &Node, coordset: &Node) -> Result<DerivedEntities, MeshError> {
    derive_dim(topo, coordset, 0)
}

/// Every unique edge of `topo` as a `line` topology.
pub fn generate_lines(topo: &Node, coordset: &Node) -> Result<DerivedEntities, MeshError> {
    derive_dim(topo, coordset, 1)
}

/// Every unique face of `topo`; fails for topologies below two dimensions.
pub fn generate_faces(topo: &Node, coordset: &Node) -> Result<DerivedEntities, MeshError> {
    derive_dim(topo, coordset, 2)
}
