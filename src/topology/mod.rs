//! Top-level module for mesh topology abstractions.
//!
//! This module provides the shape catalog, the element layouts of
//! unstructured topologies, representation converters, and the
//! dimensional-adjacency engine ([`TopologyMetadata`]) that every derived
//! entity generator is built on.
//! It includes:
//! - [`ShapeType`] and [`ShapeCascade`] describing element shapes per dimension
//! - [`ElementLayout`] parsed element blocks (uniform, mixed, polygonal, polyhedral)
//! - Grid indexing and implicit-to-explicit converters
//! - Offset generation for flattened connectivity

use core::fmt;
use std::str::FromStr;

use crate::coordset;
use crate::data::Node;
use crate::mesh_error::MeshError;

pub mod cascade;
pub mod convert;
pub mod grid;
pub mod layout;
pub mod metadata;
pub mod offsets;
pub mod shape;

pub use cascade::ShapeCascade;
pub use convert::{
    convert_topology, to_polygonal, to_polytopal, to_rectilinear, to_structured, to_unstructured,
};
pub use grid::{grid_id_to_ijk, grid_ijk_to_id};
pub use layout::{ElementLayout, MixedGroup, PolyList};
pub use metadata::{IndexType, TopologyMetadata};
pub use offsets::{add_offsets, generate_offsets, generate_subelement_offsets};
pub use shape::ShapeType;

/// Topology representations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TopologyType {
    Points,
    Uniform,
    Rectilinear,
    Structured,
    Unstructured,
}

impl TopologyType {
    pub fn name(self) -> &'static str {
        match self {
            TopologyType::Points => "points",
            TopologyType::Uniform => "uniform",
            TopologyType::Rectilinear => "rectilinear",
            TopologyType::Structured => "structured",
            TopologyType::Unstructured => "unstructured",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyType {
    type Err = MeshError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points" => Ok(TopologyType::Points),
            "uniform" => Ok(TopologyType::Uniform),
            "rectilinear" => Ok(TopologyType::Rectilinear),
            "structured" => Ok(TopologyType::Structured),
            "unstructured" => Ok(TopologyType::Unstructured),
            other => Err(MeshError::UnknownTopologyType(other.to_string())),
        }
    }
}

pub fn topology_type(topo: &Node) -> Result<TopologyType, MeshError> {
    topo.string("type")?.parse()
}

/// Topological dimension of `topo`'s elements (0 for point topologies).
pub fn dims(topo: &Node, coordset: &Node) -> Result<usize, MeshError> {
    match topology_type(topo)? {
        TopologyType::Points => Ok(0),
        TopologyType::Uniform | TopologyType::Rectilinear => coordset::dims(coordset),
        TopologyType::Structured => Ok(convert::element_dims(topo, coordset)?.len()),
        TopologyType::Unstructured => Ok(ElementLayout::parse(topo)?.dim()),
    }
}

/// Number of elements in `topo`.
pub fn length(topo: &Node, coordset: &Node) -> Result<usize, MeshError> {
    match topology_type(topo)? {
        TopologyType::Points => coordset::length(coordset),
        TopologyType::Uniform | TopologyType::Rectilinear | TopologyType::Structured => {
            Ok(convert::element_dims(topo, coordset)?.iter().product())
        }
        TopologyType::Unstructured => Ok(ElementLayout::parse(topo)?.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_across_representations() {
        let mut cs = Node::object();
        cs.set_path("type", "uniform");
        cs.set_path("dims/i", 4i64);
        cs.set_path("dims/j", 3i64);
        let mut topo = Node::object();
        topo.set_path("type", "uniform");
        topo.set_path("coordset", "coords");
        assert_eq!(dims(&topo, &cs).unwrap(), 2);
        assert_eq!(length(&topo, &cs).unwrap(), 6);

        topo.set_path("type", "points");
        assert_eq!(dims(&topo, &cs).unwrap(), 0);
        assert_eq!(length(&topo, &cs).unwrap(), 12);

        topo.set_path("type", "mystery");
        assert!(matches!(
            length(&topo, &cs),
            Err(MeshError::UnknownTopologyType(_))
        ));
    }
}
