//! # mesh-blueprint
//!
//! mesh-blueprint describes computational meshes as a tree of named, typed
//! arrays (the "Blueprint" layout) and derives new mesh entities from them.
//!
//! ## Features
//! - A hierarchical [`data::Node`] container with typed, strided leaf arrays
//! - Coordset conversion (uniform, rectilinear, explicit) and topology
//!   conversion (uniform, rectilinear, structured, unstructured, polytopal)
//! - [`topology::TopologyMetadata`], the dimensional adjacency of any
//!   unstructured topology with shared sub-entities deduplicated
//! - Derived points, lines, faces, centroids, sides and corners together
//!   with the source/derived index maps
//! - Field remapping onto side decompositions
//! - Domain, material set and adjacency set helpers
//!
//! ## Numbering
//!
//! Grid points and cells are numbered with axis 0 varying fastest. Metadata
//! ids of dimension 0 are coordset indices and ids of the top dimension are
//! element indices; intermediate entities are numbered by first encounter.
//!
//! ## Usage
//!
//! ```
//! use mesh_blueprint::prelude::*;
//!
//! let mut coords = Node::object();
//! coords.set_path("type", "uniform");
//! coords.set_path("dims/i", 3i64);
//! coords.set_path("dims/j", 3i64);
//! let mut topo = Node::object();
//! topo.set_path("type", "uniform");
//! topo.set_path("coordset", "coords");
//!
//! let meta = TopologyMetadata::new(&topo, &coords).unwrap();
//! assert_eq!(meta.get_length(1), 12);
//! ```

pub mod algs;
pub mod coordset;
pub mod data;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use mesh_error::MeshError;

static_assertions::assert_impl_all!(data::Node: Send, Sync, Clone);

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::{
        DerivedEntities, DerivedMesh, SidesOptions, generate_centroids, generate_corners,
        generate_faces, generate_lines, generate_points, generate_sides,
        generate_sides_with_fields,
    };
    pub use crate::coordset::{Coords, CoordsetType};
    pub use crate::data::{ArrayVisitor, Buffer, DataArray, DataType, Element, Node, O2MRelation};
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{
        ElementLayout, IndexType, ShapeCascade, ShapeType, TopologyMetadata, TopologyType,
    };
}
