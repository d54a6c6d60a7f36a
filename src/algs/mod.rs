//! Derived-entity generators.
//!
//! Each generator takes a base topology and its coordset and returns the
//! derived topology together with the source-to-derived (`s2dmap`) and
//! derived-to-source (`d2smap`) one-to-many relation nodes.

use crate::data::Node;

pub mod centroids;
pub mod corners;
pub mod entities;
pub mod field_transfer;
pub mod sides;

pub use centroids::{entity_centroids, generate_centroids};
pub use corners::generate_corners;
pub use entities::{generate_faces, generate_lines, generate_points};
pub use field_transfer::SidesOptions;
pub use sides::{generate_sides, generate_sides_with_fields};

/// A derived topology over the base coordset.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedEntities {
    pub topology: Node,
    pub s2dmap: Node,
    pub d2smap: Node,
}

/// A derived topology over a newly generated explicit coordset.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedMesh {
    pub topology: Node,
    pub coordset: Node,
    pub s2dmap: Node,
    pub d2smap: Node,
}
