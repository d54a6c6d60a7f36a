//! Element shape catalog.
//!
//! Each fixed shape carries its embedding table: for every sub-shape of one
//! dimension lower, the local vertex indices that form it, ordered so the
//! sub-shape keeps the winding of its owner. Polygonal and polyhedral shapes
//! have per-element vertex and face counts and no static table.

use core::fmt;
use std::str::FromStr;

use crate::mesh_error::MeshError;

/// Element shapes understood by the derivation engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShapeType {
    /// 0D vertex.
    Point,
    /// 1D segment.
    Line,
    /// Triangle.
    Tri,
    /// Quadrilateral.
    Quad,
    /// Tetrahedron.
    Tet,
    /// Hexahedron.
    Hex,
    /// 2D polygon with a per-element vertex count.
    Polygonal,
    /// 3D polyhedron built from polygonal faces.
    Polyhedral,
}

const LINE_EMBEDDING: &[&[usize]] = &[&[0], &[1]];
const TRI_EMBEDDING: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUAD_EMBEDDING: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TET_EMBEDDING: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[0, 3, 2], &[1, 2, 3]];
const HEX_EMBEDDING: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[4, 5, 6, 7],
];

impl ShapeType {
    pub const ALL: [ShapeType; 8] = [
        ShapeType::Point,
        ShapeType::Line,
        ShapeType::Tri,
        ShapeType::Quad,
        ShapeType::Tet,
        ShapeType::Hex,
        ShapeType::Polygonal,
        ShapeType::Polyhedral,
    ];

    /// Blueprint shape name.
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Point => "point",
            ShapeType::Line => "line",
            ShapeType::Tri => "tri",
            ShapeType::Quad => "quad",
            ShapeType::Tet => "tet",
            ShapeType::Hex => "hex",
            ShapeType::Polygonal => "polygonal",
            ShapeType::Polyhedral => "polyhedral",
        }
    }

    /// Topological dimension.
    pub fn dim(self) -> usize {
        match self {
            ShapeType::Point => 0,
            ShapeType::Line => 1,
            ShapeType::Tri | ShapeType::Quad | ShapeType::Polygonal => 2,
            ShapeType::Tet | ShapeType::Hex | ShapeType::Polyhedral => 3,
        }
    }

    /// Vertices per element; `None` for polytopal shapes.
    pub fn indices(self) -> Option<usize> {
        match self {
            ShapeType::Point => Some(1),
            ShapeType::Line => Some(2),
            ShapeType::Tri => Some(3),
            ShapeType::Quad | ShapeType::Tet => Some(4),
            ShapeType::Hex => Some(8),
            ShapeType::Polygonal | ShapeType::Polyhedral => None,
        }
    }

    /// Shape of the sub-entities one dimension lower; `None` for points.
    pub fn embed_shape(self) -> Option<ShapeType> {
        match self {
            ShapeType::Point => None,
            ShapeType::Line => Some(ShapeType::Point),
            ShapeType::Tri | ShapeType::Quad | ShapeType::Polygonal => Some(ShapeType::Line),
            ShapeType::Tet => Some(ShapeType::Tri),
            ShapeType::Hex => Some(ShapeType::Quad),
            ShapeType::Polyhedral => Some(ShapeType::Polygonal),
        }
    }

    /// Number of sub-entities one dimension lower; `None` for polytopal shapes.
    pub fn embed_count(self) -> Option<usize> {
        match self {
            ShapeType::Polygonal | ShapeType::Polyhedral => None,
            fixed => Some(fixed.embedding().len()),
        }
    }

    /// Local vertex lists of each sub-entity (empty for points and polytopes).
    pub fn embedding(self) -> &'static [&'static [usize]] {
        match self {
            ShapeType::Point | ShapeType::Polygonal | ShapeType::Polyhedral => &[],
            ShapeType::Line => LINE_EMBEDDING,
            ShapeType::Tri => TRI_EMBEDDING,
            ShapeType::Quad => QUAD_EMBEDDING,
            ShapeType::Tet => TET_EMBEDDING,
            ShapeType::Hex => HEX_EMBEDDING,
        }
    }

    pub fn is_poly(self) -> bool {
        matches!(self, ShapeType::Polygonal | ShapeType::Polyhedral)
    }

    pub fn is_polygonal(self) -> bool {
        self == ShapeType::Polygonal
    }

    pub fn is_polyhedral(self) -> bool {
        self == ShapeType::Polyhedral
    }

    /// Polytopal shape of the same dimension (`quad` -> `polygonal`).
    /// Points and lines map to themselves.
    pub fn polytopal(self) -> ShapeType {
        match self.dim() {
            2 => ShapeType::Polygonal,
            3 => ShapeType::Polyhedral,
            _ => self,
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeType {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .into_iter()
            .find(|shape| shape.name() == s)
            .ok_or_else(|| MeshError::UnknownShape(s.to_string()))
    }
}
