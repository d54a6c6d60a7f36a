//! Per-dimension shape sequence of a topology (hex -> quad -> line -> point).

use crate::data::Node;
use crate::mesh_error::MeshError;
use crate::topology::layout::ElementLayout;
use crate::topology::shape::ShapeType;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeCascade {
    shapes: Vec<ShapeType>,
}

impl ShapeCascade {
    /// Cascade of an unstructured topology.
    pub fn new(topo: &Node) -> Result<Self, MeshError> {
        Ok(Self::from_layout(&ElementLayout::parse(topo)?))
    }

    pub fn from_layout(layout: &ElementLayout) -> Self {
        let mut distinct: Vec<ShapeType> = match layout {
            ElementLayout::Mixed { groups, .. } => groups.iter().map(|g| g.shape).collect(),
            other => vec![other.shape_of(0)],
        };
        distinct.dedup();
        Self::from_shapes(&distinct)
    }

    /// Cascade of a single element shape.
    pub fn from_shape(shape: ShapeType) -> Self {
        Self::from_shapes(&[shape])
    }

    fn from_shapes(shapes: &[ShapeType]) -> Self {
        let mut current: Vec<ShapeType> = shapes.to_vec();
        let top_dim = current.first().map_or(0, |s| s.dim());
        let mut by_dim = vec![ShapeType::Point; top_dim + 1];
        for d in (0..=top_dim).rev() {
            current.sort_by_key(|s| s.name());
            current.dedup();
            by_dim[d] = match current.as_slice() {
                [single] => *single,
                _ => polytope_of_dim(d),
            };
            current = current.iter().filter_map(|s| s.embed_shape()).collect();
        }
        Self { shapes: by_dim }
    }

    /// Topological dimension of the top-level elements.
    pub fn dim(&self) -> usize {
        self.shapes.len() - 1
    }

    /// Shape of the top-level elements.
    pub fn top(&self) -> ShapeType {
        self.shapes[self.dim()]
    }

    /// Canonical shape at dimension `d`.
    ///
    /// # Panics
    /// If `d` exceeds the topology dimension.
    pub fn shape(&self, d: usize) -> ShapeType {
        assert!(
            d <= self.dim(),
            "cascade dimension {d} out of range for a {}D topology",
            self.dim()
        );
        self.shapes[d]
    }

    /// True when entities at dimension `d` need sizes and offsets.
    pub fn is_poly_at(&self, d: usize) -> bool {
        self.shape(d).is_poly()
    }
}

fn polytope_of_dim(d: usize) -> ShapeType {
    match d {
        0 => ShapeType::Point,
        1 => ShapeType::Line,
        2 => ShapeType::Polygonal,
        _ => ShapeType::Polyhedral,
    }
}
