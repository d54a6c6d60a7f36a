//! Element layout of an unstructured topology.
//!
//! [`ElementLayout`] is the parsed form of a topology's `elements` (and, for
//! polyhedra, `subelements`) block. Algorithms match on the variant once
//! instead of re-testing shape flags per element.

use std::ops::Range;

use crate::data::{DataArray, DataType, Node, offsets_from_sizes};
use crate::mesh_error::MeshError;
use crate::topology::shape::ShapeType;

/// Variable-length lists stored as flat connectivity plus sizes and offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolyList {
    pub connectivity: Vec<usize>,
    pub sizes: Vec<usize>,
    pub offsets: Vec<usize>,
}

impl PolyList {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Entries of list `i`.
    pub fn get(&self, i: usize) -> &[usize] {
        &self.connectivity[self.offsets[i]..self.offsets[i] + self.sizes[i]]
    }

    fn read(node: &Node, context: &str) -> Result<Self, MeshError> {
        let connectivity = node.indices("connectivity")?;
        let sizes = node.indices("sizes")?;
        let offsets = match node.fetch("offsets") {
            Some(_) => node.indices("offsets")?,
            None => offsets_from_sizes(&sizes),
        };
        if offsets.len() != sizes.len() {
            return Err(MeshError::InvalidGeometry(format!(
                "{context}: {} sizes but {} offsets",
                sizes.len(),
                offsets.len()
            )));
        }
        for (&o, &s) in offsets.iter().zip(&sizes) {
            if o.checked_add(s).is_none_or(|end| end > connectivity.len()) {
                return Err(MeshError::out_of_range(
                    format!("{context} span"),
                    o.saturating_add(s),
                    connectivity.len(),
                ));
            }
        }
        Ok(Self {
            connectivity,
            sizes,
            offsets,
        })
    }

    fn write(&self, node: &mut Node, dtype: DataType) -> Result<(), MeshError> {
        node.set_path(
            "connectivity",
            DataArray::from_values(dtype, &self.connectivity)?,
        );
        node.set_path("sizes", DataArray::from_values(dtype, &self.sizes)?);
        node.set_path("offsets", DataArray::from_values(dtype, &self.offsets)?);
        Ok(())
    }

    pub fn from_lists<I, L>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[usize]>,
    {
        let mut out = PolyList {
            connectivity: Vec::new(),
            sizes: Vec::new(),
            offsets: Vec::new(),
        };
        for l in lists {
            let l = l.as_ref();
            out.offsets.push(out.connectivity.len());
            out.sizes.push(l.len());
            out.connectivity.extend_from_slice(l);
        }
        out
    }
}

/// One shape group of a mixed topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixedGroup {
    pub name: Option<String>,
    pub shape: ShapeType,
    pub elements: Range<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementLayout {
    /// Every element has the same fixed shape.
    Uniform {
        shape: ShapeType,
        connectivity: Vec<usize>,
    },
    /// Several fixed-shape groups of equal dimension, concatenated in order.
    Mixed {
        groups: Vec<MixedGroup>,
        shapes: Vec<ShapeType>,
        elements: PolyList,
    },
    /// Polygons with per-element vertex counts.
    Polygonal(PolyList),
    /// Polyhedra: element lists index into the polygonal `faces`.
    Polyhedral { elements: PolyList, faces: PolyList },
}

impl ElementLayout {
    /// Parse the element block of an unstructured topology.
    pub fn parse(topo: &Node) -> Result<Self, MeshError> {
        let elements = topo.child("elements")?;
        if elements.fetch("shape").is_none() {
            return Self::parse_mixed(elements);
        }
        let shape: ShapeType = elements.string("shape")?.parse()?;
        match shape {
            ShapeType::Polygonal => Ok(ElementLayout::Polygonal(PolyList::read(
                elements,
                "polygonal elements",
            )?)),
            ShapeType::Polyhedral => {
                let sub = topo.child("subelements")?;
                if let Some(s) = sub.fetch("shape").and_then(Node::as_str) {
                    if s != ShapeType::Polygonal.name() {
                        return Err(MeshError::InvalidGeometry(format!(
                            "polyhedral subelements must be polygonal, found `{s}`"
                        )));
                    }
                }
                Ok(ElementLayout::Polyhedral {
                    elements: PolyList::read(elements, "polyhedral elements")?,
                    faces: PolyList::read(sub, "polyhedral subelements")?,
                })
            }
            fixed => {
                let connectivity = elements.indices("connectivity")?;
                let n = fixed.indices().unwrap_or(1);
                if connectivity.len() % n != 0 {
                    return Err(MeshError::InvalidGeometry(format!(
                        "{} connectivity entries is not a multiple of {n} for `{fixed}`",
                        connectivity.len()
                    )));
                }
                Ok(ElementLayout::Uniform {
                    shape: fixed,
                    connectivity,
                })
            }
        }
    }

    fn parse_mixed(elements: &Node) -> Result<Self, MeshError> {
        let names = elements.child_names();
        let mut groups = Vec::new();
        let mut shapes = Vec::new();
        let mut lists: Vec<Vec<usize>> = Vec::new();
        for (gi, group) in elements.children().into_iter().enumerate() {
            let shape: ShapeType = group.string("shape")?.parse()?;
            let Some(n) = shape.indices() else {
                return Err(MeshError::UnsupportedOperation(format!(
                    "mixed element group with `{shape}` shape"
                )));
            };
            let conn = group.indices("connectivity")?;
            if conn.len() % n != 0 {
                return Err(MeshError::InvalidGeometry(format!(
                    "group {gi}: {} connectivity entries is not a multiple of {n}",
                    conn.len()
                )));
            }
            let start = shapes.len();
            for chunk in conn.chunks(n) {
                shapes.push(shape);
                lists.push(chunk.to_vec());
            }
            groups.push(MixedGroup {
                name: names.get(gi).map(|s| s.to_string()),
                shape,
                elements: start..shapes.len(),
            });
        }
        let Some(first) = groups.first() else {
            return Err(MeshError::InvalidGeometry(
                "topology has no element groups".into(),
            ));
        };
        if let Some(g) = groups.iter().find(|g| g.shape.dim() != first.shape.dim()) {
            return Err(MeshError::InvalidGeometry(format!(
                "mixed topology combines `{}` and `{}` elements of different dimension",
                first.shape, g.shape
            )));
        }
        Ok(ElementLayout::Mixed {
            groups,
            shapes,
            elements: PolyList::from_lists(lists),
        })
    }

    /// Parse and check every point index against `npoints`.
    pub fn parse_checked(topo: &Node, npoints: usize) -> Result<Self, MeshError> {
        let layout = Self::parse(topo)?;
        layout.check(npoints)?;
        Ok(layout)
    }

    /// Verify point indices are below `npoints` and polyhedral face ids exist.
    pub fn check(&self, npoints: usize) -> Result<(), MeshError> {
        let points = |conn: &[usize], context: &str| {
            match conn.iter().find(|&&p| p >= npoints) {
                Some(&p) => Err(MeshError::out_of_range(context, p, npoints)),
                None => Ok(()),
            }
        };
        match self {
            ElementLayout::Uniform { connectivity, .. } => points(connectivity, "connectivity"),
            ElementLayout::Mixed { elements, .. } | ElementLayout::Polygonal(elements) => {
                points(&elements.connectivity, "connectivity")
            }
            ElementLayout::Polyhedral { elements, faces } => {
                points(&faces.connectivity, "subelements/connectivity")?;
                match elements.connectivity.iter().find(|&&f| f >= faces.len()) {
                    Some(&f) => Err(MeshError::out_of_range(
                        "polyhedral face index",
                        f,
                        faces.len(),
                    )),
                    None => Ok(()),
                }
            }
        }
    }

    /// Topological dimension of the elements.
    pub fn dim(&self) -> usize {
        match self {
            ElementLayout::Uniform { shape, .. } => shape.dim(),
            ElementLayout::Mixed { groups, .. } => groups.first().map_or(0, |g| g.shape.dim()),
            ElementLayout::Polygonal(_) => 2,
            ElementLayout::Polyhedral { .. } => 3,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ElementLayout::Uniform {
                shape,
                connectivity,
            } => connectivity.len() / shape.indices().unwrap_or(1),
            ElementLayout::Mixed { shapes, .. } => shapes.len(),
            ElementLayout::Polygonal(elements) | ElementLayout::Polyhedral { elements, .. } => {
                elements.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of element `e`.
    pub fn shape_of(&self, e: usize) -> ShapeType {
        match self {
            ElementLayout::Uniform { shape, .. } => *shape,
            ElementLayout::Mixed { shapes, .. } => shapes[e],
            ElementLayout::Polygonal(_) => ShapeType::Polygonal,
            ElementLayout::Polyhedral { .. } => ShapeType::Polyhedral,
        }
    }

    /// Shape named in the topology (`polygonal`/`polyhedral` for polytopes);
    /// `None` for mixed layouts whose groups differ in shape.
    pub fn common_shape(&self) -> Option<ShapeType> {
        match self {
            ElementLayout::Mixed { groups, .. } => {
                let first = groups.first()?.shape;
                groups.iter().all(|g| g.shape == first).then_some(first)
            }
            other => Some(other.shape_of(0)),
        }
    }

    /// Connectivity of element `e`: point ids, or face ids for polyhedra.
    pub fn element(&self, e: usize) -> &[usize] {
        match self {
            ElementLayout::Uniform {
                shape,
                connectivity,
            } => {
                let n = shape.indices().unwrap_or(1);
                &connectivity[e * n..(e + 1) * n]
            }
            ElementLayout::Mixed { elements, .. }
            | ElementLayout::Polygonal(elements)
            | ElementLayout::Polyhedral { elements, .. } => elements.get(e),
        }
    }

    /// Point ids of polyhedral face `f`; empty for other layouts.
    pub fn face(&self, f: usize) -> &[usize] {
        match self {
            ElementLayout::Polyhedral { faces, .. } => faces.get(f),
            _ => &[],
        }
    }

    /// Distinct point ids of element `e`, sorted.
    pub fn element_points(&self, e: usize) -> Vec<usize> {
        let mut pts: Vec<usize> = match self {
            ElementLayout::Polyhedral { .. } => self
                .element(e)
                .iter()
                .flat_map(|&f| self.face(f).iter().copied())
                .collect(),
            _ => self.element(e).to_vec(),
        };
        pts.sort_unstable();
        pts.dedup();
        pts
    }

    /// Per-element offsets into the element connectivity.
    pub fn offsets(&self) -> Vec<usize> {
        match self {
            ElementLayout::Uniform { shape, .. } => {
                let n = shape.indices().unwrap_or(1);
                (0..self.len()).map(|e| e * n).collect()
            }
            ElementLayout::Mixed { elements, .. }
            | ElementLayout::Polygonal(elements)
            | ElementLayout::Polyhedral { elements, .. } => elements.offsets.clone(),
        }
    }

    /// Write `elements` (and `subelements`) children into `topo` with index
    /// type `dtype`, including offsets.
    pub fn write(&self, topo: &mut Node, dtype: DataType) -> Result<(), MeshError> {
        topo.remove("elements");
        topo.remove("subelements");
        match self {
            ElementLayout::Uniform {
                shape,
                connectivity,
            } => {
                let el = topo.fetch_mut("elements");
                el.set_path("shape", shape.name());
                el.set_path(
                    "connectivity",
                    DataArray::from_values(dtype, connectivity)?,
                );
                el.set_path("offsets", DataArray::from_values(dtype, &self.offsets())?);
            }
            ElementLayout::Mixed {
                groups, elements, ..
            } => {
                let el = topo.fetch_mut("elements");
                for (gi, g) in groups.iter().enumerate() {
                    let conn: Vec<usize> = g
                        .elements
                        .clone()
                        .flat_map(|e| elements.get(e).iter().copied())
                        .collect();
                    let group = match &g.name {
                        Some(name) => el.fetch_mut(name),
                        None => el.fetch_mut(&gi.to_string()),
                    };
                    group.set_path("shape", g.shape.name());
                    group.set_path("connectivity", DataArray::from_values(dtype, &conn)?);
                }
            }
            ElementLayout::Polygonal(elements) => {
                let el = topo.fetch_mut("elements");
                el.set_path("shape", ShapeType::Polygonal.name());
                elements.write(el, dtype)?;
            }
            ElementLayout::Polyhedral { elements, faces } => {
                let el = topo.fetch_mut("elements");
                el.set_path("shape", ShapeType::Polyhedral.name());
                elements.write(el, dtype)?;
                let sub = topo.fetch_mut("subelements");
                sub.set_path("shape", ShapeType::Polygonal.name());
                faces.write(sub, dtype)?;
            }
        }
        Ok(())
    }
}
