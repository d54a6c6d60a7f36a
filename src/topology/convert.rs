//! Topology representation converters.
//!
//! Implicit topologies (uniform, rectilinear, structured) become explicit
//! ones by materializing their coordinates and, for unstructured output,
//! enumerating every grid cell's corner vertices.

use hashbrown::HashMap;

use crate::coordset::{self, CoordsetType, LOGICAL_AXES};
use crate::data::{DataArray, Node, widest_int_dtype};
use crate::mesh_error::MeshError;
use crate::topology::grid::{grid_id_to_ijk, grid_ijk_to_id};
use crate::topology::layout::{ElementLayout, PolyList};
use crate::topology::shape::ShapeType;
use crate::topology::{TopologyType, topology_type};

/// Per-axis element counts of an implicit topology over `coordset`.
pub fn element_dims(topo: &Node, coordset: &Node) -> Result<Vec<usize>, MeshError> {
    match topology_type(topo)? {
        TopologyType::Uniform | TopologyType::Rectilinear => Ok(coordset::point_dims(coordset)?
            .into_iter()
            .map(|n| n.saturating_sub(1))
            .collect()),
        TopologyType::Structured => {
            let dims = topo.child("elements/dims")?;
            LOGICAL_AXES
                .iter()
                .map_while(|axis| dims.fetch(axis))
                .map(|n| {
                    n.as_i64()
                        .and_then(|v| usize::try_from(v).ok())
                        .ok_or_else(|| MeshError::WrongNodeKind {
                            path: "elements/dims".into(),
                            expected: "non-negative integers",
                        })
                })
                .collect()
        }
        other => Err(MeshError::UnsupportedOperation(format!(
            "{other} topology has no element grid"
        ))),
    }
}

fn copy_origin(topo: &Node, dest: &mut Node) {
    if let Some(origin) = topo.fetch("elements/origin") {
        dest.set_path("elements/origin", origin.clone());
    }
}

/// Uniform topology to rectilinear; the coordset is converted alongside.
pub fn to_rectilinear(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<(Node, Node), MeshError> {
    if topology_type(topo)? != TopologyType::Uniform {
        return Err(MeshError::UnsupportedOperation(format!(
            "{} topology cannot become rectilinear",
            topology_type(topo)?
        )));
    }
    let cdest = coordset::to_rectilinear(coordset)?;
    let mut dest = topo.clone();
    dest.set_path("type", TopologyType::Rectilinear.name());
    dest.set_path("coordset", dest_coordset);
    Ok((dest, cdest))
}

/// Uniform or rectilinear topology to structured over an explicit coordset.
pub fn to_structured(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<(Node, Node), MeshError> {
    let ttype = topology_type(topo)?;
    if !matches!(ttype, TopologyType::Uniform | TopologyType::Rectilinear) {
        return Err(MeshError::UnsupportedOperation(format!(
            "{ttype} topology cannot become structured"
        )));
    }
    let cdest = coordset::to_explicit(coordset)?;
    let int_dtype = widest_int_dtype(&[topo]);
    let mut dest = Node::object();
    dest.set_path("type", TopologyType::Structured.name());
    dest.set_path("coordset", dest_coordset);
    copy_origin(topo, &mut dest);
    for (axis, n) in LOGICAL_AXES.iter().zip(element_dims(topo, coordset)?) {
        dest.set_path(
            &format!("elements/dims/{axis}"),
            DataArray::from_values(int_dtype, &[n])?,
        );
    }
    Ok((dest, cdest))
}

/// Corner vertices of every cell of a grid with `edims` cells per axis, in
/// Blueprint winding order.
fn grid_connectivity(edims: &[usize]) -> Vec<usize> {
    let ndims = edims.len();
    let vdims: Vec<usize> = edims.iter().map(|n| n + 1).collect();
    let corners = 1usize << ndims;
    let nelems: usize = edims.iter().product();

    let mut conn = Vec::with_capacity(nelems * corners);
    let mut cell = [0usize; 3];
    for e in 0..nelems {
        grid_id_to_ijk(e, edims, &mut cell);
        let start = conn.len();
        for c in 0..corners {
            let mut vert = cell;
            for (d, v) in vert.iter_mut().enumerate().take(ndims) {
                *v += (c >> d) & 1;
            }
            conn.push(grid_ijk_to_id(&vert[..ndims], &vdims));
        }
        // bit order yields a zigzag; swap to walk each quad around its boundary
        for p in (2..corners).step_by(4) {
            conn.swap(start + p, start + p + 1);
        }
    }
    conn
}

/// Any topology to unstructured.
///
/// Implicit topologies emit `line`, `quad`, or `hex` elements by axis count;
/// a `points` topology emits one `point` element per coordset point.
pub fn to_unstructured(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<(Node, Node), MeshError> {
    let ttype = topology_type(topo)?;
    let int_dtype = widest_int_dtype(&[topo]);
    let mut dest = Node::object();
    dest.set_path("type", TopologyType::Unstructured.name());
    dest.set_path("coordset", dest_coordset);

    let (shape, connectivity, cdest) = match ttype {
        TopologyType::Unstructured => {
            let mut dest = topo.clone();
            dest.set_path("coordset", dest_coordset);
            return Ok((dest, coordset.clone()));
        }
        TopologyType::Points => {
            let n = coordset::length(coordset)?;
            (ShapeType::Point, (0..n).collect(), coordset.clone())
        }
        TopologyType::Structured | TopologyType::Rectilinear | TopologyType::Uniform => {
            let cdest = match coordset::coordset_type(coordset)? {
                CoordsetType::Explicit => coordset.clone(),
                _ => coordset::to_explicit(coordset)?,
            };
            let edims = element_dims(topo, coordset)?;
            let shape = match edims.len() {
                1 => ShapeType::Line,
                2 => ShapeType::Quad,
                3 => ShapeType::Hex,
                n => {
                    return Err(MeshError::InvalidGeometry(format!(
                        "implicit topology with {n} axes"
                    )));
                }
            };
            copy_origin(topo, &mut dest);
            (shape, grid_connectivity(&edims), cdest)
        }
    };

    log::debug!(
        "converted {ttype} topology to {} unstructured `{shape}` elements",
        connectivity.len() / shape.indices().unwrap_or(1)
    );
    dest.set_path("elements/shape", shape.name());
    dest.set_path(
        "elements/connectivity",
        DataArray::from_values(int_dtype, &connectivity)?,
    );
    Ok((dest, cdest))
}

/// Convert `topo` (over `coordset`) to `target`, naming the derived coordset
/// `dest_coordset`. Returns the new topology and coordset.
pub fn convert_topology(
    topo: &Node,
    coordset: &Node,
    target: TopologyType,
    dest_coordset: &str,
) -> Result<(Node, Node), MeshError> {
    let source = topology_type(topo)?;
    match target {
        t if t == source => {
            let mut dest = topo.clone();
            dest.set_path("coordset", dest_coordset);
            Ok((dest, coordset.clone()))
        }
        TopologyType::Rectilinear => to_rectilinear(topo, coordset, dest_coordset),
        TopologyType::Structured => to_structured(topo, coordset, dest_coordset),
        TopologyType::Unstructured => to_unstructured(topo, coordset, dest_coordset),
        t => Err(MeshError::UnsupportedOperation(format!(
            "topology conversion {source} -> {t}"
        ))),
    }
}

/// Sorted copy of `points`, the identity of a face regardless of winding.
pub(crate) fn face_key(points: &[usize]) -> Vec<usize> {
    let mut key = points.to_vec();
    key.sort_unstable();
    key
}

/// Unstructured topology to its polygonal (2D) or polyhedral (3D) form.
///
/// 2D elements keep their connectivity and gain sizes and offsets. 3D
/// elements are rebuilt from their embedded faces; faces shared between
/// elements are stored once, in the winding of the first element that
/// produced them.
pub fn to_polygonal(topo: &Node) -> Result<Node, MeshError> {
    let ttype = topology_type(topo)?;
    if ttype != TopologyType::Unstructured {
        return Err(MeshError::UnsupportedOperation(format!(
            "polygonal conversion of a {ttype} topology"
        )));
    }
    let layout = ElementLayout::parse(topo)?;
    if layout.dim() < 2 {
        return Err(MeshError::UnsupportedOperation(format!(
            "polygonal conversion of a {}D topology",
            layout.dim()
        )));
    }
    if matches!(
        layout,
        ElementLayout::Polygonal(_) | ElementLayout::Polyhedral { .. }
    ) {
        return Ok(topo.clone());
    }

    let int_dtype = widest_int_dtype(&[topo]);
    let nelems = layout.len();
    let poly = if layout.dim() == 2 {
        ElementLayout::Polygonal(PolyList::from_lists(
            (0..nelems).map(|e| layout.element(e)),
        ))
    } else {
        let mut face_ids: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut faces: Vec<Vec<usize>> = Vec::new();
        let mut elements: Vec<Vec<usize>> = Vec::with_capacity(nelems);
        for e in 0..nelems {
            let conn = layout.element(e);
            let ids = layout
                .shape_of(e)
                .embedding()
                .iter()
                .map(|local| {
                    let face: Vec<usize> = local.iter().map(|&i| conn[i]).collect();
                    *face_ids.entry(face_key(&face)).or_insert_with(|| {
                        faces.push(face);
                        faces.len() - 1
                    })
                })
                .collect();
            elements.push(ids);
        }
        log::debug!(
            "polyhedral conversion: {nelems} elements share {} faces",
            faces.len()
        );
        ElementLayout::Polyhedral {
            elements: PolyList::from_lists(&elements),
            faces: PolyList::from_lists(&faces),
        }
    };

    let mut dest = topo.clone();
    poly.write(&mut dest, int_dtype)?;
    Ok(dest)
}

/// Alias of [`to_polygonal`].
pub fn to_polytopal(topo: &Node) -> Result<Node, MeshError> {
    to_polygonal(topo)
}
