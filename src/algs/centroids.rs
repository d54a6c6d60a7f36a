//! One centroid point per element.
//!
//! A centroid is the unweighted mean of the element's distinct points;
//! polyhedra gather their points through their faces, so a point shared by
//! several faces counts once.

use log::debug;

use crate::algs::DerivedMesh;
use crate::coordset::Coords;
use crate::data::{Node, O2MRelation, widest_float_dtype, widest_int_dtype};
use crate::mesh_error::MeshError;
use crate::topology::{ElementLayout, ShapeType, TopologyType, convert, topology_type};

/// Centroids of `entities` (each a list of point ids into `coords`).
///
/// Repeated point ids inside one entity are counted once.
pub fn entity_centroids<I, P>(coords: &Coords, entities: I) -> Coords
where
    I: IntoIterator<Item = P>,
    P: AsRef<[usize]>,
{
    let mut out = Coords::with_axes(coords.axes.clone());
    for entity in entities {
        let mut points = entity.as_ref().to_vec();
        points.sort_unstable();
        points.dedup();
        out.push(&coords.average(&points));
    }
    out
}

/// Centroid point topology of `topo` over a new explicit coordset named
/// `dest_coordset`.
///
/// Implicit topologies are expanded to unstructured elements first. The
/// source and derived elements map one to one.
pub fn generate_centroids(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<DerivedMesh, MeshError> {
    let unstructured;
    let base = match topology_type(topo)? {
        TopologyType::Unstructured => topo,
        _ => {
            unstructured = convert::to_unstructured(topo, coordset, dest_coordset)?.0;
            &unstructured
        }
    };
    let coords = Coords::from_coordset(coordset)?;
    let layout = ElementLayout::parse_checked(base, coords.len())?;
    let int_dtype = widest_int_dtype(&[topo, coordset]);
    let float_dtype = widest_float_dtype(&[coordset]);

    let n = layout.len();
    let centers = entity_centroids(&coords, (0..n).map(|e| layout.element_points(e)));

    let mut topology = Node::object();
    topology.set_path("type", TopologyType::Unstructured.name());
    topology.set_path("coordset", dest_coordset);
    ElementLayout::Uniform {
        shape: ShapeType::Point,
        connectivity: (0..n).collect(),
    }
    .write(&mut topology, int_dtype)?;

    let one_to_one = O2MRelation::from_groups((0..n).map(|e| [e]));
    debug!("generated {n} centroids");
    Ok(DerivedMesh {
        topology,
        coordset: centers.to_node(float_dtype)?,
        s2dmap: one_to_one.to_node(int_dtype)?,
        d2smap: one_to_one.to_node(int_dtype)?,
    })
}
