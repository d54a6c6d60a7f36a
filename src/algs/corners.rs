//! Corner (dual) decomposition: one cell per (element, point) incidence.
//!
//! A 2D corner is the quad `point, line centroid, face centroid, line
//! centroid`. A 3D corner is a polyhedron built from those quads (one per
//! face at the point) plus one quad per line at the point joining the line
//! centroid, the two face centroids around it and the cell centroid.
//!
//! Winding follows the element: the direction each line has inside its face
//! (LOCAL associations) decides which line comes first, and the 3D
//! line-to-cell quads reverse the orientation their shared edge got in the
//! point-to-face quads.

use hashbrown::HashMap;
use log::debug;

use crate::algs::DerivedMesh;
use crate::algs::centroids::entity_centroids;
use crate::coordset::Coords;
use crate::data::{Node, O2MRelation};
use crate::mesh_error::MeshError;
use crate::topology::convert::face_key;
use crate::topology::{ElementLayout, IndexType, PolyList, TopologyMetadata, TopologyType};

/// Entries of `a` also in `b`, in `a`'s order.
fn intersect_sets(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter().copied().filter(|x| b.contains(x)).collect()
}

/// Corner decomposition of a 2D or 3D topology.
///
/// The new explicit coordset, named `dest_coordset`, holds the original
/// points, then the centroids of every line, face and (3D) cell.
pub fn generate_corners(
    topo: &Node,
    coordset: &Node,
    dest_coordset: &str,
) -> Result<DerivedMesh, MeshError> {
    let meta = TopologyMetadata::new(topo, coordset)?;
    let dim = meta.dim();
    if dim < 2 {
        return Err(MeshError::UnsupportedOperation(format!(
            "corners of a {dim}D topology; input must be 2D or 3D"
        )));
    }
    let is_3d = dim == 3;
    let (point_dim, line_dim, face_dim) = (0, 1, 2);

    let base = Coords::from_coordset(coordset)?;
    let mut coords = base.clone();
    let mut dim_offsets = vec![0usize; dim + 1];
    for d in 1..=dim {
        dim_offsets[d] = coords.len();
        let centers = entity_centroids(
            &base,
            (0..meta.get_length(d)).map(|g| meta.entity_vertices(d, g)),
        );
        for i in 0..centers.len() {
            coords.push(&centers.point(i)[..coords.dim()]);
        }
    }

    let mut corner_lists: Vec<Vec<usize>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut face_ids: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut s2d = O2MRelation::default();
    let mut d2s = O2MRelation::default();
    let missing_line =
        |e: usize, p: usize| MeshError::InvalidGeometry(format!("point {p} of element {e} has no bounding lines"));

    for elem in 0..meta.get_length(dim) {
        // (face, line) -> (start, end) as the element's faces traverse them
        let mut elem_orient: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for &face_lid in meta.get_entity_assocs(IndexType::Local, elem, dim, face_dim) {
            let face = meta.local_to_global(face_dim, face_lid);
            for &line_lid in meta.get_entity_assocs(IndexType::Local, face_lid, face_dim, line_dim) {
                let line = meta.local_to_global(line_dim, line_lid);
                let ends = meta.get_entity_assocs(IndexType::Local, line_lid, line_dim, point_dim);
                if let [start, end] = ends {
                    elem_orient.insert(
                        (face, line),
                        (
                            meta.local_to_global(point_dim, *start),
                            meta.local_to_global(point_dim, *end),
                        ),
                    );
                }
            }
        }

        let elem_lines = meta.get_entity_assocs(IndexType::Global, elem, dim, line_dim);
        let elem_faces = meta.get_entity_assocs(IndexType::Global, elem, dim, face_dim);
        let elem_points = meta.get_entity_assocs(IndexType::Global, elem, dim, point_dim);
        let first_corner = d2s.len();

        for &point in elem_points {
            let point_faces = meta.get_entity_assocs(IndexType::Global, point, point_dim, face_dim);
            let point_lines = meta.get_entity_assocs(IndexType::Global, point, point_dim, line_dim);
            let corner_point_faces = intersect_sets(elem_faces, point_faces);
            let corner_point_lines = intersect_sets(elem_lines, point_lines);

            // (face, line) -> true when the corner edge runs line -> face
            let mut corner_orient: HashMap<(usize, usize), bool> = HashMap::new();
            let mut corner_faces: Vec<[usize; 4]> = Vec::new();

            for &face in &corner_point_faces {
                let face_lines = intersect_sets(
                    meta.get_entity_assocs(IndexType::Global, face, face_dim, line_dim),
                    point_lines,
                );
                let (&first, &second) = face_lines
                    .first()
                    .zip(face_lines.last())
                    .ok_or_else(|| missing_line(elem, point))?;
                let forward = elem_orient
                    .get(&(face, first))
                    .is_some_and(|&(start, _)| start == point);
                let (a, b) = if forward { (first, second) } else { (second, first) };
                corner_orient.insert((face, first), forward);
                corner_orient.insert((face, second), !forward);
                corner_faces.push([
                    dim_offsets[point_dim] + point,
                    dim_offsets[line_dim] + a,
                    dim_offsets[face_dim] + face,
                    dim_offsets[line_dim] + b,
                ]);
            }
            if is_3d {
                for &line in &corner_point_lines {
                    let line_faces = intersect_sets(
                        elem_faces,
                        meta.get_entity_assocs(IndexType::Global, line, line_dim, face_dim),
                    );
                    let (&first, &second) = line_faces
                        .first()
                        .zip(line_faces.last())
                        .ok_or_else(|| missing_line(elem, point))?;
                    // reuse the edge in the opposite direction
                    let forward = !corner_orient.get(&(first, line)).copied().unwrap_or(false);
                    let (a, b) = if forward { (first, second) } else { (second, first) };
                    corner_faces.push([
                        dim_offsets[line_dim] + line,
                        dim_offsets[face_dim] + a,
                        dim_offsets[dim] + elem,
                        dim_offsets[face_dim] + b,
                    ]);
                }
                let ids = corner_faces
                    .iter()
                    .map(|face| {
                        let next = faces.len();
                        *face_ids.entry(face_key(face)).or_insert_with(|| {
                            faces.push(face.to_vec());
                            next
                        })
                    })
                    .collect();
                corner_lists.push(ids);
            } else {
                corner_lists.push(corner_faces.first().map(|f| f.to_vec()).unwrap_or_default());
            }
            d2s.push_group(&[elem]);
        }
        s2d.push_group(&(first_corner..d2s.len()).collect::<Vec<_>>());
    }

    let layout = if is_3d {
        ElementLayout::Polyhedral {
            elements: PolyList::from_lists(&corner_lists),
            faces: PolyList::from_lists(&faces),
        }
    } else {
        ElementLayout::Polygonal(PolyList::from_lists(&corner_lists))
    };
    let mut topology = Node::object();
    topology.set_path("type", TopologyType::Unstructured.name());
    topology.set_path("coordset", dest_coordset);
    layout.write(&mut topology, meta.int_dtype)?;

    debug!(
        "generated {} corners over {} points from {} elements",
        d2s.len(),
        coords.len(),
        s2d.len()
    );
    Ok(DerivedMesh {
        topology,
        coordset: coords.to_node(meta.float_dtype)?,
        s2dmap: s2d.to_node(meta.int_dtype)?,
        d2smap: d2s.to_node(meta.int_dtype)?,
    })
}
