//! Offsets into flattened element connectivity.

use crate::data::{DataArray, Node, offsets_from_sizes, widest_int_dtype};
use crate::mesh_error::MeshError;
use crate::topology::layout::ElementLayout;

fn element_offsets(layout: &ElementLayout) -> Vec<usize> {
    match layout {
        ElementLayout::Polygonal(elements) | ElementLayout::Polyhedral { elements, .. } => {
            offsets_from_sizes(&elements.sizes)
        }
        fixed => fixed.offsets(),
    }
}

/// Offsets of each element into `elements/connectivity`, recomputed from
/// `elements/sizes` for polytopal topologies.
pub fn generate_offsets(topo: &Node) -> Result<DataArray, MeshError> {
    let layout = ElementLayout::parse(topo)?;
    DataArray::from_values(widest_int_dtype(&[topo]), &element_offsets(&layout))
}

/// Offsets of each polyhedral face into `subelements/connectivity`.
pub fn generate_subelement_offsets(topo: &Node) -> Result<DataArray, MeshError> {
    match ElementLayout::parse(topo)? {
        ElementLayout::Polyhedral { faces, .. } => DataArray::from_values(
            widest_int_dtype(&[topo]),
            &offsets_from_sizes(&faces.sizes),
        ),
        _ => Err(MeshError::UnsupportedOperation(
            "subelement offsets of a non-polyhedral topology".into(),
        )),
    }
}

/// Store `elements/offsets` (and `subelements/offsets` for polyhedra) in `topo`.
pub fn add_offsets(topo: &mut Node) -> Result<(), MeshError> {
    let offsets = generate_offsets(topo)?;
    let sub = match topo.fetch("subelements") {
        Some(_) => Some(generate_subelement_offsets(topo)?),
        None => None,
    };
    topo.set_path("elements/offsets", offsets);
    if let Some(sub) = sub {
        topo.set_path("subelements/offsets", sub);
    }
    Ok(())
}
