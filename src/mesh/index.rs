//! Mesh index: a light summary of a mesh's coordsets, topologies, matsets,
//! specsets, fields, adjsets and nestsets, each with the path to its data.

use log::debug;

use crate::coordset;
use crate::data::Node;
use crate::mesh::is_multi_domain;
use crate::mesh_error::MeshError;

fn join_path(base: &str, kind: &str, name: &str) -> String {
    if base.is_empty() {
        format!("{kind}/{name}")
    } else {
        format!("{}/{kind}/{name}", base.trim_end_matches('/'))
    }
}

/// Named children of `domain/<kind>`, in order.
fn entries<'a>(domain: &'a Node, kind: &str) -> impl Iterator<Item = (&'a String, &'a Node)> {
    domain
        .fetch(kind)
        .and_then(Node::as_object)
        .into_iter()
        .flatten()
}

fn index_coordset(coordset: &Node, idx: &mut Node) -> Result<(), MeshError> {
    idx.set_path("type", coordset.string("type")?);
    for axis in coordset::axes(coordset)? {
        idx.fetch_mut(&format!("coord_system/axes/{axis}"));
    }
    idx.set_path(
        "coord_system/type",
        coordset::coord_system(coordset)?.name(),
    );
    Ok(())
}

fn index_matset(name: &str, matset: &Node, idx: &mut Node) -> Result<(), MeshError> {
    idx.set_path("topology", matset.string("topology")?);
    if let Some(map) = matset.fetch("material_map") {
        idx.set_path("material_map", map.clone());
    } else if let Some(materials) = matset.fetch("materials") {
        for material in materials.child_names() {
            idx.fetch_mut(&format!("materials/{material}"));
        }
    } else if let Some(fractions) = matset.fetch("volume_fractions").filter(|v| v.is_object()) {
        // material ids follow volume fraction order
        for (id, material) in fractions.child_names().into_iter().enumerate() {
            idx.set_path(&format!("material_map/{material}"), id as i64);
        }
    } else {
        return Err(MeshError::InvalidGeometry(format!(
            "matset `{name}` has no material_map, materials or per-material volume_fractions"
        )));
    }
    Ok(())
}

fn index_field(field: &Node, idx: &mut Node) -> Result<(), MeshError> {
    let values = match field.fetch("values") {
        Some(values) => values,
        None => field
            .child("matset_values")?
            .child_at(0)
            .ok_or_else(|| MeshError::missing("matset_values/0"))?,
    };
    let components = if values.is_object() {
        values.number_of_children()
    } else {
        1
    };
    idx.set_path("number_of_components", components as i64);
    for key in ["topology", "matset"] {
        if field.has_path(key) {
            idx.set_path(key, field.string(key)?);
        }
    }
    match field.fetch("association") {
        Some(association) => idx.set_path("association", association.clone()),
        None => idx.set_path("basis", field.child("basis")?.clone()),
    }
    Ok(())
}

/// Index of one domain whose data lives under `ref_path`.
///
/// Fails with [`MeshError::MissingChild`] when `domain` has no `coordsets`.
pub fn generate_index_for_single_domain(domain: &Node, ref_path: &str) -> Result<Node, MeshError> {
    if !domain.has_path("coordsets") {
        return Err(MeshError::missing("coordsets"));
    }
    let mut index = Node::object();

    if domain.has_path("state") {
        for key in ["state/cycle", "state/time"] {
            if let Some(value) = domain.fetch(key) {
                index.set_path(key, value.clone());
            }
        }
        let state_path = if ref_path.is_empty() {
            "state".to_string()
        } else {
            format!("{}/state", ref_path.trim_end_matches('/'))
        };
        index.set_path("state/path", state_path);
    }

    for (name, coordset) in entries(domain, "coordsets") {
        let idx = index.fetch_mut(&format!("coordsets/{name}"));
        index_coordset(coordset, idx)?;
        idx.set_path("path", join_path(ref_path, "coordsets", name));
    }

    for (name, topo) in entries(domain, "topologies") {
        let idx = index.fetch_mut(&format!("topologies/{name}"));
        idx.set_path("type", topo.string("type")?);
        idx.set_path("coordset", topo.string("coordset")?);
        idx.set_path("path", join_path(ref_path, "topologies", name));
        if topo.has_path("grid_function") {
            idx.set_path("grid_function", topo.string("grid_function")?);
        }
    }

    for (name, matset) in entries(domain, "matsets") {
        let idx = index.fetch_mut(&format!("matsets/{name}"));
        index_matset(name, matset, idx)?;
        idx.set_path("path", join_path(ref_path, "matsets", name));
    }

    for (name, specset) in entries(domain, "specsets") {
        let idx = index.fetch_mut(&format!("specsets/{name}"));
        idx.set_path("matset", specset.string("matset")?);
        let first = specset
            .child("matset_values")?
            .child_at(0)
            .ok_or_else(|| MeshError::missing("matset_values/0"))?;
        for species in first.child_names() {
            idx.fetch_mut(&format!("species/{species}"));
        }
        idx.set_path("path", join_path(ref_path, "specsets", name));
    }

    for (name, field) in entries(domain, "fields") {
        let idx = index.fetch_mut(&format!("fields/{name}"));
        index_field(field, idx)?;
        idx.set_path("path", join_path(ref_path, "fields", name));
    }

    for kind in ["adjsets", "nestsets"] {
        for (name, set) in entries(domain, kind) {
            let idx = index.fetch_mut(&format!("{kind}/{name}"));
            idx.set_path("association", set.string("association")?);
            idx.set_path("topology", set.string("topology")?);
            idx.set_path("path", join_path(ref_path, kind, name));
        }
    }
    Ok(index)
}

/// Index of a single- or multi-domain mesh.
///
/// Domains may carry different fields or sets, so a multi-domain index is
/// the union of the per-domain indexes. `state/number_of_domains` is set to
/// `number_of_domains`, the global domain count the caller knows about.
pub fn generate_index(
    mesh: &Node,
    ref_path: &str,
    number_of_domains: usize,
) -> Result<Node, MeshError> {
    if mesh.is_empty() {
        return Err(MeshError::missing("coordsets"));
    }
    let mut index = if is_multi_domain(mesh) {
        let mut union = Node::object();
        for domain in mesh.children() {
            union.update(&generate_index_for_single_domain(domain, ref_path)?);
        }
        union
    } else {
        generate_index_for_single_domain(mesh, ref_path)?
    };
    index.set_path("state/number_of_domains", number_of_domains as i64);
    debug!(
        "indexed {} coordsets, {} topologies, {} fields",
        index.fetch("coordsets").map_or(0, Node::number_of_children),
        index.fetch("topologies").map_or(0, Node::number_of_children),
        index.fetch("fields").map_or(0, Node::number_of_children)
    );
    Ok(index)
}
