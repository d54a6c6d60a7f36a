//! Mesh-level helpers: domains, reference resolution, material sets,
//! adjacency sets and mesh indexes.
//!
//! A single-domain mesh is an object with `coordsets`, `topologies` and
//! optionally `fields`, `matsets`, `adjsets`. Anything without `coordsets` is
//! treated as a multi-domain mesh whose children are domains.

use crate::data::Node;
use crate::mesh_error::MeshError;

pub mod adjset;
pub mod index;
pub mod matset;

pub use index::{generate_index, generate_index_for_single_domain};

pub fn is_multi_domain(mesh: &Node) -> bool {
    !mesh.has_path("coordsets")
}

pub fn number_of_domains(mesh: &Node) -> usize {
    if is_multi_domain(mesh) {
        mesh.number_of_children()
    } else {
        1
    }
}

/// Every domain of `mesh`, in order.
pub fn domains(mesh: &Node) -> Vec<&Node> {
    if is_multi_domain(mesh) {
        mesh.children()
    } else {
        vec![mesh]
    }
}

/// `mesh` as a list of domains; multi-domain meshes are cloned unchanged.
pub fn to_multi_domain(mesh: &Node) -> Node {
    if is_multi_domain(mesh) {
        mesh.clone()
    } else {
        Node::List(vec![mesh.clone()])
    }
}

/// The coordset `topology` references within `domain`.
pub fn find_coordset<'a>(domain: &'a Node, topology: &Node) -> Result<&'a Node, MeshError> {
    let name = topology.string("coordset")?;
    domain
        .fetch("coordsets")
        .and_then(|c| c.as_object())
        .and_then(|c| c.get(name))
        .ok_or_else(|| MeshError::MissingReference {
            kind: "coordset",
            name: name.to_string(),
        })
}

/// Topology `topo_name` of `domain` and the coordset it references.
pub fn topology_and_coordset<'a>(
    domain: &'a Node,
    topo_name: &str,
) -> Result<(&'a Node, &'a Node), MeshError> {
    let topo = domain
        .fetch("topologies")
        .and_then(|t| t.as_object())
        .and_then(|t| t.get(topo_name))
        .ok_or_else(|| MeshError::MissingReference {
            kind: "topology",
            name: topo_name.to_string(),
        })?;
    Ok((topo, find_coordset(domain, topo)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Node {
        let mut d = Node::object();
        d.set_path("coordsets/coords/type", "uniform");
        d.set_path("coordsets/coords/dims/i", 3i64);
        d.set_path("topologies/mesh/type", "uniform");
        d.set_path("topologies/mesh/coordset", "coords");
        d
    }

    #[test]
    fn single_and_multi_domain() {
        let d = domain();
        assert!(!is_multi_domain(&d));
        assert_eq!(number_of_domains(&d), 1);
        let multi = to_multi_domain(&d);
        assert!(is_multi_domain(&multi));
        assert_eq!(number_of_domains(&multi), 1);
        assert_eq!(domains(&multi), vec![&d]);
        assert_eq!(to_multi_domain(&multi), multi);
        assert!(domains(&Node::Empty).is_empty());
    }

    #[test]
    fn references_resolve() {
        let d = domain();
        let (topo, cs) = topology_and_coordset(&d, "mesh").unwrap();
        assert_eq!(topo.string("type").unwrap(), "uniform");
        assert_eq!(cs.indices("dims/i").unwrap(), vec![3]);

        assert_eq!(
            topology_and_coordset(&d, "other"),
            Err(MeshError::MissingReference {
                kind: "topology",
                name: "other".into()
            })
        );
        let mut bad = d.clone();
        bad.set_path("topologies/mesh/coordset", "nowhere");
        assert!(matches!(
            topology_and_coordset(&bad, "mesh"),
            Err(MeshError::MissingReference { kind: "coordset", .. })
        ));
    }
}
