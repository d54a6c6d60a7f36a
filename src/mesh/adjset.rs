//! Adjacency set utilities.
//!
//! An adjset lists, per group, the neighbor domains (`neighbors`) and the
//! local entities shared with them (`values`). A *pairwise* adjset has one
//! neighbor per group; a *maxshare* adjset puts every entity in exactly one
//! group, the one holding all domains that share it.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::data::{DataArray, DataType, Node, widest_int_dtype};
use crate::mesh_error::MeshError;

struct Group {
    neighbors: Vec<usize>,
    values: Vec<usize>,
}

fn groups_of(adjset: &Node) -> Result<IndexMap<String, Group>, MeshError> {
    let groups = adjset.child("groups")?;
    let entries = groups.as_object().ok_or_else(|| MeshError::WrongNodeKind {
        path: "groups".into(),
        expected: "an object",
    })?;
    entries
        .iter()
        .map(|(name, g)| -> Result<(String, Group), MeshError> {
            Ok((
                name.clone(),
                Group {
                    neighbors: g.indices("neighbors")?,
                    values: g.indices("values")?,
                },
            ))
        })
        .collect()
}

/// Groups in lexicographic name order.
fn sorted_groups(adjset: &Node) -> Result<Vec<Group>, MeshError> {
    let mut groups: Vec<(String, Group)> = groups_of(adjset)?.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(groups.into_iter().map(|(_, g)| g).collect())
}

pub fn is_pairwise(adjset: &Node) -> Result<bool, MeshError> {
    Ok(groups_of(adjset)?.values().all(|g| g.neighbors.len() == 1))
}

pub fn is_maxshare(adjset: &Node) -> Result<bool, MeshError> {
    let mut seen = BTreeSet::new();
    Ok(groups_of(adjset)?
        .values()
        .flat_map(|g| g.values.iter())
        .all(|v| seen.insert(*v)))
}

/// Write `groups` (neighbor list, value list) as the canonical groups of a
/// copy of `adjset`: neighbors ascending, groups named
/// `group_<n0>_<n1>...` and ordered by name.
fn with_canonical_groups(
    adjset: &Node,
    groups: Vec<(Vec<usize>, Vec<usize>)>,
    dtype: DataType,
) -> Result<Node, MeshError> {
    let mut named: Vec<(String, Vec<usize>, Vec<usize>)> = groups
        .into_iter()
        .map(|(mut neighbors, values)| {
            neighbors.sort_unstable();
            let name = format!("group_{}", neighbors.iter().join("_"));
            (name, neighbors, values)
        })
        .collect();
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let mut dest = adjset.clone();
    dest.remove("groups");
    let out = dest.fetch_mut("groups");
    *out = Node::object();
    for (name, neighbors, values) in named {
        let g = out.fetch_mut(&name);
        g.set_path("neighbors", DataArray::from_values(dtype, &neighbors)?);
        g.set_path("values", DataArray::from_values(dtype, &values)?);
    }
    Ok(dest)
}

/// One group per neighbor; each holds the values of every source group that
/// lists the neighbor, concatenated in group-name order.
pub fn to_pairwise(adjset: &Node) -> Result<Node, MeshError> {
    let dtype = widest_int_dtype(&[adjset]);
    let mut per_neighbor: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for group in sorted_groups(adjset)? {
        for &n in &group.neighbors {
            per_neighbor
                .entry(n)
                .or_default()
                .extend_from_slice(&group.values);
        }
    }
    let groups = per_neighbor
        .into_iter()
        .map(|(n, values)| (vec![n], values))
        .collect();
    with_canonical_groups(adjset, groups, dtype)
}

/// One group per distinct set of domains sharing an entity; values keep
/// first-seen order over group-name order, without repeats.
pub fn to_maxshare(adjset: &Node) -> Result<Node, MeshError> {
    let dtype = widest_int_dtype(&[adjset]);
    let groups = sorted_groups(adjset)?;

    let mut sharing: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for group in &groups {
        for &v in &group.values {
            sharing
                .entry(v)
                .or_default()
                .extend(group.neighbors.iter().copied());
        }
    }

    let mut per_set: BTreeMap<&BTreeSet<usize>, (Vec<usize>, BTreeSet<usize>)> = BTreeMap::new();
    for group in &groups {
        for v in &group.values {
            let Some(set) = sharing.get(v) else { continue };
            let (list, seen) = per_set.entry(set).or_default();
            if seen.insert(*v) {
                list.push(*v);
            }
        }
    }
    let out = per_set
        .into_iter()
        .map(|(set, (values, _))| (set.iter().copied().collect(), values))
        .collect();
    with_canonical_groups(adjset, out, dtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjset() -> Node {
        let mut a = Node::object();
        a.set_path("association", "vertex");
        a.set_path("topology", "mesh");
        a.set_path("groups/g1/neighbors", vec![2i32, 1]);
        a.set_path("groups/g1/values", vec![4i32]);
        a.set_path("groups/g0/neighbors", vec![1i32]);
        a.set_path("groups/g0/values", vec![3i32, 4]);
        a
    }

    #[test]
    fn predicates() {
        let a = adjset();
        assert!(!is_pairwise(&a).unwrap());
        assert!(!is_maxshare(&a).unwrap());
        assert!(is_pairwise(&to_pairwise(&a).unwrap()).unwrap());
        assert!(is_maxshare(&to_maxshare(&a).unwrap()).unwrap());
    }

    #[test]
    fn pairwise_groups_per_neighbor() {
        let p = to_pairwise(&adjset()).unwrap();
        assert_eq!(p.string("association").unwrap(), "vertex");
        assert_eq!(p.child("groups").unwrap().child_names(), vec!["group_1", "group_2"]);
        // g0 sorts before g1
        assert_eq!(p.indices("groups/group_1/values").unwrap(), vec![3, 4, 4]);
        assert_eq!(p.indices("groups/group_2/values").unwrap(), vec![4]);
        assert_eq!(
            p.array("groups/group_1/neighbors").unwrap().dtype(),
            DataType::Int32
        );
    }

    #[test]
    fn maxshare_groups_per_sharing_set() {
        let m = to_maxshare(&adjset()).unwrap();
        assert_eq!(m.child("groups").unwrap().child_names(), vec!["group_1", "group_1_2"]);
        assert_eq!(m.indices("groups/group_1/values").unwrap(), vec![3]);
        assert_eq!(m.indices("groups/group_1_2/values").unwrap(), vec![4]);
        assert_eq!(m.indices("groups/group_1_2/neighbors").unwrap(), vec![1, 2]);
    }

    #[test]
    fn missing_groups_fail() {
        assert!(matches!(
            is_pairwise(&Node::object()),
            Err(MeshError::MissingChild { .. })
        ));
    }
}
