//! Dimensional adjacency of an unstructured topology.
//!
//! [`TopologyMetadata`] enumerates every entity of every dimension (points,
//! lines, faces, cells) and records which entities contain which. Shared
//! sub-entities are deduplicated by their sorted point set; the first
//! occurrence fixes both the global id and the stored vertex order.
//!
//! Two indexing modes are kept:
//! - `Global`: one id per unique entity, associations deduplicated.
//! - `Local`: one id per occurrence, i.e. per (owner, sub-entity) visit, so a
//!   face shared by two cells has two local ids, each keeping the winding its
//!   owner gave it.
//!
//! Construction is a single breadth-first pass over a queue seeded with all
//! coordset points and then all elements; numbering follows that order, so
//! point ids equal coordset indices and cell ids equal element indices.

use std::collections::VecDeque;

use hashbrown::HashMap;
use log::{debug, trace, warn};

use crate::coordset;
use crate::data::{DataType, Node, O2MRelation, widest_float_dtype, widest_int_dtype};
use crate::mesh_error::MeshError;
use crate::topology::cascade::ShapeCascade;
use crate::topology::convert::{face_key, to_unstructured};
use crate::topology::layout::{ElementLayout, PolyList};
use crate::topology::shape::ShapeType;
use crate::topology::{TopologyType, topology_type};

/// Which id space an association query uses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum IndexType {
    /// Unique entities.
    Global,
    /// Per-owner occurrences.
    Local,
}

/// How a queued entity produces its sub-entities.
#[derive(Clone, Copy, Debug)]
enum Kind {
    /// Fixed shape: children come from the embedding table.
    Fixed(ShapeType),
    /// Polygon: children are consecutive vertex pairs.
    Polygon,
    /// Polyhedral element `e`: children are its faces.
    Polyhedron(usize),
}

#[derive(Clone, Copy, Debug)]
struct Ancestor {
    dim: usize,
    gid: usize,
    lid: usize,
}

struct Pending {
    vertices: Vec<usize>,
    dim: usize,
    kind: Kind,
    ancestors: Vec<Ancestor>,
}

/// `table[id]` lists associated ids.
type AssocTable = Vec<Vec<usize>>;

#[derive(Clone, Debug)]
pub struct TopologyMetadata {
    cascade: ShapeCascade,
    layout: ElementLayout,
    /// `[dim][gid]` vertex list as first encountered.
    entities: Vec<Vec<Vec<usize>>>,
    /// `[dim][lid]` global id of each occurrence.
    le2ge: Vec<Vec<usize>>,
    /// `[src][dst]` global associations.
    global: Vec<Vec<AssocTable>>,
    /// `[src][dst]` local associations.
    local: Vec<Vec<AssocTable>>,
    dim_topos: Vec<Node>,
    /// Index type of derived topologies and relation maps.
    pub int_dtype: DataType,
    /// Coordinate type of derived coordsets.
    pub float_dtype: DataType,
}

fn push_unique(list: &mut Vec<usize>, id: usize) {
    if !list.contains(&id) {
        list.push(id);
    }
}

impl TopologyMetadata {
    /// Build the metadata of `topo` over `coordset`.
    ///
    /// Implicit topologies are converted to unstructured first. Connectivity
    /// is range-checked against the coordset before any entity is created.
    pub fn new(topo: &Node, coordset: &Node) -> Result<Self, MeshError> {
        let coordset_name = topo.fetch("coordset").and_then(Node::as_str).unwrap_or("coords");
        let unstructured;
        let topo = match topology_type(topo)? {
            TopologyType::Unstructured => topo,
            _ => {
                unstructured = to_unstructured(topo, coordset, coordset_name)?.0;
                &unstructured
            }
        };
        let npoints = coordset::length(coordset)?;
        let layout = ElementLayout::parse_checked(topo, npoints)?;
        let cascade = ShapeCascade::from_layout(&layout);

        let mut meta = Self::empty(cascade, layout);
        meta.int_dtype = widest_int_dtype(&[topo, coordset]);
        meta.float_dtype = widest_float_dtype(&[coordset]);
        meta.traverse(npoints);
        meta.build_dim_topos(topo, coordset_name)?;

        debug!(
            "topology metadata: {} entities per dimension {:?}",
            meta.total_length(),
            (0..=meta.dim()).map(|d| meta.get_length(d)).collect::<Vec<_>>()
        );
        Ok(meta)
    }

    fn empty(cascade: ShapeCascade, layout: ElementLayout) -> Self {
        let n = cascade.dim() + 1;
        Self {
            cascade,
            layout,
            entities: vec![Vec::new(); n],
            le2ge: vec![Vec::new(); n],
            global: vec![vec![Vec::new(); n]; n],
            local: vec![vec![Vec::new(); n]; n],
            dim_topos: Vec::new(),
            int_dtype: DataType::Int64,
            float_dtype: DataType::Float64,
        }
    }

    fn traverse(&mut self, npoints: usize) {
        let top = self.dim();
        let mut keys: Vec<HashMap<Vec<usize>, usize>> = vec![HashMap::new(); top + 1];
        let mut queue: VecDeque<Pending> = VecDeque::new();

        queue.extend((0..npoints).map(|p| Pending {
            vertices: vec![p],
            dim: 0,
            kind: Kind::Fixed(ShapeType::Point),
            ancestors: Vec::new(),
        }));
        if top > 0 {
            for e in 0..self.layout.len() {
                let (vertices, kind) = match self.layout.shape_of(e) {
                    ShapeType::Polyhedral => (self.layout.element_points(e), Kind::Polyhedron(e)),
                    ShapeType::Polygonal => (self.layout.element(e).to_vec(), Kind::Polygon),
                    fixed => (self.layout.element(e).to_vec(), Kind::Fixed(fixed)),
                };
                queue.push_back(Pending {
                    vertices,
                    dim: top,
                    kind,
                    ancestors: Vec::new(),
                });
            }
        }

        while let Some(entry) = queue.pop_front() {
            let dim = entry.dim;
            let gid = if dim == 0 {
                entry.vertices[0]
            } else {
                let next = self.entities[dim].len();
                let key = face_key(&entry.vertices);
                match keys[dim].get(&key) {
                    // elements keep their own ids even when point sets repeat
                    Some(&gid) if dim == top => {
                        warn!("element {next} repeats the point set of element {gid}");
                        next
                    }
                    Some(&gid) => gid,
                    None => {
                        keys[dim].insert(key, next);
                        next
                    }
                }
            };
            if gid == self.entities[dim].len() {
                self.entities[dim].push(entry.vertices.clone());
                for table in &mut self.global[dim] {
                    table.push(Vec::new());
                }
                // every entity is associated with itself
                self.global[dim][dim][gid].push(gid);
            }
            let lid = self.le2ge[dim].len();
            self.le2ge[dim].push(gid);
            for table in &mut self.local[dim] {
                table.push(Vec::new());
            }
            self.local[dim][dim][lid].push(lid);

            let me = Ancestor { dim, gid, lid };
            for a in &entry.ancestors {
                self.associate(*a, me);
            }

            let mut ancestors = entry.ancestors;
            ancestors.push(me);
            for (vertices, kind) in self.children(&entry.vertices, entry.kind) {
                queue.push_back(Pending {
                    vertices,
                    dim: dim - 1,
                    kind,
                    ancestors: ancestors.clone(),
                });
            }
        }

        for d in 0..=top {
            trace!(
                "dimension {d}: {} entities, {} occurrences",
                self.entities[d].len(),
                self.le2ge[d].len()
            );
        }
    }

    fn associate(&mut self, hi: Ancestor, lo: Ancestor) {
        push_unique(&mut self.global[hi.dim][lo.dim][hi.gid], lo.gid);
        push_unique(&mut self.global[lo.dim][hi.dim][lo.gid], hi.gid);
        self.local[hi.dim][lo.dim][hi.lid].push(lo.lid);
        self.local[lo.dim][hi.dim][lo.lid].push(hi.lid);
    }

    /// Sub-entities of an entity in the winding it was given.
    fn children(&self, vertices: &[usize], kind: Kind) -> Vec<(Vec<usize>, Kind)> {
        match kind {
            Kind::Fixed(shape) => match shape.embed_shape() {
                Some(sub) => shape
                    .embedding()
                    .iter()
                    .map(|local| {
                        (
                            local.iter().map(|&i| vertices[i]).collect(),
                            Kind::Fixed(sub),
                        )
                    })
                    .collect(),
                None => Vec::new(),
            },
            Kind::Polygon => {
                let n = vertices.len();
                (0..n)
                    .map(|i| {
                        (
                            vec![vertices[i], vertices[(i + 1) % n]],
                            Kind::Fixed(ShapeType::Line),
                        )
                    })
                    .collect()
            }
            Kind::Polyhedron(e) => self
                .layout
                .element(e)
                .iter()
                .map(|&f| (self.layout.face(f).to_vec(), Kind::Polygon))
                .collect(),
        }
    }

    fn build_dim_topos(&mut self, topo: &Node, coordset_name: &str) -> Result<(), MeshError> {
        let top = self.dim();
        let mut topos = Vec::with_capacity(top + 1);
        for d in 0..=top {
            let mut t = Node::object();
            t.set_path("type", TopologyType::Unstructured.name());
            t.set_path("coordset", coordset_name);
            let layout = if d == top {
                if let Some(origin) = topo.fetch("elements/origin") {
                    t.set_path("elements/origin", origin.clone());
                }
                self.layout.clone()
            } else {
                let shape = self.cascade.shape(d);
                let entities = &self.entities[d];
                match shape.indices() {
                    Some(n) if entities.iter().all(|v| v.len() == n) => ElementLayout::Uniform {
                        shape,
                        connectivity: entities.iter().flatten().copied().collect(),
                    },
                    _ => ElementLayout::Polygonal(PolyList::from_lists(entities)),
                }
            };
            layout.write(&mut t, self.int_dtype)?;
            topos.push(t);
        }
        self.dim_topos = topos;
        Ok(())
    }

    /// Topological dimension of the base topology.
    pub fn dim(&self) -> usize {
        self.cascade.dim()
    }

    pub fn cascade(&self) -> &ShapeCascade {
        &self.cascade
    }

    /// Element layout of the (normalized) base topology.
    pub fn layout(&self) -> &ElementLayout {
        &self.layout
    }

    /// Unstructured topology of the unique entities at dimension `d`.
    pub fn dim_topo(&self, d: usize) -> &Node {
        &self.dim_topos[d]
    }

    /// Vertex list of global entity `gid` at dimension `d`.
    ///
    /// Polyhedral cells report their sorted point set.
    pub fn entity_vertices(&self, d: usize, gid: usize) -> &[usize] {
        &self.entities[d][gid]
    }

    /// Number of unique entities at dimension `d`.
    pub fn get_length(&self, d: usize) -> usize {
        self.entities[d].len()
    }

    /// Number of unique entities over all dimensions.
    pub fn total_length(&self) -> usize {
        self.entities.iter().map(Vec::len).sum()
    }

    /// Number of occurrences (local ids) at dimension `d`.
    pub fn get_local_length(&self, d: usize) -> usize {
        self.le2ge[d].len()
    }

    /// Total count of local `lo`-dimensional entities under all local
    /// `hi`-dimensional entities.
    pub fn get_embed_length(&self, hi: usize, lo: usize) -> usize {
        if hi == lo {
            return self.get_local_length(hi);
        }
        self.local[hi][lo].iter().map(Vec::len).sum()
    }

    /// Global id of local entity `lid` at dimension `d`.
    pub fn local_to_global(&self, d: usize, lid: usize) -> usize {
        self.le2ge[d][lid]
    }

    /// Entities of dimension `dst` associated with entity `id` of dimension `src`.
    ///
    /// # Panics
    /// If either dimension exceeds [`dim`](Self::dim) or `id` is not an
    /// entity of dimension `src` in the chosen index space.
    pub fn get_entity_assocs(
        &self,
        mode: IndexType,
        id: usize,
        src: usize,
        dst: usize,
    ) -> &[usize] {
        let table = match mode {
            IndexType::Global => &self.global[src][dst],
            IndexType::Local => &self.local[src][dst],
        };
        &table[id]
    }

    /// Relation from every `src` entity to its `dst` entities.
    pub fn get_dim_map(&self, mode: IndexType, src: usize, dst: usize) -> O2MRelation {
        let table = match mode {
            IndexType::Global => &self.global[src][dst],
            IndexType::Local => &self.local[src][dst],
        };
        O2MRelation::from_groups(table)
    }
}

static_assertions::assert_impl_all!(TopologyMetadata: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn quads_2x1() -> (Node, Node) {
        let mut cs = Node::object();
        cs.set_path("type", "explicit");
        cs.set_path("values/x", vec![0.0f64, 1.0, 2.0, 0.0, 1.0, 2.0]);
        cs.set_path("values/y", vec![0.0f64, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let mut t = Node::object();
        t.set_path("type", "unstructured");
        t.set_path("coordset", "coords");
        t.set_path("elements/shape", "quad");
        t.set_path("elements/connectivity", vec![0i32, 1, 4, 3, 1, 2, 5, 4]);
        (t, cs)
    }

    #[test]
    fn shared_edge_is_deduplicated() {
        let (t, cs) = quads_2x1();
        let m = TopologyMetadata::new(&t, &cs).unwrap();
        assert_eq!(m.dim(), 2);
        assert_eq!(m.get_length(0), 6);
        assert_eq!(m.get_length(1), 7);
        assert_eq!(m.get_length(2), 2);
        assert_eq!(m.total_length(), 15);
        // eight local edges under the two quads
        assert_eq!(m.get_embed_length(2, 1), 8);
        assert_eq!(m.get_local_length(1), 8);
    }

    #[test]
    fn global_and_local_views_differ_on_shared_edge() {
        let (t, cs) = quads_2x1();
        let m = TopologyMetadata::new(&t, &cs).unwrap();
        // edge (1,4) belongs to both quads
        let shared = (0..m.get_length(1))
            .find(|&g| face_key(m.entity_vertices(1, g)) == vec![1, 4])
            .unwrap();
        assert_eq!(
            m.get_entity_assocs(IndexType::Global, shared, 1, 2),
            &[0, 1]
        );
        // stored in the winding of quad 0, seen reversed from quad 1
        assert_eq!(m.entity_vertices(1, shared), &[1, 4]);
        let q1_edges = m.get_entity_assocs(IndexType::Local, 1, 2, 1);
        let reversed = q1_edges
            .iter()
            .find(|&&l| m.local_to_global(1, l) == shared)
            .unwrap();
        let ends: Vec<usize> = m
            .get_entity_assocs(IndexType::Local, *reversed, 1, 0)
            .iter()
            .map(|&l| m.local_to_global(0, l))
            .collect();
        assert_eq!(ends, vec![4, 1]);
    }

    #[test]
    fn element_points_follow_winding() {
        let (t, cs) = quads_2x1();
        let m = TopologyMetadata::new(&t, &cs).unwrap();
        assert_eq!(
            m.get_entity_assocs(IndexType::Global, 0, 2, 0),
            &[0, 1, 4, 3]
        );
        assert_eq!(
            m.get_entity_assocs(IndexType::Global, 4, 0, 2),
            &[0, 1]
        );
        assert_eq!(m.get_entity_assocs(IndexType::Global, 1, 2, 2), &[1]);
        let rel = m.get_dim_map(IndexType::Global, 2, 1);
        assert_eq!(rel.len(), 2);
        assert_eq!(rel.sizes, vec![4, 4]);
    }

    #[test]
    fn dim_topos_are_unstructured() {
        let (t, cs) = quads_2x1();
        let m = TopologyMetadata::new(&t, &cs).unwrap();
        let lines = m.dim_topo(1);
        assert_eq!(lines.string("elements/shape").unwrap(), "line");
        assert_eq!(lines.array("elements/connectivity").unwrap().len(), 14);
        assert_eq!(lines.array("elements/connectivity").unwrap().dtype(), DataType::Int32);
        let pts = m.dim_topo(0);
        assert_eq!(pts.string("elements/shape").unwrap(), "point");
        assert_eq!(pts.indices("elements/connectivity").unwrap(), (0..6).collect::<Vec<_>>());
        assert_eq!(m.dim_topo(2).indices("elements/offsets").unwrap(), vec![0, 4]);
    }

    #[test]
    fn repeated_elements_keep_their_ids() {
        let mut cs = Node::object();
        cs.set_path("type", "explicit");
        cs.set_path("values/x", vec![0.0f64, 1.0, 0.0, 1.0]);
        cs.set_path("values/y", vec![0.0f64, 0.0, 1.0, 1.0]);
        let mut t = Node::object();
        t.set_path("type", "unstructured");
        t.set_path("coordset", "coords");
        t.set_path("elements/shape", "tri");
        t.set_path("elements/connectivity", vec![0i32, 1, 2, 0, 1, 2, 1, 3, 2]);
        let m = TopologyMetadata::new(&t, &cs).unwrap();
        assert_eq!(m.get_length(2), 3);
        assert_eq!(m.get_local_length(2), 3);
        assert_eq!(m.local_to_global(2, 2), 2);
        assert_eq!(m.get_length(1), 5);
        assert_eq!(m.get_dim_map(IndexType::Global, 2, 0).len(), 3);
        assert_eq!(m.get_entity_assocs(IndexType::Global, 2, 2, 0), &[1, 3, 2]);
    }

    #[test]
    fn out_of_range_connectivity_fails() {
        let (mut t, cs) = quads_2x1();
        t.set_path("elements/connectivity", vec![0i32, 1, 4, 9]);
        assert!(matches!(
            TopologyMetadata::new(&t, &cs),
            Err(MeshError::IndexOutOfRange { index: 9, .. })
        ));
    }
}
