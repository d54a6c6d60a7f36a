#![allow(dead_code)]
use mesh_blueprint::data::Node;

const LOGICAL_AXES: [&str; 3] = ["i", "j", "k"];

/// Uniform coordset with `dims` points per axis, unit spacing, origin 0.
pub fn uniform_coords(dims: &[i64]) -> Node {
    let mut cs = Node::object();
    cs.set_path("type", "uniform");
    for (axis, &n) in LOGICAL_AXES.iter().zip(dims) {
        cs.set_path(&format!("dims/{axis}"), n);
    }
    cs
}

/// Uniform topology over coordset `coords`.
pub fn uniform_topo() -> Node {
    let mut t = Node::object();
    t.set_path("type", "uniform");
    t.set_path("coordset", "coords");
    t
}

/// Grid of `cells[d]` unit cells per axis as (topology, coordset).
pub fn uniform_grid(cells: &[i64]) -> (Node, Node) {
    let dims: Vec<i64> = cells.iter().map(|c| c + 1).collect();
    (uniform_topo(), uniform_coords(&dims))
}

/// One unit quad, counter-clockwise.
pub fn unit_square() -> (Node, Node) {
    let mut cs = Node::object();
    cs.set_path("type", "explicit");
    cs.set_path("values/x", vec![0.0f64, 1.0, 1.0, 0.0]);
    cs.set_path("values/y", vec![0.0f64, 0.0, 1.0, 1.0]);
    let mut t = Node::object();
    t.set_path("type", "unstructured");
    t.set_path("coordset", "coords");
    t.set_path("elements/shape", "quad");
    t.set_path("elements/connectivity", vec![0i32, 1, 2, 3]);
    (t, cs)
}

/// Single-domain mesh holding `topo` as `mesh` and `coordset` as `coords`.
pub fn domain(topo: Node, coordset: Node) -> Node {
    let mut d = Node::object();
    d.set_path("coordsets/coords", coordset);
    d.set_path("topologies/mesh", topo);
    d
}

/// Element-associated field on topology `mesh`.
pub fn element_field(values: Node, volume_dependent: bool) -> Node {
    let mut f = Node::object();
    f.set_path("topology", "mesh");
    f.set_path("association", "element");
    if volume_dependent {
        f.set_path("volume_dependent", "true");
    }
    f.set_path("values", values);
    f
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
