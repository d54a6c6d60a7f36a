mod util;
use util::*;

use approx::assert_relative_eq;
use mesh_blueprint::MeshError;
use mesh_blueprint::data::O2MRelation;
use mesh_blueprint::prelude::{generate_centroids, generate_faces, generate_lines, generate_points};

#[test]
fn points_know_their_elements() {
    let (t, cs) = uniform_grid(&[2, 1]);
    let points = generate_points(&t, &cs).unwrap();
    assert_eq!(points.topology.string("elements/shape").unwrap(), "point");
    assert_eq!(
        points.topology.indices("elements/connectivity").unwrap(),
        (0..6).collect::<Vec<_>>()
    );
    let d2s = O2MRelation::from_node(&points.d2smap).unwrap();
    assert_eq!(d2s.sizes, vec![1, 2, 1, 1, 2, 1]);
    let s2d = O2MRelation::from_node(&points.s2dmap).unwrap();
    assert_permutation(s2d.group(1), &[1, 2, 4, 5]);
}

#[test]
fn interior_lines_are_shared() {
    let (t, cs) = uniform_grid(&[2, 2]);
    let lines = generate_lines(&t, &cs).unwrap();
    assert_eq!(lines.topology.string("elements/shape").unwrap(), "line");
    assert_eq!(lines.topology.array("elements/connectivity").unwrap().len(), 24);
    let s2d = O2MRelation::from_node(&lines.s2dmap).unwrap();
    assert!(s2d.groups().all(|g| g.len() == 4));
    let d2s = O2MRelation::from_node(&lines.d2smap).unwrap();
    assert_eq!(d2s.len(), 12);
    assert_eq!(d2s.sizes.iter().sum::<usize>(), 16);
    assert_eq!(d2s.sizes.iter().filter(|&&s| s == 2).count(), 4);
}

#[test]
fn hex_grid_faces() {
    let (t, cs) = uniform_grid(&[2, 2, 2]);
    let faces = generate_faces(&t, &cs).unwrap();
    assert_eq!(faces.topology.string("elements/shape").unwrap(), "quad");
    let d2s = O2MRelation::from_node(&faces.d2smap).unwrap();
    assert_eq!(d2s.len(), 36);
    assert_eq!(d2s.sizes.iter().filter(|&&s| s == 2).count(), 12);
    let s2d = O2MRelation::from_node(&faces.s2dmap).unwrap();
    assert_eq!(s2d.len(), 8);
    assert!(s2d.groups().all(|g| g.len() == 6));
}

#[test]
fn faces_need_two_dimensions() {
    let (t, cs) = uniform_grid(&[5]);
    assert!(matches!(
        generate_faces(&t, &cs),
        Err(MeshError::UnsupportedOperation(_))
    ));
}

#[test]
fn unit_square_centroid() {
    let (t, cs) = unit_square();
    let out = generate_centroids(&t, &cs, "centers").unwrap();
    assert_relative_eq!(out.coordset.floats("values/x").unwrap()[0], 0.5);
    assert_relative_eq!(out.coordset.floats("values/y").unwrap()[0], 0.5);
    assert_eq!(
        O2MRelation::from_node(&out.d2smap).unwrap().group(0),
        &[0]
    );
}

#[test]
fn hex_grid_centroids_follow_element_order() {
    let (t, cs) = uniform_grid(&[2, 2, 2]);
    let out = generate_centroids(&t, &cs, "centers").unwrap();
    let x = out.coordset.floats("values/x").unwrap();
    let y = out.coordset.floats("values/y").unwrap();
    let z = out.coordset.floats("values/z").unwrap();
    assert_eq!(x.len(), 8);
    assert_relative_eq!(x[0], 0.5);
    assert_relative_eq!(x[1], 1.5);
    assert_relative_eq!(y[1], 0.5);
    assert_relative_eq!(y[2], 1.5);
    assert_relative_eq!(z[3], 0.5);
    assert_relative_eq!(z[4], 1.5);
    assert_eq!(out.topology.indices("elements/connectivity").unwrap(), (0..8).collect::<Vec<_>>());
}
