mod util;
use util::*;

use std::collections::HashMap;

use approx::assert_relative_eq;
use mesh_blueprint::MeshError;
use mesh_blueprint::coordset::Coords;
use mesh_blueprint::data::{Node, O2MRelation};
use mesh_blueprint::prelude::{generate_corners, generate_points};
use mesh_blueprint::topology::{ElementLayout, ShapeType};

fn polygon_area(coords: &Coords, points: &[usize]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = coords.point(points[i]);
            let b = coords.point(points[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f64>()
        * 0.5
}

fn centroid(coords: &Coords, points: &[usize]) -> [f64; 3] {
    let mut c = [0.0; 3];
    for &p in points {
        for (ci, x) in c.iter_mut().zip(coords.point(p)) {
            *ci += x / points.len() as f64;
        }
    }
    c
}

/// Newell normal of a planar polygon, scaled by twice its area.
fn polygon_normal(coords: &Coords, points: &[usize]) -> [f64; 3] {
    let n = points.len();
    let mut normal = [0.0; 3];
    for i in 0..n {
        let a = coords.point(points[i]);
        let b = coords.point(points[(i + 1) % n]);
        normal[0] += a[1] * b[2] - a[2] * b[1];
        normal[1] += a[2] * b[0] - a[0] * b[2];
        normal[2] += a[0] * b[1] - a[1] * b[0];
    }
    normal
}

#[test]
fn quad_grid_corners_cover_every_point() {
    let (t, cs) = uniform_grid(&[2, 2]);
    let out = generate_corners(&t, &cs, "corner_coords").unwrap();
    assert_eq!(out.topology.string("coordset").unwrap(), "corner_coords");
    let layout = ElementLayout::parse(&out.topology).unwrap();
    assert_eq!(layout.shape_of(0), ShapeType::Polygonal);
    assert_eq!(layout.len(), 16);

    let coords = Coords::from_coordset(&out.coordset).unwrap();
    // 9 points, 12 line centroids, 4 face centroids
    assert_eq!(coords.len(), 25);

    let mut anchors: Vec<usize> = (0..16).map(|c| layout.element(c)[0]).collect();
    anchors.sort_unstable();
    anchors.dedup();
    assert_eq!(anchors, (0..9).collect::<Vec<_>>());

    let mut total = 0.0;
    for c in 0..16 {
        let area = polygon_area(&coords, layout.element(c));
        assert_relative_eq!(area, 0.25, epsilon = 1e-12);
        total += area;
    }
    assert_relative_eq!(total, 4.0, epsilon = 1e-12);

    let s2d = O2MRelation::from_node(&out.s2dmap).unwrap();
    assert_eq!(s2d.len(), 4);
    assert!(s2d.groups().all(|g| g.len() == 4));
    let d2s = O2MRelation::from_node(&out.d2smap).unwrap();
    assert_eq!(d2s.group(5), &[1]);
}

#[test]
fn hex_corners_hold_one_original_point() {
    let (t, cs) = uniform_grid(&[2, 1, 1]);
    let out = generate_corners(&t, &cs, "corner_coords").unwrap();
    let layout = ElementLayout::parse(&out.topology).unwrap();
    assert_eq!(layout.shape_of(0), ShapeType::Polyhedral);
    assert_eq!(layout.len(), 16);
    assert_eq!(out.topology.indices("elements/sizes").unwrap(), vec![6; 16]);

    // 12 points, 20 line centroids, 11 face centroids, 2 cell centroids
    assert_eq!(Coords::from_coordset(&out.coordset).unwrap().len(), 45);

    let s2d = O2MRelation::from_node(&out.s2dmap).unwrap();
    for (e, corners) in s2d.groups().enumerate() {
        assert_eq!(corners.len(), 8, "element {e}");
        let mut anchors: Vec<usize> = corners
            .iter()
            .map(|&c| {
                let originals: Vec<usize> = layout
                    .element_points(c)
                    .into_iter()
                    .filter(|&p| p < 12)
                    .collect();
                assert_eq!(originals.len(), 1, "corner {c}");
                originals[0]
            })
            .collect();
        anchors.sort_unstable();
        anchors.dedup();
        assert_eq!(anchors.len(), 8);
    }
}

#[test]
fn hex_corner_faces_wind_outward() {
    let (t, cs) = uniform_grid(&[1, 1, 1]);
    let out = generate_corners(&t, &cs, "corner_coords").unwrap();
    let layout = ElementLayout::parse(&out.topology).unwrap();
    let coords = Coords::from_coordset(&out.coordset).unwrap();
    assert_eq!(layout.len(), 8);

    // shared inner quads keep the winding of the corner that created them
    let mut owner: HashMap<usize, usize> = HashMap::new();
    let mut anchors = Vec::new();
    for c in 0..layout.len() {
        let points = layout.element_points(c);
        let originals: Vec<usize> = points.iter().copied().filter(|&p| p < 8).collect();
        assert_eq!(originals.len(), 1, "corner {c}");
        anchors.push(originals[0]);
        let center = centroid(&coords, &points);

        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for &f in layout.element(c) {
            let face = layout.face(f);
            for i in 0..face.len() {
                let (a, b) = (face[i], face[(i + 1) % face.len()]);
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
            let normal = polygon_normal(&coords, face);
            let fc = centroid(&coords, face);
            let outward: f64 = (0..3).map(|k| normal[k] * (fc[k] - center[k])).sum();
            if *owner.entry(f).or_insert(c) == c {
                assert!(outward > 0.0, "face {f} of corner {c} points inward");
            } else {
                assert!(outward < 0.0, "shared face {f} of corner {c} lost its winding");
            }
        }
        assert_eq!(edges.len(), 12, "corner {c}");
        assert!(edges.values().all(|&n| n == 2), "corner {c} is not closed");
    }
    anchors.sort_unstable();
    assert_eq!(anchors, (0..8).collect::<Vec<_>>());
}

#[test]
fn repeated_triangles_keep_their_corners() {
    let mut cs = Node::object();
    cs.set_path("type", "explicit");
    cs.set_path("values/x", vec![0.0f64, 1.0, 0.0, 1.0]);
    cs.set_path("values/y", vec![0.0f64, 0.0, 1.0, 1.0]);
    let mut t = Node::object();
    t.set_path("type", "unstructured");
    t.set_path("coordset", "coords");
    t.set_path("elements/shape", "tri");
    t.set_path("elements/connectivity", vec![0i32, 1, 2, 0, 1, 2, 1, 3, 2]);

    let points = generate_points(&t, &cs).unwrap();
    assert_eq!(O2MRelation::from_node(&points.s2dmap).unwrap().len(), 3);

    let out = generate_corners(&t, &cs, "corner_coords").unwrap();
    let layout = ElementLayout::parse(&out.topology).unwrap();
    assert_eq!(layout.len(), 9);
    let s2d = O2MRelation::from_node(&out.s2dmap).unwrap();
    assert_eq!(s2d.len(), 3);
    assert_eq!(s2d.group(1), &[3, 4, 5]);
    let d2s = O2MRelation::from_node(&out.d2smap).unwrap();
    let parents: Vec<usize> = (0..9).map(|c| d2s.group(c)[0]).collect();
    assert_eq!(parents, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);

    let coords = Coords::from_coordset(&out.coordset).unwrap();
    let total: f64 = (0..9).map(|c| polygon_area(&coords, layout.element(c))).sum();
    assert_relative_eq!(total, 1.5, epsilon = 1e-12);
}

#[test]
fn corners_need_two_dimensions() {
    let (t, cs) = uniform_grid(&[3]);
    assert!(matches!(
        generate_corners(&t, &cs, "corner_coords"),
        Err(MeshError::UnsupportedOperation(_))
    ));
}
