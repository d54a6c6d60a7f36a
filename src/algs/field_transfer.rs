//! Field remapping onto a side decomposition.
//!
//! Element fields are broadcast from each source element to its sides; a
//! field marked `volume_dependent: "true"` is scaled by the side's share of
//! its element's measure. Vertex fields keep their values on the original
//! points and give every centroid vertex the mean of its original-point
//! neighbors.

use log::warn;

use crate::algs::sides::SideDecomposition;
use crate::data::{DataArray, DataType, Node};
use crate::geometry::measure::side_measure;
use crate::mesh_error::MeshError;

/// Options of [`generate_sides_with_fields`](crate::algs::generate_sides_with_fields).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SidesOptions {
    /// Prepended to every generated field name.
    pub field_prefix: String,
    /// Fields to remap; `None` remaps every field on the topology.
    pub field_names: Option<Vec<String>>,
}

impl SidesOptions {
    /// Read an options tree with optional `field_prefix` (string) and
    /// `field_names` (string or list of strings).
    pub fn from_node(options: &Node) -> Result<Self, MeshError> {
        let mut out = Self::default();
        if let Some(prefix) = options.fetch("field_prefix") {
            out.field_prefix = prefix
                .as_str()
                .ok_or_else(|| MeshError::InvalidOption("field_prefix must be a string".into()))?
                .to_string();
        }
        if let Some(names) = options.fetch("field_names") {
            let bad = || MeshError::InvalidOption("field_names must be a string or a list of strings".into());
            let names = match names {
                Node::String(name) => vec![name.clone()],
                Node::List(items) => items
                    .iter()
                    .map(|n| n.as_str().map(str::to_string).ok_or_else(bad))
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(bad()),
            };
            out.field_names = Some(names);
        }
        Ok(out)
    }

    /// Fail with [`MeshError::FieldNotFound`] if a named field is absent from
    /// `fields`, or [`MeshError::FieldTopologyMismatch`] if it lives on a
    /// topology other than `topo_name`.
    pub fn check_fields(&self, fields: &Node, topo_name: &str) -> Result<(), MeshError> {
        let present = fields.as_object();
        for name in self.field_names.iter().flatten() {
            let field = present
                .and_then(|f| f.get(name))
                .ok_or_else(|| MeshError::FieldNotFound(name.clone()))?;
            if field.string("topology")? != topo_name {
                return Err(MeshError::FieldTopologyMismatch {
                    field: name.clone(),
                    topology: topo_name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn selects(&self, name: &str) -> bool {
        self.field_names
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name))
    }
}

fn field_header(topo_name: &str, association: &str, volume_dependent: bool) -> Node {
    let mut f = Node::object();
    f.set_path("topology", topo_name);
    f.set_path("association", association);
    f.set_path(
        "volume_dependent",
        if volume_dependent { "true" } else { "false" },
    );
    f
}

/// Per-side measures and each side's fraction of its element's total.
pub(crate) fn side_ratios(sides: &SideDecomposition) -> Result<(Vec<f64>, Vec<f64>), MeshError> {
    let mut measures = Vec::with_capacity(sides.len());
    let mut totals = vec![0.0; sides.element_sides.len()];
    for s in 0..sides.len() {
        let vertices: Vec<[f64; 3]> = sides
            .side(s)
            .iter()
            .map(|&p| sides.coords.point(p))
            .collect();
        let m = side_measure(sides.dim, &vertices)?;
        totals[sides.parents[s]] += m;
        measures.push(m);
    }
    let ratios = measures
        .iter()
        .zip(&sides.parents)
        .map(|(m, &e)| m / totals[e])
        .collect();
    Ok((measures, ratios))
}

/// Distinct neighbors of every generated vertex, indexed from the first one.
fn generated_vertex_neighbors(sides: &SideDecomposition) -> Vec<Vec<usize>> {
    let first_new = sides.original_points;
    let mut neighbors = vec![Vec::new(); sides.coords.len() - first_new];
    for s in 0..sides.len() {
        let side = sides.side(s);
        for (j, &v) in side.iter().enumerate() {
            if v < first_new {
                continue;
            }
            let list = &mut neighbors[v - first_new];
            list.extend(side.iter().enumerate().filter(|&(k, _)| k != j).map(|(_, &p)| p));
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

fn remap_element_values(
    values: &DataArray,
    sides: &SideDecomposition,
    ratios: Option<&[f64]>,
) -> Result<DataArray, MeshError> {
    match ratios {
        None => values.gather(&sides.parents),
        Some(ratios) => {
            let scaled = sides
                .parents
                .iter()
                .zip(ratios)
                .map(|(&e, r)| {
                    values
                        .get_f64(e)
                        .map(|v| v * r)
                        .ok_or_else(|| MeshError::out_of_range("element field", e, values.len()))
                })
                .collect::<Result<Vec<f64>, _>>()?;
            Ok(DataArray::from(scaled))
        }
    }
}

fn remap_vertex_values(
    name: &str,
    values: &DataArray,
    sides: &SideDecomposition,
    neighbors: &[Vec<usize>],
) -> Result<DataArray, MeshError> {
    let first_new = sides.original_points;
    let source = values.to_f64_vec();
    if source.len() < first_new {
        return Err(MeshError::out_of_range(
            format!("vertex field `{name}`"),
            first_new - 1,
            source.len(),
        ));
    }
    let mut out = source[..first_new].to_vec();
    let mut isolated = 0usize;
    for list in neighbors {
        let originals: Vec<f64> = list
            .iter()
            .filter(|&&p| p < first_new)
            .map(|&p| source[p])
            .collect();
        if originals.is_empty() {
            isolated += 1;
            out.push(0.0);
        } else {
            out.push(originals.iter().sum::<f64>() / originals.len() as f64);
        }
    }
    if isolated > 0 {
        warn!("vertex field `{name}`: {isolated} generated vertices without original neighbors set to 0");
    }
    Ok(DataArray::from(out))
}

/// Remap `fields` defined on `topo_name` onto `sides`.
///
/// The output always holds `original_element_ids` and `original_vertex_ids`
/// (int32, `-1` for generated vertices), and a float64 `volume` field once
/// any volume-dependent field is mapped. Names carry the option prefix.
pub(crate) fn map_fields_to_sides(
    sides: &SideDecomposition,
    topo_name: &str,
    fields: &Node,
    options: &SidesOptions,
) -> Result<Node, MeshError> {
    let prefix = &options.field_prefix;
    let mut out = Node::object();

    let mut elem_ids = field_header(topo_name, "element", false);
    elem_ids.set_path("values", DataArray::from_values(DataType::Int32, &sides.parents)?);
    out.set_path(&format!("{prefix}original_element_ids"), elem_ids);

    let vertex_ids: Vec<i64> = (0..sides.coords.len())
        .map(|i| if i < sides.original_points { i as i64 } else { -1 })
        .collect();
    let mut vert_ids = field_header(topo_name, "vertex", false);
    vert_ids.set_path("values", DataArray::from_values(DataType::Int32, &vertex_ids)?);
    out.set_path(&format!("{prefix}original_vertex_ids"), vert_ids);

    let Some(entries) = fields.as_object() else {
        return Ok(out);
    };
    let mut ratios: Option<Vec<f64>> = None;
    let mut neighbors: Option<Vec<Vec<usize>>> = None;

    for (name, field) in entries {
        if !options.selects(name) {
            continue;
        }
        let field_topo = field.string("topology")?;
        if field_topo != topo_name {
            if options.field_names.is_some() {
                return Err(MeshError::FieldTopologyMismatch {
                    field: name.clone(),
                    topology: topo_name.to_string(),
                });
            }
            continue;
        }
        let vertex = match field.fetch("association") {
            None => false,
            Some(_) => match field.string("association")? {
                "element" => false,
                "vertex" => true,
                other => return Err(MeshError::UnsupportedAssociation(other.to_string())),
            },
        };
        let volume_dependent =
            field.fetch("volume_dependent").and_then(Node::as_str) == Some("true");
        if volume_dependent && vertex {
            return Err(MeshError::UnsupportedAssociation(format!(
                "volume-dependent vertex field `{name}`"
            )));
        }

        let mut dest = Node::object();
        if let Some(children) = field.as_object() {
            for (key, child) in children.iter().filter(|(k, _)| k.as_str() != "values") {
                dest.set_path(key, child.clone());
            }
        }

        let mut volume_field = None;
        if volume_dependent && ratios.is_none() {
            let (measures, r) = side_ratios(sides)?;
            let mut vol = field_header(topo_name, "element", true);
            vol.set_path("values", DataArray::from(measures));
            volume_field = Some(vol);
            ratios = Some(r);
        }
        if vertex && neighbors.is_none() {
            neighbors = Some(generated_vertex_neighbors(sides));
        }

        let remap = |values: &DataArray| -> Result<DataArray, MeshError> {
            if vertex {
                remap_vertex_values(name, values, sides, neighbors.as_deref().unwrap_or(&[]))
            } else {
                let r = if volume_dependent { ratios.as_deref() } else { None };
                remap_element_values(values, sides, r)
            }
        };
        match field.child("values")? {
            Node::Array(values) => dest.set_path("values", remap(values)?),
            Node::Object(components) => {
                for (component, values) in components {
                    let values = values.as_array().ok_or_else(|| MeshError::WrongNodeKind {
                        path: format!("{name}/values/{component}"),
                        expected: "a numeric array",
                    })?;
                    dest.set_path(&format!("values/{component}"), remap(values)?);
                }
            }
            _ => {
                return Err(MeshError::WrongNodeKind {
                    path: format!("{name}/values"),
                    expected: "a numeric array or an object of arrays",
                });
            }
        }

        out.set_path(&format!("{prefix}{name}"), dest);
        if let Some(vol) = volume_field {
            out.set_path(&format!("{prefix}volume"), vol);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two unit quads side by side; the right one is twice as wide.
    fn two_quads() -> (Node, Node) {
        let mut cs = Node::object();
        cs.set_path("type", "explicit");
        cs.set_path("values/x", vec![0.0f64, 1.0, 3.0, 0.0, 1.0, 3.0]);
        cs.set_path("values/y", vec![0.0f64, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let mut t = Node::object();
        t.set_path("type", "unstructured");
        t.set_path("coordset", "coords");
        t.set_path("elements/shape", "quad");
        t.set_path("elements/connectivity", vec![0i32, 1, 4, 3, 1, 2, 5, 4]);
        (t, cs)
    }

    fn field(assoc: &str, vol_dep: bool, values: Node) -> Node {
        let mut f = Node::object();
        f.set_path("topology", "mesh");
        f.set_path("association", assoc);
        if vol_dep {
            f.set_path("volume_dependent", "true");
        }
        f.set_path("values", values);
        f
    }

    #[test]
    fn options_are_validated() {
        let mut opts = Node::object();
        opts.set_path("field_prefix", "s_");
        opts.set_path("field_names", "mass");
        let o = SidesOptions::from_node(&opts).unwrap();
        assert_eq!(o.field_prefix, "s_");
        assert_eq!(o.field_names, Some(vec!["mass".to_string()]));

        opts.set_path("field_prefix", 3i64);
        assert!(matches!(
            SidesOptions::from_node(&opts),
            Err(MeshError::InvalidOption(_))
        ));

        let mut opts = Node::object();
        *opts.fetch_mut("field_names").append() = Node::from(1i64);
        assert!(matches!(
            SidesOptions::from_node(&opts),
            Err(MeshError::InvalidOption(_))
        ));

        assert_eq!(SidesOptions::from_node(&Node::Empty).unwrap(), SidesOptions::default());
    }

    #[test]
    fn missing_named_field_is_reported() {
        let o = SidesOptions {
            field_prefix: String::new(),
            field_names: Some(vec!["ghost".into()]),
        };
        let mut fields = Node::object();
        fields.set_path("mass", field("element", false, vec![1.0f64].into()));
        assert_eq!(
            o.check_fields(&fields, "mesh"),
            Err(MeshError::FieldNotFound("ghost".into()))
        );

        let named = SidesOptions {
            field_prefix: String::new(),
            field_names: Some(vec!["mass".into()]),
        };
        assert_eq!(named.check_fields(&fields, "mesh"), Ok(()));
        assert_eq!(
            named.check_fields(&fields, "other"),
            Err(MeshError::FieldTopologyMismatch {
                field: "mass".into(),
                topology: "other".into(),
            })
        );
    }

    #[test]
    fn volume_dependent_values_split_by_area() {
        let (t, cs) = two_quads();
        let sides = SideDecomposition::build(&t, &cs).unwrap();
        let mut fields = Node::object();
        fields.set_path("mass", field("element", true, vec![8.0f64, 4.0].into()));
        fields.set_path("id", field("element", false, vec![7i32, 9].into()));
        let out = map_fields_to_sides(&sides, "mesh", &fields, &SidesOptions::default()).unwrap();

        let mass = out.floats("mass/values").unwrap();
        assert_eq!(mass.len(), 8);
        for (e, expected) in [(0usize, 8.0), (1, 4.0)] {
            let total: f64 = (0..8)
                .filter(|&s| sides.parents[s] == e)
                .map(|s| mass[s])
                .sum();
            assert_relative_eq!(total, expected, epsilon = 1e-12);
        }
        assert_eq!(out.string("mass/volume_dependent").unwrap(), "true");
        let volume = out.floats("volume/values").unwrap();
        assert_relative_eq!(volume.iter().sum::<f64>(), 3.0, epsilon = 1e-12);

        let id = out.array("id/values").unwrap();
        assert_eq!(id.dtype(), DataType::Int32);
        assert_eq!(id.to_indices().unwrap(), vec![7, 7, 7, 7, 9, 9, 9, 9]);
        assert_eq!(
            out.indices("original_element_ids/values").unwrap(),
            vec![0, 0, 0, 0, 1, 1, 1, 1]
        );
        assert_eq!(
            out.array("original_vertex_ids/values").unwrap().to_i64_vec().unwrap(),
            vec![0, 1, 2, 3, 4, 5, -1, -1]
        );
    }

    #[test]
    fn vertex_values_average_into_centroids() {
        let (t, cs) = two_quads();
        let sides = SideDecomposition::build(&t, &cs).unwrap();
        let mut fields = Node::object();
        fields.set_path(
            "temp",
            field("vertex", false, vec![0i32, 4, 8, 0, 4, 8].into()),
        );
        let opts = SidesOptions {
            field_prefix: "s_".into(),
            field_names: None,
        };
        let out = map_fields_to_sides(&sides, "mesh", &fields, &opts).unwrap();
        let temp = out.floats("s_temp/values").unwrap();
        assert_eq!(out.array("s_temp/values").unwrap().dtype(), DataType::Float64);
        assert_eq!(&temp[..6], &[0.0, 4.0, 8.0, 0.0, 4.0, 8.0]);
        assert_relative_eq!(temp[6], 2.0);
        assert_relative_eq!(temp[7], 6.0);
        assert!(out.has_path("s_original_element_ids"));
    }

    #[test]
    fn unsupported_fields_fail() {
        let (t, cs) = two_quads();
        let sides = SideDecomposition::build(&t, &cs).unwrap();

        let mut fields = Node::object();
        fields.set_path("f", field("face", false, vec![1.0f64, 2.0].into()));
        assert!(matches!(
            map_fields_to_sides(&sides, "mesh", &fields, &SidesOptions::default()),
            Err(MeshError::UnsupportedAssociation(_))
        ));

        let mut fields = Node::object();
        fields.set_path("f", field("vertex", true, vec![1.0f64; 6].into()));
        assert!(matches!(
            map_fields_to_sides(&sides, "mesh", &fields, &SidesOptions::default()),
            Err(MeshError::UnsupportedAssociation(_))
        ));

        let mut fields = Node::object();
        let mut other = field("element", false, vec![1.0f64, 2.0].into());
        other.set_path("topology", "other");
        fields.set_path("f", other);
        // skipped when fields are not named explicitly
        let out = map_fields_to_sides(&sides, "mesh", &fields, &SidesOptions::default()).unwrap();
        assert!(!out.has_path("f"));
        let named = SidesOptions {
            field_prefix: String::new(),
            field_names: Some(vec!["f".into()]),
        };
        assert!(matches!(
            map_fields_to_sides(&sides, "mesh", &fields, &named),
            Err(MeshError::FieldTopologyMismatch { .. })
        ));
    }
}
