//! Coordinate sets: classification, sizing, and conversion between the
//! uniform, rectilinear, and explicit representations.
//!
//! Implicit point numbering runs with axis 0 fastest: point `(i, j, k)` of a
//! grid with per-axis point counts `(ni, nj, nk)` has id `i + ni * (j + nj * k)`.

use core::fmt;
use std::str::FromStr;

use crate::data::{DataArray, DataType, Node, widest_float_dtype};
use crate::mesh_error::MeshError;
use crate::topology::grid::grid_id_to_ijk;

/// Logical axis names used by `dims` children of uniform coordsets and
/// structured topologies.
pub const LOGICAL_AXES: [&str; 3] = ["i", "j", "k"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoordsetType {
    Uniform,
    Rectilinear,
    Explicit,
}

impl CoordsetType {
    pub fn name(self) -> &'static str {
        match self {
            CoordsetType::Uniform => "uniform",
            CoordsetType::Rectilinear => "rectilinear",
            CoordsetType::Explicit => "explicit",
        }
    }
}

impl fmt::Display for CoordsetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordsetType {
    type Err = MeshError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(CoordsetType::Uniform),
            "rectilinear" => Ok(CoordsetType::Rectilinear),
            "explicit" => Ok(CoordsetType::Explicit),
            other => Err(MeshError::UnknownCoordsetType(other.to_string())),
        }
    }
}

/// Coordinate system implied by a coordset's axis names.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoordSystem {
    Cartesian,
    Cylindrical,
    Spherical,
}

impl CoordSystem {
    pub fn axes(self) -> &'static [&'static str] {
        match self {
            CoordSystem::Cartesian => &["x", "y", "z"],
            CoordSystem::Cylindrical => &["r", "z"],
            CoordSystem::Spherical => &["r", "theta", "phi"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoordSystem::Cartesian => "cartesian",
            CoordSystem::Cylindrical => "cylindrical",
            CoordSystem::Spherical => "spherical",
        }
    }
}

impl FromStr for CoordSystem {
    type Err = MeshError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cartesian" => Ok(CoordSystem::Cartesian),
            "cylindrical" => Ok(CoordSystem::Cylindrical),
            "spherical" => Ok(CoordSystem::Spherical),
            other => Err(MeshError::UnknownCoordSystem(other.to_string())),
        }
    }
}

pub fn coordset_type(coordset: &Node) -> Result<CoordsetType, MeshError> {
    coordset.string("type")?.parse()
}

/// Axis names of `coordset`, in storage order.
pub fn axes(coordset: &Node) -> Result<Vec<String>, MeshError> {
    let names: Vec<String> = match coordset_type(coordset)? {
        CoordsetType::Uniform => {
            let ndims = uniform_point_dims(coordset)?.len();
            if let Some(origin) = coordset.fetch("origin").filter(|o| o.is_object()) {
                origin.child_names().into_iter().map(str::to_string).collect()
            } else if let Some(spacing) = coordset.fetch("spacing").filter(|o| o.is_object()) {
                spacing
                    .child_names()
                    .into_iter()
                    .map(|n| n.strip_prefix('d').unwrap_or(n).to_string())
                    .collect()
            } else {
                CoordSystem::Cartesian.axes()[..ndims.min(3)]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }
        }
        CoordsetType::Rectilinear | CoordsetType::Explicit => coordset
            .child("values")?
            .child_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    if names.is_empty() || names.len() > 3 {
        return Err(MeshError::InvalidGeometry(format!(
            "coordset has {} axes, expected 1 to 3",
            names.len()
        )));
    }
    Ok(names)
}

/// Coordinate system whose axis names match `coordset`'s axes.
pub fn coord_system(coordset: &Node) -> Result<CoordSystem, MeshError> {
    let names = axes(coordset)?;
    [
        CoordSystem::Cartesian,
        CoordSystem::Cylindrical,
        CoordSystem::Spherical,
    ]
    .into_iter()
    .find(|sys| names.iter().all(|n| sys.axes().contains(&n.as_str())))
    .ok_or_else(|| MeshError::UnknownCoordSystem(names.join(",")))
}

/// Number of spatial axes.
pub fn dims(coordset: &Node) -> Result<usize, MeshError> {
    Ok(axes(coordset)?.len())
}

fn uniform_point_dims(coordset: &Node) -> Result<Vec<usize>, MeshError> {
    let dims = coordset.child("dims")?;
    let mut out = Vec::new();
    for axis in LOGICAL_AXES {
        match dims.fetch(axis) {
            Some(n) => out.push(
                n.as_i64()
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| MeshError::WrongNodeKind {
                        path: format!("dims/{axis}"),
                        expected: "a non-negative integer",
                    })?,
            ),
            None => break,
        }
    }
    Ok(out)
}

/// Per-axis point counts of an implicit (uniform or rectilinear) coordset.
/// Explicit coordsets report a single entry, their point count.
pub fn point_dims(coordset: &Node) -> Result<Vec<usize>, MeshError> {
    match coordset_type(coordset)? {
        CoordsetType::Uniform => uniform_point_dims(coordset),
        CoordsetType::Rectilinear => axes(coordset)?
            .iter()
            .map(|a| Ok(coordset.array(&format!("values/{a}"))?.len()))
            .collect(),
        CoordsetType::Explicit => Ok(vec![length(coordset)?]),
    }
}

/// Number of points.
pub fn length(coordset: &Node) -> Result<usize, MeshError> {
    match coordset_type(coordset)? {
        CoordsetType::Uniform | CoordsetType::Rectilinear => {
            Ok(point_dims(coordset)?.iter().product())
        }
        CoordsetType::Explicit => {
            let names = axes(coordset)?;
            let first = coordset.array(&format!("values/{}", names[0]))?.len();
            for a in &names[1..] {
                let len = coordset.array(&format!("values/{a}"))?.len();
                if len != first {
                    return Err(MeshError::InvalidGeometry(format!(
                        "explicit axis `{a}` has {len} values, expected {first}"
                    )));
                }
            }
            Ok(first)
        }
    }
}

/// Per-axis coordinate lines of an implicit coordset.
fn axis_lines(coordset: &Node) -> Result<Vec<Vec<f64>>, MeshError> {
    let names = axes(coordset)?;
    match coordset_type(coordset)? {
        CoordsetType::Uniform => {
            let dims = uniform_point_dims(coordset)?;
            if dims.len() != names.len() {
                return Err(MeshError::InvalidGeometry(format!(
                    "uniform coordset has {} dims but {} axes",
                    dims.len(),
                    names.len()
                )));
            }
            names
                .iter()
                .zip(&dims)
                .map(|(axis, &n)| {
                    let origin = coordset
                        .fetch(&format!("origin/{axis}"))
                        .and_then(Node::as_f64)
                        .unwrap_or(0.0);
                    let spacing = coordset
                        .fetch(&format!("spacing/d{axis}"))
                        .and_then(Node::as_f64)
                        .unwrap_or(1.0);
                    Ok((0..n).map(|i| origin + i as f64 * spacing).collect())
                })
                .collect()
        }
        CoordsetType::Rectilinear => names
            .iter()
            .map(|a| coordset.floats(&format!("values/{a}")))
            .collect(),
        CoordsetType::Explicit => Err(MeshError::UnsupportedOperation(
            "explicit coordsets have no per-axis coordinate lines".into(),
        )),
    }
}

/// Uniform to rectilinear. A rectilinear input is returned unchanged.
pub fn to_rectilinear(coordset: &Node) -> Result<Node, MeshError> {
    match coordset_type(coordset)? {
        CoordsetType::Rectilinear => Ok(coordset.clone()),
        CoordsetType::Explicit => Err(MeshError::UnsupportedOperation(
            "explicit coordset cannot become rectilinear".into(),
        )),
        CoordsetType::Uniform => {
            let float_dtype = widest_float_dtype(&[coordset]);
            let mut dest = Node::object();
            dest.set_path("type", CoordsetType::Rectilinear.name());
            for (axis, line) in axes(coordset)?.iter().zip(axis_lines(coordset)?) {
                dest.set_path(
                    &format!("values/{axis}"),
                    DataArray::from_values(float_dtype, &line)?,
                );
            }
            Ok(dest)
        }
    }
}

/// Uniform or rectilinear to explicit, materializing every grid point with
/// axis 0 varying fastest. An explicit input is returned unchanged.
pub fn to_explicit(coordset: &Node) -> Result<Node, MeshError> {
    if coordset_type(coordset)? == CoordsetType::Explicit {
        return Ok(coordset.clone());
    }
    let float_dtype = widest_float_dtype(&[coordset]);
    let names = axes(coordset)?;
    let lines = axis_lines(coordset)?;
    let dims: Vec<usize> = lines.iter().map(Vec::len).collect();
    let npts: usize = dims.iter().product();

    let mut values = vec![Vec::with_capacity(npts); names.len()];
    let mut ijk = [0usize; 3];
    for p in 0..npts {
        grid_id_to_ijk(p, &dims, &mut ijk);
        for (d, axis_values) in values.iter_mut().enumerate() {
            axis_values.push(lines[d][ijk[d]]);
        }
    }

    let mut dest = Node::object();
    dest.set_path("type", CoordsetType::Explicit.name());
    for (axis, v) in names.iter().zip(values) {
        dest.set_path(
            &format!("values/{axis}"),
            DataArray::from_values(float_dtype, &v)?,
        );
    }
    log::debug!("expanded coordset to {npts} explicit points");
    Ok(dest)
}

/// Convert `coordset` to `target`; only widening conversions exist.
pub fn convert_coordset(coordset: &Node, target: CoordsetType) -> Result<Node, MeshError> {
    let source = coordset_type(coordset)?;
    match (source, target) {
        (s, t) if s == t => Ok(coordset.clone()),
        (CoordsetType::Uniform, CoordsetType::Rectilinear) => to_rectilinear(coordset),
        (_, CoordsetType::Explicit) => to_explicit(coordset),
        (s, t) => Err(MeshError::UnsupportedOperation(format!(
            "coordset conversion {s} -> {t}"
        ))),
    }
}

/// Explicit point positions read as `f64`, one vector per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Coords {
    pub axes: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Coords {
    /// Read any coordset, expanding implicit ones.
    pub fn from_coordset(coordset: &Node) -> Result<Self, MeshError> {
        let explicit = to_explicit(coordset)?;
        let axes = axes(&explicit)?;
        let values = axes
            .iter()
            .map(|a| explicit.floats(&format!("values/{a}")))
            .collect::<Result<Vec<_>, _>>()?;
        let coords = Self { axes, values };
        if coords.values.iter().any(|v| v.len() != coords.len()) {
            return Err(MeshError::InvalidGeometry(
                "explicit axes differ in length".into(),
            ));
        }
        Ok(coords)
    }

    pub fn with_axes(axes: Vec<String>) -> Self {
        let values = vec![Vec::new(); axes.len()];
        Self { axes, values }
    }

    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    pub fn len(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of point `i`, padded with zeros to three components.
    pub fn point(&self, i: usize) -> [f64; 3] {
        let mut p = [0.0; 3];
        for (d, axis) in self.values.iter().enumerate() {
            p[d] = axis[i];
        }
        p
    }

    pub fn push(&mut self, point: &[f64]) {
        for (axis, &v) in self.values.iter_mut().zip(point) {
            axis.push(v);
        }
    }

    /// Mean position of `points`.
    pub fn average(&self, points: &[usize]) -> Vec<f64> {
        let n = points.len().max(1) as f64;
        self.values
            .iter()
            .map(|axis| points.iter().map(|&p| axis[p]).sum::<f64>() / n)
            .collect()
    }

    /// Explicit coordset node with values of `dtype`.
    pub fn to_node(&self, dtype: DataType) -> Result<Node, MeshError> {
        let mut n = Node::object();
        n.set_path("type", CoordsetType::Explicit.name());
        for (axis, v) in self.axes.iter().zip(&self.values) {
            n.set_path(&format!("values/{axis}"), DataArray::from_values(dtype, v)?);
        }
        Ok(n)
    }
}
