//! Leaf element types and widest-type inference.
//!
//! Derived outputs choose their integer and floating element types from the
//! inputs they were derived from: the widest type among an explicit list of
//! candidate arrays, or a fixed default when no candidate of the requested
//! class exists.

use core::fmt;
use std::str::FromStr;

use crate::data::array::DataArray;
use crate::data::node::Node;
use crate::mesh_error::MeshError;

/// Element type of a numeric leaf array.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

/// Integer type used when a source carries no integer hint.
pub const DEFAULT_INT_DTYPE: DataType = DataType::Int64;
/// Floating type used when a source carries no floating hint.
pub const DEFAULT_FLOAT_DTYPE: DataType = DataType::Float64;

/// Broad numeric class used by [`widest_dtype`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumericClass {
    Integer,
    Float,
}

impl DataType {
    /// Canonical lowercase name (`int32`, `float64`, ...).
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    /// Size of one element in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, DataType::UInt32 | DataType::UInt64)
    }

    pub fn class(self) -> NumericClass {
        if self.is_float() {
            NumericClass::Float
        } else {
            NumericClass::Integer
        }
    }

    fn signed_of_width(bytes: usize) -> DataType {
        if bytes <= 4 {
            DataType::Int32
        } else {
            DataType::Int64
        }
    }

    fn unsigned_of_width(bytes: usize) -> DataType {
        if bytes <= 4 {
            DataType::UInt32
        } else {
            DataType::UInt64
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int32" => Ok(DataType::Int32),
            "int64" => Ok(DataType::Int64),
            "uint32" => Ok(DataType::UInt32),
            "uint64" => Ok(DataType::UInt64),
            "float32" => Ok(DataType::Float32),
            "float64" => Ok(DataType::Float64),
            other => Err(MeshError::UnsupportedType {
                context: "data type name".to_string(),
                dtype: other.to_string(),
            }),
        }
    }
}

/// Pick the widest type of `class` among `candidates`, or `default` if none match.
///
/// Integers: any signed candidate makes the result signed, and an unsigned
/// candidate at least as wide as the widest signed one bumps the width one
/// step (capped at 64 bits).
pub fn widest_dtype<'a, I>(candidates: I, class: NumericClass, default: DataType) -> DataType
where
    I: IntoIterator<Item = &'a DataArray>,
{
    let mut widest_signed = 0usize;
    let mut widest_unsigned = 0usize;
    let mut widest_float = 0usize;
    for dtype in candidates.into_iter().map(DataArray::dtype) {
        if dtype.class() != class {
            continue;
        }
        let slot = match dtype {
            DataType::Float32 | DataType::Float64 => &mut widest_float,
            DataType::Int32 | DataType::Int64 => &mut widest_signed,
            DataType::UInt32 | DataType::UInt64 => &mut widest_unsigned,
        };
        *slot = (*slot).max(dtype.byte_size());
    }

    match class {
        NumericClass::Float => match widest_float {
            0 => default,
            4 => DataType::Float32,
            _ => DataType::Float64,
        },
        NumericClass::Integer => match (widest_signed, widest_unsigned) {
            (0, 0) => default,
            (0, u) => DataType::unsigned_of_width(u),
            (s, 0) => DataType::signed_of_width(s),
            (s, u) if u >= s => DataType::signed_of_width((u * 2).min(8)),
            (s, _) => DataType::signed_of_width(s),
        },
    }
}

/// Every numeric leaf array in the subtree rooted at `node`, depth first.
pub fn collect_arrays(node: &Node) -> Vec<&DataArray> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        match n {
            Node::Array(a) => out.push(a),
            Node::Object(children) => stack.extend(children.values().rev()),
            Node::List(children) => stack.extend(children.iter().rev()),
            Node::Empty | Node::String(_) => {}
        }
    }
    out
}

/// Widest integer type over the numeric leaves of all `nodes`.
pub fn widest_int_dtype(nodes: &[&Node]) -> DataType {
    let arrays: Vec<&DataArray> = nodes.iter().flat_map(|n| collect_arrays(n)).collect();
    widest_dtype(arrays, NumericClass::Integer, DEFAULT_INT_DTYPE)
}

/// Widest floating type over the numeric leaves of all `nodes`.
pub fn widest_float_dtype(nodes: &[&Node]) -> DataType {
    let arrays: Vec<&DataArray> = nodes.iter().flat_map(|n| collect_arrays(n)).collect();
    widest_dtype(arrays, NumericClass::Float, DEFAULT_FLOAT_DTYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arr(dtype: DataType) -> DataArray {
        DataArray::zeros(dtype, 1)
    }

    #[test]
    fn default_when_no_candidate_of_class() {
        let floats = [arr(DataType::Float32)];
        assert_eq!(
            widest_dtype(&floats, NumericClass::Integer, DataType::Int32),
            DataType::Int32
        );
        assert_eq!(
            widest_dtype(&[], NumericClass::Float, DEFAULT_FLOAT_DTYPE),
            DataType::Float64
        );
    }

    #[test]
    fn mixed_signedness_widens() {
        let c = [arr(DataType::Int32), arr(DataType::UInt32)];
        assert_eq!(
            widest_dtype(&c, NumericClass::Integer, DEFAULT_INT_DTYPE),
            DataType::Int64
        );
        let c = [arr(DataType::Int64), arr(DataType::UInt32)];
        assert_eq!(
            widest_dtype(&c, NumericClass::Integer, DEFAULT_INT_DTYPE),
            DataType::Int64
        );
        let c = [arr(DataType::UInt32), arr(DataType::UInt64)];
        assert_eq!(
            widest_dtype(&c, NumericClass::Integer, DEFAULT_INT_DTYPE),
            DataType::UInt64
        );
    }

    #[test]
    fn collects_nested_leaves() {
        let mut n = Node::default();
        n.set_path("a/b", vec![1i32, 2]);
        n.set_path("a/c", vec![1.0f32]);
        n.set_path("d", "text");
        assert_eq!(collect_arrays(&n).len(), 2);
        assert_eq!(widest_int_dtype(&[&n]), DataType::Int32);
        assert_eq!(widest_float_dtype(&[&n]), DataType::Float32);
    }

    fn any_dtype() -> impl Strategy<Value = DataType> {
        prop_oneof![
            Just(DataType::Int32),
            Just(DataType::Int64),
            Just(DataType::UInt32),
            Just(DataType::UInt64),
            Just(DataType::Float32),
            Just(DataType::Float64),
        ]
    }

    proptest! {
        #[test]
        fn widest_never_narrower_than_any_candidate(dtypes in proptest::collection::vec(any_dtype(), 1..6)) {
            let arrays: Vec<DataArray> = dtypes.iter().map(|d| arr(*d)).collect();
            let ints = widest_dtype(&arrays, NumericClass::Integer, DEFAULT_INT_DTYPE);
            let floats = widest_dtype(&arrays, NumericClass::Float, DEFAULT_FLOAT_DTYPE);
            for d in dtypes {
                let out = if d.is_float() { floats } else { ints };
                prop_assert!(out.byte_size() >= d.byte_size());
                if d.is_signed() {
                    prop_assert!(out.is_signed());
                }
            }
        }
    }
}
