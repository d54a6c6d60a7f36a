//! MeshError: Unified error type for mesh-blueprint public APIs
//!
//! Every fallible operation in the crate returns `Result<_, MeshError>`.
//! Derivations abort on the first error they detect and never hand back a
//! partially built topology.

use thiserror::Error;

/// Unified error type for mesh-blueprint operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// A required child was not present at the given path.
    #[error("missing child `{path}`")]
    MissingChild { path: String },
    /// A node exists but holds the wrong kind of data.
    #[error("node `{path}` is not {expected}")]
    WrongNodeKind { path: String, expected: &'static str },
    /// Coordset `type` is not one of uniform/rectilinear/explicit.
    #[error("unknown coordset type `{0}`")]
    UnknownCoordsetType(String),
    /// Topology `type` is not one of points/uniform/rectilinear/structured/unstructured.
    #[error("unknown topology type `{0}`")]
    UnknownTopologyType(String),
    /// Element shape name is not in the shape catalog.
    #[error("unknown element shape `{0}`")]
    UnknownShape(String),
    /// Coordinate system name is not cartesian/cylindrical/spherical.
    #[error("unknown coordinate system `{0}`")]
    UnknownCoordSystem(String),
    /// A string reference (e.g. `topology/coordset`) names a missing sibling.
    #[error("{kind} `{name}` referenced but not found")]
    MissingReference { kind: &'static str, name: String },
    /// A leaf array's element type is not supported by an operation.
    #[error("unsupported data type `{dtype}` for {context}")]
    UnsupportedType { context: String, dtype: String },
    /// An index (connectivity, face id, ...) is out of range.
    #[error("{context}: index {index} out of range for length {len}")]
    IndexOutOfRange {
        context: String,
        index: i64,
        len: usize,
    },
    /// A value cannot be represented by the requested element type.
    #[error("value {value} cannot be represented as {dtype}")]
    LossyConversion { value: String, dtype: &'static str },
    /// The input is valid data but the operation does not apply to it.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// Malformed generator options.
    #[error("invalid option: {0}")]
    InvalidOption(String),
    /// An explicitly requested field is absent from the source fields.
    #[error("field `{0}` not found in source fields")]
    FieldNotFound(String),
    /// An explicitly requested field is defined on another topology.
    #[error("field `{field}` does not use topology `{topology}`")]
    FieldTopologyMismatch { field: String, topology: String },
    /// Field association not supported by the remapping.
    #[error("unsupported field association: {0}")]
    UnsupportedAssociation(String),
    /// Structural inconsistency in mesh data.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl MeshError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        MeshError::MissingChild { path: path.into() }
    }

    pub(crate) fn out_of_range(context: impl Into<String>, index: usize, len: usize) -> Self {
        MeshError::IndexOutOfRange {
            context: context.into(),
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len,
        }
    }
}
