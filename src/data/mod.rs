//! Data module: typed leaf arrays, the hierarchical node container, and
//! one-to-many relations.

pub mod array;
pub mod dtype;
pub mod node;
pub mod o2m;

pub use array::{ArrayVisitor, Buffer, DataArray, Element};
pub use dtype::{
    DEFAULT_FLOAT_DTYPE, DEFAULT_INT_DTYPE, DataType, NumericClass, collect_arrays, widest_dtype,
    widest_float_dtype, widest_int_dtype,
};
pub use node::Node;
pub use o2m::{O2MRelation, offsets_from_sizes};
