//! Material set layout predicates.

use crate::data::Node;

/// Per-material volume fraction arrays (`volume_fractions` is an object).
pub fn is_multi_buffer(matset: &Node) -> bool {
    matset.fetch("volume_fractions").is_some_and(Node::is_object)
}

/// One flat volume fraction array shared by all materials.
pub fn is_uni_buffer(matset: &Node) -> bool {
    matset
        .fetch("volume_fractions")
        .is_some_and(|v| v.as_array().is_some())
}

/// Values are indexed by element (no `element_ids`).
pub fn is_element_dominant(matset: &Node) -> bool {
    !matset.has_path("element_ids")
}

/// Values are indexed per material through `element_ids`.
pub fn is_material_dominant(matset: &Node) -> bool {
    matset.has_path("element_ids")
}
