//! Geometry utilities for mesh-blueprint.
//!
//! This module provides the measure kernels (signed triangle area,
//! tetrahedron volume) used when remapping volume-dependent fields.

pub mod measure;
