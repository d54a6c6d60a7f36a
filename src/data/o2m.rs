//! One-to-many relations (`values` / `sizes` / `offsets`).

use crate::data::array::DataArray;
use crate::data::dtype::DataType;
use crate::data::node::Node;
use crate::mesh_error::MeshError;

/// Exclusive prefix sum of `sizes`.
pub fn offsets_from_sizes(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0usize, |acc, &s| {
            let start = *acc;
            *acc += s;
            Some(start)
        })
        .collect()
}

/// Maps each source entity `i` to `values[offsets[i]..offsets[i] + sizes[i]]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct O2MRelation {
    pub values: Vec<usize>,
    pub sizes: Vec<usize>,
    pub offsets: Vec<usize>,
}

impl O2MRelation {
    pub fn from_groups<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<[usize]>,
    {
        let mut rel = Self::default();
        for g in groups {
            rel.push_group(g.as_ref());
        }
        rel
    }

    /// Append one source entity's targets.
    pub fn push_group(&mut self, targets: &[usize]) {
        self.offsets.push(self.values.len());
        self.sizes.push(targets.len());
        self.values.extend_from_slice(targets);
    }

    /// Number of source entities.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Targets of source entity `i`.
    ///
    /// # Panics
    /// If `i >= self.len()`.
    pub fn group(&self, i: usize) -> &[usize] {
        &self.values[self.offsets[i]..self.offsets[i] + self.sizes[i]]
    }

    pub fn groups(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.len()).map(move |i| self.group(i))
    }

    /// Relation node with `values`, `sizes`, `offsets` of integer type `dtype`.
    pub fn to_node(&self, dtype: DataType) -> Result<Node, MeshError> {
        let mut n = Node::object();
        n.set_path("values", DataArray::from_values(dtype, &self.values)?);
        n.set_path("sizes", DataArray::from_values(dtype, &self.sizes)?);
        n.set_path("offsets", DataArray::from_values(dtype, &self.offsets)?);
        Ok(n)
    }

    /// Read a relation node; `offsets` are generated when absent.
    pub fn from_node(node: &Node) -> Result<Self, MeshError> {
        let values = node.indices("values")?;
        let sizes = node.indices("sizes")?;
        let offsets = match node.fetch("offsets") {
            Some(_) => node.indices("offsets")?,
            None => offsets_from_sizes(&sizes),
        };
        if offsets.len() != sizes.len() {
            return Err(MeshError::InvalidGeometry(format!(
                "relation has {} sizes but {} offsets",
                sizes.len(),
                offsets.len()
            )));
        }
        for (&o, &s) in offsets.iter().zip(&sizes) {
            if o.checked_add(s).is_none_or(|end| end > values.len()) {
                return Err(MeshError::out_of_range(
                    "relation span",
                    o.saturating_add(s),
                    values.len(),
                ));
            }
        }
        Ok(Self {
            values,
            sizes,
            offsets,
        })
    }
}

/// Add an `offsets` child to a relation node holding `sizes`, typed like `sizes`.
pub fn add_offsets(node: &mut Node) -> Result<(), MeshError> {
    let sizes_arr = node.array("sizes")?;
    let dtype = sizes_arr.dtype();
    let offsets = offsets_from_sizes(&sizes_arr.to_indices()?);
    node.set_path("offsets", DataArray::from_values(dtype, &offsets)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_round_trip_through_node() {
        let rel = O2MRelation::from_groups([vec![0, 1], vec![], vec![2, 3, 4]]);
        assert_eq!(rel.offsets, vec![0, 2, 2]);
        assert_eq!(rel.group(2), &[2, 3, 4]);
        let node = rel.to_node(DataType::Int32).unwrap();
        assert_eq!(node.array("values").unwrap().dtype(), DataType::Int32);
        assert_eq!(O2MRelation::from_node(&node).unwrap(), rel);
    }

    #[test]
    fn missing_offsets_are_generated() {
        let mut n = Node::object();
        n.set_path("values", vec![5u32, 6, 7]);
        n.set_path("sizes", vec![1u32, 2]);
        let rel = O2MRelation::from_node(&n).unwrap();
        assert_eq!(rel.offsets, vec![0, 1]);
        add_offsets(&mut n).unwrap();
        assert_eq!(
            n.array("offsets").unwrap(),
            &DataArray::from(vec![0u32, 1])
        );
    }

    #[test]
    fn span_past_values_is_rejected() {
        let mut n = Node::object();
        n.set_path("values", vec![0i64]);
        n.set_path("sizes", vec![2i64]);
        assert!(matches!(
            O2MRelation::from_node(&n),
            Err(MeshError::IndexOutOfRange { .. })
        ));
    }
}
