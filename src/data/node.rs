//! Hierarchical mesh data container.
//!
//! A [`Node`] is an object (named children, insertion ordered), a list, a
//! numeric leaf, or a string leaf. Paths separate names with `/`; list
//! children are addressed by their decimal index.

use indexmap::IndexMap;

use crate::data::array::{DataArray, Element};
use crate::mesh_error::MeshError;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    #[default]
    Empty,
    Object(IndexMap<String, Node>),
    List(Vec<Node>),
    Array(DataArray),
    String(String),
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl Node {
    pub fn object() -> Self {
        Node::Object(IndexMap::new())
    }

    /// Immutable lookup of a descendant.
    pub fn fetch(&self, path: &str) -> Option<&Node> {
        segments(path).try_fold(self, |node, seg| node.direct_child(seg))
    }

    /// Like [`fetch`](Self::fetch) but fails with [`MeshError::MissingChild`].
    pub fn child(&self, path: &str) -> Result<&Node, MeshError> {
        self.fetch(path).ok_or_else(|| MeshError::missing(path))
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.fetch(path).is_some()
    }

    fn direct_child(&self, seg: &str) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(seg),
            Node::List(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Mutable lookup of an existing descendant.
    pub fn fetch_existing_mut(&mut self, path: &str) -> Option<&mut Node> {
        let mut cur = self;
        for seg in segments(path) {
            cur = match cur {
                Node::Object(map) => map.get_mut(seg)?,
                Node::List(items) => items.get_mut(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Mutable lookup that creates missing descendants.
    ///
    /// Empty nodes and leaves on the way are replaced by objects; a list
    /// addressed past its end is padded with empty nodes.
    pub fn fetch_mut(&mut self, path: &str) -> &mut Node {
        segments(path).fold(self, |node, seg| node.child_or_insert(seg))
    }

    fn child_or_insert(&mut self, seg: &str) -> &mut Node {
        let list_index = match self {
            Node::List(_) => seg.parse::<usize>().ok(),
            _ => None,
        };
        if list_index.is_none() && !matches!(self, Node::Object(_)) {
            *self = Node::object();
        }
        match self {
            Node::List(items) => {
                let i = list_index.unwrap_or_default();
                if items.len() <= i {
                    items.resize_with(i + 1, Node::default);
                }
                &mut items[i]
            }
            Node::Object(map) => map.entry(seg.to_string()).or_default(),
            _ => unreachable!("promoted to object above"),
        }
    }

    /// Store `value` at `path`, creating parents as needed.
    pub fn set_path<V: Into<Node>>(&mut self, path: &str, value: V) {
        *self.fetch_mut(path) = value.into();
    }

    /// Merge `other` into `self`: objects merge child by child, lists merge
    /// by index and grow, any other source replaces the target. Empty
    /// sources leave the target untouched.
    pub fn update(&mut self, other: &Node) {
        match (self, other) {
            (_, Node::Empty) => {}
            (Node::Object(dest), Node::Object(src)) => {
                for (name, child) in src {
                    dest.entry(name.clone()).or_default().update(child);
                }
            }
            (Node::List(dest), Node::List(src)) => {
                if dest.len() < src.len() {
                    dest.resize_with(src.len(), Node::default);
                }
                for (d, s) in dest.iter_mut().zip(src) {
                    d.update(s);
                }
            }
            (dest, src) => *dest = src.clone(),
        }
    }

    /// Detach and return the descendant at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        let (parent, last) = match path.trim_end_matches('/').rsplit_once('/') {
            Some((parent, last)) => (parent, last),
            None => ("", path.trim_end_matches('/')),
        };
        match self.fetch_existing_mut(parent)? {
            Node::Object(map) => map.shift_remove(last),
            Node::List(items) => {
                let i = last.parse::<usize>().ok()?;
                (i < items.len()).then(|| items.remove(i))
            }
            _ => None,
        }
    }

    /// Push a new empty child onto a list (an empty node becomes a list).
    pub fn append(&mut self) -> &mut Node {
        if !matches!(self, Node::List(_)) {
            *self = Node::List(Vec::new());
        }
        match self {
            Node::List(items) => {
                items.push(Node::Empty);
                let last = items.len() - 1;
                &mut items[last]
            }
            _ => unreachable!("promoted to list above"),
        }
    }

    pub fn number_of_children(&self) -> usize {
        match self {
            Node::Object(map) => map.len(),
            Node::List(items) => items.len(),
            _ => 0,
        }
    }

    /// Children in order, for objects and lists alike.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Object(map) => map.values().collect(),
            Node::List(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Child names of an object; empty for every other kind.
    pub fn child_names(&self) -> Vec<&str> {
        match self {
            Node::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn child_at(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get_index(index).map(|(_, v)| v),
            Node::List(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// First element of a numeric leaf as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        let a = self.as_array()?;
        if !a.dtype().is_integer() || a.is_empty() {
            return None;
        }
        a.view(0, 1, 1).ok()?.to_i64_vec().ok()?.first().copied()
    }

    /// First element of a numeric leaf as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_array().and_then(|a| a.get_f64(0))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Numeric leaf at `path`.
    pub fn array(&self, path: &str) -> Result<&DataArray, MeshError> {
        self.child(path)?
            .as_array()
            .ok_or_else(|| MeshError::WrongNodeKind {
                path: path.to_string(),
                expected: "a numeric array",
            })
    }

    /// String leaf at `path`.
    pub fn string(&self, path: &str) -> Result<&str, MeshError> {
        self.child(path)?
            .as_str()
            .ok_or_else(|| MeshError::WrongNodeKind {
                path: path.to_string(),
                expected: "a string",
            })
    }

    /// Integer leaf at `path` read as indices.
    pub fn indices(&self, path: &str) -> Result<Vec<usize>, MeshError> {
        self.array(path)?.to_indices()
    }

    /// Numeric leaf at `path` widened to `f64`.
    pub fn floats(&self, path: &str) -> Result<Vec<f64>, MeshError> {
        Ok(self.array(path)?.to_f64_vec())
    }
}

impl From<DataArray> for Node {
    fn from(a: DataArray) -> Self {
        Node::Array(a)
    }
}

impl<T: Element> From<Vec<T>> for Node {
    fn from(values: Vec<T>) -> Self {
        Node::Array(values.into())
    }
}

macro_rules! scalar_into_node {
    ($($t:ty),*) => {
        $(impl From<$t> for Node {
            fn from(v: $t) -> Self {
                Node::Array(vec![v].into())
            }
        })*
    };
}

scalar_into_node!(i32, i64, u32, u64, f32, f64);

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}
