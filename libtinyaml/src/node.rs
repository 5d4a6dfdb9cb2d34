//! Node tree representation.
//!
//! A [`Node`] is a tagged value. Collections own their children exclusively;
//! mapping entries and sequence elements keep insertion order.

use crate::error::{Error, Result};
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::slice;

static NULL: Node = Node::Null;

/// A YAML value.
#[derive(Clone, PartialEq, Default)]
pub enum Node {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating-point number, including NaN and the infinities.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    Sequence(Vec<Node>),
    /// Ordered list of key/value pairs.
    Mapping(Vec<(Node, Node)>),
}

/// The variant of a [`Node`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::String => "string",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

impl Node {
    /// An empty sequence.
    pub fn sequence() -> Self {
        Node::Sequence(Vec::new())
    }

    /// An empty mapping.
    pub fn mapping() -> Self {
        Node::Mapping(Vec::new())
    }

    /// The variant of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Bool(_) => NodeKind::Bool,
            Node::Int(_) => NodeKind::Int,
            Node::Float(_) => NodeKind::Float,
            Node::String(_) => NodeKind::String,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Mapping(_) => NodeKind::Mapping,
        }
    }

    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Node::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Node::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Node::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Node::String(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    /// Returns `true` for every variant other than sequence and mapping.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Sequence(_) | Node::Mapping(_))
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric value of an `Int` or `Float` as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(f) => Some(*f),
            Node::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Vec<(Node, Node)>> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Number of children of a collection; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Node::Sequence(items) => items.len(),
            Node::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    /// Returns `true` for scalars and empty collections.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a mapping value by string key. When several entries share the
    /// key the last one wins.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .rev()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Look up a mapping value by an arbitrary key node.
    pub fn get_node(&self, key: &Node) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .rev()
            .find(|(k, _)| same_key(k, key))
            .map(|(_, v)| v)
    }

    /// Element of a sequence by position.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        self.as_sequence()?.get(index)
    }

    /// Append an element to a sequence. A null node becomes a sequence first.
    pub fn push(&mut self, value: impl Into<Node>) -> Result<()> {
        if self.is_null() {
            *self = Node::sequence();
        }
        match self {
            Node::Sequence(items) => {
                items.push(value.into());
                Ok(())
            }
            other => Err(Error::conversion(format!(
                "cannot append to a {}",
                other.kind()
            ))),
        }
    }

    /// Nesting depth: zero for scalars, one more than the deepest child (keys
    /// included) for collections.
    pub fn depth(&self) -> usize {
        match self {
            Node::Sequence(items) => 1 + items.iter().map(Node::depth).max().unwrap_or(0),
            Node::Mapping(entries) => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.depth().max(v.depth()))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Insert a mapping entry, replacing the value of an existing equal key in
    /// place. Returns the replaced value. A null node becomes a mapping first.
    ///
    /// Each call scans the existing entries; build large mappings with
    /// `Node::Mapping` or through serde instead.
    pub fn insert(&mut self, key: impl Into<Node>, value: impl Into<Node>) -> Result<Option<Node>> {
        if self.is_null() {
            *self = Node::mapping();
        }
        match self {
            Node::Mapping(entries) => Ok(insert_entry(entries, key.into(), value.into())),
            other => Err(Error::conversion(format!(
                "cannot insert a key into a {}",
                other.kind()
            ))),
        }
    }

    /// Iterate over the children of a collection. Scalars yield nothing.
    pub fn iter(&self) -> NodeIter<'_> {
        let inner = match self {
            Node::Sequence(items) => IterInner::Sequence(items.iter()),
            Node::Mapping(entries) => IterInner::Mapping(entries.iter()),
            _ => IterInner::Empty,
        };
        NodeIter { inner }
    }
}

/// Key equality used for duplicate detection: structural, with floats
/// compared by bit pattern so that NaN keys match each other.
fn same_key(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Float(x), Node::Float(y)) => x.to_bits() == y.to_bits(),
        (Node::Sequence(x), Node::Sequence(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| same_key(p, q))
        }
        (Node::Mapping(x), Node::Mapping(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|((pk, pv), (qk, qv))| same_key(pk, qk) && same_key(pv, qv))
        }
        _ => a == b,
    }
}

/// Last-write-wins insert: the first occurrence keeps its position.
fn insert_entry(entries: &mut Vec<(Node, Node)>, key: Node, value: Node) -> Option<Node> {
    match entries.iter_mut().find(|(k, _)| same_key(k, &key)) {
        Some((_, slot)) => Some(std::mem::replace(slot, value)),
        None => {
            entries.push((key, value));
            None
        }
    }
}

/// Hashable form of a key node. Two keys have equal forms exactly when
/// `same_key` holds for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyForm {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    Sequence(Vec<KeyForm>),
    Mapping(Vec<(KeyForm, KeyForm)>),
}

impl KeyForm {
    fn of(node: &Node) -> Self {
        match node {
            Node::Null => KeyForm::Null,
            Node::Bool(b) => KeyForm::Bool(*b),
            Node::Int(n) => KeyForm::Int(*n),
            Node::Float(f) => KeyForm::Float(f.to_bits()),
            Node::String(s) => KeyForm::String(s.clone()),
            Node::Sequence(items) => KeyForm::Sequence(items.iter().map(KeyForm::of).collect()),
            Node::Mapping(entries) => KeyForm::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (KeyForm::of(k), KeyForm::of(v)))
                    .collect(),
            ),
        }
    }
}

/// Side index from key to entry position for a mapping under construction,
/// so that each insert costs one hash lookup.
#[derive(Debug, Default)]
pub(crate) struct KeyIndex {
    slots: HashMap<KeyForm, usize>,
}

impl KeyIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
        }
    }

    /// Last-write-wins insert into `entries`, which must only ever be
    /// extended through this index. Returns the replaced value.
    pub(crate) fn insert(
        &mut self,
        entries: &mut Vec<(Node, Node)>,
        key: Node,
        value: Node,
    ) -> Option<Node> {
        match self.slots.entry(KeyForm::of(&key)) {
            Entry::Occupied(slot) => {
                Some(std::mem::replace(&mut entries[*slot.get()].1, value))
            }
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push((key, value));
                None
            }
        }
    }
}

/// One child yielded by [`NodeIter`]: a sequence element has no key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEntry<'a> {
    pub key: Option<&'a Node>,
    pub value: &'a Node,
}

/// Forward iterator over the children of a [`Node`].
#[derive(Clone, Debug)]
pub struct NodeIter<'a> {
    inner: IterInner<'a>,
}

#[derive(Clone, Debug)]
enum IterInner<'a> {
    Sequence(slice::Iter<'a, Node>),
    Mapping(slice::Iter<'a, (Node, Node)>),
    Empty,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Sequence(it) => it.next().map(|value| NodeEntry { key: None, value }),
            IterInner::Mapping(it) => it.next().map(|(k, v)| NodeEntry {
                key: Some(k),
                value: v,
            }),
            IterInner::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match &self.inner {
            IterInner::Sequence(it) => it.len(),
            IterInner::Mapping(it) => it.len(),
            IterInner::Empty => 0,
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for NodeIter<'_> {}

impl FusedIterator for NodeIter<'_> {}

impl<'a> IntoIterator for &'a Node {
    type Item = NodeEntry<'a>;
    type IntoIter = NodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Index<&str> for Node {
    type Output = Node;

    /// Missing keys and non-mappings index to `Null`.
    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Node {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        self.get_index(index).unwrap_or(&NULL)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "null"),
            Node::Bool(b) => write!(f, "{}", b),
            Node::Int(n) => write!(f, "{}", n),
            Node::Float(n) => {
                if n.is_nan() {
                    write!(f, ".nan")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, ".inf")
                    } else {
                        write!(f, "-.inf")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            Node::String(s) => write!(f, "{:?}", s),
            Node::Sequence(items) => f.debug_list().entries(items).finish(),
            Node::Mapping(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
        }
    }
}

impl From<()> for Node {
    fn from(_: ()) -> Self {
        Node::Null
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Int(n)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Int(i64::from(n))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl From<Vec<(Node, Node)>> for Node {
    fn from(entries: Vec<(Node, Node)>) -> Self {
        Node::Mapping(entries)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Node::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::Mapping(vec![
            ("name".into(), "John".into()),
            ("scores".into(), vec![Node::Int(95), Node::Int(87)].into()),
        ])
    }

    #[test]
    fn test_get_and_index() {
        let node = sample();
        assert_eq!(node.get("name"), Some(&Node::from("John")));
        assert_eq!(node["scores"][1], Node::Int(87));
        assert!(node["missing"].is_null());
        assert!(node["scores"][7].is_null());
        assert!(node[0].is_null());
    }

    #[test]
    fn test_iter_mapping_and_sequence() {
        let node = sample();
        let keys: Vec<&str> = node.iter().filter_map(|e| e.key?.as_str()).collect();
        assert_eq!(keys, ["name", "scores"]);

        let scores: Vec<i64> = node["scores"]
            .iter()
            .map(|e| {
                assert!(e.key.is_none());
                e.value.as_i64().unwrap()
            })
            .collect();
        assert_eq!(scores, [95, 87]);
        assert_eq!(node["name"].iter().count(), 0);
    }

    #[test]
    fn test_iter_is_restartable() {
        let node = sample();
        assert_eq!(node.iter().len(), 2);
        assert_eq!(node.iter().len(), 2);
    }

    #[test]
    fn test_insert_last_write_wins_keeps_position() {
        let mut node = Node::Null;
        assert_eq!(node.insert("b", 1).unwrap(), None);
        assert_eq!(node.insert("a", 2).unwrap(), None);
        assert_eq!(node.insert("b", 3).unwrap(), Some(Node::Int(1)));
        let entries = node.as_mapping().unwrap();
        assert_eq!(entries[0], (Node::from("b"), Node::Int(3)));
        assert_eq!(entries[1], (Node::from("a"), Node::Int(2)));
    }

    #[test]
    fn test_insert_into_scalar_fails() {
        let mut node = Node::Int(1);
        assert!(node.insert("a", 1).is_err());
        assert!(node.push(1).is_err());
    }

    #[test]
    fn test_same_key_nan() {
        assert!(same_key(&Node::Float(f64::NAN), &Node::Float(f64::NAN)));
        assert!(!same_key(&Node::Int(1), &Node::Float(1.0)));
    }

    #[test]
    fn test_key_index_matches_same_key() {
        let mut entries = Vec::new();
        let mut index = KeyIndex::default();
        assert_eq!(index.insert(&mut entries, Node::Float(f64::NAN), 1.into()), None);
        assert_eq!(index.insert(&mut entries, Node::Float(0.0), 2.into()), None);
        assert_eq!(index.insert(&mut entries, Node::Float(-0.0), 3.into()), None);
        assert_eq!(index.insert(&mut entries, Node::Int(0), 4.into()), None);
        assert_eq!(
            index.insert(&mut entries, Node::Float(f64::NAN), 5.into()),
            Some(Node::Int(1))
        );
        let compound = Node::Sequence(vec!["a".into(), Node::Null]);
        assert_eq!(index.insert(&mut entries, compound.clone(), 6.into()), None);
        assert_eq!(index.insert(&mut entries, compound, 7.into()), Some(Node::Int(6)));

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].1, Node::Int(5));
        assert_eq!(entries[4].1, Node::Int(7));
        for (i, (a, _)) in entries.iter().enumerate() {
            for (j, (b, _)) in entries.iter().enumerate() {
                assert_eq!(same_key(a, b), i == j);
            }
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(Node::Int(1).depth(), 0);
        assert_eq!(Node::sequence().depth(), 1);
        let key = Node::Sequence(vec![Node::sequence()]);
        let node = Node::Mapping(vec![(key, Node::Null), ("b".into(), Node::mapping())]);
        assert_eq!(node.depth(), 3);
    }

    #[test]
    fn test_debug_format() {
        let node = Node::Sequence(vec![Node::Float(f64::NEG_INFINITY), Node::Null, "x".into()]);
        assert_eq!(format!("{:?}", node), "[-.inf, null, \"x\"]");
    }
}
