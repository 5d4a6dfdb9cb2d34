//! Conversion between node trees and native Rust values.
//!
//! Any `Serialize` type becomes a [`Node`] and any node can be deserialized
//! into a `Deserialize` type. Native maps keep their iteration order; a
//! native value with no node representation (an integer beyond 64 bits) and
//! a node that does not fit the requested type are conversion errors.

mod de;
mod ser;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::node::Node;

pub use ser::NodeSerializer;

/// Convert a native value into a node tree.
pub fn to_node<T: Serialize + ?Sized>(value: &T) -> Result<Node> {
    value.serialize(NodeSerializer)
}

/// Convert a node tree into a native value.
pub fn from_node<T: DeserializeOwned>(node: Node) -> Result<T> {
    T::deserialize(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Server {
        name: String,
        port: u16,
        tags: Vec<String>,
        ratio: Option<f64>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Point(i64, i64),
        Rect { w: i64, h: i64 },
    }

    #[test]
    fn test_struct_to_node_keeps_field_order() {
        let server = Server {
            name: "web".into(),
            port: 8080,
            tags: vec!["a".into()],
            ratio: None,
        };
        let node = to_node(&server).unwrap();
        let keys: Vec<&str> = node
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, ["name", "port", "tags", "ratio"]);
        assert_eq!(node["port"], Node::Int(8080));
        assert_eq!(node["ratio"], Node::Null);
        assert_eq!(from_node::<Server>(node).unwrap(), server);
    }

    #[test]
    fn test_enum_forms() {
        for shape in [
            Shape::Empty,
            Shape::Circle(1.5),
            Shape::Point(1, -2),
            Shape::Rect { w: 3, h: 4 },
        ] {
            let node = to_node(&shape).unwrap();
            assert_eq!(from_node::<Shape>(node).unwrap(), shape);
        }
        assert_eq!(to_node(&Shape::Empty).unwrap(), Node::from("Empty"));
        let circle = to_node(&Shape::Circle(2.0)).unwrap();
        assert_eq!(circle["Circle"], Node::Float(2.0));
    }

    #[test]
    fn test_u64_out_of_range() {
        let err = to_node(&u64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.message().contains("no node representation"));
        assert_eq!(to_node(&42u64).unwrap(), Node::Int(42));
        assert!(to_node(&(i128::MAX)).is_err());
    }

    #[test]
    fn test_scalar_keys_read_as_strings() {
        let node = Node::Mapping(vec![
            (Node::Int(1), Node::from("one")),
            (Node::Bool(true), Node::from("yes")),
            (Node::Null, Node::from("nothing")),
        ]);
        let map: HashMap<String, String> = from_node(node).unwrap();
        assert_eq!(map["1"], "one");
        assert_eq!(map["true"], "yes");
        assert_eq!(map["null"], "nothing");
    }

    #[test]
    fn test_integer_keys_stay_integers() {
        let node = Node::Mapping(vec![(Node::Int(7), Node::Bool(false))]);
        let map: BTreeMap<i64, bool> = from_node(node).unwrap();
        assert_eq!(map[&7], false);
    }

    #[test]
    fn test_type_mismatch_is_conversion_error() {
        let err = from_node::<Server>(Node::from("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        let err = from_node::<u8>(Node::Int(300)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        let err = from_node::<(i64, i64)>(Node::Sequence(vec![Node::Int(1)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn test_node_roundtrip_through_serde_json() {
        let node = Node::Mapping(vec![
            (Node::from("list"), Node::Sequence(vec![Node::Int(1), Node::Float(2.5)])),
            (Node::from("flag"), Node::Bool(true)),
            (Node::from("none"), Node::Null),
        ]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"list":[1,2.5],"flag":true,"none":null}"#);
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_node_deserializes_into_node() {
        let node = Node::Sequence(vec![Node::from("x"), Node::mapping()]);
        assert_eq!(from_node::<Node>(node.clone()).unwrap(), node);
    }
}
