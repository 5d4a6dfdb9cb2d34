use serde::ser::{self, Serialize, SerializeMap as _, Serializer};

use crate::error::{Error, Result};
use crate::node::{KeyIndex, Node};

// ============================================================================
// Node -> any serializer
// ============================================================================

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Int(n) => serializer.serialize_i64(*n),
            Node::Float(f) => serializer.serialize_f64(*f),
            Node::String(s) => serializer.serialize_str(s),
            Node::Sequence(items) => serializer.collect_seq(items),
            Node::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

// ============================================================================
// Native value -> Node
// ============================================================================

/// Serializer producing a [`Node`] tree.
pub struct NodeSerializer;

fn out_of_range(value: impl std::fmt::Display) -> Error {
    Error::conversion(format!(
        "no node representation for integer {}: outside the 64-bit signed range",
        value
    ))
}

impl Serializer for NodeSerializer {
    type Ok = Node;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Node> {
        Ok(Node::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Node> {
        Ok(Node::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Node> {
        i64::try_from(v).map(Node::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Node> {
        Ok(Node::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Node> {
        i64::try_from(v).map(Node::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Node> {
        i64::try_from(v).map(Node::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Node> {
        Ok(Node::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Node> {
        Ok(Node::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Node> {
        Ok(Node::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node> {
        Ok(Node::String(v.to_string()))
    }

    // No binary scalar; bytes become a sequence of integers
    fn serialize_bytes(self, v: &[u8]) -> Result<Node> {
        Ok(Node::Sequence(v.iter().map(|&b| Node::Int(b.into())).collect()))
    }

    fn serialize_none(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Node> {
        Ok(Node::from(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node> {
        Ok(Node::Mapping(vec![(
            Node::from(variant),
            value.serialize(NodeSerializer)?,
        )]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        let len = len.unwrap_or(0);
        Ok(SerializeMap {
            entries: Vec::with_capacity(len),
            keys: KeyIndex::with_capacity(len),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            entries: Vec::with_capacity(len),
            keys: KeyIndex::with_capacity(len),
        })
    }
}

pub struct SerializeVec {
    items: Vec<Node>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Node>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(vec![(
            Node::from(self.variant),
            Node::Sequence(self.items),
        )]))
    }
}

pub struct SerializeMap {
    entries: Vec<(Node, Node)>,
    keys: KeyIndex,
    next_key: Option<Node>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Node;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.next_key = Some(key.serialize(NodeSerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::conversion("map value serialized before its key"))?;
        self.keys
            .insert(&mut self.entries, key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(self.entries))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.keys.insert(
            &mut self.entries,
            Node::from(key),
            value.serialize(NodeSerializer)?,
        );
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(self.entries))
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    entries: Vec<(Node, Node)>,
    keys: KeyIndex,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.keys.insert(
            &mut self.entries,
            Node::from(key),
            value.serialize(NodeSerializer)?,
        );
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(vec![(
            Node::from(self.variant),
            Node::Mapping(self.entries),
        )]))
    }
}
