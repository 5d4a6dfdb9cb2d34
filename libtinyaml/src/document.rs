//! Documents: a single owned root node, or nothing for empty input.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::convert::{from_node, to_node};
use crate::encode::encode;
use crate::error::{Error, Position, Result};
use crate::node::Node;
use crate::options::{DumpOptions, ParseOptions};
use crate::parser::parse;

/// A parsed or constructed YAML document.
///
/// A document owns its tree outright. Input with no content (blank, or only
/// comments and markers) yields an empty document with no root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Option<Node>,
}

impl Document {
    /// Wrap an existing node tree.
    pub fn new(root: Node) -> Self {
        Self { root: Some(root) }
    }

    /// A document with no content.
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// Parse YAML text with default options.
    pub fn loads(text: &str) -> Result<Self> {
        Self::loads_with(text, &ParseOptions::default())
    }

    /// Parse YAML text.
    pub fn loads_with(text: &str, options: &ParseOptions) -> Result<Self> {
        let root = parse(text, options)?;
        let kind = root
            .as_ref()
            .map_or_else(|| "empty".to_string(), |n| n.kind().to_string());
        debug!(
            len = text.len(),
            root = %kind,
            nodes = root.as_ref().map_or(0, node_count),
            "loaded document"
        );
        Ok(Self { root })
    }

    /// Parse UTF-8 bytes. Invalid UTF-8 is a scan error at the first bad byte.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            Error::scan(
                "invalid UTF-8 byte sequence",
                position_of(bytes, e.valid_up_to()),
            )
        })?;
        Self::loads(text)
    }

    /// Read a stream to the end and parse it. The stream is not closed.
    pub fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_slice(&bytes)
    }

    /// Build a document from any serializable native value.
    pub fn from_dict<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::new(to_node(value)?))
    }

    /// Convert the document into a native value. An empty document
    /// converts as null.
    pub fn to_dict<T: DeserializeOwned>(&self) -> Result<T> {
        from_node(self.root.clone().unwrap_or_default())
    }

    /// Consume the document, converting it into a native value.
    pub fn into_dict<T: DeserializeOwned>(self) -> Result<T> {
        from_node(self.root.unwrap_or_default())
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()
    }

    /// Replace the root, returning the previous one.
    pub fn set_root(&mut self, root: Node) -> Option<Node> {
        self.root.replace(root)
    }

    pub fn into_root(self) -> Option<Node> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Render the document as YAML text. An empty document renders as null.
    pub fn dumps(&self, options: &DumpOptions) -> Result<String> {
        match &self.root {
            Some(root) => encode(root, options),
            None => encode(&Node::Null, options),
        }
    }

    /// Render the document into a stream and flush it. The stream is not
    /// closed.
    pub fn dump<W: Write + ?Sized>(&self, writer: &mut W, options: &DumpOptions) -> Result<()> {
        let text = self.dumps(options)?;
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Self::new(root)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.root {
            Some(root) => root.serialize(serializer),
            None => serializer.serialize_unit(),
        }
    }
}

fn node_count(node: &Node) -> usize {
    match node {
        Node::Sequence(items) => 1 + items.iter().map(node_count).sum::<usize>(),
        Node::Mapping(entries) => {
            1 + entries
                .iter()
                .map(|(k, v)| node_count(k) + node_count(v))
                .sum::<usize>()
        }
        _ => 1,
    }
}

/// 1-based position of byte `offset`, counting characters in the valid
/// prefix before it.
fn position_of(bytes: &[u8], offset: usize) -> Position {
    let prefix = String::from_utf8_lossy(&bytes[..offset]);
    let line = prefix.matches('\n').count() + 1;
    let column = match prefix.rfind('\n') {
        Some(i) => prefix[i + 1..].chars().count() + 1,
        None => prefix.chars().count() + 1,
    };
    Position::new(line, column)
}
