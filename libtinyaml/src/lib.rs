//! tinyaml: a lightweight YAML codec.
//!
//! tinyaml reads and writes the practical subset of YAML used for
//! configuration and data interchange: scalars, block and flow collections,
//! comments, quoted and block scalars, and folded plain scalars. Anchors,
//! tags, directives and multi-document streams are rejected.
//!
//! # Pipeline
//!
//! Loading runs in two phases:
//!
//! 1. **Scanner**: converts source text into positioned tokens, unescaping
//!    quoted scalars and collecting block scalar bodies.
//!
//! 2. **Parser**: builds a node tree from the tokens with an explicit frame
//!    stack, typing plain scalars through the resolver.
//!
//! Dumping (phase 3) renders a node tree in block style. Native values cross
//! the boundary through serde: anything `Serialize` can be dumped and
//! anything `Deserialize` can be loaded.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! let scores: BTreeMap<String, Vec<i64>> = libtinyaml::loads("alice: [95, 87]\n").unwrap();
//! assert_eq!(scores["alice"], vec![95, 87]);
//!
//! let text = libtinyaml::dumps(&scores).unwrap();
//! assert_eq!(text, "alice:\n  - 95\n  - 87\n");
//! ```

mod convert;
mod document;
mod encode;
mod error;
mod node;
mod options;
mod parser;
mod resolver;
mod scanner;

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use convert::{from_node, to_node, NodeSerializer};
pub use document::Document;
pub use encode::encode;
pub use error::{Error, ErrorKind, Position, Result};
pub use node::{Node, NodeEntry, NodeIter, NodeKind};
pub use options::{DumpOptions, ParseOptions, DEFAULT_MAX_NESTING};
pub use parser::parse;
pub use resolver::resolve_plain;

/// Parse YAML text into a native value.
///
/// Empty input converts as null, so it loads into `Option::None` or `()`.
pub fn loads<T: DeserializeOwned>(text: &str) -> Result<T> {
    Document::loads(text)?.into_dict()
}

/// Read a stream to the end and parse it into a native value.
pub fn load<R: Read + ?Sized, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    Document::load(reader)?.into_dict()
}

/// Render a native value (or a [`Node`] or [`Document`]) as YAML text with
/// default options.
pub fn dumps<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    dumps_with(value, &DumpOptions::default())
}

/// Render a native value as YAML text.
pub fn dumps_with<T: Serialize + ?Sized>(value: &T, options: &DumpOptions) -> Result<String> {
    options.validate()?;
    let node = to_node(value)?;
    encode(&node, options)
}

/// Render a native value into a stream and flush it. The stream is not
/// closed.
pub fn dump<T: Serialize + ?Sized, W: Write + ?Sized>(
    value: &T,
    writer: &mut W,
    options: &DumpOptions,
) -> Result<()> {
    let text = dumps_with(value, options)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}
