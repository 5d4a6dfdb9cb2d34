//! Phase 3: Writer
//!
//! Renders a node tree as block-style YAML text. Mappings are written one
//! `key: value` line per entry and sequences one `- value` line per element;
//! nested collections are indented by the configured width. Scalars are
//! written so that reading them back yields the same node: strings that the
//! resolver would type differently, or that contain indicators, are quoted.
//!
//! Trees nested deeper than the parser's default limit are refused, so every
//! document the writer produces loads back with default options.

use tracing::debug;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::options::{DumpOptions, DEFAULT_MAX_NESTING};
use crate::resolver::resolves_to_string;

/// Encode a node tree to YAML text.
pub fn encode(node: &Node, options: &DumpOptions) -> Result<String> {
    options.validate()?;
    let depth = node.depth();
    if depth > DEFAULT_MAX_NESTING {
        return Err(Error::conversion(format!(
            "node tree is nested {} levels deep, the limit is {}",
            depth, DEFAULT_MAX_NESTING
        )));
    }
    let writer = Writer {
        indent: options.indent,
    };
    let mut out = String::new();
    writer.write_root(node, &mut out);
    if !options.final_newline {
        while out.ends_with('\n') {
            out.pop();
        }
    }
    debug!(
        indent = options.indent,
        final_newline = options.final_newline,
        len = out.len(),
        "encoded document"
    );
    Ok(out)
}

struct Writer {
    indent: usize,
}

impl Writer {
    fn write_root(&self, node: &Node, out: &mut String) {
        if is_block(node) {
            self.write_block(node, 0, false, out);
        } else {
            out.push_str(&encode_inline(node));
            out.push('\n');
        }
    }

    /// Write a non-empty collection whose entries start at `column`. With
    /// `inline_first` the first entry continues a line opened by a `-`.
    fn write_block(&self, node: &Node, column: usize, inline_first: bool, out: &mut String) {
        match node {
            Node::Sequence(items) => self.write_sequence(items, column, inline_first, out),
            Node::Mapping(entries) => self.write_mapping(entries, column, inline_first, out),
            _ => {}
        }
    }

    fn write_sequence(&self, items: &[Node], column: usize, inline_first: bool, out: &mut String) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                pad(out, column);
            }
            out.push('-');
            if is_block(item) {
                // Nested collection: first entry on the dash line
                if self.indent >= 2 {
                    pad(out, self.indent - 1);
                    self.write_block(item, column + self.indent, true, out);
                } else {
                    out.push('\n');
                    self.write_block(item, column + self.indent, false, out);
                }
            } else {
                out.push(' ');
                out.push_str(&encode_inline(item));
                out.push('\n');
            }
        }
    }

    fn write_mapping(
        &self,
        entries: &[(Node, Node)],
        column: usize,
        inline_first: bool,
        out: &mut String,
    ) {
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 || !inline_first {
                pad(out, column);
            }
            out.push_str(&encode_inline(key));
            out.push(':');
            if is_block(value) {
                out.push('\n');
                self.write_block(value, column + self.indent, false, out);
            } else {
                out.push(' ');
                out.push_str(&encode_inline(value));
                out.push('\n');
            }
        }
    }
}

fn pad(out: &mut String, width: usize) {
    out.extend(std::iter::repeat(' ').take(width));
}

/// Non-empty collections are written in block style.
fn is_block(node: &Node) -> bool {
    match node {
        Node::Sequence(items) => !items.is_empty(),
        Node::Mapping(entries) => !entries.is_empty(),
        _ => false,
    }
}

/// Single-line rendering: scalars, and flow style for collections (used for
/// empty collections and non-scalar mapping keys).
fn encode_inline(node: &Node) -> String {
    match node {
        Node::Null => "null".to_string(),
        Node::Bool(b) => b.to_string(),
        Node::Int(n) => n.to_string(),
        Node::Float(f) => encode_float(*f),
        Node::String(s) => encode_string(s),
        Node::Sequence(items) => {
            let items: Vec<String> = items.iter().map(encode_inline).collect();
            format!("[{}]", items.join(", "))
        }
        Node::Mapping(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", encode_inline(k), encode_inline(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

pub(crate) fn encode_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else {
        // Debug gives the shortest representation that reads back exactly
        let s = format!("{:?}", f);
        if s.contains(['.', 'e', 'E']) {
            s
        } else {
            format!("{}.0", s)
        }
    }
}

fn encode_string(s: &str) -> String {
    if is_plain_safe(s) {
        s.to_string()
    } else if s.chars().any(needs_escape) {
        encode_double_quoted(s)
    } else {
        format!("'{}'", s.replace('\'', "''"))
    }
}

/// Characters that cannot start a plain scalar.
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];

fn is_plain_safe(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    !INDICATORS.contains(&first)
        && !s.starts_with([' ', '\t'])
        && !s.ends_with([' ', '\t'])
        && !s.starts_with("---")
        && !s.starts_with("...")
        && !s.chars().any(|c| {
            needs_escape(c) || matches!(c, ':' | '#' | ',' | '[' | ']' | '{' | '}')
        })
        && resolves_to_string(s)
}

fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}')
}

fn encode_double_quoted(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            '\x07' => result.push_str("\\a"),
            '\x08' => result.push_str("\\b"),
            '\x0B' => result.push_str("\\v"),
            '\x0C' => result.push_str("\\f"),
            '\x1B' => result.push_str("\\e"),
            '\u{85}' => result.push_str("\\N"),
            '\u{2028}' => result.push_str("\\L"),
            '\u{2029}' => result.push_str("\\P"),
            c if needs_escape(c) => {
                let code = c as u32;
                if code <= 0xFF {
                    result.push_str(&format!("\\x{:02X}", code));
                } else {
                    result.push_str(&format!("\\u{:04X}", code));
                }
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
