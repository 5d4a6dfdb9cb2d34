//! Phase 2: Parser
//!
//! Builds a single-rooted node tree from the token stream. Open collections
//! are tracked with an explicit stack of frames, each recording the column
//! it was opened at and the kind of collection it builds. Frames refer to
//! their parent by index; closing a frame attaches the finished collection
//! to the parent's pending slot (a mapping key awaiting its value or a
//! sequence entry after `-`).
//!
//! On each new block line the indentation is compared with the top frame:
//! deeper frames are closed, an equal column continues the current
//! collection, and a greater column may only open a new collection where
//! the top frame has a pending slot. Flow collections push frames on the
//! same stack but are closed by their brackets rather than by indentation.

use tracing::{debug, trace, warn};

use crate::error::{Error, Position, Result};
use crate::node::{KeyIndex, Node};
use crate::options::ParseOptions;
use crate::resolver::resolve_plain_with;
use crate::scanner::{scan, ScalarStyle, Token, TokenKind};

/// Parse source text into its root node. Input without any content yields
/// `None`.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Option<Node>> {
    let tokens = scan(source)?;
    let mut parser = Parser::new(&tokens, options);
    while parser.step()? {}
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    BlockMapping,
    BlockSequence,
    FlowMapping,
    FlowSequence,
}

impl FrameKind {
    fn is_mapping(self) -> bool {
        matches!(self, FrameKind::BlockMapping | FrameKind::FlowMapping)
    }
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// Block frames: column of the entries. Flow frames: column of the
    /// opening bracket.
    indent: usize,
    /// 1-based position on the stack, set when the frame is opened.
    depth: usize,
    parent: Option<usize>,
    start: Position,
    node: Node,
    keys: KeyIndex,
    /// Mapping key awaiting its value. Flow sequences use it for the key of
    /// a single-pair `[k: v]` entry.
    pending_key: Option<(Node, Position)>,
    /// Block sequence: a `-` was read and its entry has not arrived yet.
    /// Flow collections: a `:` was read and its value has not arrived yet.
    awaiting_value: bool,
    /// Flow collections: an entry was completed since the last `,`.
    has_entry: bool,
}

impl Frame {
    fn new(kind: FrameKind, indent: usize, start: Position) -> Self {
        let node = if kind.is_mapping() {
            Node::mapping()
        } else {
            Node::sequence()
        };
        Self {
            kind,
            indent,
            depth: 0,
            parent: None,
            start,
            node,
            keys: KeyIndex::default(),
            pending_key: None,
            awaiting_value: false,
            has_entry: false,
        }
    }

    fn push(&mut self, item: Node) {
        if let Node::Sequence(items) = &mut self.node {
            items.push(item);
        }
    }

    fn insert(
        &mut self,
        key: Node,
        at: Position,
        value: Node,
        options: &ParseOptions,
    ) -> Result<()> {
        if let Node::Mapping(entries) = &mut self.node {
            if self.keys.insert(entries, key, value).is_some() {
                if !options.allow_duplicate_keys {
                    return Err(Error::parse("duplicate mapping key", at));
                }
                warn!(
                    line = at.line,
                    column = at.column,
                    "duplicate mapping key, keeping the last value"
                );
            }
        }
        Ok(())
    }

    /// A `[k: v]` entry is a mapping one level below the sequence with no
    /// frame of its own.
    fn push_pair(
        &mut self,
        key: Node,
        at: Position,
        value: Node,
        options: &ParseOptions,
    ) -> Result<()> {
        if options.too_deep(self.depth + 1 + key.depth().max(value.depth())) {
            return Err(Error::parse("nesting limit exceeded", at));
        }
        self.push(Node::Mapping(vec![(key, value)]));
        Ok(())
    }

    /// Fill slots left open when the collection ends or a `,` is read.
    fn flush_pending(&mut self, options: &ParseOptions) -> Result<()> {
        match self.kind {
            FrameKind::BlockMapping | FrameKind::FlowMapping => {
                if let Some((key, at)) = self.pending_key.take() {
                    self.insert(key, at, Node::Null, options)?;
                }
            }
            FrameKind::FlowSequence => {
                if let Some((key, at)) = self.pending_key.take() {
                    self.push_pair(key, at, Node::Null, options)?;
                }
            }
            FrameKind::BlockSequence => {
                if self.awaiting_value {
                    self.push(Node::Null);
                }
            }
        }
        self.awaiting_value = false;
        Ok(())
    }

    fn closer(&self) -> char {
        if self.kind == FrameKind::FlowSequence {
            ']'
        } else {
            '}'
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    options: &'a ParseOptions,
    frames: Vec<Frame>,
    root: Option<Node>,
    seen_start: bool,
    ended: bool,
    /// Trailing content was reached and is being ignored.
    stopped: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            options,
            frames: Vec::new(),
            root: None,
            seen_start: false,
            ended: false,
            stopped: false,
        }
    }

    /// Process the next token. Returns false once the stream has ended.
    fn step(&mut self) -> Result<bool> {
        let token = self.next();
        match &token.kind {
            TokenKind::StreamEnd => return Ok(false),
            TokenKind::Indent(column) => self.on_indent(*column, token.position)?,
            TokenKind::BlockEntry => self.on_block_entry(token)?,
            TokenKind::Scalar { .. }
            | TokenKind::FlowSequenceStart
            | TokenKind::FlowMappingStart => self.on_node(token)?,
            TokenKind::DocumentStart => self.on_document_start(token.position)?,
            TokenKind::DocumentEnd => {
                self.close_all()?;
                self.ended = true;
            }
            TokenKind::Value => {
                return Err(Error::parse("mapping value without a key", token.position));
            }
            TokenKind::FlowSequenceEnd | TokenKind::FlowMappingEnd | TokenKind::FlowEntry => {
                return Err(Error::parse(
                    format!("unexpected '{}' outside a flow collection", punctuation(&token.kind)),
                    token.position,
                ));
            }
        }
        Ok(!self.stopped)
    }

    fn finish(mut self) -> Result<Option<Node>> {
        self.close_all()?;
        Ok(self.root)
    }

    fn next(&mut self) -> &'a Token {
        let token = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> &'a TokenKind {
        &self.tokens[self.pos].kind
    }

    // ========================================================================
    // Frames
    // ========================================================================

    fn open(&mut self, mut frame: Frame) -> Result<()> {
        let depth = self.frames.len() + 1;
        if self.options.too_deep(depth) {
            return Err(Error::parse("nesting limit exceeded", frame.start));
        }
        frame.depth = depth;
        frame.parent = self.frames.len().checked_sub(1);
        trace!(kind = ?frame.kind, indent = frame.indent, depth, "open frame");
        self.frames.push(frame);
        Ok(())
    }

    /// Close the top block frame and attach its collection to the parent.
    fn close(&mut self) -> Result<()> {
        let options = self.options;
        let Some(mut frame) = self.frames.pop() else {
            return Ok(());
        };
        trace!(kind = ?frame.kind, indent = frame.indent, depth = self.frames.len(), "close frame");
        frame.flush_pending(options)?;

        match frame.parent {
            None => self.root = Some(frame.node),
            Some(index) => {
                let parent = &mut self.frames[index];
                match parent.kind {
                    FrameKind::BlockSequence => {
                        parent.push(frame.node);
                        parent.awaiting_value = false;
                    }
                    FrameKind::BlockMapping => {
                        if let Some((key, at)) = parent.pending_key.take() {
                            parent.insert(key, at, frame.node, options)?;
                        }
                    }
                    // Flow frames are closed by their brackets
                    FrameKind::FlowMapping | FrameKind::FlowSequence => {}
                }
            }
        }
        Ok(())
    }

    fn close_all(&mut self) -> Result<()> {
        while !self.frames.is_empty() {
            self.close()?;
        }
        Ok(())
    }

    /// Check that a new block collection may open at `column`.
    fn check_slot(&self, kind: FrameKind, column: usize, position: Position) -> Result<()> {
        let Some(top) = self.frames.last() else {
            return Ok(());
        };
        match top.kind {
            FrameKind::BlockSequence if top.awaiting_value && column > top.indent => Ok(()),
            FrameKind::BlockMapping => match &top.pending_key {
                Some((_, key_at)) if key_at.line == position.line => {
                    let message = if kind == FrameKind::BlockSequence {
                        "block sequence entries are not allowed in this context"
                    } else {
                        "mapping values are not allowed in this context"
                    };
                    Err(Error::parse(message, position))
                }
                Some(_) if column > top.indent => Ok(()),
                _ => Err(Error::parse("unexpected indentation", position)),
            },
            _ => Err(Error::parse("unexpected indentation", position)),
        }
    }

    // ========================================================================
    // Trailing content
    // ========================================================================

    /// Content past the end of the document: an error, or the point where
    /// parsing stops when trailing content is allowed.
    fn trailing(&mut self, message: &str, position: Position) -> Result<()> {
        if !self.options.allow_trailing_content {
            return Err(Error::parse(message, position));
        }
        debug!(line = position.line, column = position.column, "ignoring trailing content");
        self.stopped = true;
        Ok(())
    }

    /// Check for a node arriving after the document is complete.
    fn past_document(&mut self, position: Position) -> Result<bool> {
        if self.ended {
            self.trailing("multiple documents are not supported", position)?;
        } else if self.frames.is_empty() && self.root.is_some() {
            self.trailing("unexpected content after the document root", position)?;
        }
        Ok(self.stopped)
    }

    // ========================================================================
    // Block context
    // ========================================================================

    fn on_indent(&mut self, column: usize, position: Position) -> Result<()> {
        if self.ended {
            return self.trailing("multiple documents are not supported", position);
        }
        let next_is_entry = matches!(self.peek(), TokenKind::BlockEntry);
        let mut closed = false;
        while let Some(top) = self.frames.last() {
            let deeper = top.indent > column;
            let sequence_done =
                top.indent == column && top.kind == FrameKind::BlockSequence && !next_is_entry;
            if !deeper && !sequence_done {
                break;
            }
            self.close()?;
            closed = true;
        }
        if closed {
            if let Some(top) = self.frames.last() {
                if top.indent < column {
                    return Err(Error::parse("misaligned indentation", position));
                }
            }
        }
        Ok(())
    }

    fn on_block_entry(&mut self, token: &Token) -> Result<()> {
        let column = token.column();
        let position = token.position;
        if self.past_document(position)? {
            return Ok(());
        }

        if let Some(top) = self.frames.last_mut() {
            if top.indent == column {
                match top.kind {
                    FrameKind::BlockSequence => {
                        if top.awaiting_value {
                            top.push(Node::Null);
                        }
                        top.awaiting_value = true;
                        return Ok(());
                    }
                    // A sequence may sit at its key's own indentation
                    FrameKind::BlockMapping => match &top.pending_key {
                        Some((_, key_at)) if key_at.line != position.line => {}
                        Some(_) => {
                            return Err(Error::parse(
                                "block sequence entries are not allowed in this context",
                                position,
                            ));
                        }
                        None => {
                            return Err(Error::parse(
                                "expected a mapping key, found a block sequence entry",
                                position,
                            ));
                        }
                    },
                    _ => {}
                }
                let mut frame = Frame::new(FrameKind::BlockSequence, column, position);
                frame.awaiting_value = true;
                return self.open(frame);
            }
        }

        self.check_slot(FrameKind::BlockSequence, column, position)?;
        let mut frame = Frame::new(FrameKind::BlockSequence, column, position);
        frame.awaiting_value = true;
        self.open(frame)
    }

    /// A scalar or flow collection in block context: decide whether it is a
    /// mapping key or a value.
    fn on_node(&mut self, token: &'a Token) -> Result<()> {
        if self.past_document(token.position)? {
            return Ok(());
        }
        let node = match &token.kind {
            TokenKind::Scalar { text, style } => {
                scalar_node(text, *style, token.position, self.options)?
            }
            _ => self.parse_flow(token)?,
        };
        if matches!(self.peek(), TokenKind::Value) {
            self.next();
            self.add_key(node, token.column(), token.position)
        } else {
            self.add_value(node, token.column(), token.position)
        }
    }

    fn add_key(&mut self, key: Node, column: usize, position: Position) -> Result<()> {
        let options = self.options;
        if let Some(top) = self.frames.last_mut() {
            if top.kind == FrameKind::BlockMapping && top.indent == column {
                // The previous key got no value
                if let Some((previous, at)) = top.pending_key.take() {
                    top.insert(previous, at, Node::Null, options)?;
                }
                top.pending_key = Some((key, position));
                return Ok(());
            }
        }

        self.check_slot(FrameKind::BlockMapping, column, position)?;
        // The first key was read before its mapping's frame existed
        if options.too_deep(self.frames.len() + 1 + key.depth()) {
            return Err(Error::parse("nesting limit exceeded", position));
        }
        let mut frame = Frame::new(FrameKind::BlockMapping, column, position);
        frame.pending_key = Some((key, position));
        self.open(frame)
    }

    fn add_value(&mut self, node: Node, column: usize, position: Position) -> Result<()> {
        let options = self.options;
        let Some(top) = self.frames.last_mut() else {
            self.root = Some(node);
            return Ok(());
        };

        match top.kind {
            FrameKind::BlockSequence if top.awaiting_value && column > top.indent => {
                top.push(node);
                top.awaiting_value = false;
                Ok(())
            }
            FrameKind::BlockMapping if column > top.indent && top.pending_key.is_some() => {
                match top.pending_key.take() {
                    Some((key, at)) => top.insert(key, at, node, options),
                    None => Ok(()),
                }
            }
            FrameKind::BlockMapping if column == top.indent => {
                Err(Error::parse("mapping key without a value", position))
            }
            _ => Err(Error::parse("unexpected indentation", position)),
        }
    }

    fn on_document_start(&mut self, position: Position) -> Result<()> {
        if self.ended || self.seen_start || self.root.is_some() || !self.frames.is_empty() {
            return self.trailing("multiple documents are not supported", position);
        }
        self.seen_start = true;
        Ok(())
    }

    // ========================================================================
    // Flow context
    // ========================================================================

    /// Parse a whole flow collection starting at `open` and return it.
    fn parse_flow(&mut self, open: &'a Token) -> Result<Node> {
        let base = self.frames.len();
        self.open_flow(open)?;
        loop {
            let token = self.next();
            match &token.kind {
                TokenKind::FlowSequenceStart | TokenKind::FlowMappingStart => {
                    self.open_flow(token)?;
                }
                TokenKind::FlowSequenceEnd | TokenKind::FlowMappingEnd => {
                    let (node, start) = self.close_flow(token)?;
                    if self.frames.len() <= base {
                        return Ok(node);
                    }
                    self.flow_complete(node, start)?;
                }
                TokenKind::Scalar { text, style } => {
                    let node = scalar_node(text, *style, token.position, self.options)?;
                    self.flow_complete(node, token.position)?;
                }
                TokenKind::FlowEntry => self.flow_entry(token.position)?,
                TokenKind::Value => self.flow_value(token.position)?,
                _ => return Err(self.unterminated_flow(token.position)),
            }
        }
    }

    fn open_flow(&mut self, token: &Token) -> Result<()> {
        let kind = if token.kind == TokenKind::FlowSequenceStart {
            FrameKind::FlowSequence
        } else {
            FrameKind::FlowMapping
        };
        self.open(Frame::new(kind, token.column(), token.position))
    }

    fn close_flow(&mut self, token: &Token) -> Result<(Node, Position)> {
        let options = self.options;
        let expected = if token.kind == TokenKind::FlowSequenceEnd {
            FrameKind::FlowSequence
        } else {
            FrameKind::FlowMapping
        };
        match self.frames.last() {
            Some(top) if top.kind == expected => {}
            Some(top) => {
                return Err(Error::parse(
                    format!(
                        "mismatched '{}', expected '{}'",
                        punctuation(&token.kind),
                        top.closer()
                    ),
                    token.position,
                ));
            }
            None => {
                return Err(Error::parse(
                    format!("unexpected '{}'", punctuation(&token.kind)),
                    token.position,
                ));
            }
        }
        let Some(mut frame) = self.frames.pop() else {
            return Err(self.unterminated_flow(token.position));
        };
        trace!(kind = ?frame.kind, depth = self.frames.len(), "close frame");
        frame.flush_pending(options)?;
        Ok((frame.node, frame.start))
    }

    /// Place a finished node inside the innermost flow collection.
    fn flow_complete(&mut self, node: Node, position: Position) -> Result<()> {
        let next_is_value = matches!(self.peek(), TokenKind::Value);
        let options = self.options;
        let Some(top) = self.frames.last_mut() else {
            return Ok(());
        };

        if top.has_entry {
            return Err(Error::parse(
                format!("expected ',' or '{}' in flow collection", top.closer()),
                position,
            ));
        }

        if top.awaiting_value {
            let (key, at) = top.pending_key.take().unwrap_or((Node::Null, position));
            top.awaiting_value = false;
            top.has_entry = true;
            if top.kind == FrameKind::FlowSequence {
                return top.push_pair(key, at, node, options);
            }
            return top.insert(key, at, node, options);
        }

        if next_is_value {
            self.pos += 1;
            top.pending_key = Some((node, position));
            top.awaiting_value = true;
        } else if top.kind == FrameKind::FlowMapping {
            // `{a, b: 1}`: a key without a value
            top.pending_key = Some((node, position));
            top.has_entry = true;
        } else {
            top.push(node);
            top.has_entry = true;
        }
        Ok(())
    }

    /// A `:` with no key before it.
    fn flow_value(&mut self, position: Position) -> Result<()> {
        let Some(top) = self.frames.last_mut() else {
            return Ok(());
        };
        if top.has_entry || top.awaiting_value {
            return Err(Error::parse("unexpected ':' in flow collection", position));
        }
        top.pending_key = Some((Node::Null, position));
        top.awaiting_value = true;
        Ok(())
    }

    fn flow_entry(&mut self, position: Position) -> Result<()> {
        let options = self.options;
        let Some(top) = self.frames.last_mut() else {
            return Ok(());
        };
        if !top.has_entry && !top.awaiting_value && top.pending_key.is_none() {
            return Err(Error::parse("unexpected ',' in flow collection", position));
        }
        top.flush_pending(options)?;
        top.has_entry = false;
        Ok(())
    }

    fn unterminated_flow(&self, position: Position) -> Error {
        match self.frames.last() {
            Some(frame) if frame.kind == FrameKind::FlowSequence => {
                Error::parse("unterminated flow sequence", frame.start)
            }
            Some(frame) => Error::parse("unterminated flow mapping", frame.start),
            None => Error::parse("unterminated flow collection", position),
        }
    }
}

fn scalar_node(
    text: &str,
    style: ScalarStyle,
    position: Position,
    options: &ParseOptions,
) -> Result<Node> {
    if style.is_plain() {
        resolve_plain_with(text, options).map_err(|e| e.with_location(position))
    } else {
        Ok(Node::String(text.to_string()))
    }
}

fn punctuation(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::FlowSequenceStart => "[",
        TokenKind::FlowSequenceEnd => "]",
        TokenKind::FlowMappingStart => "{",
        TokenKind::FlowMappingEnd => "}",
        TokenKind::FlowEntry => ",",
        TokenKind::Value => ":",
        TokenKind::BlockEntry => "-",
        _ => "token",
    }
}
