//! Phase 1: Scanner
//!
//! The scanner converts raw source text into a flat stream of positioned
//! tokens. It performs:
//! - Indentation counting (one `Indent` token per block-context line)
//! - Comment and blank line filtering
//! - Quoted scalar unescaping and line folding
//! - Block scalar (`|`, `>`) header parsing and body collection
//! - Plain scalar line folding
//! - Rejection of YAML features outside the supported subset
//!
//! Flow collections are only tracked by depth here; bracket matching is the
//! parser's job.

use tracing::trace;

use crate::error::{Error, Position, Result};

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    /// Only plain scalars go through type resolution.
    pub fn is_plain(self) -> bool {
        self == ScalarStyle::Plain
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Start of a block-context line, carrying its number of leading spaces.
    Indent(usize),
    /// `- ` introducing a block sequence entry.
    BlockEntry,
    /// `:` separating a mapping key from its value.
    Value,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    FlowEntry,
    Scalar { text: String, style: ScalarStyle },
    DocumentStart,
    DocumentEnd,
    StreamEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    /// Zero-based column of the token's first character.
    pub fn column(&self) -> usize {
        self.position.column - 1
    }
}

/// Scan source text into tokens. The last token is always `StreamEnd`.
pub fn scan(source: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    scanner.run()?;
    trace!(tokens = scanner.tokens.len(), "scanned source");
    Ok(scanner.tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlainStop {
    Eol,
    Comment,
    Indicator,
}

enum BodyLine {
    Empty,
    Text { more_indented: bool, text: String },
}

#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    col: usize,
}

struct Scanner<'a> {
    source: &'a str,
    /// Byte offset into `source`, always on a character boundary.
    pos: usize,
    line: usize,
    col: usize,
    flow_depth: usize,
    /// Column that block scalar bodies and plain continuation lines must exceed.
    anchor: isize,
    /// Column of the most recent node start on the current line.
    node_col: usize,
    /// Opening columns of the open flow collections.
    flow_cols: Vec<usize>,
    /// Set right after a quoted scalar or a flow collection end, where a
    /// flow-context `:` may follow without a space.
    adjacent_value: bool,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 0,
            flow_depth: 0,
            anchor: -1,
            node_col: 0,
            flow_cols: Vec::new(),
            adjacent_value: false,
            tokens: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        if self.peek() == Some('\u{FEFF}') {
            self.pos += '\u{FEFF}'.len_utf8();
        }
        while !self.at_eof() {
            if self.start_line()? {
                self.scan_line()?;
            }
        }
        let position = self.position();
        self.push(TokenKind::StreamEnd, position);
        Ok(())
    }

    // ========================================================================
    // Lines
    // ========================================================================

    /// Handle indentation at the start of a line. Returns false when the
    /// line is blank or a comment and has been consumed entirely.
    fn start_line(&mut self) -> Result<bool> {
        let mut indent = 0;
        let mut tab = None;
        loop {
            match self.peek() {
                Some(' ') => {
                    if tab.is_none() {
                        indent += 1;
                    }
                    self.advance();
                }
                Some('\t') => {
                    if tab.is_none() {
                        tab = Some(self.position());
                    }
                    self.advance();
                }
                _ => break,
            }
        }

        match self.peek() {
            None => return Ok(false),
            Some(c) if is_break(c) => {
                self.consume_break();
                return Ok(false);
            }
            Some('#') => {
                self.skip_comment();
                self.consume_break();
                return Ok(false);
            }
            Some(_) => {}
        }

        if self.flow_depth > 0 {
            return Ok(true);
        }
        if let Some(position) = tab {
            return Err(Error::scan(
                "tab characters are not allowed in indentation",
                position,
            ));
        }

        self.anchor = indent as isize - 1;
        self.node_col = indent;
        if indent == 0 {
            if let Some(kind) = self.document_marker() {
                let position = self.position();
                self.advance_by(3);
                self.push(kind, position);
                self.anchor = -1;
                return Ok(true);
            }
        }
        let position = self.position();
        self.push(TokenKind::Indent(indent), position);
        Ok(true)
    }

    /// Scan the tokens of the current line up to and including its break.
    fn scan_line(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(()),
                Some(c) if is_break(c) => {
                    self.consume_break();
                    return Ok(());
                }
                Some('#') => self.skip_comment(),
                Some(_) => {
                    if self.scan_token()? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Scan one token. Returns true when the token consumed the rest of the
    /// line (block scalars).
    fn scan_token(&mut self) -> Result<bool> {
        let position = self.position();
        let col = self.col;
        let Some(c) = self.peek() else {
            return Ok(false);
        };
        let adjacent = std::mem::replace(&mut self.adjacent_value, false);
        let in_flow = self.flow_depth > 0;

        match c {
            '-' if self.is_blank_at(1) => {
                if in_flow {
                    return Err(Error::scan(
                        "block sequence entries are not allowed in flow collections",
                        position,
                    ));
                }
                self.advance();
                self.anchor = col as isize;
                self.push(TokenKind::BlockEntry, position);
            }
            '[' | '{' => {
                self.advance();
                self.flow_depth += 1;
                self.flow_cols.push(col);
                self.node_col = col;
                let kind = if c == '[' {
                    TokenKind::FlowSequenceStart
                } else {
                    TokenKind::FlowMappingStart
                };
                self.push(kind, position);
            }
            ']' | '}' => {
                self.advance();
                self.flow_depth = self.flow_depth.saturating_sub(1);
                if let Some(start) = self.flow_cols.pop() {
                    self.node_col = start;
                }
                self.adjacent_value = true;
                let kind = if c == ']' {
                    TokenKind::FlowSequenceEnd
                } else {
                    TokenKind::FlowMappingEnd
                };
                self.push(kind, position);
            }
            ',' => {
                self.advance();
                self.push(TokenKind::FlowEntry, position);
            }
            ':' if self.is_blank_at(1) || (in_flow && (adjacent || self.is_flow_indicator_at(1))) => {
                self.advance();
                if !in_flow {
                    self.anchor = self.node_col as isize;
                }
                self.push(TokenKind::Value, position);
            }
            '?' if self.is_blank_at(1) => {
                return Err(Error::scan("explicit mapping keys are not supported", position));
            }
            '\'' => {
                let text = self.scan_single_quoted()?;
                self.node_col = col;
                self.adjacent_value = true;
                self.push_scalar(text, ScalarStyle::SingleQuoted, position);
            }
            '"' => {
                let text = self.scan_double_quoted()?;
                self.node_col = col;
                self.adjacent_value = true;
                self.push_scalar(text, ScalarStyle::DoubleQuoted, position);
            }
            '|' | '>' => {
                if in_flow {
                    return Err(Error::scan(
                        "block scalars are not allowed in flow collections",
                        position,
                    ));
                }
                let (text, style) = self.scan_block_scalar()?;
                self.push_scalar(text, style, position);
                return Ok(true);
            }
            '&' => return Err(Error::scan("anchors are not supported", position)),
            '*' => return Err(Error::scan("aliases are not supported", position)),
            '!' => return Err(Error::scan("tags are not supported", position)),
            '%' => return Err(Error::scan("directives are not supported", position)),
            '@' | '`' => {
                return Err(Error::scan(
                    format!("reserved indicator '{}' cannot start a plain scalar", c),
                    position,
                ));
            }
            _ => {
                self.node_col = col;
                let text = self.scan_plain();
                self.push_scalar(text, ScalarStyle::Plain, position);
            }
        }
        Ok(false)
    }

    // ========================================================================
    // Plain scalars
    // ========================================================================

    fn scan_plain(&mut self) -> String {
        let (mut text, stop) = self.plain_run();
        if stop == PlainStop::Eol {
            self.fold_plain(&mut text);
        }
        text
    }

    /// Consume one line of plain scalar text. Trailing whitespace is
    /// consumed but not included.
    fn plain_run(&mut self) -> (String, PlainStop) {
        let in_flow = self.flow_depth > 0;
        let mut text = String::new();
        let mut spaces = String::new();
        loop {
            let Some(c) = self.peek() else {
                return (text, PlainStop::Eol);
            };
            match c {
                c if is_break(c) => return (text, PlainStop::Eol),
                ' ' | '\t' => {
                    spaces.push(c);
                    self.advance();
                }
                '#' if !spaces.is_empty() => return (text, PlainStop::Comment),
                ':' if self.is_blank_at(1) || (in_flow && self.is_flow_indicator_at(1)) => {
                    return (text, PlainStop::Indicator);
                }
                ',' | '[' | ']' | '{' | '}' if in_flow => return (text, PlainStop::Indicator),
                _ => {
                    text.push_str(&spaces);
                    spaces.clear();
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Append continuation lines to a plain scalar that ended at a line
    /// break. In block context a continuation line must be indented past
    /// the scalar's owner and must not hold a mapping key.
    fn fold_plain(&mut self, text: &mut String) {
        let in_flow = self.flow_depth > 0;
        loop {
            let mark = self.mark();
            let Some(blank) = self.skip_to_next_content() else {
                self.reset(mark);
                return;
            };
            let Some(c) = self.peek() else {
                self.reset(mark);
                return;
            };
            let continues = if in_flow {
                !matches!(c, ',' | '[' | ']' | '{' | '}' | '#')
                    && !(c == ':' && (self.is_blank_at(1) || self.is_flow_indicator_at(1)))
            } else {
                c != '#'
                    && self.col as isize > self.anchor
                    && !(self.col == 0 && self.document_marker().is_some())
            };
            if !continues {
                self.reset(mark);
                return;
            }

            let (run, stop) = self.plain_run();
            if run.is_empty() || (stop == PlainStop::Indicator && !in_flow) {
                self.reset(mark);
                return;
            }
            text.push_str(&fold_separator(blank));
            text.push_str(&run);
            if stop != PlainStop::Eol {
                return;
            }
        }
    }

    // ========================================================================
    // Quoted scalars
    // ========================================================================

    fn scan_single_quoted(&mut self) -> Result<String> {
        let start = self.position();
        self.advance();
        let mut text = String::new();
        let mut spaces = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(Error::scan("unterminated single-quoted scalar", start));
            };
            match c {
                '\'' if self.peek_at(1) == Some('\'') => {
                    text.push_str(&spaces);
                    spaces.clear();
                    text.push('\'');
                    self.advance_by(2);
                }
                '\'' => {
                    self.advance();
                    text.push_str(&spaces);
                    return Ok(text);
                }
                ' ' | '\t' => {
                    spaces.push(c);
                    self.advance();
                }
                c if is_break(c) => {
                    spaces.clear();
                    self.fold_quoted(&mut text);
                }
                _ => {
                    text.push_str(&spaces);
                    spaces.clear();
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_double_quoted(&mut self) -> Result<String> {
        let start = self.position();
        self.advance();
        let mut text = String::new();
        let mut spaces = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(Error::scan("unterminated double-quoted scalar", start));
            };
            match c {
                '"' => {
                    self.advance();
                    text.push_str(&spaces);
                    return Ok(text);
                }
                ' ' | '\t' => {
                    spaces.push(c);
                    self.advance();
                }
                c if is_break(c) => {
                    spaces.clear();
                    self.fold_quoted(&mut text);
                }
                '\\' => {
                    text.push_str(&spaces);
                    spaces.clear();
                    let escape = self.position();
                    self.advance();
                    match self.peek() {
                        None => {
                            return Err(Error::scan("unterminated double-quoted scalar", start));
                        }
                        // Escaped line break: join the lines without a separator
                        Some(b) if is_break(b) => {
                            if let Some(blank) = self.skip_to_next_content() {
                                text.push_str(&"\n".repeat(blank));
                            }
                        }
                        Some(e) => {
                            self.advance();
                            text.push(self.unescape(e, escape)?);
                        }
                    }
                }
                _ => {
                    text.push_str(&spaces);
                    spaces.clear();
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Fold a line break inside a quoted scalar: leading whitespace of the
    /// next line is dropped, a single break becomes a space and each extra
    /// empty line becomes a newline.
    fn fold_quoted(&mut self, text: &mut String) {
        if let Some(blank) = self.skip_to_next_content() {
            text.push_str(&fold_separator(blank));
        }
    }

    /// Decode the character after a backslash.
    fn unescape(&mut self, e: char, at: Position) -> Result<char> {
        let c = match e {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' | '\t' => '\t',
            'n' => '\n',
            'v' => '\x0B',
            'f' => '\x0C',
            'r' => '\r',
            'e' => '\x1B',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{85}',
            '_' => '\u{A0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => return self.hex_escape(2, at),
            'u' => return self.hex_escape(4, at),
            'U' => return self.hex_escape(8, at),
            _ => {
                return Err(Error::scan(
                    format!("invalid escape sequence '\\{}'", e),
                    at,
                ));
            }
        };
        Ok(c)
    }

    fn hex_escape(&mut self, digits: usize, at: Position) -> Result<char> {
        let mut code = self.hex_digits(digits, at)?;

        // A UTF-16 surrogate pair spelled as two \u escapes
        if digits == 4
            && (0xD800..0xDC00).contains(&code)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            self.advance_by(2);
            let low = self.hex_digits(4, at)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(Error::scan("unpaired surrogate in escape", at));
            }
            code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        }

        char::from_u32(code).ok_or_else(|| {
            Error::scan(
                format!("invalid Unicode code point U+{:04X} in escape", code),
                at,
            )
        })
    }

    fn hex_digits(&mut self, count: usize, at: Position) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| Error::scan("invalid hexadecimal escape", at))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    // ========================================================================
    // Block scalars
    // ========================================================================

    fn scan_block_scalar(&mut self) -> Result<(String, ScalarStyle)> {
        let style = if self.peek() == Some('>') {
            ScalarStyle::Folded
        } else {
            ScalarStyle::Literal
        };
        self.advance();

        // Chomping and indentation indicators, in either order
        let mut chomp = Chomp::Clip;
        let mut explicit = None;
        for _ in 0..2 {
            match self.peek() {
                Some('-') if chomp == Chomp::Clip => chomp = Chomp::Strip,
                Some('+') if chomp == Chomp::Clip => chomp = Chomp::Keep,
                Some(c @ '1'..='9') if explicit.is_none() => explicit = c.to_digit(10),
                _ => break,
            }
            self.advance();
        }

        let had_space = self.skip_whitespace();
        match self.peek() {
            Some('#') if had_space => self.skip_comment(),
            Some(c) if !is_break(c) => {
                return Err(Error::scan("invalid block scalar header", self.position()));
            }
            _ => {}
        }
        self.consume_break();

        let parent = self.anchor;
        let mut indent = explicit.map(|d| (parent + d as isize).max(0) as usize);
        let mut lines = Vec::new();
        loop {
            let mark = self.mark();
            let mut spaces = 0;
            while self.peek() == Some(' ') {
                spaces += 1;
                self.advance();
            }
            match self.peek() {
                None => break,
                Some(c) if is_break(c) => {
                    match indent {
                        Some(n) if spaces > n => lines.push(BodyLine::Text {
                            more_indented: true,
                            text: " ".repeat(spaces - n),
                        }),
                        _ => lines.push(BodyLine::Empty),
                    }
                    self.consume_break();
                    continue;
                }
                Some(_) => {}
            }

            if spaces == 0 && self.document_marker().is_some() {
                self.reset(mark);
                break;
            }
            let content_indent = match indent {
                Some(n) => n,
                None if spaces as isize > parent => {
                    indent = Some(spaces);
                    spaces
                }
                None => {
                    self.reset(mark);
                    break;
                }
            };
            if spaces < content_indent {
                self.reset(mark);
                break;
            }

            let mut text = " ".repeat(spaces - content_indent);
            let more_indented = !text.is_empty() || self.peek() == Some('\t');
            while let Some(c) = self.peek() {
                if is_break(c) {
                    break;
                }
                text.push(c);
                self.advance();
            }
            lines.push(BodyLine::Text {
                more_indented,
                text,
            });
            if !self.consume_break() {
                break;
            }
        }

        Ok((assemble_block(&lines, style, chomp), style))
    }

    // ========================================================================
    // Character helpers
    // ========================================================================

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Lookahead by characters, not bytes.
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Advance past one character that is not a line break.
    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            self.col += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Consume one line break (`\n`, `\r\n` or `\r`). Returns false at EOF.
    fn consume_break(&mut self) -> bool {
        match self.peek() {
            Some('\r') => {
                self.pos += 1;
                if self.peek() == Some('\n') {
                    self.pos += 1;
                }
            }
            Some('\n') => self.pos += 1,
            _ => return false,
        }
        self.line += 1;
        self.col = 0;
        true
    }

    /// Skip spaces and tabs. Returns true if anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
        self.pos > start
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if is_break(c) {
                break;
            }
            self.advance();
        }
    }

    /// From a line break, skip to the first non-blank character of the next
    /// non-empty line. Returns the number of empty lines in between, or
    /// `None` at end of input.
    fn skip_to_next_content(&mut self) -> Option<usize> {
        if !self.consume_break() {
            return None;
        }
        let mut blank = 0;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return None,
                Some(c) if is_break(c) => {
                    self.consume_break();
                    blank += 1;
                }
                Some(_) => return Some(blank),
            }
        }
    }

    fn is_blank_at(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            None => true,
            Some(c) => c == ' ' || c == '\t' || is_break(c),
        }
    }

    fn is_flow_indicator_at(&self, offset: usize) -> bool {
        matches!(self.peek_at(offset), Some(',' | '[' | ']' | '{' | '}'))
    }

    /// `---` or `...` followed by a blank, at the current position.
    fn document_marker(&self) -> Option<TokenKind> {
        let kind = match (self.peek_at(0), self.peek_at(1), self.peek_at(2)) {
            (Some('-'), Some('-'), Some('-')) => TokenKind::DocumentStart,
            (Some('.'), Some('.'), Some('.')) => TokenKind::DocumentEnd,
            _ => return None,
        };
        self.is_blank_at(3).then_some(kind)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col + 1)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.col = mark.col;
    }

    fn push(&mut self, kind: TokenKind, position: Position) {
        self.tokens.push(Token { kind, position });
    }

    fn push_scalar(&mut self, text: String, style: ScalarStyle, position: Position) {
        self.push(TokenKind::Scalar { text, style }, position);
    }
}

fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// A single line break folds to a space; each extra empty line is kept as a
/// newline.
fn fold_separator(blank_lines: usize) -> String {
    if blank_lines == 0 {
        " ".to_string()
    } else {
        "\n".repeat(blank_lines)
    }
}

/// Join the collected body lines of a block scalar and apply chomping.
fn assemble_block(lines: &[BodyLine], style: ScalarStyle, chomp: Chomp) -> String {
    let content_end = lines
        .iter()
        .rposition(|line| matches!(line, BodyLine::Text { .. }))
        .map_or(0, |i| i + 1);
    let trailing = lines.len() - content_end;
    let content = &lines[..content_end];

    let mut out = String::new();
    if style == ScalarStyle::Literal {
        for (i, line) in content.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if let BodyLine::Text { text, .. } = line {
                out.push_str(text);
            }
        }
    } else {
        // Folding joins adjacent plain lines with a space; line breaks next
        // to more-indented lines are kept.
        let mut previous: Option<bool> = None;
        let mut empty = 0;
        for line in content {
            match line {
                BodyLine::Empty => empty += 1,
                BodyLine::Text {
                    more_indented,
                    text,
                } => {
                    match previous {
                        None => out.push_str(&"\n".repeat(empty)),
                        Some(false) if !more_indented => out.push_str(&fold_separator(empty)),
                        Some(_) => out.push_str(&"\n".repeat(empty + 1)),
                    }
                    out.push_str(text);
                    previous = Some(*more_indented);
                    empty = 0;
                }
            }
        }
    }

    match chomp {
        Chomp::Strip => {}
        Chomp::Clip if content_end > 0 => out.push('\n'),
        Chomp::Clip => {}
        Chomp::Keep => {
            if content_end > 0 {
                out.push('\n');
            }
            out.push_str(&"\n".repeat(trailing));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn plain(text: &str) -> TokenKind {
        TokenKind::Scalar {
            text: text.to_string(),
            style: ScalarStyle::Plain,
        }
    }

    /// Text of the last scalar token in the source.
    fn scalar(source: &str) -> String {
        scan(source)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t.kind {
                TokenKind::Scalar { text, .. } => Some(text),
                _ => None,
            })
            .last()
            .unwrap()
    }

    fn scan_err(source: &str) -> Error {
        scan(source).unwrap_err()
    }

    #[test]
    fn test_block_mapping_tokens() {
        assert_eq!(
            kinds("a: 1\nb:\n  - x\n"),
            vec![
                TokenKind::Indent(0),
                plain("a"),
                TokenKind::Value,
                plain("1"),
                TokenKind::Indent(0),
                plain("b"),
                TokenKind::Value,
                TokenKind::Indent(2),
                TokenKind::BlockEntry,
                plain("x"),
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_flow_tokens_span_lines() {
        assert_eq!(
            kinds("k: [1,\n  two words]\n"),
            vec![
                TokenKind::Indent(0),
                plain("k"),
                TokenKind::Value,
                TokenKind::FlowSequenceStart,
                plain("1"),
                TokenKind::FlowEntry,
                plain("two words"),
                TokenKind::FlowSequenceEnd,
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_flow_value_indicator() {
        assert_eq!(
            kinds("{\"a\":1, b: c:d}"),
            vec![
                TokenKind::Indent(0),
                TokenKind::FlowMappingStart,
                TokenKind::Scalar {
                    text: "a".to_string(),
                    style: ScalarStyle::DoubleQuoted
                },
                TokenKind::Value,
                plain("1"),
                TokenKind::FlowEntry,
                plain("b"),
                TokenKind::Value,
                plain("c:d"),
                TokenKind::FlowMappingEnd,
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = scan("a:\n  bc: d").unwrap();
        let bc = &tokens[4];
        assert_eq!(bc.kind, plain("bc"));
        assert_eq!(bc.position, Position::new(2, 3));
        assert_eq!(bc.column(), 2);
    }

    #[test]
    fn test_positions_count_characters() {
        let tokens = scan("日本語: ü\nκλειδί: [α, β]").unwrap();
        let at = |text: &str| {
            tokens
                .iter()
                .find(|t| t.kind == plain(text))
                .map(|t| t.position)
                .unwrap()
        };
        assert_eq!(at("ü"), Position::new(1, 6));
        assert_eq!(at("κλειδί"), Position::new(2, 1));
        assert_eq!(at("β"), Position::new(2, 13));

        let err = scan_err("日本: \"語\\q\"");
        assert_eq!(err.position(), Some(Position::new(1, 7)));
        assert_eq!(scalar("k: 🦀 crab\n  🦀"), "🦀 crab 🦀");
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        assert_eq!(
            kinds("# head\n\na: b # tail\n   \n#x\n"),
            vec![
                TokenKind::Indent(0),
                plain("a"),
                TokenKind::Value,
                plain("b"),
                TokenKind::StreamEnd,
            ]
        );
        assert_eq!(scalar("a#b"), "a#b");
    }

    #[test]
    fn test_plain_folding() {
        assert_eq!(scalar("key: first\n  second\n\n  third"), "first second\nthird");
        // A continuation must be indented past the key
        assert_eq!(
            kinds("a: x\nb: y"),
            vec![
                TokenKind::Indent(0),
                plain("a"),
                TokenKind::Value,
                plain("x"),
                TokenKind::Indent(0),
                plain("b"),
                TokenKind::Value,
                plain("y"),
                TokenKind::StreamEnd,
            ]
        );
        // A comment line ends the scalar
        assert_eq!(scalar("- a\n  # note\n- b"), "b");
        assert_eq!(scalar("- a\n  b\n- c"), "c");
        assert_eq!(
            kinds("- a\n  b\n")[2],
            plain("a b")
        );
    }

    #[test]
    fn test_single_quoted() {
        assert_eq!(scalar("'it''s'"), "it's");
        assert_eq!(scalar("'a\n  b\n\n  c'"), "a b\nc");
        assert_eq!(scalar("'# not a comment'"), "# not a comment");
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(scalar(r#""a\tb\n\"q\" \\ \/""#), "a\tb\n\"q\" \\ /");
        assert_eq!(scalar(r#""\x41\u00e9\U0001F600""#), "A\u{e9}\u{1F600}");
        assert_eq!(scalar(r#""\ud83d\ude00""#), "\u{1F600}");
        assert_eq!(scalar(r#""\0\a\e\N\_\L\P""#), "\0\x07\x1B\u{85}\u{A0}\u{2028}\u{2029}");
        assert_eq!(scalar("\"joined\\\n   here\""), "joinedhere");
        assert_eq!(scalar("\"trail\\ \n next\""), "trail  next");
    }

    #[test]
    fn test_bad_escape_position() {
        let err = scan_err("k: \"ab\\qc\"");
        assert_eq!(err.kind(), ErrorKind::Scan);
        assert_eq!(err.position(), Some(Position::new(1, 7)));
        assert!(err.message().contains("invalid escape"));
        assert!(scan_err(r#""\u12""#).message().contains("hexadecimal"));
        assert!(scan_err(r#""\ud800""#).message().contains("code point"));
    }

    #[test]
    fn test_unterminated_quotes() {
        let err = scan_err("a: 'open\nb: c");
        assert_eq!(err.message(), "unterminated single-quoted scalar");
        assert_eq!(err.position(), Some(Position::new(1, 4)));
        let err = scan_err("\"open");
        assert_eq!(err.message(), "unterminated double-quoted scalar");
    }

    #[test]
    fn test_literal_block_chomping() {
        assert_eq!(scalar("a: |\n  one\n  two\n\n"), "one\ntwo\n");
        assert_eq!(scalar("a: |-\n  one\n  two\n\n"), "one\ntwo");
        assert_eq!(scalar("a: |+\n  one\n  two\n\n"), "one\ntwo\n\n");
        assert_eq!(scalar("a: |\n  one\n    indented\n  two"), "one\n  indented\ntwo\n");
    }

    #[test]
    fn test_block_scalar_ends_at_dedent() {
        assert_eq!(
            kinds("a: |\n  x\nb: 1"),
            vec![
                TokenKind::Indent(0),
                plain("a"),
                TokenKind::Value,
                TokenKind::Scalar {
                    text: "x\n".to_string(),
                    style: ScalarStyle::Literal
                },
                TokenKind::Indent(0),
                plain("b"),
                TokenKind::Value,
                plain("1"),
                TokenKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_block_scalar_explicit_indent() {
        assert_eq!(scalar("a: |2\n    lead\n  base\n"), "  lead\nbase\n");
        assert_eq!(scalar("a: |-2\n  x\n"), "x");
    }

    #[test]
    fn test_folded_block() {
        assert_eq!(scalar("a: >\n  one\n  two\n\n  three\n"), "one two\nthree\n");
        assert_eq!(scalar("a: >\n  one\n    code\n  two\n"), "one\n  code\ntwo\n");
        assert_eq!(scalar("a: >-\n  x\n  y\n"), "x y");
    }

    #[test]
    fn test_empty_block_scalar() {
        assert_eq!(
            kinds("a: |\nb: 1")[3],
            TokenKind::Scalar {
                text: String::new(),
                style: ScalarStyle::Literal
            }
        );
    }

    #[test]
    fn test_document_markers() {
        assert_eq!(
            kinds("---\na: 1\n...\n"),
            vec![
                TokenKind::DocumentStart,
                TokenKind::Indent(0),
                plain("a"),
                TokenKind::Value,
                plain("1"),
                TokenKind::DocumentEnd,
                TokenKind::StreamEnd,
            ]
        );
        assert_eq!(
            kinds("--- text"),
            vec![TokenKind::DocumentStart, plain("text"), TokenKind::StreamEnd]
        );
        assert_eq!(scalar("---word"), "---word");
    }

    #[test]
    fn test_bom_skipped() {
        let tokens = scan("\u{FEFF}a: 1").unwrap();
        assert_eq!(tokens[1].kind, plain("a"));
        assert_eq!(tokens[1].position, Position::new(1, 1));
    }

    #[test]
    fn test_crlf_line_breaks() {
        assert_eq!(kinds("a: 1\r\nb: 2\r\n").len(), 9);
    }

    #[test]
    fn test_tab_indentation_rejected() {
        let err = scan_err("a:\n\tb: 1");
        assert_eq!(err.kind(), ErrorKind::Scan);
        assert_eq!(err.position(), Some(Position::new(2, 1)));
        // Tabs inside a line are fine
        assert_eq!(scalar("x\ty"), "x\ty");
    }

    #[test]
    fn test_unsupported_features() {
        assert_eq!(scan_err("a: &x 1").message(), "anchors are not supported");
        assert_eq!(scan_err("a: *x").message(), "aliases are not supported");
        assert_eq!(scan_err("a: !!str 1").message(), "tags are not supported");
        assert_eq!(scan_err("? a\n: b").message(), "explicit mapping keys are not supported");
        assert_eq!(scan_err("%YAML 1.2").message(), "directives are not supported");
        assert!(scan_err("a: @x").message().contains("reserved indicator"));
        assert!(scan_err("[- a]").message().contains("flow collections"));
    }
}
