//! Error types for tinyaml.
//!
//! Every failure of the engine (scanning, parsing, scalar resolution, native
//! conversion, and the caller's stream) surfaces as a single [`Error`] value
//! carrying a coarse [`ErrorKind`], a message, and a source [`Position`] when
//! one is known.

use std::fmt;
use thiserror::Error;

/// Result type for tinyaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A position in the source text. Lines and columns are 1-based; columns
/// count characters, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Create a position from a 1-based line and column.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid byte sequence, unterminated quoted or block scalar, bad escape,
    /// or an unsupported YAML feature found while tokenizing.
    Scan,
    /// Indentation inconsistency, unexpected token, unterminated flow
    /// collection, or a mapping key without a value.
    Parse,
    /// A plain scalar that matches a type pattern but cannot be represented,
    /// such as an integer literal outside the 64-bit range.
    Resolve,
    /// A native value with no node representation, a node that does not fit
    /// the requested native type, or an invalid option.
    Conversion,
    /// The caller's stream failed while reading or writing.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Scan => "scan",
            ErrorKind::Parse => "parse",
            ErrorKind::Resolve => "resolver",
            ErrorKind::Conversion => "conversion",
            ErrorKind::Io => "I/O",
        })
    }
}

/// Error type for all tinyaml operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}{}", loc_suffix(.position))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    position: Option<Position>,
}

/// Format a location suffix for error messages.
fn loc_suffix(position: &Option<Position>) -> String {
    match position {
        Some(pos) => format!(" at {}", pos),
        None => String::new(),
    }
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }

    pub(crate) fn scan(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Scan, message, Some(position))
    }

    pub(crate) fn parse(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Parse, message, Some(position))
    }

    pub(crate) fn resolve(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolve, message, None)
    }

    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message, None)
    }

    /// Attach a position unless the error already carries one.
    pub fn with_location(mut self, position: Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }

    /// The coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message, without kind or position.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The source position, when one is known.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns true for scan and parse errors, i.e. malformed input text.
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Scan | ErrorKind::Parse)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string(), None)
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::conversion(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::conversion(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let err = Error::parse("unexpected indentation", Position::new(3, 5));
        assert_eq!(
            err.to_string(),
            "parse error: unexpected indentation at line 3, column 5"
        );
    }

    #[test]
    fn test_display_without_position() {
        let err = Error::resolve("integer literal out of range");
        assert_eq!(err.to_string(), "resolver error: integer literal out of range");
    }

    #[test]
    fn test_with_location_keeps_first() {
        let err = Error::scan("bad escape", Position::new(1, 2)).with_location(Position::new(9, 9));
        assert_eq!(err.position(), Some(Position::new(1, 2)));
        let err = Error::resolve("x").with_location(Position::new(2, 4));
        assert_eq!(err.position(), Some(Position::new(2, 4)));
    }
}
