//! Reader and writer options.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options controlling how the writer renders a node tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpOptions {
    /// Spaces per nesting level. Must be positive.
    pub indent: usize,
    /// Whether the output ends with a line break.
    pub final_newline: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            final_newline: true,
        }
    }
}

impl DumpOptions {
    /// Build options from any native map, e.g. `{"indent": 4}`.
    ///
    /// Unknown keys and an `indent` of zero are conversion errors.
    pub fn from_dict<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let node = crate::convert::to_node(value)?;
        let options: DumpOptions = crate::convert::from_node(node)?;
        options.validate()?;
        Ok(options)
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn final_newline(mut self, final_newline: bool) -> Self {
        self.final_newline = final_newline;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.indent == 0 {
            return Err(Error::conversion(
                "indent is out of valid range: must be a positive integer",
            ));
        }
        Ok(())
    }
}

/// Default nesting limit of the parser. The writer refuses trees deeper than
/// this so that its output always loads with default options.
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Options controlling how text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// When false, a key repeated within one mapping is a parse error.
    /// Otherwise the last value wins.
    pub allow_duplicate_keys: bool,
    /// When true, parsing stops at the end of the first document and
    /// anything after it (a `...` marker followed by more text, a second
    /// `---`, or a second root node) is ignored.
    pub allow_trailing_content: bool,
    /// When false, `.nan` and `.inf` are plain strings rather than floats.
    pub allow_inf_nan: bool,
    /// Maximum depth of nested collections. Zero means unlimited.
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_duplicate_keys: true,
            allow_trailing_content: false,
            allow_inf_nan: true,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl ParseOptions {
    pub fn allow_duplicate_keys(mut self, allow: bool) -> Self {
        self.allow_duplicate_keys = allow;
        self
    }

    pub fn allow_trailing_content(mut self, allow: bool) -> Self {
        self.allow_trailing_content = allow;
        self
    }

    pub fn allow_inf_nan(mut self, allow: bool) -> Self {
        self.allow_inf_nan = allow;
        self
    }

    /// Pass zero to lift the limit.
    pub fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Whether a collection at `depth` (1-based) exceeds the limit.
    pub(crate) fn too_deep(&self, depth: usize) -> bool {
        self.max_nesting != 0 && depth > self.max_nesting
    }
}
