//! Dialect-aware function boundary extraction.
//!
//! This module provides:
//! - `BoundaryExtractor` trait: lazy candidate-function extraction from raw text
//! - `Dialect`: the two surface dialects, selected by file extension
//! - Brace-delimited and indentation-delimited strategies
//!
//! Both strategies are regex heuristics, not parsers. Braces or indentation
//! inside string and comment literals are not special-cased.

mod brace;
mod indent;

pub use brace::BraceExtractor;
pub use indent::IndentExtractor;

use serde::{Deserialize, Serialize};

/// A function-like region found in source text.
///
/// Produced by an extractor and consumed immediately by feature extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFunction {
    /// The declared name (e.g., "generateImage")
    pub name: String,
    /// File path relative to the scan root
    pub file: String,
    /// Line number of the declaration (1-indexed)
    pub line: usize,
    /// Raw parameter list text, without the surrounding parentheses
    pub signature: String,
    /// Raw body text
    pub body: String,
    /// Set when the body did not close inside the lookahead window and was cut off
    pub truncated: bool,
}

/// Surface dialect of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `{ ... }` bodies (TypeScript, JavaScript)
    BraceDelimited,
    /// Indented bodies (Python)
    IndentDelimited,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::BraceDelimited => "brace",
            Dialect::IndentDelimited => "indent",
        }
    }

    /// File extensions (without dot) handled by this dialect.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Dialect::BraceDelimited => &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"],
            Dialect::IndentDelimited => &["py"],
        }
    }

    /// Determine the dialect from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Dialect::BraceDelimited, Dialect::IndentDelimited]
            .into_iter()
            .find(|d| d.extensions().contains(&ext))
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts candidate functions from the text of one file.
///
/// Implementations are pure functions of their input: calling `extract`
/// twice on the same text yields the same sequence.
pub trait BoundaryExtractor: Send + Sync {
    /// The dialect this extractor handles.
    fn dialect(&self) -> Dialect;

    /// Lazily yield candidate functions in the order they are recognized.
    fn extract<'a>(
        &self,
        file: &'a str,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = CandidateFunction> + 'a>;
}

static BRACE_EXTRACTOR: BraceExtractor = BraceExtractor::DEFAULT;
static INDENT_EXTRACTOR: IndentExtractor = IndentExtractor;

/// Get the default-configured extractor for a dialect.
pub fn for_dialect(dialect: Dialect) -> &'static dyn BoundaryExtractor {
    match dialect {
        Dialect::BraceDelimited => &BRACE_EXTRACTOR,
        Dialect::IndentDelimited => &INDENT_EXTRACTOR,
    }
}

/// Extract candidates from `text` with the default extractor for `dialect`.
pub fn extract<'a>(
    dialect: Dialect,
    file: &'a str,
    text: &'a str,
) -> Box<dyn Iterator<Item = CandidateFunction> + 'a> {
    for_dialect(dialect).extract(file, text)
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
