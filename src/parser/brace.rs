//! Boundary extraction for brace-delimited sources (TypeScript, JavaScript).

use lazy_static::lazy_static;
use phf::phf_set;
use regex::{Captures, Regex};

use super::{line_of, BoundaryExtractor, CandidateFunction, Dialect};
use crate::config::{DEFAULT_ARROW_WINDOW, DEFAULT_LOOKAHEAD_WINDOW};

lazy_static! {
    /// `function name(...)`, `const name = (...) =>`, `const name = async (...) =>`
    static ref DECLARATION_RE: Regex = Regex::new(
        r"(?:export\s+)?(?:async\s+)?(?:function|const|let|var)\s+(\w+)\s*(?:=\s*(?:async\s*)?\(([^)]*)\)|\(([^)]*)\))"
    ).unwrap();

    /// Class or object methods: `static async name(...): T {`
    static ref METHOD_RE: Regex = Regex::new(
        r"(?:(?:public|private|protected|static)\s+)*(?:async\s+)?(\w+)\s*\(([^)]*)\)\s*(?::\s*[^{]+)?\s*\{"
    ).unwrap();
}

/// Keywords that can land in the method name position: control blocks and
/// modifiers such as the `async` of a typed arrow function.
static REJECTED_NAMES: phf::Set<&'static str> = phf_set! {
    "if",
    "else",
    "return",
    "async",
    "await",
    "for",
    "while",
    "switch",
    "catch",
    "function",
    "constructor",
    "with",
};

/// Extractor for `{ ... }` bodies.
#[derive(Debug, Clone, Copy)]
pub struct BraceExtractor {
    /// Maximum bytes scanned while matching the closing brace.
    pub lookahead_window: usize,
    /// Maximum distance from a declaration to its `=>`.
    pub arrow_window: usize,
}

impl BraceExtractor {
    pub const DEFAULT: BraceExtractor = BraceExtractor {
        lookahead_window: DEFAULT_LOOKAHEAD_WINDOW,
        arrow_window: DEFAULT_ARROW_WINDOW,
    };

    pub fn new(lookahead_window: usize, arrow_window: usize) -> Self {
        Self {
            lookahead_window,
            arrow_window,
        }
    }

    fn declaration(&self, file: &str, text: &str, caps: Captures<'_>) -> Option<CandidateFunction> {
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        let (signature, open) = match caps.get(2) {
            // `name = (...) => {`
            Some(params) => (
                params.as_str(),
                find_arrow_body(text, whole.end(), self.arrow_window)?,
            ),
            // `function name(...) {`
            None => (
                caps.get(3).map(|m| m.as_str()).unwrap_or(""),
                whole.end() + text[whole.end()..].find('{')?,
            ),
        };
        Some(self.candidate(file, text, name, signature, whole.start(), open))
    }

    fn method(&self, file: &str, text: &str, caps: Captures<'_>) -> Option<CandidateFunction> {
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        if REJECTED_NAMES.contains(name) {
            return None;
        }
        let signature = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        // The pattern ends on the opening brace.
        let open = whole.end() - 1;
        Some(self.candidate(file, text, name, signature, whole.start(), open))
    }

    fn candidate(
        &self,
        file: &str,
        text: &str,
        name: &str,
        signature: &str,
        start: usize,
        open: usize,
    ) -> CandidateFunction {
        let (body, truncated) = match_braces(text, open, self.lookahead_window);
        if truncated {
            tracing::debug!(file, function = name, "body exceeded lookahead window, truncated");
        }
        CandidateFunction {
            name: name.to_string(),
            file: file.to_string(),
            line: line_of(text, start),
            signature: signature.to_string(),
            body: body.to_string(),
            truncated,
        }
    }
}

impl Default for BraceExtractor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BoundaryExtractor for BraceExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::BraceDelimited
    }

    fn extract<'a>(
        &self,
        file: &'a str,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = CandidateFunction> + 'a> {
        let this = *self;
        let declarations = DECLARATION_RE
            .captures_iter(text)
            .filter_map(move |caps| this.declaration(file, text, caps));
        let methods = METHOD_RE
            .captures_iter(text)
            .filter_map(move |caps| this.method(file, text, caps));
        Box::new(declarations.chain(methods))
    }
}

/// Locate the block opener of an arrow function.
///
/// The `=>` must appear within `arrow_window` bytes of the parameter list and
/// be followed by `{`. Expression-bodied arrows yield `None`.
fn find_arrow_body(text: &str, decl_end: usize, arrow_window: usize) -> Option<usize> {
    let arrow = decl_end + text[decl_end..].find("=>")?;
    if arrow - decl_end > arrow_window {
        return None;
    }
    let after = arrow + 2;
    let rest = &text[after..];
    let trimmed = rest.trim_start();
    if trimmed.starts_with('{') {
        Some(after + (rest.len() - trimmed.len()))
    } else {
        None
    }
}

/// Match the brace opened at `open` by depth counting.
///
/// Returns the body (opening brace included, closing brace excluded) and
/// whether the scan gave up before the body closed.
fn match_braces(text: &str, open: usize, window: usize) -> (&str, bool) {
    let limit = open.saturating_add(window).min(text.len());
    let mut depth: usize = 0;

    for (offset, &b) in text.as_bytes()[open..limit].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (&text[open..open + offset], false);
                }
            }
            _ => {}
        }
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[open..end], true)
}
