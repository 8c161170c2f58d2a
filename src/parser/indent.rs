//! Boundary extraction for indentation-delimited sources (Python).

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{line_of, BoundaryExtractor, CandidateFunction, Dialect};

lazy_static! {
    /// `def name(` or `async def name(` at the start of a line
    static ref DEF_RE: Regex = Regex::new(
        r"(?m)^([ \t]*)(?:async[ \t]+)?def[ \t]+(\w+)[ \t]*\("
    ).unwrap();
}

/// Extractor for indented bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentExtractor;

impl IndentExtractor {
    fn definition(file: &str, text: &str, caps: Captures<'_>) -> Option<CandidateFunction> {
        let whole = caps.get(0)?;
        let def_indent = indent_width(caps.get(1)?.as_str());
        let name = caps.get(2)?.as_str();

        let params_start = whole.end();
        let params_end = find_close_paren(text, params_start);
        let signature = &text[params_start..params_end];

        // The body starts on the line after the one closing the header.
        let body_start = text[params_end..]
            .find('\n')
            .map(|offset| params_end + offset + 1)
            .unwrap_or(text.len());

        Some(CandidateFunction {
            name: name.to_string(),
            file: file.to_string(),
            line: line_of(text, whole.start()),
            signature: signature.to_string(),
            body: indented_block(&text[body_start..], def_indent).to_string(),
            truncated: false,
        })
    }
}

impl BoundaryExtractor for IndentExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::IndentDelimited
    }

    fn extract<'a>(
        &self,
        file: &'a str,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = CandidateFunction> + 'a> {
        Box::new(
            DEF_RE
                .captures_iter(text)
                .filter_map(move |caps| Self::definition(file, text, caps)),
        )
    }
}

/// Position of the `)` closing a parameter list that opened just before `start`.
/// Falls back to the end of the line when the list never closes.
fn find_close_paren(text: &str, start: usize) -> usize {
    let mut depth: usize = 1;
    for (offset, b) in text.as_bytes()[start..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return start + offset;
                }
            }
            _ => {}
        }
    }
    text[start..]
        .find('\n')
        .map(|offset| start + offset)
        .unwrap_or(text.len())
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count()
}

/// Take lines while they stay at or beyond the indentation of the first
/// non-blank line. That first line must be indented deeper than the
/// definition itself, otherwise the block is empty. Trailing blank lines are
/// dropped.
fn indented_block(rest: &str, def_indent: usize) -> &str {
    let mut base: Option<usize> = None;
    let mut consumed = 0;
    let mut last_content_end = 0;

    for line in rest.split_inclusive('\n') {
        if line.trim().is_empty() {
            consumed += line.len();
            continue;
        }

        let indent = indent_width(line);
        match base {
            None if indent <= def_indent => break,
            None => base = Some(indent),
            Some(b) if indent < b => break,
            Some(_) => {}
        }

        consumed += line.len();
        last_content_end = consumed;
    }

    rest[..last_content_end].trim_end_matches(['\n', '\r'])
}
