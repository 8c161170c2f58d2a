//! Priority-ordered model matching.
//!
//! Rules are evaluated in order and the first one that applies decides the
//! model. An explicit model named in code always wins. Matching is total:
//! when nothing else applies the fallback rule returns the default model.

use crate::catalog::ModelCatalog;

use super::types::{ExtractedFeatures, MatchResult};

pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const STRUCTURED_MODEL: &str = "gemini-3-pro-preview";
pub const STREAMING_MODEL: &str = "gemini-2.5-flash-stream";
pub const IMAGE_PRO_MODEL: &str = "gemini-3-pro-image-preview";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const MULTIMODAL_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Function-name keywords that select the high-end image model.
const ADVANCED_IMAGE_KEYWORDS: &[&str] = &["grid", "4k", "high", "advanced", "pro"];

/// What a rule sees.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    pub function: &'a str,
    pub features: &'a ExtractedFeatures,
}

/// What a rule decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An identifier from the scanned code, looked up case-insensitively.
    Explicit(String),
    /// A fixed identifier, looked up by exact key.
    Fixed(&'static str),
}

/// A named (predicate, resolution) pair. `resolve` returns `None` when the
/// rule does not apply.
#[derive(Debug, Clone, Copy)]
pub struct MatchRule {
    pub name: &'static str,
    pub resolve: fn(&MatchInput<'_>) -> Option<Resolution>,
}

/// The built-in rule order.
pub const DEFAULT_RULES: &[MatchRule] = &[
    MatchRule {
        name: "explicit",
        resolve: |input| {
            input
                .features
                .explicit_model
                .clone()
                .map(Resolution::Explicit)
        },
    },
    MatchRule {
        name: "tts",
        resolve: |input| input.features.has_tts.then_some(Resolution::Fixed(TTS_MODEL)),
    },
    MatchRule {
        name: "structured",
        resolve: |input| {
            input
                .features
                .has_structured
                .then_some(Resolution::Fixed(STRUCTURED_MODEL))
        },
    },
    MatchRule {
        name: "stream",
        resolve: |input| {
            input
                .features
                .has_stream
                .then_some(Resolution::Fixed(STREAMING_MODEL))
        },
    },
    MatchRule {
        name: "image",
        resolve: |input| {
            if !input.features.has_image {
                return None;
            }
            let name = input.function.to_lowercase();
            if ADVANCED_IMAGE_KEYWORDS.iter().any(|kw| name.contains(kw)) {
                Some(Resolution::Fixed(IMAGE_PRO_MODEL))
            } else {
                Some(Resolution::Fixed(IMAGE_MODEL))
            }
        },
    },
    MatchRule {
        name: "audio_video",
        resolve: |input| {
            (input.features.has_audio || input.features.has_video)
                .then_some(Resolution::Fixed(MULTIMODAL_MODEL))
        },
    },
    MatchRule {
        name: "fallback",
        resolve: |_| Some(Resolution::Fixed(DEFAULT_MODEL)),
    },
];

/// Resolves call sites to models against a catalog snapshot.
pub struct ModelMatcher<'c> {
    catalog: &'c ModelCatalog,
    rules: Vec<MatchRule>,
}

impl<'c> ModelMatcher<'c> {
    pub fn new(catalog: &'c ModelCatalog) -> Self {
        Self {
            catalog,
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Replace the rule list. The default model is still returned when no
    /// rule applies.
    pub fn with_rules(mut self, rules: Vec<MatchRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Resolve one call site.
    pub fn match_model(&self, function: &str, features: &ExtractedFeatures) -> MatchResult {
        let input = MatchInput { function, features };

        let (rule, resolution) = self
            .rules
            .iter()
            .find_map(|rule| (rule.resolve)(&input).map(|res| (rule.name, res)))
            .unwrap_or(("fallback", Resolution::Fixed(DEFAULT_MODEL)));

        match resolution {
            Resolution::Explicit(requested) => match self.catalog.find_ignore_case(&requested) {
                Some((key, definition)) => MatchResult {
                    model: key.to_string(),
                    definition: Some(definition),
                    rule,
                },
                None => MatchResult {
                    model: requested,
                    definition: None,
                    rule,
                },
            },
            Resolution::Fixed(id) => MatchResult {
                model: id.to_string(),
                definition: self.catalog.get(id),
                rule,
            },
        }
    }
}
