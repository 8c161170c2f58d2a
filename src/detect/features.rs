//! Feature extraction for candidate call sites.
//!
//! A body qualifies as a call site only when it carries API-call evidence.
//! Capability flags are then computed independently from keyword evidence,
//! so a body may set several of them at once.

use lazy_static::lazy_static;
use regex::Regex;

use super::params::GenerationParams;
use super::types::ExtractedFeatures;

/// Tokens that mark a body as calling the API at all.
const API_EVIDENCE: &[&str] = &[
    "fetch(",
    "generateContent",
    "streamGenerateContent",
    "callGeminiApi",
    "gemini",
    "generativelanguage",
];

/// Checked both as written and against the lowercased body, so camelCase
/// tokens like `inlineData` still match.
const IMAGE_KEYWORDS: &[&str] = &["image", "inlineData", "inline_data", "photo", "picture"];
const AUDIO_KEYWORDS: &[&str] = &["audio", "tts", "speech", "voice", "pcm", "wav"];
const VIDEO_KEYWORDS: &[&str] = &["video", "mp4", "webm"];
const TTS_KEYWORDS: &[&str] = &["tts", "text_to_speech", "speechconfig"];
/// Structured output needs at least two of these.
const STRUCTURED_KEYWORDS: &[&str] = &["json", "schema", "responsemime"];

/// Keywords in a declared type that mark a parameter as image-bearing.
const IMAGE_TYPE_KEYWORDS: &[&str] = &[
    "Image", "image", "Reference", "reference", "Picture", "Photo", "File", "Base64", "Data",
];
/// Keywords in a parameter name (lowercased) that mark it as image-bearing.
const IMAGE_NAME_KEYWORDS: &[&str] = &[
    "image", "img", "photo", "picture", "file", "base64", "data", "reference", "ref",
];

lazy_static! {
    /// Explicit model patterns, tried in order; the first hit wins.
    static ref MODEL_OVERRIDE_PATTERNS: Vec<Regex> = [
        r#"(?i)model\s*=\s*['"](gemini-[\w.-]+)['"]"#,
        r#"(?i)model:\s*['"](gemini-[\w.-]+)['"]"#,
        r#"(?i)["']model["']:\s*["'](gemini-[\w.-]+)["']"#,
        r#"(?i)callGemini\(\s*['"](gemini-[\w.-]+)['"]"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    /// Trailing identifier of a parameter head: `readonly image?`, `...files`, `**kwargs`
    static ref PARAM_NAME_RE: Regex = Regex::new(r"(\w+)\s*\??\s*$").unwrap();
}

/// Derive features from a function body and its parameter signature.
///
/// Returns `None` when the body shows no sign of calling the API.
pub fn extract_features(body: &str, signature: &str) -> Option<ExtractedFeatures> {
    if !has_api_evidence(body) {
        return None;
    }

    let explicit_model = explicit_model(body);
    let lower = body.to_lowercase();

    // Image evidence may also come from the declared parameters.
    let signature_lower = signature.to_lowercase();
    let has_image = IMAGE_KEYWORDS.iter().any(|kw| {
        body.contains(kw)
            || lower.contains(kw)
            || signature.contains(kw)
            || signature_lower.contains(kw)
    });
    let has_audio = contains_any(&lower, AUDIO_KEYWORDS);
    let has_video = contains_any(&lower, VIDEO_KEYWORDS);
    let has_stream = lower.contains("stream");
    let has_tts = contains_any(&lower, TTS_KEYWORDS);
    let has_structured = STRUCTURED_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count()
        >= 2;

    Some(ExtractedFeatures {
        has_image,
        has_audio,
        has_video,
        has_stream,
        has_tts,
        has_structured,
        params: GenerationParams::extract(body),
        explicit_model,
        image_params: image_params(signature),
    })
}

/// Cheap existence filter run before any classification.
pub fn has_api_evidence(body: &str) -> bool {
    API_EVIDENCE.iter().any(|token| body.contains(token))
}

/// The model identifier a call site names itself, if any.
pub fn explicit_model(body: &str) -> Option<String> {
    MODEL_OVERRIDE_PATTERNS
        .iter()
        .find_map(|re| re.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Names of parameters that likely carry image data.
///
/// Two rules run over every declared parameter: the declared type mentions an
/// image-like keyword, or the name itself does. Names matched by the type rule
/// come first, then those matched only by name.
pub fn image_params(signature: &str) -> Vec<String> {
    let params: Vec<(String, Option<&str>)> = split_params(signature)
        .into_iter()
        .filter_map(parse_param)
        .collect();

    let by_type = params.iter().filter(|(_, ty)| {
        ty.map(|t| IMAGE_TYPE_KEYWORDS.iter().any(|kw| t.contains(kw)))
            .unwrap_or(false)
    });
    let by_name = params.iter().filter(|(name, _)| {
        let lower = name.to_lowercase();
        IMAGE_NAME_KEYWORDS.iter().any(|kw| lower.contains(kw))
    });

    let mut found: Vec<String> = Vec::new();
    for (name, _) in by_type.chain(by_name) {
        if !found.contains(name) {
            found.push(name.clone());
        }
    }
    found
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

/// Split a parameter list on commas that are not nested in brackets.
fn split_params(signature: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut prev = '\0';

    for (i, c) in signature.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            // `=>` in a function type is not a closing bracket
            '>' if prev != '=' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&signature[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }
    parts.push(&signature[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split one parameter into its name and declared type, if it has one.
fn parse_param(param: &str) -> Option<(String, Option<&str>)> {
    let (head, ty) = match (param.find(':'), param.find('=')) {
        (Some(colon), Some(eq)) if eq < colon => (&param[..eq], None),
        (Some(colon), _) => (&param[..colon], Some(param[colon + 1..].trim())),
        (None, Some(eq)) => (&param[..eq], None),
        (None, None) => (param, None),
    };
    let name = PARAM_NAME_RE.captures(head.trim())?.get(1)?.as_str();
    Some((name.to_string(), ty))
}
