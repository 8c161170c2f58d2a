//! Request synthesis.
//!
//! Builds an example request body for a classified call site. The shape
//! follows the dominant feature class; prompt text is always a placeholder
//! and never copied from the scanned source.

use serde_json::{json, Map, Value};

use crate::detect::{AnalysisResult, ExtractedFeatures, MatchResult};

pub const PROMPT_PLACEHOLDER: &str = "{{prompt}}";
pub const TEXT_PLACEHOLDER: &str = "{{text}}";
pub const IMAGE_MIME_PLACEHOLDER: &str = "image/jpeg";
pub const IMAGE_DATA_PLACEHOLDER: &str = "BASE64_IMAGE_DATA";
pub const DEFAULT_VOICE: &str = "Kore";

/// Which request shape a call site gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    TextToSpeech,
    StructuredOutput,
    Image,
    Default,
}

/// Pick the request shape. Order: text-to-speech, structured output,
/// image (when the model is image-capable or image parameters exist),
/// then the plain text default.
pub fn request_kind(features: &ExtractedFeatures, matched: &MatchResult) -> RequestKind {
    let image_capable = matched
        .definition
        .as_ref()
        .map(|d| d.is_image_capable())
        .unwrap_or(false);

    if features.has_tts {
        RequestKind::TextToSpeech
    } else if features.has_structured {
        RequestKind::StructuredOutput
    } else if features.has_image && (image_capable || !features.image_params.is_empty()) {
        RequestKind::Image
    } else {
        RequestKind::Default
    }
}

/// Build the request body for one call site.
pub fn synthesize(features: &ExtractedFeatures, matched: &MatchResult) -> Value {
    match request_kind(features, matched) {
        RequestKind::TextToSpeech => tts_request(features),
        RequestKind::StructuredOutput => structured_request(features),
        RequestKind::Image => image_request(features),
        RequestKind::Default => default_request(features),
    }
}

/// Rebuild the request for an existing result.
pub fn synthesize_for(result: &AnalysisResult) -> Value {
    synthesize(&result.features, &result.matched)
}

fn contents(parts: Value) -> Value {
    json!([{ "parts": parts }])
}

fn default_request(features: &ExtractedFeatures) -> Value {
    let mut request = json!({ "contents": contents(json!([{ "text": PROMPT_PLACEHOLDER }])) });

    let mut generation = Map::new();
    if let Some(t) = features.params.temperature {
        generation.insert("temperature".to_string(), json!(t));
    }
    if let Some(n) = features.params.max_output_tokens {
        generation.insert("maxOutputTokens".to_string(), json!(n));
    }
    if !generation.is_empty() {
        request["generationConfig"] = Value::Object(generation);
    }
    request
}

fn image_request(features: &ExtractedFeatures) -> Value {
    // The API expects snake_case keys for inline data in requests.
    let parts = if features.image_params.is_empty() {
        json!([{ "text": PROMPT_PLACEHOLDER }])
    } else {
        json!([
            {
                "inline_data": {
                    "mime_type": IMAGE_MIME_PLACEHOLDER,
                    "data": IMAGE_DATA_PLACEHOLDER
                }
            },
            { "text": PROMPT_PLACEHOLDER }
        ])
    };

    let mut request = json!({ "contents": contents(parts) });
    if let Some(image_config) = &features.params.image_config {
        request["generationConfig"] = json!({ "imageConfig": image_config });
    }
    request
}

fn tts_request(features: &ExtractedFeatures) -> Value {
    let voice = features
        .params
        .voice_config
        .as_ref()
        .map(|v| v.voice_name.as_str())
        .unwrap_or(DEFAULT_VOICE);

    json!({
        "contents": contents(json!([{ "text": TEXT_PLACEHOLDER }])),
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice }
                }
            }
        }
    })
}

fn structured_request(features: &ExtractedFeatures) -> Value {
    let mut request = json!({
        "contents": contents(json!([{ "text": PROMPT_PLACEHOLDER }])),
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseJsonSchema": {
                "type": "object",
                "properties": {
                    "result": { "type": "string" }
                }
            }
        }
    });

    if let Some(thinking) = &features.params.thinking_config {
        request["generationConfig"]["thinkingConfig"] = json!(thinking);
    }
    request
}
