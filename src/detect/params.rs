//! Structured generation parameters captured from a function body.
//!
//! Each extractor looks for exactly one key and contributes at most one
//! field; the fields are folded into an immutable `GenerationParams`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref TEMPERATURE_RE: Regex =
        Regex::new(r#"(?i)\btemperature["']?\s*[:=]\s*([\d.]+)"#).unwrap();
    static ref MAX_OUTPUT_TOKENS_RE: Regex =
        Regex::new(r#"(?i)\b(?:maxOutputTokens|max_output_tokens)["']?\s*[:=]\s*(\d+)"#).unwrap();
    static ref ASPECT_RATIO_RE: Regex =
        Regex::new(r#"(?i)\b(?:aspectRatio|aspect_ratio)["']?\s*[:=]\s*["']([^"']+)["']"#).unwrap();
    static ref IMAGE_SIZE_RE: Regex =
        Regex::new(r#"(?i)\b(?:imageSize|image_size)["']?\s*[:=]\s*["']([^"']+)["']"#).unwrap();
    static ref THINKING_LEVEL_RE: Regex =
        Regex::new(r#"(?i)\b(?:thinkingLevel|thinking_level)["']?\s*[:=]\s*["']([^"']+)["']"#).unwrap();
    static ref VOICE_NAME_RE: Regex =
        Regex::new(r#"(?i)\b(?:voiceName|voice_name)["']?\s*[:=]\s*["']([^"']+)["']"#).unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub voice_name: String,
}

/// Parameters found in a call site, serialized with the API's camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub system_instruction: bool,
}

/// A single captured key.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamField {
    Temperature(f64),
    MaxOutputTokens(u64),
    AspectRatio(String),
    ImageSize(String),
    ThinkingLevel(String),
    VoiceName(String),
    SystemInstruction,
}

type FieldExtractor = fn(&str) -> Option<ParamField>;

const FIELD_EXTRACTORS: &[FieldExtractor] = &[
    temperature,
    max_output_tokens,
    aspect_ratio,
    image_size,
    thinking_level,
    voice_name,
    system_instruction,
];

impl GenerationParams {
    /// Run every field extractor over `body` and fold the results.
    pub fn extract(body: &str) -> Self {
        FIELD_EXTRACTORS
            .iter()
            .filter_map(|extract| extract(body))
            .fold(Self::default(), Self::with)
    }

    /// Return a copy with `field` applied.
    pub fn with(self, field: ParamField) -> Self {
        match field {
            ParamField::Temperature(t) => Self {
                temperature: Some(t),
                ..self
            },
            ParamField::MaxOutputTokens(n) => Self {
                max_output_tokens: Some(n),
                ..self
            },
            ParamField::AspectRatio(ratio) => {
                let image = self.image_config.clone().unwrap_or_default();
                Self {
                    image_config: Some(ImageConfig {
                        aspect_ratio: Some(ratio),
                        ..image
                    }),
                    ..self
                }
            }
            ParamField::ImageSize(size) => {
                let image = self.image_config.clone().unwrap_or_default();
                Self {
                    image_config: Some(ImageConfig {
                        image_size: Some(size),
                        ..image
                    }),
                    ..self
                }
            }
            ParamField::ThinkingLevel(level) => Self {
                thinking_config: Some(ThinkingConfig {
                    thinking_level: level,
                }),
                ..self
            },
            ParamField::VoiceName(name) => Self {
                voice_config: Some(VoiceConfig { voice_name: name }),
                ..self
            },
            ParamField::SystemInstruction => Self {
                system_instruction: true,
                ..self
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn capture<'a>(re: &Regex, body: &'a str) -> Option<&'a str> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// Malformed numbers are dropped, not reported.
fn temperature(body: &str) -> Option<ParamField> {
    capture(&TEMPERATURE_RE, body)?
        .parse()
        .ok()
        .map(ParamField::Temperature)
}

fn max_output_tokens(body: &str) -> Option<ParamField> {
    capture(&MAX_OUTPUT_TOKENS_RE, body)?
        .parse()
        .ok()
        .map(ParamField::MaxOutputTokens)
}

fn aspect_ratio(body: &str) -> Option<ParamField> {
    capture(&ASPECT_RATIO_RE, body).map(|s| ParamField::AspectRatio(s.to_string()))
}

fn image_size(body: &str) -> Option<ParamField> {
    capture(&IMAGE_SIZE_RE, body).map(|s| ParamField::ImageSize(s.to_string()))
}

fn thinking_level(body: &str) -> Option<ParamField> {
    capture(&THINKING_LEVEL_RE, body).map(|s| ParamField::ThinkingLevel(s.to_string()))
}

fn voice_name(body: &str) -> Option<ParamField> {
    capture(&VOICE_NAME_RE, body).map(|s| ParamField::VoiceName(s.to_string()))
}

fn system_instruction(body: &str) -> Option<ParamField> {
    (body.contains("systemInstruction") || body.contains("system_instruction"))
        .then_some(ParamField::SystemInstruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_camel_case_keys() {
        let body = r#"
const config = {
  temperature: 0.4,
  maxOutputTokens: 2048,
  imageConfig: { aspectRatio: "16:9", imageSize: '2K' },
  thinkingConfig: { thinkingLevel: "high" },
};
"#;
        let params = GenerationParams::extract(body);
        assert_eq!(params.temperature, Some(0.4));
        assert_eq!(params.max_output_tokens, Some(2048));
        assert_eq!(
            params.image_config,
            Some(ImageConfig {
                aspect_ratio: Some("16:9".to_string()),
                image_size: Some("2K".to_string()),
            })
        );
        assert_eq!(
            params.thinking_config.map(|t| t.thinking_level),
            Some("high".to_string())
        );
        assert!(params.voice_config.is_none());
        assert!(!params.system_instruction);
    }

    #[test]
    fn test_extract_snake_case_and_quoted_keys() {
        let body = r#"
    payload = {"temperature": 1.0, "max_output_tokens": 512}
    voice_name = "Puck"
    system_instruction = "be brief"
"#;
        let params = GenerationParams::extract(body);
        assert_eq!(params.temperature, Some(1.0));
        assert_eq!(params.max_output_tokens, Some(512));
        assert_eq!(
            params.voice_config,
            Some(VoiceConfig {
                voice_name: "Puck".to_string()
            })
        );
        assert!(params.system_instruction);
    }

    #[test]
    fn test_malformed_numbers_are_omitted() {
        let body = "cfg.temperature = 0.7.1; cfg.maxOutputTokens = 99999999999999999999999;";
        let params = GenerationParams::extract(body);
        assert!(params.temperature.is_none());
        assert!(params.max_output_tokens.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_fields_do_not_clobber_each_other() {
        let params = GenerationParams::default()
            .with(ParamField::ImageSize("4K".to_string()))
            .with(ParamField::AspectRatio("1:1".to_string()));
        let image = params.image_config.unwrap();
        assert_eq!(image.image_size.as_deref(), Some("4K"));
        assert_eq!(image.aspect_ratio.as_deref(), Some("1:1"));
    }

    #[test]
    fn test_serializes_only_found_keys() {
        let params = GenerationParams::default()
            .with(ParamField::Temperature(0.2))
            .with(ParamField::ThinkingLevel("low".to_string()));
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature": 0.2,
                "thinkingConfig": { "thinkingLevel": "low" }
            })
        );
    }
}
