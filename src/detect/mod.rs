//! Call-site detection: feature extraction, model matching and the scan runner.

mod features;
pub mod matcher;
mod params;
mod runner;
mod types;

pub use features::{explicit_model, extract_features, has_api_evidence, image_params};
pub use matcher::{MatchInput, MatchRule, ModelMatcher, Resolution, DEFAULT_RULES};
pub use params::{GenerationParams, ImageConfig, ParamField, ThinkingConfig, VoiceConfig};
pub use runner::{analyze_candidate, Runner};
pub use types::{AnalysisResult, ExtractedFeatures, MatchResult, ScanDiagnostic, ScanResult};
