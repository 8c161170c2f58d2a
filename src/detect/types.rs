//! Core types for scan results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::params::GenerationParams;
use crate::catalog::ModelDefinition;
use crate::parser::{CandidateFunction, Dialect};

/// Capability flags and parameters derived from one call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub has_image: bool,
    pub has_audio: bool,
    pub has_video: bool,
    pub has_stream: bool,
    pub has_tts: bool,
    pub has_structured: bool,
    /// Generation parameters captured from the body
    pub params: GenerationParams,
    /// Model identifier named in the code itself
    pub explicit_model: Option<String>,
    /// Parameters inferred to carry image data
    pub image_params: Vec<String>,
}

impl ExtractedFeatures {
    /// Short labels for the flags that are set, in a fixed order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.has_image, "image"),
            (self.has_audio, "audio"),
            (self.has_video, "video"),
            (self.has_stream, "stream"),
            (self.has_tts, "tts"),
            (self.has_structured, "structured"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}

/// The model a call site resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Resolved identifier; never empty
    pub model: String,
    /// Catalog entry, absent when the identifier is not in the catalog
    pub definition: Option<Arc<ModelDefinition>>,
    /// Name of the rule that produced the match
    pub rule: &'static str,
}

/// One classified call site.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub function: String,
    pub file: String,
    pub line: usize,
    pub dialect: Dialect,
    pub features: ExtractedFeatures,
    pub matched: MatchResult,
    /// Synthesized request body
    pub request: serde_json::Value,
    /// The body was cut off at the lookahead window
    pub truncated: bool,
}

impl AnalysisResult {
    /// Build a result from a candidate and its classification. The request
    /// body is synthesized here so the record is complete once created.
    pub fn new(
        candidate: CandidateFunction,
        dialect: Dialect,
        features: ExtractedFeatures,
        matched: MatchResult,
    ) -> Self {
        let mut result = Self {
            function: candidate.name,
            file: candidate.file,
            line: candidate.line,
            dialect,
            features,
            matched,
            request: serde_json::Value::Null,
            truncated: candidate.truncated,
        };
        result.request = crate::synth::synthesize_for(&result);
        result
    }

    /// Deduplication key.
    pub fn key(&self) -> (&str, &str) {
        (&self.file, &self.function)
    }
}

/// A non-fatal problem met while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    pub file: String,
    pub message: String,
}

/// Results of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Call sites in scan order, one per (file, function)
    pub results: Vec<AnalysisResult>,
    /// Number of files read successfully
    pub scanned: usize,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call counts per model, most used first, ties by identifier.
    pub fn model_usage(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.matched.model.as_str()).or_default() += 1;
        }
        let mut usage: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(model, n)| (model.to_string(), n))
            .collect();
        usage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        usage
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
