//! Integration tests for the full scan pipeline.
//!
//! These tests run the scanner against the testdata project and check that
//! every call site is found, classified and matched as expected.

use std::path::PathBuf;

use gemscan::detect::matcher::{
    DEFAULT_MODEL, IMAGE_MODEL, IMAGE_PRO_MODEL, MULTIMODAL_MODEL, STRUCTURED_MODEL, TTS_MODEL,
};
use gemscan::detect::{AnalysisResult, ScanResult};
use gemscan::{Dialect, ModelCatalog, Runner, ScanConfig};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn load_catalog() -> ModelCatalog {
    ModelCatalog::load(testdata_path().join("models.json")).expect("should load catalog")
}

fn run_scan() -> ScanResult {
    Runner::new(testdata_path().join("project"))
        .run(&load_catalog())
        .expect("scan should succeed")
}

fn find<'a>(result: &'a ScanResult, function: &str) -> &'a AnalysisResult {
    result
        .results
        .iter()
        .find(|r| r.function == function)
        .unwrap_or_else(|| panic!("expected call site {}", function))
}

#[test]
fn test_finds_every_call_site() {
    let result = run_scan();

    assert_eq!(result.scanned, 2, "node_modules should be skipped");
    assert!(result.diagnostics.is_empty());

    let mut names: Vec<&str> = result.results.iter().map(|r| r.function.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "describeClip",
            "draft_report",
            "editPhoto",
            "generateGridImage",
            "narrate",
            "streamQuizQuestions",
            "summarizeArticle",
            "transcribe_audio",
        ]
    );
}

#[test]
fn test_files_are_scanned_in_name_order() {
    let result = run_scan();
    let files: Vec<&str> = result.results.iter().map(|r| r.file.as_str()).collect();
    let first_ts = files
        .iter()
        .position(|f| *f == "services/gemini.ts")
        .unwrap();
    assert!(files[..first_ts].iter().all(|f| *f == "scripts/client.py"));
}

#[test]
fn test_explicit_model_is_used_verbatim() {
    let result = run_scan();
    let call = find(&result, "summarizeArticle");
    assert_eq!(call.matched.model, "gemini-3-pro-preview");
    assert_eq!(call.matched.rule, "explicit");
    assert!(call.matched.definition.is_some());
    assert_eq!(call.line, 5);
}

#[test]
fn test_structured_output_beats_streaming() {
    let result = run_scan();
    let call = find(&result, "streamQuizQuestions");
    assert!(call.features.has_stream);
    assert!(call.features.has_structured);
    assert_eq!(call.matched.model, STRUCTURED_MODEL);
    assert_eq!(
        call.request["generationConfig"]["responseMimeType"],
        "application/json"
    );
}

#[test]
fn test_grid_image_uses_pro_image_model() {
    let result = run_scan();
    let call = find(&result, "generateGridImage");
    assert!(call.features.has_image);
    assert_eq!(call.features.image_params, vec!["referenceImage"]);
    assert_eq!(call.matched.model, IMAGE_PRO_MODEL);
    assert_eq!(call.line, 29);

    let parts = call.request["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert!(parts[0].get("inline_data").is_some());
    assert_eq!(
        call.request["generationConfig"]["imageConfig"]["aspectRatio"],
        "16:9"
    );
    assert_eq!(
        call.request["generationConfig"]["imageConfig"]["imageSize"],
        "4K"
    );
}

#[test]
fn test_mask_parameter_is_image_bearing() {
    let result = run_scan();
    let call = find(&result, "editPhoto");
    assert_eq!(call.features.image_params, vec!["photo", "maskBase64"]);
    assert_eq!(call.matched.model, IMAGE_MODEL);
}

#[test]
fn test_tts_method_in_class() {
    let result = run_scan();
    let call = find(&result, "narrate");
    assert_eq!(call.line, 48);
    assert_eq!(call.matched.model, TTS_MODEL);
    assert_eq!(call.request["generationConfig"]["responseModalities"][0], "AUDIO");
    assert_eq!(
        call.request["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
            ["voiceName"],
        "Charon"
    );
}

#[test]
fn test_media_calls_use_multimodal_model() {
    let result = run_scan();
    assert_eq!(find(&result, "describeClip").matched.model, MULTIMODAL_MODEL);

    let audio = find(&result, "transcribe_audio");
    assert_eq!(audio.dialect, Dialect::IndentDelimited);
    assert_eq!(audio.matched.model, MULTIMODAL_MODEL);
}

#[test]
fn test_python_method_params_reach_request() {
    let result = run_scan();
    let call = find(&result, "draft_report");
    assert_eq!(call.line, 31);
    assert_eq!(call.matched.model, "gemini-3-pro-preview");
    assert_eq!(call.features.params.temperature, Some(0.2));
    assert_eq!(call.features.params.max_output_tokens, Some(1024));
    assert_eq!(
        call.request["generationConfig"],
        serde_json::json!({ "temperature": 0.2, "maxOutputTokens": 1024 })
    );
}

#[test]
fn test_model_usage_summary() {
    let result = run_scan();
    let usage = result.model_usage();
    assert_eq!(usage[0], (STRUCTURED_MODEL.to_string(), 3));
    assert_eq!(usage[1], (MULTIMODAL_MODEL.to_string(), 2));
    assert_eq!(usage.iter().map(|(_, n)| n).sum::<usize>(), result.results.len());
}

#[test]
fn test_config_file_restricts_scan() {
    let config = ScanConfig::parse_file(testdata_path().join("gemscan.yaml"))
        .expect("should parse config");
    assert_eq!(config.lookahead_window, 4096);

    let result = Runner::new(testdata_path().join("project"))
        .with_config(config)
        .run(&load_catalog())
        .expect("scan should succeed");
    assert_eq!(result.scanned, 1);
    assert!(result.results.iter().all(|r| r.file == "services/gemini.ts"));
}

#[test]
fn test_yaml_catalog_and_empty_catalog() {
    let yaml = ModelCatalog::load(testdata_path().join("models.yaml")).expect("should load yaml");
    let result = Runner::new(testdata_path().join("project"))
        .run(&yaml)
        .expect("scan should succeed");

    let edit = find(&result, "editPhoto");
    assert_eq!(edit.matched.definition.as_ref().unwrap().api_version, "v1alpha");
    assert!(find(&result, "narrate").matched.definition.is_none());

    let result = Runner::new(testdata_path().join("project"))
        .run(&ModelCatalog::empty())
        .expect("scan should succeed");
    assert_eq!(result.results.len(), 8);
    assert!(result.results.iter().all(|r| r.matched.definition.is_none()));
    assert!(result.results.iter().all(|r| r.matched.model != DEFAULT_MODEL));
}
