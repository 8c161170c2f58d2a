//! Tests for the report formats against the testdata project.

use std::path::PathBuf;

use gemscan::report::{self, JsonReport};
use gemscan::{ModelCatalog, Runner, ScanResult};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_scan() -> ScanResult {
    let catalog =
        ModelCatalog::load(testdata_path().join("models.json")).expect("should load catalog");
    Runner::new(testdata_path().join("project"))
        .run(&catalog)
        .expect("scan should succeed")
}

#[test]
fn test_json_report_structure() {
    let result = run_scan();
    let json = report::render_json("project", &result).expect("should render json");
    let report: JsonReport = serde_json::from_str(&json).expect("should parse json");

    assert_eq!(report.path, "project");
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.summary.total_calls, 8);
    assert_eq!(report.summary.models_used["gemini-3-pro-preview"], 3);
    assert!(report.diagnostics.is_empty());

    let grid = report
        .calls
        .iter()
        .find(|c| c.function == "generateGridImage")
        .unwrap();
    assert_eq!(grid.dialect, "brace");
    assert_eq!(grid.features, vec!["image"]);
    assert_eq!(grid.model.id, "gemini-3-pro-image-preview");
    assert_eq!(grid.model.rule, "image");
    assert!(grid.model.in_catalog);
    assert_eq!(
        grid.endpoint.as_deref(),
        Some("https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-image-preview:generateContent")
    );
    assert!(!grid.truncated);
}

#[test]
fn test_json_params_use_api_key_names() {
    let result = run_scan();
    let json = report::render_json("project", &result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let draft = value["calls"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["function"] == "draft_report")
        .unwrap();
    assert_eq!(draft["params"]["maxOutputTokens"], 1024);
    assert_eq!(draft["dialect"], "indent");
}

#[test]
fn test_rest_example_for_streaming_endpoint() {
    let catalog =
        ModelCatalog::load(testdata_path().join("models.json")).expect("should load catalog");
    let result = Runner::new(".").scan_source(
        "live.ts",
        gemscan::Dialect::BraceDelimited,
        "function live() {\n  const model = 'gemini-2.5-flash-stream';\n  return fetch(url);\n}\n",
        &catalog,
    );
    let curl = report::rest_example(&result.results[0]).unwrap();
    assert!(curl.contains("models/gemini-2.5-flash-stream:streamGenerateContent"));
    assert!(curl.contains("-d '{"));
}

#[test]
fn test_markdown_report_contents() {
    let result = run_scan();
    let md = report::render_markdown("project", &result);

    assert!(md.starts_with("# Gemini API usage: project"));
    assert!(md.contains("Scanned 2 files, found 8 call sites."));
    assert!(md.contains("| `gemini-3-pro-preview` | 3 | yes |"));
    assert!(md.contains("### `narrate` (services/gemini.ts:48)"));
    assert!(md.contains("- Image parameters: photo, maskBase64"));
    assert!(md.contains("x-goog-api-key: $GEMINI_API_KEY"));
    assert!(md.contains("Example response:"));
}

#[test]
fn test_truncated_body_is_reported() {
    let mut body = String::from("function huge() {\n  fetch(url);\n");
    for _ in 0..200 {
        body.push_str("  const padding = { a: 1 };\n");
    }
    body.push_str("}\n");

    let config = gemscan::ScanConfig {
        lookahead_window: 512,
        ..Default::default()
    };
    let result = Runner::new(".").with_config(config).scan_source(
        "huge.js",
        gemscan::Dialect::BraceDelimited,
        &body,
        &ModelCatalog::empty(),
    );
    let call = result.results.iter().find(|r| r.function == "huge").unwrap();
    assert!(call.truncated);

    let json = report::render_json("huge.js", &result).unwrap();
    let report: JsonReport = serde_json::from_str(&json).unwrap();
    assert!(report.calls.iter().any(|c| c.function == "huge" && c.truncated));

    let md = report::render_markdown("huge.js", &result);
    assert!(md.contains("Body truncated"));
}

#[test]
fn test_pretty_report_without_color() {
    colored::control::set_override(false);
    let result = run_scan();
    let mut buf = Vec::new();
    report::write_pretty(&mut buf, "project", &result).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.contains("gemscan v"));
    assert!(text.contains("Calls (8):"));
    assert!(text.contains("gemini-2.5-flash-preview-tts"));
}
