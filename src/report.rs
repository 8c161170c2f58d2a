//! Output formatting for scan results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - Markdown: a model-usage table followed by per-call details

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use crate::detect::{AnalysisResult, GenerationParams, ScanResult};

const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// The REST endpoint a result would be sent to, if its model is in the catalog.
pub fn endpoint_url(result: &AnalysisResult) -> Option<String> {
    let def = result.matched.definition.as_ref()?;
    Some(format!(
        "{}/{}/models/{}:{}",
        API_BASE, def.api_version, result.matched.model, def.endpoint
    ))
}

/// A `curl` command that issues the synthesized request.
///
/// Returns `None` when the matched model has no catalog definition.
pub fn rest_example(result: &AnalysisResult) -> Option<String> {
    let url = endpoint_url(result)?;
    let body = serde_json::to_string_pretty(&result.request).ok()?;
    Some(format!(
        "curl \"{}\" \\\n  -H \"x-goog-api-key: $GEMINI_API_KEY\" \\\n  -H \"Content-Type: application/json\" \\\n  -d '{}'",
        url,
        body.replace('\'', "'\\''")
    ))
}

/// The catalog's example response for the matched model, pretty-printed.
pub fn response_example(result: &AnalysisResult) -> Option<String> {
    let def = result.matched.definition.as_ref()?;
    let empty = match &def.response_example {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return None;
    }
    serde_json::to_string_pretty(&def.response_example).ok()
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub files_scanned: usize,
    pub summary: JsonSummary,
    pub calls: Vec<JsonCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub total_calls: usize,
    pub models_used: BTreeMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonCall {
    pub function: String,
    pub file: String,
    pub line: usize,
    pub dialect: String,
    pub features: Vec<String>,
    pub params: GenerationParams,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_params: Vec<String>,
    pub model: JsonModel,
    pub request: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub truncated: bool,
}

#[derive(Serialize, Deserialize)]
pub struct JsonModel {
    pub id: String,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub in_catalog: bool,
}

#[derive(Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub file: String,
    pub message: String,
}

/// Build the JSON report structure.
pub fn json_report(path: &str, scan: &ScanResult) -> JsonReport {
    let calls = scan.results.iter().map(call_to_json).collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_scanned: scan.scanned,
        summary: JsonSummary {
            total_calls: scan.results.len(),
            models_used: scan.model_usage().into_iter().collect(),
        },
        calls,
        diagnostics: scan
            .diagnostics
            .iter()
            .map(|d| JsonDiagnostic {
                file: d.file.clone(),
                message: d.message.clone(),
            })
            .collect(),
    }
}

/// Render results as pretty-printed JSON.
pub fn render_json(path: &str, scan: &ScanResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&json_report(path, scan))?)
}

fn call_to_json(r: &AnalysisResult) -> JsonCall {
    let def = r.matched.definition.as_ref();
    JsonCall {
        function: r.function.clone(),
        file: r.file.clone(),
        line: r.line,
        dialect: r.dialect.to_string(),
        features: r.features.labels().iter().map(|s| s.to_string()).collect(),
        params: r.features.params.clone(),
        image_params: r.features.image_params.clone(),
        model: JsonModel {
            id: r.matched.model.clone(),
            rule: r.matched.rule.to_string(),
            name: def.map(|d| d.name.clone()).filter(|n| !n.is_empty()),
            category: def.map(|d| d.category.clone()).filter(|c| !c.is_empty()),
            in_catalog: def.is_some(),
        },
        request: r.request.clone(),
        endpoint: endpoint_url(r),
        truncated: r.truncated,
    }
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Render results as a Markdown document.
pub fn render_markdown(path: &str, scan: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Gemini API usage: {}", path);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Scanned {} files, found {} call sites.",
        scan.scanned,
        scan.results.len()
    );
    let _ = writeln!(out);

    if scan.results.is_empty() {
        let _ = writeln!(out, "No API calls found.");
        return out;
    }

    let _ = writeln!(out, "## Models");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Model | Calls | In catalog |");
    let _ = writeln!(out, "|-------|-------|------------|");
    for (model, count) in scan.model_usage() {
        let known = scan
            .results
            .iter()
            .any(|r| r.matched.model == model && r.matched.definition.is_some());
        let _ = writeln!(
            out,
            "| `{}` | {} | {} |",
            model,
            count,
            if known { "yes" } else { "no" }
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Calls");
    for r in &scan.results {
        let _ = writeln!(out);
        let _ = writeln!(out, "### `{}` ({}:{})", r.function, r.file, r.line);
        let _ = writeln!(out);
        let _ = writeln!(out, "- Model: `{}` (rule: {})", r.matched.model, r.matched.rule);
        let labels = r.features.labels();
        if !labels.is_empty() {
            let _ = writeln!(out, "- Features: {}", labels.join(", "));
        }
        if !r.features.image_params.is_empty() {
            let _ = writeln!(out, "- Image parameters: {}", r.features.image_params.join(", "));
        }
        if r.truncated {
            let _ = writeln!(out, "- Body truncated at the lookahead window");
        }

        if let Some(curl) = rest_example(r) {
            let _ = writeln!(out);
            let _ = writeln!(out, "```bash\n{}\n```", curl);
        } else if let Ok(body) = serde_json::to_string_pretty(&r.request) {
            let _ = writeln!(out);
            let _ = writeln!(out, "```json\n{}\n```", body);
        }

        if let Some(response) = response_example(r) {
            let _ = writeln!(out);
            let _ = writeln!(out, "Example response:");
            let _ = writeln!(out);
            let _ = writeln!(out, "```json\n{}\n```", response);
        }
    }

    if scan.has_diagnostics() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Skipped files");
        let _ = writeln!(out);
        for d in &scan.diagnostics {
            let _ = writeln!(out, "- `{}`: {}", d.file, d.message);
        }
    }

    out
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty<W: Write>(out: &mut W, path: &str, scan: &ScanResult) -> std::io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "gemscan".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), path)?;
    writeln!(
        out,
        "  {}{} files, {} call sites",
        "Found:    ".dimmed(),
        scan.scanned,
        scan.results.len()
    )?;
    writeln!(out)?;

    if scan.results.is_empty() {
        writeln!(out, "  {}", "No API calls found.".yellow())?;
        writeln!(out)?;
    } else {
        write_usage(out, scan)?;
        writeln!(out)?;
        write_calls(out, scan)?;
    }

    if scan.has_diagnostics() {
        writeln!(out, "  {} ({}):", "Skipped".dimmed(), scan.diagnostics.len())?;
        for d in &scan.diagnostics {
            writeln!(out, "    {}  {}", d.file.blue(), d.message.dimmed())?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_usage<W: Write>(out: &mut W, scan: &ScanResult) -> std::io::Result<()> {
    writeln!(out, "  {}", "Models:".bold())?;
    for (model, count) in scan.model_usage() {
        let plural = if count != 1 { "s" } else { "" };
        writeln!(out, "    {:<32} {:>3} call{}", model, count, plural)?;
    }
    Ok(())
}

fn write_calls<W: Write>(out: &mut W, scan: &ScanResult) -> std::io::Result<()> {
    writeln!(out, "  {} ({}):", "Calls".bold(), scan.results.len())?;
    writeln!(out)?;

    for r in &scan.results {
        write!(out, "    {:<28}", r.function.bold())?;
        write!(out, "{}", r.file.blue())?;
        writeln!(out, "{}", format!(":{}", r.line).dimmed())?;

        let model = if r.matched.definition.is_some() {
            r.matched.model.green()
        } else {
            r.matched.model.yellow()
        };
        writeln!(
            out,
            "            {} {}",
            model,
            format!("({})", r.matched.rule).dimmed()
        )?;

        let labels = r.features.labels();
        if !labels.is_empty() {
            writeln!(out, "            {}", labels.join(", ").dimmed())?;
        }
        if r.truncated {
            writeln!(out, "            {}", "body truncated".yellow())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelCatalog;
    use crate::detect::Runner;
    use crate::parser::Dialect;

    const CATALOG: &str = r#"{"models": {
        "gemini-3-pro-preview": {
            "name": "Gemini 3 Pro",
            "category": "text",
            "response_example": {"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}
        }
    }}"#;

    fn scan(text: &str) -> ScanResult {
        let catalog = ModelCatalog::from_json_str(CATALOG).unwrap();
        Runner::new(".").scan_source("svc.ts", Dialect::BraceDelimited, text, &catalog)
    }

    #[test]
    fn test_rest_example_for_catalog_model() {
        let result = scan(
            "function ask(p: string) {\n  const model = \"gemini-3-pro-preview\";\n  return fetch(\"it's\");\n}\n",
        );
        let curl = rest_example(&result.results[0]).unwrap();
        assert!(curl.starts_with(
            "curl \"https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent\""
        ));
        assert!(curl.contains("x-goog-api-key: $GEMINI_API_KEY"));
        assert!(curl.contains("{{prompt}}"));

        let response = response_example(&result.results[0]).unwrap();
        assert!(response.contains("\"candidates\""));
    }

    #[test]
    fn test_rest_example_absent_without_definition() {
        let result = scan("function ask() { return fetch(x); }");
        assert!(rest_example(&result.results[0]).is_none());
        assert!(response_example(&result.results[0]).is_none());
        assert!(endpoint_url(&result.results[0]).is_none());
    }

    #[test]
    fn test_single_quotes_are_shell_escaped() {
        let catalog = ModelCatalog::from_json_str(
            r#"{"models": {"gemini-2.5-flash-preview-tts": {"category": "tts"}}}"#,
        )
        .unwrap();
        let mut result = Runner::new(".").scan_source(
            "a.ts",
            Dialect::BraceDelimited,
            "function say() { return fetch(tts); }",
            &catalog,
        );
        let call = &mut result.results[0];
        call.request = serde_json::json!({ "text": "it's" });
        let curl = rest_example(call).unwrap();
        assert!(curl.contains("it'\\''s"));
    }

    #[test]
    fn test_json_report_summary() {
        let result = scan(
            "function a() { return fetch(x); }\nfunction b() { return fetch(y); }\nfunction c() { const model = 'gemini-3-pro-preview'; return fetch(z); }\n",
        );
        let json = render_json("src", &result).unwrap();
        let report: JsonReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.summary.total_calls, 3);
        assert_eq!(report.summary.models_used["gemini-2.0-flash-exp"], 2);
        assert_eq!(report.summary.models_used["gemini-3-pro-preview"], 1);
        let c = report.calls.iter().find(|c| c.function == "c").unwrap();
        assert!(c.model.in_catalog);
        assert_eq!(c.model.name.as_deref(), Some("Gemini 3 Pro"));
        assert!(c.endpoint.is_some());
        assert!(!c.truncated);
    }

    #[test]
    fn test_markdown_lists_models_and_calls() {
        let result = scan("function a() { return fetch(x, { inlineData }); }");
        let md = render_markdown("src", &result);
        assert!(md.contains("| `gemini-2.5-flash-image` | 1 | no |"));
        assert!(md.contains("### `a` (svc.ts:1)"));
        assert!(md.contains("- Features: image"));
        assert!(md.contains("```json"));
    }

    #[test]
    fn test_markdown_empty_scan() {
        let md = render_markdown("src", &ScanResult::new());
        assert!(md.contains("No API calls found."));
        assert!(!md.contains("## Models"));
    }

    #[test]
    fn test_pretty_output() {
        colored::control::set_override(false);
        let result = scan("function a() { return fetch(x); }");
        let mut buf = Vec::new();
        write_pretty(&mut buf, "src", &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Scanning: src"));
        assert!(text.contains("gemini-2.0-flash-exp"));
        assert!(text.contains("(fallback)"));
    }
}
