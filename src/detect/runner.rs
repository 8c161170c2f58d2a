//! Scan runner that walks a tree and classifies every call site.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::ModelCatalog;
use crate::config::ScanConfig;
use crate::parser::{BoundaryExtractor, BraceExtractor, CandidateFunction, Dialect, IndentExtractor};

use super::{extract_features, AnalysisResult, ModelMatcher, ScanDiagnostic, ScanResult};

/// Walks a root directory and produces one `AnalysisResult` per call site.
pub struct Runner {
    root: PathBuf,
    config: ScanConfig,
}

impl Runner {
    /// Create a runner with the default configuration.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Scan every supported file under the root.
    ///
    /// Unreadable files are recorded as diagnostics and skipped.
    pub fn run(&self, catalog: &ModelCatalog) -> anyhow::Result<ScanResult> {
        let mut result = ScanResult::new();
        let files = self.collect_files(&mut result.diagnostics)?;
        let matcher = ModelMatcher::new(catalog);
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (path, dialect) in files {
            let rel = self.relative(&path);
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(file = %rel, error = %e, "skipping unreadable file");
                    result.diagnostics.push(ScanDiagnostic {
                        file: rel,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            result.scanned += 1;

            let calls = self.analyze_source(&rel, dialect, &text, &matcher);
            push_unique(&mut result.results, &mut seen, calls);
        }

        tracing::info!(
            files = result.scanned,
            calls = result.results.len(),
            diagnostics = result.diagnostics.len(),
            "scan complete"
        );
        Ok(result)
    }

    /// Scan one in-memory text as if it were a file named `label`.
    pub fn scan_source(
        &self,
        label: &str,
        dialect: Dialect,
        text: &str,
        catalog: &ModelCatalog,
    ) -> ScanResult {
        let matcher = ModelMatcher::new(catalog);
        let mut result = ScanResult::new();
        let mut seen = HashSet::new();
        let calls = self.analyze_source(label, dialect, text, &matcher);
        push_unique(&mut result.results, &mut seen, calls);
        result.scanned = 1;
        result
    }

    /// Classify every candidate in one text. No deduplication is applied.
    pub fn analyze_source(
        &self,
        file: &str,
        dialect: Dialect,
        text: &str,
        matcher: &ModelMatcher<'_>,
    ) -> Vec<AnalysisResult> {
        let brace = BraceExtractor::new(self.config.lookahead_window, self.config.arrow_window);
        let extractor: &dyn BoundaryExtractor = match dialect {
            Dialect::BraceDelimited => &brace,
            Dialect::IndentDelimited => &IndentExtractor,
        };

        extractor
            .extract(file, text)
            .filter_map(|candidate| analyze_candidate(candidate, dialect, matcher))
            .collect()
    }

    /// Collect files to scan in a deterministic order.
    fn collect_files(
        &self,
        diagnostics: &mut Vec<ScanDiagnostic>,
    ) -> anyhow::Result<Vec<(PathBuf, Dialect)>> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| anyhow::anyhow!("cannot access {}: {}", self.root.display(), e))?;

        if metadata.is_file() {
            return Ok(dialect_of(&self.root)
                .map(|d| vec![(self.root.clone(), d)])
                .unwrap_or_default());
        }

        let excluded = self.config.exclusion_matcher();
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                !self.config.is_skipped_dir(&e.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let file = e
                        .path()
                        .map(|p| self.relative(p))
                        .unwrap_or_default();
                    tracing::warn!(file = %file, error = %e, "skipping unreadable entry");
                    diagnostics.push(ScanDiagnostic {
                        file,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(dialect) = dialect_of(path) else {
                continue;
            };
            if excluded.is_match(self.relative(path)) {
                continue;
            }
            files.push((path.to_path_buf(), dialect));
        }

        Ok(files)
    }

    /// Path relative to the root with `/` separators. A file root is
    /// reported by its file name.
    fn relative(&self, path: &Path) -> String {
        let rel = match path.strip_prefix(&self.root) {
            Ok(p) if !p.as_os_str().is_empty() => p,
            _ => path.file_name().map(Path::new).unwrap_or(path),
        };
        rel.to_string_lossy().replace('\\', "/")
    }
}

/// Keep the first result per (file, function).
fn push_unique(
    results: &mut Vec<AnalysisResult>,
    seen: &mut HashSet<(String, String)>,
    calls: Vec<AnalysisResult>,
) {
    for call in calls {
        if seen.insert((call.file.clone(), call.function.clone())) {
            results.push(call);
        } else {
            tracing::debug!(file = %call.file, function = %call.function, "duplicate call site dropped");
        }
    }
}

fn dialect_of(path: &Path) -> Option<Dialect> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Dialect::from_extension)
}

/// Extract features, match a model and synthesize the request for one
/// candidate. Returns `None` when the candidate is not a call site.
pub fn analyze_candidate(
    candidate: CandidateFunction,
    dialect: Dialect,
    matcher: &ModelMatcher<'_>,
) -> Option<AnalysisResult> {
    let features = extract_features(&candidate.body, &candidate.signature)?;
    let matched = matcher.match_model(&candidate.name, &features);
    tracing::debug!(
        file = %candidate.file,
        function = %candidate.name,
        model = %matched.model,
        rule = matched.rule,
        "classified call site"
    );
    Some(AnalysisResult::new(candidate, dialect, features, matched))
}
