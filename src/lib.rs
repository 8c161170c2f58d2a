//! gemscan - find Gemini API call sites and the models they need.
//!
//! gemscan statically scans TypeScript/JavaScript and Python sources for
//! functions that call the Gemini API. Each call site is classified by the
//! capabilities it exercises, resolved to a model from a catalog and given a
//! synthesized example request.
//!
//! # Architecture
//!
//! - `parser`: function boundary extraction, one strategy per dialect
//! - `detect`: feature extraction, model matching and the scan runner
//! - `synth`: example request bodies for classified call sites
//! - `catalog`: the model catalog
//! - `config`: scan configuration
//! - `report`: output formatting (pretty, JSON, Markdown)
//!
//! ```no_run
//! use gemscan::{ModelCatalog, Runner};
//!
//! let catalog = ModelCatalog::load_or_empty("gemini_models_config.json");
//! let result = Runner::new("src").run(&catalog)?;
//! for call in &result.results {
//!     println!("{} -> {}", call.function, call.matched.model);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod detect;
pub mod parser;
pub mod report;
pub mod synth;

pub use catalog::{CatalogError, ModelCatalog, ModelDefinition};
pub use config::{ConfigError, ScanConfig};
pub use detect::{
    AnalysisResult, ExtractedFeatures, GenerationParams, MatchResult, ModelMatcher, Runner,
    ScanDiagnostic, ScanResult,
};
pub use parser::{BoundaryExtractor, CandidateFunction, Dialect};
pub use synth::synthesize;
