//! Model catalog: the registry of known model definitions.
//!
//! A catalog is loaded once from a JSON or YAML document and never mutated.
//! Lookups are by exact identifier, or case-insensitively for identifiers
//! named explicitly in scanned code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading a catalog document.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("reading catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported catalog format {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}

/// One model definition as it appears in the catalog document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelDefinition {
    /// Unique key, filled from the map key of the document.
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub request_template: serde_json::Value,
    #[serde(default)]
    pub response_example: serde_json::Value,
    #[serde(default)]
    pub extract_path: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub default_params: BTreeMap<String, serde_json::Value>,
}

fn default_api_version() -> String {
    "v1beta".to_string()
}

fn default_endpoint() -> String {
    "generateContent".to_string()
}

impl ModelDefinition {
    /// Whether the category tag marks this model as image-capable.
    pub fn is_image_capable(&self) -> bool {
        self.category.to_lowercase().contains("image")
    }
}

/// Top-level shape of a catalog document.
#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    models: BTreeMap<String, ModelDefinition>,
}

/// Immutable set of model definitions keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, Arc<ModelDefinition>>,
}

impl ModelCatalog {
    /// An empty catalog. Every lookup yields `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalog from a file, picking the parser from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "json" => Self::from_json_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Load a catalog, falling back to an empty one on any failure.
    ///
    /// The failure is logged; scanning continues and every match resolves
    /// to an absent definition.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.as_ref().display(),
                    models = catalog.len(),
                    "loaded model catalog"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog unavailable, continuing with an empty catalog");
                Self::empty()
            }
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(content)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_yaml::from_str(content)?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: CatalogDocument) -> Self {
        let models = doc
            .models
            .into_iter()
            .map(|(id, mut def)| {
                def.id = id.clone();
                (id, Arc::new(def))
            })
            .collect();
        Self { models }
    }

    /// Exact-key lookup.
    pub fn get(&self, id: &str) -> Option<Arc<ModelDefinition>> {
        self.models.get(id).cloned()
    }

    /// Case-insensitive lookup. Returns the catalog's own spelling of the key.
    pub fn find_ignore_case(&self, id: &str) -> Option<(&str, Arc<ModelDefinition>)> {
        self.models
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(key, def)| (key.as_str(), Arc::clone(def)))
    }

    /// All definitions in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
