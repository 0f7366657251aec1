#![deny(missing_docs)]

//! # Specification Document
//!
//! Thin read-only view over an OpenAPI document. Nothing is validated beyond
//! the presence of `components.schemas`; schema bodies stay opaque.

use crate::error::{AppError, AppResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A loaded OpenAPI document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    /// Wraps an already parsed document, checking that `components.schemas` is a mapping.
    pub fn from_value(root: Value) -> AppResult<Self> {
        match root.pointer("/components/schemas") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(AppError::Spec(
                    "`components.schemas` must be a mapping".into(),
                ))
            }
            None => return Err(AppError::Spec("missing `components.schemas`".into())),
        }
        Ok(Self { root })
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| AppError::Spec(format!("Failed to parse JSON: {}", e)))?;
        Self::from_value(root)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let root: Value = serde_yaml::from_str(content)
            .map_err(|e| AppError::Spec(format!("Failed to parse YAML: {}", e)))?;
        Self::from_value(root)
    }

    /// Loads a document from disk. `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Spec(format!("Failed to read specification {:?}: {}", path, e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Schema objects keyed by name, in declared order.
    pub fn schemas(&self) -> &Map<String, Value> {
        match self.root.pointer("/components/schemas") {
            Some(Value::Object(map)) => map,
            // checked in `from_value`, and the document is never mutated
            _ => unreachable!("components.schemas verified at construction"),
        }
    }

    /// Schema names in declared order.
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas().keys().map(String::as_str)
    }
}
