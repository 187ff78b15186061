//! Belief Catalog
//!
//! The seed beliefs, loaded once per run from a JSON file of the form
//! `{"beliefs": ["...", ...]}`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::CatalogError;

/// Default catalog file name.
pub const DEFAULT_BELIEFS_FILE: &str = "money-philosophy.json";

/// Ordered, immutable list of canonical beliefs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefCatalog {
    beliefs: Vec<String>,
}

impl BeliefCatalog {
    /// Builds a catalog from an in-memory list. Fails if the list is empty.
    pub fn new(beliefs: Vec<String>) -> Result<Self, CatalogError> {
        if beliefs.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { beliefs })
    }

    /// Loads a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses catalog JSON.
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let parsed: BeliefCatalog = serde_json::from_str(content)?;
        Self::new(parsed.beliefs)
    }

    pub fn beliefs(&self) -> &[String] {
        &self.beliefs
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Position of `belief` in the catalog, if it is one of the seed beliefs.
    pub fn index_of(&self, belief: &str) -> Option<usize> {
        self.beliefs.iter().position(|b| b == belief)
    }

    /// True if `belief` is still verbatim one of the seed beliefs.
    pub fn is_original(&self, belief: &str) -> bool {
        self.index_of(belief).is_some()
    }
}
