//! Function catalog: the fixed set of business intents the router can select.
//!
//! Each entry carries a human description, a technical description, JSON
//! metadata blobs (opaque to the router) and example utterances. The catalog
//! is read-only after loading; the semantic index is rebuilt wholesale from
//! it, never patched incrementally.

pub mod seed;

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// How many examples feed the embedding profile text.
const PROFILE_EXAMPLE_LIMIT: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Unique identifier, immutable after seeding.
    pub name: String,
    pub business_desc: String,
    pub technical_desc: String,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Value,
    #[serde(default)]
    pub enums: Value,
    pub query_examples: Vec<String>,
}

impl FunctionDefinition {
    /// Canonical profile text used for the persisted embedding of the whole
    /// function: low noise, heavy on intent and examples.
    pub fn profile_text(&self) -> String {
        let examples = self
            .query_examples
            .iter()
            .take(PROFILE_EXAMPLE_LIMIT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "FUNCION: {}\nINTENCION_NEGOCIO: {}\nDESCRIPCION_TECNICA: {}\nEJEMPLOS: {}\n\
             KEYWORDS: pedido, precio, promo, horario, sucursal, delivery, cancelar, estado, registrar, recomendacion",
            self.name, self.business_desc, self.technical_desc, examples
        )
    }

    /// Example utterances after splitting compound entries into atomic ones.
    pub fn atomic_examples(&self) -> Vec<String> {
        split_examples(&self.query_examples)
    }
}

/// Split compound examples on `/` and `|`, trim whitespace, discard empties.
/// Some seeded entries pack several utterances into one string.
pub fn split_examples(examples: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for example in examples {
        let example = example.trim();
        if example.is_empty() {
            continue;
        }
        for part in example.replace('|', "/").split('/') {
            let part = part.trim();
            if !part.is_empty() {
                out.push(part.to_string());
            }
        }
    }
    out
}

/// Ordered, read-only set of function definitions. Iteration order is the
/// catalog insertion order, which the router uses to break score ties.
#[derive(Debug, Clone)]
pub struct Catalog {
    functions: Vec<FunctionDefinition>,
}

impl Catalog {
    /// The built-in bakery catalog (12 functions).
    pub fn seed() -> Self {
        Self {
            functions: seed::seed_functions(),
        }
    }

    /// Load a catalog from a JSON array of function records.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ValidationError(format!("Failed to read catalog file: {}", e))
        })?;
        let functions: Vec<FunctionDefinition> = serde_json::from_str(&raw).map_err(|e| {
            AppError::ValidationError(format!("Failed to parse catalog file: {}", e))
        })?;

        tracing::info!(
            path = %path.display(),
            functions = functions.len(),
            "Catalog loaded from file"
        );

        Ok(Self { functions })
    }

    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.functions
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
