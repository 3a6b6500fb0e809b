//! Semantic index over the function catalog.
//!
//! One description document plus one document per atomic example utterance,
//! each embedded and tagged with its owning function. The index is immutable
//! once built and is always rebuilt wholesale when the catalog changes.

use crate::catalog::Catalog;
use crate::embedding::Embedder;
use crate::error::{AppError, Result};
use crate::persistence::{save_embeddings_cache, try_load_embeddings_cache};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Description,
    Example,
}

/// A single indexed document. `function` is a back-reference to the owning
/// catalog entry, not ownership.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedDocument {
    pub text: String,
    pub function: String,
    pub kind: DocKind,
}

pub struct SemanticIndex {
    documents: Vec<IndexedDocument>,
    /// Row-per-document embedding matrix; rows are L2-normalized.
    embeddings: Array2<f32>,
    /// Catalog insertion order, used by the router to break score ties.
    function_order: Vec<String>,
}

impl SemanticIndex {
    /// Deterministically derive the document set from a catalog: one
    /// description document and K example documents per function.
    pub fn build_documents(catalog: &Catalog) -> Vec<IndexedDocument> {
        let mut documents = Vec::new();
        for f in catalog.functions() {
            documents.push(IndexedDocument {
                text: format!(
                    "Función {}. Intención: {}. Técnica: {}",
                    f.name, f.business_desc, f.technical_desc
                ),
                function: f.name.clone(),
                kind: DocKind::Description,
            });
            for example in f.atomic_examples() {
                documents.push(IndexedDocument {
                    text: format!("Ejemplo de uso de {}: {}", f.name, example),
                    function: f.name.clone(),
                    kind: DocKind::Example,
                });
            }
        }
        documents
    }

    /// Embed every document and assemble the index.
    pub fn build(catalog: &Catalog, embedder: &dyn Embedder) -> Result<Self> {
        let documents = Self::build_documents(catalog);
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;

        Self::from_parts(catalog, documents, embeddings)
    }

    /// Like [`build`](Self::build), but consults the on-disk embeddings
    /// cache first and refreshes it after a recompute.
    pub fn build_with_cache(
        catalog: &Catalog,
        embedder: &dyn Embedder,
        cache_path: &Path,
    ) -> Result<Self> {
        let documents = Self::build_documents(catalog);

        if let Some(embeddings) = try_load_embeddings_cache(cache_path, &documents)? {
            return Self::from_parts(catalog, documents, embeddings);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;

        if let Err(e) = save_embeddings_cache(cache_path, &documents, &embeddings) {
            // Cache write failure is not fatal: the index is already usable.
            tracing::warn!(error = %e, "Failed to persist embeddings cache");
        }

        Self::from_parts(catalog, documents, embeddings)
    }

    fn from_parts(
        catalog: &Catalog,
        documents: Vec<IndexedDocument>,
        embeddings: Array2<f32>,
    ) -> Result<Self> {
        if embeddings.nrows() != documents.len() {
            return Err(AppError::ModelError(format!(
                "Embedding count {} does not match document count {}",
                embeddings.nrows(),
                documents.len()
            )));
        }

        tracing::info!(
            documents = documents.len(),
            functions = catalog.len(),
            dim = embeddings.ncols(),
            "Semantic index built"
        );

        Ok(Self {
            documents,
            embeddings,
            function_order: catalog.functions().iter().map(|f| f.name.clone()).collect(),
        })
    }

    /// Nearest-neighbor search: returns `(document index, squared-L2
    /// distance)` pairs sorted by distance ascending. With normalized
    /// vectors the distance is `2 - 2·cos`, so smaller means more similar.
    /// `k_docs` is clamped to the number of indexed documents.
    pub fn search(&self, query_embedding: &Array1<f32>, k_docs: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .outer_iter()
            .enumerate()
            .map(|(idx, row)| (idx, 2.0 - 2.0 * query_embedding.dot(&row)))
            .collect();

        // Stable sort keeps document order for exact ties
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k_docs.min(self.documents.len()));
        scored
    }

    pub fn document(&self, idx: usize) -> &IndexedDocument {
        &self.documents[idx]
    }

    pub fn function_order(&self) -> &[String] {
        &self.function_order
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    /// Embedder that maps each text to a fixed axis-aligned unit vector
    /// based on registration order.
    struct AxisEmbedder {
        dim: usize,
    }

    impl Embedder for AxisEmbedder {
        fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Array2<f32>> {
            let mut out = Array2::zeros((texts.len(), self.dim));
            for (i, _) in texts.iter().enumerate() {
                out[[i, i % self.dim]] = 1.0;
            }
            Ok(out)
        }
    }

    #[test]
    fn one_description_doc_per_function_plus_examples() {
        let catalog = Catalog::seed();
        let documents = SemanticIndex::build_documents(&catalog);

        let desc_count = documents
            .iter()
            .filter(|d| d.kind == DocKind::Description)
            .count();
        assert_eq!(desc_count, catalog.len());

        let expected_examples: usize = catalog
            .functions()
            .iter()
            .map(|f| f.atomic_examples().len())
            .sum();
        let example_count = documents
            .iter()
            .filter(|d| d.kind == DocKind::Example)
            .count();
        assert_eq!(example_count, expected_examples);
    }

    #[test]
    fn document_derivation_is_deterministic() {
        let catalog = Catalog::seed();
        let a = SemanticIndex::build_documents(&catalog);
        let b = SemanticIndex::build_documents(&catalog);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.function, y.function);
        }
    }

    #[test]
    fn search_clamps_k_to_document_count() {
        let catalog = Catalog::seed();
        let index = SemanticIndex::build(&catalog, &AxisEmbedder { dim: 128 }).unwrap();
        let query = {
            let mut v = Array1::zeros(128);
            v[0] = 1.0;
            v
        };
        let hits = index.search(&query, 10_000);
        assert_eq!(hits.len(), index.len());
    }

    #[test]
    fn search_orders_by_distance_ascending() {
        let catalog = Catalog::seed();
        let index = SemanticIndex::build(&catalog, &AxisEmbedder { dim: 128 }).unwrap();
        // Query aligned with document 3's axis: exact match distance ~0
        let query = {
            let mut v = Array1::zeros(128);
            v[3] = 1.0;
            v
        };
        let hits = index.search(&query, 5);
        assert_eq!(hits[0].0, 3);
        assert!(hits[0].1.abs() < 1e-6);
        for w in hits.windows(2) {
            assert!(w[0].1 <= w[1].1);
        }
    }

    #[test]
    fn orthogonal_query_distance_is_two() {
        let query = arr1(&[1.0_f32, 0.0]);
        let doc = arr1(&[0.0_f32, 1.0]);
        let d = 2.0 - 2.0 * query.dot(&doc);
        assert!((d - 2.0).abs() < 1e-6);
    }
}
