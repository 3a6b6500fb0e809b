//! Semantic function router.
//!
//! Retrieves the nearest indexed documents for a query and aggregates them
//! into a ranked list of candidate functions: per function, the best
//! observed similarity wins (never an average), so a single very close
//! example can decide the route.

use crate::embedding::Embedder;
use crate::error::{AppError, Result};
use crate::index::SemanticIndex;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub function: String,
    pub score: f32,
}

/// Map the index's squared-L2 distance back to cosine similarity.
/// Valid because document and query vectors are L2-normalized.
#[inline]
fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Route a query to the top `k_functions` candidate functions.
///
/// `k_docs` controls how many documents are retrieved before per-function
/// aggregation; it should be large enough to span several functions.
/// Ties are broken by catalog insertion order, which keeps results
/// reproducible across runs.
pub fn route(
    index: &SemanticIndex,
    embedder: &dyn Embedder,
    query: &str,
    k_functions: usize,
    k_docs: usize,
) -> Result<Vec<RouteResult>> {
    let query_embedding = embedder.embed(query)?;
    let hits = index.search(&query_embedding, k_docs);

    if hits.is_empty() {
        return Err(AppError::NoCandidates);
    }

    let mut best_by_function: HashMap<&str, f32> = HashMap::new();
    for (doc_idx, distance) in &hits {
        let doc = index.document(*doc_idx);
        let similarity = distance_to_similarity(*distance);
        let entry = best_by_function
            .entry(doc.function.as_str())
            .or_insert(f32::MIN);
        if similarity > *entry {
            *entry = similarity;
        }
    }

    // Collect in catalog order, then stable-sort by score descending:
    // exact ties keep catalog order.
    let mut ranked: Vec<RouteResult> = index
        .function_order()
        .iter()
        .filter_map(|name| {
            best_by_function.get(name.as_str()).map(|score| RouteResult {
                function: name.clone(),
                score: *score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k_functions);

    Ok(ranked)
}
