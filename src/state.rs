//! Shared application state.

use crate::catalog::Catalog;
use crate::compose::Composer;
use crate::config::Config;
use crate::embedding::{Embedder, OnnxEmbedder};
use crate::error::Result;
use crate::executor::ActionExecutor;
use crate::graph::FunctionGraph;
use crate::index::SemanticIndex;
use crate::pipeline::Pipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

/// State shared across all request handlers.
///
/// The semantic index sits behind a lock so a catalog reload can swap in a
/// fresh snapshot atomically; readers clone the Arc and never block each
/// other while searching.
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub embedder: Arc<dyn Embedder>,
    index: RwLock<Option<Arc<SemanticIndex>>>,
    pub graph: Arc<FunctionGraph>,
    pub pipeline: Pipeline,
    ready: AtomicBool,
}

impl AppState {
    /// Load the embedder, build the semantic index (consulting the on-disk
    /// embeddings cache) and assemble the pipeline.
    pub fn new(config: Config) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
        });

        let embedder: Arc<dyn Embedder> = Arc::new(OnnxEmbedder::load(
            &config.embedder_model_path,
            &config.embedder_tokenizer_path,
            config.max_sequence_length,
            pool_size,
        )?);

        Self::assemble(config, embedder)
    }

    /// Assemble state around an externally supplied embedder. Used by tests
    /// that substitute a deterministic embedder for the ONNX model.
    pub fn with_embedder(config: Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::assemble(config, embedder)
    }

    fn assemble(config: Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::seed(),
        };

        let index = SemanticIndex::build_with_cache(
            &catalog,
            embedder.as_ref(),
            &config.embeddings_cache_path,
        )?;

        let graph = Arc::new(FunctionGraph::bakery());
        let composer = Arc::new(Composer::from_config(&config));
        let pipeline = Pipeline::new(
            Arc::clone(&graph),
            Arc::new(ActionExecutor::new()),
            composer,
            config.prepend_product_lookup.clone(),
            config.k_docs,
        );

        Ok(Self {
            config,
            catalog,
            embedder,
            index: RwLock::new(Some(Arc::new(index))),
            graph,
            pipeline,
            ready: AtomicBool::new(true),
        })
    }

    /// Current index snapshot, or None before the first build completes.
    pub fn index(&self) -> Option<Arc<SemanticIndex>> {
        self.index
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    /// Rebuild the index from the current catalog and swap it in. In-flight
    /// requests keep searching their old snapshot.
    pub fn rebuild_index(&self) -> Result<()> {
        let index = SemanticIndex::build(&self.catalog, self.embedder.as_ref())?;

        if let Ok(mut guard) = self.index.write() {
            *guard = Some(Arc::new(index));
        }
        self.ready.store(true, Ordering::Release);

        tracing::info!("Semantic index rebuilt and swapped");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire) && self.index().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;
    use ndarray::Array2;
    use std::path::PathBuf;

    struct AxisEmbedder;

    impl Embedder for AxisEmbedder {
        fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Array2<f32>> {
            let dim = 64;
            let mut out = Array2::zeros((texts.len(), dim));
            for i in 0..texts.len() {
                out[[i, i % dim]] = 1.0;
            }
            Ok(out)
        }
    }

    fn test_config(cache_path: PathBuf) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            embedder_model_path: PathBuf::from("unused.onnx"),
            embedder_tokenizer_path: PathBuf::from("unused.json"),
            max_sequence_length: 512,
            shutdown_timeout_secs: 1,
            pool_size: Some(1),
            k_docs: 12,
            catalog_path: None,
            embeddings_cache_path: cache_path,
            prepend_product_lookup: vec!["crear_pedido".to_string()],
            llm_provider: LlmProvider::None,
            llm_base_url: String::new(),
            llm_api_key: None,
            llm_model: String::new(),
            llm_timeout_secs: 1,
        }
    }

    #[test]
    fn state_is_ready_after_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("embeddings.bin"));
        let state = AppState::with_embedder(config, Arc::new(AxisEmbedder)).unwrap();

        assert!(state.is_ready());
        assert!(state.index().is_some());
        assert_eq!(state.catalog.len(), 12);
    }

    #[test]
    fn rebuild_swaps_in_a_new_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("embeddings.bin"));
        let state = AppState::with_embedder(config, Arc::new(AxisEmbedder)).unwrap();

        let before = state.index().unwrap();
        state.rebuild_index().unwrap();
        let after = state.index().unwrap();

        // Old snapshot stays valid for holders; the state serves a new one
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.len(), after.len());
        assert!(state.is_ready());
    }
}
