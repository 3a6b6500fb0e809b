//! Text embedding provider seam.
//!
//! The router and index only depend on the `Embedder` trait: text in,
//! L2-normalized fixed-length vector out, deterministic for a given model.
//! Production uses the ONNX bi-encoder; tests plug in deterministic stubs.

pub mod onnx;

use crate::error::Result;
use ndarray::{Array1, Array2};

pub use onnx::OnnxEmbedder;

pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. Returns one normalized row per input text.
    fn embed_batch(&self, texts: &[String]) -> Result<Array2<f32>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let texts = vec![text.to_string()];
        let batch = self.embed_batch(&texts)?;
        Ok(batch.row(0).to_owned())
    }
}
