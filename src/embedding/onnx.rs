//! ONNX bi-encoder embedder.
//!
//! Produces sentence embeddings via mean pooling over the encoder's last
//! hidden state, L2-normalized so cosine similarity reduces to a dot product
//! (and squared L2 distance to `2 - 2·cos`).

use crate::error::{AppError, Result};
use crate::embedding::Embedder;
use crossbeam::queue::ArrayQueue;
use ndarray::Array2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::cell::UnsafeCell;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Embedder backed by a pool of ONNX Runtime sessions.
///
/// # Design Rationale
/// `Session::run` requires `&mut self`, but embedding happens on every
/// routed request. Instead of a Mutex (which serializes all requests), a
/// pool of independent sessions is kept behind a lock-free queue of indices;
/// each embedding call acquires exclusive use of one session.
///
/// # Safety
/// The ArrayQueue hands each index to at most one thread between acquire and
/// release, so the UnsafeCell access is exclusive.
pub struct OnnxEmbedder {
    sessions: Vec<UnsafeCell<Session>>,
    available: Arc<ArrayQueue<usize>>,
    tokenizer: Tokenizer,
    max_length: usize,
}

impl OnnxEmbedder {
    /// Load the model into a pool of `pool_size` sessions plus the tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_length: usize,
        pool_size: usize,
    ) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            AppError::TokenizationError(format!("Failed to load embedder tokenizer: {}", e))
        })?;

        // Read model file once, share bytes across sessions
        let model_bytes = std::fs::read(model_path)
            .map_err(|e| AppError::ModelError(format!("Failed to read model file: {}", e)))?;

        let mut sessions = Vec::with_capacity(pool_size);
        let available = Arc::new(ArrayQueue::new(pool_size));

        for i in 0..pool_size {
            let session = Session::builder()
                .map_err(|e| AppError::ModelError(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| AppError::ModelError(e.to_string()))?
                .with_intra_threads(1)
                .map_err(|e| AppError::ModelError(e.to_string()))?
                .commit_from_memory(&model_bytes)
                .map_err(|e: ort::Error| AppError::ModelError(e.to_string()))?;

            sessions.push(UnsafeCell::new(session));
            available
                .push(i)
                .map_err(|_| AppError::ModelError("Failed to initialize session pool".into()))?;
        }

        tracing::info!(
            model = %model_path.display(),
            tokenizer = %tokenizer_path.display(),
            max_length,
            pool_size,
            "ONNX embedder loaded"
        );

        Ok(Self {
            sessions,
            available,
            tokenizer,
            max_length,
        })
    }

    fn acquire_session(&self) -> Result<usize> {
        self.available
            .pop()
            .ok_or_else(|| AppError::ResourceError("No available embedder sessions".into()))
    }

    fn release_session(&self, index: usize) {
        // Never fails: we only release indices we acquired
        let _ = self.available.push(index);
    }

    fn run_batch_on_session(&self, session_idx: usize, texts: &[String]) -> Result<Array2<f32>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| AppError::TokenizationError(e.to_string()))?;

        let batch_size = encodings.len();

        // Pad to the longest sequence in the batch, capped at max_length
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len().min(self.max_length))
            .max()
            .unwrap_or(1);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let len = ids.len().min(max_len);

            for j in 0..len {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
            }
        }

        let shape = [batch_size, max_len];
        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .map_err(|e| AppError::ModelError(e.to_string()))?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
            .map_err(|e| AppError::ModelError(e.to_string()))?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
            .map_err(|e| AppError::ModelError(e.to_string()))?;

        // SAFETY: ArrayQueue guarantees exclusive access to this index.
        // Only one thread holds session_idx between acquire and release.
        let session = unsafe { &mut *self.sessions[session_idx].get() };

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor,
            ])
            .map_err(|e| AppError::ModelError(format!("Embedder inference failed: {}", e)))?;

        let hidden_state = outputs.get("last_hidden_state").ok_or_else(|| {
            AppError::ModelError("No 'last_hidden_state' output found".to_string())
        })?;

        let tensor = hidden_state
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::ModelError(e.to_string()))?;

        let (shape_info, data) = tensor;
        let hidden_size = shape_info[2] as usize;

        // Mean pooling with attention mask, then L2 normalization per row
        let mut embeddings = Array2::zeros((batch_size, hidden_size));

        for i in 0..batch_size {
            let mut sum = vec![0.0f32; hidden_size];
            let mut count = 0.0f32;

            for j in 0..max_len {
                if attention_mask[i * max_len + j] == 1 {
                    let base_idx = i * max_len * hidden_size + j * hidden_size;
                    for (k, sum_val) in sum.iter_mut().enumerate() {
                        *sum_val += data[base_idx + k];
                    }
                    count += 1.0;
                }
            }

            if count > 0.0 {
                for (k, sum_val) in sum.iter().enumerate() {
                    embeddings[[i, k]] = sum_val / count;
                }
            }

            let norm: f32 = embeddings.row(i).iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                let mut row = embeddings.row_mut(i);
                for val in row.iter_mut() {
                    *val /= norm;
                }
            }
        }

        Ok(embeddings)
    }
}

impl Embedder for OnnxEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Array2<f32>> {
        if texts.is_empty() {
            return Ok(Array2::zeros((0, 0)));
        }

        let session_idx = self.acquire_session()?;
        let result = self.run_batch_on_session(session_idx, texts);
        self.release_session(session_idx);
        result
    }
}

// SAFETY: the ArrayQueue hands out each session index to at most one caller
// at a time; between pop and push only one thread can touch the
// corresponding UnsafeCell<Session>. Same mutual exclusion as a Mutex,
// without blocking the other sessions in the pool.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}
