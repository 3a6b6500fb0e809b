//! Binary cache for pre-computed document embeddings.
//!
//! The index is rebuilt wholesale whenever the catalog changes; the cache
//! only short-circuits the embedding pass across restarts when the derived
//! document set is byte-identical.

use crate::error::{AppError, Result};
use crate::index::IndexedDocument;
use ndarray::Array2;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Cache file format version. Increment when the format changes.
const CACHE_VERSION: u32 = 1;

/// Magic bytes identifying valid cache files.
const CACHE_MAGIC: &[u8; 8] = b"MIGAIDX\0";

/// Cached embeddings with metadata for validation.
pub struct EmbeddingsCache {
    pub version: u32,
    /// SHA256 over the derived documents, to detect catalog changes.
    pub docs_hash: [u8; 32],
    pub num_docs: usize,
    pub embedding_dim: usize,
    /// Row-major (num_docs × embedding_dim) matrix.
    pub embeddings: Array2<f32>,
}

impl EmbeddingsCache {
    /// Hash of owning function + document text for every document, in index
    /// order. Any catalog edit changes the hash and invalidates the cache.
    pub fn compute_docs_hash(documents: &[IndexedDocument]) -> [u8; 32] {
        let mut hasher = Sha256::new();

        for doc in documents {
            hasher.update(doc.function.as_bytes());
            hasher.update(b"|");
            hasher.update(doc.text.as_bytes());
            hasher.update(b"\n");
        }

        hasher.finalize().into()
    }

    pub fn new(documents: &[IndexedDocument], embeddings: Array2<f32>) -> Self {
        Self {
            version: CACHE_VERSION,
            docs_hash: Self::compute_docs_hash(documents),
            num_docs: documents.len(),
            embedding_dim: embeddings.ncols(),
            embeddings,
        }
    }

    /// Save cache to a binary file.
    ///
    /// File format:
    /// - 8 bytes: magic "MIGAIDX\0"
    /// - 4 bytes: version (u32 LE)
    /// - 32 bytes: docs_hash
    /// - 8 bytes: num_docs (u64 LE)
    /// - 8 bytes: embedding_dim (u64 LE)
    /// - N bytes: embeddings data (f32 LE, row-major)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::ValidationError(format!("Failed to create cache directory: {}", e))
            })?;
        }

        let file = File::create(path).map_err(|e| {
            AppError::ValidationError(format!("Failed to create cache file: {}", e))
        })?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(CACHE_MAGIC)
            .and_then(|_| writer.write_all(&self.version.to_le_bytes()))
            .and_then(|_| writer.write_all(&self.docs_hash))
            .and_then(|_| writer.write_all(&(self.num_docs as u64).to_le_bytes()))
            .and_then(|_| writer.write_all(&(self.embedding_dim as u64).to_le_bytes()))
            .map_err(|e| {
                AppError::ValidationError(format!("Failed to write cache header: {}", e))
            })?;

        let data = self.embeddings.as_slice().ok_or_else(|| {
            AppError::ValidationError("Embeddings array not contiguous".to_string())
        })?;

        for &val in data {
            writer.write_all(&val.to_le_bytes()).map_err(|e| {
                AppError::ValidationError(format!("Failed to write embedding data: {}", e))
            })?;
        }

        writer
            .flush()
            .map_err(|e| AppError::ValidationError(format!("Failed to flush cache file: {}", e)))?;

        tracing::info!(
            path = %path.display(),
            num_docs = self.num_docs,
            embedding_dim = self.embedding_dim,
            "Embeddings cache saved"
        );

        Ok(())
    }

    /// Load cache from a binary file. Returns None when the file is missing
    /// or structurally invalid.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Cache file does not exist");
            return Ok(None);
        }

        let file = File::open(path)
            .map_err(|e| AppError::ValidationError(format!("Failed to open cache file: {}", e)))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        if reader.read_exact(&mut magic).is_err() || &magic != CACHE_MAGIC {
            tracing::warn!(path = %path.display(), "Invalid cache magic, ignoring");
            return Ok(None);
        }

        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes).map_err(|e| {
            AppError::ValidationError(format!("Failed to read cache version: {}", e))
        })?;
        let version = u32::from_le_bytes(version_bytes);

        if version != CACHE_VERSION {
            tracing::warn!(
                path = %path.display(),
                cache_version = version,
                expected_version = CACHE_VERSION,
                "Cache version mismatch, ignoring"
            );
            return Ok(None);
        }

        let mut docs_hash = [0u8; 32];
        reader
            .read_exact(&mut docs_hash)
            .map_err(|e| AppError::ValidationError(format!("Failed to read docs hash: {}", e)))?;

        let mut num_docs_bytes = [0u8; 8];
        reader
            .read_exact(&mut num_docs_bytes)
            .map_err(|e| AppError::ValidationError(format!("Failed to read num_docs: {}", e)))?;
        let num_docs = u64::from_le_bytes(num_docs_bytes) as usize;

        let mut embedding_dim_bytes = [0u8; 8];
        reader.read_exact(&mut embedding_dim_bytes).map_err(|e| {
            AppError::ValidationError(format!("Failed to read embedding_dim: {}", e))
        })?;
        let embedding_dim = u64::from_le_bytes(embedding_dim_bytes) as usize;

        let total_floats = num_docs * embedding_dim;
        let mut data = vec![0f32; total_floats];

        for val in &mut data {
            let mut bytes = [0u8; 4];
            reader.read_exact(&mut bytes).map_err(|e| {
                AppError::ValidationError(format!("Failed to read embedding data: {}", e))
            })?;
            *val = f32::from_le_bytes(bytes);
        }

        let embeddings = Array2::from_shape_vec((num_docs, embedding_dim), data).map_err(|e| {
            AppError::ValidationError(format!("Failed to reshape embeddings: {}", e))
        })?;

        tracing::info!(
            path = %path.display(),
            num_docs,
            embedding_dim,
            "Embeddings cache loaded"
        );

        Ok(Some(Self {
            version,
            docs_hash,
            num_docs,
            embedding_dim,
            embeddings,
        }))
    }

    /// Check whether the cache matches the given document set.
    pub fn is_valid_for(&self, documents: &[IndexedDocument]) -> bool {
        let current_hash = Self::compute_docs_hash(documents);
        self.docs_hash == current_hash && self.num_docs == documents.len()
    }
}

/// Try to load embeddings from cache, validating against current documents.
pub fn try_load_embeddings_cache(
    cache_path: &Path,
    documents: &[IndexedDocument],
) -> Result<Option<Array2<f32>>> {
    match EmbeddingsCache::load(cache_path)? {
        Some(cache) if cache.is_valid_for(documents) => {
            tracing::info!("Using cached embeddings (cache hit)");
            Ok(Some(cache.embeddings))
        }
        Some(_) => {
            tracing::info!("Cache invalid (catalog changed), will recompute");
            Ok(None)
        }
        None => {
            tracing::info!("No cache found, will compute embeddings");
            Ok(None)
        }
    }
}

/// Save computed embeddings to cache.
pub fn save_embeddings_cache(
    cache_path: &Path,
    documents: &[IndexedDocument],
    embeddings: &Array2<f32>,
) -> Result<()> {
    let cache = EmbeddingsCache::new(documents, embeddings.clone());
    cache.save(cache_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocKind;
    use tempfile::tempdir;

    fn make_doc(function: &str, text: &str) -> IndexedDocument {
        IndexedDocument {
            text: text.to_string(),
            function: function.to_string(),
            kind: DocKind::Example,
        }
    }

    #[test]
    fn hash_changes_with_documents() {
        let docs1 = vec![make_doc("buscar_producto", "¿Tienes pan integral?")];
        let docs2 = vec![make_doc("cancelar_pedido", "Cancela el pedido 55")];

        let hash1 = EmbeddingsCache::compute_docs_hash(&docs1);
        let hash2 = EmbeddingsCache::compute_docs_hash(&docs2);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("embeddings.bin");

        let docs = vec![
            make_doc("buscar_producto", "¿Tienes pan integral?"),
            make_doc("crear_pedido", "Quiero 2 cafés"),
        ];
        let embeddings =
            Array2::from_shape_vec((2, 4), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();

        let cache = EmbeddingsCache::new(&docs, embeddings.clone());
        cache.save(&cache_path).unwrap();

        let loaded = EmbeddingsCache::load(&cache_path).unwrap().unwrap();

        assert_eq!(loaded.num_docs, 2);
        assert_eq!(loaded.embedding_dim, 4);
        assert_eq!(loaded.embeddings, embeddings);
        assert!(loaded.is_valid_for(&docs));
    }

    #[test]
    fn cache_invalidated_by_catalog_change() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("embeddings.bin");

        let docs1 = vec![make_doc("buscar_producto", "¿Tienes pan integral?")];
        let docs2 = vec![make_doc("buscar_producto", "¿Tienen pan de masa madre?")];
        let embeddings = Array2::from_shape_vec((1, 4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        EmbeddingsCache::new(&docs1, embeddings).save(&cache_path).unwrap();

        let hit = try_load_embeddings_cache(&cache_path, &docs1).unwrap();
        assert!(hit.is_some());

        let miss = try_load_embeddings_cache(&cache_path, &docs2).unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn missing_file_is_a_clean_miss() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("nope.bin");
        let docs = vec![make_doc("buscar_producto", "hola")];
        assert!(try_load_embeddings_cache(&cache_path, &docs).unwrap().is_none());
    }
}
