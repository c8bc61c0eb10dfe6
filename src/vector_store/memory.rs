//! In-memory transcript index.
//!
//! Useful for testing and small datasets.

use super::hybrid::{bm25_scores, fuse};
use super::{cosine_similarity, HybridQuery, SearchHit, TranscriptChunk, TranscriptIndex};
use crate::error::{HarkError, Result};
use async_trait::async_trait;
use std::sync::RwLock;

/// A chunk stored with its embedding.
#[derive(Debug, Clone)]
struct StoredChunk {
    chunk: TranscriptChunk,
    embedding: Vec<f32>,
}

/// In-memory transcript index with local hybrid scoring.
pub struct MemoryIndex {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Add a chunk with its embedding.
    pub fn insert(&self, chunk: TranscriptChunk, embedding: Vec<f32>) -> Result<()> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        chunks.push(StoredChunk { chunk, embedding });
        Ok(())
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptIndex for MemoryIndex {
    async fn hybrid_search(&self, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        if chunks.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let vector_scores: Vec<f32> = chunks
            .iter()
            .map(|c| cosine_similarity(&query.vector, &c.embedding))
            .collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.chunk.text.as_str()).collect();
        let keyword_scores = bm25_scores(&query.text, &texts);

        let fused = fuse(&vector_scores, &keyword_scores, query.alpha);

        let mut hits: Vec<SearchHit> = chunks
            .iter()
            .zip(fused)
            .map(|(c, score)| SearchHit {
                chunk: c.chunk.clone(),
                score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);

        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        Ok(chunks.len())
    }

    async fn is_ready(&self) -> bool {
        true
    }
}
