//! Transcript index abstraction for Hark.
//!
//! Provides a trait-based interface over hybrid (vector + keyword) search
//! backends. Weaviate is the production backend; the in-memory index mirrors
//! its fusion semantics for tests and offline use.

pub mod hybrid;
mod memory;
mod weaviate;

pub use memory::MemoryIndex;
pub use weaviate::WeaviateIndex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A timestamped fragment of a podcast transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Position in the episode, as `MM:SS`.
    pub timestamp: String,
    /// Transcript text of this chunk.
    pub text: String,
}

impl TranscriptChunk {
    pub fn new(timestamp: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            text: text.into(),
        }
    }
}

/// A retrieved chunk with its fused relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub chunk: TranscriptChunk,
    /// Fused hybrid score (higher is better).
    pub score: f32,
}

/// Parameters of a hybrid query.
#[derive(Debug, Clone)]
pub struct HybridQuery {
    /// Text matched lexically.
    pub text: String,
    /// Vector matched by similarity.
    pub vector: Vec<f32>,
    /// Weight toward the vector side, in `[0, 1]`.
    pub alpha: f32,
    /// Maximum number of hits.
    pub limit: usize,
}

/// Trait for transcript index backends.
#[async_trait]
pub trait TranscriptIndex: Send + Sync {
    /// Run a hybrid search, best hits first.
    async fn hybrid_search(&self, query: &HybridQuery) -> Result<Vec<SearchHit>>;

    /// Number of chunks in the index.
    async fn count(&self) -> Result<usize>;

    /// Whether the backend is reachable and ready to serve queries.
    async fn is_ready(&self) -> bool;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
