//! ============================================================================
//! Memory Store - Similarity retrieval over the loaded memory table
//! ============================================================================
//! Ranks memories by cosine similarity between the query embedding and each
//! record's stored embedding. The table is never modified after load.
//! ============================================================================

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::embeddings::Embedder;
use super::table::MemoryTable;
use super::types::MemoryRecord;
use crate::error::RetrievalError;

/// Source of memory context for a query
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Up to `k` records, best match first. Deterministic for a fixed store and query.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<MemoryRecord>, RetrievalError>;
}

/// Memory store that embeds the query and ranks records by cosine similarity
pub struct SemanticMemoryStore<E> {
    table: Arc<MemoryTable>,
    embedder: E,
}

impl<E: Embedder> SemanticMemoryStore<E> {
    pub fn new(table: Arc<MemoryTable>, embedder: E) -> Self {
        Self { table, embedder }
    }

    pub fn table(&self) -> &MemoryTable {
        &self.table
    }

    /// Rank records against an already-computed query vector
    pub fn rank(&self, query_embedding: &[f32], k: usize) -> Vec<MemoryRecord> {
        let mut scored: Vec<(usize, f32)> = self
            .table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.embedding.len() == query_embedding.len())
            .filter_map(|(i, r)| cosine_similarity(query_embedding, &r.embedding).map(|s| (i, s)))
            .collect();

        // Stable sort keeps table order for equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.table.records()[i].clone())
            .collect()
    }
}

#[async_trait]
impl<E: Embedder> MemoryStore for SemanticMemoryStore<E> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<MemoryRecord>, RetrievalError> {
        if k == 0 || self.table.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_single(query).await?;
        let stats = self.table.stats();
        if stats.embedded > 0 && self.table.count_with_dimension(query_embedding.len()) == 0 {
            warn!(
                "Query embedding has dimension {} but the memory table uses {:?}; check openai.embedding_model",
                query_embedding.len(),
                stats.dimension
            );
        }

        let matches = self.rank(&query_embedding, k);

        debug!("Retrieved {} of {} memories for query", matches.len(), self.table.len());
        Ok(matches)
    }
}

/// Cosine similarity; `None` for empty or zero-length vectors and for
/// non-finite inputs
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    score.is_finite().then_some(score as f32)
}
