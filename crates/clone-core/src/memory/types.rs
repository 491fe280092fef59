//! ============================================================================
//! Memory Types - Records loaded from the memory table
//! ============================================================================

/// A single stored memory. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    /// Explicit id column value, or the zero-based row index
    pub id: String,
    /// The memory text injected as context
    pub text: String,
    /// Vector embedding; empty when the table row had none
    pub embedding: Vec<f32>,
}

impl MemoryRecord {
    /// Create a record without an embedding
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: Vec::new(),
        }
    }

    /// Attach a pre-computed embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// Summary of a loaded memory table
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub total: usize,
    pub embedded: usize,
    /// Dimension of the first embedded record, if any
    pub dimension: Option<usize>,
}
