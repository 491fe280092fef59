//! ============================================================================
//! Memory Module - Stored memories and similarity retrieval
//! ============================================================================
//! Loads a table of memories once at startup and retrieves the records most
//! similar to each user query.
//!
//! ## Architecture
//! ```text
//! memories.csv → MemoryTable (read-only)
//!                     ↓
//! User Query → Embed → Cosine Rank → Top-k MemoryRecords
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use clone_core::memory::{EmbeddingService, MemoryStore, MemoryTable, SemanticMemoryStore};
//!
//! let table = Arc::new(MemoryTable::load(Path::new("memories.csv"))?);
//! let store = SemanticMemoryStore::new(table, EmbeddingService::from_config(&config.openai)?);
//! let relevant = store.retrieve("What is my dog's name?", 5).await?;
//! ```
//! ============================================================================

mod embeddings;
mod store;
mod table;
mod types;

pub use embeddings::{Embedder, EmbeddingService};
pub use store::{cosine_similarity, MemoryStore, SemanticMemoryStore};
pub use table::MemoryTable;
pub use types::{MemoryRecord, TableStats};
