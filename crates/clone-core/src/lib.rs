//! ============================================================================
//! CLONE-CORE: Memory-augmented chat
//! ============================================================================
//! This crate holds everything behind the `clone` terminal chat:
//! - YAML configuration and API credentials
//! - Memory table loading and cosine-similarity retrieval
//! - Conversation session state
//! - Prompt assembly and dispatch to a chat-completions API
//! - The interactive question/answer loop
//! ============================================================================

pub mod completion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod repl;
pub mod retry;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use completion::{CompletionApi, OpenAiChatClient};
pub use config::CloneConfig;
pub use dispatcher::PromptDispatcher;
pub use error::{CompletionError, ConfigError, MemoryLoadError, RetrievalError};
pub use memory::{EmbeddingService, MemoryRecord, MemoryStore, MemoryTable, SemanticMemoryStore};
pub use repl::{ReplDriver, ReplSummary, TurnOptions};
pub use session::ConversationSession;
pub use types::{ChatMessage, Role};
