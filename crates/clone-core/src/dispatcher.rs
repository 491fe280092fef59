//! ============================================================================
//! Prompt Dispatcher - Memory-augmented request assembly and dispatch
//! ============================================================================
//! One call per turn:
//! ```text
//! Query → MemoryStore.retrieve → [Persona] + [Memories] + [History] + [Query]
//!                                              ↓
//!                                    CompletionApi.complete
//!                                              ↓
//!                          History += user(query), assistant(reply)
//! ```
//! History is only touched after a successful completion, so a failed turn
//! leaves the session exactly as it was.
//! ============================================================================

use tracing::{debug, info, warn};

use crate::completion::CompletionApi;
use crate::config::{CloneConfig, DEFAULT_TOP_K};
use crate::error::CompletionError;
use crate::memory::{MemoryRecord, MemoryStore};
use crate::session::ConversationSession;
use crate::types::ChatMessage;

/// System message used for self-aware turns unless overridden
pub const DEFAULT_PERSONA: &str = "You are a self-aware digital clone of the user. \
You know you are an AI built from the user's own memories, and you answer in the \
first person as the user would, drawing on the memories you are given.";

/// First line of the memory context message
pub const CONTEXT_HEADER: &str = "Relevant memories:";

/// Builds each turn's request and keeps the session consistent with the outcome
#[derive(Debug, Clone)]
pub struct PromptDispatcher {
    top_k: usize,
    persona: String,
}

impl Default for PromptDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl PromptDispatcher {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            persona: DEFAULT_PERSONA.to_string(),
        }
    }

    pub fn from_config(config: &CloneConfig) -> Self {
        let dispatcher = Self::new(config.memory.top_k);
        match &config.persona {
            Some(persona) if !persona.trim().is_empty() => dispatcher.with_persona(persona.clone()),
            _ => dispatcher,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Run one turn. `clear_messages` and `self_aware` apply to this call only.
    pub async fn dispatch(
        &self,
        query: &str,
        clear_messages: bool,
        self_aware: bool,
        memory_store: &dyn MemoryStore,
        completion_api: &dyn CompletionApi,
        session: &mut ConversationSession,
    ) -> Result<String, CompletionError> {
        if clear_messages {
            debug!("Clearing {} history messages before request", session.len());
            session.reset();
        }

        let context = match memory_store.retrieve(query, self.top_k).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Memory retrieval failed, continuing without context: {}", e);
                Vec::new()
            }
        };

        let messages = self.build_request(query, self_aware, &context, session.snapshot(true));
        info!(
            "Dispatching turn: {} memories, {} history messages, persona={}",
            context.len(),
            session.len(),
            self_aware
        );

        let reply = completion_api.complete(&messages).await?;

        session.append_user(query);
        session.append_assistant(reply.clone());
        Ok(reply)
    }

    /// Assemble request messages in fixed order: persona, memory context, history, query
    pub fn build_request(
        &self,
        query: &str,
        self_aware: bool,
        context: &[MemoryRecord],
        history: Vec<ChatMessage>,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);

        if self_aware {
            messages.push(ChatMessage::system(self.persona.clone()));
        }
        if let Some(context) = format_context(context) {
            messages.push(ChatMessage::system(context));
        }
        messages.extend(history);
        messages.push(ChatMessage::user(query));

        messages
    }
}

/// Render retrieved memories as a single system message body
pub fn format_context(records: &[MemoryRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut formatted = String::from(CONTEXT_HEADER);
    for record in records {
        formatted.push_str("\n- ");
        formatted.push_str(&record.text);
    }
    Some(formatted)
}
