//! ============================================================================
//! Conversation Session - Turn-by-turn message history
//! ============================================================================
//! Owned by a single chat loop and mutated only through `reset` and the
//! `append_*` methods. Not persisted across runs.
//! ============================================================================

use crate::types::ChatMessage;

#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    history: Vec<ChatMessage>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all prior turns
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::assistant(text));
    }

    /// Messages to carry into a request. Returns a copy so later turns
    /// cannot change a request that was already built.
    pub fn snapshot(&self, include_history: bool) -> Vec<ChatMessage> {
        if include_history {
            self.history.clone()
        } else {
            Vec::new()
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_append_keeps_call_order() {
        let mut session = ConversationSession::new();
        session.append_user("hi");
        session.append_assistant("hello");
        session.append_user("how are you?");

        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(session.history()[2].content, "how are you?");
    }

    #[test]
    fn test_reset_clears_history() {
        let mut session = ConversationSession::new();
        session.append_user("hi");
        session.append_assistant("hello");

        session.reset();
        assert!(session.is_empty());
        session.reset();
        assert_eq!(session.len(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut session = ConversationSession::new();
        session.append_user("first");

        let snapshot = session.snapshot(true);
        session.append_assistant("reply");
        session.reset();

        assert_eq!(snapshot, vec![ChatMessage::user("first")]);
    }

    #[test]
    fn test_snapshot_without_history() {
        let mut session = ConversationSession::new();
        session.append_user("first");
        assert!(session.snapshot(false).is_empty());
    }
}
