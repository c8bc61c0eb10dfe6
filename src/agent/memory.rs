//! Conversation buffer.

use crate::llm::{ChatMessage, Role};

/// Ordered record of user and assistant messages for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    messages: Vec<ChatMessage>,
    limit: Option<usize>,
}

impl ConversationMemory {
    /// An unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that keeps only the newest `limit` messages.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit: Some(limit.max(2)),
        }
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn add_ai_message(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if let Some(limit) = self.limit {
            if self.messages.len() > limit {
                let excess = self.messages.len() - limit;
                self.messages.drain(..excess);
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The most recent user message and the assistant reply that followed it.
    pub fn last_exchange(&self) -> Option<(&str, &str)> {
        match self.messages.as_slice() {
            [.., user, ai] if user.role == Role::User && ai.role == Role::Assistant => {
                Some((user.content.as_str(), ai.content.as_str()))
            }
            _ => None,
        }
    }
}
