//! Conversational front end over the retrieval chain.
//!
//! A [`TranscriptAgent`] belongs to one chat session: it keeps the
//! conversation buffer and routes each query through the chain.

mod feedback;
mod memory;
pub mod render;

pub use feedback::{Feedback, FeedbackSystem, MAX_RATING, MIN_RATING};
pub use memory::ConversationMemory;
pub use render::{clean_html, parse_llm_output};

use crate::chain::{ChainInput, ChainOutput, Task, TranscriptRetrievalChain};
use crate::error::{HarkError, Result};
use std::sync::Arc;
use tracing::{info, instrument};

/// Reply used when the chain produces no usable answer.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't generate a response for this query.";

/// Greeting shown at the start of a session.
pub const WELCOME_TITLE: &str = "Welcome to the Podcast Transcript Assistant!";

/// Instructions shown under the greeting.
pub const WELCOME_MESSAGE: &str = "I'm here to help you with various transcript-related tasks.

Important: our interactions are stateless. Please provide all necessary context in each query.

How can I assist you with your podcast information today?";

/// Per-session agent.
pub struct TranscriptAgent {
    chain: Arc<TranscriptRetrievalChain>,
    memory: ConversationMemory,
    feedback: FeedbackSystem,
    task: Task,
}

impl TranscriptAgent {
    /// Create an agent that runs every query with the `retrieve` task.
    pub fn new(chain: Arc<TranscriptRetrievalChain>) -> Self {
        Self {
            chain,
            memory: ConversationMemory::new(),
            feedback: FeedbackSystem::new(),
            task: Task::Retrieve,
        }
    }

    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackSystem) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn clear_history(&mut self) {
        self.memory.clear();
    }

    /// Run the chain for a question with this agent's task.
    #[instrument(skip(self))]
    pub async fn route_and_execute(&self, question: &str) -> Result<ChainOutput> {
        let result = self
            .chain
            .invoke(ChainInput::new(question).with_task(self.task))
            .await?;

        info!("Query: {}", question);
        info!("Response: {}", result.answer);

        Ok(result)
    }

    /// Answer a query and record the exchange in the conversation buffer.
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn process_query(&mut self, query: &str, user_id: &str) -> Result<ChainOutput> {
        self.memory.add_user_message(query);

        let mut result = self.route_and_execute(query).await?;
        if result.answer.trim().is_empty() {
            result.answer = FALLBACK_ANSWER.to_string();
        }

        self.memory.add_ai_message(result.answer.clone());
        info!("User {} - Query: {}", user_id, query);
        info!("User {} - Response: {}", user_id, result.answer);

        Ok(result)
    }

    /// Rate the most recent answer.
    pub fn rate_last_response(
        &self,
        user_id: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Feedback> {
        let (query, response) = self.memory.last_exchange().ok_or_else(|| {
            HarkError::Feedback("There is no answer to rate yet".to_string())
        })?;
        self.feedback
            .collect_feedback(user_id, query, response, rating, comment)
    }
}
