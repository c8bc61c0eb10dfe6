//! Component wiring for Hark.
//!
//! Builds the language model, embedder and index from settings and hands
//! out chains and agents that share them.

use crate::agent::{ConversationMemory, FeedbackSystem, TranscriptAgent};
use crate::chain::TranscriptRetrievalChain;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::openai::create_client_with_timeout;
use crate::vector_store::{TranscriptIndex, WeaviateIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Owns the shared components of the assistant.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    llm: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn TranscriptIndex>,
}

impl Orchestrator {
    /// Create an orchestrator backed by OpenAI and Weaviate.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let client = create_client_with_timeout(Duration::from_secs(settings.openai.timeout_secs))?;

        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::new(
            client.clone(),
            &settings.llm.model,
            settings.llm.temperature,
        ));

        let embedder = OpenAIEmbedder::with_config(
            client,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        );

        let index: Arc<dyn TranscriptIndex> = Arc::new(WeaviateIndex::new(&settings.weaviate)?);

        info!(
            "Using {} with {} embeddings at {} (class {})",
            llm.model(),
            embedder.model(),
            settings.weaviate.url,
            settings.weaviate.class_name
        );
        let embedder: Arc<dyn Embedder> = Arc::new(embedder);

        Ok(Self {
            settings,
            prompts,
            llm,
            embedder,
            index,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn TranscriptIndex>,
    ) -> Self {
        Self {
            settings,
            prompts,
            llm,
            embedder,
            index,
        }
    }

    /// A chain configured from the retrieval settings.
    pub fn chain(&self) -> Result<TranscriptRetrievalChain> {
        Ok(TranscriptRetrievalChain::new(
            self.llm.clone(),
            self.embedder.clone(),
            self.index.clone(),
        )
        .with_prompts(self.prompts.clone())
        .with_alpha(self.settings.retrieval.alpha)
        .with_limit(self.settings.retrieval.limit)
        .with_default_task(self.settings.default_task()?))
    }

    /// Feedback recorder writing to the data directory.
    pub fn feedback(&self) -> FeedbackSystem {
        FeedbackSystem::with_file(self.settings.feedback_path())
    }

    /// A fresh chat agent sharing `chain`.
    pub fn agent(&self, chain: Arc<TranscriptRetrievalChain>) -> Result<TranscriptAgent> {
        let memory = match self.settings.chat.history_limit {
            Some(limit) => ConversationMemory::with_limit(limit),
            None => ConversationMemory::new(),
        };

        Ok(TranscriptAgent::new(chain)
            .with_task(self.settings.chat_task()?)
            .with_memory(memory)
            .with_feedback(self.feedback()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainInput, Task};
    use crate::testing::{KeywordEmbedder, ScriptedModel};
    use crate::vector_store::{MemoryIndex, TranscriptChunk};

    fn orchestrator(settings: Settings, llm: Arc<ScriptedModel>) -> Orchestrator {
        let index = MemoryIndex::new();
        index
            .insert(TranscriptChunk::new("01:00", "water systems for paddocks"), vec![1.0])
            .unwrap();
        Orchestrator::with_components(
            settings,
            Prompts::default(),
            llm,
            Arc::new(KeywordEmbedder::new(["water"])),
            Arc::new(index),
        )
    }

    #[tokio::test]
    async fn test_chain_uses_settings() {
        let mut settings = Settings::default();
        settings.retrieval.alpha = 0.4;
        settings.retrieval.limit = 7;
        settings.retrieval.default_task = "retrieve".to_string();

        let llm = Arc::new(ScriptedModel::new(["water", "answer"]));
        let orchestrator = orchestrator(settings, llm.clone());
        let chain = orchestrator.chain().unwrap();
        assert_eq!(chain.alpha(), 0.4);
        assert_eq!(chain.limit(), 7);

        chain.invoke(ChainInput::new("water?")).await.unwrap();
        assert!(llm.calls()[1][1].content.contains("Please retrieve"));
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.retrieval.alpha = 1.5;
        assert!(matches!(
            Orchestrator::new(settings),
            Err(crate::error::HarkError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_uses_chat_task_and_feedback_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();
        settings.chat.task = "summary".to_string();

        let llm = Arc::new(ScriptedModel::new(["water", "Troughs."]));
        let orchestrator = orchestrator(settings, llm.clone());
        let chain = Arc::new(orchestrator.chain().unwrap());
        let mut agent = orchestrator.agent(chain).unwrap();

        agent.process_query("water?", "u1").await.unwrap();
        assert!(llm.calls()[1][1]
            .content
            .contains(&format!("Please {} the information", Task::Summary)));

        agent.rate_last_response("u1", 5, None).unwrap();
        assert!(dir.path().join("feedback.jsonl").exists());
    }
}
