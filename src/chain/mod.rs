//! The retrieval-and-synthesis pipeline.
//!
//! A question goes through four steps:
//!
//! 1. the language model rewrites it into a search query,
//! 2. the rewritten query is embedded and a hybrid search runs with the
//!    original question as keyword text and the embedding as vector,
//! 3. hits are reordered by their position in the episode,
//! 4. the language model answers from those hits for the requested task.

mod ordering;
mod query;
mod synthesis;

pub use ordering::{sort_by_timestamp, timestamp_to_seconds};
pub use query::format_retrieval_query;
pub use synthesis::{build_messages, synthesize};

use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{HarkError, Result};
use crate::llm::LanguageModel;
use crate::vector_store::{HybridQuery, SearchHit, TranscriptIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer returned when retrieval finds nothing.
pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any transcript passages related to this question.";

/// What the synthesis step is asked to do with the retrieved transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    #[default]
    Summary,
    Retrieve,
}

impl Task {
    /// The verb inserted into the synthesis prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summary => "summary",
            Task::Retrieve => "retrieve",
        }
    }
}

impl std::str::FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" | "summarize" => Ok(Task::Summary),
            "retrieve" | "retrieval" => Ok(Task::Retrieve),
            _ => Err(format!("Unknown task: {}", s)),
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInput {
    pub question: String,
    /// Falls back to the chain's default task when absent.
    #[serde(default)]
    pub task: Option<Task>,
}

impl ChainInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            task: None,
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }
}

/// Output of the chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutput {
    pub answer: String,
    /// Hits the answer was grounded on, in timestamp order.
    pub sources: Vec<SearchHit>,
}

/// Result of the retrieval half of the chain.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// The reformulated query that was embedded.
    pub formatted_query: String,
    /// Hits in timestamp order.
    pub hits: Vec<SearchHit>,
}

/// Reformulate, search, reorder, synthesize.
pub struct TranscriptRetrievalChain {
    llm: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn TranscriptIndex>,
    prompts: Prompts,
    alpha: f32,
    limit: usize,
    default_task: Task,
}

impl TranscriptRetrievalChain {
    /// Create a chain with the default weighting (0.75 toward vectors) and 20 hits.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn TranscriptIndex>,
    ) -> Self {
        Self {
            llm,
            embedder,
            index,
            prompts: Prompts::default(),
            alpha: 0.75,
            limit: 20,
            default_task: Task::Summary,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the weight toward vector similarity.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Set the number of hits to retrieve.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Set the task used when the input names none.
    pub fn with_default_task(mut self, task: Task) -> Self {
        self.default_task = task;
        self
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Reformulate the question, run the hybrid search and reorder hits.
    #[instrument(skip(self), fields(alpha = self.alpha, limit = self.limit))]
    pub async fn retrieve(&self, question: &str) -> Result<Retrieval> {
        let formatted_query = format_retrieval_query(self.llm.as_ref(), &self.prompts, question).await?;
        info!("Formatted query: {}", formatted_query);

        let vector = self.embedder.embed(&formatted_query).await?;

        let hits = self
            .index
            .hybrid_search(&HybridQuery {
                text: question.to_string(),
                vector,
                alpha: self.alpha,
                limit: self.limit,
            })
            .await?;
        debug!("Retrieved {} hits", hits.len());

        Ok(Retrieval {
            formatted_query,
            hits: sort_by_timestamp(hits),
        })
    }

    /// Run the full chain.
    #[instrument(skip(self, input), fields(question = %input.question))]
    pub async fn invoke(&self, input: ChainInput) -> Result<ChainOutput> {
        let question = input.question.trim();
        if question.is_empty() {
            return Err(HarkError::InvalidInput("Question must not be empty".to_string()));
        }
        let task = input.task.unwrap_or(self.default_task);

        let retrieval = self.retrieve(question).await?;

        if retrieval.hits.is_empty() {
            info!("No transcript chunks matched; skipping synthesis");
            return Ok(ChainOutput {
                answer: NO_RESULTS_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let answer = synthesize(
            self.llm.as_ref(),
            &self.prompts,
            &retrieval.hits,
            question,
            task,
        )
        .await?;

        Ok(ChainOutput {
            answer,
            sources: retrieval.hits,
        })
    }

    /// Run the full chain from synchronous code.
    ///
    /// Drives [`invoke`](Self::invoke) on a private current-thread runtime.
    /// Must not be called from inside a Tokio runtime; use `invoke` there.
    pub fn invoke_blocking(&self, input: ChainInput) -> Result<ChainOutput> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(HarkError::InvalidInput(
                "invoke_blocking called from inside an async runtime; use invoke".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.invoke(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::testing::{KeywordEmbedder, ScriptedModel};
    use crate::vector_store::{MemoryIndex, TranscriptChunk};

    fn index() -> Arc<MemoryIndex> {
        let index = MemoryIndex::new();
        index
            .insert(
                TranscriptChunk::new("31:20", "later we talked about soil carbon"),
                vec![1.0, 0.0],
            )
            .unwrap();
        index
            .insert(
                TranscriptChunk::new("02:15", "soil tests showed more organic matter"),
                vec![0.9, 0.1],
            )
            .unwrap();
        index
            .insert(
                TranscriptChunk::new("14:00", "marketing beef direct to customers"),
                vec![0.0, 1.0],
            )
            .unwrap();
        Arc::new(index)
    }

    fn chain(llm: Arc<ScriptedModel>) -> TranscriptRetrievalChain {
        TranscriptRetrievalChain::new(llm, Arc::new(KeywordEmbedder::new(["soil", "beef"])), index())
            .with_limit(2)
    }

    #[test]
    fn test_task_parsing() {
        assert_eq!("summary".parse::<Task>().unwrap(), Task::Summary);
        assert_eq!(" Retrieve ".parse::<Task>().unwrap(), Task::Retrieve);
        assert!("translate".parse::<Task>().is_err());
        assert_eq!(Task::default(), Task::Summary);
    }

    #[tokio::test]
    async fn test_invoke_orders_sources_and_grounds_answer() {
        let llm = Arc::new(ScriptedModel::new(["soil health", "Soil improved over time."]));
        let output = chain(llm.clone())
            .invoke(ChainInput::new("What happened with the soil?"))
            .await
            .unwrap();

        assert_eq!(output.answer, "Soil improved over time.");
        let stamps: Vec<&str> = output
            .sources
            .iter()
            .map(|h| h.chunk.timestamp.as_str())
            .collect();
        assert_eq!(stamps, vec!["02:15", "31:20"]);

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        let synthesis_user = &calls[1][1];
        assert_eq!(synthesis_user.role, Role::User);
        assert!(synthesis_user
            .content
            .starts_with("Original question: What happened with the soil?"));
        // Default task applies when none is given.
        assert!(synthesis_user.content.contains("Please summary the information"));
        // Chunks appear in timestamp order inside the prompt.
        let early = synthesis_user.content.find("02:15").unwrap();
        let late = synthesis_user.content.find("31:20").unwrap();
        assert!(early < late);
    }

    #[tokio::test]
    async fn test_explicit_task_is_used() {
        let llm = Arc::new(ScriptedModel::new(["soil", "answer"]));
        chain(llm.clone())
            .invoke(ChainInput::new("soil?").with_task(Task::Retrieve))
            .await
            .unwrap();

        assert!(llm.calls()[1][1].content.contains("Please retrieve the information"));
    }

    #[tokio::test]
    async fn test_keyword_side_uses_original_question() {
        // The reformulated query points at beef, the question at soil.
        // With alpha = 0 only the keyword side counts.
        let llm = Arc::new(ScriptedModel::new(["beef marketing", "answer"]));
        let chain = chain(llm).with_alpha(0.0).with_limit(1);

        let retrieval = chain.retrieve("soil carbon").await.unwrap();
        assert_eq!(retrieval.formatted_query, "beef marketing");
        assert_eq!(retrieval.hits.len(), 1);
        assert!(retrieval.hits[0].chunk.text.contains("soil"));
    }

    #[tokio::test]
    async fn test_vector_side_uses_reformulated_query() {
        let llm = Arc::new(ScriptedModel::new(["beef", "answer"]));
        let chain = chain(llm).with_alpha(1.0).with_limit(1);

        let retrieval = chain.retrieve("soil carbon").await.unwrap();
        assert_eq!(retrieval.hits[0].chunk.timestamp, "14:00");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let llm = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let err = chain(llm.clone()).invoke(ChainInput::new("   ")).await.unwrap_err();
        assert!(matches!(err, HarkError::InvalidInput(_)));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_hits_skips_synthesis() {
        let llm = Arc::new(ScriptedModel::new(["anything"]));
        let chain = TranscriptRetrievalChain::new(
            llm.clone(),
            Arc::new(KeywordEmbedder::new(["soil"])),
            Arc::new(MemoryIndex::new()),
        );

        let output = chain.invoke(ChainInput::new("soil?")).await.unwrap();
        assert_eq!(output.answer, NO_RESULTS_ANSWER);
        assert!(output.sources.is_empty());
        assert_eq!(llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_llm_errors_propagate() {
        let llm = Arc::new(ScriptedModel::new(["soil"]));
        // Second call has no scripted reply and fails.
        let err = chain(llm).invoke(ChainInput::new("soil?")).await.unwrap_err();
        assert!(matches!(err, HarkError::Llm(_)));
    }

    #[test]
    fn test_invoke_blocking_matches_async() {
        let llm = Arc::new(ScriptedModel::new(["soil", "blocking answer"]));
        let output = chain(llm).invoke_blocking(ChainInput::new("soil?")).unwrap();
        assert_eq!(output.answer, "blocking answer");
        assert_eq!(output.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_invoke_blocking_refuses_inside_runtime() {
        let llm = Arc::new(ScriptedModel::new(["soil", "answer"]));
        let err = chain(llm).invoke_blocking(ChainInput::new("soil?")).unwrap_err();
        assert!(matches!(err, HarkError::InvalidInput(_)));
    }
}
