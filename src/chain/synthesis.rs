//! Grounded answer synthesis.

use super::Task;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, LanguageModel};
use crate::vector_store::SearchHit;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Build the synthesis messages for a question over the given hits.
///
/// Hits are embedded as pretty-printed JSON in the order given.
pub fn build_messages(
    prompts: &Prompts,
    hits: &[SearchHit],
    question: &str,
    task: Task,
) -> Result<Vec<ChatMessage>> {
    let transcripts = serde_json::to_string_pretty(hits)?;

    let mut vars = HashMap::new();
    vars.insert("question".to_string(), question.to_string());
    vars.insert("transcripts".to_string(), transcripts);
    vars.insert("task".to_string(), task.as_str().to_string());

    Ok(vec![
        ChatMessage::system(prompts.render_with_custom(&prompts.synthesis.system, &vars)),
        ChatMessage::user(prompts.render_with_custom(&prompts.synthesis.user, &vars)),
    ])
}

/// Ask the language model to answer `question` from `hits`.
#[instrument(skip(llm, prompts, hits), fields(hits = hits.len(), task = %task))]
pub async fn synthesize(
    llm: &dyn LanguageModel,
    prompts: &Prompts,
    hits: &[SearchHit],
    question: &str,
    task: Task,
) -> Result<String> {
    let messages = build_messages(prompts, hits, question, task)?;
    debug!("Synthesizing answer with {}", llm.model());
    llm.complete(&messages).await
}
