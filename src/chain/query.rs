//! Query reformulation.

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, LanguageModel};
use std::collections::HashMap;
use tracing::instrument;

/// Ask the language model to turn a user question into a search query.
///
/// The reply is trimmed; nothing else is post-processed.
#[instrument(skip(llm, prompts))]
pub async fn format_retrieval_query(
    llm: &dyn LanguageModel,
    prompts: &Prompts,
    question: &str,
) -> Result<String> {
    let mut vars = HashMap::new();
    vars.insert("query".to_string(), question.to_string());

    let messages = [
        ChatMessage::system(prompts.render_with_custom(&prompts.query.system, &vars)),
        ChatMessage::user(prompts.render_with_custom(&prompts.query.user, &vars)),
    ];

    let reply = llm.complete(&messages).await?;
    Ok(reply.trim().to_string())
}
