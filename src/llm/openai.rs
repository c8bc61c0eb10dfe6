//! OpenAI chat completions implementation.

use super::{ChatMessage, LanguageModel, Role};
use crate::error::{HarkError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| HarkError::Llm(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| HarkError::Llm(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| HarkError::Llm(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| HarkError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HarkError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        let answer = completion_text(content)?;

        debug!("Completion returned {} chars", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// A reply with no content is an error. Blank content is passed through so
/// callers can apply their own fallback.
fn completion_text(content: Option<String>) -> Result<String> {
    content.ok_or_else(|| HarkError::Llm("Empty response from LLM".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion_keeps_roles() {
        let system = to_request_message(&ChatMessage::system("s")).unwrap();
        let user = to_request_message(&ChatMessage::user("u")).unwrap();
        let assistant = to_request_message(&ChatMessage::assistant("a")).unwrap();

        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));
        assert!(matches!(assistant, ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_missing_content_is_error_blank_is_passed_through() {
        assert!(matches!(completion_text(None), Err(HarkError::Llm(_))));
        assert_eq!(completion_text(Some("  ".to_string())).unwrap(), "  ");
    }
}
