//! Configuration module for Hark.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QueryPrompts, SynthesisPrompts};
pub use settings::{
    ChatSettings, EmbeddingSettings, GeneralSettings, LlmSettings, OpenAISettings,
    PromptSettings, RetrievalSettings, ScrapeSettings, Settings, WeaviateSettings,
};
