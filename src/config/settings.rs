//! Configuration settings for Hark.

use crate::chain::Task;
use crate::error::{HarkError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub weaviate: WeaviateSettings,
    pub retrieval: RetrievalSettings,
    pub chat: ChatSettings,
    pub scrape: ScrapeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (feedback log, etc.).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hark".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use. Must match the model the index was built with.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
        }
    }
}

/// Language model settings, shared by query reformulation and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
        }
    }
}

/// Weaviate connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaviateSettings {
    /// Base URL of the Weaviate instance.
    pub url: String,
    /// Class holding the transcript chunks.
    pub class_name: String,
    /// API key (sent as a bearer token when set).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WeaviateSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            class_name: "PodcastChunk".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Hybrid retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Weight toward vector similarity (1.0 = pure vector, 0.0 = pure keyword).
    pub alpha: f32,
    /// Number of chunks to retrieve.
    pub limit: usize,
    /// Task used when a caller does not name one.
    pub default_task: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            alpha: 0.75,
            limit: 20,
            default_task: "summary".to_string(),
        }
    }
}

/// Interactive chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Task used for every chat turn.
    pub task: String,
    /// Maximum messages kept in the conversation buffer (unbounded if unset).
    pub history_limit: Option<usize>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            task: "retrieve".to_string(),
            history_limit: None,
        }
    }
}

/// Transcript scraper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Listing URL; the page number is appended to it.
    pub base_url: String,
    pub first_page: u32,
    pub last_page: u32,
    /// Directory transcripts are written to.
    pub output_dir: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://courses.floodlightgrp.com/podcasts/head-heart-boots?items=100&page="
                .to_string(),
            first_page: 1,
            last_page: 13,
            output_dir: "~/.hark/transcripts".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Only parses the file. Callers that act on the values run
    /// [`validate`](Self::validate).
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str::<Settings>(&content)?)
        } else {
            Ok(Settings::default())
        }
    }

    /// Check values that would otherwise fail deep inside a request.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retrieval.alpha) {
            return Err(HarkError::Config(format!(
                "retrieval.alpha must be between 0 and 1, got {}",
                self.retrieval.alpha
            )));
        }
        if self.retrieval.limit == 0 {
            return Err(HarkError::Config(
                "retrieval.limit must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.weaviate.url)
            .map_err(|e| HarkError::Config(format!("weaviate.url: {}", e)))?;
        if self.scrape.first_page > self.scrape.last_page {
            return Err(HarkError::Config(format!(
                "scrape.first_page ({}) is after scrape.last_page ({})",
                self.scrape.first_page, self.scrape.last_page
            )));
        }
        self.default_task()?;
        self.chat_task()?;
        Ok(())
    }

    /// Task used when a caller does not name one.
    pub fn default_task(&self) -> Result<Task> {
        self.retrieval
            .default_task
            .parse()
            .map_err(|e| HarkError::Config(format!("retrieval.default_task: {}", e)))
    }

    /// Task used for chat turns.
    pub fn chat_task(&self) -> Result<Task> {
        self.chat
            .task
            .parse()
            .map_err(|e| HarkError::Config(format!("chat.task: {}", e)))
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HarkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hark")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the feedback log path.
    pub fn feedback_path(&self) -> PathBuf {
        self.data_dir().join("feedback.jsonl")
    }

    /// Get the expanded scrape output directory.
    pub fn scrape_output_dir(&self) -> PathBuf {
        Self::expand_path(&self.scrape.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retrieval.alpha, 0.75);
        assert_eq!(settings.retrieval.limit, 20);
        assert_eq!(settings.weaviate.class_name, "PodcastChunk");
        assert_eq!(settings.default_task().unwrap(), Task::Summary);
        assert_eq!(settings.chat_task().unwrap(), Task::Retrieve);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\nalpha = 0.5\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.retrieval.alpha, 0.5);
        assert_eq!(settings.retrieval.limit, 20);
        assert_eq!(settings.llm.model, "gpt-4o");
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        let mut settings = Settings::default();
        settings.retrieval.alpha = 1.5;
        assert!(matches!(settings.validate(), Err(HarkError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_task() {
        let mut settings = Settings::default();
        settings.chat.task = "translate".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.weaviate.url = "http://weaviate.internal:8080".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.weaviate.url, "http://weaviate.internal:8080");
    }

    #[test]
    fn test_invalid_values_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\nalpha = 1.5\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.retrieval.alpha, 1.5);
        assert!(matches!(settings.validate(), Err(HarkError::Config(_))));
    }
}
