//! Prompt templates for Hark.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub query: QueryPrompts,
    pub synthesis: SynthesisPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for turning a user request into a search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You rewrite user requests into search queries for a hybrid index of podcast transcript chunks. The index combines keyword matching with vector similarity over OpenAI embeddings.

Given a user request:
1. Pick out the people, topics and terms the request is about.
2. Add closely related aspects of each term that a podcast conversation would mention.
3. Write one short descriptive sentence or phrase that captures the term and those aspects, phrased the way a podcast host would talk about it.

Keep the query focused on what the user wants to hear about. Keep it short.

Return only the query text, nothing else."#
                .to_string(),

            user: "Format this user query for transcript retrieval: {{query}}".to_string(),
        }
    }
}

/// Prompts for synthesizing an answer from retrieved chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SynthesisPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that answers questions from podcast transcript excerpts. Give the user a detailed answer built from the excerpts you are given.

Rules:
1. Only use information that appears in the provided transcript excerpts. Never invent or infer facts they do not contain.
2. If the excerpts do not cover everything the question asks, say clearly what is missing.

Read every excerpt before answering. Explain what the transcripts say and why each excerpt you rely on is relevant, so the user can follow how the answer was assembled."#
                .to_string(),

            user: r#"Original question: {{question}}
PodcastChunk:
{{transcripts}}
Please {{task}} the information from these transcripts to answer the original question."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let query_path = custom_path.join("query.toml");
            if query_path.exists() {
                let content = std::fs::read_to_string(&query_path)?;
                prompts.query = toml::from_str(&content)?;
            }

            let synthesis_path = custom_path.join("synthesis.toml");
            if synthesis_path.exists() {
                let content = std::fs::read_to_string(&synthesis_path)?;
                prompts.synthesis = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in one pass, so substituted values are never
    /// expanded again. Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_re()
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
