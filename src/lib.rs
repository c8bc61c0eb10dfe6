//! Hark - Podcast Transcript Assistant
//!
//! Ask questions about a podcast back catalogue and get answers grounded in
//! the transcripts.
//!
//! # Overview
//!
//! Each question runs through one chain:
//! - the question is rewritten into a search query by a language model
//! - the rewritten query is embedded and a hybrid (vector + keyword) search
//!   runs against a Weaviate index of transcript chunks
//! - hits are put back in episode order by timestamp
//! - the language model answers from those hits
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `embedding` - Embedding generation
//! - `llm` - Chat model abstraction
//! - `vector_store` - Transcript index backends (Weaviate, in-memory)
//! - `chain` - The retrieval-and-synthesis pipeline
//! - `agent` - Chat sessions, conversation memory and feedback
//! - `scrape` - Transcript scraper
//! - `orchestrator` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use hark::chain::ChainInput;
//! use hark::config::Settings;
//! use hark::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     let chain = orchestrator.chain()?;
//!
//!     let output = chain.invoke(ChainInput::new("What do they say about cover crops?")).await?;
//!     println!("{}", output.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chain;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod scrape;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{HarkError, Result};
