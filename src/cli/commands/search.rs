//! Search command implementation.

use super::with_retrieval_overrides;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: Option<usize>,
    alpha: Option<f32>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Query)?;

    let settings = with_retrieval_overrides(settings, limit, alpha)?;
    let orchestrator = Orchestrator::new(settings)?;
    let chain = orchestrator.chain()?;

    let spinner = Output::spinner("Searching...");
    let result = chain.retrieve(query).await;
    spinner.finish_and_clear();

    match result {
        Ok(retrieval) => {
            Output::kv("Search query", &retrieval.formatted_query);
            if retrieval.hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", retrieval.hits.len()));
                for hit in &retrieval.hits {
                    Output::chunk(&hit.chunk.timestamp, hit.score, &hit.chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
