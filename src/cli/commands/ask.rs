//! Ask command implementation.

use super::with_retrieval_overrides;
use crate::agent::{clean_html, parse_llm_output};
use crate::chain::{ChainInput, Task};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    task: Option<Task>,
    limit: Option<usize>,
    alpha: Option<f32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        Output::info("Run 'hark doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let settings = with_retrieval_overrides(settings, limit, alpha)?;
    let orchestrator = Orchestrator::new(settings)?;
    let chain = orchestrator.chain()?;

    let mut input = ChainInput::new(question);
    if let Some(task) = task {
        input = input.with_task(task);
    }

    let spinner = Output::spinner("Searching transcripts...");
    let result = chain.invoke(input).await;
    spinner.finish_and_clear();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    let (html, summary) = parse_llm_output(&output.answer);
    if !html.is_empty() {
        println!("\n{}", clean_html(&html));
    }
    if !summary.is_empty() {
        println!("\n{}\n", summary);
    }

    if !output.sources.is_empty() {
        Output::header(&format!("Sources ({})", output.sources.len()));
        for hit in &output.sources {
            Output::chunk(&hit.chunk.timestamp, hit.score, &hit.chunk.text);
        }
    }

    Ok(())
}
