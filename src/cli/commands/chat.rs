//! Interactive chat command.

use crate::agent::{clean_html, parse_llm_output, MAX_RATING, MIN_RATING, WELCOME_MESSAGE, WELCOME_TITLE};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use uuid::Uuid;

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Clear,
    Rate(u8),
    BadRate(&'a str),
    Query(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    if line.eq_ignore_ascii_case("clear") {
        return ChatInput::Clear;
    }
    if let Some(arg) = line.strip_prefix("/rate") {
        let arg = arg.trim();
        return match arg.parse::<u8>() {
            Ok(n) if (MIN_RATING..=MAX_RATING).contains(&n) => ChatInput::Rate(n),
            _ => ChatInput::BadRate(arg),
        };
    }
    ChatInput::Query(line)
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        Output::info("Run 'hark doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let chain = Arc::new(orchestrator.chain()?);
    let mut agent = orchestrator.agent(chain)?;
    let user_id = Uuid::new_v4().to_string();

    println!("\n{}", style(WELCOME_TITLE).bold().cyan());
    println!("\n{}\n", WELCOME_MESSAGE);
    println!(
        "{}\n",
        style(format!(
            "Type 'exit' to quit, 'clear' to reset, or '/rate {}-{}' to rate the last answer.",
            MIN_RATING, MAX_RATING
        ))
        .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut pending_rating: Option<u8> = None;

    loop {
        let prompt = if pending_rating.is_some() { "Comment:" } else { "You:" };
        print!("{} ", style(prompt).green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        // The line after a rating is its comment, whatever it says.
        if let Some(rating) = pending_rating.take() {
            let comment = line.trim();
            let comment = (!comment.is_empty()).then_some(comment);
            match agent.rate_last_response(&user_id, rating, comment) {
                Ok(_) => Output::success("Thank you for your feedback!"),
                Err(e) => Output::error(&format!("{}", e)),
            }
            continue;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                agent.clear_history();
                Output::info("Conversation history cleared.");
            }
            ChatInput::Rate(rating) => {
                if agent.memory().last_exchange().is_none() {
                    Output::warning("There is no answer to rate yet.");
                    continue;
                }
                pending_rating = Some(rating);
                Output::info(&format!(
                    "Thank you for rating the response {} stars. Would you like to add a comment? (press Enter to skip)",
                    rating
                ));
            }
            ChatInput::BadRate(arg) => {
                Output::warning(&format!(
                    "'{}' is not a rating. Use /rate {}-{}.",
                    arg, MIN_RATING, MAX_RATING
                ));
            }
            ChatInput::Query(query) => {
                let spinner = Output::spinner("Thinking...");
                let result = agent.process_query(query, &user_id).await;
                spinner.finish_and_clear();

                match result {
                    Ok(output) => {
                        let (html, summary) = parse_llm_output(&output.answer);
                        println!();
                        if !html.is_empty() {
                            println!("{}\n", clean_html(&html));
                        }
                        if !summary.is_empty() {
                            println!("{} {}\n", style("Hark:").cyan().bold(), summary);
                        }
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}
