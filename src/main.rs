//! Hark CLI entry point.

use anyhow::Result;
use clap::Parser;
use hark::cli::{commands, Cli, Commands};
use hark::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = commands::load_settings(config_path.as_ref(), &cli.command)?;

    // -v flags override the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hark={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Ask {
            question,
            task,
            limit,
            alpha,
        } => {
            commands::run_ask(question, *task, *limit, *alpha, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            alpha,
        } => {
            commands::run_search(query, *limit, *alpha, settings).await?;
        }

        Commands::Chat => {
            commands::run_chat(settings).await?;
        }

        Commands::Scrape {
            first_page,
            last_page,
            output,
        } => {
            commands::run_scrape(*first_page, *last_page, output.as_deref(), settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_ref()).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path.as_ref(), settings)?;
        }
    }

    Ok(())
}
