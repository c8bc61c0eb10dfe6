//! Scrape command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::scrape::PodcastScraper;
use anyhow::Result;

/// Run the scrape command.
pub async fn run_scrape(
    first_page: Option<u32>,
    last_page: Option<u32>,
    output: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let first = first_page.unwrap_or(settings.scrape.first_page);
    let last = last_page.unwrap_or(settings.scrape.last_page);
    if first > last {
        anyhow::bail!("--first-page ({}) is after --last-page ({})", first, last);
    }

    let output_dir = match output {
        Some(dir) => Settings::expand_path(dir),
        None => settings.scrape_output_dir(),
    };

    Output::info(&format!(
        "Scraping pages {}-{} of {} into {}",
        first,
        last,
        settings.scrape.base_url,
        output_dir.display()
    ));

    let scraper = PodcastScraper::new(&settings.scrape.base_url, output_dir)?;
    let spinner = Output::spinner("Downloading transcripts...");
    let result = scraper.run(first, last).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Scrape failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Saved {} transcripts from {} pages",
        report.episodes_saved, report.pages
    ));
    if report.missing_transcripts > 0 {
        Output::warning(&format!(
            "{} episodes had no transcript",
            report.missing_transcripts
        ));
    }
    if report.failed > 0 {
        Output::warning(&format!("{} episodes failed to download", report.failed));
    }

    Ok(())
}
