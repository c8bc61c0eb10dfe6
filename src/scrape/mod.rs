//! Podcast transcript scraper.
//!
//! Walks the paginated episode listing, follows each episode link and saves
//! the transcript body as plain text, one file per episode.

use crate::error::{HarkError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, instrument, warn};
use url::Url;

/// Title used when an episode page has no header.
pub const UNTITLED_EPISODE: &str = "Untitled Episode";

const LINK_SELECTOR: &str = "a.btn.btn-primary.btn--outline.podcast-default-btn";
const TITLE_SELECTOR: &str = "h1.podcast-episode-header__title";
const BODY_SELECTOR: &str = "div.podcast-episode-transcript__body";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarkError::Scrape(format!("Bad selector {}: {:?}", css, e)))
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"))
}

/// Remove characters that are not allowed in file names.
pub fn clean_filename(name: &str) -> String {
    filename_re().replace_all(name, "").into_owned()
}

/// Episode links on a listing page, resolved against `page_url`.
pub fn extract_episode_links(html: &str, page_url: &Url) -> Result<Vec<Url>> {
    let document = Html::parse_document(html);
    let links = selector(LINK_SELECTOR)?;

    Ok(document
        .select(&links)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| match page_url.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Skipping bad link {}: {}", href, e);
                None
            }
        })
        .collect())
}

/// Non-empty, trimmed text nodes under an element.
fn stripped_strings(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Title and transcript text of an episode page.
///
/// The transcript is `None` when the page has no transcript body or the
/// body holds no text. Each
/// paragraph contributes its text pieces on separate lines (surrounding
/// quotes removed from the first piece) followed by a blank line.
pub fn extract_transcript(html: &str) -> Result<(Option<String>, String)> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector(TITLE_SELECTOR)?)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_EPISODE.to_string());

    let body = match document.select(&selector(BODY_SELECTOR)?).next() {
        Some(body) => body,
        None => return Ok((None, title)),
    };

    let paragraph = selector("p")?;
    let mut lines: Vec<String> = Vec::new();
    for p in body.select(&paragraph) {
        let parts = stripped_strings(p);
        if let Some((first, rest)) = parts.split_first() {
            lines.push(first.trim_matches('"').to_string());
            lines.extend(rest.iter().cloned());
        }
        lines.push(String::new());
    }

    let transcript = lines.join("\n");
    if transcript.trim().is_empty() {
        return Ok((None, title));
    }
    Ok((Some(transcript), title))
}

/// Totals from a scrape run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeReport {
    pub pages: u32,
    pub episodes_saved: usize,
    pub missing_transcripts: usize,
    pub failed: usize,
}

/// Fetches listing and episode pages and writes transcripts to disk.
pub struct PodcastScraper {
    http: reqwest::Client,
    base_url: String,
    output_dir: PathBuf,
}

impl PodcastScraper {
    pub fn new(base_url: &str, output_dir: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("hark/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            output_dir,
        })
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Listing page URL for a page number.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, page))?)
    }

    /// Episode links on one listing page.
    pub async fn scrape_podcast_links(&self, page_url: &Url) -> Result<Vec<Url>> {
        let html = self.fetch(page_url).await?;
        extract_episode_links(&html, page_url)
    }

    /// Transcript and title of one episode.
    pub async fn scrape_transcript(&self, url: &Url) -> Result<(Option<String>, String)> {
        let html = self.fetch(url).await?;
        extract_transcript(&html)
    }

    /// Write a transcript to `<output_dir>/<clean title>.txt`.
    pub fn save_transcript(&self, transcript: &str, title: &str) -> Result<PathBuf> {
        save_transcript(&self.output_dir, transcript, title)
    }

    /// Scrape every listing page in `first_page..=last_page`.
    ///
    /// A failing episode is logged and counted; a failing listing page
    /// aborts the run.
    #[instrument(skip(self))]
    pub async fn run(&self, first_page: u32, last_page: u32) -> Result<ScrapeReport> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = ScrapeReport::default();

        for page in first_page..=last_page {
            let url = self.page_url(page)?;
            info!("Scraping page {}: {}", page, url);

            let links = self.scrape_podcast_links(&url).await?;
            for link in links {
                info!("Scraping transcript from: {}", link);
                match self.scrape_transcript(&link).await {
                    Ok((Some(transcript), title)) => {
                        let path = self.save_transcript(&transcript, &title)?;
                        info!("Transcript saved to {}", path.display());
                        report.episodes_saved += 1;
                    }
                    Ok((None, title)) => {
                        warn!("Transcript not found for: {}", title);
                        report.missing_transcripts += 1;
                    }
                    Err(e) => {
                        warn!("Failed to scrape {}: {}", link, e);
                        report.failed += 1;
                    }
                }
            }

            report.pages += 1;
            info!("Finished scraping page {}", page);
        }

        info!("Total episodes scraped: {}", report.episodes_saved);
        Ok(report)
    }
}

fn save_transcript(dir: &Path, transcript: &str, title: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{}.txt", clean_filename(title)));
    std::fs::write(&path, transcript)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <a class="btn btn-primary btn--outline podcast-default-btn" href="/podcasts/ep-1">Listen</a>
          <a class="btn btn-primary podcast-default-btn" href="/not-an-episode">Other</a>
          <a class="btn btn-primary btn--outline podcast-default-btn" href="https://example.com/ep-2">Listen</a>
          <a class="btn btn-primary btn--outline podcast-default-btn">No href</a>
        </body></html>
    "#;

    const EPISODE: &str = r#"
        <html><body>
          <h1 class="podcast-episode-header__title">  Grazing: Part 1  </h1>
          <div class="podcast-episode-transcript__body">
            <p>"00:00 Host:" <strong>Welcome</strong> back</p>
            <p>   </p>
            <p>01:12 Guest: We moved cattle daily.</p>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename(r#"Ep 1: "Soil" / Water? <Part|2>*"#), "Ep 1 Soil  Water Part2");
        assert_eq!(clean_filename("plain title"), "plain title");
    }

    #[test]
    fn test_extract_episode_links() {
        let page = Url::parse("https://courses.example.com/podcasts/show?page=1").unwrap();
        let links = extract_episode_links(LISTING, &page).unwrap();
        let links: Vec<String> = links.into_iter().map(|u| u.to_string()).collect();
        assert_eq!(
            links,
            vec![
                "https://courses.example.com/podcasts/ep-1",
                "https://example.com/ep-2"
            ]
        );
    }

    #[test]
    fn test_extract_transcript() {
        let (transcript, title) = extract_transcript(EPISODE).unwrap();
        assert_eq!(title, "Grazing: Part 1");
        assert_eq!(
            transcript.unwrap(),
            "00:00 Host:\nWelcome\nback\n\n\n01:12 Guest: We moved cattle daily.\n"
        );
    }

    #[test]
    fn test_missing_body_and_title() {
        let (transcript, title) = extract_transcript("<html><body><p>hi</p></body></html>").unwrap();
        assert!(transcript.is_none());
        assert_eq!(title, UNTITLED_EPISODE);
    }

    #[test]
    fn test_empty_body_has_no_transcript() {
        let pages = [
            r#"<h1 class="podcast-episode-header__title">Ep</h1><div class="podcast-episode-transcript__body"></div>"#,
            r#"<h1 class="podcast-episode-header__title">Ep</h1><div class="podcast-episode-transcript__body"><p> </p></div>"#,
        ];
        for page in pages {
            let (transcript, title) = extract_transcript(page).unwrap();
            assert!(transcript.is_none());
            assert_eq!(title, "Ep");
        }
    }

    #[test]
    fn test_save_transcript_uses_clean_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_transcript(dir.path(), "text", "Q&A: what/why?").unwrap();
        assert_eq!(path.file_name().unwrap(), "Q&A whatwhy.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "text");
    }

    #[test]
    fn test_page_url() {
        let scraper = PodcastScraper::new(
            "https://courses.example.com/podcasts/show?items=100&page=",
            PathBuf::from("/tmp/unused"),
        )
        .unwrap();
        assert_eq!(
            scraper.page_url(3).unwrap().as_str(),
            "https://courses.example.com/podcasts/show?items=100&page=3"
        );
    }
}
