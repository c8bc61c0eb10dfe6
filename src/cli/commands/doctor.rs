//! Doctor command - verify configuration and connectivity.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{TranscriptIndex, WeaviateIndex};
use console::style;
use std::path::PathBuf;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    Output::header("Hark Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref());
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Weaviate").bold());
    let weaviate_checks = check_weaviate(settings).await;
    for check in &weaviate_checks {
        check.print();
    }
    checks.extend(weaviate_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_path = config_path
        .cloned()
        .unwrap_or_else(Settings::default_config_path);
    let config_check = check_config_file(&config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Hark.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Hark is ready to use.");
    }

    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check that Weaviate answers and the transcript class holds data.
async fn check_weaviate(settings: &Settings) -> Vec<CheckResult> {
    let hint = "Start Weaviate or set weaviate.url in the config file";
    let index = match WeaviateIndex::new(&settings.weaviate) {
        Ok(index) => index,
        Err(e) => return vec![CheckResult::error("Weaviate", &e.to_string(), hint)],
    };

    if !index.is_ready().await {
        return vec![CheckResult::error(
            "Weaviate",
            &format!("{} is not ready", settings.weaviate.url),
            hint,
        )];
    }

    let mut results = vec![CheckResult::ok("Weaviate", &settings.weaviate.url)];
    let class = &settings.weaviate.class_name;
    results.push(match index.count().await {
        Ok(0) => CheckResult::warning(
            class,
            "no transcript chunks indexed",
            "Load transcripts into this class before asking questions",
        ),
        Ok(n) => CheckResult::ok(class, &format!("{} chunks", n)),
        Err(e) => CheckResult::error(
            class,
            &e.to_string(),
            "Check weaviate.class_name in the config file",
        ),
    });
    results
}

/// Check data directories and files.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let feedback_path = settings.feedback_path();
    if feedback_path.exists() {
        let size = std::fs::metadata(&feedback_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Feedback log",
            &format!("{} ({})", feedback_path.display(), size),
        ));
    } else {
        results.push(CheckResult::ok(
            "Feedback log",
            &format!("{} (no feedback yet)", feedback_path.display()),
        ));
    }

    let transcripts = settings.scrape_output_dir();
    if transcripts.exists() {
        results.push(CheckResult::ok("Transcripts", &format!("{}", transcripts.display())));
    } else {
        results.push(CheckResult::warning(
            "Transcripts",
            &format!("{} (not scraped yet)", transcripts.display()),
            "Download with: hark scrape",
        ));
    }

    results
}

/// Check if the config file exists.
fn check_config_file(config_path: &PathBuf) -> CheckResult {
    if config_path.exists() {
        match Settings::load_from(Some(config_path)).and_then(|s| s.validate()) {
            Ok(()) => CheckResult::ok("Config file", &format!("{}", config_path.display())),
            Err(e) => CheckResult::error("Config file", &e.to_string(), "Fix with: hark config edit"),
        }
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: hark config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_api_key_check() {
        let ok = check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz"));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert!(ok.message.contains("sk-abcd...wxyz"));

        assert_eq!(check_openai_api_key(Some("")).status, CheckStatus::Error);
        assert_eq!(check_openai_api_key(Some("token")).status, CheckStatus::Warning);
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Error);
    }

    #[test]
    fn test_config_file_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(check_config_file(&path).status, CheckStatus::Warning);

        Settings::default().save_to(&path).unwrap();
        assert_eq!(check_config_file(&path).status, CheckStatus::Ok);

        std::fs::write(&path, "[retrieval]\nalpha = 3.0\n").unwrap();
        assert_eq!(check_config_file(&path).status, CheckStatus::Error);
    }

    #[tokio::test]
    async fn test_weaviate_unreachable() {
        let mut settings = Settings::default();
        settings.weaviate.url = "http://127.0.0.1:1".to_string();
        settings.weaviate.timeout_secs = 1;
        let results = check_weaviate(&settings).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Error);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
