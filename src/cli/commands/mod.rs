//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod scrape;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use scrape::run_scrape;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::{Commands, Output};
use crate::config::Settings;
use crate::error::Result;
use std::path::PathBuf;

/// Load settings for `command`.
///
/// `config` and `doctor` exist to repair or diagnose a broken file, so they
/// fall back to defaults when it cannot be parsed.
pub fn load_settings(config_path: Option<&PathBuf>, command: &Commands) -> Result<Settings> {
    match Settings::load_from(config_path) {
        Ok(settings) => Ok(settings),
        Err(e) if matches!(command, Commands::Config { .. } | Commands::Doctor) => {
            Output::warning(&format!("Could not read config ({}); using defaults", e));
            Ok(Settings::default())
        }
        Err(e) => Err(e),
    }
}

/// Apply per-invocation retrieval overrides from the command line.
pub(crate) fn with_retrieval_overrides(
    mut settings: Settings,
    limit: Option<usize>,
    alpha: Option<f32>,
) -> Result<Settings> {
    if let Some(limit) = limit {
        settings.retrieval.limit = limit;
    }
    if let Some(alpha) = alpha {
        settings.retrieval.alpha = alpha;
    }
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigAction;

    #[test]
    fn test_retrieval_overrides() {
        let settings = with_retrieval_overrides(Settings::default(), Some(5), Some(0.5)).unwrap();
        assert_eq!(settings.retrieval.limit, 5);
        assert_eq!(settings.retrieval.alpha, 0.5);

        let untouched = with_retrieval_overrides(Settings::default(), None, None).unwrap();
        assert_eq!(untouched.retrieval.limit, 20);
        assert_eq!(untouched.retrieval.alpha, 0.75);
    }

    #[test]
    fn test_broken_config_still_loads_for_repair_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval\nalpha = ").unwrap();

        let doctor = load_settings(Some(&path), &Commands::Doctor).unwrap();
        assert_eq!(doctor.retrieval.alpha, 0.75);
        let edit = Commands::Config {
            action: ConfigAction::Edit,
        };
        assert!(load_settings(Some(&path), &edit).is_ok());
        assert!(load_settings(Some(&path), &Commands::Chat).is_err());
    }

    #[test]
    fn test_invalid_values_reach_doctor_but_not_queries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\nalpha = 1.5\n").unwrap();

        let settings = load_settings(Some(&path), &Commands::Doctor).unwrap();
        assert_eq!(settings.retrieval.alpha, 1.5);
        assert!(with_retrieval_overrides(settings, None, None).is_err());
    }

    #[test]
    fn test_retrieval_overrides_rejects_bad_alpha() {
        assert!(with_retrieval_overrides(Settings::default(), None, Some(1.5)).is_err());
    }
}
