//! User feedback on answers.

use crate::error::{HarkError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// One rating of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub query: String,
    pub response: String,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Records feedback to the log and, when configured, to a JSON-lines file.
#[derive(Debug, Clone, Default)]
pub struct FeedbackSystem {
    path: Option<PathBuf>,
    /// Serialises appends from clones sharing one log file.
    write_lock: Arc<Mutex<()>>,
}

impl FeedbackSystem {
    /// Log-only feedback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feedback that is also appended to `path`.
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            write_lock: Arc::default(),
        }
    }

    /// Record a rating for a query/response pair.
    pub fn collect_feedback(
        &self,
        user_id: &str,
        query: &str,
        response: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Feedback> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(HarkError::Feedback(format!(
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, rating
            )));
        }

        let feedback = Feedback {
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
            rating,
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        info!(
            user_id = %feedback.user_id,
            rating = feedback.rating,
            comment = feedback.comment.as_deref().unwrap_or(""),
            "User feedback"
        );

        if let Some(path) = &self.path {
            // One write per record, so a line is never split.
            let line = format!("{}\n", serde_json::to_string(&feedback)?);
            let _guard = self
                .write_lock
                .lock()
                .map_err(|e| HarkError::Feedback(format!("Failed to acquire lock: {}", e)))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            file.write_all(line.as_bytes())?;
        }

        Ok(feedback)
    }
}
