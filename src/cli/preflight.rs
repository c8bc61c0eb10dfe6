//! Pre-flight checks before commands that call external services.

use crate::error::{HarkError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Asking, searching, chatting and serving call OpenAI for reformulation and embeddings.
    Query,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Query => check_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref()),
    }
}

fn check_api_key(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(HarkError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(HarkError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_check() {
        assert!(check_api_key(Some("sk-test")).is_ok());
        assert!(check_api_key(Some("  ")).is_err());
        assert!(check_api_key(None).is_err());
    }
}
