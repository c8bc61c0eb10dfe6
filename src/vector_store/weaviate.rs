//! Weaviate-backed transcript index.
//!
//! Talks to Weaviate's GraphQL endpoint over HTTP. Hybrid fusion happens
//! server side; this client only builds queries and decodes hits.

use super::{HybridQuery, SearchHit, TranscriptChunk, TranscriptIndex};
use crate::config::WeaviateSettings;
use crate::error::{HarkError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Client for a Weaviate class of transcript chunks.
pub struct WeaviateIndex {
    http: reqwest::Client,
    base_url: Url,
    class_name: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl WeaviateIndex {
    /// Create a client from settings.
    pub fn new(settings: &WeaviateSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Self::with_client(http, settings)
    }

    /// Create a client with a preconfigured HTTP client.
    pub fn with_client(http: reqwest::Client, settings: &WeaviateSettings) -> Result<Self> {
        if !is_graphql_name(&settings.class_name) {
            return Err(HarkError::Config(format!(
                "Invalid Weaviate class name: {:?}",
                settings.class_name
            )));
        }

        let mut base_url = Url::parse(&settings.url)?;
        // Endpoints are joined as relative paths, so keep any path prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            class_name: settings.class_name.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Build the GraphQL text for a hybrid `Get` query.
    fn hybrid_query_text(&self, query: &HybridQuery) -> Result<String> {
        // A JSON string literal is a valid GraphQL string literal.
        let text = serde_json::to_string(&query.text)?;
        let vector = serde_json::to_string(&query.vector)?;

        Ok(format!(
            "{{ Get {{ {class}(hybrid: {{ query: {text}, vector: {vector}, alpha: {alpha} }}, limit: {limit}) {{ timestamp text _additional {{ score }} }} }} }}",
            class = self.class_name,
            text = text,
            vector = vector,
            alpha = query.alpha,
            limit = query.limit,
        ))
    }

    /// POST a GraphQL query and return its `data` object.
    async fn graphql(&self, query: String) -> Result<Value> {
        let url = self.endpoint("v1/graphql")?;
        let response = self
            .authorize(self.http.post(url))
            .json(&json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?;

        let body: GraphQlResponse = response.json().await?;
        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(HarkError::VectorStore(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| HarkError::VectorStore("GraphQL response has no data".to_string()))
    }
}

/// GraphQL names: a letter or underscore followed by letters, digits or underscores.
fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Weaviate reports `_additional.score` as a string; accept numbers too.
fn parse_score(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
        _ => 0.0,
    }
}

/// Decode the objects under `data.Get.<class>`.
fn decode_hits(data: &Value, class_name: &str) -> Result<Vec<SearchHit>> {
    let objects = data
        .get("Get")
        .and_then(|g| g.get(class_name))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            HarkError::VectorStore(format!("Response is missing Get.{}", class_name))
        })?;

    let hits = objects
        .iter()
        .filter_map(|obj| {
            let chunk: TranscriptChunk = match serde_json::from_value(obj.clone()) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("Skipping malformed chunk: {}", e);
                    return None;
                }
            };
            let score = parse_score(obj.get("_additional").and_then(|a| a.get("score")));
            Some(SearchHit { chunk, score })
        })
        .collect();

    Ok(hits)
}

#[async_trait]
impl TranscriptIndex for WeaviateIndex {
    #[instrument(skip(self, query), fields(class = %self.class_name, alpha = query.alpha, limit = query.limit))]
    async fn hybrid_search(&self, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        let text = self.hybrid_query_text(query)?;
        let data = self.graphql(text).await?;
        let hits = decode_hits(&data, &self.class_name)?;
        debug!("Weaviate returned {} hits", hits.len());
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let query = format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", self.class_name);
        let data = self.graphql(query).await?;

        data.get("Aggregate")
            .and_then(|a| a.get(&self.class_name))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("meta"))
            .and_then(|meta| meta.get("count"))
            .and_then(Value::as_u64)
            .map(|c| c as usize)
            .ok_or_else(|| HarkError::VectorStore("Aggregate response has no count".to_string()))
    }

    async fn is_ready(&self) -> bool {
        let url = match self.endpoint("v1/.well-known/ready") {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.authorize(self.http.get(url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Weaviate readiness check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> WeaviateIndex {
        WeaviateIndex::new(&WeaviateSettings::default()).unwrap()
    }

    #[test]
    fn test_hybrid_query_text() {
        let text = index()
            .hybrid_query_text(&HybridQuery {
                text: "say \"soil\"".to_string(),
                vector: vec![0.5, -1.0],
                alpha: 0.75,
                limit: 20,
            })
            .unwrap();

        assert!(text.contains("PodcastChunk(hybrid:"));
        assert!(text.contains(r#"query: "say \"soil\"""#));
        assert!(text.contains("vector: [0.5,-1.0]"));
        assert!(text.contains("alpha: 0.75"));
        assert!(text.contains("limit: 20"));
        assert!(text.contains("_additional { score }"));
    }

    #[test]
    fn test_rejects_bad_class_name() {
        let settings = WeaviateSettings {
            class_name: "Podcast) { x }".to_string(),
            ..WeaviateSettings::default()
        };
        assert!(matches!(
            WeaviateIndex::new(&settings),
            Err(HarkError::Config(_))
        ));
    }

    #[test]
    fn test_decode_hits() {
        let data = json!({
            "Get": {
                "PodcastChunk": [
                    { "timestamp": "03:15", "text": "cover crops", "_additional": { "score": "0.81" } },
                    { "timestamp": "00:42", "text": "intro", "_additional": { "score": 0.2 } },
                    { "text": "no timestamp" }
                ]
            }
        });

        let hits = decode_hits(&data, "PodcastChunk").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.timestamp, "03:15");
        assert!((hits[0].score - 0.81).abs() < 1e-6);
        assert!((hits[1].score - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_decode_missing_class() {
        let data = json!({ "Get": {} });
        assert!(decode_hits(&data, "PodcastChunk").is_err());
    }

    #[test]
    fn test_endpoints_keep_path_prefix() {
        for url in ["http://proxy.local/weaviate", "http://proxy.local/weaviate/"] {
            let settings = WeaviateSettings {
                url: url.to_string(),
                ..WeaviateSettings::default()
            };
            let index = WeaviateIndex::new(&settings).unwrap();
            assert_eq!(
                index.endpoint("v1/graphql").unwrap().as_str(),
                "http://proxy.local/weaviate/v1/graphql"
            );
        }
        assert_eq!(
            index().endpoint("v1/.well-known/ready").unwrap().as_str(),
            "http://localhost:8080/v1/.well-known/ready"
        );
    }

    #[test]
    fn test_graphql_name() {
        assert!(is_graphql_name("PodcastChunk"));
        assert!(is_graphql_name("_Chunk2"));
        assert!(!is_graphql_name("2Chunk"));
        assert!(!is_graphql_name(""));
    }
}
