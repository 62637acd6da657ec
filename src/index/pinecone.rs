//! Pinecone-backed vector index.
//!
//! Pinecone has no server-side score filter, so thresholded searches fetch
//! the top-k matches and drop those below the bar.

use super::{RetrievedDocument, VectorIndex};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use url::Url;

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Metadata key holding the chunk text, as written by the ingestion scripts.
const TEXT_KEY: &str = "text";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

/// A handle to one Pinecone index.
pub struct PineconeIndex {
    http: reqwest::Client,
    name: String,
    api_key: String,
    query_url: Url,
    namespace: Option<String>,
}

impl PineconeIndex {
    /// Connect to an index, looking up its data-plane host unless one is given.
    #[instrument(skip(http, api_key))]
    pub async fn connect(
        http: reqwest::Client,
        api_key: &str,
        name: &str,
        host: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<Self> {
        let host = match host {
            Some(h) => h.to_string(),
            None => Self::describe_host(&http, api_key, name).await?,
        };
        let query_url = query_url(&host)?;
        info!("Connected to Pinecone index {} at {}", name, query_url);

        Ok(Self {
            http,
            name: name.to_string(),
            api_key: api_key.to_string(),
            query_url,
            namespace: namespace.map(str::to_string),
        })
    }

    async fn describe_host(http: &reqwest::Client, api_key: &str, name: &str) -> Result<String> {
        let url = format!("{}/indexes/{}", CONTROL_PLANE_URL, name);
        let response = http
            .get(&url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Index(format!(
                "Failed to describe index {} ({}): {}",
                name, status, body
            )));
        }

        let description: IndexDescription = response.json().await?;
        Ok(description.host)
    }

    async fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        let request = QueryRequest {
            vector: query_embedding,
            top_k: k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .http
            .post(self.query_url.clone())
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::Index(format!(
                "Query against {} failed ({}): {}",
                self.name, status, body
            )));
        }

        let parsed: QueryResponse = response.json().await?;
        debug!("{} returned {} matches", self.name, parsed.matches.len());
        Ok(parsed.matches.into_iter().map(to_document).collect())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        self.query(query_embedding, k).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<RetrievedDocument>> {
        let mut documents = self.query(query_embedding, k).await?;
        documents.retain(|d| d.relevance_score >= min_score);
        Ok(documents)
    }
}

/// Build the query endpoint from a host that may or may not carry a scheme.
fn query_url(host: &str) -> Result<Url> {
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&base)
        .and_then(|u| u.join("/query"))
        .map_err(|e| TutorError::Config(format!("Invalid Pinecone host {}: {}", host, e)))
}

fn to_document(m: QueryMatch) -> RetrievedDocument {
    let metadata = m.metadata.unwrap_or_default();
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| metadata.get(*k).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    };

    RetrievedDocument {
        content: field(&[TEXT_KEY, "page_content"]),
        heading: field(&["heading", "title"]),
        url: field(&["url", "source"]),
        relevance_score: m.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url() {
        let url = query_url("financetutor-abc123.svc.aped-4627-b74a.pinecone.io").unwrap();
        assert_eq!(
            url.as_str(),
            "https://financetutor-abc123.svc.aped-4627-b74a.pinecone.io/query"
        );

        let local = query_url("http://localhost:5080").unwrap();
        assert_eq!(local.as_str(), "http://localhost:5080/query");
    }

    #[test]
    fn test_match_to_document() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"matches": [
                {"id": "a", "score": 0.82, "metadata": {"text": "Money now is worth more", "heading": "Time value of money", "url": "https://kb/tvm"}},
                {"id": "b", "score": 0.41, "metadata": {"text": "Video chunk", "title": "Bonds 101", "source": "https://youtu.be/x?t=60"}},
                {"id": "c", "score": 0.10}
            ]}"#,
        )
        .unwrap();

        let docs: Vec<_> = response.matches.into_iter().map(to_document).collect();
        assert_eq!(docs[0].heading, "Time value of money");
        assert_eq!(docs[0].content, "Money now is worth more");
        assert!((docs[0].relevance_score - 0.82).abs() < 1e-6);
        assert_eq!(docs[1].heading, "Bonds 101");
        assert_eq!(docs[1].url, "https://youtu.be/x?t=60");
        assert_eq!(docs[2].content, "");
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1f32, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }
}
