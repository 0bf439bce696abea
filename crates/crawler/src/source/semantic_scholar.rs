//! Semantic Scholar Graph API client

use super::{RawPaper, RecordSource};
use async_trait::async_trait;
use citree_common::config::SourceConfig;
use citree_common::errors::{AppError, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Fields requested for every paper
const PAPER_FIELDS: &str = "title,venue,year,abstract,authors,citations.externalIds";

/// Semantic Scholar lookup client.
///
/// Issues exactly one HTTP request per lookup; retries are paced by the
/// fetcher so that every attempt is charged to the call budget.
pub struct SemanticScholarClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl SemanticScholarClient {
    /// Create a new client
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("citree/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn paper_url(&self, doi: &str) -> String {
        format!("{}/paper/DOI:{}", self.base_url, doi)
    }

    async fn make_request(&self, doi: &str) -> Result<RawPaper> {
        let mut request = self
            .client
            .get(self.paper_url(doi))
            .query(&[("fields", PAPER_FIELDS)]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamTimeout {
                    id: doi.to_string(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                AppError::HttpClient(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::PaperNotFound { id: doi.to_string() });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited { id: doi.to_string() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("API error {}: {}", status, body);
            return Err(if status.is_server_error() {
                AppError::Upstream { id: doi.to_string(), message }
            } else {
                AppError::InvalidResponse { id: doi.to_string(), message }
            });
        }

        response.json::<RawPaper>().await.map_err(|e| AppError::InvalidResponse {
            id: doi.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl RecordSource for SemanticScholarClient {
    async fn lookup(&self, doi: &str) -> Result<RawPaper> {
        self.make_request(doi).await
    }

    fn name(&self) -> &str {
        "semantic_scholar"
    }
}
