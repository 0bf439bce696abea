//! Record fetcher
//!
//! Turns a raw lookup into a `PaperRecord`. Every field is defaulted on its
//! own, so a partial payload still yields a usable record and a failed
//! lookup yields the all-unknown record instead of an error.
//!
//! Each HTTP attempt is charged to the call budget. A 429 sends the budget
//! into a full-window cooldown before the next attempt; other transient
//! failures back off exponentially.

use crate::rate_limit::CallBudget;
use crate::source::{RawPaper, RecordSource};
use citree_common::errors::Result;
use citree_common::metrics::FetchMetrics;
use citree_common::models::{NodeRole, PaperRecord, Sentinel};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Delay before the attempt following attempt number `attempt` (1-based)
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Fetches and normalizes paper records
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn RecordSource>,
    max_attempts: u32,
}

impl Fetcher {
    /// Single-attempt fetcher
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            max_attempts: 1,
        }
    }

    /// Allow up to `max_attempts` lookups per paper (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Fetch a paper. Never fails: lookup errors degrade to defaults.
    pub async fn fetch(&self, budget: &mut CallBudget, doi: &str) -> PaperRecord {
        let metrics = FetchMetrics::start();
        match self.lookup(budget, doi).await {
            Ok(raw) => {
                metrics.finish(true);
                let record = normalize(doi, raw);
                debug!(
                    doi = doi,
                    authors = record.author_ids.len(),
                    citations = record.citations.len(),
                    "Fetched record"
                );
                record
            }
            Err(e) => {
                metrics.finish(false);
                warn!(
                    doi = doi,
                    source = self.source.name(),
                    error = %e,
                    "Lookup failed, using defaulted record"
                );
                PaperRecord::unknown(doi)
            }
        }
    }

    async fn lookup(&self, budget: &mut CallBudget, doi: &str) -> Result<RawPaper> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            budget.charge().await;

            let err = match self.source.lookup(doi).await {
                Ok(raw) => return Ok(raw),
                Err(e) => e,
            };
            if attempt >= self.max_attempts || !err.is_transient() {
                return Err(err);
            }

            warn!(
                doi = doi,
                attempt = attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "Lookup failed, retrying"
            );
            if err.is_throttled() {
                budget.cool_down("upstream throttled").await;
            } else {
                tokio::time::sleep(backoff_delay(BASE_BACKOFF, attempt)).await;
            }
        }
    }
}

/// Apply the default substitution table to a raw payload
pub fn normalize(doi: &str, raw: RawPaper) -> PaperRecord {
    let mut authors = Vec::new();
    let mut author_ids = Vec::new();
    let mut author_names = Vec::new();
    for author in raw.authors.unwrap_or_default() {
        let name = author.name.filter(|n| !n.is_empty());
        if let Some(id) = author.author_id.filter(|id| !id.is_empty()) {
            author_ids.push(id);
            author_names.push(name.clone());
        }
        authors.extend(name);
    }

    let mut seen = HashSet::new();
    let citations = raw
        .citations
        .unwrap_or_default()
        .iter()
        .filter_map(|c| c.identifier())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();

    PaperRecord {
        doi: doi.to_string(),
        title: Sentinel::from(raw.title),
        venue: Sentinel::from(raw.venue),
        year: Sentinel::from(raw.year),
        abstract_text: Sentinel::from(raw.r#abstract),
        authors,
        author_ids,
        author_names,
        citations,
        role: NodeRole::Descendant,
        color: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::WindowBudget;
    use crate::source::{RawAuthor, RawCitation, SemanticScholarClient, StaticSource};
    use citree_common::config::SourceConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn budget(window: Duration) -> CallBudget {
        CallBudget::Window(WindowBudget::new(99, window))
    }

    /// Local HTTP endpoint answering every request with `response`.
    /// Returns the base URL and a request counter.
    async fn serve(response: impl Into<String>) -> (String, Arc<AtomicUsize>) {
        let response = response.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0_u8; 4096];
                let _ = stream.read(&mut buf).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{}", addr), requests)
    }

    fn client(base_url: String) -> Arc<SemanticScholarClient> {
        let config = SourceConfig {
            base_url,
            timeout_secs: 5,
            ..Default::default()
        };
        Arc::new(SemanticScholarClient::new(&config).unwrap())
    }

    #[test]
    fn test_missing_fields_default_individually() {
        let raw = RawPaper {
            title: Some("Chronic pain".into()),
            ..Default::default()
        };
        let record = normalize("10.1/x", raw);

        assert_eq!(record.title, Sentinel::Known("Chronic pain".to_string()));
        assert!(record.venue.is_unknown());
        assert!(record.year.is_unknown());
        assert!(record.abstract_text.is_unknown());
        assert!(record.authors.is_empty());
        assert!(record.author_ids.is_empty());
        assert!(record.citations.is_empty());
        assert!(!record.is_unusable());
    }

    #[test]
    fn test_citations_deduplicated_and_filtered() {
        let raw = RawPaper {
            citations: Some(vec![
                RawCitation::doi("10.1/a"),
                RawCitation::default(),
                RawCitation::doi(""),
                RawCitation::doi("10.1/b"),
                RawCitation::doi("10.1/a"),
            ]),
            ..Default::default()
        };
        let record = normalize("10.1/x", raw);
        assert_eq!(record.citations, vec!["10.1/a", "10.1/b"]);
    }

    #[test]
    fn test_author_names_stay_with_their_ids() {
        let raw = RawPaper {
            authors: Some(vec![
                RawAuthor::new("A1", "Ada"),
                RawAuthor {
                    author_id: None,
                    name: Some("Bo".into()),
                },
                RawAuthor {
                    author_id: Some("C3".into()),
                    name: None,
                },
            ]),
            ..Default::default()
        };
        let record = normalize("10.1/x", raw);
        assert_eq!(record.authors, vec!["Ada", "Bo"]);
        assert_eq!(record.author_ids, vec!["A1", "C3"]);
        assert_eq!(record.author_names, vec![Some("Ada".to_string()), None]);
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_unknown_record() {
        let fetcher = Fetcher::new(Arc::new(StaticSource::new())).with_max_attempts(3);
        let mut budget = budget(Duration::from_secs(300));
        let record = fetcher.fetch(&mut budget, "10.1/missing").await;

        assert_eq!(record.doi, "10.1/missing");
        assert!(record.is_unusable());
        assert!(record.citations.is_empty());
        // not found is final
        assert_eq!(budget.charged(), 1);
    }

    #[tokio::test]
    async fn test_every_http_attempt_is_charged() {
        let (base_url, requests) =
            serve("HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
        let fetcher = Fetcher::new(client(base_url)).with_max_attempts(3);
        let mut budget = budget(Duration::from_millis(10));

        let record = fetcher.fetch(&mut budget, "10.1/x").await;

        assert!(record.is_unusable());
        assert_eq!(requests.load(Ordering::SeqCst), 3);
        assert_eq!(budget.charged(), 3);
        // throttling cools the budget down between attempts
        assert_eq!(budget.cooldowns(), 2);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let (base_url, requests) = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot json!",
        )
        .await;
        let fetcher = Fetcher::new(client(base_url)).with_max_attempts(3);
        let mut budget = budget(Duration::from_secs(300));

        let record = fetcher.fetch(&mut budget, "10.1/x").await;

        assert!(record.is_unusable());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(budget.charged(), 1);
    }

    #[tokio::test]
    async fn test_successful_response_is_normalized() {
        let body = r#"{"title":"Pain","year":2020,"authors":[{"authorId":"A1","name":"Ada"}],"citations":[{"externalIds":{"DOI":"10.1/c"}}]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, requests) = serve(response).await;
        let fetcher = Fetcher::new(client(base_url)).with_max_attempts(3);
        let mut budget = budget(Duration::from_secs(300));

        let record = fetcher.fetch(&mut budget, "10.1/x").await;

        assert_eq!(record.display_title(), "Pain");
        assert_eq!(record.author_ids, vec!["A1"]);
        assert_eq!(record.citations, vec!["10.1/c"]);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 64), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_BACKOFF);
    }
}
