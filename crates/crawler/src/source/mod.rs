//! Bibliographic record sources
//!
//! Provides a unified interface for looking up a paper by DOI:
//! - Semantic Scholar Graph API
//! - In-memory fixtures (tests, offline replays)

mod semantic_scholar;

pub use semantic_scholar::SemanticScholarClient;

use async_trait::async_trait;
use citree_common::config::SourceConfig;
use citree_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Raw paper payload; every field may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaper {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub r#abstract: Option<String>,

    #[serde(default)]
    pub authors: Option<Vec<RawAuthor>>,

    #[serde(default)]
    pub citations: Option<Vec<RawCitation>>,
}

/// Author entry of a raw paper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthor {
    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Citing-paper entry of a raw paper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCitation {
    #[serde(default)]
    pub paper_id: Option<String>,

    #[serde(default)]
    pub external_ids: Option<RawExternalIds>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExternalIds {
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,
}

impl RawAuthor {
    pub fn new(author_id: &str, name: &str) -> Self {
        Self {
            author_id: Some(author_id.to_string()),
            name: Some(name.to_string()),
        }
    }
}

impl RawCitation {
    /// Citation entry carrying a DOI
    pub fn doi(doi: &str) -> Self {
        Self {
            paper_id: None,
            external_ids: Some(RawExternalIds {
                doi: Some(doi.to_string()),
            }),
        }
    }

    /// DOI of the citing paper, if the source knows it
    pub fn identifier(&self) -> Option<&str> {
        self.external_ids.as_ref()?.doi.as_deref()
    }
}

/// Trait for remote paper lookup
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Look up a paper by DOI
    async fn lookup(&self, doi: &str) -> Result<RawPaper>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// In-memory source serving fixture payloads
#[derive(Default)]
pub struct StaticSource {
    papers: HashMap<String, RawPaper>,
    lookups: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a fixture
    pub fn with_paper(mut self, doi: &str, paper: RawPaper) -> Self {
        self.papers.insert(doi.to_string(), paper);
        self
    }

    pub fn insert(&mut self, doi: &str, paper: RawPaper) {
        self.papers.insert(doi.to_string(), paper);
    }

    /// Number of lookups served so far, misses included
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn lookup(&self, doi: &str) -> Result<RawPaper> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.papers
            .get(doi)
            .cloned()
            .ok_or_else(|| AppError::PaperNotFound { id: doi.to_string() })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Create the production source from configuration
pub fn create_source(config: &SourceConfig) -> Result<Arc<dyn RecordSource>> {
    Ok(Arc::new(SemanticScholarClient::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_paper_partial_payload() {
        let json = r#"{
            "paperId": "abc",
            "title": "Pain in the clinic",
            "authors": [{"authorId": "A1", "name": "Ada"}, {"authorId": null, "name": "Bo"}],
            "citations": [
                {"paperId": "p1", "externalIds": {"DOI": "10.1/x"}},
                {"paperId": "p2", "externalIds": null},
                {"paperId": "p3"}
            ]
        }"#;
        let paper: RawPaper = serde_json::from_str(json).unwrap();

        assert_eq!(paper.title.as_deref(), Some("Pain in the clinic"));
        assert!(paper.venue.is_none());
        assert!(paper.year.is_none());
        let authors = paper.authors.unwrap();
        assert_eq!(authors[0].author_id.as_deref(), Some("A1"));
        assert!(authors[1].author_id.is_none());
        let citations = paper.citations.unwrap();
        assert_eq!(citations[0].identifier(), Some("10.1/x"));
        assert_eq!(citations[1].identifier(), None);
        assert_eq!(citations[2].identifier(), None);
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new().with_paper(
            "10.1/x",
            RawPaper {
                title: Some("X".into()),
                ..Default::default()
            },
        );

        let paper = source.lookup("10.1/x").await.unwrap();
        assert_eq!(paper.title.as_deref(), Some("X"));

        let missing = source.lookup("10.1/missing").await;
        assert!(matches!(missing, Err(AppError::PaperNotFound { .. })));
        assert_eq!(source.lookups(), 2);
    }
}
