//! Build state shared by the expander, colorer and snapshot writer

use super::{AuthorGraph, PaperGraph};
use citree_common::models::PaperRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Deduplication bookkeeping for one tree build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpansionState {
    /// Identifiers already expanded; only ever grows
    pub done: BTreeSet<String>,

    /// Identifiers whose record came back unusable, in discovery order
    pub retry: Vec<String>,

    /// Last completed generation
    pub generation: u32,

    /// Largest outbound citation count seen
    pub max_degree: usize,
}

impl ExpansionState {
    /// Queue an identifier for reprocessing; returns false if already queued
    pub fn mark_retry(&mut self, doi: &str) -> bool {
        if self.retry.iter().any(|d| d == doi) {
            return false;
        }
        self.retry.push(doi.to_string());
        true
    }

    pub fn is_done(&self, doi: &str) -> bool {
        self.done.contains(doi)
    }
}

/// Both graphs plus expansion bookkeeping.
///
/// The expander mutates everything; the colorer only writes `color`
/// attributes; the snapshot writer only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub seed: String,
    pub papers: PaperGraph,
    pub authors: AuthorGraph,
    pub expansion: ExpansionState,
}

impl GraphState {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            papers: PaperGraph::new(),
            authors: AuthorGraph::new(),
            expansion: ExpansionState::default(),
        }
    }

    pub fn seed_record(&self) -> Option<&PaperRecord> {
        self.papers.get(&self.seed)
    }

    /// Author identifiers of the seed paper
    pub fn seed_author_ids(&self) -> HashSet<String> {
        self.seed_record()
            .map(|r| r.author_ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Add a paper's authors and their pairwise co-authorship edges.
    /// Each author node takes the name from its own entry; an entry
    /// without a name leaves the node named by its id.
    pub fn merge_authors(&mut self, record: &PaperRecord) {
        for (id, name) in record.identified_authors() {
            self.authors.upsert(id, name);
        }
        self.authors.link_coauthors(&record.author_ids);
    }

    /// Track the widest citation list seen so far
    pub fn observe_degree(&mut self, record: &PaperRecord) {
        self.expansion.max_degree = self.expansion.max_degree.max(record.citations.len());
    }
}
