//! Generation expander
//!
//! Generation 0 fetches the seed paper. Every later generation expands the
//! frontier (papers in the graph that were never expanded), fetching each
//! citing paper listed on a frontier paper, merging its authors, adding it
//! and its edge to the paper graph, and snapshotting once the whole
//! frontier is done.

use crate::fetcher::Fetcher;
use crate::graph::GraphState;
use crate::rate_limit::CallBudget;
use crate::snapshot::SnapshotWriter;
use citree_common::errors::Result;
use citree_common::metrics;
use citree_common::models::{NodeRole, PaperRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Summary of one completed generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    /// Papers expanded in this generation
    pub frontier: usize,
    /// Remote fetches issued
    pub fetched: usize,
    /// Papers in the graph afterwards
    pub papers: usize,
    /// Identifiers newly queued for reprocessing
    pub new_retries: usize,
}

/// Drives the fetch loop over a `GraphState`
pub struct Expander {
    fetcher: Fetcher,
    budget: CallBudget,
    snapshots: SnapshotWriter,
}

impl Expander {
    pub fn new(fetcher: Fetcher, budget: CallBudget, snapshots: SnapshotWriter) -> Self {
        Self {
            fetcher,
            budget,
            snapshots,
        }
    }

    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    /// Generation 0: fetch the seed paper and snapshot it
    #[instrument(skip(self, state), fields(seed = %state.seed))]
    pub async fn seed(&mut self, state: &mut GraphState) -> Result<GenerationReport> {
        let seed = state.seed.clone();
        let mut record = self.fetcher.fetch(&mut self.budget, &seed).await;
        record.role = NodeRole::Seed;

        let unusable = record.is_unusable();
        if unusable {
            warn!(doi = %seed, "Seed record has no title, venue or year");
            state.expansion.mark_retry(&seed);
        }
        info!(
            title = %record.title,
            authors = record.author_ids.len(),
            citations = record.citations.len(),
            "Seed fetched"
        );

        state.merge_authors(&record);
        state.observe_degree(&record);
        state.papers.upsert(record);
        state.expansion.generation = 0;

        self.finish_generation(state, 0, 0, 1, usize::from(unusable)).await
    }

    /// Run one frontier pass and snapshot the result
    #[instrument(skip(self, state), fields(generation = state.expansion.generation + 1))]
    pub async fn expand_generation(&mut self, state: &mut GraphState) -> Result<GenerationReport> {
        let generation = state.expansion.generation + 1;
        let frontier = frontier(state);

        state.expansion.done.extend(frontier.iter().cloned());
        let retry = state.expansion.retry.clone();
        state.expansion.done.extend(retry);

        debug!(frontier = frontier.len(), "Frontier computed");

        let mut fetched = 0;
        let mut new_retries = 0;
        for paper in &frontier {
            let citations = state
                .papers
                .get(paper)
                .map(|r| r.citations.clone())
                .unwrap_or_default();

            for doi in citations {
                let record = self.fetcher.fetch(&mut self.budget, &doi).await;
                fetched += 1;

                if self.absorb(state, paper, record) {
                    new_retries += 1;
                }
            }
        }

        state.expansion.generation = generation;
        self.finish_generation(state, generation, frontier.len(), fetched, new_retries)
            .await
    }

    /// Merge one fetched citing paper. Returns true if it was newly queued
    /// for reprocessing.
    fn absorb(&self, state: &mut GraphState, citing_from: &str, mut record: PaperRecord) -> bool {
        let doi = record.doi.clone();
        if doi == state.seed {
            record.role = NodeRole::Seed;
        }

        state.merge_authors(&record);
        state.observe_degree(&record);

        let unusable = record.is_unusable();
        state.papers.upsert(record);
        state.papers.add_edge(citing_from, &doi);

        if unusable && state.expansion.mark_retry(&doi) {
            debug!(doi = %doi, "Queued for reprocessing");
            return true;
        }
        false
    }

    /// Refetch every queued identifier once. Records that now resolve
    /// replace the node attributes (edges and role kept) and leave the
    /// queue. Returns the identifiers that resolved.
    #[instrument(skip(self, state), fields(queued = state.expansion.retry.len()))]
    pub async fn reprocess(&mut self, state: &mut GraphState) -> Result<Vec<String>> {
        let queued = state.expansion.retry.clone();
        let mut resolved = Vec::new();

        for doi in queued {
            let mut record = self.fetcher.fetch(&mut self.budget, &doi).await;
            if record.is_unusable() {
                continue;
            }

            if let Some(existing) = state.papers.get(&doi) {
                record.role = existing.role;
            }
            state.merge_authors(&record);
            state.observe_degree(&record);
            state.papers.upsert(record);
            resolved.push(doi);
        }

        state.expansion.retry.retain(|d| !resolved.contains(d));
        info!(
            resolved = resolved.len(),
            remaining = state.expansion.retry.len(),
            "Reprocessing finished"
        );
        Ok(resolved)
    }

    async fn finish_generation(
        &self,
        state: &GraphState,
        generation: u32,
        frontier: usize,
        fetched: usize,
        new_retries: usize,
    ) -> Result<GenerationReport> {
        self.snapshots.save(state, generation).await?;

        let papers = state.papers.node_count();
        metrics::record_generation(
            generation,
            papers,
            state.authors.node_count(),
            state.expansion.retry.len(),
        );
        info!(
            generation = generation,
            papers = papers,
            fetched = fetched,
            retry = state.expansion.retry.len(),
            "Generation complete"
        );

        Ok(GenerationReport {
            generation,
            frontier,
            fetched,
            papers,
            new_retries,
        })
    }
}

/// Papers eligible for expansion: never expanded, with a plausible identifier
pub fn frontier(state: &GraphState) -> Vec<String> {
    state
        .papers
        .node_ids()
        .filter(|doi| !state.expansion.is_done(doi) && doi.len() > 1)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RawAuthor, RawCitation, RawPaper, StaticSource};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use crate::rate_limit::WindowBudget;
    use std::time::Duration;

    fn paper(title: &str, authors: &[(&str, &str)], citations: &[&str]) -> RawPaper {
        RawPaper {
            title: Some(title.into()),
            venue: Some("Eur J Pain".into()),
            year: Some(2020),
            r#abstract: None,
            authors: Some(authors.iter().map(|(id, n)| RawAuthor::new(id, n)).collect()),
            citations: Some(citations.iter().map(|d| RawCitation::doi(d)).collect()),
        }
    }

    fn expander(source: Arc<StaticSource>) -> Expander {
        Expander::new(
            Fetcher::new(source),
            CallBudget::Window(WindowBudget::new(99, Duration::from_secs(300))),
            SnapshotWriter::disabled(),
        )
    }

    fn chain_source() -> Arc<StaticSource> {
        Arc::new(
            StaticSource::new()
                .with_paper("10.1/s", paper("Seed", &[("A1", "Ada")], &["10.1/x", "10.1/y"]))
                .with_paper("10.1/x", paper("X", &[("B1", "Bo"), ("C1", "Cy")], &["10.1/z"]))
                .with_paper("10.1/y", paper("Y", &[], &[]))
                .with_paper("10.1/z", paper("Z", &[("A1", "Ada")], &[])),
        )
    }

    #[tokio::test]
    async fn test_seed_generation() {
        let source = chain_source();
        let mut expander = expander(source.clone());
        let mut state = GraphState::new("10.1/s");

        let report = expander.seed(&mut state).await.unwrap();
        assert_eq!(report.generation, 0);
        assert_eq!(state.papers.node_count(), 1);
        assert!(state.seed_record().unwrap().is_seed());
        assert!(state.expansion.done.is_empty());
        assert_eq!(frontier(&state), vec!["10.1/s"]);
        assert_eq!(source.lookups(), 1);
    }

    #[tokio::test]
    async fn test_generations_expand_frontier() {
        let source = chain_source();
        let mut expander = expander(source.clone());
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();

        let first = expander.expand_generation(&mut state).await.unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(first.frontier, 1);
        assert_eq!(first.fetched, 2);
        assert_eq!(state.papers.node_count(), 3);
        assert_eq!(state.papers.get_citing("10.1/s"), vec!["10.1/x", "10.1/y"]);

        let second = expander.expand_generation(&mut state).await.unwrap();
        assert_eq!(second.frontier, 2);
        assert_eq!(second.fetched, 1);
        assert_eq!(state.papers.node_count(), 4);
        assert!(state.authors.contains_edge("B1", "C1"));
        assert_eq!(state.expansion.max_degree, 2);
        assert_eq!(source.lookups(), 4);
        assert_eq!(expander.budget().charged(), 4);
    }

    #[tokio::test]
    async fn test_done_set_grows_monotonically() {
        let mut expander = expander(chain_source());
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();

        let mut previous: BTreeSet<String> = state.expansion.done.clone();
        for _ in 0..3 {
            expander.expand_generation(&mut state).await.unwrap();
            assert!(state.expansion.done.is_superset(&previous));
            previous = state.expansion.done.clone();
        }
        assert!(frontier(&state).is_empty());
    }

    #[tokio::test]
    async fn test_unusable_record_is_queued_not_refetched() {
        let source = Arc::new(
            StaticSource::new()
                .with_paper("10.1/s", paper("Seed", &[("A1", "Ada")], &["10.1/gone"])),
        );
        let mut expander = expander(source.clone());
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();

        let report = expander.expand_generation(&mut state).await.unwrap();
        assert_eq!(report.new_retries, 1);
        assert_eq!(state.expansion.retry, vec!["10.1/gone"]);
        assert!(state.papers.get("10.1/gone").unwrap().is_unusable());

        expander.expand_generation(&mut state).await.unwrap();
        assert_eq!(source.lookups(), 2);
        assert!(state.expansion.is_done("10.1/gone"));
    }

    #[tokio::test]
    async fn test_partial_author_entries_keep_their_own_names() {
        let mut x = paper("X", &[("A1", "Ada")], &[]);
        x.authors = Some(vec![
            RawAuthor::new("A1", "Ada"),
            RawAuthor {
                author_id: None,
                name: Some("Bo".into()),
            },
            RawAuthor {
                author_id: Some("C3".into()),
                name: None,
            },
        ]);
        let source = Arc::new(
            StaticSource::new()
                .with_paper("10.1/s", paper("Seed", &[("A1", "Ada")], &["10.1/x"]))
                .with_paper("10.1/x", x),
        );
        let mut expander = expander(source);
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();
        expander.expand_generation(&mut state).await.unwrap();

        assert_eq!(state.authors.get("A1").unwrap().name, "Ada");
        assert_eq!(state.authors.get("C3").unwrap().name, "C3");
        assert!(state.authors.contains_edge("A1", "C3"));
        assert_eq!(state.papers.get("10.1/x").unwrap().authors, vec!["Ada", "Bo"]);
    }

    #[tokio::test]
    async fn test_leaf_without_authors_is_not_queued() {
        let mut expander = expander(chain_source());
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();
        expander.expand_generation(&mut state).await.unwrap();

        let y = state.papers.get("10.1/y").unwrap();
        assert!(y.author_ids.is_empty());
        assert!(y.citations.is_empty());
        assert!(!state.expansion.retry.contains(&"10.1/y".to_string()));
    }

    #[tokio::test]
    async fn test_seed_keeps_role_when_cited_back() {
        let source = Arc::new(
            StaticSource::new()
                .with_paper("10.1/s", paper("Seed", &[("A1", "Ada")], &["10.1/x"]))
                .with_paper("10.1/x", paper("X", &[], &["10.1/s"])),
        );
        let mut expander = expander(source);
        let mut state = GraphState::new("10.1/s");
        expander.seed(&mut state).await.unwrap();
        expander.expand_generation(&mut state).await.unwrap();
        expander.expand_generation(&mut state).await.unwrap();

        assert!(state.seed_record().unwrap().is_seed());
        assert_eq!(state.papers.node_count(), 2);
        assert_eq!(state.papers.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_reprocess_resolves_queue() {
        let mut source = StaticSource::new()
            .with_paper("10.1/s", paper("Seed", &[("A1", "Ada")], &["10.1/late"]));
        let mut state = GraphState::new("10.1/s");
        {
            let mut expander = expander(Arc::new(std::mem::take(&mut source)));
            expander.seed(&mut state).await.unwrap();
            expander.expand_generation(&mut state).await.unwrap();
        }
        assert_eq!(state.expansion.retry, vec!["10.1/late"]);

        source.insert("10.1/late", paper("Late", &[("D1", "Di")], &[]));
        let mut expander = expander(Arc::new(source));
        let resolved = expander.reprocess(&mut state).await.unwrap();

        assert_eq!(resolved, vec!["10.1/late"]);
        assert!(state.expansion.retry.is_empty());
        assert_eq!(state.papers.get("10.1/late").unwrap().display_title(), "Late");
        assert_eq!(state.papers.edge_count(), 1);
    }
}
