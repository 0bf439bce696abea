//! Tree build orchestration
//!
//! Seed → generations 1..=n → colouring. Colouring always runs after the
//! last generation and before anything is handed to the exporters.

use crate::colorer::{color_by_self_citation, ColorSummary};
use crate::expander::{Expander, GenerationReport};
use crate::fetcher::Fetcher;
use crate::graph::{AuthorGraph, GraphState, PaperGraph};
use crate::rate_limit::CallBudget;
use crate::snapshot::{Snapshot, SnapshotWriter};
use crate::source::RecordSource;
use citree_common::config::{validate_identifier, AppConfig};
use citree_common::errors::Result;
use std::sync::Arc;
use tracing::info;

/// Finished, coloured citation tree
#[derive(Debug, Clone)]
pub struct CitationTree {
    pub state: GraphState,
    /// Heading for the paper plot (the seed's title)
    pub plot_title: String,
    pub reports: Vec<GenerationReport>,
    pub colors: ColorSummary,
}

impl CitationTree {
    pub fn seed(&self) -> &str {
        &self.state.seed
    }

    pub fn papers(&self) -> &PaperGraph {
        &self.state.papers
    }

    pub fn authors(&self) -> &AuthorGraph {
        &self.state.authors
    }

    /// Papers needing reprocessing
    pub fn retry(&self) -> &[String] {
        &self.state.expansion.retry
    }

    pub fn max_degree(&self) -> usize {
        self.state.expansion.max_degree
    }

    pub fn total_fetched(&self) -> usize {
        self.reports.iter().map(|r| r.fetched).sum()
    }
}

/// Builds citation trees
pub struct TreeBuilder {
    expander: Expander,
    generations: u32,
}

impl TreeBuilder {
    pub fn new(expander: Expander, generations: u32) -> Self {
        Self {
            expander,
            generations,
        }
    }

    /// Wire fetcher, budget and snapshots from configuration
    pub fn from_config(config: &AppConfig, source: Arc<dyn RecordSource>) -> Result<Self> {
        let expander = Expander::new(
            Fetcher::new(source).with_max_attempts(config.source.max_retries),
            CallBudget::from_config(&config.rate_limit)?,
            SnapshotWriter::from_config(&config.snapshot, &config.tree),
        );
        Ok(Self::new(expander, config.tree.generations))
    }

    pub fn cooldowns(&self) -> u64 {
        self.expander.budget().cooldowns()
    }

    /// Remote calls charged so far, retries included
    pub fn calls(&self) -> u64 {
        self.expander.budget().charged()
    }

    /// Build a tree from scratch
    pub async fn build(&mut self, seed: &str) -> Result<CitationTree> {
        validate_identifier(seed)?;
        info!(seed = seed, generations = self.generations, "Building citation tree");

        let mut state = GraphState::new(seed.trim());
        let mut reports = vec![self.expander.seed(&mut state).await?];
        self.run(&mut state, &mut reports).await?;
        Ok(finish(state, reports))
    }

    /// Continue a build from a generation snapshot
    pub async fn resume(&mut self, snapshot: Snapshot) -> Result<CitationTree> {
        info!(
            seed = %snapshot.state.seed,
            from_generation = snapshot.generation,
            generations = self.generations,
            "Resuming citation tree"
        );
        let mut state = snapshot.state;
        state.expansion.generation = snapshot.generation;

        let mut reports = Vec::new();
        self.run(&mut state, &mut reports).await?;
        Ok(finish(state, reports))
    }

    /// Refetch the papers queued for reprocessing, then recolour
    pub async fn reprocess(&mut self, tree: &mut CitationTree) -> Result<Vec<String>> {
        let resolved = self.expander.reprocess(&mut tree.state).await?;
        tree.colors = color_by_self_citation(&mut tree.state);
        if let Some(seed) = tree.state.seed_record() {
            tree.plot_title = seed.display_title();
        }
        Ok(resolved)
    }

    async fn run(&mut self, state: &mut GraphState, reports: &mut Vec<GenerationReport>) -> Result<()> {
        while state.expansion.generation < self.generations {
            reports.push(self.expander.expand_generation(state).await?);
        }
        Ok(())
    }
}

fn finish(mut state: GraphState, reports: Vec<GenerationReport>) -> CitationTree {
    let colors = color_by_self_citation(&mut state);
    let plot_title = state
        .seed_record()
        .map(|r| r.display_title())
        .unwrap_or_else(|| state.seed.clone());

    info!(
        papers = state.papers.node_count(),
        authors = state.authors.node_count(),
        retry = state.expansion.retry.len(),
        max_degree = state.expansion.max_degree,
        "Citation tree complete"
    );

    CitationTree {
        state,
        plot_title,
        reports,
        colors,
    }
}
