//! Self-citation colouring
//!
//! A pure function of the final graph state:
//! - authors of the seed paper are red, every other author green
//! - the seed paper is red; any other paper is red when it shares an
//!   author with the seed
//! - an edge is red when both endpoints share an author with the seed

use crate::graph::GraphState;
use citree_common::models::Color;
use tracing::info;

/// Counts of red elements after a colouring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorSummary {
    pub red_papers: usize,
    pub red_authors: usize,
    pub red_edges: usize,
}

/// Assign colours to every author, paper and paper edge
pub fn color_by_self_citation(state: &mut GraphState) -> ColorSummary {
    let seed_authors = state.seed_author_ids();
    let seed = state.seed.clone();
    let mut summary = ColorSummary::default();

    for author in state.authors.nodes_mut() {
        let color = Color::from_flag(seed_authors.contains(&author.author_id));
        summary.red_authors += usize::from(color.is_red());
        author.color = Some(color);
    }

    for paper in state.papers.nodes_mut() {
        let color = if paper.doi == seed {
            Color::Red
        } else {
            Color::from_flag(paper.shares_author_with(&seed_authors))
        };
        summary.red_papers += usize::from(color.is_red());
        paper.color = Some(color);
    }

    let touches_seed = |doi: &str| {
        state
            .papers
            .get(doi)
            .is_some_and(|p| p.shares_author_with(&seed_authors))
    };
    let self_citing: Vec<bool> = state
        .papers
        .edges()
        .iter()
        .map(|edge| touches_seed(&edge.source) && touches_seed(&edge.target))
        .collect();
    for (edge, red) in state.papers.edges_mut().zip(self_citing) {
        let color = Color::from_flag(red);
        summary.red_edges += usize::from(color.is_red());
        edge.color = Some(color);
    }

    info!(
        red_papers = summary.red_papers,
        red_authors = summary.red_authors,
        red_edges = summary.red_edges,
        "Self-citation colouring applied"
    );
    summary
}
