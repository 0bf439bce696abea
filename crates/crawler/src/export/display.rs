//! Presentation boundary
//!
//! Flattens typed records into plain display strings. List values are
//! joined with a single space, sentinels become "unknown" and colours
//! become CSS hex strings. Nothing upstream of this module sees strings.

use crate::graph::{AuthorGraph, PaperGraph};
use citree_common::models::{AuthorNode, Color, PaperRecord};
use serde::Serialize;

/// Join a list attribute into one display string
pub fn flatten(values: &[String]) -> String {
    values.join(" ")
}

fn color_hex(color: Option<Color>) -> String {
    color.unwrap_or(Color::Green).hex().to_string()
}

/// Tabular row for one paper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperRow {
    pub doi: String,
    pub title: String,
    pub journal: String,
    pub year: String,
    pub authors: String,
    pub citations_dois: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl From<&PaperRecord> for PaperRow {
    fn from(record: &PaperRecord) -> Self {
        Self {
            doi: record.doi.clone(),
            title: record.title.to_string(),
            journal: record.venue.to_string(),
            year: record.year.to_string(),
            authors: flatten(&record.authors),
            citations_dois: flatten(&record.citations),
            abstract_text: record.abstract_text.to_string(),
        }
    }
}

/// Paper node as handed to the plot
#[derive(Debug, Clone, Serialize)]
pub struct PaperView {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub year: String,
    pub journal: String,
    pub doi: String,
    pub color: String,
    pub size: f32,
}

impl From<&PaperRecord> for PaperView {
    fn from(record: &PaperRecord) -> Self {
        Self {
            id: record.doi.clone(),
            title: record.title.to_string(),
            authors: flatten(&record.authors),
            year: record.year.to_string(),
            journal: record.venue.to_string(),
            doi: record.doi.clone(),
            color: color_hex(record.color),
            size: record.display_size(),
        }
    }
}

/// Author node as handed to the plot
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub color: String,
}

impl From<&AuthorNode> for AuthorView {
    fn from(node: &AuthorNode) -> Self {
        Self {
            id: node.author_id.clone(),
            name: node.name.clone(),
            author_id: node.author_id.clone(),
            color: color_hex(node.color),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView<N> {
    pub nodes: Vec<N>,
    pub edges: Vec<EdgeView>,
}

pub fn paper_view(graph: &PaperGraph) -> GraphView<PaperView> {
    GraphView {
        nodes: graph.nodes().map(PaperView::from).collect(),
        edges: graph
            .edges()
            .iter()
            .map(|e| EdgeView {
                from: e.source.clone(),
                to: e.target.clone(),
                color: Some(color_hex(e.color)),
            })
            .collect(),
    }
}

/// Author edges carry no colour
pub fn author_view(graph: &AuthorGraph) -> GraphView<AuthorView> {
    GraphView {
        nodes: graph.nodes().map(AuthorView::from).collect(),
        edges: graph
            .edges()
            .iter()
            .map(|e| EdgeView {
                from: e.a.clone(),
                to: e.b.clone(),
                color: None,
            })
            .collect(),
    }
}
