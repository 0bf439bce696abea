//! Paper graph representation
//!
//! Insertion-ordered paper nodes keyed by DOI with a directed
//! multigraph of citation edges.

use citree_common::models::{Color, PaperRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Edge in the paper graph: `target` cites `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEdge {
    /// Paper whose citation list produced this edge
    pub source: String,

    /// Citing paper fetched while expanding `source`
    pub target: String,

    /// Assigned by the self-citation pass
    #[serde(default)]
    pub color: Option<Color>,
}

/// In-memory paper graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "PaperGraphData", into = "PaperGraphData")]
pub struct PaperGraph {
    /// Node keys in insertion order
    order: Vec<String>,

    /// All nodes
    nodes: HashMap<String, PaperRecord>,

    /// Edge list; parallel edges allowed
    edges: Vec<CitationEdge>,

    /// Undirected adjacency: doi -> edge indices touching it
    incident: HashMap<String, Vec<usize>>,
}

/// Serialized form: nodes and edges in order
#[derive(Serialize, Deserialize)]
struct PaperGraphData {
    nodes: Vec<PaperRecord>,
    edges: Vec<CitationEdge>,
}

impl From<PaperGraphData> for PaperGraph {
    fn from(data: PaperGraphData) -> Self {
        let mut graph = PaperGraph::new();
        for record in data.nodes {
            graph.upsert(record);
        }
        for edge in data.edges {
            graph.push_edge(edge);
        }
        graph
    }
}

impl From<PaperGraph> for PaperGraphData {
    fn from(mut graph: PaperGraph) -> Self {
        let nodes = graph
            .order
            .iter()
            .filter_map(|doi| graph.nodes.remove(doi))
            .collect();
        PaperGraphData {
            nodes,
            edges: graph.edges,
        }
    }
}

impl PaperGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing the attributes of an existing node.
    /// The node keeps its position and its edges.
    pub fn upsert(&mut self, record: PaperRecord) {
        if !self.nodes.contains_key(&record.doi) {
            self.order.push(record.doi.clone());
        }
        self.nodes.insert(record.doi.clone(), record);
    }

    /// Add an edge to the graph; both endpoints must already be nodes
    pub fn add_edge(&mut self, source: &str, target: &str) {
        self.push_edge(CitationEdge {
            source: source.to_string(),
            target: target.to_string(),
            color: None,
        });
    }

    fn push_edge(&mut self, edge: CitationEdge) {
        let index = self.edges.len();
        self.incident.entry(edge.source.clone()).or_default().push(index);
        if edge.target != edge.source {
            self.incident.entry(edge.target.clone()).or_default().push(index);
        }
        self.edges.push(edge);
    }

    pub fn get(&self, doi: &str) -> Option<&PaperRecord> {
        self.nodes.get(doi)
    }

    /// Get all node keys in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &PaperRecord> {
        self.order.iter().filter_map(|doi| self.nodes.get(doi))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut PaperRecord> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> &[CitationEdge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut CitationEdge> {
        self.edges.iter_mut()
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Get edge count, parallel edges included
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes sharing an edge with `doi`, in either direction
    pub fn neighbors(&self, doi: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.incident
            .get(doi)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&i| {
                let edge = &self.edges[i];
                if edge.source == doi {
                    edge.target.as_str()
                } else {
                    edge.source.as_str()
                }
            })
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Get papers fetched while expanding `doi`
    pub fn get_citing(&self, doi: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.source == doi)
            .map(|e| e.target.as_str())
            .collect()
    }
}
