//! Co-authorship graph
//!
//! Authors keyed by identifier; an edge exists when two authors share at
//! least one discovered paper. Edges are kept once per unordered pair.

use citree_common::models::AuthorNode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Undirected co-authorship edge, endpoints stored in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoauthorEdge {
    pub a: String,
    pub b: String,
}

impl CoauthorEdge {
    fn new(x: &str, y: &str) -> Self {
        if x <= y {
            Self { a: x.to_string(), b: y.to_string() }
        } else {
            Self { a: y.to_string(), b: x.to_string() }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "AuthorGraphData", into = "AuthorGraphData")]
pub struct AuthorGraph {
    order: Vec<String>,
    nodes: HashMap<String, AuthorNode>,
    edges: Vec<CoauthorEdge>,
    edge_keys: HashSet<CoauthorEdge>,
}

#[derive(Serialize, Deserialize)]
struct AuthorGraphData {
    nodes: Vec<AuthorNode>,
    edges: Vec<CoauthorEdge>,
}

impl From<AuthorGraphData> for AuthorGraph {
    fn from(data: AuthorGraphData) -> Self {
        let mut graph = AuthorGraph::new();
        for node in data.nodes {
            graph.order.push(node.author_id.clone());
            graph.nodes.insert(node.author_id.clone(), node);
        }
        for edge in data.edges {
            graph.add_edge(&edge.a, &edge.b);
        }
        graph
    }
}

impl From<AuthorGraph> for AuthorGraphData {
    fn from(mut graph: AuthorGraph) -> Self {
        let nodes = graph
            .order
            .iter()
            .filter_map(|id| graph.nodes.remove(id))
            .collect();
        AuthorGraphData {
            nodes,
            edges: graph.edges,
        }
    }
}

impl AuthorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an author or refresh its display name
    pub fn upsert(&mut self, author_id: &str, name: Option<&str>) {
        match self.nodes.get_mut(author_id) {
            Some(node) => {
                if let Some(name) = name {
                    node.name = name.to_string();
                }
            }
            None => {
                self.order.push(author_id.to_string());
                self.nodes.insert(
                    author_id.to_string(),
                    AuthorNode::new(author_id, name.unwrap_or(author_id)),
                );
            }
        }
    }

    /// Add a co-authorship edge unless the pair is already linked.
    /// Missing endpoints are created with their id as name.
    pub fn add_edge(&mut self, x: &str, y: &str) -> bool {
        if x == y {
            return false;
        }
        let edge = CoauthorEdge::new(x, y);
        if self.edge_keys.contains(&edge) {
            return false;
        }
        for id in [x, y] {
            if !self.nodes.contains_key(id) {
                self.upsert(id, None);
            }
        }
        self.edge_keys.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    /// Link every pair of co-authors of one paper
    pub fn link_coauthors(&mut self, author_ids: &[String]) {
        for (i, x) in author_ids.iter().enumerate() {
            for y in &author_ids[i + 1..] {
                self.add_edge(x, y);
            }
        }
    }

    pub fn get(&self, author_id: &str) -> Option<&AuthorNode> {
        self.nodes.get(author_id)
    }

    pub fn contains_edge(&self, x: &str, y: &str) -> bool {
        self.edge_keys.contains(&CoauthorEdge::new(x, y))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AuthorNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut AuthorNode> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> &[CoauthorEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
