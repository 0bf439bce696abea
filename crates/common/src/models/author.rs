//! Author node

use super::Color;
use serde::{Deserialize, Serialize};

/// A node in the co-authorship graph, keyed by author identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorNode {
    pub author_id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<Color>,
}

impl AuthorNode {
    pub fn new(author_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            name: name.into(),
            color: None,
        }
    }
}
