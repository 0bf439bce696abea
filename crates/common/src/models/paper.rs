//! Paper record

use super::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Display form of a missing scalar field
pub const UNKNOWN: &str = "unknown";

/// A scalar field that the source may not have supplied
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel<T> {
    Known(T),
    Unknown,
}

impl<T> Sentinel<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Sentinel::Unknown)
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Sentinel::Known(value) => Some(value),
            Sentinel::Unknown => None,
        }
    }
}

impl<T> From<Option<T>> for Sentinel<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Sentinel::Known(value),
            None => Sentinel::Unknown,
        }
    }
}

impl<T> Default for Sentinel<T> {
    fn default() -> Self {
        Sentinel::Unknown
    }
}

impl<T: fmt::Display> fmt::Display for Sentinel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::Known(value) => write!(f, "{}", value),
            Sentinel::Unknown => f.write_str(UNKNOWN),
        }
    }
}

/// Where a paper sits in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Seed,
    Descendant,
}

impl NodeRole {
    /// Node size used by the visualization
    pub fn display_size(&self) -> f32 {
        match self {
            NodeRole::Seed => 6.0,
            NodeRole::Descendant => 2.5,
        }
    }
}

/// A paper node, keyed by its DOI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub doi: String,
    pub title: Sentinel<String>,
    pub venue: Sentinel<String>,
    pub year: Sentinel<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Sentinel<String>,
    /// Author display names, in source order
    pub authors: Vec<String>,
    /// Author identifiers, in source order
    pub author_ids: Vec<String>,
    /// Name carried by each entry of `author_ids`, index for index
    #[serde(default)]
    pub author_names: Vec<Option<String>>,
    /// DOIs of papers citing this one, captured at fetch time
    pub citations: Vec<String>,
    pub role: NodeRole,
    /// Assigned by the self-citation pass
    #[serde(default)]
    pub color: Option<Color>,
}

impl PaperRecord {
    /// Record with every field defaulted
    pub fn unknown(doi: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            title: Sentinel::Unknown,
            venue: Sentinel::Unknown,
            year: Sentinel::Unknown,
            abstract_text: Sentinel::Unknown,
            authors: Vec::new(),
            author_ids: Vec::new(),
            author_names: Vec::new(),
            citations: Vec::new(),
            role: NodeRole::Descendant,
            color: None,
        }
    }

    /// No usable title, venue or year: the record needs reprocessing
    pub fn is_unusable(&self) -> bool {
        self.title.is_unknown() && self.venue.is_unknown() && self.year.is_unknown()
    }

    pub fn is_seed(&self) -> bool {
        self.role == NodeRole::Seed
    }

    pub fn display_size(&self) -> f32 {
        self.role.display_size()
    }

    /// Whether any author of this paper is in `author_ids`
    pub fn shares_author_with(&self, author_ids: &HashSet<String>) -> bool {
        self.author_ids.iter().any(|id| author_ids.contains(id))
    }

    /// Identified authors paired with their own name, if any
    pub fn identified_authors(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.author_ids.iter().enumerate().map(|(i, id)| {
            let name = self.author_names.get(i).and_then(|n| n.as_deref());
            (id.as_str(), name)
        })
    }

    /// Title for plot headings
    pub fn display_title(&self) -> String {
        self.title.to_string()
    }
}
