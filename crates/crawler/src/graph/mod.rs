//! Paper and co-authorship graphs
//!
//! In-memory graphs for one tree build plus the expansion bookkeeping

mod author_graph;
mod paper_graph;
mod state;

pub use author_graph::{AuthorGraph, CoauthorEdge};
pub use paper_graph::{CitationEdge, PaperGraph};
pub use state::{ExpansionState, GraphState};
