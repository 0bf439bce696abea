//! Citree crawler
//!
//! Builds a citation tree from a seed DOI:
//! - generational expansion through a rate-limited record source
//! - paper and co-authorship graphs
//! - self-citation colouring
//! - per-generation snapshots
//! - CSV and HTML export

pub mod builder;
pub mod colorer;
pub mod expander;
pub mod export;
pub mod fetcher;
pub mod graph;
pub mod rate_limit;
pub mod snapshot;
pub mod source;

pub use builder::{CitationTree, TreeBuilder};
pub use colorer::{color_by_self_citation, ColorSummary};
pub use expander::{Expander, GenerationReport};
pub use fetcher::Fetcher;
pub use graph::{AuthorGraph, GraphState, PaperGraph};
pub use rate_limit::{CallBudget, WindowBudget};
pub use snapshot::{Snapshot, SnapshotWriter};
pub use source::{create_source, RecordSource};
