//! Citree Common Library
//!
//! Shared code for the Citree crawler including:
//! - Typed paper and author records
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use models::{AuthorNode, Color, NodeRole, PaperRecord, Sentinel};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of generations to expand
pub const DEFAULT_GENERATIONS: u32 = 2;

/// Default call budget per rate limit window
pub const DEFAULT_MAX_CALLS: u32 = 99;
