//! Typed data model
//!
//! Records that flow between the fetcher, the graphs, snapshots and exports

mod author;
mod paper;

pub use author::AuthorNode;
pub use paper::{NodeRole, PaperRecord, Sentinel, UNKNOWN};

use serde::{Deserialize, Serialize};

/// Binary self-citation colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Touches the seed paper's authors
    Red,
    /// Everything else
    Green,
}

impl Color {
    pub fn from_flag(red: bool) -> Self {
        if red {
            Color::Red
        } else {
            Color::Green
        }
    }

    /// CSS colour for presentation
    pub fn hex(&self) -> &'static str {
        match self {
            Color::Red => "#ff0000",
            Color::Green => "#00ff00",
        }
    }

    pub fn is_red(&self) -> bool {
        matches!(self, Color::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_flag(true), Color::Red);
        assert_eq!(Color::Red.hex(), "#ff0000");
        assert_eq!(Color::Green.hex(), "#00ff00");
        assert!(!Color::Green.is_red());
    }
}
