//! Exporters for a finished tree
//!
//! Everything here consumes a coloured `CitationTree` and flattens it for
//! presentation: CSV table and HTML visualization.

pub mod display;
mod html;
mod tabular;

pub use html::{export_html, render_html};
pub use tabular::{export_csv, write_csv};

use crate::builder::CitationTree;
use citree_common::config::{ExportConfig, TreeConfig};
use citree_common::errors::Result;
use std::path::PathBuf;

/// Files written by `export_all`
#[derive(Debug, Default)]
pub struct ExportedFiles {
    pub csv: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

/// Write every enabled export as `{dir}/{stem}.{ext}`
pub fn export_all(tree: &CitationTree, export: &ExportConfig, tree_config: &TreeConfig) -> Result<ExportedFiles> {
    std::fs::create_dir_all(&export.dir)?;
    let mut files = ExportedFiles::default();

    if export.csv {
        let path = export.dir.join(format!("{}.csv", tree_config.output_stem));
        export_csv(tree.papers(), &path)?;
        files.csv = Some(path);
    }
    if export.html {
        let path = export.dir.join(format!("{}.html", tree_config.output_stem));
        export_html(tree, &path)?;
        files.html = Some(path);
    }
    Ok(files)
}
