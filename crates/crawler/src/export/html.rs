//! HTML visualization: paper graph and co-authorship graph side by side

use super::display::{author_view, paper_view};
use crate::builder::CitationTree;
use citree_common::errors::Result;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "tree.html";
const TEMPLATE: &str = include_str!("../../templates/tree.html");

/// JSON safe to inline inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_html(tree: &CitationTree) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;

    let mut context = Context::new();
    context.insert("plot_title", &tree.plot_title);
    context.insert("papers_json", &script_json(&paper_view(tree.papers()))?);
    context.insert("authors_json", &script_json(&author_view(tree.authors()))?);

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

pub fn export_html(tree: &CitationTree, path: &Path) -> Result<()> {
    std::fs::write(path, render_html(tree)?)?;
    tracing::info!(
        path = %path.display(),
        papers = tree.papers().node_count(),
        authors = tree.authors().node_count(),
        "HTML exported"
    );
    Ok(())
}
