//! CSV export of the paper graph

use super::display::PaperRow;
use crate::graph::PaperGraph;
use citree_common::errors::Result;
use std::io::Write;
use std::path::Path;

/// Header; the leading empty column is a positional row index
const HEADER: [&str; 8] = ["", "doi", "title", "journal", "year", "authors", "citations_dois", "abstract"];

/// Write one row per paper, in graph order
pub fn write_csv<W: Write>(graph: &PaperGraph, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(HEADER)?;
    for (index, record) in graph.nodes().enumerate() {
        let row = PaperRow::from(record);
        wtr.write_record([
            index.to_string(),
            row.doi,
            row.title,
            row.journal,
            row.year,
            row.authors,
            row.citations_dois,
            row.abstract_text,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_csv(graph: &PaperGraph, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(graph, file)?;
    tracing::info!(path = %path.display(), rows = graph.node_count(), "CSV exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use citree_common::models::{PaperRecord, Sentinel};

    #[test]
    fn test_csv_rows() {
        let mut graph = PaperGraph::new();
        let mut seed = PaperRecord::unknown("10.1/s");
        seed.title = Sentinel::Known("Seed, with comma".into());
        seed.authors = vec!["Ada".into(), "Bo".into()];
        seed.citations = vec!["10.1/x".into()];
        graph.upsert(seed);
        graph.upsert(PaperRecord::unknown("10.1/x"));

        let mut out = Vec::new();
        write_csv(&graph, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ",doi,title,journal,year,authors,citations_dois,abstract");
        assert_eq!(
            lines[1],
            "0,10.1/s,\"Seed, with comma\",unknown,unknown,Ada Bo,10.1/x,unknown"
        );
        assert_eq!(lines[2], "1,10.1/x,unknown,unknown,unknown,,,unknown");
    }
}
