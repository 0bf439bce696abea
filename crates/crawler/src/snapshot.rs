//! Generation snapshots
//!
//! After every generation the build state is written to
//! `{dir}/{stem}_generation_{g}.json`. Each generation gets its own file.
//! A failed write aborts the build.

use crate::graph::GraphState;
use chrono::{DateTime, Utc};
use citree_common::config::{SnapshotConfig, TreeConfig};
use citree_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A persisted generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: GraphState,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    generation: u32,
    saved_at: DateTime<Utc>,
    #[serde(flatten)]
    state: &'a GraphState,
}

/// Writes generation snapshots
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    stem: String,
    enabled: bool,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            enabled: true,
        }
    }

    pub fn from_config(snapshot: &SnapshotConfig, tree: &TreeConfig) -> Self {
        Self {
            dir: snapshot.dir.clone(),
            stem: tree.output_stem.clone(),
            enabled: snapshot.enabled,
        }
    }

    /// Writer that never touches the filesystem
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::from("."),
            stem: String::new(),
            enabled: false,
        }
    }

    pub fn path_for(&self, generation: u32) -> PathBuf {
        self.dir
            .join(format!("{}_generation_{}.json", self.stem, generation))
    }

    /// Persist the state tagged with `generation`
    pub async fn save(&self, state: &GraphState, generation: u32) -> Result<Option<PathBuf>> {
        if !self.enabled {
            debug!(generation = generation, "Snapshots disabled, skipping");
            return Ok(None);
        }

        let path = self.path_for(generation);
        let snapshot_error = |message: String| AppError::Snapshot {
            path: path.display().to_string(),
            message,
        };

        let body = serde_json::to_vec_pretty(&SnapshotRef {
            generation,
            saved_at: Utc::now(),
            state,
        })
        .map_err(|e| snapshot_error(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| snapshot_error(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| snapshot_error(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| snapshot_error(e.to_string()))?;

        info!(
            generation = generation,
            path = %path.display(),
            papers = state.papers.node_count(),
            "Snapshot saved"
        );
        Ok(Some(path))
    }
}

/// Read a snapshot back
pub async fn load(path: &Path) -> Result<Snapshot> {
    let body = tokio::fs::read(path).await.map_err(|e| AppError::Snapshot {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|e| AppError::Snapshot {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
