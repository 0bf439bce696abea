use citree_common::config::AppConfig;
use citree_common::errors::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "citree")]
#[command(about = "Build a coloured citation tree from a seed DOI")]
#[command(version)]
pub struct Cli {
    /// Seed DOI (falls back to tree.seed from configuration)
    pub doi: Option<String>,

    /// Number of expansion generations after the seed
    #[arg(short, long)]
    pub generations: Option<u32>,

    /// Output file stem for snapshots and exports
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "CITREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Continue from a generation snapshot instead of starting fresh
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Refetch papers left in the retry set before exporting
    #[arg(long)]
    pub reprocess_retries: bool,
}

impl Cli {
    /// Load configuration and apply command-line overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(&path.to_string_lossy())?,
            None => AppConfig::load()?,
        };

        if let Some(doi) = &self.doi {
            config.tree.seed = Some(doi.clone());
        }
        if let Some(generations) = self.generations {
            config.tree.generations = generations;
        }
        if let Some(stem) = &self.output {
            config.tree.output_stem = stem.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
