//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// Interactive lamp scene
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', value_name = "PATH", default_value = "atelier.toml")]
    pub config: PathBuf,

    /// Asset directory, overrides `assets.root`
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Manifest file name inside the asset directory, overrides `assets.manifest`
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<String>,
}

impl Cli {
    /// Applies the command line overrides on top of the file configuration
    pub fn apply_to(&self, mut config: AppConfig) -> AppConfig {
        if let Some(root) = &self.assets {
            config.assets.root = root.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.assets.manifest = manifest.clone();
        }
        config
    }
}
