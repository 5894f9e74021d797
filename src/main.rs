use anyhow::Context;
use clap::Parser;

use atelier::{cli::Cli, AppConfig, AtelierApp};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = cli.apply_to(config);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    log::info!(
        "Serving assets from {} ({})",
        config.assets.root.display(),
        config.assets.manifest
    );

    AtelierApp::new(config)
        .context("creating the application")?
        .run()
        .context("running the event loop")
}
