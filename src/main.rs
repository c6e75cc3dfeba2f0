use std::{env, path::PathBuf};

use anyhow::Context;
use log::info;

use p300_learner::{Pipeline, PipelineConfig, report::Reporter};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("loading configuration from {}", path.display()),
        None => "validating the default configuration".to_string(),
    })?;

    let reporter = Reporter::new(&config.report_dir)
        .with_context(|| format!("creating report directory {}", config.report_dir.display()))?;

    let mut pipeline = Pipeline::new(config).context("building the classifier")?;
    pipeline.run(&reporter).context("running the walkthrough")?;

    info!("reports written to {}", reporter.dir().display());
    Ok(())
}
