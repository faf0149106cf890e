use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use confusion_visualizer::helper_functions::{output_dir, write_config_json};
use confusion_visualizer::{render_to_dir, MatrixOptions, ReportConfig};

fn config_path() -> Option<PathBuf> {
    env::args_os()
        .nth(1)
        .or_else(|| env::var_os("MATRIX_CONFIG"))
        .map(PathBuf::from)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting the confusion matrix report");

    let options = match config_path() {
        Some(path) => ReportConfig::load(&path)
            .and_then(ReportConfig::into_options)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => {
            warn!("No configuration given; rendering the built-in example matrix");
            MatrixOptions::default()
        }
    };

    let out_dir = output_dir();
    let report = render_to_dir(&options, &out_dir)
        .with_context(|| format!("failed to render report into {}", out_dir.display()))?;
    write_config_json(&out_dir, &options.to_config()).context("failed to write config.json")?;

    info!("Metrics:\n{}", report.metrics_table);
    info!("Report written to {}", out_dir.join("report.html").display());
    Ok(())
}
