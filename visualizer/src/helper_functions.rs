use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// `MATRIX_OUTPUT_DIR`, or `matrix_report/` under the project root.
pub fn output_dir() -> PathBuf {
    match env::var_os("MATRIX_OUTPUT_DIR") {
        Some(val) => PathBuf::from(val),
        None => project_root().join("matrix_report"),
    }
}

/// Write the resolved configuration next to the rendered files so a run can
/// be reproduced with `confusion-visualizer <dir>/config.json`.
pub fn write_config_json<T: Serialize>(dir: &Path, config: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let config_path = dir.join("config.json");
    fs::write(&config_path, serde_json::to_string_pretty(config)?)?;
    info!("Configuration written to {}", config_path.display());
    Ok(config_path)
}

/// Round half away from zero to `decimals` places. NaN and infinities pass
/// through.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
