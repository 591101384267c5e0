use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::output::types::Artifact;

const HEADER: &str =
    "generated_at,label,confidence,lifts_open,lifts_total,snow_7d_cm,base_depth_cm,forecast_days";

/// Append-only CSV history of run outcomes. Nothing reads it back.
pub struct RunLogger {
    log_path: String,
}

impl RunLogger {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !Path::new(&log_path).exists() {
            if let Some(dir) = Path::new(&log_path).parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&log_path)
                .with_context(|| format!("Failed to create {}", log_path))?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self { log_path })
    }

    /// Log the outcome of one run
    pub fn log_run(&self, artifact: &Artifact) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open {}", self.log_path))?;

        writeln!(file, "{}", csv_row(artifact))?;

        Ok(())
    }
}

fn csv_row(artifact: &Artifact) -> String {
    let opt = |v: Option<String>| v.unwrap_or_default();
    let lifts = &artifact.current.lifts;
    let snow = &artifact.current.snow;

    format!(
        "{},{},{},{},{},{},{},{}",
        artifact.generated_at.to_rfc3339(),
        csv_field(&artifact.next.label),
        artifact.next.confidence,
        opt(lifts.open.map(|v| v.to_string())),
        opt(lifts.total.map(|v| v.to_string())),
        opt(snow.snow7_days_cm.map(|v| v.to_string())),
        opt(snow.base_depth_cm.map(|v| v.to_string())),
        artifact.forecast.days.len()
    )
}

/// Quote fields containing separators.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
