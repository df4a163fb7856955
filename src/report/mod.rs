pub mod json;
pub mod junit;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

/// Write the JSON and JUnit reports into `output_dir`
pub fn write_reports(results: &types::TestResults, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;
    json::write_report(results, output_dir)?;
    junit::write_report(results, output_dir)
}

/// Regenerate a report from a saved `test-results.json`
pub fn generate_report(results_path: &Path, format: &str, output_dir: &Path) -> Result<()> {
    let results = json::load(results_path)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;

    match format {
        "json" => json::write_report(&results, output_dir),
        "junit" => junit::write_report(&results, output_dir),
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}
