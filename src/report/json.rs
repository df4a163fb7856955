use super::types::TestResults;
use anyhow::{Context, Result};
use std::path::Path;

/// Write `test-results.json` into `output_dir`
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    let path = output_dir.join("test-results.json");
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("    JSON report saved to: {}", path.display());
    Ok(())
}

/// Read results back from a JSON report
pub fn load(path: &Path) -> Result<TestResults> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid results file: {}", path.display()))
}
