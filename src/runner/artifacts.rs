//! Failure diagnostics: page source and screenshot next to the reports

use crate::driver::traits::AutomationSession;
use colored::Colorize;
use std::path::{Path, PathBuf};

fn timestamp() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string()
}

fn safe_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Save `{prefix}_pagesource_{ts}.xml` and `{prefix}_screenshot_{ts}.png`.
///
/// Each capture is best-effort; returns the files actually written.
pub async fn save_failure_artifacts(
    session: &dyn AutomationSession,
    dir: &Path,
    prefix: &str,
) -> Vec<PathBuf> {
    let mut saved = Vec::new();
    if let Err(e) = std::fs::create_dir_all(dir) {
        log::warn!("cannot create artifact dir {}: {}", dir.display(), e);
        return saved;
    }

    let prefix = safe_prefix(prefix);
    let ts = timestamp();

    match session.snapshot_tree().await {
        Ok(xml) => {
            let path = dir.join(format!("{}_pagesource_{}.xml", prefix, ts));
            match std::fs::write(&path, xml) {
                Ok(()) => {
                    println!("  {} Saved page source: {}", "📄".green(), path.display());
                    saved.push(path);
                }
                Err(e) => log::warn!("failed to write {}: {}", path.display(), e),
            }
        }
        Err(e) => println!("  {} Failed to read page source: {}", "⚠".yellow(), e),
    }

    match session.screenshot().await {
        Ok(png) => {
            let path = dir.join(format!("{}_screenshot_{}.png", prefix, ts));
            match std::fs::write(&path, png) {
                Ok(()) => {
                    println!("  {} Saved screenshot: {}", "📸".green(), path.display());
                    saved.push(path);
                }
                Err(e) => log::warn!("failed to write {}: {}", path.display(), e),
            }
        }
        Err(e) => println!("  {} Failed to take screenshot: {}", "⚠".yellow(), e),
    }

    saved
}
