use crate::config::AuditConfig;
use sitegauge_scanner::resolver::normalize_path;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Absolute form of the site root so that discovered paths and resolved
/// link targets compare equal.
pub fn canonical_root(root: &Path) -> PathBuf {
    match fs::canonicalize(root) {
        Ok(path) => path,
        Err(e) => {
            warn!("Could not canonicalize {}: {}", root.display(), e);
            let absolute = std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.to_path_buf());
            normalize_path(&absolute)
        }
    }
}

/// Lists every HTML page under `root`, sorted by path for stable output.
pub fn discover_pages(root: &Path, config: &AuditConfig) -> Vec<PathBuf> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e, config))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if config.is_ignored_file(&file_name) {
            debug!("Ignoring {}", path.display());
            continue;
        }

        pages.push(path.to_path_buf());
    }

    info!("Found {} HTML files to audit", pages.len());
    pages
}

fn is_ignored_dir(entry: &DirEntry, config: &AuditConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && config.is_ignored_dir(&entry.file_name().to_string_lossy())
}
