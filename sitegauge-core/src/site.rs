use crate::config::AuditConfig;
use sitegauge_scanner::page::extract_homepage_meta;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What the audit knows about the site before scanning starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteProfile {
    pub homepage: PathBuf,
    pub base_url: Option<String>,
    pub keywords: Vec<String>,
}

/// Reads base URL and keywords from the homepage.
///
/// Every failure here degrades to relative-path-only auditing with a warning.
pub fn detect_site_profile(root: &Path, config: &AuditConfig) -> SiteProfile {
    let homepage = root.join(&config.homepage);
    let mut profile = SiteProfile {
        homepage: homepage.clone(),
        base_url: None,
        keywords: Vec::new(),
    };

    info!("Auto-configuring from {}", homepage.display());
    match fs::read(&homepage) {
        Ok(bytes) => match extract_homepage_meta(&String::from_utf8_lossy(&bytes)) {
            Ok(meta) => {
                profile.base_url = meta.base_url;
                profile.keywords = meta.keywords;
            }
            Err(e) => warn!("Failed to parse {}: {}", homepage.display(), e),
        },
        Err(e) => warn!("Homepage {} not readable: {}", homepage.display(), e),
    }

    if let Some(ref base_url) = config.base_url {
        profile.base_url = Some(base_url.clone());
    }

    match profile.base_url {
        Some(ref base_url) => info!("Base URL: {}", base_url),
        None => warn!(
            "Could not detect base URL (canonical or og:url); assuming relative paths"
        ),
    }
    if !profile.keywords.is_empty() {
        info!("Keywords detected: {:?}", profile.keywords);
    }

    profile
}
