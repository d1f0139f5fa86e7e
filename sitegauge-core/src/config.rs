use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audit settings. Every field has a default so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Overrides the base URL detected from the homepage.
    pub base_url: Option<String>,
    /// Homepage file, relative to the site root.
    pub homepage: PathBuf,
    /// Directory names skipped during discovery.
    pub ignore_dirs: Vec<String>,
    /// Files whose name contains any of these are not scanned.
    pub ignore_file_patterns: Vec<String>,
    /// Links starting with any of these are never classified.
    pub ignore_url_prefixes: Vec<String>,
    /// Domains whose 403 answers count as reachable.
    pub trusted_domains: Vec<String>,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub top_pages: usize,
    pub check_external: bool,
    /// Sitemap location; defaults to `sitemap.xml` under the root.
    pub sitemap: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            homepage: PathBuf::from("index.html"),
            ignore_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "__pycache__".to_string(),
            ],
            ignore_file_patterns: vec![
                "google".to_string(),
                "404.html".to_string(),
                "baidu_verify".to_string(),
            ],
            ignore_url_prefixes: vec![
                "/go/".to_string(),
                "/cdn-cgi/".to_string(),
                "javascript:".to_string(),
                "mailto:".to_string(),
                "#".to_string(),
                "tel:".to_string(),
            ],
            trusted_domains: Vec::new(),
            concurrency: 10,
            timeout_secs: 5,
            top_pages: 10,
            check_external: true,
            sitemap: None,
        }
    }
}

impl AuditConfig {
    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AuditConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.homepage.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "homepage must be relative to the site root, got {}",
                self.homepage.display()
            )));
        }
        Ok(())
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|dir| dir == name)
    }

    pub fn is_ignored_file(&self, file_name: &str) -> bool {
        self.ignore_file_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }

    pub fn is_ignored_url(&self, href: &str) -> bool {
        self.ignore_url_prefixes
            .iter()
            .any(|prefix| href.starts_with(prefix.as_str()))
    }

    pub fn sitemap_path(&self, root: &Path) -> PathBuf {
        match &self.sitemap {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join("sitemap.xml"),
        }
    }
}
