// Cross-checks a generated sitemap.xml against the pages on disk

use chrono::{DateTime, NaiveDate};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use sitegauge_scanner::resolver::Resolver;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Failed to read sitemap {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed sitemap: {0}")]
    Xml(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// Informational sitemap findings. Never affects the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapCoverage {
    pub path: PathBuf,
    pub entries: usize,
    /// `loc` values that do not map to a local file.
    pub unresolved: Vec<String>,
    /// `loc` values whose `lastmod` is not a date.
    pub invalid_lastmod: Vec<String>,
    /// Scanned pages that no sitemap entry points at.
    pub unlisted_pages: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parses a `<urlset>` document into `(loc, lastmod)` entries.
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<SitemapEntry> = None;
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => {
                    current = Some(SitemapEntry {
                        loc: String::new(),
                        lastmod: None,
                    })
                }
                b"loc" if current.is_some() => field = Some("loc"),
                b"lastmod" if current.is_some() => field = Some("lastmod"),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (Some(entry), Some(name)) = (current.as_mut(), field) {
                    let text = e.unescape().map_err(|e| SitemapError::Xml(e.to_string()))?;
                    let text = text.trim();
                    match name {
                        "loc" => entry.loc.push_str(text),
                        _ => entry.lastmod = Some(text.to_string()),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" | b"lastmod" => field = None,
                b"url" => {
                    if let Some(entry) = current.take()
                        && !entry.loc.is_empty()
                    {
                        entries.push(entry);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(SitemapError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

pub fn load_sitemap(path: &Path) -> Result<Vec<SitemapEntry>, SitemapError> {
    let xml = fs::read_to_string(path).map_err(|source| SitemapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sitemap(&xml)
}

/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps.
pub fn is_valid_lastmod(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

/// Resolves every sitemap entry as if linked from the homepage.
///
/// Returns `None` when there is no sitemap at `path`.
pub fn check_sitemap(
    path: &Path,
    resolver: &Resolver,
    homepage: &Path,
    pages: &[PathBuf],
) -> Option<SitemapCoverage> {
    if !path.is_file() {
        info!("No sitemap at {}", path.display());
        return None;
    }

    let mut coverage = SitemapCoverage {
        path: path.to_path_buf(),
        ..SitemapCoverage::default()
    };

    let entries = match load_sitemap(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("{}", e);
            coverage.error = Some(e.to_string());
            return Some(coverage);
        }
    };
    coverage.entries = entries.len();

    let mut listed = HashSet::new();
    for entry in &entries {
        match resolver.resolve(homepage, &entry.loc).local_path() {
            Some(target) => {
                listed.insert(target.clone());
            }
            None => coverage.unresolved.push(entry.loc.clone()),
        }

        if let Some(ref lastmod) = entry.lastmod
            && !is_valid_lastmod(lastmod)
        {
            coverage.invalid_lastmod.push(entry.loc.clone());
        }
    }

    coverage.unlisted_pages = pages
        .iter()
        .filter(|page| !listed.contains(*page))
        .cloned()
        .collect();

    info!(
        "Sitemap: {} entries, {} unresolved, {} pages unlisted",
        coverage.entries,
        coverage.unresolved.len(),
        coverage.unlisted_pages.len()
    );
    Some(coverage)
}
