use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of resolving one hyperlink found in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// The link points at a file that exists under the site root.
    LocalFile {
        path: PathBuf,
        /// True when the hit came from `<dir>/index.html`.
        directory_index: bool,
    },
    /// The link leaves the site.
    ExternalUrl(String),
    /// Nothing on disk answers to the link.
    Unresolvable,
}

impl ResolvedTarget {
    pub fn local_path(&self) -> Option<&PathBuf> {
        match self {
            ResolvedTarget::LocalFile { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, ResolvedTarget::Unresolvable)
    }
}

/// An outbound URL together with the page that references it.
///
/// Two pages linking the same URL produce two records so that failures can
/// be attributed to each referring page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalLinkRecord {
    pub url: String,
    pub source: PathBuf,
}

impl ExternalLinkRecord {
    pub fn new(url: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The server answered with a 4xx/5xx status on both probes.
    Status(u16),
    /// The request never completed (timeout, refused connection, DNS).
    Network(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Status(code) => write!(f, "{}", code),
            FailureReason::Network(err) => write!(f, "{}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFailure {
    pub record: ExternalLinkRecord,
    pub reason: FailureReason,
}
