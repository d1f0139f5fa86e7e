use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DeadLocalLink,
    MissingHeading,
    DeadExternalLink,
    AbsoluteInternalLink,
    RelativePath,
    CleanUrl,
    MissingRelations,
    MissingStructuredData,
    OrphanPage,
    MultipleHeadings,
    ScanFailure,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::DeadLocalLink
            | IssueKind::MissingHeading
            | IssueKind::DeadExternalLink
            | IssueKind::ScanFailure => Severity::Error,
            IssueKind::AbsoluteInternalLink
            | IssueKind::RelativePath
            | IssueKind::CleanUrl
            | IssueKind::MissingRelations
            | IssueKind::MissingStructuredData
            | IssueKind::OrphanPage
            | IssueKind::MultipleHeadings => Severity::Warn,
        }
    }

    /// Points deducted from the score for one occurrence.
    pub fn weight(&self) -> u32 {
        match self {
            IssueKind::DeadLocalLink => 10,
            IssueKind::MissingHeading => 5,
            IssueKind::DeadExternalLink => 5,
            IssueKind::AbsoluteInternalLink
            | IssueKind::RelativePath
            | IssueKind::CleanUrl
            | IssueKind::MissingRelations => 2,
            IssueKind::MissingStructuredData => 2,
            IssueKind::OrphanPage => 5,
            IssueKind::MultipleHeadings | IssueKind::ScanFailure => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DeadLocalLink => "dead_local_link",
            IssueKind::MissingHeading => "missing_heading",
            IssueKind::DeadExternalLink => "dead_external_link",
            IssueKind::AbsoluteInternalLink => "absolute_internal_link",
            IssueKind::RelativePath => "relative_path",
            IssueKind::CleanUrl => "clean_url",
            IssueKind::MissingRelations => "missing_relations",
            IssueKind::MissingStructuredData => "missing_structured_data",
            IssueKind::OrphanPage => "orphan_page",
            IssueKind::MultipleHeadings => "multiple_headings",
            IssueKind::ScanFailure => "scan_failure",
        }
    }

    pub fn is_policy_warning(&self) -> bool {
        matches!(
            self,
            IssueKind::AbsoluteInternalLink
                | IssueKind::RelativePath
                | IssueKind::CleanUrl
                | IssueKind::MissingRelations
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    /// Referring page, `None` for site-wide issues.
    pub file: Option<PathBuf>,
    pub weight: u32,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>, file: Option<&Path>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            file: file.map(Path::to_path_buf),
            weight: kind.weight(),
        }
    }
}

/// Append-only issue log with a running score floored at zero.
#[derive(Debug, Clone)]
pub struct IssueLog {
    issues: Vec<Issue>,
    score: u32,
}

impl IssueLog {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            score: MAX_SCORE,
        }
    }

    pub fn push(&mut self, issue: Issue) {
        self.score = self.score.saturating_sub(issue.weight);

        match issue.severity {
            Severity::Error => warn!(
                "[{}] {}: {}",
                issue.severity.as_str(),
                display_file(issue.file.as_deref()),
                issue.message
            ),
            Severity::Warn => debug!(
                "[{}] {}: {}",
                issue.severity.as_str(),
                display_file(issue.file.as_deref()),
                issue.message
            ),
        }

        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn log(&mut self, kind: IssueKind, message: impl Into<String>, file: Option<&Path>) {
        self.push(Issue::new(kind, message, file));
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl Default for IssueLog {
    fn default() -> Self {
        Self::new()
    }
}

fn display_file(file: Option<&Path>) -> String {
    file.map(|f| f.display().to_string())
        .unwrap_or_else(|| "Global".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_ordered_for_links() {
        assert!(IssueKind::DeadLocalLink.weight() > IssueKind::MissingHeading.weight());
        assert!(IssueKind::MissingHeading.weight() >= IssueKind::DeadExternalLink.weight());
        assert!(IssueKind::DeadExternalLink.weight() > IssueKind::CleanUrl.weight());
        assert_eq!(IssueKind::MultipleHeadings.weight(), 0);
    }

    #[test]
    fn test_score_deducts_weights() {
        let mut log = IssueLog::new();
        log.log(IssueKind::DeadLocalLink, "Dead link (local): /c", None);
        log.log(IssueKind::OrphanPage, "Orphan page", None);
        log.log(IssueKind::CleanUrl, "Clean URL", None);

        assert_eq!(log.score(), 83);
        assert_eq!(log.issues().len(), 3);
        assert_eq!(log.count(IssueKind::DeadLocalLink), 1);
    }

    #[test]
    fn test_score_is_floored_at_zero() {
        let mut log = IssueLog::new();
        for _ in 0..15 {
            log.log(IssueKind::DeadLocalLink, "dead", None);
        }
        assert_eq!(log.score(), 0);
        assert_eq!(log.issues().len(), 15);
    }

    #[test]
    fn test_severity_follows_kind() {
        let issue = Issue::new(IssueKind::MultipleHeadings, "two", Some(Path::new("/a.html")));
        assert_eq!(issue.severity, Severity::Warn);
        assert_eq!(issue.weight, 0);
        assert_eq!(issue.file.as_deref(), Some(Path::new("/a.html")));
    }
}
