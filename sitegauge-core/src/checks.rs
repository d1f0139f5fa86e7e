// Per-page content and link hygiene checks

use crate::config::AuditConfig;
use crate::issue::{Issue, IssueKind};
use sitegauge_scanner::page::{Anchor, PageSignals, read_page};
use sitegauge_scanner::resolver::{Resolver, strip_fragment_and_query};
use sitegauge_scanner::result::{ExternalLinkRecord, ResolvedTarget};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ScanContext<'a> {
    pub config: &'a AuditConfig,
    pub resolver: &'a Resolver,
}

/// Everything one page contributes to the audit.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub issues: Vec<Issue>,
    /// `(href, target)` for every link that resolved to a local file.
    pub local_links: Vec<(String, PathBuf)>,
    pub external_links: Vec<ExternalLinkRecord>,
    pub internal_link_count: usize,
    pub has_breadcrumb: bool,
    pub failed: bool,
}

/// Reads and checks one page. A page that cannot be read yields a single
/// scan-failure issue instead of aborting the run.
pub fn scan_page(page: &Path, ctx: &ScanContext<'_>) -> PageScan {
    match read_page(page) {
        Ok(signals) => check_signals(page, &signals, ctx),
        Err(e) => {
            warn!("Error processing {}: {}", page.display(), e);
            PageScan {
                issues: vec![Issue::new(
                    IssueKind::ScanFailure,
                    format!("Failed to scan page: {}", e),
                    Some(page),
                )],
                failed: true,
                ..PageScan::default()
            }
        }
    }
}

pub fn check_signals(page: &Path, signals: &PageSignals, ctx: &ScanContext<'_>) -> PageScan {
    let mut scan = PageScan {
        has_breadcrumb: signals.has_breadcrumb,
        ..PageScan::default()
    };

    scan.issues.extend(check_headings(page, signals));
    scan.issues.extend(check_structured_data(page, signals));

    for anchor in &signals.anchors {
        check_anchor(page, anchor, ctx, &mut scan);
    }

    debug!(
        "{}: {} issues, {} local links, {} external links",
        page.display(),
        scan.issues.len(),
        scan.local_links.len(),
        scan.external_links.len()
    );
    scan
}

pub fn check_headings(page: &Path, signals: &PageSignals) -> Option<Issue> {
    match signals.h1_count {
        0 => Some(Issue::new(
            IssueKind::MissingHeading,
            "Missing <h1> tag",
            Some(page),
        )),
        1 => None,
        n => Some(Issue::new(
            IssueKind::MultipleHeadings,
            format!("Multiple <h1> tags found ({})", n),
            Some(page),
        )),
    }
}

pub fn check_structured_data(page: &Path, signals: &PageSignals) -> Option<Issue> {
    if signals.has_structured_data {
        None
    } else {
        Some(Issue::new(
            IssueKind::MissingStructuredData,
            "Missing Schema.org JSON-LD",
            Some(page),
        ))
    }
}

pub fn check_anchor(page: &Path, anchor: &Anchor, ctx: &ScanContext<'_>, scan: &mut PageScan) {
    let href = anchor.href.as_str();
    if href.is_empty() || ctx.config.is_ignored_url(href) {
        return;
    }

    let target = match ctx.resolver.resolve(page, href) {
        ResolvedTarget::ExternalUrl(url) => {
            check_external_anchor(page, anchor, url, scan);
            return;
        }
        target => target,
    };

    scan.internal_link_count += 1;

    if ctx.resolver.is_site_url(href) {
        scan.issues.push(Issue::new(
            IssueKind::AbsoluteInternalLink,
            format!("Internal link uses full domain: {}. Should be path-only", href),
            Some(page),
        ));
    } else if is_document_relative(href) {
        scan.issues.push(Issue::new(
            IssueKind::RelativePath,
            format!("Relative path used: {}. Recommended: start with /", href),
            Some(page),
        ));
    }

    if has_html_suffix(href) {
        scan.issues.push(Issue::new(
            IssueKind::CleanUrl,
            format!("Link contains .html extension: {}. Recommended: clean URL", href),
            Some(page),
        ));
    }

    match target {
        ResolvedTarget::LocalFile { path, .. } => {
            scan.local_links.push((href.to_string(), path));
        }
        _ => {
            scan.issues.push(Issue::new(
                IssueKind::DeadLocalLink,
                format!("Dead link (local): {}", href),
                Some(page),
            ));
        }
    }
}

/// Outbound anchors must carry every safety relation and are queued for
/// verification.
fn check_external_anchor(page: &Path, anchor: &Anchor, url: String, scan: &mut PageScan) {
    let missing = anchor.missing_relations();
    if !missing.is_empty() {
        scan.issues.push(Issue::new(
            IssueKind::MissingRelations,
            format!(
                "External link missing rel attributes ({}): {}",
                missing.join(", "),
                anchor.href
            ),
            Some(page),
        ));
    }
    scan.external_links.push(ExternalLinkRecord::new(url, page));
}

pub fn is_document_relative(href: &str) -> bool {
    !href.starts_with('/') && !href.starts_with('#')
}

/// True when the last path segment, ignoring query and fragment, ends in `.html`.
pub fn has_html_suffix(href: &str) -> bool {
    let path = strip_fragment_and_query(href);
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.to_ascii_lowercase().ends_with(".html"))
}
