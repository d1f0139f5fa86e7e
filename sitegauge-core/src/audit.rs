use crate::checks::{ScanContext, scan_page};
use crate::config::AuditConfig;
use crate::discover::{canonical_root, discover_pages};
use crate::error::AuditError;
use crate::graph::{GraphAnalysis, LinkGraph, analyze};
use crate::issue::{Issue, IssueKind, IssueLog, MAX_SCORE};
use crate::site::{SiteProfile, detect_site_profile};
use crate::sitemap::{SitemapCoverage, check_sitemap};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sitegauge_scanner::resolver::Resolver;
use sitegauge_scanner::result::ExternalLinkRecord;
use sitegauge_scanner::verifier::{LinkVerifier, VerifyProgressCallback};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Options for configuring an audit run
pub struct AuditOptions {
    pub root: PathBuf,
    pub config: AuditConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting which phase the audit is in
pub type AuditProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub pages_scanned: usize,
    pub pages_failed: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub dead_links_local: usize,
    pub dead_links_external: usize,
    pub policy_warnings: usize,
    pub h1_missing: usize,
    pub h1_multiple: usize,
    pub schema_missing: usize,
    pub breadcrumbs: usize,
    pub orphans: usize,
}

/// Result of one audit run
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub root: PathBuf,
    pub profile: SiteProfile,
    pub stats: AuditStats,
    pub issues: Vec<Issue>,
    pub score: u32,
    pub analysis: GraphAnalysis,
    pub sitemap: Option<SitemapCoverage>,
}

impl AuditOutcome {
    pub fn is_perfect(&self) -> bool {
        self.score == MAX_SCORE
    }
}

/// Scans every page in order and returns the distinct external links.
/// A page that fails to scan counts toward `pages_failed` only and does not
/// stop the pages after it.
fn scan_pages(
    pages: &[PathBuf],
    ctx: &ScanContext<'_>,
    graph: &mut LinkGraph,
    log: &mut IssueLog,
    stats: &mut AuditStats,
    pb: Option<&ProgressBar>,
) -> Vec<ExternalLinkRecord> {
    let mut external: Vec<ExternalLinkRecord> = Vec::new();
    let mut seen_external: HashSet<ExternalLinkRecord> = HashSet::new();

    for (idx, page) in pages.iter().enumerate() {
        if let Some(pb) = pb {
            pb.set_message(format!("Scanning {}/{}", idx + 1, pages.len()));
            pb.tick();
        }

        let scan = scan_page(page, ctx);
        if scan.failed {
            stats.pages_failed += 1;
        } else {
            stats.pages_scanned += 1;
        }
        if scan.has_breadcrumb {
            stats.breadcrumbs += 1;
        }
        stats.internal_links += scan.internal_link_count;
        stats.external_links += scan.external_links.len();

        log.extend(scan.issues);
        for (href, target) in &scan.local_links {
            graph.record_link(page, href, target);
        }
        for record in scan.external_links {
            if seen_external.insert(record.clone()) {
                external.push(record);
            }
        }
    }

    external
}

fn spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    Some(pb)
}

fn progress_bar(enabled: bool, len: usize) -> Option<Arc<ProgressBar>> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    Some(Arc::new(pb))
}

/// Execute a full audit of the site under `options.root`.
///
/// Page-level and link-level problems become issues, never errors; the
/// only error is an invalid configuration or an HTTP client that cannot be
/// built.
pub async fn execute_audit(
    options: AuditOptions,
    progress_callback: Option<AuditProgressCallback>,
) -> Result<AuditOutcome, AuditError> {
    let AuditOptions {
        root,
        config,
        show_progress_bars,
    } = options;
    config.validate()?;

    let report_phase = |msg: &str| {
        if let Some(ref callback) = progress_callback {
            callback(msg.to_string());
        }
    };

    let root = canonical_root(&root);
    report_phase("Auto-configuring");
    let profile = detect_site_profile(&root, &config);
    let resolver = Resolver::new(&root).with_base_url(profile.base_url.clone());

    report_phase("Discovering pages");
    let pages = discover_pages(&root, &config);
    let mut graph = LinkGraph::new();
    for page in &pages {
        graph.add_page(page.clone());
    }

    let mut log = IssueLog::new();
    let mut stats = AuditStats::default();

    report_phase("Scanning pages");
    let pb = spinner(show_progress_bars);
    let ctx = ScanContext {
        config: &config,
        resolver: &resolver,
    };
    let external = scan_pages(&pages, &ctx, &mut graph, &mut log, &mut stats, pb.as_ref());
    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    if stats.pages_scanned == 0 {
        if stats.pages_failed > 0 {
            warn!(
                "All {} HTML files under {} failed to scan; nothing was audited",
                stats.pages_failed,
                root.display()
            );
        } else {
            warn!("No HTML files found under {}; nothing was audited", root.display());
        }
    }

    if config.check_external && !external.is_empty() {
        report_phase("Checking external links");
        let bar = progress_bar(show_progress_bars, external.len());
        let mut verifier = LinkVerifier::with_timeout(config.timeout_secs)?
            .with_concurrency(config.concurrency)
            .with_trusted_domains(config.trusted_domains.clone());
        if let Some(ref bar) = bar {
            let bar = bar.clone();
            let callback: VerifyProgressCallback = Arc::new(move |_url: String| bar.inc(1));
            verifier = verifier.with_progress_callback(callback);
        }

        for failure in verifier.verify(external).await {
            log.log(
                IssueKind::DeadExternalLink,
                format!(
                    "External dead link: {} (status/error: {})",
                    failure.record.url, failure.reason
                ),
                Some(failure.record.source.as_path()),
            );
        }
        if let Some(ref bar) = bar {
            bar.finish_and_clear();
        }
    } else if !external.is_empty() {
        info!("Skipping verification of {} external links", external.len());
    }

    report_phase("Analyzing site structure");
    let analysis = analyze(&graph, &profile.homepage, config.top_pages);
    for orphan in &analysis.orphans {
        log.log(
            IssueKind::OrphanPage,
            "Orphan page (no incoming links)",
            Some(orphan.as_path()),
        );
    }

    let sitemap = check_sitemap(
        &config.sitemap_path(&root),
        &resolver,
        &profile.homepage,
        graph.pages(),
    );

    stats.dead_links_local = log.count(IssueKind::DeadLocalLink);
    stats.dead_links_external = log.count(IssueKind::DeadExternalLink);
    stats.policy_warnings = log
        .issues()
        .iter()
        .filter(|i| i.kind.is_policy_warning())
        .count();
    stats.h1_missing = log.count(IssueKind::MissingHeading);
    stats.h1_multiple = log.count(IssueKind::MultipleHeadings);
    stats.schema_missing = log.count(IssueKind::MissingStructuredData);
    stats.orphans = analysis.orphans.len();

    let score = log.score();
    info!(
        "Audit complete: {} pages, {} issues, score {}",
        stats.pages_scanned,
        log.issues().len(),
        score
    );

    Ok(AuditOutcome {
        root,
        profile,
        stats,
        issues: log.into_issues(),
        score,
        analysis,
        sitemap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_continues_past_unreadable_page() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let good = root.join("good.html");
        fs::write(
            &good,
            r#"<html><body><h1>Good</h1><a href="https://example.org/">x</a></body></html>"#,
        )
        .unwrap();
        // Removed between discovery and scanning.
        let gone = root.join("gone.html");

        let config = AuditConfig::default();
        let resolver = Resolver::new(&root);
        let ctx = ScanContext {
            config: &config,
            resolver: &resolver,
        };
        let pages = vec![gone.clone(), good.clone()];
        let mut graph = LinkGraph::new();
        for page in &pages {
            graph.add_page(page.clone());
        }
        let mut log = IssueLog::new();
        let mut stats = AuditStats::default();

        let external = scan_pages(&pages, &ctx, &mut graph, &mut log, &mut stats, None);

        assert_eq!(stats.pages_scanned, 1);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(log.count(IssueKind::ScanFailure), 1);
        let failure = log
            .issues()
            .iter()
            .find(|i| i.kind == IssueKind::ScanFailure)
            .unwrap();
        assert!(failure.file.as_deref().unwrap().ends_with("gone.html"));
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].url, "https://example.org/");
        assert_eq!(external[0].source, good);
    }

    #[test]
    fn test_all_pages_failing_counts_nothing_as_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let config = AuditConfig::default();
        let resolver = Resolver::new(&root);
        let ctx = ScanContext {
            config: &config,
            resolver: &resolver,
        };
        let pages = vec![root.join("a.html"), root.join("b.html")];
        let mut graph = LinkGraph::new();
        let mut log = IssueLog::new();
        let mut stats = AuditStats::default();

        let external = scan_pages(&pages, &ctx, &mut graph, &mut log, &mut stats, None);

        assert_eq!(stats.pages_scanned, 0);
        assert_eq!(stats.pages_failed, 2);
        assert_eq!(log.count(IssueKind::ScanFailure), 2);
        assert_eq!(log.score(), MAX_SCORE);
        assert!(external.is_empty());
    }
}
