// Report generation from an audit outcome

use crate::audit::{AuditOutcome, AuditStats};
use crate::issue::{Issue, MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub root: String,
    pub homepage: String,
    pub base_url: Option<String>,
    pub keywords: Vec<String>,
    pub stats: AuditStats,
    pub issues: Vec<IssueData>,
    pub top_pages: Vec<TopPageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<SitemapData>,
    pub score: u32,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueData {
    pub kind: String,
    pub severity: String,
    pub file: String,
    pub message: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPageData {
    pub path: String,
    pub inbound: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapData {
    pub path: String,
    pub entries: usize,
    pub unresolved: Vec<String>,
    pub invalid_lastmod: Vec<String>,
    pub unlisted_pages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flattens an outcome into display form, with paths relative to the root.
pub fn gather_report_data(outcome: &AuditOutcome) -> ReportData {
    let root = outcome.root.as_path();

    let issues = outcome
        .issues
        .iter()
        .map(|issue| issue_data(issue, root))
        .collect();

    let top_pages = outcome
        .analysis
        .top_pages
        .iter()
        .map(|ranked| TopPageData {
            path: relative_display(&ranked.path, root),
            inbound: ranked.inbound,
        })
        .collect();

    let sitemap = outcome.sitemap.as_ref().map(|coverage| SitemapData {
        path: relative_display(&coverage.path, root),
        entries: coverage.entries,
        unresolved: coverage.unresolved.clone(),
        invalid_lastmod: coverage.invalid_lastmod.clone(),
        unlisted_pages: coverage
            .unlisted_pages
            .iter()
            .map(|p| relative_display(p, root))
            .collect(),
        error: coverage.error.clone(),
    });

    ReportData {
        root: root.display().to_string(),
        homepage: relative_display(&outcome.profile.homepage, root),
        base_url: outcome.profile.base_url.clone(),
        keywords: outcome.profile.keywords.clone(),
        stats: outcome.stats.clone(),
        issues,
        top_pages,
        sitemap,
        score: outcome.score,
        advice: advice_for(&outcome.stats, outcome.score),
    }
}

fn issue_data(issue: &Issue, root: &Path) -> IssueData {
    IssueData {
        kind: issue.kind.as_str().to_string(),
        severity: issue.severity.as_str().to_string(),
        file: issue
            .file
            .as_deref()
            .map(|f| relative_display(f, root))
            .unwrap_or_else(|| "Global".to_string()),
        message: issue.message.clone(),
        weight: issue.weight,
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Advice lines keyed to the statistics. Empty for a perfect score.
pub fn advice_for(stats: &AuditStats, score: u32) -> Vec<String> {
    if score >= MAX_SCORE {
        return Vec::new();
    }

    let mut advice = Vec::new();
    if stats.dead_links_local > 0 {
        advice.push("Fix local dead links immediately.".to_string());
    }
    if stats.dead_links_external > 0 {
        advice.push("Repair or remove dead external links.".to_string());
    }
    if stats.h1_missing > 0 || stats.h1_multiple > 0 {
        advice.push("Ensure every page has exactly one <h1> tag.".to_string());
    }
    if stats.schema_missing > 0 {
        advice.push("Add structured data (JSON-LD) to your pages.".to_string());
    }
    if stats.orphans > 0 {
        advice.push("Link to orphan pages from other parts of your site.".to_string());
    }
    if stats.policy_warnings > 0 {
        advice.push(
            "Use root-relative clean URLs internally and mark external links noopener noreferrer."
                .to_string(),
        );
    }
    advice
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                          SITEGAUGE AUDIT REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Root:         {}\n", data.root));
    report.push_str(&format!("Homepage:     {}\n", data.homepage));
    report.push_str(&format!(
        "Base URL:     {}\n",
        data.base_url.as_deref().unwrap_or("(not detected)")
    ));
    if !data.keywords.is_empty() {
        report.push_str(&format!("Keywords:     {}\n", data.keywords.join(", ")));
    }
    report.push('\n');

    section(&mut report, "STATISTICS");
    let s = &data.stats;
    report.push_str(&format!("Pages Scanned:       {}\n", s.pages_scanned));
    if s.pages_failed > 0 {
        report.push_str(&format!("Pages Failed:        {}\n", s.pages_failed));
    }
    report.push_str(&format!("Internal Links:      {}\n", s.internal_links));
    report.push_str(&format!("External Links:      {}\n", s.external_links));
    report.push_str(&format!("Dead Links (local):  {}\n", s.dead_links_local));
    report.push_str(&format!("Dead Links (ext):    {}\n", s.dead_links_external));
    report.push_str(&format!("URL Warnings:        {}\n", s.policy_warnings));
    report.push_str(&format!("Missing <h1>:        {}\n", s.h1_missing));
    report.push_str(&format!("Multiple <h1>:       {}\n", s.h1_multiple));
    report.push_str(&format!("Missing Schema:      {}\n", s.schema_missing));
    report.push_str(&format!("Breadcrumb Pages:    {}\n", s.breadcrumbs));
    report.push_str(&format!("Orphan Pages:        {}\n", s.orphans));
    report.push('\n');

    if s.pages_scanned == 0 {
        if s.pages_failed > 0 {
            report.push_str("Every HTML file failed to scan. Nothing was audited.\n\n");
        } else {
            report.push_str("No HTML files found. Nothing was audited.\n\n");
        }
    }

    if !data.issues.is_empty() {
        section(&mut report, "ISSUES");
        for issue in &data.issues {
            let line = format!(
                "[{}] {}: {} (-{})",
                issue.severity, issue.file, issue.message, issue.weight
            );
            report.push_str(&wrap_text(&line, 80, ""));
        }
        report.push('\n');
    }

    if !data.top_pages.is_empty() {
        section(
            &mut report,
            &format!("TOP {} PAGES BY INBOUND LINKS", data.top_pages.len()),
        );
        for page in &data.top_pages {
            report.push_str(&format!("{}: {} links\n", page.path, page.inbound));
        }
        report.push('\n');
    }

    if let Some(ref sitemap) = data.sitemap {
        section(&mut report, "SITEMAP");
        report.push_str(&format!("File:         {}\n", sitemap.path));
        if let Some(ref error) = sitemap.error {
            report.push_str(&format!("Error:        {}\n", error));
        } else {
            report.push_str(&format!("Entries:      {}\n", sitemap.entries));
            list_block(&mut report, "Unresolved entries", &sitemap.unresolved);
            list_block(&mut report, "Invalid lastmod", &sitemap.invalid_lastmod);
            list_block(&mut report, "Pages not in sitemap", &sitemap.unlisted_pages);
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str(&format!("Final Score: {}/{}\n", data.score, MAX_SCORE));
    report.push_str(RULE);

    if !data.advice.is_empty() {
        report.push_str("\nActionable Advice:\n");
        for line in &data.advice {
            report.push_str(&wrap_text(line, 80, "  - "));
        }
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "sitegauge",
                "version": env!("CARGO_PKG_VERSION"),
                "format": "json"
            },
            "site": {
                "root": data.root,
                "homepage": data.homepage,
                "base_url": data.base_url,
                "keywords": data.keywords
            },
            "summary": {
                "score": data.score,
                "max_score": MAX_SCORE,
                "total_issues": data.issues.len(),
                "stats": data.stats
            },
            "issues": data.issues,
            "top_pages": data.top_pages,
            "sitemap": data.sitemap,
            "advice": data.advice
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn render_report(data: &ReportData, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

fn list_block(report: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    report.push_str(&format!("{} ({}):\n", title, items.len()));
    for item in items {
        report.push_str(&format!("  {}\n", item));
    }
}

/// Wraps on whitespace. Continuation lines are indented to match `lead`.
fn wrap_text(text: &str, width: usize, lead: &str) -> String {
    let pad = " ".repeat(lead.chars().count());
    let budget = width.saturating_sub(pad.len()).max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();
    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > budget {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }

    let mut result = String::new();
    for (idx, line) in lines.iter().enumerate() {
        result.push_str(if idx == 0 { lead } else { pad.as_str() });
        result.push_str(line);
        result.push('\n');
    }
    result
}
