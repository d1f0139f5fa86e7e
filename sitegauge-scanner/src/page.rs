use crate::error::{Result, ScanError};
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Relations every outbound anchor to an untrusted domain must carry.
pub const SAFETY_RELATIONS: [&str; 3] = ["nofollow", "noopener", "noreferrer"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Lower-cased, whitespace-split tokens of the `rel` attribute.
    pub rel: Vec<String>,
}

impl Anchor {
    pub fn missing_relations(&self) -> Vec<&'static str> {
        SAFETY_RELATIONS
            .iter()
            .copied()
            .filter(|required| !self.rel.iter().any(|r| r == required))
            .collect()
    }
}

/// Structural signals and anchors pulled out of one HTML document.
#[derive(Debug, Clone, Default)]
pub struct PageSignals {
    pub h1_count: usize,
    pub has_structured_data: bool,
    pub has_breadcrumb: bool,
    pub anchors: Vec<Anchor>,
}

/// Site configuration advertised by the homepage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomepageMeta {
    pub base_url: Option<String>,
    pub keywords: Vec<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("selector {}: {}", css, e)))
}

/// Reads a page from disk. Invalid UTF-8 is replaced rather than rejected.
pub fn read_page(path: &Path) -> Result<PageSignals> {
    let bytes = fs::read(path).map_err(|source| ScanError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let html = String::from_utf8_lossy(&bytes);
    extract_signals(&html)
}

pub fn extract_signals(html: &str) -> Result<PageSignals> {
    let document = Html::parse_document(html);

    let h1_count = document.select(&selector("h1")?).count();

    let has_structured_data = document.select(&selector("script[type]")?).any(|script| {
        script
            .value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
    });

    let has_breadcrumb = document
        .select(&selector("[aria-label]")?)
        .any(|el| {
            el.value()
                .attr("aria-label")
                .is_some_and(|label| label.trim().eq_ignore_ascii_case("breadcrumb"))
        })
        || document.select(&selector("[class]")?).any(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| class.to_lowercase().contains("breadcrumb"))
        });

    let mut anchors = Vec::new();
    for element in document.select(&selector("a[href]")?) {
        if let Some(href) = element.value().attr("href") {
            let rel = element
                .value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().map(str::to_lowercase).collect())
                .unwrap_or_default();
            anchors.push(Anchor {
                href: href.trim().to_string(),
                rel,
            });
        }
    }

    debug!(
        "Extracted {} anchors, {} h1, structured data: {}",
        anchors.len(),
        h1_count,
        has_structured_data
    );

    Ok(PageSignals {
        h1_count,
        has_structured_data,
        has_breadcrumb,
        anchors,
    })
}

/// Base URL comes from `<link rel="canonical">`, falling back to `og:url`.
pub fn extract_homepage_meta(html: &str) -> Result<HomepageMeta> {
    let document = Html::parse_document(html);

    let canonical = document
        .select(&selector("link[rel][href]")?)
        .find(|link| {
            link.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    let base_url = match canonical {
        Some(href) => Some(href),
        None => document
            .select(&selector("meta[property][content]")?)
            .find(|meta| meta.value().attr("property") == Some("og:url"))
            .and_then(|meta| meta.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string),
    };

    let keywords = document
        .select(&selector("meta[name][content]")?)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("keywords"))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| {
            content
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(HomepageMeta { base_url, keywords })
}
