//! Inbound-link graph built while pages are scanned, and the post-pass that
//! finds orphans and ranks pages.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    pages: Vec<PathBuf>,
    page_set: HashSet<PathBuf>,
    inbound: HashMap<PathBuf, usize>,
    // First-seen order of targets, used to break ranking ties.
    targets: Vec<PathBuf>,
    links: HashSet<(PathBuf, String)>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a discovered page. Returns false if it was already known.
    pub fn add_page(&mut self, page: impl Into<PathBuf>) -> bool {
        let page = page.into();
        if self.page_set.insert(page.clone()) {
            self.pages.push(page);
            true
        } else {
            false
        }
    }

    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    pub fn contains_page(&self, page: &Path) -> bool {
        self.page_set.contains(page)
    }

    /// Counts `href` in `source` as one inbound reference to `target`.
    ///
    /// The same href repeated within one page counts once.
    pub fn record_link(&mut self, source: &Path, href: &str, target: &Path) -> bool {
        if !self
            .links
            .insert((source.to_path_buf(), href.to_string()))
        {
            return false;
        }

        let count = self.inbound.entry(target.to_path_buf()).or_insert(0);
        if *count == 0 {
            self.targets.push(target.to_path_buf());
        }
        *count += 1;
        true
    }

    pub fn inbound_count(&self, page: &Path) -> usize {
        self.inbound.get(page).copied().unwrap_or(0)
    }

    /// Link targets with their counts, in first-seen order.
    pub fn targets(&self) -> impl Iterator<Item = (&Path, usize)> {
        self.targets
            .iter()
            .map(|t| (t.as_path(), self.inbound_count(t)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPage {
    pub path: PathBuf,
    pub inbound: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphAnalysis {
    /// Pages nobody links to, homepage excluded, in discovery order.
    pub orphans: Vec<PathBuf>,
    pub top_pages: Vec<RankedPage>,
}

pub fn analyze(graph: &LinkGraph, homepage: &Path, top_n: usize) -> GraphAnalysis {
    let orphans: Vec<PathBuf> = graph
        .pages()
        .iter()
        .filter(|page| page.as_path() != homepage && graph.inbound_count(page) == 0)
        .cloned()
        .collect();

    let mut ranked: Vec<RankedPage> = graph
        .targets()
        .map(|(path, inbound)| RankedPage {
            path: path.to_path_buf(),
            inbound,
        })
        .collect();
    // sort_by is stable, so equal counts keep first-seen order
    ranked.sort_by(|a, b| b.inbound.cmp(&a.inbound));
    ranked.truncate(top_n);

    info!(
        "Graph analysis: {} pages, {} link targets, {} orphans",
        graph.pages().len(),
        graph.targets.len(),
        orphans.len()
    );

    GraphAnalysis {
        orphans,
        top_pages: ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_repeated_href_in_one_page_counts_once() {
        let mut graph = LinkGraph::new();
        graph.add_page(p("/s/a.html"));
        graph.add_page(p("/s/b.html"));

        assert!(graph.record_link(&p("/s/a.html"), "/b", &p("/s/b.html")));
        assert!(!graph.record_link(&p("/s/a.html"), "/b", &p("/s/b.html")));
        assert!(graph.record_link(&p("/s/a.html"), "/b.html", &p("/s/b.html")));

        assert_eq!(graph.inbound_count(&p("/s/b.html")), 2);
    }

    #[test]
    fn test_add_page_is_idempotent() {
        let mut graph = LinkGraph::new();
        assert!(graph.add_page(p("/s/a.html")));
        assert!(!graph.add_page(p("/s/a.html")));
        assert_eq!(graph.pages().len(), 1);
    }

    #[test]
    fn test_ranking_ties_keep_first_seen_order() {
        let mut graph = LinkGraph::new();
        graph.record_link(&p("/s/x.html"), "/c", &p("/s/c.html"));
        graph.record_link(&p("/s/x.html"), "/a", &p("/s/a.html"));
        graph.record_link(&p("/s/y.html"), "/a", &p("/s/a.html"));
        graph.record_link(&p("/s/x.html"), "/b", &p("/s/b.html"));

        let analysis = analyze(&graph, &p("/s/index.html"), 10);
        let order: Vec<_> = analysis.top_pages.iter().map(|r| r.path.clone()).collect();
        assert_eq!(order, vec![p("/s/a.html"), p("/s/c.html"), p("/s/b.html")]);
        assert_eq!(analysis.top_pages[0].inbound, 2);
    }

    #[test]
    fn test_top_n_truncates() {
        let mut graph = LinkGraph::new();
        for i in 0..5 {
            graph.record_link(&p("/s/x.html"), &format!("/{}", i), &p(&format!("/s/{}.html", i)));
        }
        assert_eq!(analyze(&graph, &p("/s/index.html"), 3).top_pages.len(), 3);
    }
}
