//! Maps hyperlinks found in a page onto files under the site root.
//!
//! A link is resolved by probing the filesystem in a fixed order: the exact
//! path, the path with `.html` appended (clean URLs), and finally the path as
//! a directory holding an `index.html`. The first hit wins.

use crate::result::ResolvedTarget;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    base_url: Option<String>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize_path(&root.into()),
            base_url: None,
        }
    }

    /// Absolute links starting with `base_url` are treated as internal.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Path-only remainder of `href` when it points at the site's own domain.
    ///
    /// The remainder always starts with `/`. Fragments and queries are
    /// dropped first, and the base must end on a path boundary so that
    /// `https://example.com.evil.org` never matches `https://example.com`.
    pub fn site_path(&self, href: &str) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let clean = strip_fragment_and_query(href.trim());
        let rest = clean.strip_prefix(base)?;

        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }

    pub fn is_site_url(&self, href: &str) -> bool {
        self.site_path(href).is_some()
    }

    pub fn resolve(&self, source_page: &Path, href: &str) -> ResolvedTarget {
        let href = href.trim();
        let clean = strip_fragment_and_query(href);

        let path_part: Cow<'_, str> = match self.site_path(clean) {
            Some(site_path) => Cow::Owned(site_path),
            None if is_network_url(clean) => {
                return ResolvedTarget::ExternalUrl(href.to_string());
            }
            None => Cow::Borrowed(clean),
        };

        let target = if path_part.starts_with('/') {
            self.root.join(path_part.trim_start_matches('/'))
        } else {
            let base_dir = source_page.parent().unwrap_or(&self.root);
            base_dir.join(path_part.as_ref())
        };
        let target = normalize_path(&target);

        if !target.starts_with(&self.root) {
            debug!("Link {} escapes the site root", href);
            return ResolvedTarget::Unresolvable;
        }

        let names_directory = path_part.is_empty() || path_part.ends_with('/');
        probe(&target, names_directory)
    }
}

/// Free-standing form of [`Resolver::resolve`].
pub fn resolve(
    source_page: &Path,
    href: &str,
    root: &Path,
    base_url: Option<&str>,
) -> ResolvedTarget {
    Resolver::new(root)
        .with_base_url(base_url.map(str::to_string))
        .resolve(source_page, href)
}

fn probe(target: &Path, names_directory: bool) -> ResolvedTarget {
    if !names_directory && target.is_file() {
        return ResolvedTarget::LocalFile {
            path: target.to_path_buf(),
            directory_index: false,
        };
    }

    if !names_directory {
        let suffixed = with_html_suffix(target);
        if suffixed.is_file() {
            return ResolvedTarget::LocalFile {
                path: suffixed,
                directory_index: false,
            };
        }
    }

    let index = target.join(INDEX_FILE);
    if target.is_dir() && index.is_file() {
        return ResolvedTarget::LocalFile {
            path: index,
            directory_index: true,
        };
    }

    ResolvedTarget::Unresolvable
}

fn with_html_suffix(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".html");
    PathBuf::from(raw)
}

/// Drops everything from the first `#` or `?` onwards.
pub fn strip_fragment_and_query(href: &str) -> &str {
    let end = href.find(['#', '?']).unwrap_or(href.len());
    &href[..end]
}

/// True for protocol-relative links and absolute URLs with a network host.
pub fn is_network_url(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    Url::parse(href)
        .map(|u| u.scheme() != "file" && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Lexically collapses `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "<html></html>").unwrap();
        }
        dir
    }

    fn resolver(dir: &TempDir) -> Resolver {
        Resolver::new(dir.path()).with_base_url(Some("https://example.com".to_string()))
    }

    #[test]
    fn test_exact_match_wins_over_html_suffix() {
        let dir = site(&["foo", "foo.html", "index.html"]);
        let home = dir.path().join("index.html");

        let target = resolver(&dir).resolve(&home, "/foo");
        assert_eq!(
            target,
            ResolvedTarget::LocalFile {
                path: dir.path().join("foo"),
                directory_index: false
            }
        );
    }

    #[test]
    fn test_html_suffix_wins_over_directory_index() {
        let dir = site(&["blog.html", "blog/index.html", "index.html"]);
        let home = dir.path().join("index.html");

        let target = resolver(&dir).resolve(&home, "/blog");
        assert_eq!(target.local_path(), Some(&dir.path().join("blog.html")));
    }

    #[test]
    fn test_directory_index_is_tagged() {
        let dir = site(&["blog/index.html", "index.html"]);
        let home = dir.path().join("index.html");

        for href in ["/blog", "/blog/"] {
            let target = resolver(&dir).resolve(&home, href);
            assert_eq!(
                target,
                ResolvedTarget::LocalFile {
                    path: dir.path().join("blog/index.html"),
                    directory_index: true
                },
                "href {}",
                href
            );
        }
    }

    #[test]
    fn test_relative_link_uses_source_directory() {
        let dir = site(&["blog/post/index.html", "blog/post/sibling.html", "sibling.html"]);
        let source = dir.path().join("blog/post/index.html");

        let target = resolver(&dir).resolve(&source, "sibling");
        assert_eq!(
            target.local_path(),
            Some(&dir.path().join("blog/post/sibling.html"))
        );
    }

    #[test]
    fn test_parent_segments_are_collapsed() {
        let dir = site(&["blog/post.html", "about.html"]);
        let source = dir.path().join("blog/post.html");

        let target = resolver(&dir).resolve(&source, "../about");
        assert_eq!(target.local_path(), Some(&dir.path().join("about.html")));
    }

    #[test]
    fn test_escaping_the_root_is_unresolvable() {
        let dir = site(&["index.html"]);
        let home = dir.path().join("index.html");

        assert!(resolver(&dir).resolve(&home, "../../../etc/hosts").is_unresolvable());
    }

    #[test]
    fn test_fragment_and_query_are_ignored() {
        let dir = site(&["about.html", "index.html"]);
        let home = dir.path().join("index.html");

        for href in ["/about#team", "/about?ref=nav", "/about?ref=nav#team"] {
            let target = resolver(&dir).resolve(&home, href);
            assert_eq!(target.local_path(), Some(&dir.path().join("about.html")));
        }
    }

    #[test]
    fn test_own_domain_is_internal() {
        let dir = site(&["blog/x.html", "index.html"]);
        let home = dir.path().join("index.html");
        let r = resolver(&dir);

        assert_eq!(
            r.resolve(&home, "https://example.com/blog/x").local_path(),
            Some(&dir.path().join("blog/x.html"))
        );
        assert_eq!(
            r.resolve(&home, "https://example.com").local_path(),
            Some(&dir.path().join("index.html"))
        );
    }

    #[test]
    fn test_foreign_domain_is_external() {
        let dir = site(&["index.html"]);
        let home = dir.path().join("index.html");
        let r = resolver(&dir);

        assert_eq!(
            r.resolve(&home, "https://example.com.evil.org/x"),
            ResolvedTarget::ExternalUrl("https://example.com.evil.org/x".to_string())
        );
        assert_eq!(
            r.resolve(&home, "//cdn.example.net/lib.js"),
            ResolvedTarget::ExternalUrl("//cdn.example.net/lib.js".to_string())
        );
    }

    #[test]
    fn test_missing_target_is_unresolvable() {
        let dir = site(&["index.html"]);
        let home = dir.path().join("index.html");

        assert!(resolver(&dir).resolve(&home, "/missing").is_unresolvable());
    }

    #[test]
    fn test_trailing_slash_on_base_url_is_ignored() {
        let dir = site(&["index.html"]);
        let r = Resolver::new(dir.path()).with_base_url(Some("https://example.com/".to_string()));

        assert_eq!(r.site_path("https://example.com/a/b?x=1"), Some("/a/b".to_string()));
        assert_eq!(r.site_path("https://example.com/"), Some("/".to_string()));
        assert_eq!(r.site_path("https://other.com/"), None);
    }

    #[test]
    fn test_is_network_url() {
        assert!(is_network_url("https://example.com"));
        assert!(is_network_url("http://example.com/a"));
        assert!(is_network_url("//example.com/a"));
        assert!(!is_network_url("/local"));
        assert!(!is_network_url("local.html"));
        assert!(!is_network_url("mailto:someone@example.com"));
        assert!(!is_network_url("javascript:void(0)"));
    }

    #[test]
    fn test_strip_fragment_and_query() {
        assert_eq!(strip_fragment_and_query("/a?b=1#c"), "/a");
        assert_eq!(strip_fragment_and_query("/a#c?b"), "/a");
        assert_eq!(strip_fragment_and_query("/a"), "/a");
        assert_eq!(strip_fragment_and_query("#top"), "");
    }
}
