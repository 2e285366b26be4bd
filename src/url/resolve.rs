use url::Url;

/// Resolves an href against the page URL
///
/// Uses standard relative reference resolution, so absolute, scheme-relative,
/// path-relative, query-only and fragment-only references are all accepted.
///
/// Returns None if the href is empty (after trimming) or cannot be parsed as
/// a URL reference. Such anchors take no part in link counting.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_insight::url::resolve_href;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let link = resolve_href("../about", &base).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/about");
///
/// assert!(resolve_href("   ", &base).is_none());
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    match base.join(href) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            tracing::debug!("Skipping unparseable href {:?}: {}", href, e);
            None
        }
    }
}
