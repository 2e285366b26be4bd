//! URL handling module for Page-Insight
//!
//! This module provides target validation, host extraction, href resolution
//! and link scope classification.

mod domain;
mod resolve;
mod target;

// Re-export main functions
pub use domain::extract_host;
pub use resolve::resolve_href;
pub use target::validate_target;

use url::Url;

/// Where a link points relative to the page it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same hostname as the page
    Internal,
    /// Any other hostname, including links without a host
    External,
}

impl LinkScope {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Classifies a resolved link against the page's hostname
///
/// Only the hostname is compared: scheme and port are ignored, so
/// `http://example.com:8080/a` is internal to `https://example.com/`.
/// Links whose scheme carries no host (`mailto:`, `javascript:`) are external.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_insight::url::{classify_link, LinkScope};
///
/// let link = Url::parse("http://EXAMPLE.com:8080/about").unwrap();
/// assert_eq!(classify_link(&link, "example.com"), LinkScope::Internal);
///
/// let link = Url::parse("https://other.com/").unwrap();
/// assert_eq!(classify_link(&link, "example.com"), LinkScope::External);
/// ```
pub fn classify_link(link: &Url, base_host: &str) -> LinkScope {
    match extract_host(link) {
        Some(host) if host.eq_ignore_ascii_case(base_host) => LinkScope::Internal,
        _ => LinkScope::External,
    }
}
