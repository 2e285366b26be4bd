use url::Url;

/// Extracts the hostname from a URL
///
/// The port is never part of the result. Hosts are lowercased; IPv6 hosts
/// keep their brackets.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_insight::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:user@example.com").unwrap();
/// assert_eq!(extract_host(&url), None);
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
