use crate::UrlError;
use url::Url;

/// Validates an analysis target
///
/// A target must be an absolute http or https URL with a non-empty host.
/// Callers are expected to validate before submitting, but the engine runs
/// this check again so a malformed value fails explicitly.
///
/// # Examples
///
/// ```
/// use page_insight::url::validate_target;
///
/// assert!(validate_target("https://example.com/page").is_ok());
/// assert!(validate_target("example.com/page").is_err());
/// assert!(validate_target("ftp://example.com/").is_err());
/// ```
pub fn validate_target(target: &str) -> Result<Url, UrlError> {
    let url = Url::parse(target.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}
