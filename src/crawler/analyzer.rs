//! Page analyzer
//!
//! This module turns a fetched page body into an [`AnalysisResult`]:
//! - Document version detection (textual doctype check on the raw body)
//! - Page title
//! - Heading counts
//! - Login form detection
//! - Link resolution, internal/external classification and liveness probing
//!
//! All structural passes run against the same parsed tree and are independent
//! of each other. The only network activity is the liveness probing, which
//! runs after the tree has been dropped.

use crate::config::EngineConfig;
use crate::crawler::fetcher::probe_link;
use crate::url::{classify_link, extract_host, resolve_href, LinkScope};
use crate::AnalysisError;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Doctype marker identifying an HTML5 document (compared case-insensitively)
const HTML5_DOCTYPE: &str = "<!doctype html>";

/// Coarse classification of the markup standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentVersion {
    #[serde(rename = "HTML5")]
    Html5,
    #[serde(rename = "Older HTML")]
    Older,
}

impl DocumentVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html5 => "HTML5",
            Self::Older => "Older HTML",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "HTML5" => Some(Self::Html5),
            "Older HTML" => Some(Self::Older),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of heading elements per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCounts {
    /// Count for a heading level (1..=6); other levels are always 0
    pub fn get(&self, level: u8) -> usize {
        match level {
            1 => self.h1,
            2 => self.h2,
            3 => self.h3,
            4 => self.h4,
            5 => self.h5,
            6 => self.h6,
            _ => 0,
        }
    }

    fn slot_mut(&mut self, level: u8) -> Option<&mut usize> {
        match level {
            1 => Some(&mut self.h1),
            2 => Some(&mut self.h2),
            3 => Some(&mut self.h3),
            4 => Some(&mut self.h4),
            5 => Some(&mut self.h5),
            6 => Some(&mut self.h6),
            _ => None,
        }
    }

    /// Renders the h1-h3 summary, e.g. `H1: 1, H2: 2, H3: 1`
    pub fn summary(&self) -> String {
        format!("H1: {}, H2: {}, H3: {}", self.h1, self.h2, self.h3)
    }

    pub fn total(&self) -> usize {
        (1..=6).map(|level| self.get(level)).sum()
    }
}

/// Analysis record produced once per target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub document_version: DocumentVersion,
    pub title: String,
    pub headings: HeadingCounts,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    /// Advisory: depends on the network at probe time
    pub broken_link_count: usize,
    pub has_login_form: bool,
}

/// A resolved anchor found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: Url,
    pub scope: LinkScope,
}

/// Everything the analyzer derives from the markup alone
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub document_version: DocumentVersion,
    pub title: String,
    pub headings: HeadingCounts,
    pub has_login_form: bool,
    /// Resolved links in document order, duplicates included
    pub links: Vec<PageLink>,
}

impl ParsedPage {
    pub fn internal_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.scope.is_internal()).count()
    }

    pub fn external_link_count(&self) -> usize {
        self.links.len() - self.internal_link_count()
    }

    /// Combines the structural passes with the broken link tally
    pub fn into_result(self, broken_link_count: usize) -> AnalysisResult {
        AnalysisResult {
            document_version: self.document_version,
            internal_link_count: self.internal_link_count(),
            external_link_count: self.external_link_count(),
            broken_link_count,
            title: self.title,
            headings: self.headings,
            has_login_form: self.has_login_form,
        }
    }
}

/// Runs every structural extraction pass over a page body
///
/// # Arguments
///
/// * `body` - The raw page body
/// * `base_url` - The target URL, used to resolve and classify links
///
/// # Returns
///
/// * `Ok(ParsedPage)` - All structural fields
/// * `Err(AnalysisError::HtmlParse)` - The body is not markup text
///
/// # Example
///
/// ```
/// use page_insight::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url).unwrap();
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.internal_link_count(), 1);
/// ```
pub fn parse_page(body: &str, base_url: &Url) -> Result<ParsedPage, AnalysisError> {
    // html5ever accepts any text; a NUL byte means we were handed binary content
    if body.contains('\0') {
        return Err(AnalysisError::HtmlParse {
            url: base_url.to_string(),
            message: "body contains NUL bytes and is not markup text".to_string(),
        });
    }

    let document = Html::parse_document(body);
    let base_host = extract_host(base_url).unwrap_or_default();

    Ok(ParsedPage {
        document_version: detect_document_version(body),
        title: extract_title(&document),
        headings: count_headings(&document),
        has_login_form: detect_login_form(&document),
        links: collect_links(&document, base_url, &base_host),
    })
}

/// Analyzes a fetched page body
///
/// Runs [`parse_page`], then probes every resolved link concurrently
/// (bounded by `max_concurrent_probes`, each bounded by `probe_timeout_ms`).
/// Probe failures only feed the broken tally; they never fail the analysis.
pub async fn analyze_body(
    client: &Client,
    body: &str,
    base_url: &Url,
    config: &EngineConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let parsed = parse_page(body, base_url)?;
    Ok(probe_page(client, parsed, base_url, config).await)
}

/// Completes a parsed page by probing its links
///
/// Never fails: unanswered probes are counted as broken.
pub async fn probe_page(
    client: &Client,
    parsed: ParsedPage,
    base_url: &Url,
    config: &EngineConfig,
) -> AnalysisResult {
    let broken = count_broken_links(client, &parsed.links, config).await;

    tracing::debug!(
        "Analyzed {}: {} links ({} internal), {} broken",
        base_url,
        parsed.links.len(),
        parsed.internal_link_count(),
        broken
    );

    parsed.into_result(broken)
}

/// Detects the document version from the raw body text
///
/// This is a substring check, not a structural one: the marker counts
/// wherever it appears.
pub fn detect_document_version(body: &str) -> DocumentVersion {
    if body.to_ascii_lowercase().contains(HTML5_DOCTYPE) {
        DocumentVersion::Html5
    } else {
        DocumentVersion::Older
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extracts the first title in document order, trimmed
fn extract_title(document: &Html) -> String {
    let Some(title_selector) = selector("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Counts heading elements for every level
fn count_headings(document: &Html) -> HeadingCounts {
    let mut counts = HeadingCounts::default();

    for level in 1..=6u8 {
        if let (Some(heading_selector), Some(slot)) =
            (selector(&format!("h{}", level)), counts.slot_mut(level))
        {
            *slot = document.select(&heading_selector).count();
        }
    }

    counts
}

/// Returns true if any form contains a password input
///
/// The `type` value is compared ASCII case-insensitively, the way browsers
/// interpret it.
fn detect_login_form(document: &Html) -> bool {
    let (Some(form_selector), Some(input_selector)) = (selector("form"), selector("input[type]"))
    else {
        return false;
    };

    document
        .select(&form_selector)
        .any(|form| form.select(&input_selector).any(is_password_input))
}

fn is_password_input(input: ElementRef<'_>) -> bool {
    input
        .value()
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("password"))
}

/// Resolves and classifies every anchor with a usable href
///
/// Anchors with an empty href, or one that cannot be resolved, are skipped.
/// Repeated hrefs are kept.
fn collect_links(document: &Html, base_url: &Url, base_host: &str) -> Vec<PageLink> {
    let Some(anchor_selector) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_href(href, base_url))
        .map(|url| {
            let scope = classify_link(&url, base_host);
            PageLink { url, scope }
        })
        .collect()
}

/// Probes all links and returns how many are broken
///
/// Every probe settles on its own timeout, so this always returns a count;
/// a probe that does not answer in time counts as broken.
pub async fn count_broken_links(
    client: &Client,
    links: &[PageLink],
    config: &EngineConfig,
) -> usize {
    if links.is_empty() {
        return 0;
    }

    let timeout = config.probe_timeout();
    let urls: Vec<Url> = links.iter().map(|link| link.url.clone()).collect();

    let results: Vec<_> = stream::iter(urls)
        .map(|url| {
            let client = client.clone();
            async move { probe_link(&client, &url, timeout).await }
        })
        .buffer_unordered(config.max_concurrent_probes.max(1) as usize)
        .collect()
        .await;

    results.iter().filter(|health| health.is_broken()).count()
}
