//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the engine:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch the target page body
//! - HEAD requests to probe link liveness
//! - Error classification
//!
//! Every request carries its own timeout. Nothing is retried; a caller that
//! wants a retry issues a fresh analysis.

use crate::config::UserAgentConfig;
use crate::AnalysisError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for fetches and probes
const MAX_REDIRECTS: usize = 10;

/// Upper bound on the TCP/TLS connect phase of any request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkHealth {
    /// The link answered with a status below 400
    Reachable { status_code: u16 },

    /// The link answered with a status of 400 or above
    Broken { status_code: u16 },

    /// The probe could not complete (transport error, timeout, unsupported scheme)
    Unreachable { error: String },
}

impl LinkHealth {
    /// Returns true if the link counts towards the broken tally
    pub fn is_broken(&self) -> bool {
        !matches!(self, Self::Reachable { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Standard redirects are followed. Per-request timeouts are applied by
/// [`fetch_page`] and [`probe_link`], not by the client.
///
/// # Example
///
/// ```no_run
/// use page_insight::config::UserAgentConfig;
/// use page_insight::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageInsight".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the body of a target page
///
/// Issues exactly one GET request. Transport errors, timeouts, non-success
/// statuses and body read failures all abandon the analysis.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The validated target URL
/// * `timeout` - Timeout covering the whole request including the body
///
/// # Returns
///
/// * `Ok(String)` - The page body
/// * `Err(AnalysisError)` - The page could not be retrieved
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<String, AnalysisError> {
    let response = client
        .get(url.as_str())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AnalysisError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| classify_error(url, e))?;
    tracing::debug!("Fetched {} ({} bytes)", url, body.len());

    Ok(body)
}

/// Probes whether a link is alive using a HEAD request
///
/// Only the status line and headers are read. Links without an HTTP(S)
/// scheme cannot be probed and are reported unreachable without any
/// network I/O.
pub async fn probe_link(client: &Client, link: &Url, timeout: Duration) -> LinkHealth {
    if link.scheme() != "http" && link.scheme() != "https" {
        return LinkHealth::Unreachable {
            error: format!("unsupported scheme: {}", link.scheme()),
        };
    }

    match client.head(link.as_str()).timeout(timeout).send().await {
        Ok(response) => {
            let status_code = response.status().as_u16();
            if status_code >= 400 {
                tracing::debug!("Broken link {} (HTTP {})", link, status_code);
                LinkHealth::Broken { status_code }
            } else {
                LinkHealth::Reachable { status_code }
            }
        }
        Err(e) => {
            tracing::debug!("Probe failed for {}: {}", link, e);
            LinkHealth::Unreachable {
                error: if e.is_timeout() {
                    "Request timeout".to_string()
                } else {
                    e.to_string()
                },
            }
        }
    }
}

/// Maps a transport error onto an analysis error
fn classify_error(url: &Url, error: reqwest::Error) -> AnalysisError {
    if error.is_timeout() {
        AnalysisError::Timeout {
            url: url.to_string(),
        }
    } else {
        AnalysisError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
