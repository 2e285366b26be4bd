//! Single-target analysis against mock servers

use crate::test_engine;
use page_insight::{AnalysisError, DocumentVersion, FailureReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Port of a mock server, so the same server can be addressed by another hostname
fn port_of(server: &MockServer) -> u16 {
    server.address().port()
}

#[tokio::test]
async fn test_analyze_full_page() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    let page = format!(
        r#"<!DOCTYPE html>
        <html>
        <head><title>  Welcome  </title></head>
        <body>
            <h1>Main</h1>
            <h2>One</h2><h2>Two</h2>
            <h3>Detail</h3>
            <a href="/about">About</a>
            <a href="/about">About again</a>
            <a href="/missing">Missing</a>
            <a href="http://localhost:{}/partner">Partner</a>
            <a href="">Empty</a>
            <a>No href</a>
            <form action="/login"><input type="text" name="user"><input type="Password" name="pw"></form>
        </body>
        </html>"#,
        port_of(&other)
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/partner"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&other)
        .await;

    let engine = test_engine(1);
    let result = engine
        .analyze(&format!("{}/", site.uri()))
        .await
        .expect("Analysis should succeed");

    assert_eq!(result.document_version, DocumentVersion::Html5);
    assert_eq!(result.title, "Welcome");
    assert_eq!(result.headings.h1, 1);
    assert_eq!(result.headings.h2, 2);
    assert_eq!(result.headings.h3, 1);
    assert_eq!(result.internal_link_count, 3);
    assert_eq!(result.external_link_count, 1);
    assert_eq!(result.broken_link_count, 1);
    assert!(result.has_login_form);
}

#[tokio::test]
async fn test_analyze_page_without_links() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Nothing to see</p></body></html>"),
        )
        .mount(&site)
        .await;

    let result = test_engine(1)
        .analyze(&format!("{}/plain", site.uri()))
        .await
        .unwrap();

    assert_eq!(result.document_version, DocumentVersion::Older);
    assert_eq!(result.title, "");
    assert_eq!(result.headings.total(), 0);
    assert_eq!(result.internal_link_count, 0);
    assert_eq!(result.external_link_count, 0);
    assert_eq!(result.broken_link_count, 0);
    assert!(!result.has_login_form);
}

#[tokio::test]
async fn test_password_outside_form_is_not_login() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<body><input type="password"><form><input type="email"></form></body>"#),
        )
        .mount(&site)
        .await;

    let result = test_engine(1).analyze(&site.uri()).await.unwrap();
    assert!(!result.has_login_form);
}

#[tokio::test]
async fn test_analyze_error_status_is_fetch_error() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let err = test_engine(1).analyze(&site.uri()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::HttpStatus { status: 500, .. }));
    assert_eq!(err.reason(), FailureReason::FetchError);
}

#[tokio::test]
async fn test_analyze_binary_body_is_parse_error() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x00\x01PNG\x00".to_vec()))
        .mount(&site)
        .await;

    let err = test_engine(1).analyze(&site.uri()).await.unwrap_err();
    assert_eq!(err.reason(), FailureReason::ParseError);
}

#[tokio::test]
async fn test_analyze_rejects_malformed_target() {
    let engine = test_engine(1);

    for target in ["", "example.com/page", "ftp://example.com/", "http://"] {
        let err = engine.analyze(target).await.unwrap_err();
        assert!(
            matches!(err, AnalysisError::InvalidTarget { .. }),
            "{:?} should be rejected",
            target
        );
    }
}
