//! Plain-text listing of stored targets

use crate::storage::TargetRecord;

/// Formats one record as a single line
///
/// Done records show their analysis, failed records their reason.
pub fn format_record(record: &TargetRecord) -> String {
    let mut line = format!("[{}] {} {}", record.id, record.status, record.url);

    if let Some(result) = &record.result {
        line.push_str(&format!(
            " | {} | \"{}\" | {} | links: {} internal, {} external, {} broken | login form: {}",
            result.document_version,
            result.title,
            result.headings.summary(),
            result.internal_link_count,
            result.external_link_count,
            result.broken_link_count,
            if result.has_login_form { "yes" } else { "no" },
        ));
    } else if let Some(reason) = record.failure_reason {
        line.push_str(&format!(" | {}", reason));
        if let Some(message) = &record.error_message {
            line.push_str(&format!(": {}", message));
        }
    }

    line
}

/// Prints every record to stdout, one per line
pub fn print_targets(records: &[TargetRecord]) {
    if records.is_empty() {
        println!("No targets stored");
        return;
    }

    for record in records {
        println!("{}", format_record(record));
    }
    println!("\n{} target(s)", records.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{AnalysisResult, DocumentVersion, HeadingCounts};
    use crate::state::CrawlStatus;
    use crate::FailureReason;

    fn record(status: CrawlStatus) -> TargetRecord {
        TargetRecord {
            id: 7,
            url: "https://example.com/".to_string(),
            status,
            result: None,
            failure_reason: None,
            error_message: None,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_format_queued_record() {
        assert_eq!(
            format_record(&record(CrawlStatus::Queued)),
            "[7] queued https://example.com/"
        );
    }

    #[test]
    fn test_format_done_record() {
        let mut done = record(CrawlStatus::Done);
        done.result = Some(AnalysisResult {
            document_version: DocumentVersion::Html5,
            title: "Home".to_string(),
            headings: HeadingCounts {
                h1: 1,
                h2: 2,
                ..Default::default()
            },
            internal_link_count: 4,
            external_link_count: 1,
            broken_link_count: 0,
            has_login_form: true,
        });

        let line = format_record(&done);
        assert!(line.contains("HTML5"));
        assert!(line.contains("\"Home\""));
        assert!(line.contains("H1: 1, H2: 2, H3: 0"));
        assert!(line.contains("4 internal, 1 external, 0 broken"));
        assert!(line.contains("login form: yes"));
    }

    #[test]
    fn test_format_failed_record() {
        let mut failed = record(CrawlStatus::Error);
        failed.failure_reason = Some(FailureReason::FetchError);
        failed.error_message = Some("HTTP status 404".to_string());

        assert_eq!(
            format_record(&failed),
            "[7] error https://example.com/ | fetch_error: HTTP status 404"
        );
    }
}
