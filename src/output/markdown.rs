//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of analysis
//! results, including statistics, failure reports, and per-target results.

use crate::output::{InsightSummary, OutputResult};
use crate::FailureReason;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from analysis statistics
///
/// # Arguments
///
/// * `summary` - The summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &InsightSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Escapes characters that would break a markdown table cell
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Formats a summary as markdown
///
/// # Arguments
///
/// * `summary` - The summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &InsightSummary) -> String {
    let mut md = String::new();

    md.push_str("# Page-Insight Analysis Summary\n\n");

    md.push_str("## Report Information\n\n");
    md.push_str(&format!("- **Generated**: {}\n", summary.generated_at));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Targets**: {}\n", summary.total_targets));
    md.push_str(&format!(
        "- **Internal Links**: {}\n",
        summary.total_internal_links
    ));
    md.push_str(&format!(
        "- **External Links**: {}\n",
        summary.total_external_links
    ));
    md.push_str(&format!(
        "- **Broken Links**: {}\n",
        summary.total_broken_links
    ));
    md.push_str(&format!(
        "- **Pages With Login Form**: {}\n",
        summary.login_form_pages
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    md.push_str("## Status Breakdown\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Queued | {} |\n", summary.targets_queued));
    md.push_str(&format!("| Running | {} |\n", summary.targets_running));
    md.push_str(&format!("| Done | {} |\n", summary.targets_done));
    md.push_str(&format!("| Error | {} |\n\n", summary.targets_error));

    if !summary.failures_by_reason.is_empty() {
        md.push_str("## Failure Summary\n\n");
        md.push_str("| Reason | Count |\n");
        md.push_str("|--------|-------|\n");

        for reason in [
            FailureReason::FetchError,
            FailureReason::ParseError,
            FailureReason::Cancelled,
        ] {
            if let Some(count) = summary.failures_by_reason.get(&reason) {
                md.push_str(&format!("| {} | {} |\n", reason, count));
            }
        }
        md.push('\n');
    }

    let analyzed: Vec<_> = summary
        .records
        .iter()
        .filter_map(|r| r.result.as_ref().map(|result| (r, result)))
        .collect();

    if !analyzed.is_empty() {
        md.push_str("## Analyzed Pages\n\n");
        md.push_str("| ID | URL | Version | Title | Headings | Internal | External | Broken | Login Form |\n");
        md.push_str("|----|-----|---------|-------|----------|----------|----------|--------|------------|\n");

        for (record, result) in analyzed {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                record.id,
                table_cell(&record.url),
                result.document_version,
                table_cell(&result.title),
                result.headings.summary(),
                result.internal_link_count,
                result.external_link_count,
                result.broken_link_count,
                if result.has_login_form { "yes" } else { "no" },
            ));
        }
        md.push('\n');
    }

    let failed: Vec<_> = summary
        .records
        .iter()
        .filter(|r| r.failure_reason.is_some())
        .collect();

    if !failed.is_empty() {
        md.push_str("## Failed Targets\n\n");
        md.push_str("| ID | URL | Reason | Message |\n");
        md.push_str("|----|-----|--------|---------|\n");

        for record in failed {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                record.id,
                table_cell(&record.url),
                record
                    .failure_reason
                    .map(|r| r.as_str())
                    .unwrap_or_default(),
                table_cell(record.error_message.as_deref().unwrap_or("")),
            ));
        }
        md.push('\n');
    }

    md
}
