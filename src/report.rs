// src/report.rs
// =============================================================================
// Turns a finished check into the text a user reads.
//
// Layout:
//
//   6 favorites total.
//   3 favorites are accessible.
//   1 favorites are redirected.
//   2 are not correctly returned by the remote server.
//
//   1 favorites are HTTP 404:
//     - Old docs <https://example.com/docs>: HTTP 404
//   ...
//
//   3 favorites are accessible:
//     - Blog <https://example.com/blog>: HTTP 200, Length: 5120, Last-modified: ...
//
// Broken favorites are grouped by what went wrong, groups in the order their
// first member was recorded.
// =============================================================================

use crate::checker::{CheckResult, ProbeOutcome, ReportEntry};

/// One-line diagnostic for an outcome: status, length, date, redirect target.
pub fn describe_outcome(outcome: &ProbeOutcome) -> String {
    let mut parts = Vec::new();
    match outcome {
        ProbeOutcome::Accessible {
            http_status,
            content_length,
            last_modified,
        } => {
            parts.push(format!("HTTP {}", http_status));
            if let Some(length) = content_length {
                parts.push(format!("Length: {}", length));
            }
            if let Some(date) = last_modified {
                parts.push(format!("Last-modified: {}", date.to_rfc2822()));
            }
        }
        ProbeOutcome::Redirected {
            final_url,
            http_status,
        } => {
            parts.push(format!("HTTP {}", http_status));
            parts.push(format!("Redirects to {}", final_url));
        }
        ProbeOutcome::Failed {
            http_status,
            transport_error,
        } => {
            if let Some(status) = http_status {
                parts.push(format!("HTTP {}", status));
            }
            if let Some(error) = transport_error {
                parts.push(error.to_string());
            }
        }
    }
    parts.join(", ")
}

fn entry_line(entry: &ReportEntry) -> String {
    let title = if entry.bookmark.title.is_empty() {
        "(untitled)"
    } else {
        entry.bookmark.title.as_str()
    };
    format!(
        "  - {} <{}>: {}",
        title,
        entry.bookmark.url,
        describe_outcome(&entry.outcome)
    )
}

/// Groups broken entries by label, keeping first-seen order.
pub fn group_broken(entries: &[ReportEntry]) -> Vec<(String, Vec<&ReportEntry>)> {
    let mut groups: Vec<(String, Vec<&ReportEntry>)> = Vec::new();
    for entry in entries {
        let label = entry.outcome.label();
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, members)) => members.push(entry),
            None => groups.push((label, vec![entry])),
        }
    }
    groups
}

pub fn render_summary(result: &CheckResult) -> String {
    let report = &result.report;
    let mut lines = Vec::new();

    if result.is_partial() {
        lines.push(format!(
            "Check was cancelled: only {} of {} favorites were checked.",
            report.checked(),
            report.total
        ));
    }
    lines.push(format!("{} favorites total.", report.total));
    lines.push(format!("{} favorites are accessible.", report.accessible_count));
    lines.push(format!("{} favorites are redirected.", report.redirected_count));
    lines.push(format!(
        "{} are not correctly returned by the remote server.",
        report.broken_count
    ));

    for (label, members) in group_broken(&report.broken_details) {
        push_section(
            &mut lines,
            format!("{} favorites are {}:", members.len(), label),
            members,
        );
    }
    if !report.redirected_details.is_empty() {
        push_section(
            &mut lines,
            format!("{} favorites are redirected:", report.redirected_count),
            &report.redirected_details,
        );
    }
    if !report.accessible_details.is_empty() {
        push_section(
            &mut lines,
            format!("{} favorites are accessible:", report.accessible_count),
            &report.accessible_details,
        );
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// Blank line, heading, then one line per entry
fn push_section<'a>(
    lines: &mut Vec<String>,
    heading: String,
    entries: impl IntoIterator<Item = &'a ReportEntry>,
) {
    lines.push(String::new());
    lines.push(heading);
    lines.extend(entries.into_iter().map(entry_line));
}
