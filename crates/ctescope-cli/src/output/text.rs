//! Human-readable extraction output.

use ctescope_core::{ExtractResult, ExtractStatus, Severity, Span};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Longest highlight preview printed before truncating.
const PREVIEW_CHARS: usize = 60;

/// Convert a byte offset into a 1-based (line, col) pair.
pub fn offset_to_line_col(sql: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(sql.len());
    let mut line = 1usize;
    let mut col = 1usize;

    for (i, ch) in sql.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Format the extraction result as human-readable text with optional colors.
pub fn format_text(
    result: &ExtractResult,
    source_name: &str,
    sql: &str,
    quiet: bool,
    colored: bool,
) -> String {
    let mut out = String::new();

    write_header(&mut out, source_name, result, colored);

    if result.status == ExtractStatus::Ready {
        write_target(&mut out, result, sql);
        write_sql(&mut out, result, colored);
        write_highlights(&mut out, result, sql, colored);
    }

    if !quiet {
        write_issues(&mut out, result, sql, colored);
    }

    out
}

fn write_header(out: &mut String, source_name: &str, result: &ExtractResult, colored: bool) {
    let title = "CteScope Extraction";
    let line = "═".repeat(50);

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }

    let status = match result.status {
        ExtractStatus::Ready => "ready",
        ExtractStatus::NotApplicable => "not applicable",
        ExtractStatus::Error => "error",
    };
    writeln!(out, "Source: {source_name}").unwrap();
    if colored {
        let status = match result.status {
            ExtractStatus::Ready => status.green().to_string(),
            ExtractStatus::NotApplicable => status.yellow().to_string(),
            ExtractStatus::Error => status.red().to_string(),
        };
        writeln!(out, "Status: {status}").unwrap();
    } else {
        writeln!(out, "Status: {status}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_target(out: &mut String, result: &ExtractResult, sql: &str) {
    if let Some(target) = &result.target {
        let what = match &target.cte_name {
            Some(name) => format!("CTE {name}"),
            None => "query".to_string(),
        };
        writeln!(out, "Target: {what} at {}", describe_span(sql, target.span)).unwrap();
    }

    let required = if result.required_ctes.is_empty() {
        "(none)".to_string()
    } else {
        result.required_ctes.join(", ")
    };
    writeln!(
        out,
        "Required CTEs: {required} (of {} in scope)",
        result.ctes.len()
    )
    .unwrap();
    writeln!(out).unwrap();
}

fn write_sql(out: &mut String, result: &ExtractResult, colored: bool) {
    let Some(text) = &result.sql else {
        return;
    };

    if colored {
        writeln!(out, "{}", "SQL:".bold()).unwrap();
    } else {
        writeln!(out, "SQL:").unwrap();
    }
    for line in text.lines() {
        writeln!(out, "  {line}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_highlights(out: &mut String, result: &ExtractResult, sql: &str, colored: bool) {
    if result.highlight_spans.is_empty() {
        return;
    }

    let header = format!("Highlights ({}):", result.highlight_spans.len());
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }

    for span in &result.highlight_spans {
        let location = describe_span(sql, *span);
        let preview = preview(sql, *span);
        if colored {
            writeln!(out, "  {:<14} {}", location.cyan(), preview.dimmed()).unwrap();
        } else {
            writeln!(out, "  {location:<14} {preview}").unwrap();
        }
    }
    writeln!(out).unwrap();
}

fn write_issues(out: &mut String, result: &ExtractResult, sql: &str, colored: bool) {
    if result.issues.is_empty() {
        return;
    }

    let header = format!("Issues ({}):", result.issues.len());
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }

    for issue in &result.issues {
        let severity_str = match issue.severity {
            Severity::Error => {
                if colored {
                    "ERROR".red().to_string()
                } else {
                    "ERROR".to_string()
                }
            }
            Severity::Warning => {
                if colored {
                    "WARN".yellow().to_string()
                } else {
                    "WARN".to_string()
                }
            }
            Severity::Info => {
                if colored {
                    "INFO".blue().to_string()
                } else {
                    "INFO".to_string()
                }
            }
        };

        let location = issue
            .span
            .map(|span| {
                let (line, col) = offset_to_line_col(sql, span.start);
                format!(" {line}:{col}")
            })
            .unwrap_or_default();

        writeln!(
            out,
            "  [{severity_str}]{location} {}: {}",
            issue.code, issue.message
        )
        .unwrap();
    }
}

fn describe_span(sql: &str, span: Span) -> String {
    let (start_line, start_col) = offset_to_line_col(sql, span.start);
    let (end_line, end_col) = offset_to_line_col(sql, span.end);
    format!("{start_line}:{start_col}-{end_line}:{end_col}")
}

/// First line of the highlighted text, shortened for display.
fn preview(sql: &str, span: Span) -> String {
    let text = sql.get(span.start..span.end).unwrap_or_default();
    let first_line = text.trim().lines().next().unwrap_or_default();
    let mut shortened: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || text.trim().lines().nth(1).is_some() {
        shortened.push_str(" …");
    }
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctescope_core::{extract_cte_query, BuildMode, ExtractRequest};

    const SQL: &str = "WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b";

    #[test]
    fn test_offset_to_line_col() {
        assert_eq!(offset_to_line_col(SQL, 0), (1, 1));
        assert_eq!(offset_to_line_col(SQL, 22), (2, 1));
        assert_eq!(offset_to_line_col(SQL, 10_000), (3, 16));
    }

    #[test]
    fn test_format_text_ready() {
        let result = extract_cte_query(&ExtractRequest::new(SQL, 30, BuildMode::FullCte));

        let output = format_text(&result, "query.sql", SQL, false, false);
        assert!(output.contains("CteScope Extraction"));
        assert!(output.contains("Status: ready"));
        assert!(output.contains("Target: CTE b at 2:1-2:23"));
        assert!(output.contains("Required CTEs: a (of 2 in scope)"));
        assert!(output.contains("  WITH a AS (SELECT 1),"));
        assert!(output.contains("Highlights (3):"));
    }

    #[test]
    fn test_format_text_not_applicable_quiet() {
        let result = extract_cte_query(&ExtractRequest::new("SELECT 1", 3, BuildMode::FullCte));

        let verbose = format_text(&result, "<stdin>", "SELECT 1", false, false);
        let quiet = format_text(&result, "<stdin>", "SELECT 1", true, false);
        assert!(verbose.contains("Status: not applicable"));
        assert!(verbose.contains("NO_SCOPE"));
        assert!(!quiet.contains("NO_SCOPE"));
        assert!(!verbose.contains("SQL:"));
    }
}
