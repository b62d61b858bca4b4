//! Request/response entry point tying the tree, analyzer and builder together.

#[cfg(feature = "tracing")]
use tracing::{debug, info_span};

use crate::analyzer::{analyze_scope_with_options, AnalysisOptions};
use crate::builder::{inner_body, QueryAssembler};
use crate::error::{ParseError, ParseErrorKind};
use crate::tree::{line_col_to_offset, SqlTree, SyntaxTree};
use crate::types::{
    issue_codes, BuildMode, CteSummary, ExtractOptions, ExtractRequest, ExtractResult,
    ExtractStatus, Issue, Span, TargetInfo,
};

/// Maximum SQL input size (10MB) to prevent memory exhaustion.
const MAX_SQL_LENGTH: usize = 10 * 1024 * 1024;

/// Extracts a runnable query for the cursor position in `request`.
///
/// Never panics and never fails outright: invalid requests and tokenizer
/// errors come back as `error` results, and a cursor outside any CTE scope as
/// a `notApplicable` result.
#[must_use]
pub fn extract_cte_query(request: &ExtractRequest) -> ExtractResult {
    #[cfg(feature = "tracing")]
    let _span = info_span!(
        "extract_cte_query",
        sql_len = request.sql.len(),
        cursor = request.cursor_offset,
        mode = ?request.mode
    )
    .entered();

    if let Err(err) = validate_request(request) {
        return ExtractResult::from_error(issue_codes::INVALID_REQUEST, err.message);
    }

    let tree = match SqlTree::parse(&request.sql, request.dialect) {
        Ok(tree) => tree,
        Err(err) => return parse_error_result(&request.sql, &err),
    };

    let options = request.options.unwrap_or_default();
    extract_from_tree(&tree, request.cursor_offset, request.mode, &options)
}

/// Runs analysis and assembly over an already-built tree.
///
/// When the target is a CTE it is emitted after its dependencies.
/// `DependenciesWithTargetInner` needs a CTE target and falls back to
/// `FullCte` otherwise.
pub fn extract_from_tree<T: SyntaxTree>(
    tree: &T,
    caret: usize,
    mode: BuildMode,
    options: &ExtractOptions,
) -> ExtractResult {
    let analysis_options = AnalysisOptions {
        ordering: options.ordering,
    };
    let analysis = match analyze_scope_with_options(tree, caret, &analysis_options) {
        Ok(analysis) => analysis,
        Err(reason) => {
            #[cfg(feature = "tracing")]
            debug!(code = reason.code(), "nothing to extract");
            return ExtractResult::not_applicable(reason.code(), reason.to_string());
        }
    };

    let mut issues = analysis.issues.clone();
    let target_cte = analysis.target_cte().cloned();

    let mut ctes: Vec<_> = analysis
        .required_ctes
        .iter()
        .filter(|entry| entry.definition != analysis.target_query)
        .cloned()
        .collect();
    if let Some(entry) = &target_cte {
        ctes.push(entry.clone());
    }

    let mode = if mode == BuildMode::DependenciesWithTargetInner && target_cte.is_none() {
        issues.push(
            Issue::warning(
                issue_codes::MODE_FALLBACK,
                "cursor is not inside a CTE definition; using fullCte",
            )
            .with_span(tree.range(analysis.target_query)),
        );
        BuildMode::FullCte
    } else {
        mode
    };

    let built =
        QueryAssembler::new(tree, mode).build(&ctes, analysis.target_query, &analysis.all_ctes);

    let summaries = analysis
        .all_ctes
        .iter()
        .map(|entry| CteSummary {
            name: entry.name.clone(),
            index: entry.index,
            span: tree.range(entry.definition),
            body_span: inner_body(tree, entry.definition).map(|body| body.span),
        })
        .collect();

    ExtractResult {
        status: ExtractStatus::Ready,
        sql: Some(built.sql),
        highlight_spans: built.highlight_spans,
        target: Some(TargetInfo {
            span: tree.range(analysis.target_query),
            cte_name: target_cte.map(|entry| entry.name),
        }),
        ctes: summaries,
        required_ctes: analysis
            .required_ctes
            .iter()
            .map(|entry| entry.name.clone())
            .collect(),
        issues,
    }
}

/// Converts a 1-based editor line/column into a cursor offset.
pub fn cursor_offset_from_line_col(sql: &str, line: usize, column: usize) -> Option<usize> {
    line_col_to_offset(sql, line, column)
}

fn validate_request(request: &ExtractRequest) -> Result<(), ParseError> {
    let sql = request.sql.as_str();
    let sql_len = sql.len();

    if sql_len > MAX_SQL_LENGTH {
        return Err(ParseError::new(format!(
            "SQL exceeds maximum length of {MAX_SQL_LENGTH} bytes ({sql_len} bytes provided)"
        ))
        .with_kind(ParseErrorKind::InputTooLarge));
    }
    if request.cursor_offset > sql_len {
        return Err(ParseError::new(format!(
            "cursor_offset ({}) exceeds SQL length ({sql_len})",
            request.cursor_offset
        )));
    }
    if !sql.is_char_boundary(request.cursor_offset) {
        return Err(ParseError::new(format!(
            "cursor_offset ({}) does not land on a valid UTF-8 character boundary",
            request.cursor_offset
        )));
    }
    Ok(())
}

fn parse_error_result(sql: &str, err: &ParseError) -> ExtractResult {
    let mut issue = Issue::error(issue_codes::PARSE_ERROR, err.to_string());
    if let Some(offset) = err
        .position
        .and_then(|position| line_col_to_offset(sql, position.line, position.column))
    {
        issue = issue.with_span(Span::empty(offset));
    }

    ExtractResult {
        status: ExtractStatus::Error,
        issues: vec![issue],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CteOrdering, Dialect, Severity};

    const DOC: &str = "WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b;";

    #[test]
    fn test_cursor_in_cte_includes_target_last() {
        let request = ExtractRequest::new(DOC, DOC.find("* FROM a").unwrap(), BuildMode::FullCte);
        let result = extract_cte_query(&request);

        assert!(result.is_ready());
        assert_eq!(
            result.sql.as_deref(),
            Some("WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b;")
        );
        assert_eq!(result.required_ctes, vec!["a"]);
        assert_eq!(result.target.unwrap().cte_name.as_deref(), Some("b"));
        assert_eq!(result.ctes.len(), 2);
        assert_eq!(
            result.ctes[0].body_span,
            Some(Span::new(DOC.find("SELECT 1").unwrap(), DOC.find("), b").unwrap()))
        );
    }

    #[test]
    fn test_not_applicable_is_informational() {
        let request = ExtractRequest::new("SELECT 1", 3, BuildMode::FullCte);
        let result = extract_cte_query(&request);

        assert_eq!(result.status, ExtractStatus::NotApplicable);
        assert!(!result.has_errors());
        assert_eq!(result.issues[0].code, issue_codes::NO_SCOPE);
        assert_eq!(result.issues[0].severity, Severity::Info);
        assert!(result.sql.is_none());
    }

    #[test]
    fn test_cursor_validation() {
        let request = ExtractRequest::new("SELECT 1", 42, BuildMode::FullCte);
        let result = extract_cte_query(&request);
        assert_eq!(result.status, ExtractStatus::Error);
        assert_eq!(result.issues[0].code, issue_codes::INVALID_REQUEST);

        let request = ExtractRequest::new("SELECT 'é'", 9, BuildMode::FullCte);
        let result = extract_cte_query(&request);
        assert!(result.issues[0].message.contains("UTF-8"));
    }

    #[test]
    fn test_oversized_input() {
        let request = ExtractRequest::new(" ".repeat(MAX_SQL_LENGTH + 1), 0, BuildMode::FullCte);
        let result = extract_cte_query(&request);
        assert_eq!(result.status, ExtractStatus::Error);
        assert!(result.issues[0].message.contains("maximum length"));
    }

    #[test]
    fn test_parse_error_carries_span() {
        let sql = "WITH a AS (SELECT 'open) SELECT 1";
        let request = ExtractRequest::new(sql, 0, BuildMode::FullCte);
        let result = extract_cte_query(&request);

        assert_eq!(result.status, ExtractStatus::Error);
        assert_eq!(result.issues[0].code, issue_codes::PARSE_ERROR);
        assert!(result.issues[0].span.is_some());
    }

    #[test]
    fn test_target_inner_mode_falls_back_outside_cte() {
        let request =
            ExtractRequest::new(DOC, DOC.len() - 2, BuildMode::DependenciesWithTargetInner);
        let result = extract_cte_query(&request);

        assert!(result.is_ready());
        assert_eq!(
            result.sql.as_deref(),
            Some("WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b;")
        );
        assert!(result
            .issues
            .iter()
            .any(|issue| issue.code == issue_codes::MODE_FALLBACK));
    }

    #[test]
    fn test_dependency_order_option() {
        let sql = "WITH b AS (SELECT * FROM a), a AS (SELECT 1) SELECT * FROM b";
        let request = ExtractRequest::new(sql, sql.len(), BuildMode::FullCte)
            .with_dialect(Dialect::Postgres)
            .with_options(ExtractOptions {
                ordering: CteOrdering::DependencyOrder,
            });
        let result = extract_cte_query(&request);

        assert_eq!(result.required_ctes, vec!["a", "b"]);
        assert_eq!(
            result.sql.as_deref(),
            Some("WITH a AS (SELECT 1),\nb AS (SELECT * FROM a)\nSELECT * FROM b;")
        );
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_recursive_target_not_duplicated() {
        let sql = "WITH RECURSIVE t AS (SELECT 1 UNION ALL SELECT n + 1 FROM t WHERE n < 3) SELECT * FROM t";
        let request = ExtractRequest::new(sql, sql.find("n + 1").unwrap(), BuildMode::FullCte);
        let result = extract_cte_query(&request);

        assert_eq!(result.required_ctes, vec!["t"]);
        let text = result.sql.unwrap();
        assert_eq!(text.matches("t AS (").count(), 1);
        assert!(text.starts_with("WITH RECURSIVE "));
        assert!(text.ends_with("SELECT * FROM t;"));
    }

    #[test]
    fn test_cursor_offset_from_line_col() {
        let sql = "WITH a AS (\n  SELECT 1\n)\nSELECT * FROM a";
        assert_eq!(cursor_offset_from_line_col(sql, 2, 3), Some(14));
        assert_eq!(cursor_offset_from_line_col(sql, 9, 1), None);
    }
}
