//! Common types shared between request and response.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An issue encountered while extracting a query (error, warning, or info).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity level
    pub severity: Severity,

    /// Machine-readable issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Optional: location in the source document the issue relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A half-open byte range in the source SQL string.
///
/// Spans always refer to the original document, never to SQL text rebuilt
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Byte offset from start of SQL string (inclusive)
    pub start: usize,
    /// Byte offset from start of SQL string (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span positioned at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `offset` falls inside the half-open range.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Machine-readable issue codes.
pub mod issue_codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const NO_SCOPE: &str = "NO_SCOPE";
    pub const NO_CTES: &str = "NO_CTES";
    pub const DUPLICATE_CTE_NAME: &str = "DUPLICATE_CTE_NAME";
    pub const FORWARD_CTE_REFERENCE: &str = "FORWARD_CTE_REFERENCE";
    pub const MODE_FALLBACK: &str = "MODE_FALLBACK";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_creation() {
        let issue = Issue::warning(issue_codes::DUPLICATE_CTE_NAME, "CTE 'a' defined twice")
            .with_span(Span::new(10, 20));

        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.code, "DUPLICATE_CTE_NAME");
        assert_eq!(issue.span.unwrap().start, 10);
    }

    #[test]
    fn test_span_contains_is_half_open() {
        let span = Span::new(4, 8);
        assert!(!span.contains(3));
        assert!(span.contains(4));
        assert!(span.contains(7));
        assert!(!span.contains(8));
    }

    #[test]
    fn test_span_cover() {
        let merged = Span::new(10, 12).cover(Span::new(3, 11));
        assert_eq!(merged, Span::new(3, 12));
        assert_eq!(merged.len(), 9);
        assert!(Span::empty(5).is_empty());
    }
}
