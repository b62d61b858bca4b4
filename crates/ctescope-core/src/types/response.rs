//! Response types for the CTE extraction API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Issue, Severity, Span};

/// Outcome of an extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExtractStatus {
    /// A runnable query was assembled.
    Ready,
    /// The cursor is not inside a CTE scope, or the scope defines no CTEs.
    /// Callers should do nothing.
    #[default]
    NotApplicable,
    /// The request was invalid or the document could not be tokenized.
    Error,
}

/// The result of extracting a runnable query at a cursor position.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    pub status: ExtractStatus,

    /// Standalone SQL text, present when `status` is `ready`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Source ranges (original document coordinates) covered by the query
    pub highlight_spans: Vec<Span>,

    /// The query whose dependencies were resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetInfo>,

    /// Every CTE defined in the enclosing scope, in document order
    pub ctes: Vec<CteSummary>,

    /// Names of the CTEs the target needs, in emission order
    pub required_ctes: Vec<String>,

    /// Non-fatal diagnostics and not-applicable reasons
    pub issues: Vec<Issue>,
}

impl ExtractResult {
    /// Create an error result with a single issue.
    /// Useful for returning errors from WASM boundary or other entry points.
    pub fn from_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ExtractStatus::Error,
            issues: vec![Issue::error(code, message)],
            ..Default::default()
        }
    }

    /// Create a not-applicable result carrying an informational issue.
    pub fn not_applicable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ExtractStatus::NotApplicable,
            issues: vec![Issue::info(code, message)],
            ..Default::default()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ExtractStatus::Ready
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }
}

/// The query a cursor resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Full source range of the target node
    pub span: Span,

    /// Set when the target is a CTE definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cte_name: Option<String>,
}

/// A CTE definition in the enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CteSummary {
    pub name: String,
    /// Zero-based position among the scope's CTEs
    pub index: usize,
    /// Full source range of the definition
    pub span: Span,
    /// Source range between the definition's parentheses, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_span: Option<Span>,
}
