//! Types for the CTE extraction API.
//!
//! This module defines the request and response types exchanged with editor
//! front-ends. The API accepts a SQL document and a cursor offset and returns
//! runnable SQL together with highlight spans in document coordinates.

mod common;
mod request;
mod response;

// Re-export all public types
pub use common::{issue_codes, Issue, Severity, Span};
pub use request::{BuildMode, CteOrdering, Dialect, ExtractOptions, ExtractRequest};
pub use response::{CteSummary, ExtractResult, ExtractStatus, TargetInfo};
