pub mod analyzer;
pub mod builder;
pub mod error;
pub mod extract;
pub mod tree;
pub mod types;

// Re-export main types and functions
pub use analyzer::{
    analyze_scope, analyze_scope_with_options, AnalysisOptions, CteEntry, ScopeAnalysis,
};
pub use builder::{BuildResult, QueryAssembler};
pub use error::{NotApplicable, ParseError};
pub use extract::{cursor_offset_from_line_col, extract_cte_query, extract_from_tree};
pub use tree::{NodeId, NodeKind, SqlTree, SyntaxTree};

// Re-export types explicitly
pub use types::{
    // Issue codes
    issue_codes,
    // Request types
    BuildMode,
    CteOrdering,
    // Response types
    CteSummary,
    Dialect,
    ExtractOptions,
    ExtractRequest,
    ExtractResult,
    ExtractStatus,
    Issue,
    Severity,
    Span,
    TargetInfo,
};
