//! Fuzz target for cursor extraction.
//!
//! Every build mode must return a result without panicking, and every
//! highlight span must stay inside the document.

#![no_main]

use arbitrary::Arbitrary;
use ctescope_core::{
    extract_cte_query, BuildMode, CteOrdering, Dialect, ExtractOptions, ExtractRequest,
};
use libfuzzer_sys::fuzz_target;

/// Structured input for fuzzing - allows more targeted SQL generation.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    cursor: usize,
    dialect_idx: u8,
    dependency_order: bool,
}

impl FuzzInput {
    fn dialect(&self) -> Dialect {
        match self.dialect_idx % 5 {
            0 => Dialect::Generic,
            1 => Dialect::Postgres,
            2 => Dialect::Snowflake,
            3 => Dialect::Bigquery,
            _ => Dialect::Duckdb,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let dialect = input.dialect();
    // Out-of-range cursors are valid input too; keep most of them in range.
    let cursor = input.cursor % (input.sql.len() + 2);
    let ordering = if input.dependency_order {
        CteOrdering::DependencyOrder
    } else {
        CteOrdering::DocumentOrder
    };

    for mode in [
        BuildMode::FullCte,
        BuildMode::ProgressiveCte,
        BuildMode::SingleCteInner,
        BuildMode::DependenciesWithTargetInner,
    ] {
        let request = ExtractRequest::new(input.sql.clone(), cursor, mode)
            .with_dialect(dialect)
            .with_options(ExtractOptions { ordering });
        let result = extract_cte_query(&request);

        for span in &result.highlight_spans {
            assert!(span.start <= span.end && span.end <= input.sql.len());
        }
        if let Some(sql) = &result.sql {
            assert!(!sql.ends_with(";;"));
        }
    }
});
