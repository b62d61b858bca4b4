use ctescope_core::{extract_cte_query, BuildMode, Dialect, ExtractRequest, ExtractResult, Span};

/// Cursor marker used in test SQL.
pub const CURSOR: char = '|';

/// Removes the cursor marker from `marked`, returning the SQL and the marker's offset.
pub fn split_cursor(marked: &str) -> (String, usize) {
    let offset = marked
        .find(CURSOR)
        .unwrap_or_else(|| panic!("missing cursor marker in {marked:?}"));
    let sql = format!("{}{}", &marked[..offset], &marked[offset + 1..]);
    (sql, offset)
}

/// Extracts at the marked cursor position.
pub fn extract_marked(marked: &str, mode: BuildMode, dialect: Dialect) -> (String, ExtractResult) {
    let (sql, cursor) = split_cursor(marked);
    let request = ExtractRequest::new(sql.clone(), cursor, mode).with_dialect(dialect);
    let result = extract_cte_query(&request);
    (sql, result)
}

/// Source text covered by each highlight span.
pub fn highlighted<'a>(sql: &'a str, spans: &[Span]) -> Vec<&'a str> {
    spans
        .iter()
        .map(|span| {
            sql.get(span.start..span.end)
                .unwrap_or_else(|| panic!("span {span:?} out of bounds"))
        })
        .collect()
}
