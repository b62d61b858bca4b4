pub mod encoding;

use ctescope_core::{extract_cte_query, issue_codes, ExtractRequest, ExtractResult};
use encoding::{convert_result_to_utf16, utf16_to_utf8_offset, Encoding};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// An extraction request plus the offset encoding the caller works in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WasmExtractRequest {
    #[serde(flatten)]
    request: ExtractRequest,
    #[serde(default)]
    encoding: Encoding,
}

/// Installs the panic hook and, with the `tracing` feature, a console subscriber.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    #[cfg(feature = "tracing")]
    tracing_wasm::set_as_global_default();
}

/// Main extraction entry point - accepts a JSON request, returns a JSON result.
/// This function never throws - errors are returned in the result's issues array.
#[wasm_bindgen]
pub fn extract_query_json(request_json: &str) -> String {
    let WasmExtractRequest {
        mut request,
        encoding,
    } = match serde_json::from_str(request_json) {
        Ok(req) => req,
        Err(e) => {
            let result = ExtractResult::from_error(
                issue_codes::INVALID_REQUEST,
                format!("Invalid request format: {e}"),
            );
            return serialize(&result);
        }
    };

    if encoding == Encoding::Utf16 {
        match utf16_to_utf8_offset(&request.sql, request.cursor_offset) {
            Ok(offset) => request.cursor_offset = offset,
            Err(message) => {
                return serialize(&ExtractResult::from_error(
                    issue_codes::INVALID_REQUEST,
                    message,
                ))
            }
        }
    }

    let mut result = extract_cte_query(&request);
    if encoding == Encoding::Utf16 {
        convert_result_to_utf16(&request.sql, &mut result);
    }

    serialize(&result)
}

/// Get version information
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn serialize(result: &ExtractResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| {
        let error_result =
            ExtractResult::from_error("SERIALIZATION_ERROR", "Failed to serialize result");
        serde_json::to_string(&error_result)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize error result"}"#.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn run(request: Value) -> Value {
        serde_json::from_str(&extract_query_json(&request.to_string())).unwrap()
    }

    #[test]
    fn test_extract_query_json_simple() {
        let parsed = run(serde_json::json!({
            "sql": "WITH a AS (SELECT 1) SELECT * FROM a",
            "cursorOffset": 35,
        }));

        assert_eq!(parsed["status"], "ready");
        assert_eq!(parsed["sql"], "WITH a AS (SELECT 1)\nSELECT * FROM a;");
        assert!(parsed["highlightSpans"].is_array());
    }

    #[test]
    fn test_extract_query_json_with_mode_and_options() {
        let parsed = run(serde_json::json!({
            "sql": "WITH b AS (SELECT * FROM a), a AS (SELECT 1) SELECT * FROM b",
            "dialect": "postgres",
            "cursorOffset": 15,
            "mode": "dependenciesWithTargetInner",
            "options": { "ordering": "dependencyOrder" },
        }));

        assert_eq!(parsed["status"], "ready");
        assert_eq!(parsed["requiredCtes"], serde_json::json!(["a"]));
        assert_eq!(parsed["sql"], "WITH a AS (SELECT 1)\nSELECT * FROM a;");
    }

    #[test]
    fn test_extract_query_json_not_applicable() {
        let parsed = run(serde_json::json!({ "sql": "SELECT 1", "cursorOffset": 3 }));

        assert_eq!(parsed["status"], "notApplicable");
        assert_eq!(parsed["issues"][0]["code"], "NO_SCOPE");
    }

    #[test]
    fn test_extract_query_json_invalid_request() {
        let parsed = run(serde_json::json!({ "not_valid": true }));

        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["issues"][0]["code"], "INVALID_REQUEST");
    }

    #[test]
    fn test_extract_query_json_utf16_offsets() {
        let sql = "WITH a AS (SELECT '😀') SELECT * FROM a";
        let utf16_len = sql.encode_utf16().count();
        let parsed = run(serde_json::json!({
            "sql": sql,
            "cursorOffset": utf16_len - 1,
            "encoding": "utf16",
        }));

        assert_eq!(parsed["status"], "ready");
        assert_eq!(parsed["target"]["span"]["end"], utf16_len);
    }

    #[test]
    fn test_extract_query_json_utf16_bad_offset() {
        let parsed = run(serde_json::json!({
            "sql": "SELECT 1",
            "cursorOffset": 99,
            "encoding": "utf16",
        }));

        assert_eq!(parsed["status"], "error");
    }

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }
}
