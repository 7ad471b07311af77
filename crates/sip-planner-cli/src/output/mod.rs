pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Row-shaped arrays worth rendering on their own, most useful first.
pub(crate) const ROW_KEYS: [&str; 5] = ["year_by_year", "funds", "scenarios", "entries", "resolutions"];

/// The `result` body of a computation envelope, or the value itself.
pub(crate) fn result_body(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// First array of objects found under one of [`ROW_KEYS`].
pub(crate) fn primary_rows(map: &Map<String, Value>) -> Option<(&'static str, &Vec<Value>)> {
    ROW_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(rows)) if rows.first().map_or(false, Value::is_object) => {
            Some((*key, rows))
        }
        _ => None,
    })
}

/// Scalar rendering shared by the text formatters.
pub(crate) fn format_scalar(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_body_unwraps_envelope() {
        let v = json!({"result": {"cagr": "12.5"}, "warnings": []});
        assert_eq!(result_body(&v), &json!({"cagr": "12.5"}));
        let bare = json!({"category": "Debt"});
        assert_eq!(result_body(&bare), &bare);
    }

    #[test]
    fn test_primary_rows_prefers_year_by_year() {
        let v = json!({
            "funds": [{"scheme_id": "1"}],
            "year_by_year": [{"year": 1}]
        });
        let (key, rows) = primary_rows(v.as_object().unwrap()).unwrap();
        assert_eq!(key, "year_by_year");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_primary_rows_ignores_scalar_arrays() {
        let v = json!({"scenarios": ["a", "b"]});
        assert!(primary_rows(v.as_object().unwrap()).is_none());
    }
}
