use serde_json::Value;

use super::{format_scalar, result_body};

/// Headline fields, in order of preference.
const PRIORITY_KEYS: [&str; 12] = [
    "final_corpus",
    "required_monthly_sip",
    "total_corpus",
    "cagr",
    "tax",
    "inflation_adjusted_value",
    "extra_corpus",
    "corpus_spread",
    "weighted_cagr",
    "category",
    "missing_nav_streak_days",
    "unallocated",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let body = result_body(value);

    if let Value::Object(map) = body {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_scalar(val, "null");
                }
            }
        }

        // portfolio responses nest the headline inside the projection
        if let Some(Value::Object(projection)) = map.get("projection") {
            if let Some(total) = projection.get("total_corpus") {
                return format_scalar(total, "null");
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_scalar(val, "null"));
        }
    }

    format_scalar(body, "null")
}
