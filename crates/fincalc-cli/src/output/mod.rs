pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Keys holding per-row data (schedules, projections, cash flows) that the
/// tabular formatters print as their own row sets.
pub const ROW_SET_KEYS: [&str; 4] = ["schedule", "yearly", "cashflows", "adjustments"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar JSON value as plain text.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// True for a non-empty array whose first element is an object.
pub fn is_row_set(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))))
}
