use serde_json::Value;

use super::format_scalar;

/// Headline figure per calculation, first match wins. Dotted paths reach
/// into nested projections.
const PRIORITY_PATHS: [&str; 9] = [
    "ytm",
    "monthly_payment",
    "cagr",
    "nominal.total_future_value",
    "cagr_nominal",
    "dirty_price",
    "period.next_coupon",
    "count",
    "total_return",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = PRIORITY_PATHS
        .iter()
        .filter_map(|path| lookup(result_obj, path))
        .find(|v| !v.is_null())
    {
        println!("{}", format_scalar(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, key| node.get(key))
}
