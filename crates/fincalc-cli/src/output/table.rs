use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, is_row_set};

/// Format output as tables: scalar fields as a Field/Value table, each
/// row set (schedule, yearly projection, cash flows) as its own table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_object(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_object(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut row_sets: Vec<(&str, &Vec<Value>)> = Vec::new();

    for (key, val) in map {
        match val {
            Value::Array(arr) if is_row_set(val) => row_sets.push((key.as_str(), arr)),
            Value::Object(inner) => {
                for (sub_key, sub_val) in inner {
                    let label = format!("{}.{}", key, sub_key);
                    builder.push_record([label.as_str(), &format_scalar(sub_val)]);
                }
            }
            _ => builder.push_record([key.as_str(), &format_scalar(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, rows) in row_sets {
        println!("\n{}:", key);
        print_rows(rows);
    }
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_scalar(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }

    println!("{}", Table::from(builder));
}
