use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, is_row_set, ROW_SET_KEYS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout. A result carrying a row set (schedule,
/// yearly projection, cash flows) is written as those rows; otherwise as
/// `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match primary_row_set(result) {
                Some(rows) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            },
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn primary_row_set(result: &Map<String, Value>) -> Option<&Vec<Value>> {
    ROW_SET_KEYS
        .iter()
        .filter_map(|key| result.get(*key))
        .find(|v| is_row_set(v))
        .and_then(Value::as_array)
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        if is_row_set(val) {
            continue;
        }
        let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
    }
}

fn write_rows(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}
