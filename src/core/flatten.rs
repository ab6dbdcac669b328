use crate::domain::model::FlatRow;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

pub const KEY_SEPARATOR: &str = ".";

/// JSON text with `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Encodes an array cell, e.g. `[1, "a", {"k": 2}]`. Non-ASCII text is kept as is.
pub fn array_text(value: &Value) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| EtlError::MalformedRecord {
        reason: format!("array text is not UTF-8: {}", e),
    })
}

/// Flattens one API record into a single-level row.
///
/// Nested objects contribute their leaves under dot-joined keys, arrays are
/// stored as their JSON text, and scalars are copied as they are. Anything
/// other than a JSON object at the top level is rejected.
pub fn flatten_record(record: &Value) -> Result<FlatRow> {
    match record {
        Value::Object(fields) => {
            let mut row = FlatRow::new();
            flatten_into(fields, None, &mut row)?;
            Ok(row)
        }
        other => Err(EtlError::MalformedRecord {
            reason: format!("expected a JSON object, got {}", kind_of(other)),
        }),
    }
}

fn flatten_into(fields: &Map<String, Value>, parent: Option<&str>, row: &mut FlatRow) -> Result<()> {
    for (key, value) in fields {
        let path = match parent {
            Some(parent) => format!("{}{}{}", parent, KEY_SEPARATOR, key),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) => flatten_into(nested, Some(&path), row)?,
            Value::Array(_) => {
                row.insert(path, Value::String(array_text(value)?));
            }
            scalar => {
                row.insert(path, scalar.clone());
            }
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(row: &FlatRow) -> Vec<&str> {
        row.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_flat_record_is_unchanged() {
        let record = json!({"id": 3, "name": "Lamp", "price": 19.5, "active": true, "note": null});
        let row = flatten_record(&record).unwrap();

        assert_eq!(Value::Object(row.clone()), record);
        assert_eq!(keys(&row), vec!["id", "name", "price", "active", "note"]);
    }

    #[test]
    fn test_nested_objects_use_dotted_paths() {
        let record = json!({
            "id": 1,
            "address": {"city": "Taipei", "geo": {"lat": 25.03, "lng": 121.56}},
            "zip": "100"
        });
        let row = flatten_record(&record).unwrap();

        assert_eq!(
            keys(&row),
            vec!["id", "address.city", "address.geo.lat", "address.geo.lng", "zip"]
        );
        assert_eq!(row["address.geo.lat"], json!(25.03));
        assert!(row.values().all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn test_arrays_become_json_text() {
        let tags = json!(["sale", "új", {"k": [1, 2]}]);
        let record = json!({"tags": tags, "meta": {"sizes": [38, 40]}});
        let row = flatten_record(&record).unwrap();

        let encoded = row["tags"].as_str().unwrap();
        assert!(encoded.contains("új"));
        assert_eq!(serde_json::from_str::<Value>(encoded).unwrap(), tags);

        let sizes = row["meta.sizes"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(sizes).unwrap(), json!([38, 40]));
    }

    #[test]
    fn test_array_text_uses_spaced_separators() {
        let row = flatten_record(&json!({"tags": [1, "a", {"k": 2, "v": [true, null]}], "none": []})).unwrap();
        assert_eq!(row["tags"], json!("[1, \"a\", {\"k\": 2, \"v\": [true, null]}]"));
        assert_eq!(row["none"], json!("[]"));
        assert_eq!(array_text(&json!([{}, "új"])).unwrap(), "[{}, \"új\"]");
    }

    #[test]
    fn test_empty_nested_object_contributes_nothing() {
        let row = flatten_record(&json!({"id": 1, "extra": {}})).unwrap();
        assert_eq!(keys(&row), vec!["id"]);
    }

    #[test]
    fn test_colliding_path_keeps_first_position() {
        let row = flatten_record(&json!({"a.b": 1, "x": 0, "a": {"b": 2}})).unwrap();
        assert_eq!(keys(&row), vec!["a.b", "x"]);
        assert_eq!(row["a.b"], json!(2));
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        for record in [json!(42), json!("text"), json!([1, 2]), json!(null)] {
            assert!(matches!(
                flatten_record(&record),
                Err(EtlError::MalformedRecord { .. })
            ));
        }
    }
}
