//! Flattening nested JSON objects into single-level records.
//!
//! Nested objects merge into composite keys (`parent{sep}child`); arrays are
//! kept opaque and stored as their JSON text. Array text uses the spaced
//! layout (`[1, 2]`, `{"k": 1}`) that spreadsheets built from these exports
//! already contain.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;

/// One flat row: composite key → scalar (or JSON-text) value.
pub type Record = BTreeMap<String, Value>;

/// Flatten a JSON object into a [`Record`].
///
/// Keys of nested objects are joined to their parent with `sep`. Arrays are
/// not recursed into. A later composite key that collides with an earlier
/// one overwrites it.
pub fn flatten(object: &Map<String, Value>, sep: &str) -> Record {
    let mut out = Record::new();
    flatten_into(object, "", sep, &mut out);
    out
}

fn flatten_into(object: &Map<String, Value>, parent: &str, sep: &str, out: &mut Record) {
    for (key, value) in object {
        let composite = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{sep}{key}")
        };
        match value {
            Value::Object(child) => flatten_into(child, &composite, sep, out),
            Value::Array(_) => {
                out.insert(composite, Value::String(to_spaced_json(value)));
            }
            scalar => {
                out.insert(composite, scalar.clone());
            }
        }
    }
}

/// Flatten any JSON value: objects are flattened, anything else is wrapped
/// under the key `value`.
pub fn flatten_value(value: &Value, sep: &str) -> Record {
    match value {
        Value::Object(object) => flatten(object, sep),
        Value::Array(_) => Record::from([("value".to_string(), Value::String(to_spaced_json(value)))]),
        scalar => Record::from([("value".to_string(), scalar.clone())]),
    }
}

/// Text written into a CSV cell for a record value.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => to_spaced_json(value),
    }
}

/// Serialize with `", "` between items and `": "` after keys.
///
/// Non-ASCII text is written as UTF-8, not as `\uXXXX` escapes.
pub fn to_spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_flatten_nested_and_array() {
        let rec = flatten(&obj(json!({"a": {"b": 1}, "c": [1, 2]})), "_");
        assert_eq!(rec.len(), 2);
        assert_eq!(rec["a_b"], json!(1));
        assert_eq!(rec["c"], json!("[1, 2]"));
    }

    #[test]
    fn test_flatten_deep_with_custom_separator() {
        let rec = flatten(&obj(json!({"x": {"y": {"z": "deep"}}, "n": null})), ".");
        assert_eq!(rec["x.y.z"], json!("deep"));
        assert_eq!(rec["n"], Value::Null);
    }

    #[test]
    fn test_array_of_objects_is_opaque() {
        let rec = flatten(&obj(json!({"items": [{"id": 1, "tag": "a"}]})), "_");
        assert_eq!(rec["items"], json!(r#"[{"id": 1, "tag": "a"}]"#));
    }

    #[test]
    fn test_empty_nested_object_contributes_no_keys() {
        let rec = flatten(&obj(json!({"meta": {}, "k": true})), "_");
        assert_eq!(rec.keys().collect::<Vec<_>>(), vec!["k"]);
    }

    #[test]
    fn test_renesting_recovers_key_paths() {
        let doc = json!({
            "user": {"name": "Ann", "address": {"city": "Oslo", "zip": "0150"}},
            "tags": ["x", "y"],
            "active": true
        });

        fn leaf_paths(v: &Value, prefix: Vec<String>, out: &mut BTreeSet<Vec<String>>) {
            match v {
                Value::Object(m) if !m.is_empty() => {
                    for (k, child) in m {
                        let mut p = prefix.clone();
                        p.push(k.clone());
                        leaf_paths(child, p, out);
                    }
                }
                _ => {
                    out.insert(prefix);
                }
            }
        }

        let mut expected = BTreeSet::new();
        leaf_paths(&doc, Vec::new(), &mut expected);

        let rec = flatten(&obj(doc), "_");
        let renested: BTreeSet<Vec<String>> = rec
            .keys()
            .map(|k| k.split('_').map(str::to_string).collect())
            .collect();
        assert_eq!(renested, expected);
    }

    #[test]
    fn test_flatten_value_wraps_non_objects() {
        assert_eq!(flatten_value(&json!(5), "_")["value"], json!(5));
        assert_eq!(flatten_value(&json!([1]), "_")["value"], json!("[1]"));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("plain")), "plain");
        assert_eq!(cell_text(&json!(200)), "200");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!(false)), "false");
        assert_eq!(cell_text(&json!({"a": 1, "b": [2]})), r#"{"a": 1, "b": [2]}"#);
    }

    #[test]
    fn test_big_integers_keep_their_digits() {
        let doc: Value = serde_json::from_str(
            r#"{"id": 123456789012345678901234567890, "ids": [98765432109876543210]}"#,
        )
        .unwrap();
        let rec = flatten_value(&doc, "_");
        assert_eq!(cell_text(&rec["id"]), "123456789012345678901234567890");
        assert_eq!(cell_text(&rec["ids"]), "[98765432109876543210]");
    }

    #[test]
    fn test_spaced_json_preserves_source_key_order() {
        let v: Value = serde_json::from_str(r#"[{"z": 1, "a": 2}]"#).unwrap();
        assert_eq!(to_spaced_json(&v), r#"[{"z": 1, "a": 2}]"#);
    }

    #[test]
    fn test_spaced_json_keeps_non_ascii_as_utf8() {
        let v = json!(["José", {"ville": "Zürich"}]);
        assert_eq!(to_spaced_json(&v), r#"["José", {"ville": "Zürich"}]"#);
    }
}
