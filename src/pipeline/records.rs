//! Record extraction: locate rows inside a parsed JSON document.
//!
//! Four document shapes are recognised:
//!
//! * **HAR**: `log.entries`, one row per network exchange with a fixed set
//!   of request/response fields.
//! * **Nested payload**: a wrapper key (e.g. `electorDetails`) anywhere in
//!   the document whose value is a list of detail objects.
//! * **HAR bodies**: the nested payload, found inside the JSON text of HAR
//!   response bodies.
//! * **Generic**: a list becomes one row per item, an object one row.
//!
//! [`ExtractionStrategy`] picks which shape to look for.

use crate::config::{ExtractConfig, ExtractionStrategy};
use crate::error::RecordError;
use crate::pipeline::flatten::{flatten_value, Record};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, warn};

/// Records found in one document, plus the record-level errors skipped over.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub errors: Vec<RecordError>,
    /// Which shape produced the records.
    pub shape: &'static str,
}

impl Extraction {
    fn new(shape: &'static str, records: Vec<Record>) -> Self {
        Self {
            records,
            errors: Vec::new(),
            shape,
        }
    }
}

/// Extract records from `doc` according to `config.strategy`.
pub fn extract_records(doc: &Value, config: &ExtractConfig) -> Extraction {
    let sep = config.separator.as_str();
    let key = config.payload_key.as_str();

    match config.strategy {
        ExtractionStrategy::Generic => Extraction::new("generic", generic_records(doc, sep)),
        ExtractionStrategy::Har => Extraction::new("har", har_records(doc)),
        ExtractionStrategy::Payload => match find_payload(doc, key) {
            Some(items) => Extraction::new("payload", payload_records(items, sep)),
            None => {
                debug!("No '{}' payload found; using generic flattening", key);
                Extraction::new("generic", generic_records(doc, sep))
            }
        },
        ExtractionStrategy::HarBodies => {
            let mut found = har_body_records(doc, key, sep);
            if found.records.is_empty() {
                debug!("No '{}' payload in any HAR body; using generic flattening", key);
                found.records = generic_records(doc, sep);
                found.shape = "generic";
            }
            found
        }
        ExtractionStrategy::Auto => {
            if is_har(doc) {
                Extraction::new("har", har_records(doc))
            } else if let Some(items) = find_payload(doc, key) {
                Extraction::new("payload", payload_records(items, sep))
            } else {
                Extraction::new("generic", generic_records(doc, sep))
            }
        }
    }
}

// ── Generic ──────────────────────────────────────────────────────────────

/// One record per list item, or one record for an object.
///
/// Empty lists and empty objects yield no records.
pub fn generic_records(doc: &Value, sep: &str) -> Vec<Record> {
    match doc {
        Value::Array(items) => items.iter().map(|item| flatten_value(item, sep)).collect(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        Value::Object(_) => vec![flatten_value(doc, sep)],
        Value::Null => Vec::new(),
        scalar => vec![flatten_value(scalar, sep)],
    }
}

// ── HAR ──────────────────────────────────────────────────────────────────

/// `true` if the document has a `log.entries` array.
pub fn is_har(doc: &Value) -> bool {
    doc.pointer("/log/entries").is_some_and(Value::is_array)
}

fn har_entries(doc: &Value) -> &[Value] {
    doc.pointer("/log/entries")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// One summary record per HAR entry. Missing fields become empty strings.
pub fn har_records(doc: &Value) -> Vec<Record> {
    har_entries(doc).iter().map(har_entry_record).collect()
}

const HAR_FIELDS: [(&str, &str); 12] = [
    ("url", "/request/url"),
    ("method", "/request/method"),
    ("status", "/response/status"),
    ("status_text", "/response/statusText"),
    ("time", "/time"),
    ("started_date_time", "/startedDateTime"),
    ("request_headers_size", "/request/headersSize"),
    ("response_headers_size", "/response/headersSize"),
    ("response_body_size", "/response/bodySize"),
    ("content_type", "/response/content/mimeType"),
    ("server_ip", "/serverIPAddress"),
    ("connection", "/connection"),
];

fn har_entry_record(entry: &Value) -> Record {
    HAR_FIELDS
        .iter()
        .map(|(column, pointer)| {
            let value = entry
                .pointer(pointer)
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            (column.to_string(), value)
        })
        .collect()
}

// ── Nested payload ───────────────────────────────────────────────────────

/// Depth-first search for `key` holding an array; the first match wins.
pub fn find_payload<'a>(doc: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    match doc {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get(key) {
                return Some(items);
            }
            map.values().find_map(|child| find_payload(child, key))
        }
        Value::Array(items) => items.iter().find_map(|child| find_payload(child, key)),
        _ => None,
    }
}

/// Flatten each detail item into its own record.
pub fn payload_records(items: &[Value], sep: &str) -> Vec<Record> {
    items.iter().map(|item| flatten_value(item, sep)).collect()
}

/// Search every HAR response body for the nested payload.
///
/// Bodies that are absent or not JSON-looking are ignored; bodies that look
/// like JSON but fail to parse are reported as [`RecordError::MalformedBody`].
pub fn har_body_records(doc: &Value, key: &str, sep: &str) -> Extraction {
    let mut out = Extraction::new("har-bodies", Vec::new());

    for (idx, entry) in har_entries(doc).iter().enumerate() {
        let Some(content) = entry.pointer("/response/content") else {
            continue;
        };
        let Some(text) = content.get("text").and_then(Value::as_str) else {
            continue;
        };

        let body = match decode_body(text, content.get("encoding").and_then(Value::as_str)) {
            Ok(body) => body,
            Err(detail) => {
                warn!("Entry {}: {}", idx, detail);
                out.errors.push(RecordError::MalformedBody { entry: idx, detail });
                continue;
            }
        };

        let trimmed = body.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            continue;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(parsed) => {
                if let Some(items) = find_payload(&parsed, key) {
                    debug!("Entry {}: {} payload items", idx, items.len());
                    out.records.extend(payload_records(items, sep));
                }
            }
            Err(e) => {
                warn!("Entry {}: response body is not valid JSON: {}", idx, e);
                out.errors.push(RecordError::MalformedBody {
                    entry: idx,
                    detail: e.to_string(),
                });
            }
        }
    }

    out
}

fn decode_body(text: &str, encoding: Option<&str>) -> Result<String, String> {
    match encoding {
        Some(enc) if enc.eq_ignore_ascii_case("base64") => {
            let bytes = STANDARD
                .decode(text.trim())
                .map_err(|e| format!("base64 body could not be decoded: {e}"))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(strategy: ExtractionStrategy) -> ExtractConfig {
        ExtractConfig {
            strategy,
            ..ExtractConfig::default()
        }
    }

    fn har_doc() -> Value {
        json!({
            "log": {
                "entries": [
                    {
                        "startedDateTime": "2024-05-01T10:00:00Z",
                        "time": 12.5,
                        "request": {"method": "GET", "url": "https://a.test/ok", "headersSize": 120},
                        "response": {
                            "status": 200, "statusText": "OK", "headersSize": 80, "bodySize": 512,
                            "content": {"mimeType": "application/json"}
                        },
                        "serverIPAddress": "10.0.0.1",
                        "connection": "443"
                    },
                    {
                        "request": {"method": "POST", "url": "https://a.test/missing"},
                        "response": {"status": 404, "statusText": "Not Found"}
                    }
                ]
            }
        })
    }

    #[test]
    fn test_har_rows_have_fixed_columns() {
        let rows = har_records(&har_doc());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["status"], json!(200));
        assert_eq!(rows[1]["status"], json!(404));
        assert_eq!(rows[0]["content_type"], json!("application/json"));
        assert_eq!(rows[1]["server_ip"], json!(""));
        assert_eq!(rows[1]["time"], json!(""));
        assert!(rows.iter().all(|r| r.len() == HAR_FIELDS.len()));
    }

    #[test]
    fn test_auto_detects_har() {
        let ex = extract_records(&har_doc(), &config(ExtractionStrategy::Auto));
        assert_eq!(ex.shape, "har");
        assert_eq!(ex.records.len(), 2);
    }

    #[test]
    fn test_generic_list_and_object() {
        let list = json!([{"a": 1}, {"b": {"c": 2}}, 7]);
        let rows = generic_records(&list, "_");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["b_c"], json!(2));
        assert_eq!(rows[2]["value"], json!(7));

        let single = generic_records(&json!({"a": {"b": 1}, "c": [1, 2]}), "_");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0]["c"], json!("[1, 2]"));
    }

    #[test]
    fn test_generic_empty_documents_yield_nothing() {
        assert!(generic_records(&json!({}), "_").is_empty());
        assert!(generic_records(&json!([]), "_").is_empty());
    }

    #[test]
    fn test_find_payload_depth_first() {
        let doc = json!({
            "status": "ok",
            "data": {"page": 1, "electorDetails": [{"name": "A"}, {"name": "B"}]}
        });
        let items = find_payload(&doc, "electorDetails").unwrap();
        assert_eq!(items.len(), 2);
        assert!(find_payload(&doc, "missing").is_none());
    }

    #[test]
    fn test_auto_prefers_payload_over_generic() {
        let doc = json!({"data": {"electorDetails": [
            {"name": "A", "addr": {"city": "X"}},
            {"name": "B", "addr": {"city": "Y"}}
        ]}});
        let ex = extract_records(&doc, &config(ExtractionStrategy::Auto));
        assert_eq!(ex.shape, "payload");
        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.records[1]["addr_city"], json!("Y"));
    }

    #[test]
    fn test_payload_falls_back_to_generic() {
        let ex = extract_records(&json!({"x": 1}), &config(ExtractionStrategy::Payload));
        assert_eq!(ex.shape, "generic");
        assert_eq!(ex.records.len(), 1);
    }

    #[test]
    fn test_har_bodies_finds_embedded_payload() {
        let body = json!({"electorDetails": [{"id": 1}, {"id": 2}]}).to_string();
        let encoded = STANDARD.encode(json!({"electorDetails": [{"id": 3}]}).to_string());
        let doc = json!({"log": {"entries": [
            {"response": {"content": {"mimeType": "application/json", "text": body}}},
            {"response": {"content": {"mimeType": "text/html", "text": "<html></html>"}}},
            {"response": {"content": {"text": "{not json"}}},
            {"response": {"content": {"text": encoded, "encoding": "base64"}}},
            {"response": {}}
        ]}});

        let ex = extract_records(&doc, &config(ExtractionStrategy::HarBodies));
        assert_eq!(ex.shape, "har-bodies");
        assert_eq!(ex.records.len(), 3);
        assert_eq!(ex.records[2]["id"], json!(3));
        assert_eq!(ex.errors.len(), 1);
        assert!(matches!(ex.errors[0], RecordError::MalformedBody { entry: 2, .. }));
    }

    #[test]
    fn test_har_bodies_without_payload_falls_back_to_generic() {
        let ex = extract_records(&har_doc(), &config(ExtractionStrategy::HarBodies));
        assert_eq!(ex.shape, "generic");
        assert_eq!(ex.records.len(), 1);
        assert!(ex.records[0].contains_key("log_entries"));
    }

    #[test]
    fn test_forced_har_on_non_har_is_empty() {
        let ex = extract_records(&json!([1, 2]), &config(ExtractionStrategy::Har));
        assert!(ex.records.is_empty());
    }
}
