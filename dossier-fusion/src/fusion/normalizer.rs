// Source Normalizer
//
// Flattens one provider response into a list of flat SourceRecords.
//
// Accepted shapes (no schema registration):
// 1. Database map: { "<db>": { "InfoLeak"?: str, "Data"?: [ {..}, .. ] }, .. }
// 2. Array of flat objects
// 3. Single flat object
// 4. Any of the above nested under "data" and/or "List"
//
// Unusable parts are skipped with a recorded reason; normalization never fails.

use crate::types::{ProviderResponse, SkippedInput, SourceRecord};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Wrapper keys unwrapped before shape detection
const WRAPPER_KEYS: [&str; 2] = ["data", "List"];

/// Maximum wrapper levels unwrapped (e.g. `data.List`)
const MAX_UNWRAP_DEPTH: usize = 2;

const ERROR_TOKENS: [&str; 3] = ["error", "exception", "failed"];

/// Records and skip reasons produced from one provider response
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub records: Vec<SourceRecord>,
    pub skipped: Vec<SkippedInput>,
}

/// Source normalizer (stateless)
#[derive(Debug, Default)]
pub struct SourceNormalizer;

impl SourceNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one provider response
    ///
    /// Records are numbered from `first_sequence` upward in response order.
    pub fn normalize(&self, response: &ProviderResponse, first_sequence: usize) -> NormalizedResponse {
        let mut walk = Walk {
            response,
            next_sequence: first_sequence,
            out: NormalizedResponse::default(),
        };
        walk.visit(&response.payload, "$", 0);

        debug!(
            "Normalized {}: {} records, {} skipped",
            response.provider,
            walk.out.records.len(),
            walk.out.skipped.len()
        );
        walk.out
    }
}

/// True for strings that look like a transport-level error message
pub fn looks_like_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    ERROR_TOKENS.iter().any(|token| lower.contains(token))
}

struct Walk<'a> {
    response: &'a ProviderResponse,
    next_sequence: usize,
    out: NormalizedResponse,
}

impl Walk<'_> {
    fn visit(&mut self, value: &Value, location: &str, depth: usize) {
        match value {
            Value::Null => self.skip(location, "empty response".to_string()),
            Value::String(text) if looks_like_error(text) => {
                self.skip(location, format!("transport error: {}", text.trim()))
            }
            Value::String(_) | Value::Bool(_) | Value::Number(_) => {
                self.skip(location, "non-object leaf".to_string())
            }
            Value::Array(items) => self.visit_array(items, location),
            Value::Object(object) => self.visit_object(object, location, depth),
        }
    }

    fn visit_object(&mut self, object: &Map<String, Value>, location: &str, depth: usize) {
        if let Some(reason) = failure_reason(object) {
            self.skip(location, reason);
            return;
        }

        if depth < MAX_UNWRAP_DEPTH {
            for key in WRAPPER_KEYS {
                if let Some(inner) = object.get(key) {
                    if inner.is_object() || inner.is_array() {
                        self.visit(inner, &format!("{}.{}", location, key), depth + 1);
                        return;
                    }
                }
            }
        }

        if is_database_map(object) {
            for (db_name, entry) in object {
                self.visit_database(db_name, entry, &format!("{}.{}", location, db_name));
            }
            return;
        }

        if object.is_empty() {
            self.skip(location, "empty object".to_string());
            return;
        }
        if let Some(message) = error_only_message(object) {
            self.skip(location, format!("transport error: {}", message));
            return;
        }

        let source = self.response.provider.clone();
        self.emit(source, object.clone(), None);
    }

    fn visit_array(&mut self, items: &[Value], location: &str) {
        if items.is_empty() {
            self.skip(location, "empty array".to_string());
            return;
        }
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Object(object) if !object.is_empty() => match error_only_message(object) {
                    Some(message) => self.skip(
                        &format!("{}[{}]", location, index),
                        format!("transport error: {}", message),
                    ),
                    None => {
                        let source = self.response.provider.clone();
                        self.emit(source, object.clone(), None);
                    }
                },
                Value::String(text) if looks_like_error(text) => self.skip(
                    &format!("{}[{}]", location, index),
                    format!("transport error: {}", text.trim()),
                ),
                _ => self.skip(
                    &format!("{}[{}]", location, index),
                    "array element is not a record".to_string(),
                ),
            }
        }
    }

    fn visit_database(&mut self, db_name: &str, entry: &Value, location: &str) {
        let entry = match entry {
            Value::Object(entry) => entry,
            Value::String(text) if looks_like_error(text) => {
                self.skip(location, format!("transport error: {}", text.trim()));
                return;
            }
            _ => {
                self.skip(location, "database entry is not an object".to_string());
                return;
            }
        };

        let leak_info = entry
            .get("InfoLeak")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let rows = match entry.get("Data") {
            None | Some(Value::Null) => {
                self.skip(location, "missing Data".to_string());
                return;
            }
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                self.skip(location, "Data is not an array".to_string());
                return;
            }
        };

        for (index, row) in rows.iter().enumerate() {
            match row {
                Value::Object(fields) if !fields.is_empty() => {
                    self.emit(db_name.to_string(), fields.clone(), leak_info.clone());
                }
                _ => self.skip(
                    &format!("{}.Data[{}]", location, index),
                    "row is not a record".to_string(),
                ),
            }
        }
    }

    fn emit(&mut self, source: String, fields: Map<String, Value>, leak_info: Option<String>) {
        self.out.records.push(SourceRecord {
            source,
            provider: self.response.provider.clone(),
            gating: self.response.gating,
            fields,
            leak_info,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    fn skip(&mut self, location: &str, reason: String) {
        warn!("Skipping {} {}: {}", self.response.provider, location, reason);
        self.out.skipped.push(SkippedInput {
            provider: self.response.provider.clone(),
            location: location.to_string(),
            reason,
        });
    }
}

/// Failure envelope such as `{"success": false, "message": ..}` or `{"error": ..}`
fn failure_reason(object: &Map<String, Value>) -> Option<String> {
    let message = || {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| object.get(*key))
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "no message".to_string())
    };

    if object.get("success") == Some(&Value::Bool(false)) {
        return Some(format!("provider reported failure: {}", message()));
    }

    let has_payload = WRAPPER_KEYS.iter().any(|key| object.contains_key(*key));
    match object.get("error") {
        Some(Value::Null) | Some(Value::Bool(false)) | None => None,
        Some(_) if !has_payload => Some(format!("provider reported failure: {}", message())),
        Some(_) => None,
    }
}

/// Message of an object whose only content is error text, e.g.
/// `{"status": "failed", "message": "Exception: upstream timeout"}`
fn error_only_message(object: &Map<String, Value>) -> Option<String> {
    let mut messages = object.values().filter(|v| !v.is_null());
    let all_errors = messages
        .clone()
        .all(|v| matches!(v, Value::String(text) if looks_like_error(text)));
    if !all_errors {
        return None;
    }
    messages.find_map(|v| v.as_str()).map(|text| text.trim().to_string())
}

/// Every value is an object and at least one looks like a database entry
fn is_database_map(object: &Map<String, Value>) -> bool {
    !object.is_empty()
        && object.values().all(|v| v.is_object() || v.is_string())
        && object.values().any(|v| {
            v.as_object()
                .map(|entry| entry.contains_key("Data") || entry.contains_key("InfoLeak"))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateMode;
    use serde_json::json;

    fn normalize(payload: Value) -> NormalizedResponse {
        let response = ProviderResponse::new("acme", GateMode::Strict, payload);
        SourceNormalizer::new().normalize(&response, 0)
    }

    #[test]
    fn test_database_map() {
        let out = normalize(json!({
            "Breach2019": {
                "InfoLeak": "Forum dump, 2019",
                "Data": [{"FullName": "Ines Brady"}, {"FullName": "Ines M Brady"}]
            },
            "Voters": {"Data": [{"Name": "Ines Brady", "City": "Austin"}]}
        }));

        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].source, "Breach2019");
        assert_eq!(out.records[0].leak_info.as_deref(), Some("Forum dump, 2019"));
        assert_eq!(out.records[2].source, "Voters");
        assert!(out.records[2].leak_info.is_none());
        assert_eq!(
            out.records.iter().map(|r| r.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_missing_and_bad_data_skipped() {
        let out = normalize(json!({
            "A": {"InfoLeak": "no rows"},
            "B": {"Data": "oops"},
            "C": {"Data": [42, {"Email": "x@y.com"}]}
        }));

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].source, "C");
        assert_eq!(out.skipped.len(), 3);
        assert_eq!(out.skipped[0].reason, "missing Data");
        assert_eq!(out.skipped[1].reason, "Data is not an array");
        assert_eq!(out.skipped[2].location, "$.C.Data[0]");
    }

    #[test]
    fn test_flat_object_and_array() {
        let out = normalize(json!({"Name": "Ines Brady", "Phone": "5551234567"}));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].source, "acme");

        let out = normalize(json!([{"Name": "A B"}, "junk", {"Name": "C D"}]));
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn test_wrapped_shapes() {
        let out = normalize(json!({"data": {"Name": "Ines Brady"}}));
        assert_eq!(out.records.len(), 1);

        let out = normalize(json!({"data": [{"Name": "Ines Brady"}]}));
        assert_eq!(out.records.len(), 1);

        let out = normalize(json!({
            "NumOfResults": 1,
            "List": {"Leak1": {"Data": [{"Email": "a@x.com"}]}}
        }));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].source, "Leak1");

        let out = normalize(json!({"data": {"List": {"Leak1": {"Data": [{"Email": "a@x.com"}]}}}}));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].source, "Leak1");
    }

    #[test]
    fn test_error_strings_and_envelopes() {
        let out = normalize(json!("Internal Server Error"));
        assert!(out.records.is_empty());
        assert!(out.skipped[0].reason.starts_with("transport error"));

        let out = normalize(json!({"success": false, "message": "quota exceeded"}));
        assert!(out.records.is_empty());
        assert_eq!(out.skipped[0].reason, "provider reported failure: quota exceeded");

        let out = normalize(json!({"error": "timeout"}));
        assert!(out.records.is_empty());

        let out = normalize(json!({"Leak1": "Exception while querying", "Leak2": {"Data": [{"Name": "X Y"}]}}));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn test_error_only_objects_are_not_records() {
        let out = normalize(json!({"status": "failed", "message": "Exception: upstream timeout"}));
        assert!(out.records.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].reason, "transport error: failed");

        let out = normalize(json!([{"status": "Error 502", "detail": null}, {"Name": "Ines Brady"}]));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped[0].location, "$[0]");

        // one real value keeps the record
        let out = normalize(json!({"Status": "failed", "Name": "Ines Brady"}));
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn test_degenerate_inputs_never_produce_records() {
        for payload in [
            json!(null),
            json!(17),
            json!(true),
            json!("hello"),
            json!([]),
            json!({}),
            json!([1, 2, "x"]),
            json!({"data": {}}),
            json!({"List": {"db": {"Data": []}}}),
        ] {
            let out = normalize(payload.clone());
            assert!(out.records.is_empty(), "unexpected records for {}", payload);
        }
    }

    #[test]
    fn test_records_carry_gating_and_provider() {
        let response = ProviderResponse::linked("phone-lookup", json!([{"Name": "A B"}]));
        let out = SourceNormalizer::new().normalize(&response, 10);
        assert_eq!(out.records[0].gating, GateMode::Linked);
        assert_eq!(out.records[0].provider, "phone-lookup");
        assert_eq!(out.records[0].sequence, 10);
    }
}
