//! Table-driven batch validation.
//!
//! Every accepted event is checked against a declarative field table
//! (name, expected JSON type, required). Problems are collected across
//! the whole batch so one rejection lists every offending field.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::event::LogEvent;

/// Expected JSON type for a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    String,
    Number,
    StringArray,
    Object(&'static [FieldRule]),
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::StringArray => "array",
            FieldType::Object(_) => "object",
        }
    }
}

/// Validation rule for one field of an object.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Fields of the nested `proxy` record.
pub const PROXY_FIELDS: &[FieldRule] = &[
    FieldRule::required("timestamp", FieldType::Number),
    FieldRule::required("method", FieldType::String),
    FieldRule::required("host", FieldType::String),
    FieldRule::required("path", FieldType::String),
    FieldRule::required("userAgent", FieldType::StringArray),
    FieldRule::required("region", FieldType::String),
    FieldRule::optional("referer", FieldType::String),
    FieldRule::optional("statusCode", FieldType::Number),
    FieldRule::optional("clientIp", FieldType::String),
    FieldRule::optional("scheme", FieldType::String),
    FieldRule::optional("responseByteSize", FieldType::Number),
    FieldRule::optional("cacheId", FieldType::String),
    FieldRule::optional("pathType", FieldType::String),
    FieldRule::optional("pathTypeVariant", FieldType::String),
    FieldRule::optional("vercelId", FieldType::String),
    FieldRule::optional("vercelCache", FieldType::String),
    FieldRule::optional("lambdaRegion", FieldType::String),
    FieldRule::optional("wafAction", FieldType::String),
    FieldRule::optional("wafRuleId", FieldType::String),
];

/// Fields of one log event.
pub const LOG_EVENT_FIELDS: &[FieldRule] = &[
    FieldRule::required("id", FieldType::String),
    FieldRule::required("deploymentId", FieldType::String),
    FieldRule::required("source", FieldType::String),
    FieldRule::required("host", FieldType::String),
    FieldRule::required("timestamp", FieldType::Number),
    FieldRule::required("projectId", FieldType::String),
    FieldRule::optional("level", FieldType::String),
    FieldRule::optional("message", FieldType::String),
    FieldRule::optional("buildId", FieldType::String),
    FieldRule::optional("entrypoint", FieldType::String),
    FieldRule::optional("destination", FieldType::String),
    FieldRule::optional("path", FieldType::String),
    FieldRule::optional("type", FieldType::String),
    FieldRule::optional("statusCode", FieldType::Number),
    FieldRule::optional("requestId", FieldType::String),
    FieldRule::optional("environment", FieldType::String),
    FieldRule::optional("branch", FieldType::String),
    FieldRule::optional("ja3Digest", FieldType::String),
    FieldRule::optional("ja4Digest", FieldType::String),
    FieldRule::optional("edgeType", FieldType::String),
    FieldRule::optional("projectName", FieldType::String),
    FieldRule::optional("executionRegion", FieldType::String),
    FieldRule::optional("traceId", FieldType::String),
    FieldRule::optional("spanId", FieldType::String),
    FieldRule::optional("proxy", FieldType::Object(PROXY_FIELDS)),
];

/// One offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Element-qualified path, e.g. `[0].proxy.method`.
    pub field: String,
    pub reason: String,
}

impl ValidationIssue {
    fn missing(field: String) -> Self {
        let reason = format!("{} is required", field);
        Self { field, reason }
    }

    fn wrong_type(field: String, expected: &str, received: &Value) -> Self {
        let reason = format!(
            "{}: expected {}, received {}",
            field,
            expected,
            json_type_name(received)
        );
        Self { field, reason }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Why a batch was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("expected an array of log events, received {found}")]
    NotAnArray { found: &'static str },

    #[error("{}", join_issues(.issues))]
    SchemaViolation { issues: Vec<ValidationIssue> },
}

impl ValidationFailure {
    /// Single caller-facing message covering every issue.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationFailure::NotAnArray { .. } => &[],
            ValidationFailure::SchemaViolation { issues } => issues,
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.reason.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a decoded request body as a batch of log events.
///
/// Either every element passes and the typed batch is returned, or the
/// batch is rejected with all issues found.
pub fn validate_batch(input: &Value) -> Result<Vec<LogEvent>, ValidationFailure> {
    let elements = input.as_array().ok_or(ValidationFailure::NotAnArray {
        found: json_type_name(input),
    })?;

    let mut issues = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        check_value(element, LOG_EVENT_FIELDS, &format!("[{}]", index), &mut issues);
    }

    if !issues.is_empty() {
        log::debug!("SCHEMA_VIOLATIONS count={}", issues.len());
        return Err(ValidationFailure::SchemaViolation { issues });
    }

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            serde_json::from_value::<LogEvent>(element.clone()).map_err(|e| {
                ValidationFailure::SchemaViolation {
                    issues: vec![ValidationIssue {
                        field: format!("[{}]", index),
                        reason: format!("[{}]: {}", index, e),
                    }],
                }
            })
        })
        .collect()
}

/// Check that `value` is an object satisfying `rules`.
fn check_value(value: &Value, rules: &[FieldRule], path: &str, issues: &mut Vec<ValidationIssue>) {
    match value {
        Value::Object(obj) => check_object(obj, rules, path, issues),
        other => issues.push(ValidationIssue::wrong_type(path.to_string(), "object", other)),
    }
}

fn check_object(
    obj: &Map<String, Value>,
    rules: &[FieldRule],
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for rule in rules {
        let field_path = format!("{}.{}", path, rule.name);
        match obj.get(rule.name) {
            None if rule.required => issues.push(ValidationIssue::missing(field_path)),
            None => {}
            Some(value) => check_field(value, rule.field_type, field_path, issues),
        }
    }
}

fn check_field(
    value: &Value,
    field_type: FieldType,
    field_path: String,
    issues: &mut Vec<ValidationIssue>,
) {
    match (field_type, value) {
        (FieldType::String, Value::String(_)) | (FieldType::Number, Value::Number(_)) => {}
        (FieldType::StringArray, Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    issues.push(ValidationIssue::wrong_type(
                        format!("{}[{}]", field_path, i),
                        "string",
                        item,
                    ));
                }
            }
        }
        (FieldType::Object(sub_rules), Value::Object(obj)) => {
            check_object(obj, sub_rules, &field_path, issues)
        }
        (expected, other) => {
            issues.push(ValidationIssue::wrong_type(field_path, expected.as_str(), other))
        }
    }
}

/// JSON type name used in issue messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn valid_event(id: &str) -> Value {
        json!({
            "id": id,
            "deploymentId": "dpl_1",
            "source": "lambda",
            "host": "app.example.com",
            "timestamp": 1700000000,
            "projectId": "prj_1",
            "level": "warn"
        })
    }

    #[test]
    fn test_valid_batch() {
        let batch = json!([valid_event("1"), valid_event("2")]);
        let events = validate_batch(&batch).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id, "2");
        assert_eq!(events[0].level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_empty_array_is_an_empty_batch() {
        assert_eq!(validate_batch(&json!([])).unwrap().len(), 0);
    }

    #[test]
    fn test_not_an_array() {
        let err = validate_batch(&json!({"id": "1"})).unwrap_err();
        assert_eq!(err, ValidationFailure::NotAnArray { found: "object" });
        assert!(err.issues().is_empty());
    }

    #[test]
    fn test_missing_required_fields_are_all_listed() {
        let err = validate_batch(&json!([{"id": "1"}])).unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "[0].deploymentId",
                "[0].source",
                "[0].host",
                "[0].timestamp",
                "[0].projectId"
            ]
        );
        assert_eq!(
            err.message(),
            "[0].deploymentId is required, [0].source is required, [0].host is required, \
             [0].timestamp is required, [0].projectId is required"
        );
    }

    #[test]
    fn test_no_coercion() {
        let mut event = valid_event("1");
        event["timestamp"] = json!("1700000000");
        let err = validate_batch(&json!([event])).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(
            err.issues()[0].reason,
            "[0].timestamp: expected number, received string"
        );
    }

    #[test]
    fn test_null_is_a_type_error() {
        let mut event = valid_event("1");
        event["message"] = Value::Null;
        let err = validate_batch(&json!([event])).unwrap_err();
        assert_eq!(err.issues()[0].field, "[0].message");
    }

    #[test]
    fn test_one_bad_element_rejects_the_batch() {
        let batch = json!([valid_event("1"), valid_event("2"), 42]);
        let err = validate_batch(&batch).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].reason, "[2]: expected object, received number");
    }

    #[test]
    fn test_nested_proxy_shape() {
        let mut event = valid_event("1");
        event["proxy"] = json!({
            "timestamp": 1,
            "method": "GET",
            "host": "h",
            "userAgent": ["ok", 7],
            "region": "iad1"
        });
        let err = validate_batch(&json!([event])).unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["[0].proxy.path", "[0].proxy.userAgent[1]"]);
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let mut event = valid_event("1");
        event["extra"] = json!({"anything": true});
        let events = validate_batch(&json!([event])).unwrap();
        let canonical = serde_json::to_value(&events[0]).unwrap();
        assert!(canonical.get("extra").is_none());
    }

    fn non_array() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".*".prop_map(Value::String),
            ".*".prop_map(|s| json!({ "id": s })),
        ]
    }

    proptest! {
        #[test]
        fn prop_non_arrays_are_rejected(input in non_array()) {
            let is_not_an_array = matches!(
                validate_batch(&input),
                Err(ValidationFailure::NotAnArray { .. })
            );
            prop_assert!(is_not_an_array);
        }

        #[test]
        fn prop_valid_batches_keep_their_length(ids in proptest::collection::vec("[a-z0-9]{1,8}", 0..20)) {
            let batch = Value::Array(ids.iter().map(|id| valid_event(id)).collect());
            let events = validate_batch(&batch).unwrap();
            prop_assert_eq!(events.len(), ids.len());
        }

        #[test]
        fn prop_any_invalid_element_rejects_everything(
            len in 1usize..20,
            bad in any::<proptest::sample::Index>(),
            field in 0usize..6,
        ) {
            let bad = bad.index(len);
            let mut batch: Vec<Value> = (0..len).map(|i| valid_event(&i.to_string())).collect();
            let name = LOG_EVENT_FIELDS[field].name;
            batch[bad].as_object_mut().unwrap().remove(name);

            match validate_batch(&Value::Array(batch)) {
                Err(ValidationFailure::SchemaViolation { issues }) => {
                    prop_assert_eq!(issues.len(), 1);
                    prop_assert_eq!(&issues[0].field, &format!("[{}].{}", bad, name));
                }
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }
}
