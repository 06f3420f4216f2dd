use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::info;

use crate::fields;
use crate::models::NormalizedRecord;

/// Closed classification of the field shapes the source API emits. Every
/// projection matches on this instead of probing the JSON structurally at the
/// call site.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Scalar(String),
    /// Wrapped enum such as status or priority: `{"name": "..."}`.
    Named(String),
    /// User reference: `{"displayName": "..."}` with the name possibly absent.
    UserRef(Option<String>),
    /// Two-level categorical: `{"value": "...", "child": {"value": "..."}}`.
    Cascading {
        parent: Option<String>,
        child: Option<String>,
    },
    MultiSelect(Vec<Value>),
    /// Anything else object-shaped, e.g. SLA cycle state. Kept as-is.
    Opaque(Value),
}

impl FieldValue {
    pub fn classify(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::String(s) => FieldValue::Scalar(s.clone()),
            Value::Number(n) => FieldValue::Scalar(n.to_string()),
            Value::Bool(b) => FieldValue::Scalar(b.to_string()),
            Value::Array(items) => FieldValue::MultiSelect(items.clone()),
            Value::Object(map) => {
                if map.contains_key("displayName") {
                    let name = map
                        .get("displayName")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    FieldValue::UserRef(name)
                } else if map.contains_key("value") {
                    let parent = map
                        .get("value")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    let child = map
                        .get("child")
                        .and_then(|c| c.get("value"))
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    FieldValue::Cascading { parent, child }
                } else if let Some(name) = map.get("name").and_then(Value::as_str) {
                    FieldValue::Named(name.to_string())
                } else {
                    FieldValue::Opaque(value.clone())
                }
            }
        }
    }
}

pub fn user_display_name(value: &Value) -> Option<String> {
    match FieldValue::classify(value) {
        FieldValue::UserRef(name) => name,
        _ => None,
    }
}

pub fn cascading_label(value: &Value) -> Option<String> {
    match FieldValue::classify(value) {
        FieldValue::Cascading {
            parent: Some(parent),
            child: Some(child),
        } => Some(format!("{parent} > {child}")),
        FieldValue::Cascading {
            parent: Some(parent),
            child: None,
        } => Some(parent),
        _ => None,
    }
}

pub fn multi_select_values(value: &Value) -> Option<Vec<String>> {
    let items = match FieldValue::classify(value) {
        FieldValue::MultiSelect(items) => items,
        _ => return None,
    };
    let values: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Re-renders any parseable date as `YYYY-MM-DD` in UTC. Values that already
/// look like a bare date pass through; everything else is null.
pub fn to_date_only(value: &str) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }
    // Source timestamps use a colon-less offset, e.g. 2025-03-05T10:00:00.000+0100.
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Some(value.to_string());
    }
    None
}

pub fn date_only(value: &Value) -> Option<String> {
    value.as_str().and_then(to_date_only)
}

/// Serializes an opaque field to a JSON string, deferring interpretation to
/// downstream consumers. Degrades to null instead of failing.
pub fn opaque_json(value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(err) => {
            info!(error = %err, "dropping unserializable field value");
            None
        }
    }
}

/// `.name` projection for wrapped enums, raw string passthrough otherwise.
pub fn named_value(value: &Value) -> Option<String> {
    match FieldValue::classify(value) {
        FieldValue::Named(name) => Some(name),
        FieldValue::Scalar(s) => Some(s),
        _ => None,
    }
}

pub fn scalar_value(value: &Value) -> Option<String> {
    match FieldValue::classify(value) {
        FieldValue::Scalar(s) => Some(s),
        _ => None,
    }
}

/// Maps one raw issue into one flat record. Total over field contents: absent
/// or malformed fields degrade to null. Returns `None` only when the issue has
/// no key, since such a record can never be merged.
pub fn normalize(raw: &Value) -> Option<NormalizedRecord> {
    let key = raw
        .get("key")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())?
        .to_string();

    static NULL: Value = Value::Null;
    let fields = raw.get("fields").unwrap_or(&NULL);
    let field = |name: &str| fields.get(name).unwrap_or(&NULL);

    Some(NormalizedRecord {
        key,
        summary: scalar_value(field(fields::SUMMARY)),
        description: scalar_value(field(fields::DESCRIPTION)),
        issue_type: named_value(field(fields::ISSUE_TYPE)),
        status: named_value(field(fields::STATUS)),
        priority: named_value(field(fields::PRIORITY)),
        resolution: named_value(field(fields::RESOLUTION)),
        created: scalar_value(field(fields::CREATED)),
        updated: scalar_value(field(fields::UPDATED)),
        resolved: scalar_value(field(fields::RESOLVED)),
        assignee: user_display_name(field(fields::ASSIGNEE)),
        reporter: user_display_name(field(fields::REPORTER)),
        operational_categorization: cascading_label(field(fields::OPERATIONAL_CATEGORIZATION)),
        linked_intercom_conversation_ids: scalar_value(field(fields::INTERCOM_CONVERSATION_IDS)),
        team: multi_select_values(field(fields::TEAM)),
        filiale: multi_select_values(field(fields::FILIALE)),
        start_date: date_only(field(fields::START_DATE)),
        ttr_raw_json: opaque_json(field(fields::TTR)),
        tffr_raw_json: opaque_json(field(fields::TFFR)),
    })
}
