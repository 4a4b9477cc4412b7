//! Argument validation and result shaping shared by the Outlook tools.

use crate::server::{McpServerError, McpServerResult};
use crate::types::ToolResult;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Local ISO 8601 datetime as Graph expects in `dateTimeTimeZone`.
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Deserialize tool arguments, mapping serde failures to invalid params.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> McpServerResult<T> {
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// Reject blank IDs before they end up in a URL path.
pub fn require_id<'a>(field: &str, value: &'a str) -> McpServerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(McpServerError::InvalidParams(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(trimmed)
}

/// Reject a blank required text field.
pub fn require_text(field: &str, value: &str) -> McpServerResult<()> {
    require_id(field, value).map(|_| ())
}

/// Empty strings count as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loose email address check: one `@`, non-empty local part and domain,
/// no whitespace.
pub fn is_valid_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Validate a list of email addresses.
pub fn validate_emails(field: &str, addresses: &[String], required: bool) -> McpServerResult<()> {
    if required && addresses.is_empty() {
        return Err(McpServerError::InvalidParams(format!(
            "{} must contain at least one address",
            field
        )));
    }
    if let Some(bad) = addresses.iter().find(|a| !is_valid_email(a)) {
        return Err(McpServerError::InvalidParams(format!(
            "{} contains an invalid email address: {:?}",
            field, bad
        )));
    }
    Ok(())
}

/// A datetime argument, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// Wall-clock time, interpreted in a separately given time zone.
    Local(NaiveDateTime),
    /// RFC 3339 instant.
    Offset(DateTime<FixedOffset>),
}

impl EventTime {
    /// Whether `self` is strictly before `other`.
    ///
    /// Two offset times compare as instants. Two local times compare as wall
    /// clock, which only means something when `same_zone` holds. Mixed forms
    /// cannot be ordered.
    pub fn is_before(&self, other: &EventTime, same_zone: bool) -> Option<bool> {
        match (self, other) {
            (EventTime::Offset(a), EventTime::Offset(b)) => Some(a < b),
            (EventTime::Local(a), EventTime::Local(b)) if same_zone => Some(a < b),
            _ => None,
        }
    }
}

/// Parse a local ISO 8601 or RFC 3339 datetime.
pub fn parse_datetime(field: &str, value: &str) -> McpServerResult<EventTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, LOCAL_DATETIME_FORMAT)
        .map(EventTime::Local)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(EventTime::Offset))
        .map_err(|_| {
            McpServerError::InvalidParams(format!(
                "{} must be an ISO 8601 datetime (YYYY-MM-DDTHH:MM:SS), got {:?}",
                field, value
            ))
        })
}

/// Graph recipient list.
pub fn recipients(addresses: &[String]) -> Value {
    Value::Array(
        addresses
            .iter()
            .map(|address| json!({"emailAddress": {"address": address}}))
            .collect(),
    )
}

/// Body content type of messages and events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    #[default]
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "Text")]
    Text,
}

/// Message importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Normal,
    High,
}

/// Successful tool result: `{"result": value, "error": null}`.
pub fn success(result: Value) -> ToolResult {
    ToolResult::json(json!({
        "result": result,
        "error": null,
    }))
}

/// Successful result for a Graph collection.
///
/// Items of `value` pass through unchanged. A paging cursor is reported as
/// `next_link` but not followed.
pub fn collection(mut response: Value) -> ToolResult {
    let items = response
        .get_mut("value")
        .map(Value::take)
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let mut envelope = json!({
        "result": items,
        "error": null,
    });

    if let Some(next) = response.get("@odata.nextLink").and_then(Value::as_str) {
        envelope["next_link"] = json!(next);
    }

    ToolResult::json(envelope)
}

/// Items of a Graph collection response.
pub fn collection_items(mut response: Value) -> Vec<Value> {
    match response.get_mut("value").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        #[allow(dead_code)]
        name: String,
    }

    fn payload(result: &ToolResult) -> Value {
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_args_rejects_unknown_and_missing() {
        assert!(parse_args::<Sample>(json!({"name": "x"})).is_ok());
        assert!(matches!(
            parse_args::<Sample>(json!({"name": "x", "extra": 1})),
            Err(McpServerError::InvalidParams(_))
        ));
        assert!(matches!(
            parse_args::<Sample>(json!({})),
            Err(McpServerError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("draft_id", " AAMk ").unwrap(), "AAMk");
        assert!(require_id("draft_id", "   ").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("john@x.com"));
        assert!(is_valid_email("ops@localhost"));
        assert!(!is_valid_email("john"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("john@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("john doe@x.com"));

        assert!(validate_emails("to_recipients", &[], true).is_err());
        assert!(validate_emails("cc_recipients", &[], false).is_ok());
        assert!(validate_emails("to_recipients", &["bad".to_string()], true).is_err());
    }

    #[test]
    fn test_parse_datetime() {
        assert!(parse_datetime("start", "2024-03-01T09:00:00").is_ok());
        assert!(parse_datetime("start", "2024-03-01T09:00:00.500").is_ok());
        assert!(parse_datetime("start", "2024-03-01T09:00:00Z").is_ok());
        assert!(parse_datetime("start", "2024-03-01T09:00:00+02:00").is_ok());
        assert!(parse_datetime("start", "tomorrow").is_err());
        assert!(parse_datetime("start", "2024-03-01").is_err());
    }

    #[test]
    fn test_event_time_ordering() {
        let at = |s: &str| parse_datetime("t", s).unwrap();

        // 10:00+02:00 is 08:00Z, an hour before 09:00Z.
        assert_eq!(
            at("2024-03-01T10:00:00+02:00").is_before(&at("2024-03-01T09:00:00Z"), false),
            Some(true)
        );
        assert_eq!(
            at("2024-03-01T10:00:00").is_before(&at("2024-03-01T09:00:00"), true),
            Some(false)
        );
        assert_eq!(
            at("2024-03-01T10:00:00").is_before(&at("2024-03-01T09:00:00"), false),
            None
        );
        assert_eq!(
            at("2024-03-01T10:00:00").is_before(&at("2024-03-01T09:00:00Z"), true),
            None
        );
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a@x.com, b@x.com,,"), vec!["a@x.com", "b@x.com"]);
        assert!(split_list(" ").is_empty());
    }

    #[test]
    fn test_body_type_names() {
        assert_eq!(serde_json::to_value(BodyType::Html).unwrap(), "HTML");
        let parsed: BodyType = serde_json::from_value(json!("Text")).unwrap();
        assert_eq!(parsed, BodyType::Text);
        assert!(serde_json::from_value::<BodyType>(json!("markdown")).is_err());
        assert!(serde_json::from_value::<Importance>(json!("urgent")).is_err());
    }

    #[test]
    fn test_collection_keeps_items_and_next_link() {
        let result = collection(json!({
            "@odata.context": "ctx",
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/contacts?$skip=10",
            "value": [{"id": "1", "displayName": "A", "extra": {"x": 1}}]
        }));

        let body = payload(&result);
        assert_eq!(body["result"][0]["extra"]["x"], 1);
        assert!(body["error"].is_null());
        assert!(body["next_link"].as_str().unwrap().ends_with("$skip=10"));
    }

    #[test]
    fn test_collection_without_value() {
        let body = payload(&collection(Value::Null));
        assert_eq!(body["result"], json!([]));
        assert!(body.get("next_link").is_none());
    }
}
