//! Calendar MCP tools
//!
//! Calendars and events of the signed-in user. Event operations target the
//! default calendar unless a `calendar_id` is given.

use super::args::{
    collection, non_blank, parse_args, parse_datetime, require_id, require_text, success,
    validate_emails, BodyType,
};
use crate::clients::graph::{segment, GraphClient};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolGroup, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Graph calendar colors.
const CALENDAR_COLORS: &[&str] = &[
    "auto",
    "lightBlue",
    "lightGreen",
    "lightOrange",
    "lightGray",
    "lightYellow",
    "lightTeal",
    "lightPink",
    "lightBrown",
    "lightRed",
    "maxColor",
];

fn validate_color(color: &str) -> McpServerResult<()> {
    if CALENDAR_COLORS.contains(&color) {
        Ok(())
    } else {
        Err(McpServerError::InvalidParams(format!(
            "color must be one of {}, got {:?}",
            CALENDAR_COLORS.join(", "),
            color
        )))
    }
}

/// Events collection path, scoped to a calendar when one is given.
fn events_path(calendar_id: Option<&str>) -> McpServerResult<String> {
    match calendar_id {
        Some(id) => Ok(format!(
            "/me/calendars/{}/events",
            segment(require_id("calendar_id", id)?)
        )),
        None => Ok("/me/events".to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalendarIdParams {
    calendar_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventIdParams {
    event_id: String,
}

fn id_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {"type": "string", "description": description}
        },
        "required": [field]
    })
}

/// Tool to list calendars.
pub struct GetAllCalendarsTool {
    client: Arc<GraphClient>,
}

impl GetAllCalendarsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetAllCalendarsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_all_calendars", "List the user's calendars")
            .with_group(ToolGroup::Calendar)
            .with_schema(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let _: NoParams = parse_args(args)?;
        let calendars = self.client.get("/me/calendars", &[]).await?;
        Ok(collection(calendars))
    }
}

/// Tool to fetch one calendar.
pub struct GetCalendarDetailsTool {
    client: Arc<GraphClient>,
}

impl GetCalendarDetailsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetCalendarDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_calendar_details", "Get properties of a calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(id_schema("calendar_id", "Calendar ID"))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CalendarIdParams = parse_args(args)?;
        let calendar_id = require_id("calendar_id", &params.calendar_id)?;

        let calendar = self
            .client
            .get(&format!("/me/calendars/{}", segment(calendar_id)), &[])
            .await?;
        Ok(success(calendar))
    }
}

/// Tool to create a calendar.
pub struct CreateCalendarTool {
    client: Arc<GraphClient>,
}

impl CreateCalendarTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateCalendarParams {
    name: String,
    #[serde(default = "default_color")]
    color: String,
}

fn default_color() -> String {
    "auto".to_string()
}

#[async_trait]
impl Tool for CreateCalendarTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_calendar", "Create a new calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Calendar name"},
                    "color": {
                        "type": "string",
                        "enum": CALENDAR_COLORS,
                        "default": "auto",
                        "description": "Calendar color"
                    }
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_calendar"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateCalendarParams = parse_args(args)?;
        require_text("name", &params.name)?;
        validate_color(&params.color)?;

        let body = json!({"name": params.name, "color": params.color});
        let calendar = self.client.post("/me/calendars", Some(&body)).await?;

        info!("Created calendar {}", calendar["id"]);
        Ok(success(calendar))
    }
}

/// Tool to rename or recolor a calendar.
pub struct UpdateCalendarTool {
    client: Arc<GraphClient>,
}

impl UpdateCalendarTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateCalendarParams {
    calendar_id: String,
    name: Option<String>,
    color: Option<String>,
}

impl UpdateCalendarParams {
    fn to_patch(&self) -> McpServerResult<Map<String, Value>> {
        let mut patch = Map::new();
        if let Some(name) = non_blank(self.name.clone()) {
            patch.insert("name".into(), json!(name));
        }
        if let Some(color) = non_blank(self.color.clone()) {
            validate_color(&color)?;
            patch.insert("color".into(), json!(color));
        }
        if patch.is_empty() {
            return Err(McpServerError::InvalidParams(
                "No fields to update".to_string(),
            ));
        }
        Ok(patch)
    }
}

#[async_trait]
impl Tool for UpdateCalendarTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("update_calendar", "Update the name or color of a calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "calendar_id": {"type": "string", "description": "Calendar ID"},
                    "name": {"type": "string", "description": "New name"},
                    "color": {
                        "type": "string",
                        "enum": CALENDAR_COLORS,
                        "description": "New color"
                    }
                },
                "required": ["calendar_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateCalendarParams = parse_args(args)?;
        let calendar_id = require_id("calendar_id", &params.calendar_id)?;
        let patch = Value::Object(params.to_patch()?);

        let calendar = self
            .client
            .patch(&format!("/me/calendars/{}", segment(calendar_id)), &patch)
            .await?;
        Ok(success(calendar))
    }
}

/// Tool to delete a calendar.
pub struct DeleteCalendarTool {
    client: Arc<GraphClient>,
}

impl DeleteCalendarTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteCalendarTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_calendar", "Delete a calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(id_schema("calendar_id", "Calendar ID"))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CalendarIdParams = parse_args(args)?;
        let calendar_id = require_id("calendar_id", &params.calendar_id)?;

        self.client
            .delete(&format!("/me/calendars/{}", segment(calendar_id)))
            .await?;

        Ok(success(json!({"status": "deleted", "calendar_id": calendar_id})))
    }
}

/// Tool to list events, optionally within a time window.
pub struct GetAllEventsTool {
    client: Arc<GraphClient>,
}

impl GetAllEventsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetAllEventsParams {
    calendar_id: Option<String>,
    start_datetime: Option<String>,
    end_datetime: Option<String>,
}

impl GetAllEventsParams {
    /// OData `$filter` for the requested window, if any.
    fn filter(&self) -> McpServerResult<Option<String>> {
        let mut clauses = Vec::new();
        if let Some(start) = non_blank(self.start_datetime.clone()) {
            parse_datetime("start_datetime", &start)?;
            clauses.push(format!("start/dateTime ge '{}'", start.trim()));
        }
        if let Some(end) = non_blank(self.end_datetime.clone()) {
            parse_datetime("end_datetime", &end)?;
            clauses.push(format!("end/dateTime le '{}'", end.trim()));
        }
        if clauses.is_empty() {
            Ok(None)
        } else {
            Ok(Some(clauses.join(" and ")))
        }
    }
}

#[async_trait]
impl Tool for GetAllEventsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_all_events", "List events of the default or a given calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "calendar_id": {
                        "type": "string",
                        "description": "Calendar ID (default calendar when omitted)"
                    },
                    "start_datetime": {
                        "type": "string",
                        "description": "Only events starting at or after this time (YYYY-MM-DDTHH:MM:SS)"
                    },
                    "end_datetime": {
                        "type": "string",
                        "description": "Only events ending at or before this time (YYYY-MM-DDTHH:MM:SS)"
                    }
                }
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_all_events"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GetAllEventsParams = parse_args(args)?;
        let path = events_path(params.calendar_id.as_deref())?;

        let mut query = Vec::new();
        if let Some(filter) = params.filter()? {
            debug!("Filtering events: {}", filter);
            query.push(("$filter", filter));
        }

        let events = self.client.get(&path, &query).await?;
        Ok(collection(events))
    }
}

/// Tool to fetch one event.
pub struct GetEventDetailsTool {
    client: Arc<GraphClient>,
}

impl GetEventDetailsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetEventDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_event_details", "Get all properties of an event")
            .with_group(ToolGroup::Calendar)
            .with_schema(id_schema("event_id", "Event ID"))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: EventIdParams = parse_args(args)?;
        let event_id = require_id("event_id", &params.event_id)?;

        let event = self
            .client
            .get(&format!("/me/events/{}", segment(event_id)), &[])
            .await?;
        Ok(success(event))
    }
}

/// Tool to create an event.
pub struct CreateEventTool {
    client: Arc<GraphClient>,
}

impl CreateEventTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateEventParams {
    subject: String,
    start_datetime: String,
    end_datetime: String,
    #[serde(default = "default_timezone")]
    start_timezone: String,
    #[serde(default = "default_timezone")]
    end_timezone: String,
    #[serde(default)]
    body_content: String,
    #[serde(default)]
    body_content_type: BodyType,
    location: Option<String>,
    #[serde(default)]
    attendees: Vec<String>,
    calendar_id: Option<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl CreateEventParams {
    fn validate(&self) -> McpServerResult<()> {
        require_text("subject", &self.subject)?;
        require_text("start_timezone", &self.start_timezone)?;
        require_text("end_timezone", &self.end_timezone)?;

        let start = parse_datetime("start_datetime", &self.start_datetime)?;
        let end = parse_datetime("end_datetime", &self.end_datetime)?;
        let same_zone = self.start_timezone == self.end_timezone;
        if end.is_before(&start, same_zone) == Some(true) {
            return Err(McpServerError::InvalidParams(
                "end_datetime must not be before start_datetime".to_string(),
            ));
        }

        validate_emails("attendees", &self.attendees, false)
    }

    fn to_event(&self) -> Value {
        let mut event = json!({
            "subject": self.subject,
            "body": {
                "contentType": self.body_content_type,
                "content": self.body_content,
            },
            "start": {
                "dateTime": self.start_datetime.trim(),
                "timeZone": self.start_timezone,
            },
            "end": {
                "dateTime": self.end_datetime.trim(),
                "timeZone": self.end_timezone,
            },
        });

        if let Some(location) = non_blank(self.location.clone()) {
            event["location"] = json!({"displayName": location});
        }

        if !self.attendees.is_empty() {
            event["attendees"] = Value::Array(
                self.attendees
                    .iter()
                    .map(|address| {
                        json!({
                            "emailAddress": {"address": address},
                            "type": "required"
                        })
                    })
                    .collect(),
            );
        }

        event
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_event", "Create an event in the default or a given calendar")
            .with_group(ToolGroup::Calendar)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Event title"},
                    "start_datetime": {
                        "type": "string",
                        "description": "Start time (YYYY-MM-DDTHH:MM:SS)"
                    },
                    "end_datetime": {
                        "type": "string",
                        "description": "End time (YYYY-MM-DDTHH:MM:SS)"
                    },
                    "start_timezone": {"type": "string", "default": "UTC"},
                    "end_timezone": {"type": "string", "default": "UTC"},
                    "body_content": {"type": "string", "default": "", "description": "Event description"},
                    "body_content_type": {
                        "type": "string",
                        "enum": ["HTML", "Text"],
                        "default": "HTML"
                    },
                    "location": {"type": "string", "description": "Location display name"},
                    "attendees": {
                        "type": "array",
                        "items": {"type": "string", "format": "email"},
                        "description": "Required attendees"
                    },
                    "calendar_id": {
                        "type": "string",
                        "description": "Calendar ID (default calendar when omitted)"
                    }
                },
                "required": ["subject", "start_datetime", "end_datetime"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_event"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateEventParams = parse_args(args)?;
        params.validate()?;
        let path = events_path(params.calendar_id.as_deref())?;

        let event = self.client.post(&path, Some(&params.to_event())).await?;

        info!("Created event {}", event["id"]);
        Ok(success(event))
    }
}

/// Tool to delete an event.
pub struct DeleteEventTool {
    client: Arc<GraphClient>,
}

impl DeleteEventTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_event", "Delete an event")
            .with_group(ToolGroup::Calendar)
            .with_schema(id_schema("event_id", "Event ID"))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: EventIdParams = parse_args(args)?;
        let event_id = require_id("event_id", &params.event_id)?;

        self.client
            .delete(&format!("/me/events/{}", segment(event_id)))
            .await?;

        Ok(success(json!({"status": "deleted", "event_id": event_id})))
    }
}

/// Get all calendar tools.
pub fn calendar_tools(client: Arc<GraphClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetAllCalendarsTool::new(client.clone())),
        Arc::new(GetCalendarDetailsTool::new(client.clone())),
        Arc::new(CreateCalendarTool::new(client.clone())),
        Arc::new(UpdateCalendarTool::new(client.clone())),
        Arc::new(DeleteCalendarTool::new(client.clone())),
        Arc::new(GetAllEventsTool::new(client.clone())),
        Arc::new(GetEventDetailsTool::new(client.clone())),
        Arc::new(CreateEventTool::new(client.clone())),
        Arc::new(DeleteEventTool::new(client)),
    ]
}
