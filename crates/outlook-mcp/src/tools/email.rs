//! Email MCP tools
//!
//! Sending mail and managing drafts in the signed-in user's mailbox.

use super::args::{
    collection, parse_args, recipients, require_id, require_text, success, validate_emails,
    BodyType, Importance,
};
use crate::clients::graph::{segment, GraphClient};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolGroup, ToolResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn recipient_list_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string", "format": "email"},
        "description": description
    })
}

fn content_type_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["HTML", "Text"],
        "default": "HTML",
        "description": "Format of the body content"
    })
}

fn importance_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["low", "normal", "high"],
        "default": "normal",
        "description": "Message importance"
    })
}

/// File attached to an outgoing message.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Attachment {
    name: String,
    content_type: Option<String>,
    /// Base64 encoded file content
    content_bytes: String,
}

impl Attachment {
    fn validate(&self) -> McpServerResult<()> {
        require_text("attachments.name", &self.name)?;
        require_text("attachments.content_bytes", &self.content_bytes)?;
        STANDARD.decode(self.content_bytes.trim()).map_err(|e| {
            McpServerError::InvalidParams(format!(
                "attachments.content_bytes of {:?} is not valid base64: {}",
                self.name, e
            ))
        })?;
        Ok(())
    }

    fn to_graph(&self) -> Value {
        let mut attachment = json!({
            "@odata.type": "#microsoft.graph.fileAttachment",
            "name": self.name,
            "contentBytes": self.content_bytes,
        });
        if let Some(content_type) = &self.content_type {
            attachment["contentType"] = json!(content_type);
        }
        attachment
    }
}

/// Fields shared by new messages and drafts.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewMessageParams {
    subject: String,
    content: String,
    to_recipients: Vec<String>,
    #[serde(default)]
    cc_recipients: Vec<String>,
    #[serde(default)]
    bcc_recipients: Vec<String>,
    #[serde(default)]
    content_type: BodyType,
    importance: Option<Importance>,
}

impl NewMessageParams {
    fn validate(&self) -> McpServerResult<()> {
        validate_emails("to_recipients", &self.to_recipients, true)?;
        validate_emails("cc_recipients", &self.cc_recipients, false)?;
        validate_emails("bcc_recipients", &self.bcc_recipients, false)
    }

    fn to_message(&self) -> Value {
        let mut message = json!({
            "subject": self.subject,
            "body": {
                "contentType": self.content_type,
                "content": self.content,
            },
            "toRecipients": recipients(&self.to_recipients),
        });
        if !self.cc_recipients.is_empty() {
            message["ccRecipients"] = recipients(&self.cc_recipients);
        }
        if !self.bcc_recipients.is_empty() {
            message["bccRecipients"] = recipients(&self.bcc_recipients);
        }
        if let Some(importance) = self.importance {
            message["importance"] = json!(importance);
        }
        message
    }
}

/// Tool to send an email immediately.
pub struct SendEmailTool {
    client: Arc<GraphClient>,
}

impl SendEmailTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SendEmailParams {
    subject: String,
    content: String,
    to_recipients: Vec<String>,
    #[serde(default)]
    cc_recipients: Vec<String>,
    #[serde(default)]
    bcc_recipients: Vec<String>,
    #[serde(default)]
    content_type: BodyType,
    importance: Option<Importance>,
    #[serde(default = "default_true")]
    save_to_sent: bool,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

impl SendEmailParams {
    fn into_parts(self) -> (NewMessageParams, bool, Vec<Attachment>) {
        let message = NewMessageParams {
            subject: self.subject,
            content: self.content,
            to_recipients: self.to_recipients,
            cc_recipients: self.cc_recipients,
            bcc_recipients: self.bcc_recipients,
            content_type: self.content_type,
            importance: self.importance,
        };
        (message, self.save_to_sent, self.attachments)
    }
}

fn default_true() -> bool {
    true
}

#[async_trait]
impl Tool for SendEmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_email", "Send an email from the user's mailbox")
            .with_group(ToolGroup::Email)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Email subject"},
                    "content": {"type": "string", "description": "Email body"},
                    "to_recipients": recipient_list_schema("Primary recipients"),
                    "cc_recipients": recipient_list_schema("CC recipients"),
                    "bcc_recipients": recipient_list_schema("BCC recipients"),
                    "content_type": content_type_schema(),
                    "save_to_sent": {
                        "type": "boolean",
                        "default": true,
                        "description": "Keep a copy in Sent Items"
                    },
                    "importance": importance_schema(),
                    "attachments": {
                        "type": "array",
                        "description": "File attachments",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "content_type": {"type": "string"},
                                "content_bytes": {
                                    "type": "string",
                                    "description": "Base64 encoded file content"
                                }
                            },
                            "required": ["name", "content_bytes"]
                        }
                    }
                },
                "required": ["subject", "content", "to_recipients"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_email"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SendEmailParams = parse_args(args)?;
        let (fields, save_to_sent, attachments) = params.into_parts();
        fields.validate()?;

        let mut message = fields.to_message();
        if !attachments.is_empty() {
            for attachment in &attachments {
                attachment.validate()?;
            }
            message["attachments"] =
                Value::Array(attachments.iter().map(Attachment::to_graph).collect());
        }

        let body = json!({
            "message": message,
            "saveToSentItems": save_to_sent,
        });

        self.client.post("/me/sendMail", Some(&body)).await?;
        info!("Email sent to {} recipient(s)", fields.to_recipients.len());

        Ok(success(json!({
            "status": "sent",
            "recipients": fields.to_recipients,
        })))
    }
}

/// Tool to create a draft message.
pub struct CreateDraftEmailTool {
    client: Arc<GraphClient>,
}

impl CreateDraftEmailTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateDraftEmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_draft_email", "Create a draft email in the Drafts folder")
            .with_group(ToolGroup::Email)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Email subject"},
                    "content": {"type": "string", "description": "Email body"},
                    "to_recipients": recipient_list_schema("Primary recipients"),
                    "cc_recipients": recipient_list_schema("CC recipients"),
                    "bcc_recipients": recipient_list_schema("BCC recipients"),
                    "content_type": content_type_schema(),
                    "importance": importance_schema()
                },
                "required": ["subject", "content", "to_recipients"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_draft_email"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: NewMessageParams = parse_args(args)?;
        params.validate()?;

        let draft = self
            .client
            .post("/me/messages", Some(&params.to_message()))
            .await?;

        debug!("Created draft {}", draft["id"]);
        Ok(success(draft))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DraftIdParams {
    draft_id: String,
}

/// Tool to send an existing draft.
pub struct SendDraftEmailTool {
    client: Arc<GraphClient>,
}

impl SendDraftEmailTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SendDraftEmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_draft_email", "Send a previously created draft")
            .with_group(ToolGroup::Email)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "draft_id": {"type": "string", "description": "ID of the draft to send"}
                },
                "required": ["draft_id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "send_draft_email"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DraftIdParams = parse_args(args)?;
        let draft_id = require_id("draft_id", &params.draft_id)?;

        self.client
            .post(&format!("/me/messages/{}/send", segment(draft_id)), None)
            .await?;

        Ok(success(json!({"status": "sent", "draft_id": draft_id})))
    }
}

/// Tool to list drafts.
pub struct GetDraftEmailsTool {
    client: Arc<GraphClient>,
}

impl GetDraftEmailsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

#[async_trait]
impl Tool for GetDraftEmailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_draft_emails", "List messages in the Drafts folder")
            .with_group(ToolGroup::Email)
            .with_schema(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let _: NoParams = parse_args(args)?;
        let drafts = self
            .client
            .get("/me/mailFolders/drafts/messages", &[])
            .await?;
        Ok(collection(drafts))
    }
}

/// Tool to change fields of a draft.
pub struct UpdateDraftEmailTool {
    client: Arc<GraphClient>,
}

impl UpdateDraftEmailTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateDraftParams {
    draft_id: String,
    subject: Option<String>,
    content: Option<String>,
    to_recipients: Option<Vec<String>>,
    cc_recipients: Option<Vec<String>>,
    bcc_recipients: Option<Vec<String>>,
    content_type: Option<BodyType>,
    importance: Option<Importance>,
}

impl UpdateDraftParams {
    fn to_patch(&self) -> McpServerResult<Map<String, Value>> {
        let mut patch = Map::new();

        if let Some(subject) = &self.subject {
            patch.insert("subject".into(), json!(subject));
        }
        match (&self.content, self.content_type) {
            (Some(content), content_type) => {
                patch.insert(
                    "body".into(),
                    json!({
                        "contentType": content_type.unwrap_or_default(),
                        "content": content,
                    }),
                );
            }
            (None, Some(_)) => {
                return Err(McpServerError::InvalidParams(
                    "content_type requires content".to_string(),
                ))
            }
            (None, None) => {}
        }
        for (field, key, list) in [
            ("to_recipients", "toRecipients", &self.to_recipients),
            ("cc_recipients", "ccRecipients", &self.cc_recipients),
            ("bcc_recipients", "bccRecipients", &self.bcc_recipients),
        ] {
            if let Some(list) = list {
                validate_emails(field, list, false)?;
                patch.insert(key.into(), recipients(list));
            }
        }
        if let Some(importance) = self.importance {
            patch.insert("importance".into(), json!(importance));
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
impl Tool for UpdateDraftEmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("update_draft_email", "Update subject, body or recipients of a draft")
            .with_group(ToolGroup::Email)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "draft_id": {"type": "string", "description": "ID of the draft to update"},
                    "subject": {"type": "string", "description": "New subject"},
                    "content": {"type": "string", "description": "New body"},
                    "to_recipients": recipient_list_schema("Replacement primary recipients"),
                    "cc_recipients": recipient_list_schema("Replacement CC recipients"),
                    "bcc_recipients": recipient_list_schema("Replacement BCC recipients"),
                    "content_type": content_type_schema(),
                    "importance": importance_schema()
                },
                "required": ["draft_id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "update_draft_email"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateDraftParams = parse_args(args)?;
        let draft_id = require_id("draft_id", &params.draft_id)?;
        let patch = Value::Object(params.to_patch()?);

        let draft = self
            .client
            .patch(&format!("/me/messages/{}", segment(draft_id)), &patch)
            .await?;
        Ok(success(draft))
    }
}

/// Tool to delete a draft.
pub struct DeleteDraftEmailTool {
    client: Arc<GraphClient>,
}

impl DeleteDraftEmailTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteDraftEmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_draft_email", "Delete a draft")
            .with_group(ToolGroup::Email)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "draft_id": {"type": "string", "description": "ID of the draft to delete"}
                },
                "required": ["draft_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DraftIdParams = parse_args(args)?;
        let draft_id = require_id("draft_id", &params.draft_id)?;

        self.client
            .delete(&format!("/me/messages/{}", segment(draft_id)))
            .await?;

        Ok(success(json!({"status": "deleted", "draft_id": draft_id})))
    }
}

/// Get all email tools.
pub fn email_tools(client: Arc<GraphClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SendEmailTool::new(client.clone())),
        Arc::new(CreateDraftEmailTool::new(client.clone())),
        Arc::new(SendDraftEmailTool::new(client.clone())),
        Arc::new(GetDraftEmailsTool::new(client.clone())),
        Arc::new(UpdateDraftEmailTool::new(client.clone())),
        Arc::new(DeleteDraftEmailTool::new(client)),
    ]
}
