//! Contact MCP tools
//!
//! CRUD over the signed-in user's personal contacts. Email addresses and
//! business phones are taken as comma-separated strings.

use super::args::{
    collection, non_blank, parse_args, require_id, require_text, split_list, success,
    validate_emails,
};
use crate::clients::graph::{segment, GraphClient};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolGroup, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Contact fields accepted by create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactFields {
    given_name: Option<String>,
    surname: Option<String>,
    email_addresses: Option<String>,
    business_phones: Option<String>,
    mobile_phone: Option<String>,
    job_title: Option<String>,
    company_name: Option<String>,
    department: Option<String>,
    office_location: Option<String>,
}

impl ContactFields {
    /// Map to Graph contact properties, skipping blank values.
    fn to_graph(&self) -> McpServerResult<Map<String, Value>> {
        let mut contact = Map::new();

        let scalars = [
            ("givenName", &self.given_name),
            ("surname", &self.surname),
            ("mobilePhone", &self.mobile_phone),
            ("jobTitle", &self.job_title),
            ("companyName", &self.company_name),
            ("department", &self.department),
            ("officeLocation", &self.office_location),
        ];
        for (key, value) in scalars {
            if let Some(value) = non_blank(value.clone()) {
                contact.insert(key.into(), json!(value.trim()));
            }
        }

        if let Some(emails) = non_blank(self.email_addresses.clone()) {
            let emails = split_list(&emails);
            validate_emails("email_addresses", &emails, false)?;
            contact.insert(
                "emailAddresses".into(),
                Value::Array(
                    emails
                        .iter()
                        .map(|address| json!({"address": address}))
                        .collect(),
                ),
            );
        }

        if let Some(phones) = non_blank(self.business_phones.clone()) {
            contact.insert("businessPhones".into(), json!(split_list(&phones)));
        }

        Ok(contact)
    }
}

fn contact_properties() -> Value {
    json!({
        "given_name": {"type": "string", "description": "First name"},
        "surname": {"type": "string", "description": "Last name"},
        "email_addresses": {
            "type": "string",
            "description": "Comma-separated email addresses"
        },
        "business_phones": {
            "type": "string",
            "description": "Comma-separated business phone numbers"
        },
        "mobile_phone": {"type": "string", "description": "Mobile phone number"},
        "job_title": {"type": "string", "description": "Job title"},
        "company_name": {"type": "string", "description": "Company name"},
        "department": {"type": "string", "description": "Department"},
        "office_location": {"type": "string", "description": "Office location"}
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactIdParams {
    contact_id: String,
}

/// Tool to create a contact.
pub struct CreateContactTool {
    client: Arc<GraphClient>,
}

impl CreateContactTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateContactTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_contact", "Create a new contact")
            .with_group(ToolGroup::Contacts)
            .with_schema(json!({
                "type": "object",
                "properties": contact_properties(),
                "required": ["given_name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_contact"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let fields: ContactFields = parse_args(args)?;
        let given_name = fields.given_name.as_deref().ok_or_else(|| {
            McpServerError::InvalidParams("missing field `given_name`".to_string())
        })?;
        require_text("given_name", given_name)?;

        let body = Value::Object(fields.to_graph()?);
        let contact = self.client.post("/me/contacts", Some(&body)).await?;

        info!("Created contact {}", contact["id"]);
        Ok(success(contact))
    }
}

/// Tool to list contacts.
pub struct GetAllContactsTool {
    client: Arc<GraphClient>,
}

impl GetAllContactsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

#[async_trait]
impl Tool for GetAllContactsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_all_contacts", "List the user's contacts")
            .with_group(ToolGroup::Contacts)
            .with_schema(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let _: NoParams = parse_args(args)?;
        let contacts = self.client.get("/me/contacts", &[]).await?;
        Ok(collection(contacts))
    }
}

/// Tool to fetch one contact.
pub struct GetContactDetailsTool {
    client: Arc<GraphClient>,
}

impl GetContactDetailsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetContactDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_contact_details", "Get all properties of a contact")
            .with_group(ToolGroup::Contacts)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "contact_id": {"type": "string", "description": "Contact ID"}
                },
                "required": ["contact_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ContactIdParams = parse_args(args)?;
        let contact_id = require_id("contact_id", &params.contact_id)?;

        let contact = self
            .client
            .get(&format!("/me/contacts/{}", segment(contact_id)), &[])
            .await?;
        Ok(success(contact))
    }
}

/// Tool to update a contact.
pub struct UpdateContactTool {
    client: Arc<GraphClient>,
}

impl UpdateContactTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateContactParams {
    contact_id: String,
    given_name: Option<String>,
    surname: Option<String>,
    email_addresses: Option<String>,
    business_phones: Option<String>,
    mobile_phone: Option<String>,
    job_title: Option<String>,
    company_name: Option<String>,
    department: Option<String>,
    office_location: Option<String>,
}

impl UpdateContactParams {
    fn split(self) -> (String, ContactFields) {
        let fields = ContactFields {
            given_name: self.given_name,
            surname: self.surname,
            email_addresses: self.email_addresses,
            business_phones: self.business_phones,
            mobile_phone: self.mobile_phone,
            job_title: self.job_title,
            company_name: self.company_name,
            department: self.department,
            office_location: self.office_location,
        };
        (self.contact_id, fields)
    }
}

#[async_trait]
impl Tool for UpdateContactTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = contact_properties();
        properties["contact_id"] = json!({"type": "string", "description": "Contact ID"});

        ToolDefinition::new("update_contact", "Update properties of a contact")
            .with_group(ToolGroup::Contacts)
            .with_schema(json!({
                "type": "object",
                "properties": properties,
                "required": ["contact_id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "update_contact"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateContactParams = parse_args(args)?;
        let (contact_id, fields) = params.split();
        let contact_id = require_id("contact_id", &contact_id)?;

        let patch = fields.to_graph()?;
        if patch.is_empty() {
            return Err(McpServerError::InvalidParams(
                "No fields to update".to_string(),
            ));
        }

        debug!("Updating {} contact field(s)", patch.len());
        let contact = self
            .client
            .patch(
                &format!("/me/contacts/{}", segment(contact_id)),
                &Value::Object(patch),
            )
            .await?;
        Ok(success(contact))
    }
}

/// Tool to delete a contact.
pub struct DeleteContactTool {
    client: Arc<GraphClient>,
}

impl DeleteContactTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteContactTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_contact", "Delete a contact")
            .with_group(ToolGroup::Contacts)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "contact_id": {"type": "string", "description": "Contact ID"}
                },
                "required": ["contact_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ContactIdParams = parse_args(args)?;
        let contact_id = require_id("contact_id", &params.contact_id)?;

        self.client
            .delete(&format!("/me/contacts/{}", segment(contact_id)))
            .await?;

        Ok(success(json!({"status": "deleted", "contact_id": contact_id})))
    }
}

/// Get all contact tools.
pub fn contact_tools(client: Arc<GraphClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateContactTool::new(client.clone())),
        Arc::new(GetAllContactsTool::new(client.clone())),
        Arc::new(GetContactDetailsTool::new(client.clone())),
        Arc::new(UpdateContactTool::new(client.clone())),
        Arc::new(DeleteContactTool::new(client)),
    ]
}
