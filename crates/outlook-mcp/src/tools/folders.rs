//! Mail folder MCP tools

use super::args::{collection, collection_items, parse_args, require_id, require_text, success};
use crate::clients::graph::{segment, GraphClient};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolGroup, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn folder_path(folder_id: &str) -> String {
    format!("/me/mailFolders/{}", segment(folder_id))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FolderIdParams {
    folder_id: String,
}

/// Tool to list top-level mail folders.
pub struct GetAllFoldersTool {
    client: Arc<GraphClient>,
}

impl GetAllFoldersTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetAllFoldersParams {
    #[serde(default)]
    include_child_folders: bool,
}

#[async_trait]
impl Tool for GetAllFoldersTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_all_folders", "List the user's mail folders")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "include_child_folders": {
                        "type": "boolean",
                        "default": false,
                        "description": "Attach each folder's direct child folders as childFolders"
                    }
                }
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_all_folders"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GetAllFoldersParams = parse_args(args)?;
        let mut folders = self.client.get("/me/mailFolders", &[]).await?;

        if !params.include_child_folders {
            return Ok(collection(folders));
        }

        if let Some(Value::Array(items)) = folders.get_mut("value") {
            for folder in items.iter_mut() {
                let Some(id) = folder.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let children = self
                    .client
                    .get(&format!("{}/childFolders", folder_path(id)), &[])
                    .await?;
                let children = collection_items(children);
                if !children.is_empty() {
                    folder["childFolders"] = Value::Array(children);
                }
            }
            debug!("Expanded child folders of {} folder(s)", items.len());
        }

        Ok(collection(folders))
    }
}

/// Tool to fetch one folder.
pub struct GetFolderDetailsTool {
    client: Arc<GraphClient>,
}

impl GetFolderDetailsTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetFolderDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_folder_details", "Get properties of a mail folder")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "folder_id": {
                        "type": "string",
                        "description": "Folder ID or well-known name (e.g. inbox)"
                    }
                },
                "required": ["folder_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: FolderIdParams = parse_args(args)?;
        let folder_id = require_id("folder_id", &params.folder_id)?;

        let folder = self.client.get(&folder_path(folder_id), &[]).await?;
        Ok(success(folder))
    }
}

/// Tool to create a folder, optionally under a parent.
pub struct CreateFolderTool {
    client: Arc<GraphClient>,
}

impl CreateFolderTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateFolderParams {
    display_name: String,
    parent_folder_id: Option<String>,
}

impl CreateFolderParams {
    fn path(&self) -> McpServerResult<String> {
        match self.parent_folder_id.as_deref() {
            Some(parent) => Ok(format!(
                "{}/childFolders",
                folder_path(require_id("parent_folder_id", parent)?)
            )),
            None => Ok("/me/mailFolders".to_string()),
        }
    }
}

#[async_trait]
impl Tool for CreateFolderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_folder", "Create a mail folder")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "display_name": {"type": "string", "description": "Folder name"},
                    "parent_folder_id": {
                        "type": "string",
                        "description": "Parent folder ID (top level when omitted)"
                    }
                },
                "required": ["display_name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "create_folder"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateFolderParams = parse_args(args)?;
        require_text("display_name", &params.display_name)?;
        let path = params.path()?;

        let body = json!({"displayName": params.display_name});
        let folder = self.client.post(&path, Some(&body)).await?;

        info!("Created folder {}", folder["id"]);
        Ok(success(folder))
    }
}

/// Tool to rename a folder.
pub struct UpdateFolderTool {
    client: Arc<GraphClient>,
}

impl UpdateFolderTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateFolderParams {
    folder_id: String,
    display_name: String,
}

#[async_trait]
impl Tool for UpdateFolderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("update_folder", "Rename a mail folder")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "folder_id": {"type": "string", "description": "Folder ID"},
                    "display_name": {"type": "string", "description": "New folder name"}
                },
                "required": ["folder_id", "display_name"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateFolderParams = parse_args(args)?;
        let folder_id = require_id("folder_id", &params.folder_id)?;
        require_text("display_name", &params.display_name)?;

        let folder = self
            .client
            .patch(
                &folder_path(folder_id),
                &json!({"displayName": params.display_name}),
            )
            .await?;
        Ok(success(folder))
    }
}

/// Tool to delete a folder.
pub struct DeleteFolderTool {
    client: Arc<GraphClient>,
}

impl DeleteFolderTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteFolderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("delete_folder", "Delete a mail folder")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "folder_id": {"type": "string", "description": "Folder ID"}
                },
                "required": ["folder_id"]
            }))
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: FolderIdParams = parse_args(args)?;
        let folder_id = require_id("folder_id", &params.folder_id)?;

        self.client.delete(&folder_path(folder_id)).await?;

        Ok(success(json!({"status": "deleted", "folder_id": folder_id})))
    }
}

/// Tool to fetch several folders by ID.
///
/// Folders are fetched one after another; the first failure aborts the call.
pub struct GetManyFoldersTool {
    client: Arc<GraphClient>,
}

impl GetManyFoldersTool {
    /// Create the tool.
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetManyFoldersParams {
    folder_ids: Vec<String>,
}

#[async_trait]
impl Tool for GetManyFoldersTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_many_folders", "Get properties of several mail folders")
            .with_group(ToolGroup::Folders)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "folder_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1,
                        "description": "Folder IDs to fetch"
                    }
                },
                "required": ["folder_ids"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "get_many_folders"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GetManyFoldersParams = parse_args(args)?;
        if params.folder_ids.is_empty() {
            return Err(McpServerError::InvalidParams(
                "folder_ids must contain at least one ID".to_string(),
            ));
        }
        let ids = params
            .folder_ids
            .iter()
            .map(|id| require_id("folder_ids", id))
            .collect::<McpServerResult<Vec<_>>>()?;

        let mut folders = Vec::with_capacity(ids.len());
        for id in ids {
            folders.push(self.client.get(&folder_path(id), &[]).await?);
        }

        Ok(success(Value::Array(folders)))
    }
}

/// Get all folder tools.
pub fn folder_tools(client: Arc<GraphClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetAllFoldersTool::new(client.clone())),
        Arc::new(GetFolderDetailsTool::new(client.clone())),
        Arc::new(CreateFolderTool::new(client.clone())),
        Arc::new(UpdateFolderTool::new(client.clone())),
        Arc::new(DeleteFolderTool::new(client.clone())),
        Arc::new(GetManyFoldersTool::new(client)),
    ]
}
