//! End-to-End tests for the Outlook MCP tools.
//!
//! A wiremock server stands in for Microsoft Graph (and, where token
//! acquisition is under test, for the Nango broker). Tools are driven through
//! `McpServer` exactly as a stdio client would drive them.

use outlook_connect::{NangoConfig, NangoConnection, StaticToken, TokenCachePolicy};
use outlook_mcp::clients::{GraphClient, GraphEndpoint};
use outlook_mcp::{outlook_tools, McpRequest, McpServer, RequestId, ToolContext};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture: a mock Graph server and an MCP server wired to it.
struct TestFixture {
    /// Mock Graph server.
    graph: MockServer,
    /// Server with all Outlook tools registered.
    server: McpServer,
}

impl TestFixture {
    async fn new() -> Self {
        let graph = MockServer::start().await;
        let server = server_for(&graph, Arc::new(StaticToken::new("test-token"))).await;
        Self { graph, server }
    }

    /// Call a tool and decode the JSON payload of its result.
    async fn call(&self, name: &str, arguments: Value) -> (bool, Value) {
        let result = self
            .server
            .call_tool(name, arguments, &ToolContext::empty())
            .await;

        let result = match result {
            Ok(result) => result,
            Err(e) => e.to_tool_result(),
        };

        let payload = serde_json::from_str(result.first_text().unwrap()).unwrap();
        (result.is_error, payload)
    }
}

async fn server_for(
    graph: &MockServer,
    tokens: Arc<dyn outlook_connect::TokenProvider>,
) -> McpServer {
    let client = GraphClient::new(reqwest::Client::new(), GraphEndpoint::new(graph.uri()), tokens);
    let server = McpServer::outlook();
    server.register_tools(outlook_tools(Arc::new(client))).await;
    server
}

// ============================================================================
// Contacts
// ============================================================================

#[tokio::test]
async fn test_create_contact_posts_mapped_fields() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/contacts"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "givenName": "John",
            "surname": "Doe",
            "emailAddresses": [{"address": "john@x.com"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "AAMkContact1",
            "givenName": "John",
            "surname": "Doe"
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "create_contact",
            json!({"given_name": "John", "surname": "Doe", "email_addresses": "john@x.com"}),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["id"], "AAMkContact1");
    assert!(payload["error"].is_null());
}

#[tokio::test]
async fn test_contact_not_found_surfaces_graph_error() {
    let fixture = TestFixture::new().await;

    let graph_error = json!({
        "error": {"code": "ErrorItemNotFound", "message": "The specified object was not found in the store."}
    });

    Mock::given(method("GET"))
        .and(path("/me/contacts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(graph_error.clone()))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("get_contact_details", json!({"contact_id": "missing"}))
        .await;

    assert!(is_error);
    assert!(payload["result"].is_null());
    assert_eq!(payload["error"]["kind"], "graph_api");
    assert_eq!(payload["error"]["status"], 404);
    assert_eq!(payload["error"]["body"], graph_error);
}

#[tokio::test]
async fn test_get_all_contacts_passes_items_through() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/contacts?$skip=10",
            "value": [
                {"id": "c1", "displayName": "Ada", "categories": ["Blue"]},
                {"id": "c2", "displayName": "Grace", "birthday": null}
            ]
        })))
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture.call("get_all_contacts", json!({})).await;

    assert!(!is_error);
    assert_eq!(payload["result"].as_array().unwrap().len(), 2);
    assert_eq!(payload["result"][0]["categories"], json!(["Blue"]));
    assert!(payload["result"][1].get("birthday").is_some());
    assert!(payload["next_link"].as_str().unwrap().contains("$skip=10"));
}

// ============================================================================
// Email
// ============================================================================

#[tokio::test]
async fn test_send_email_without_recipients_sends_nothing() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/sendMail"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("send_email", json!({"subject": "Hi", "content": "Body"}))
        .await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_send_email_with_attachment() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/sendMail"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "send_email",
            json!({
                "subject": "Q4 review",
                "content": "<p>Attached.</p>",
                "to_recipients": ["cfo@x.com"],
                "cc_recipients": ["team@x.com"],
                "save_to_sent": false,
                "attachments": [{
                    "name": "q4.pdf",
                    "content_type": "application/pdf",
                    "content_bytes": "JVBERi0xLjQ="
                }]
            }),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["status"], "sent");
    assert_eq!(payload["result"]["recipients"], json!(["cfo@x.com"]));

    let requests = fixture.graph.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["saveToSentItems"], false);
    assert_eq!(body["message"]["body"]["contentType"], "HTML");
    assert_eq!(
        body["message"]["ccRecipients"][0]["emailAddress"]["address"],
        "team@x.com"
    );
    assert_eq!(
        body["message"]["attachments"][0]["@odata.type"],
        "#microsoft.graph.fileAttachment"
    );
}

#[tokio::test]
async fn test_send_draft_and_delete_draft() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/messages/draft-1/send"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/me/messages/draft-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("send_draft_email", json!({"draft_id": "draft-1"}))
        .await;
    assert!(!is_error);
    assert_eq!(payload["result"], json!({"status": "sent", "draft_id": "draft-1"}));

    let (is_error, payload) = fixture
        .call("delete_draft_email", json!({"draft_id": "draft-2"}))
        .await;
    assert!(!is_error);
    assert_eq!(
        payload["result"],
        json!({"status": "deleted", "draft_id": "draft-2"})
    );
}

// ============================================================================
// Calendar
// ============================================================================

#[tokio::test]
async fn test_get_all_events_applies_window_filter() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/calendars/cal-1/events"))
        .and(query_param(
            "$filter",
            "start/dateTime ge '2024-03-01T00:00:00' and end/dateTime le '2024-03-08T00:00:00'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "e1", "subject": "Planning"}]
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "get_all_events",
            json!({
                "calendar_id": "cal-1",
                "start_datetime": "2024-03-01T00:00:00",
                "end_datetime": "2024-03-08T00:00:00"
            }),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"][0]["subject"], "Planning");
}

#[tokio::test]
async fn test_create_event_rejects_reversed_window() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "create_event",
            json!({
                "subject": "Retro",
                "start_datetime": "2024-03-01T15:00:00",
                "end_datetime": "2024-03-01T14:00:00"
            }),
        )
        .await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_create_calendar_defaults_color() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/calendars"))
        .and(body_json(json!({"name": "Travel", "color": "auto"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "cal-9", "name": "Travel"})),
        )
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture.call("create_calendar", json!({"name": "Travel"})).await;
    assert!(!is_error);
    assert_eq!(payload["result"]["id"], "cal-9");
}

// ============================================================================
// Folders
// ============================================================================

#[tokio::test]
async fn test_get_many_folders_stops_at_first_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/f1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "f1", "displayName": "A"})),
        )
        .expect(1)
        .mount(&fixture.graph)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/f2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "ErrorItemNotFound"}
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/f3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "f3"})))
        .expect(0)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("get_many_folders", json!({"folder_ids": ["f1", "f2", "f3"]}))
        .await;

    assert!(is_error);
    assert!(payload["result"].is_null());
    assert_eq!(payload["error"]["status"], 404);
}

#[tokio::test]
async fn test_get_all_folders_with_children() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "inbox-id", "displayName": "Inbox", "childFolderCount": 1},
                {"id": "sent-id", "displayName": "Sent Items", "childFolderCount": 0}
            ]
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/inbox-id/childFolders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "receipts-id", "displayName": "Receipts"}]
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/sent-id/childFolders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("get_all_folders", json!({"include_child_folders": true}))
        .await;

    assert!(!is_error);
    assert_eq!(
        payload["result"][0]["childFolders"][0]["displayName"],
        "Receipts"
    );
    assert!(payload["result"][1].get("childFolders").is_none());
}

#[tokio::test]
async fn test_create_child_folder() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/me/mailFolders/inbox/childFolders"))
        .and(body_json(json!({"displayName": "2024"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "new-folder"})))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "create_folder",
            json!({"display_name": "2024", "parent_folder_id": "inbox"}),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["id"], "new-folder");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_nango_token_is_used_for_graph() {
    let nango = MockServer::start().await;
    let graph = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/connection/conn-1"))
        .and(query_param("provider_config_key", "outlook"))
        .and(header("authorization", "Bearer nango-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": {"access_token": "graph-token"}
        })))
        .expect(1)
        .mount(&nango)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/calendars"))
        .and(header("authorization", "Bearer graph-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&graph)
        .await;

    let config = NangoConfig::new("conn-1", "outlook", nango.uri(), "nango-secret");
    let tokens = NangoConnection::new(reqwest::Client::new(), config)
        .with_cache_policy(TokenCachePolicy::Disabled);
    let server = server_for(&graph, Arc::new(tokens)).await;

    let result = server
        .call_tool("get_all_calendars", json!({}), &ToolContext::empty())
        .await
        .unwrap();
    assert!(!result.is_error);
}

#[tokio::test]
async fn test_auth_failure_makes_no_graph_call() {
    let nango = MockServer::start().await;
    let graph = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/connection/conn-1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid secret"))
        .expect(1)
        .mount(&nango)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/contacts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&graph)
        .await;

    let config = NangoConfig::new("conn-1", "outlook", nango.uri(), "wrong");
    let tokens = NangoConnection::new(reqwest::Client::new(), config);
    let fixture = TestFixture {
        server: server_for(&graph, Arc::new(tokens)).await,
        graph,
    };

    let (is_error, payload) = fixture.call("get_all_contacts", json!({})).await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "auth");
    assert_eq!(payload["error"]["status"], 401);
}

#[tokio::test]
async fn test_missing_nango_config_is_reported_per_call() {
    let graph = MockServer::start().await;

    let tokens = NangoConnection::new(reqwest::Client::new(), NangoConfig::default());
    let fixture = TestFixture {
        server: server_for(&graph, Arc::new(tokens)).await,
        graph,
    };

    let (is_error, payload) = fixture.call("get_all_calendars", json!({})).await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "auth");
    assert!(payload["error"]["message"]
        .as_str()
        .unwrap()
        .contains("NANGO_CONNECTION_ID"));
}

// ============================================================================
// JSON-RPC surface
// ============================================================================

#[tokio::test]
async fn test_tools_list_over_json_rpc() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .server
        .handle_request(McpRequest::new(1, "tools/list"))
        .await
        .unwrap();

    assert_eq!(response.id, RequestId::Number(1));
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 26);
    assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
}

#[tokio::test]
async fn test_tools_call_over_json_rpc() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/me/events/ev-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let request = McpRequest::new("call-1", "tools/call").with_params(json!({
        "name": "delete_event",
        "arguments": {"event_id": "ev-1"}
    }));

    let response = fixture.server.handle_request(request).await.unwrap();
    let result = response.result.unwrap();

    assert_eq!(result["isError"], false);
    let payload: Value =
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(
        payload["result"],
        json!({"status": "deleted", "event_id": "ev-1"})
    );
}

// ============================================================================
// Argument validation across every tool
// ============================================================================

#[tokio::test]
async fn test_every_tool_rejects_bad_arguments_without_calling_graph() {
    let fixture = TestFixture::new().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&fixture.graph)
        .await;

    let tools = fixture.server.list_tools().await;
    assert_eq!(tools.len(), 26);

    for tool in tools {
        let mut cases = vec![json!({"bogus": 1})];
        let has_required = tool.input_schema["required"]
            .as_array()
            .map_or(false, |required| !required.is_empty());
        if has_required {
            cases.push(json!({}));
        }

        for args in cases {
            let (is_error, payload) = fixture.call(&tool.name, args.clone()).await;
            assert!(is_error, "{} accepted {}", tool.name, args);
            assert_eq!(
                payload["error"]["kind"], "validation",
                "{} with {}: {}",
                tool.name, args, payload
            );
        }
    }
}

// ============================================================================
// Request shapes
// ============================================================================

#[tokio::test]
async fn test_update_draft_email_patches_mapped_fields() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/me/messages/AAMkDraft1"))
        .and(body_json(json!({
            "subject": "Revised",
            "body": {"contentType": "Text", "content": "Updated body"},
            "toRecipients": [{"emailAddress": {"address": "jane@x.com"}}],
            "importance": "high"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "AAMkDraft1",
            "subject": "Revised"
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "update_draft_email",
            json!({
                "draft_id": "AAMkDraft1",
                "subject": "Revised",
                "content": "Updated body",
                "content_type": "Text",
                "to_recipients": ["jane@x.com"],
                "importance": "high"
            }),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["subject"], "Revised");
}

#[tokio::test]
async fn test_get_draft_emails_reads_drafts_folder() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/drafts/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "d1", "subject": "Unsent", "isDraft": true}]
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture.call("get_draft_emails", json!({})).await;

    assert!(!is_error);
    assert_eq!(payload["result"][0]["id"], "d1");
    assert_eq!(payload["result"][0]["isDraft"], true);
}

#[tokio::test]
async fn test_update_contact_patches_only_given_fields() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/me/contacts/c1"))
        .and(body_json(json!({
            "jobTitle": "CTO",
            "businessPhones": ["+1 555 0100", "+1 555 0101"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "jobTitle": "CTO"
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "update_contact",
            json!({
                "contact_id": "c1",
                "job_title": "CTO",
                "business_phones": "+1 555 0100, +1 555 0101",
                "surname": ""
            }),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["jobTitle"], "CTO");
}

#[tokio::test]
async fn test_update_calendar_patches_name_and_color() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/me/calendars/cal1"))
        .and(body_json(json!({"name": "Team", "color": "lightGreen"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cal1",
            "name": "Team",
            "color": "lightGreen"
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "update_calendar",
            json!({"calendar_id": "cal1", "name": "Team", "color": "lightGreen"}),
        )
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["color"], "lightGreen");
}

#[tokio::test]
async fn test_update_folder_renames() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/me/mailFolders/f1"))
        .and(body_json(json!({"displayName": "Receipts"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "f1",
            "displayName": "Receipts"
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("update_folder", json!({"folder_id": "f1", "display_name": "Receipts"}))
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["displayName"], "Receipts");
}

#[tokio::test]
async fn test_get_event_details_returns_event() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/events/ev1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ev1",
            "subject": "Review",
            "start": {"dateTime": "2024-03-01T09:00:00", "timeZone": "UTC"}
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("get_event_details", json!({"event_id": "ev1"}))
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["subject"], "Review");
    assert_eq!(payload["result"]["start"]["timeZone"], "UTC");
}

#[tokio::test]
async fn test_get_folder_details_accepts_well_known_name() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/me/mailFolders/inbox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "AAMkInbox",
            "displayName": "Inbox",
            "unreadItemCount": 3
        })))
        .expect(1)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call("get_folder_details", json!({"folder_id": "inbox"}))
        .await;

    assert!(!is_error);
    assert_eq!(payload["result"]["unreadItemCount"], 3);
}

#[tokio::test]
async fn test_send_email_rejects_non_base64_attachment() {
    let fixture = TestFixture::new().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&fixture.graph)
        .await;

    let (is_error, payload) = fixture
        .call(
            "send_email",
            json!({
                "subject": "Report",
                "content": "Attached",
                "to_recipients": ["a@x.com"],
                "attachments": [{"name": "r.pdf", "content_bytes": "%%% not base64 %%%"}]
            }),
        )
        .await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "validation");
}
