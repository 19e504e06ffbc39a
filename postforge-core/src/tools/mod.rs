//! The tool surface.
//!
//! Ten fixed operations, each addressed by a [`ToolName`]:
//!
//! | Tool | Upstream |
//! |------|----------|
//! | `linkedin_post` | `POST /rest/posts` |
//! | `linkedin_post_article` | `POST /rest/posts` |
//! | `linkedin_format_post` | none |
//! | `linkedin_validate_token` | `GET /v2/userinfo` |
//! | `linkedin_get_profile` | `GET /v2/userinfo` |
//! | `linkedin_list_posts` | `GET /rest/posts?q=author` |
//! | `linkedin_get_post` | `GET /rest/posts/{id}` |
//! | `linkedin_delete_post` | `DELETE /rest/posts/{id}` |
//! | `linkedin_list_organizations` | `GET /rest/organizationAcls?q=roleAssignee` |
//! | `linkedin_status` | none |
//!
//! [`ToolContext::call`] is the single entry point: it validates the
//! arguments, runs the handler and folds every failure into an error
//! [`ToolResult`]. Nothing escapes as an `Err`.

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::account::Account;
use crate::client::{ApiClient, UpstreamBody, UpstreamResponse};
use crate::credential::{Credential, resolve_from_store};
use crate::error::PostforgeError;
use crate::store::SecretStore;

pub mod args;
mod format;
mod posts;
mod profile;

pub use args::{
    AccountArgs, ArticleArgs, FormatArgs, ListPostsArgs, PostArgs, PostIdArgs, StatusArgs,
    ToolCall, Visibility,
};
pub use format::{FormattedPost, format_post};

/// One of the ten supported tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Post,
    PostArticle,
    FormatPost,
    ValidateToken,
    GetProfile,
    ListPosts,
    GetPost,
    DeletePost,
    ListOrganizations,
    Status,
}

impl ToolName {
    /// All tools, in listing order.
    pub const ALL: [ToolName; 10] = [
        Self::Post,
        Self::PostArticle,
        Self::FormatPost,
        Self::ValidateToken,
        Self::GetProfile,
        Self::ListPosts,
        Self::GetPost,
        Self::DeletePost,
        Self::ListOrganizations,
        Self::Status,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "linkedin_post",
            Self::PostArticle => "linkedin_post_article",
            Self::FormatPost => "linkedin_format_post",
            Self::ValidateToken => "linkedin_validate_token",
            Self::GetProfile => "linkedin_get_profile",
            Self::ListPosts => "linkedin_list_posts",
            Self::GetPost => "linkedin_get_post",
            Self::DeletePost => "linkedin_delete_post",
            Self::ListOrganizations => "linkedin_list_organizations",
            Self::Status => "linkedin_status",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Post => "Publish a text post as one of the configured accounts.",
            Self::PostArticle => "Publish a post that shares an article link, with optional title and description.",
            Self::FormatPost => "Assemble title, body, call-to-action and hashtags into post text and report its length. Makes no API call.",
            Self::ValidateToken => "Check an account's token against the userinfo endpoint and report scope and expiry.",
            Self::GetProfile => "Fetch the userinfo profile for an account's token.",
            Self::ListPosts => "List recent posts authored by an account (1-50, default 10).",
            Self::GetPost => "Fetch a single post by URN.",
            Self::DeletePost => "Delete a post by URN. This cannot be undone.",
            Self::ListOrganizations => "List organizations the account's token holds a role on.",
            Self::Status => "Report which accounts have credentials configured and when they expire. Makes no API call.",
        }
    }

    /// JSON schema of the tool's arguments.
    pub fn input_schema(&self) -> Value {
        match self {
            Self::Post => schema::<PostArgs>(),
            Self::PostArticle => schema::<ArticleArgs>(),
            Self::FormatPost => schema::<FormatArgs>(),
            Self::ValidateToken | Self::GetProfile | Self::ListOrganizations => {
                schema::<AccountArgs>()
            }
            Self::ListPosts => schema::<ListPostsArgs>(),
            Self::GetPost | Self::DeletePost => schema::<PostIdArgs>(),
            Self::Status => schema::<StatusArgs>(),
        }
    }

    /// Whether the tool changes state on LinkedIn.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::PostArticle | Self::DeletePost)
    }
}

fn schema<T: JsonSchema>() -> Value {
    Value::from(schema_for!(T))
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| PostforgeError::UnknownTool {
                name: s.to_string(),
            })
    }
}

/// Behavior hints attached to a tool descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub destructive_hint: bool,
}

/// Entry in a `tools/list` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

/// Descriptors for every tool, in listing order.
pub fn descriptors() -> Vec<ToolDescriptor> {
    ToolName::ALL
        .iter()
        .map(|tool| ToolDescriptor {
            name: tool.as_str(),
            description: tool.description(),
            input_schema: tool.input_schema(),
            annotations: ToolAnnotations {
                read_only_hint: !tool.is_mutating(),
                destructive_hint: tool.is_mutating(),
            },
        })
        .collect()
}

/// A content block in a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// A success result carrying `value` as pretty-printed JSON.
    pub fn success(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }

    /// An error result carrying a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// All text blocks, joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Result<Value, PostforgeError>> for ToolResult {
    fn from(outcome: Result<Value, PostforgeError>) -> Self {
        match outcome {
            Ok(value) => Self::success(&value),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

/// Shared handles every tool invocation runs against.
///
/// Holds no per-invocation state; credentials are resolved from the store
/// on every call.
#[derive(Clone)]
pub struct ToolContext {
    store: Arc<dyn SecretStore>,
    client: ApiClient,
}

impl ToolContext {
    pub fn new(store: Arc<dyn SecretStore>, client: ApiClient) -> Self {
        Self { store, client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Read and resolve the account's credential.
    pub async fn credential(&self, account: &Account) -> Result<Credential, PostforgeError> {
        Ok(resolve_from_store(account, self.store.as_ref()).await?)
    }

    /// Invoke a tool by wire name.
    ///
    /// Always returns a result; failures come back with `is_error` set and
    /// the error's message as text.
    pub async fn call(&self, name: &str, args: Value) -> ToolResult {
        let invocation = Uuid::new_v4();
        let span = info_span!("tool", %invocation, tool = name);

        async move {
            let outcome = match name.parse::<ToolName>() {
                Ok(tool) => self.invoke(tool, args).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &outcome {
                warn!("tool {} failed: {}", name, e);
            }
            ToolResult::from(outcome)
        }
        .instrument(span)
        .await
    }

    /// Validate arguments for `tool` and execute it.
    pub async fn invoke(&self, tool: ToolName, args: Value) -> Result<Value, PostforgeError> {
        let call = ToolCall::parse(tool, args)?;
        self.execute(call).await
    }

    /// Execute an already validated call.
    pub async fn execute(&self, call: ToolCall) -> Result<Value, PostforgeError> {
        info!("executing {}", call.name());

        match call {
            ToolCall::Post(post) | ToolCall::PostArticle(post) => {
                posts::create_post(self, post).await
            }
            ToolCall::FormatPost(args) => serde_json::to_value(format_post(&args))
                .map_err(|e| PostforgeError::malformed(format!("unserializable post: {}", e))),
            ToolCall::ValidateToken { account } => profile::validate_token(self, account).await,
            ToolCall::GetProfile { account } => profile::get_profile(self, account).await,
            ToolCall::ListPosts { account, count } => {
                posts::list_posts(self, account, count).await
            }
            ToolCall::GetPost { account, post_id } => {
                posts::get_post(self, account, &post_id).await
            }
            ToolCall::DeletePost { account, post_id } => {
                posts::delete_post(self, account, &post_id).await
            }
            ToolCall::ListOrganizations { account } => {
                profile::list_organizations(self, account).await
            }
            ToolCall::Status => {
                let report = crate::status::collect(self.store.as_ref(), chrono::Utc::now()).await;
                serde_json::to_value(report)
                    .map_err(|e| PostforgeError::malformed(format!("unserializable status: {}", e)))
            }
        }
    }
}

/// The `elements` array of a collection response.
///
/// A success without one is a [`PostforgeError::UnexpectedResponse`], so a
/// maintenance page never reads as an empty collection.
fn collection_elements(response: &UpstreamResponse) -> Result<&[Value], PostforgeError> {
    let elements = match &response.body {
        UpstreamBody::Json(body) => body.get("elements").and_then(Value::as_array),
        _ => None,
    };
    elements
        .map(Vec::as_slice)
        .ok_or_else(|| PostforgeError::UnexpectedResponse {
            status: response.status,
            body: response.body_text(),
        })
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!(matches!(
            "linkedin_like".parse::<ToolName>(),
            Err(PostforgeError::UnknownTool { .. })
        ));
    }

    #[test]
    fn test_descriptors_cover_every_tool() {
        let descriptors = descriptors();
        assert_eq!(descriptors.len(), 10);

        let post = descriptors.iter().find(|d| d.name == "linkedin_post").unwrap();
        assert_eq!(post.input_schema["type"], "object");
        assert!(post.input_schema["properties"]["content"].is_object());
        let required = post.input_schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("content")));
        assert!(!required.contains(&json!("account")));

        let value = serde_json::to_value(&descriptors[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert_eq!(
            value["annotations"],
            json!({"readOnlyHint": false, "destructiveHint": true})
        );

        let mutating: Vec<&str> = descriptors
            .iter()
            .filter(|d| d.annotations.destructive_hint)
            .map(|d| d.name)
            .collect();
        assert_eq!(
            mutating,
            ["linkedin_post", "linkedin_post_article", "linkedin_delete_post"]
        );
        let status = descriptors.iter().find(|d| d.name == "linkedin_status").unwrap();
        assert!(status.annotations.read_only_hint);
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult::error("boom");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"content": [{"type": "text", "text": "boom"}], "isError": true})
        );

        let ok = ToolResult::success(&json!({"a": 1}));
        assert!(!ok.is_error);
        assert_eq!(json(&ok), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let server = MockServer::start().await;
        let ctx = context(&server, MemoryStore::new());

        let result = ctx.call("linkedin_like", json!({})).await;
        assert!(result.is_error);
        assert!(result.text().contains("linkedin_like"));
    }

    #[tokio::test]
    async fn test_unknown_account_makes_no_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("t"));

        let result = ctx
            .call("linkedin_get_profile", json!({"account": "intern"}))
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("unknown account 'intern'"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_error_result() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("t"));

        let result = ctx
            .call("linkedin_get_profile", json!({"account": "showcase"}))
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("showcase"));
    }

    #[tokio::test]
    async fn test_upstream_401_is_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("stale"));

        for tool in ["linkedin_get_profile", "linkedin_validate_token"] {
            let result = ctx.call(tool, json!({})).await;
            assert!(result.is_error, "{} should fail", tool);
            let text = result.text();
            assert!(text.contains("401"));
            assert!(text.contains("unauthorized"));
        }
    }
}
