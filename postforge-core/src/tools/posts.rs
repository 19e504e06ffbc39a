//! Post handlers: create, list, get, delete.

use chrono::DateTime;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{ToolContext, collection_elements};
use super::args::NewPost;
use crate::account::Account;
use crate::client::{UpstreamBody, UpstreamRequest, UpstreamResponse, encode_segment};
use crate::error::PostforgeError;

/// Post text in listings is cut to this many characters.
pub const LIST_TEXT_CHARS: usize = 300;

const POSTS_PATH: &str = "/rest/posts";

/// Headers LinkedIn uses to return the URN of a created entity.
const ID_HEADERS: [&str; 2] = ["x-restli-id", "x-linkedin-id"];

/// Request body for `POST /rest/posts`.
pub fn post_body(post: &NewPost) -> Value {
    let mut body = json!({
        "author": post.account.author,
        "commentary": post.content,
        "visibility": post.visibility.as_str(),
        "distribution": {
            "feedDistribution": "MAIN_FEED",
            "targetEntities": [],
            "thirdPartyDistributionChannels": [],
        },
        "lifecycleState": "PUBLISHED",
        "isReshareDisabledByAuthor": false,
    });

    if let Some(article) = &post.article {
        let mut link = Map::new();
        link.insert("source".to_string(), json!(article.url));
        if let Some(title) = &article.title {
            link.insert("title".to_string(), json!(title));
        }
        if let Some(description) = &article.description {
            link.insert("description".to_string(), json!(description));
        }
        body["content"] = json!({ "article": link });
    }

    body
}

/// URN of a newly created post: the body `id` if present, otherwise the
/// creation header.
fn created_id(response: &UpstreamResponse) -> Option<String> {
    let from_body = match &response.body {
        UpstreamBody::Json(body) => body.get("id").and_then(Value::as_str),
        _ => None,
    };
    from_body
        .or_else(|| ID_HEADERS.iter().find_map(|name| response.header(name)))
        .map(str::to_string)
}

pub(super) async fn create_post(ctx: &ToolContext, post: NewPost) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(post.account).await?;
    let response = ctx
        .client()
        .call(UpstreamRequest::post(POSTS_PATH, post_body(&post)), &credential)
        .await?;

    let id = created_id(&response);
    info!(
        "created post {} as {}",
        id.as_deref().unwrap_or("<unknown id>"),
        post.account.key
    );

    let mut result = json!({
        "success": true,
        "id": id,
        "account": post.account.label,
        "author": post.account.author,
        "visibility": post.visibility.as_str(),
    });
    if let Some(article) = &post.article {
        result["articleUrl"] = json!(article.url);
    }
    Ok(result)
}

pub(super) async fn list_posts(
    ctx: &ToolContext,
    account: &'static Account,
    count: u32,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let request = UpstreamRequest::get(POSTS_PATH)
        .with_query("q", "author")
        .with_query("author", account.author)
        .with_query("count", count.to_string());
    let response = ctx.client().call(request, &credential).await?;

    let posts: Vec<Value> = collection_elements(&response)?
        .iter()
        .map(compact_post)
        .collect();

    Ok(json!({
        "posts": posts,
        "account": account.label,
    }))
}

/// Reduce an upstream post element to the listing shape.
fn compact_post(element: &Value) -> Value {
    let text = element
        .get("commentary")
        .and_then(Value::as_str)
        .map(|text| text.chars().take(LIST_TEXT_CHARS).collect::<String>());

    json!({
        "id": element.get("id").cloned().unwrap_or(Value::Null),
        "text": text,
        "visibility": element.get("visibility").cloned().unwrap_or(Value::Null),
        "lifecycleState": element.get("lifecycleState").cloned().unwrap_or(Value::Null),
        "createdAt": timestamp(element.get("createdAt")),
        "publishedAt": timestamp(element.get("publishedAt")),
    })
}

/// Epoch milliseconds to an RFC 3339 string. Anything else is `null`.
fn timestamp(value: Option<&Value>) -> Value {
    value
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .map(|at| Value::String(at.to_rfc3339()))
        .unwrap_or(Value::Null)
}

pub(super) async fn get_post(
    ctx: &ToolContext,
    account: &'static Account,
    post_id: &str,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let path = format!("{}/{}", POSTS_PATH, encode_segment(post_id));
    let response = ctx
        .client()
        .call(UpstreamRequest::get(path), &credential)
        .await?;
    Ok(response.into_value())
}

pub(super) async fn delete_post(
    ctx: &ToolContext,
    account: &'static Account,
    post_id: &str,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let path = format!("{}/{}", POSTS_PATH, encode_segment(post_id));
    ctx.client()
        .call(UpstreamRequest::delete(path), &credential)
        .await?;

    info!("deleted post {} as {}", post_id, account.key);
    Ok(json!({
        "success": true,
        "deleted": post_id,
        "account": account.label,
    }))
}
