//! Tool argument shapes and input validation.
//!
//! Each `*Args` struct is the wire shape a caller sends (and the source of the
//! tool's `inputSchema`). [`ToolCall::parse`] turns a tool name plus raw JSON
//! arguments into a fully validated [`ToolCall`], so handlers never see input
//! that breaks a declared constraint.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::ToolName;
use crate::account::{Account, lookup_or_default};
use crate::error::PostforgeError;

/// Maximum post length, in characters.
pub const MAX_POST_CHARS: usize = 3000;

/// Default number of posts returned by `linkedin_list_posts`.
pub const DEFAULT_LIST_COUNT: i64 = 10;

/// Upper bound for `linkedin_list_posts` `count`.
pub const MAX_LIST_COUNT: i64 = 50;

/// Who can see a post.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Connections => "CONNECTIONS",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AccountArgs {
    #[schemars(description = "Account to act as: personal, company or showcase. Defaults to personal.")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PostArgs {
    #[schemars(description = "Post text, at most 3000 characters.")]
    pub content: String,
    #[schemars(description = "Account to post as: personal, company or showcase. Defaults to personal.")]
    pub account: Option<String>,
    #[schemars(description = "PUBLIC (default) or CONNECTIONS.")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ArticleArgs {
    #[schemars(description = "Commentary shown above the link, at most 3000 characters.")]
    pub content: String,
    #[schemars(description = "Absolute http(s) URL of the article to share.")]
    pub article_url: String,
    #[schemars(description = "Optional title for the link preview.")]
    pub article_title: Option<String>,
    #[schemars(description = "Optional description for the link preview.")]
    pub article_description: Option<String>,
    #[schemars(description = "Account to post as: personal, company or showcase. Defaults to personal.")]
    pub account: Option<String>,
    #[schemars(description = "PUBLIC (default) or CONNECTIONS.")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct FormatArgs {
    #[schemars(description = "Opening line of the post.")]
    pub title: String,
    #[schemars(description = "Main body.")]
    pub content: String,
    #[schemars(description = "Hashtag line, e.g. \"#rust #async\". Placed after a --- rule.")]
    pub hashtags: Option<String>,
    #[schemars(description = "Call-to-action line placed after the body.")]
    pub cta: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListPostsArgs {
    #[schemars(description = "Account whose posts to list. Defaults to personal.")]
    pub account: Option<String>,
    #[schemars(description = "Number of posts to return (1-50, default 10).", range(min = 1, max = 50))]
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PostIdArgs {
    #[schemars(description = "Post URN, e.g. urn:li:share:7000000000000000000.")]
    pub post_id: String,
    #[schemars(description = "Account to act as: personal, company or showcase. Defaults to personal.")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StatusArgs {}

/// Article link attached to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A validated post about to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub account: &'static Account,
    pub content: String,
    pub visibility: Visibility,
    pub article: Option<ArticleLink>,
}

/// A validated tool invocation.
#[derive(Debug, Clone)]
pub enum ToolCall {
    Post(NewPost),
    PostArticle(NewPost),
    FormatPost(FormatArgs),
    ValidateToken { account: &'static Account },
    GetProfile { account: &'static Account },
    ListPosts { account: &'static Account, count: u32 },
    GetPost { account: &'static Account, post_id: String },
    DeletePost { account: &'static Account, post_id: String },
    ListOrganizations { account: &'static Account },
    Status,
}

impl ToolCall {
    /// Validate `args` against the tool's declared input shape.
    ///
    /// A `null` argument bag is treated as `{}`.
    pub fn parse(tool: ToolName, args: Value) -> Result<Self, PostforgeError> {
        let call = match tool {
            ToolName::Post => {
                let args: PostArgs = from_args(tool, args)?;
                Self::Post(NewPost {
                    content: checked_content(args.content)?,
                    account: lookup_or_default(args.account.as_deref())?,
                    visibility: args.visibility.unwrap_or_default(),
                    article: None,
                })
            }
            ToolName::PostArticle => {
                let args: ArticleArgs = from_args(tool, args)?;
                let content = checked_content(args.content)?;
                let url = checked_url(&args.article_url)?;
                Self::PostArticle(NewPost {
                    content,
                    account: lookup_or_default(args.account.as_deref())?,
                    visibility: args.visibility.unwrap_or_default(),
                    article: Some(ArticleLink {
                        url,
                        title: non_blank(args.article_title),
                        description: non_blank(args.article_description),
                    }),
                })
            }
            ToolName::FormatPost => Self::FormatPost(from_args(tool, args)?),
            ToolName::ValidateToken => Self::ValidateToken {
                account: account_only(tool, args)?,
            },
            ToolName::GetProfile => Self::GetProfile {
                account: account_only(tool, args)?,
            },
            ToolName::ListPosts => {
                let args: ListPostsArgs = from_args(tool, args)?;
                Self::ListPosts {
                    count: checked_count(args.count)?,
                    account: lookup_or_default(args.account.as_deref())?,
                }
            }
            ToolName::GetPost => {
                let args: PostIdArgs = from_args(tool, args)?;
                Self::GetPost {
                    post_id: checked_post_id(args.post_id)?,
                    account: lookup_or_default(args.account.as_deref())?,
                }
            }
            ToolName::DeletePost => {
                let args: PostIdArgs = from_args(tool, args)?;
                Self::DeletePost {
                    post_id: checked_post_id(args.post_id)?,
                    account: lookup_or_default(args.account.as_deref())?,
                }
            }
            ToolName::ListOrganizations => Self::ListOrganizations {
                account: account_only(tool, args)?,
            },
            ToolName::Status => {
                let _: StatusArgs = from_args(tool, args)?;
                Self::Status
            }
        };

        Ok(call)
    }

    /// The tool this call invokes.
    pub fn name(&self) -> ToolName {
        match self {
            Self::Post(_) => ToolName::Post,
            Self::PostArticle(_) => ToolName::PostArticle,
            Self::FormatPost(_) => ToolName::FormatPost,
            Self::ValidateToken { .. } => ToolName::ValidateToken,
            Self::GetProfile { .. } => ToolName::GetProfile,
            Self::ListPosts { .. } => ToolName::ListPosts,
            Self::GetPost { .. } => ToolName::GetPost,
            Self::DeletePost { .. } => ToolName::DeletePost,
            Self::ListOrganizations { .. } => ToolName::ListOrganizations,
            Self::Status => ToolName::Status,
        }
    }
}

fn from_args<T: DeserializeOwned>(tool: ToolName, args: Value) -> Result<T, PostforgeError> {
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| PostforgeError::malformed(format!("{} arguments: {}", tool, e)))
}

fn account_only(tool: ToolName, args: Value) -> Result<&'static Account, PostforgeError> {
    let args: AccountArgs = from_args(tool, args)?;
    lookup_or_default(args.account.as_deref())
}

fn checked_content(content: String) -> Result<String, PostforgeError> {
    if content.trim().is_empty() {
        return Err(PostforgeError::malformed("content must not be empty"));
    }
    let chars = content.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(PostforgeError::malformed(format!(
            "content is {} characters, the limit is {}",
            chars, MAX_POST_CHARS
        )));
    }
    Ok(content)
}

fn checked_url(raw: &str) -> Result<String, PostforgeError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PostforgeError::malformed(format!("article_url '{}' is not a valid URL: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(PostforgeError::malformed(format!(
            "article_url must use http or https, got '{}'",
            other
        ))),
    }
}

fn checked_count(count: Option<i64>) -> Result<u32, PostforgeError> {
    let count = count.unwrap_or(DEFAULT_LIST_COUNT);
    if !(1..=MAX_LIST_COUNT).contains(&count) {
        return Err(PostforgeError::malformed(format!(
            "count must be between 1 and {}, got {}",
            MAX_LIST_COUNT, count
        )));
    }
    // Bounded above, so the conversion cannot fail.
    u32::try_from(count).map_err(|_| PostforgeError::malformed("count out of range"))
}

fn checked_post_id(post_id: String) -> Result<String, PostforgeError> {
    let post_id = post_id.trim();
    if post_id.is_empty() {
        return Err(PostforgeError::malformed("post_id must not be empty"));
    }
    Ok(post_id.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountKey;
    use serde_json::json;

    fn parse(tool: ToolName, args: Value) -> Result<ToolCall, PostforgeError> {
        ToolCall::parse(tool, args)
    }

    #[test]
    fn test_post_defaults() {
        match parse(ToolName::Post, json!({"content": "hello"})).unwrap() {
            ToolCall::Post(post) => {
                assert_eq!(post.account.key, AccountKey::Personal);
                assert_eq!(post.visibility, Visibility::Public);
                assert!(post.article.is_none());
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_post_connections_visibility() {
        let call = parse(
            ToolName::Post,
            json!({"content": "hello", "account": "company", "visibility": "CONNECTIONS"}),
        )
        .unwrap();
        match call {
            ToolCall::Post(post) => {
                assert_eq!(post.account.key, AccountKey::Company);
                assert_eq!(post.visibility, Visibility::Connections);
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_post_unknown_visibility_is_malformed() {
        let err = parse(ToolName::Post, json!({"content": "x", "visibility": "FRIENDS"})).unwrap_err();
        assert!(matches!(err, PostforgeError::MalformedInput { .. }));
    }

    #[test]
    fn test_post_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_POST_CHARS);
        assert!(parse(ToolName::Post, json!({"content": at_limit})).is_ok());

        let over = "a".repeat(MAX_POST_CHARS + 1);
        let err = parse(ToolName::Post, json!({"content": over})).unwrap_err();
        assert!(err.to_string().contains("3001"));
    }

    #[test]
    fn test_post_empty_content_rejected() {
        let err = parse(ToolName::Post, json!({"content": "   "})).unwrap_err();
        assert!(matches!(err, PostforgeError::MalformedInput { .. }));
    }

    #[test]
    fn test_post_missing_content_rejected() {
        let err = parse(ToolName::Post, json!({})).unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let err = parse(ToolName::GetProfile, json!({"account": "intern"})).unwrap_err();
        assert!(matches!(err, PostforgeError::UnknownAccount { ref key } if key == "intern"));
    }

    #[test]
    fn test_validation_precedes_account_lookup() {
        let err = parse(
            ToolName::Post,
            json!({"content": "", "account": "intern"}),
        )
        .unwrap_err();
        assert!(matches!(err, PostforgeError::MalformedInput { .. }));
    }

    #[test]
    fn test_article_url_validation() {
        let ok = parse(
            ToolName::PostArticle,
            json!({"content": "read this", "article_url": "https://example.com/a", "article_title": ""}),
        )
        .unwrap();
        match ok {
            ToolCall::PostArticle(post) => {
                let article = post.article.unwrap();
                assert_eq!(article.url, "https://example.com/a");
                assert!(article.title.is_none());
            }
            other => panic!("unexpected call: {:?}", other),
        }

        for bad in ["not a url", "ftp://example.com/file", "/relative/path"] {
            let err = parse(
                ToolName::PostArticle,
                json!({"content": "x", "article_url": bad}),
            )
            .unwrap_err();
            assert!(
                matches!(err, PostforgeError::MalformedInput { .. }),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_list_count_bounds() {
        match parse(ToolName::ListPosts, Value::Null).unwrap() {
            ToolCall::ListPosts { count, account } => {
                assert_eq!(count, 10);
                assert_eq!(account.key, AccountKey::Personal);
            }
            other => panic!("unexpected call: {:?}", other),
        }

        assert!(parse(ToolName::ListPosts, json!({"count": 1})).is_ok());
        assert!(parse(ToolName::ListPosts, json!({"count": 50})).is_ok());
        assert!(parse(ToolName::ListPosts, json!({"count": 0})).is_err());
        assert!(parse(ToolName::ListPosts, json!({"count": 51})).is_err());
        assert!(parse(ToolName::ListPosts, json!({"count": -3})).is_err());
        assert!(parse(ToolName::ListPosts, json!({"count": "ten"})).is_err());
    }

    #[test]
    fn test_post_id_trimmed_and_required() {
        match parse(ToolName::GetPost, json!({"post_id": " urn:li:share:1 "})).unwrap() {
            ToolCall::GetPost { post_id, .. } => assert_eq!(post_id, "urn:li:share:1"),
            other => panic!("unexpected call: {:?}", other),
        }
        assert!(parse(ToolName::DeletePost, json!({"post_id": ""})).is_err());
        assert!(parse(ToolName::DeletePost, json!({})).is_err());
    }

    #[test]
    fn test_status_takes_no_arguments() {
        assert!(matches!(
            parse(ToolName::Status, json!({})).unwrap(),
            ToolCall::Status
        ));
        assert_eq!(parse(ToolName::Status, Value::Null).unwrap().name(), ToolName::Status);
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = parse(ToolName::GetProfile, json!("personal")).unwrap_err();
        assert!(matches!(err, PostforgeError::MalformedInput { .. }));
    }
}
