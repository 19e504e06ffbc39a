//! Post text assembly for `linkedin_format_post`.

use serde::Serialize;

use super::args::{FormatArgs, MAX_POST_CHARS};

/// Assembled post text and its length check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedPost {
    pub text: String,
    /// Length in characters (not bytes).
    pub chars: usize,
    pub within_limit: bool,
}

/// Lay out `title`, a blank line, `content`, then the optional call-to-action
/// on its own line and the optional hashtags below a `---` rule.
///
/// Blank optional parts are omitted.
pub fn format_post(args: &FormatArgs) -> FormattedPost {
    let mut text = format!("{}\n\n{}", args.title, args.content);

    if let Some(cta) = args.cta.as_deref().filter(|c| !c.trim().is_empty()) {
        text.push('\n');
        text.push_str(cta);
    }
    if let Some(hashtags) = args.hashtags.as_deref().filter(|h| !h.trim().is_empty()) {
        text.push_str("\n---\n");
        text.push_str(hashtags);
    }

    let chars = text.chars().count();
    FormattedPost {
        text,
        chars,
        within_limit: chars <= MAX_POST_CHARS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::*;
    use crate::store::MemoryStore;
    use wiremock::MockServer;

    fn args(title: &str, content: &str, cta: Option<&str>, hashtags: Option<&str>) -> FormatArgs {
        FormatArgs {
            title: title.to_string(),
            content: content.to_string(),
            cta: cta.map(str::to_string),
            hashtags: hashtags.map(str::to_string),
        }
    }

    #[test]
    fn test_full_layout() {
        let post = format_post(&args("Hi", "World", Some("Click"), Some("#a #b")));
        assert_eq!(post.text, "Hi\n\nWorld\nClick\n---\n#a #b");
        assert_eq!(post.chars, post.text.chars().count());
        assert!(post.within_limit);
    }

    #[test]
    fn test_optional_parts_omitted() {
        assert_eq!(format_post(&args("Hi", "World", None, None)).text, "Hi\n\nWorld");
        assert_eq!(
            format_post(&args("Hi", "World", None, Some("#x"))).text,
            "Hi\n\nWorld\n---\n#x"
        );
        assert_eq!(
            format_post(&args("Hi", "World", Some(" "), Some(""))).text,
            "Hi\n\nWorld"
        );
    }

    #[test]
    fn test_over_limit_is_reported_not_rejected() {
        let post = format_post(&args("T", &"x".repeat(MAX_POST_CHARS), None, None));
        assert_eq!(post.chars, MAX_POST_CHARS + 3);
        assert!(!post.within_limit);
    }

    #[test]
    fn test_chars_counts_characters() {
        let post = format_post(&args("café", "naïve", None, None));
        assert_eq!(post.chars, 11);
    }

    #[tokio::test]
    async fn test_format_tool_needs_no_credential() {
        let server = MockServer::start().await;
        let ctx = context(&server, MemoryStore::new());

        let result = ctx
            .call(
                "linkedin_format_post",
                serde_json::json!({"title": "Hi", "content": "World", "cta": "Click", "hashtags": "#a #b"}),
            )
            .await;

        let value = json(&result);
        assert_eq!(value["text"], "Hi\n\nWorld\nClick\n---\n#a #b");
        assert_eq!(value["chars"], 25);
        assert_eq!(value["withinLimit"], true);
    }
}
