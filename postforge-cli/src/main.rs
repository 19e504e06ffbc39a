//! Postforge CLI
//!
//! Command-line interface for the Postforge daemon.
//!
//! # Usage
//!
//! ```bash
//! # Show the tools the daemon exposes
//! postforge tools
//!
//! # Credential health for every account
//! postforge status
//!
//! # Publish as the company page
//! postforge post "We're hiring" --account company
//!
//! # Any tool with raw JSON arguments
//! postforge call linkedin_list_posts --args '{"count": 5}'
//!
//! # Lay out a post locally, no daemon needed
//! postforge format "Big news" "We shipped." --cta "Read more" --hashtags "#rust"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postforge_core::tools::{FormatArgs, format_post};
use postforge_core::ToolResult;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

mod client;

use client::{DaemonClient, default_socket_path};

#[derive(Parser)]
#[command(name = "postforge")]
#[command(about = "Post to LinkedIn as any configured account via the postforge daemon")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Daemon socket (defaults to $POSTFORGE_SOCKET or the runtime dir)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools the daemon exposes
    Tools,

    /// Invoke a tool with raw JSON arguments
    Call {
        /// Tool name (e.g., linkedin_get_profile)
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// Show credential status for every account
    Status,

    /// Publish a post, optionally sharing an article link
    Post {
        /// Post text (at most 3000 characters)
        content: String,

        /// Account to post as (personal, company, showcase)
        #[arg(short, long)]
        account: Option<String>,

        /// PUBLIC or CONNECTIONS
        #[arg(long)]
        visibility: Option<String>,

        /// Share this article URL with the post
        #[arg(long)]
        article_url: Option<String>,

        /// Article preview title
        #[arg(long, requires = "article_url")]
        article_title: Option<String>,

        /// Article preview description
        #[arg(long, requires = "article_url")]
        article_description: Option<String>,
    },

    /// Assemble post text locally and report its length
    Format {
        /// Opening line
        title: String,

        /// Body
        content: String,

        /// Hashtag line
        #[arg(long)]
        hashtags: Option<String>,

        /// Call-to-action line
        #[arg(long)]
        cta: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let socket = cli.socket.unwrap_or_else(default_socket_path);

    match cli.command {
        Commands::Tools => list_tools(&socket).await,
        Commands::Call { tool, args } => {
            let arguments = parse_arguments(args.as_deref())?;
            call_tool(&socket, &tool, arguments).await
        }
        Commands::Status => show_status(&socket).await,
        Commands::Post {
            content,
            account,
            visibility,
            article_url,
            article_title,
            article_description,
        } => {
            let (tool, arguments) = post_arguments(
                content,
                account,
                visibility,
                article_url,
                article_title,
                article_description,
            );
            call_tool(&socket, tool, arguments).await
        }
        Commands::Format {
            title,
            content,
            hashtags,
            cta,
        } => {
            let formatted = format_post(&FormatArgs {
                title,
                content,
                hashtags,
                cta,
            });
            println!("{}", formatted.text);
            eprintln!(
                "\n{} characters ({})",
                formatted.chars,
                if formatted.within_limit {
                    "within limit"
                } else {
                    "over the 3000 limit"
                }
            );
            Ok(())
        }
    }
}

async fn connect(socket: &std::path::Path) -> Result<DaemonClient> {
    let client = DaemonClient::connect(socket).await?;
    if !client.is_connected() {
        anyhow::bail!(
            "postforged is not running (no socket at {:?}). Start it with `postforged`.",
            client.socket_path()
        );
    }
    Ok(client)
}

async fn list_tools(socket: &std::path::Path) -> Result<()> {
    let mut client = connect(socket).await?;
    let tools = client.list_tools().await?;

    for tool in tools {
        println!("{}", tool.name);
        println!("  {}", tool.description);
        let params = schema_properties(&tool.input_schema);
        if !params.is_empty() {
            println!("  args: {}", params.join(", "));
        }
    }
    Ok(())
}

/// Property names of an input schema, required ones first and marked `*`.
fn schema_properties(schema: &Value) -> Vec<String> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut names: Vec<String> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .keys()
                .map(|k| {
                    if required.contains(&k.as_str()) {
                        format!("{}*", k)
                    } else {
                        k.clone()
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    names.sort_by_key(|n| !n.ends_with('*'));
    names
}

fn parse_arguments(raw: Option<&str>) -> Result<Value> {
    match raw {
        None => Ok(json!({})),
        Some(raw) => {
            let value: Value =
                serde_json::from_str(raw).context("--args must be a JSON object")?;
            if !value.is_object() {
                anyhow::bail!("--args must be a JSON object, got: {}", raw);
            }
            Ok(value)
        }
    }
}

/// Pick the post tool and build its arguments from CLI flags.
fn post_arguments(
    content: String,
    account: Option<String>,
    visibility: Option<String>,
    article_url: Option<String>,
    article_title: Option<String>,
    article_description: Option<String>,
) -> (&'static str, Value) {
    let mut args = Map::new();
    args.insert("content".to_string(), json!(content));
    if let Some(account) = account {
        args.insert("account".to_string(), json!(account));
    }
    if let Some(visibility) = visibility {
        args.insert("visibility".to_string(), json!(visibility.to_uppercase()));
    }

    let tool = match article_url {
        Some(url) => {
            args.insert("article_url".to_string(), json!(url));
            if let Some(title) = article_title {
                args.insert("article_title".to_string(), json!(title));
            }
            if let Some(description) = article_description {
                args.insert("article_description".to_string(), json!(description));
            }
            "linkedin_post_article"
        }
        None => "linkedin_post",
    };

    (tool, Value::Object(args))
}

async fn call_tool(socket: &std::path::Path, tool: &str, arguments: Value) -> Result<()> {
    let mut client = connect(socket).await?;
    let result = client.call_tool(tool, arguments).await?;
    print_result(&result)
}

fn print_result(result: &ToolResult) -> Result<()> {
    if result.is_error {
        anyhow::bail!("{}", result.text());
    }
    println!("{}", result.text());
    Ok(())
}

async fn show_status(socket: &std::path::Path) -> Result<()> {
    let mut client = connect(socket).await?;
    let result = client.call_tool("linkedin_status", json!({})).await?;
    if result.is_error {
        anyhow::bail!("{}", result.text());
    }

    let report: Map<String, Value> =
        serde_json::from_str(&result.text()).context("Unexpected status payload")?;

    for (key, entry) in &report {
        println!("{}", status_line(key, entry));
    }
    Ok(())
}

fn status_line(key: &str, entry: &Value) -> String {
    let label = entry["label"].as_str().unwrap_or(key);
    let state = entry["state"].as_str().unwrap_or("unknown");

    let mut line = format!("{:<10} {:<18} {}", key, label, state.replace('_', " "));

    if let Some(expires_at) = entry["expiresAt"].as_str() {
        let date = expires_at.split('T').next().unwrap_or(expires_at);
        match entry["daysLeft"].as_i64() {
            Some(days) if days < 0 => line.push_str(&format!("  expired {} ({} days ago)", date, -days)),
            Some(days) => line.push_str(&format!("  expires {} ({} days)", date, days)),
            None => line.push_str(&format!("  expires {}", date)),
        }
    } else if entry["configured"].as_bool() == Some(true) {
        line.push_str("  expiry unknown");
    }

    if let Some(error) = entry["error"].as_str() {
        line.push_str(&format!("  ({})", error));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_post() {
        let cli = Cli::try_parse_from([
            "postforge",
            "post",
            "hello",
            "--account",
            "company",
            "--article-url",
            "https://example.com",
        ])
        .unwrap();

        match cli.command {
            Commands::Post {
                content,
                account,
                article_url,
                ..
            } => {
                assert_eq!(content, "hello");
                assert_eq!(account.as_deref(), Some("company"));
                assert_eq!(article_url.as_deref(), Some("https://example.com"));
            }
            _ => panic!("expected post command"),
        }
    }

    #[test]
    fn test_article_title_requires_url() {
        assert!(Cli::try_parse_from(["postforge", "post", "hi", "--article-title", "T"]).is_err());
    }

    #[test]
    fn test_post_arguments_plain() {
        let (tool, args) = post_arguments(
            "hello".to_string(),
            None,
            Some("connections".to_string()),
            None,
            None,
            None,
        );
        assert_eq!(tool, "linkedin_post");
        assert_eq!(args, json!({"content": "hello", "visibility": "CONNECTIONS"}));
    }

    #[test]
    fn test_post_arguments_article() {
        let (tool, args) = post_arguments(
            "read".to_string(),
            Some("showcase".to_string()),
            None,
            Some("https://example.com/a".to_string()),
            Some("A".to_string()),
            None,
        );
        assert_eq!(tool, "linkedin_post_article");
        assert_eq!(
            args,
            json!({
                "content": "read",
                "account": "showcase",
                "article_url": "https://example.com/a",
                "article_title": "A",
            })
        );
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(None).unwrap(), json!({}));
        assert_eq!(parse_arguments(Some(r#"{"count": 5}"#)).unwrap(), json!({"count": 5}));
        assert!(parse_arguments(Some("[1, 2]")).is_err());
        assert!(parse_arguments(Some("{oops")).is_err());
    }

    #[test]
    fn test_schema_properties_required_first() {
        let schema = json!({
            "type": "object",
            "properties": {"account": {}, "content": {}, "visibility": {}},
            "required": ["content"],
        });
        let props = schema_properties(&schema);
        assert_eq!(props[0], "content*");
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn test_status_lines() {
        let configured = json!({
            "label": "Company Page", "configured": true, "state": "configured",
            "expiresAt": "2024-03-01T00:00:00Z", "daysLeft": 12, "expiry": "valid"
        });
        let line = status_line("company", &configured);
        assert!(line.contains("Company Page"));
        assert!(line.contains("expires 2024-03-01 (12 days)"));

        let bare = json!({"label": "Personal Profile", "configured": true, "state": "configured"});
        assert!(status_line("personal", &bare).contains("expiry unknown"));

        let absent = json!({"label": "Showcase Page", "configured": false, "state": "not_configured"});
        assert!(status_line("showcase", &absent).contains("not configured"));
    }
}
