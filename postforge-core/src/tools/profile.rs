//! Identity handlers: userinfo, token validation, organization roles.

use chrono::Utc;
use serde_json::{Value, json};

use super::{ToolContext, collection_elements};
use crate::account::Account;
use crate::client::{UpstreamBody, UpstreamRequest};
use crate::error::PostforgeError;

const USERINFO_PATH: &str = "/v2/userinfo";
const ORGANIZATION_ACLS_PATH: &str = "/rest/organizationAcls";

pub(super) async fn get_profile(
    ctx: &ToolContext,
    account: &'static Account,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let response = ctx
        .client()
        .call(UpstreamRequest::get(USERINFO_PATH), &credential)
        .await?;
    Ok(response.into_value())
}

/// Call userinfo with the account's token and overlay the credential's
/// scope and expiry.
///
/// Expiry is reported, never enforced: an expired token that LinkedIn still
/// accepts validates successfully.
pub(super) async fn validate_token(
    ctx: &ToolContext,
    account: &'static Account,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let response = ctx
        .client()
        .call(UpstreamRequest::get(USERINFO_PATH), &credential)
        .await?;

    let profile = match &response.body {
        UpstreamBody::Json(body) => body.clone(),
        _ => Value::Null,
    };

    let now = Utc::now();
    Ok(json!({
        "valid": true,
        "account": account.label,
        "name": display_name(&profile),
        "email": profile.get("email").cloned().unwrap_or(Value::Null),
        "sub": profile.get("sub").cloned().unwrap_or(Value::Null),
        "scope": credential.effective_scope(),
        "expiresAt": credential.expires_at().map(|at| at.to_rfc3339()),
        "daysLeft": credential.days_left(now),
        "expiry": credential.expiry(now),
    }))
}

/// `name`, or `given_name family_name` when no combined name is present.
fn display_name(profile: &Value) -> Option<String> {
    fn field<'a>(profile: &'a Value, key: &str) -> Option<&'a str> {
        profile
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    if let Some(name) = field(profile, "name") {
        return Some(name.to_string());
    }

    let parts: Vec<&str> = [field(profile, "given_name"), field(profile, "family_name")]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

pub(super) async fn list_organizations(
    ctx: &ToolContext,
    account: &'static Account,
) -> Result<Value, PostforgeError> {
    let credential = ctx.credential(account).await?;
    let request = UpstreamRequest::get(ORGANIZATION_ACLS_PATH).with_query("q", "roleAssignee");
    let response = ctx.client().call(request, &credential).await?;

    let organizations: Vec<Value> = collection_elements(&response)?
        .iter()
        .map(|acl| {
            json!({
                "organization": acl
                    .get("organization")
                    .or_else(|| acl.get("organizationTarget"))
                    .cloned()
                    .unwrap_or(Value::Null),
                "role": acl.get("role").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(json!({
        "organizations": organizations,
        "account": account.label,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tools::test_support::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(
            display_name(&json!({"name": "Ada Lovelace", "given_name": "A"})),
            Some("Ada Lovelace".to_string())
        );
        assert_eq!(
            display_name(&json!({"given_name": "Ada", "family_name": "Lovelace"})),
            Some("Ada Lovelace".to_string())
        );
        assert_eq!(
            display_name(&json!({"name": "", "given_name": "Ada"})),
            Some("Ada".to_string())
        );
        assert_eq!(display_name(&json!({})), None);
    }

    #[tokio::test]
    async fn test_get_profile_passthrough() {
        let server = MockServer::start().await;
        let profile = json!({"sub": "abc", "name": "Ada", "email": "ada@example.com", "locale": {"country": "GB"}});
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile.clone()))
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("tok"));

        let value = json(&ctx.call("linkedin_get_profile", json!({})).await);
        assert_eq!(value, profile);
    }

    #[tokio::test]
    async fn test_validate_token_bare_secret_reports_unknown_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "abc", "given_name": "Ada", "family_name": "Lovelace", "email": "ada@example.com"
            })))
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("abc123"));

        let value = json(&ctx.call("linkedin_validate_token", json!({})).await);
        assert_eq!(value["valid"], true);
        assert_eq!(value["name"], "Ada Lovelace");
        assert_eq!(value["email"], "ada@example.com");
        assert_eq!(value["scope"], "w_member_social");
        assert_eq!(value["expiry"], "unknown");
        assert_eq!(value["expiresAt"], Value::Null);
        assert_eq!(value["daysLeft"], Value::Null);
    }

    #[tokio::test]
    async fn test_validate_token_structured_secret_overlays_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Acme"})))
            .mount(&server)
            .await;
        let raw = r#"{"access_token":"abc123","scope":"w_organization_social r_organization_admin","generated_at":"2024-01-01T00:00:00Z","expires_in":5184000}"#;
        let ctx = context(&server, MemoryStore::with_secrets([("company", raw)]));

        let value = json(
            &ctx.call("linkedin_validate_token", json!({"account": "company"}))
                .await,
        );
        assert_eq!(value["account"], "Company Page");
        assert_eq!(value["scope"], "w_organization_social r_organization_admin");
        assert_eq!(value["expiresAt"], "2024-03-01T00:00:00+00:00");
        // Expired long ago, but still reported as valid by LinkedIn.
        assert_eq!(value["valid"], true);
        assert_eq!(value["expiry"], "expired");
        assert!(value["daysLeft"].as_i64().unwrap() < 0);
    }

    #[tokio::test]
    async fn test_list_organizations_maps_acls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/organizationAcls"))
            .and(query_param("q", "roleAssignee"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elements": [
                    {"organization": "urn:li:organization:10000001", "role": "ADMINISTRATOR", "state": "APPROVED"},
                    {"organizationTarget": "urn:li:organization:10000002", "role": "CONTENT_ADMINISTRATOR"},
                ],
                "paging": {"count": 10, "start": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("tok"));

        let value = json(&ctx.call("linkedin_list_organizations", json!({})).await);
        assert_eq!(
            value,
            json!({
                "organizations": [
                    {"organization": "urn:li:organization:10000001", "role": "ADMINISTRATOR"},
                    {"organization": "urn:li:organization:10000002", "role": "CONTENT_ADMINISTRATOR"},
                ],
                "account": "Personal Profile",
            })
        );
    }

    #[tokio::test]
    async fn test_list_organizations_without_elements_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paging": {}})))
            .mount(&server)
            .await;
        let ctx = context(&server, personal_only("tok"));

        let result = ctx.call("linkedin_list_organizations", json!({})).await;
        assert!(result.is_error);
        assert!(result.text().contains("unexpected LinkedIn response 200"));
        assert!(result.text().contains("paging"));
    }
}
