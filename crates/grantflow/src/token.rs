//! Access tokens and token response parsing

use crate::error::{FlowError, Result};
use crate::provider::TokenFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Normalized token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    /// Every field the provider returned, including the ones above.
    raw: BTreeMap<String, String>,
    expires_at: Option<SystemTime>,
}

impl AccessToken {
    /// Build a token from decoded response fields.
    ///
    /// Fails with [`FlowError::InvalidAccessToken`] when `access_token` is
    /// absent or empty.
    pub fn from_fields(raw: BTreeMap<String, String>) -> Result<Self> {
        let access_token = match raw.get("access_token").filter(|t| !t.is_empty()) {
            Some(token) => token.clone(),
            None => return Err(missing_token(&raw)),
        };

        let expires_in = raw.get("expires_in").and_then(|v| v.trim().parse::<u64>().ok());
        let field = |name: &str| raw.get(name).filter(|v| !v.is_empty()).cloned();

        Ok(Self {
            token_type: field("token_type"),
            refresh_token: field("refresh_token"),
            scope: field("scope"),
            expires_at: expires_in
                .and_then(|secs| SystemTime::now().checked_add(Duration::from_secs(secs))),
            access_token,
            expires_in,
            raw,
        })
    }

    /// Parse a token endpoint body in the given format.
    pub fn parse(body: &str, format: TokenFormat) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(FlowError::InvalidAccessToken(
                "empty response body".to_string(),
            ));
        }

        let fields = match format {
            TokenFormat::Form => decode_form(body)?,
            TokenFormat::Json => decode_json(body)?,
        };
        Self::from_fields(fields)
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the token type, if returned.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Lifetime in seconds as returned by the provider.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Get the refresh token, if returned.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Granted scope string, if returned.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Granted scopes, split on spaces or commas.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| {
                s.split(|c: char| c == ' ' || c == ',')
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All returned fields.
    pub fn raw_fields(&self) -> &BTreeMap<String, String> {
        &self.raw
    }

    /// Look up any returned field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    /// Check if the token is expired. Tokens without a lifetime never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => SystemTime::now() >= expires_at,
            None => false,
        }
    }

    /// Get the `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        let token_type = match self.token_type.as_deref() {
            Some(t) if t.eq_ignore_ascii_case("bearer") => "Bearer",
            Some(t) => t,
            None => "Bearer",
        };
        format!("{} {}", token_type, self.access_token)
    }
}

fn missing_token(raw: &BTreeMap<String, String>) -> FlowError {
    match raw.get("error") {
        Some(error) => {
            let description = raw
                .get("error_description")
                .map(|d| format!(": {}", d))
                .unwrap_or_default();
            FlowError::InvalidAccessToken(format!(
                "provider returned error {}{}",
                error, description
            ))
        }
        None => FlowError::InvalidAccessToken("missing access_token".to_string()),
    }
}

fn decode_form(body: &str) -> Result<BTreeMap<String, String>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body.trim())
        .map_err(|e| FlowError::InvalidAccessToken(format!("malformed form body: {}", e)))?;
    Ok(pairs.into_iter().collect())
}

fn decode_json(body: &str) -> Result<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FlowError::InvalidAccessToken(format!("malformed JSON body: {}", e)))?;

    let object = match value {
        serde_json::Value::Object(object) => object,
        _ => {
            return Err(FlowError::InvalidAccessToken(
                "JSON body is not an object".to_string(),
            ))
        }
    };

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form() {
        let token = AccessToken::parse(
            "access_token=abc123&token_type=bearer&expires_in=3600&refresh_token=r1&scope=repo%2Cgist",
            TokenFormat::Form,
        )
        .unwrap();

        assert_eq!(token.access_token(), "abc123");
        assert_eq!(token.token_type(), Some("bearer"));
        assert_eq!(token.expires_in(), Some(3600));
        assert_eq!(token.refresh_token(), Some("r1"));
        assert_eq!(token.scope(), Some("repo,gist"));
        assert_eq!(token.scopes(), vec!["repo", "gist"]);
        assert!(!token.is_expired());
        assert_eq!(token.authorization_header(), "Bearer abc123");
    }

    #[test]
    fn test_parse_keeps_unknown_fields() {
        let token =
            AccessToken::parse("access_token=abc&user_id=42&team=core", TokenFormat::Form).unwrap();

        assert_eq!(token.field("user_id"), Some("42"));
        assert_eq!(token.field("team"), Some("core"));
        assert_eq!(token.raw_fields().len(), 3);
        assert_eq!(token.token_type(), None);
        assert_eq!(token.expires_in(), None);
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(matches!(
            AccessToken::parse("", TokenFormat::Form),
            Err(FlowError::InvalidAccessToken(_))
        ));
        assert!(matches!(
            AccessToken::parse("  \n", TokenFormat::Json),
            Err(FlowError::InvalidAccessToken(_))
        ));
    }

    #[test]
    fn test_parse_without_access_token() {
        assert!(matches!(
            AccessToken::parse("foo=bar", TokenFormat::Form),
            Err(FlowError::InvalidAccessToken(_))
        ));
        assert!(matches!(
            AccessToken::parse("access_token=&token_type=bearer", TokenFormat::Form),
            Err(FlowError::InvalidAccessToken(_))
        ));
    }

    #[test]
    fn test_parse_provider_error() {
        let err = AccessToken::parse(
            "error=bad_verification_code&error_description=The+code+is+incorrect",
            TokenFormat::Form,
        )
        .unwrap_err();

        match err {
            FlowError::InvalidAccessToken(message) => {
                assert!(message.contains("bad_verification_code"));
                assert!(message.contains("The code is incorrect"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_json() {
        let body = serde_json::json!({
            "access_token": "ya29.token",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "openid email",
            "id_token": null,
            "extra": {"nested": true}
        })
        .to_string();

        let token = AccessToken::parse(&body, TokenFormat::Json).unwrap();
        assert_eq!(token.access_token(), "ya29.token");
        assert_eq!(token.expires_in(), Some(3599));
        assert_eq!(token.scopes(), vec!["openid", "email"]);
        assert_eq!(token.field("id_token"), None);
        assert_eq!(token.field("extra"), Some(r#"{"nested":true}"#));
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        assert!(matches!(
            AccessToken::parse("[1,2]", TokenFormat::Json),
            Err(FlowError::InvalidAccessToken(_))
        ));
        assert!(matches!(
            AccessToken::parse("access_token=abc", TokenFormat::Json),
            Err(FlowError::InvalidAccessToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = AccessToken::parse("access_token=abc&expires_in=0", TokenFormat::Form).unwrap();
        assert!(token.is_expired());
    }

    #[test]
    fn test_huge_expires_in_never_expires() {
        let token = AccessToken::parse(
            "access_token=abc&expires_in=18446744073709551615",
            TokenFormat::Form,
        )
        .unwrap();

        assert_eq!(token.expires_in(), Some(u64::MAX));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_serde_roundtrip_preserves_fields() {
        let token = AccessToken::parse("access_token=abc&foo=bar", TokenFormat::Form).unwrap();
        let json = serde_json::to_string(&token).unwrap();
        let restored: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, token);
    }
}
