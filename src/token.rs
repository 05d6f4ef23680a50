//! The CLI token format (§6 external interface). A token is
//! `{prefix}.{base64url(JSON)}` where `prefix = {environment}--{group}--{team}`
//! and the JSON payload carries the credentials a CLI would need to mint its
//! own access token against the platform. This crate never serves tokens over
//! HTTP; it only implements the parse/format/validate contract and the
//! "time since generated" humanizer as pure, independently testable
//! functions, since the CLI that actually hands these to users lives outside
//! this crate.

use anyhow::{anyhow, bail};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub environment: String,
    pub group: String,
    pub team: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    pub generated_at: i64,
}

/// Renders `{prefix}.{base64url(JSON)}`. Does not validate the payload --
/// callers are expected to have built it from already-known-good fields.
pub fn format_token(payload: &TokenPayload) -> Result<String> {
    let prefix = format!("{}--{}--{}", payload.environment, payload.group, payload.team);
    let json = serde_json::to_vec(payload)?;
    let encoded = URL_SAFE_NO_PAD.encode(json);
    Ok(format!("{prefix}.{encoded}"))
}

/// Parses a token string into a payload, filling `token_url`/`server_url`
/// from the given defaults when the token itself left them blank.
pub fn parse_token(raw: &str, default_token_url: &str, default_server_url: &str) -> Result<TokenPayload> {
    let (prefix, encoded) = raw.split_once('.').ok_or_else(|| anyhow!("token is missing the '.' separator"))?;
    let mut parts = prefix.splitn(3, "--");
    let environment = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| anyhow!("token prefix is missing environment"))?;
    let group = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| anyhow!("token prefix is missing group"))?;
    let team = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| anyhow!("token prefix is missing team"))?;

    let decoded = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| anyhow!("token payload is not valid base64url: {e}"))?;
    let mut payload: TokenPayload = serde_json::from_slice(&decoded).map_err(|e| anyhow!("token payload is not valid JSON: {e}"))?;

    if payload.environment != environment || payload.group != group || payload.team != team {
        bail!("token prefix does not match its payload");
    }
    if payload.token_url.is_none() {
        payload.token_url = Some(default_token_url.to_string());
    }
    if payload.server_url.is_none() {
        payload.server_url = Some(default_server_url.to_string());
    }

    validate_token(&payload)?;
    Ok(payload)
}

/// All non-URL fields must be present and both URLs must parse (§6).
pub fn validate_token(payload: &TokenPayload) -> Result<()> {
    if payload.environment.is_empty() || payload.group.is_empty() || payload.team.is_empty() || payload.client_id.is_empty() || payload.client_secret.is_empty() {
        bail!("token is missing a required field");
    }
    let token_url = payload.token_url.as_deref().ok_or_else(|| anyhow!("token is missing token_url"))?;
    let server_url = payload.server_url.as_deref().ok_or_else(|| anyhow!("token is missing server_url"))?;
    url::Url::parse(token_url).map_err(|e| anyhow!("token_url does not parse: {e}"))?;
    url::Url::parse(server_url).map_err(|e| anyhow!("server_url does not parse: {e}"))?;
    Ok(())
}

/// Humanizes the age of `generated_at` relative to `now`, both epoch seconds.
pub fn time_since_generated(generated_at: i64, now: i64) -> String {
    let age = (now - generated_at).max(0);
    if age < 5 * 60 {
        "just now".to_string()
    } else if age < 60 * 60 {
        let minutes = age / 60;
        format!("{minutes} minutes ago")
    } else if age < 24 * 60 * 60 {
        let hours = age / (60 * 60);
        if hours == 1 { "1 hour ago".to_string() } else { format!("{hours} hours ago") }
    } else {
        let days = age / (24 * 60 * 60);
        if days == 1 { "1 day ago".to_string() } else { format!("{days} days ago") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenPayload {
        TokenPayload {
            environment: "prod".to_string(),
            group: "team-group".to_string(),
            team: "checkout".to_string(),
            client_id: "abc123".to_string(),
            client_secret: "s3cr3t".to_string(),
            token_url: Some("https://auth.example.com/token".to_string()),
            server_url: Some("https://api.example.com".to_string()),
            generated_at: 1_000_000,
        }
    }

    #[test]
    fn format_then_parse_round_trips() {
        let payload = sample();
        let token = format_token(&payload).unwrap();
        assert!(token.starts_with("prod--team-group--checkout."));
        let parsed = parse_token(&token, "https://fallback/token", "https://fallback/server").unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn parse_fills_missing_urls_from_defaults() {
        let mut payload = sample();
        payload.token_url = None;
        payload.server_url = None;
        let token = format_token(&payload).unwrap();
        let parsed = parse_token(&token, "https://fallback/token", "https://fallback/server").unwrap();
        assert_eq!(parsed.token_url.as_deref(), Some("https://fallback/token"));
        assert_eq!(parsed.server_url.as_deref(), Some("https://fallback/server"));
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(parse_token("not-a-token", "https://t", "https://s").is_err());
    }

    #[test]
    fn parse_rejects_prefix_payload_mismatch() {
        let payload = sample();
        let token = format_token(&payload).unwrap();
        let tampered = token.replacen("prod--", "staging--", 1);
        assert!(parse_token(&tampered, "https://t", "https://s").is_err());
    }

    #[test]
    fn validate_requires_non_url_fields() {
        let mut payload = sample();
        payload.client_secret.clear();
        assert!(validate_token(&payload).is_err());
    }

    #[test]
    fn validate_requires_urls_to_parse() {
        let mut payload = sample();
        payload.token_url = Some("not a url".to_string());
        assert!(validate_token(&payload).is_err());
    }

    #[test]
    fn humanizes_age_buckets() {
        assert_eq!(time_since_generated(1000, 1000 + 60), "just now");
        assert_eq!(time_since_generated(1000, 1000 + 10 * 60), "10 minutes ago");
        assert_eq!(time_since_generated(1000, 1000 + 60 * 60), "1 hour ago");
        assert_eq!(time_since_generated(1000, 1000 + 3 * 60 * 60), "3 hours ago");
        assert_eq!(time_since_generated(1000, 1000 + 24 * 60 * 60), "1 day ago");
        assert_eq!(time_since_generated(1000, 1000 + 3 * 24 * 60 * 60), "3 days ago");
    }
}
