//! Central module for application-wide configuration settings.
//!
//! This module handles loading the API location, the public app URL used
//! for shareable join links, where the access token is persisted, and the
//! per-request timeout.

use anyhow::{Context, Result, bail};
use expanduser::expanduser;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://groupifyassist.onrender.com/api";
pub const DEFAULT_APP_BASE_URL: &str = "https://groupifyassist.onrender.com";
pub const DEFAULT_TOKEN_PATH: &str = "~/.groupify/access_token";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub app_base_url: String,
    pub token_path: PathBuf,
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("GROUPIFY_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = normalize_base_url(&api_base_url)
            .context("GROUPIFY_API_BASE_URL must be an absolute http(s) URL")?;

        let app_base_url = env::var("GROUPIFY_APP_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_APP_BASE_URL.to_string());
        let app_base_url = normalize_base_url(&app_base_url)
            .context("GROUPIFY_APP_BASE_URL must be an absolute http(s) URL")?;

        let token_path =
            env::var("GROUPIFY_TOKEN_PATH").unwrap_or_else(|_| DEFAULT_TOKEN_PATH.to_string());
        let token_path = expanduser(&token_path)
            .with_context(|| format!("GROUPIFY_TOKEN_PATH could not be expanded: {token_path}"))?;

        let request_timeout_seconds = env::var("GROUPIFY_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("GROUPIFY_REQUEST_TIMEOUT_SECONDS must be a valid number")?;

        Ok(Config {
            api_base_url,
            app_base_url,
            token_path,
            request_timeout_seconds,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Trims trailing slashes so paths can be appended with a single `/`.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed).with_context(|| format!("invalid URL: {raw}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("unsupported scheme: {}", parsed.scheme());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://example.com/api/").unwrap(),
            "https://example.com/api"
        );
        assert_eq!(
            normalize_base_url("  http://127.0.0.1:8000 ").unwrap(),
            "http://127.0.0.1:8000"
        );
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }
}
