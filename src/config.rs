use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TRIPO_BASE_URL: &str = "https://api.tripo3d.ai/v2/openapi";

/// Process configuration.
///
/// Read once at startup from the environment, with a `.env` file in the
/// working directory filling in anything not already set.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub tripo_api_key: String,
    pub tripo_base_url: String,
    /// `None` leaves outbound calls without a deadline.
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{key} is not set"));

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => 3000,
        };

        let upstream_timeout = var("UPSTREAM_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("UPSTREAM_TIMEOUT_SECS is not a number: {raw}"))
            })
            .transpose()?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            public_dir: PathBuf::from(var("PUBLIC_DIR").unwrap_or_else(|| "public".to_string())),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            tripo_api_key: required("TRIPO_API_KEY")?,
            tripo_base_url: var("TRIPO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TRIPO_BASE_URL.to_string()),
            upstream_timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().context("Failed to build HTTP client")
    }
}
