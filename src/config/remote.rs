//! Widget config hosted in a GitHub Gist.
//!
//! Embed pages may reference a Gist id instead of inlining the config. The raw
//! `config.json` URL is tried first; when that fails the Gist API is asked for
//! the file contents instead.

use super::schema::RawWidgetConfig;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

const CONFIG_FILE_NAME: &str = "config.json";
const USER_AGENT: &str = concat!("omnichat-widget/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct GistEndpoints {
    pub raw_base: String,
    pub api_base: String,
}

impl Default for GistEndpoints {
    fn default() -> Self {
        Self {
            raw_base: "https://gist.githubusercontent.com".into(),
            api_base: "https://api.github.com".into(),
        }
    }
}

impl GistEndpoints {
    fn raw_url(&self, gist_id: &str) -> String {
        format!(
            "{}/raw/{gist_id}/{CONFIG_FILE_NAME}",
            self.raw_base.trim_end_matches('/')
        )
    }

    fn api_url(&self, gist_id: &str) -> String {
        format!("{}/gists/{gist_id}", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
}

pub async fn fetch_gist_config(
    client: &reqwest::Client,
    endpoints: &GistEndpoints,
    gist_id: &str,
) -> Result<RawWidgetConfig, ConfigError> {
    let gist_id = gist_id.trim();
    if gist_id.is_empty() {
        return Err(ConfigError::Load("gist id is empty".into()));
    }

    match fetch_raw(client, endpoints, gist_id).await {
        Ok(config) => Ok(config),
        Err(error) => {
            tracing::warn!(gist_id, %error, "raw gist config unavailable, trying gist API");
            fetch_via_api(client, endpoints, gist_id).await
        }
    }
}

async fn fetch_raw(
    client: &reqwest::Client,
    endpoints: &GistEndpoints,
    gist_id: &str,
) -> Result<RawWidgetConfig, ConfigError> {
    let resp = client
        .get(endpoints.raw_url(gist_id))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(ConfigError::Load(format!(
            "gist not found ({})",
            resp.status()
        )));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    RawWidgetConfig::from_json_str(&body)
}

async fn fetch_via_api(
    client: &reqwest::Client,
    endpoints: &GistEndpoints,
    gist_id: &str,
) -> Result<RawWidgetConfig, ConfigError> {
    let resp = client
        .get(endpoints.api_url(gist_id))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(ConfigError::Load(format!(
            "gist API request failed ({})",
            resp.status()
        )));
    }

    let gist: GistResponse = resp
        .json()
        .await
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let content = gist
        .files
        .get(CONFIG_FILE_NAME)
        .and_then(|file| file.content.as_deref())
        .ok_or_else(|| ConfigError::Load(format!("gist {gist_id} has no {CONFIG_FILE_NAME}")))?;

    RawWidgetConfig::from_json_str(content)
}
