use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::services::catalog_api::{CatalogApi, Resource};

#[derive(Deserialize)]
struct PackageShowResponse {
    success: bool,
    result: Option<Package>,
}

#[derive(Deserialize)]
struct Package {
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Deserialize)]
struct RawResource {
    name: Option<String>,
    format: Option<String>,
    url: Option<String>,
    #[serde(default)]
    datastore_active: bool,
    last_modified: Option<String>,
}

/// Client for a CKAN `package_show` endpoint.
pub struct CkanClient {
    api_url: reqwest::Url,
    package_id: String,
    http: reqwest::Client,
}

impl CkanClient {
    pub fn new(api_url: &str, package_id: &str) -> Result<Self> {
        let api_url = reqwest::Url::parse(api_url)
            .with_context(|| format!("invalid catalog API URL {api_url:?}"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_url,
            package_id: package_id.to_string(),
            http,
        })
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }
}

#[async_trait]
impl CatalogApi for CkanClient {
    async fn list_resources(&self) -> Result<Vec<Resource>> {
        debug!(api_url = %self.api_url, package_id = %self.package_id, "Fetching package metadata");

        let response = self
            .http
            .get(self.api_url.clone())
            .query(&[("id", self.package_id.as_str())])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read response: {}", e))?;

        parse_package_show(&body)
    }
}

/// Extracts the resource list from a `package_show` response body.
///
/// Resources without a URL are skipped.
pub fn parse_package_show(body: &str) -> Result<Vec<Resource>> {
    let response: PackageShowResponse = serde_json::from_str(body)
        .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))?;

    if !response.success {
        return Err(anyhow::anyhow!("API call failed to retrieve package info"));
    }

    let package = response
        .result
        .ok_or_else(|| anyhow::anyhow!("API response has no result"))?;

    let resources = package
        .resources
        .into_iter()
        .filter_map(|raw| {
            let url = raw.url.filter(|u| !u.is_empty())?;
            Some(Resource {
                name: raw.name.unwrap_or_default(),
                format: raw.format.unwrap_or_default(),
                url,
                datastore_active: raw.datastore_active,
                last_modified: raw.last_modified.as_deref().and_then(parse_timestamp),
            })
        })
        .collect();

    Ok(resources)
}

/// CKAN timestamps are naive ISO-8601, with or without fractional seconds.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
