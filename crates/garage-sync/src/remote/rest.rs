//! # PostgREST Backend
//!
//! [`RemoteBackend`] over a PostgREST endpoint (Supabase or self-hosted).
//!
//! ## Requests
//! ```text
//! select_all(t)        GET    {base}/rest/v1/{t}?select=*
//! select_one(t, id)    GET    {base}/rest/v1/{t}?select=*&id=eq.{id}
//! upsert(t, row)       POST   {base}/rest/v1/{t}
//!                             Prefer: resolution=merge-duplicates,return=minimal
//! update(t, id, f)     PATCH  {base}/rest/v1/{t}?id=eq.{id}
//! delete(t, id)        DELETE {base}/rest/v1/{t}?id=eq.{id}
//!
//! every request:       apikey: {key}
//!                      Authorization: Bearer {key}
//! ```
//!
//! Non-2xx responses become [`SyncError::Remote`] with PostgREST's
//! `message` field, or the raw body when there is none.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::GarageConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteBackend;

const REST_PATH: &str = "rest/v1/";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// PostgREST client.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    /// `{base}/rest/v1/`, always with the trailing slash.
    endpoint: Url,
    api_key: String,
}

impl RestBackend {
    /// Creates a backend for the project at `base_url`.
    ///
    /// ## Example
    /// ```rust
    /// use garage_sync::remote::RestBackend;
    /// use std::time::Duration;
    ///
    /// let backend = RestBackend::new("https://project.supabase.co", "anon", Duration::from_secs(15));
    /// assert!(backend.is_ok());
    /// ```
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> SyncResult<Self> {
        let base = format!("{}/", base_url.trim().trim_end_matches('/'));
        let endpoint = Url::parse(&base)?.join(REST_PATH)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client error: {}", e)))?;

        Ok(RestBackend {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    /// Builds a backend from config, or `None` when no remote URL is set.
    pub fn from_config(config: &GarageConfig) -> SyncResult<Option<Self>> {
        config
            .remote_url()
            .map(|url| Self::new(url, config.api_key(), config.timeout()))
            .transpose()
    }

    fn table_url(&self, table: &str, id: Option<&str>, select: bool) -> SyncResult<Url> {
        let mut url = self.endpoint.join(table)?;
        if select || id.is_some() {
            let mut query = url.query_pairs_mut();
            if select {
                query.append_pair("select", "*");
            }
            if let Some(id) = id {
                query.append_pair("id", &format!("eq.{}", id));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Sends the request, turning transport and HTTP failures into
    /// [`SyncError`]s tagged with the table.
    async fn send(&self, table: &str, request: RequestBuilder) -> SyncResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!(table = %table, error = %e, "Remote request failed");
            SyncError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        error!(table = %table, status = status.as_u16(), message = %message, "Remote store rejected request");
        Err(SyncError::Remote {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

/// PostgREST error bodies look like
/// `{"code":"23502","details":null,"hint":null,"message":"null value ..."}`.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn select_all(&self, table: &str) -> SyncResult<Vec<Value>> {
        let url = self.table_url(table, None, true)?;
        debug!(table = %table, "GET all rows");

        let response = self.send(table, self.request(Method::GET, url)).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn select_one(&self, table: &str, id: &str) -> SyncResult<Option<Value>> {
        let url = self.table_url(table, Some(id), true)?;
        debug!(table = %table, id = %id, "GET row");

        let response = self.send(table, self.request(Method::GET, url)).await?;
        let rows = response.json::<Vec<Value>>().await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert(&self, table: &str, row: Value) -> SyncResult<()> {
        let url = self.table_url(table, None, false)?;
        debug!(table = %table, id = ?row.get("id"), "POST upsert");

        let request = self
            .request(Method::POST, url)
            .header("Prefer", UPSERT_PREFER)
            .json(&row);
        self.send(table, request).await?;
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, fields: Value) -> SyncResult<()> {
        let url = self.table_url(table, Some(id), false)?;
        debug!(table = %table, id = %id, "PATCH row");

        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&fields);
        self.send(table, request).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> SyncResult<()> {
        let url = self.table_url(table, Some(id), false)?;
        debug!(table = %table, id = %id, "DELETE row");

        self.send(table, self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
