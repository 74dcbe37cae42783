//! PostgREST client.
//!
//! Speaks the Supabase REST API with the service-role key. The client is
//! deliberately narrow: filtered single-row selects, inserts with optional
//! duplicate-ignoring conflict resolution, and filtered updates are the
//! only operations the job and cache repositories need.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Supabase client configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`
    pub base_url: String,
    /// Service-role API key (server-side only)
    pub service_role_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl SupabaseConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DbResult<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| DbError::config_error("SUPABASE_URL not set"))?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| DbError::config_error("SUPABASE_SERVICE_ROLE_KEY not set"))?;

        if service_role_key.is_empty() {
            return Err(DbError::config_error(
                "SUPABASE_SERVICE_ROLE_KEY cannot be empty",
            ));
        }

        Ok(Self {
            base_url,
            service_role_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

/// Supabase PostgREST client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Create a new client.
    pub fn new(config: SupabaseConfig) -> DbResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("vox-supabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DbError::Network)?;

        let rest_url = format!("{}/rest/v1", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            rest_url,
            api_key: config.service_role_key,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> DbResult<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    fn table_url(&self, table: &str, filter: Option<(&str, &str)>) -> String {
        match filter {
            Some((column, value)) => format!(
                "{}/{}?{}=eq.{}",
                self.rest_url,
                table,
                column,
                urlencoding::encode(value)
            ),
            None => format!("{}/{}", self.rest_url, table),
        }
    }

    /// Select at most one row matching `column = value`.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> DbResult<Option<T>> {
        let url = format!("{}&limit=1", self.table_url(table, Some((column, value))));

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, &url, response).await);
        }

        let mut rows: Vec<T> = response.json().await?;
        debug!(table = table, column = column, "select_one returned {} row(s)", rows.len());
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Insert a row.
    ///
    /// With `ignore_duplicates` set, the insert is an atomic
    /// "insert if not exists" on `conflict_column`: PostgREST resolves the
    /// unique-key conflict server-side and the call reports whether a row
    /// was actually written.
    pub async fn insert<T: Serialize>(
        &self,
        table: &str,
        row: &T,
        ignore_duplicates: Option<&str>,
    ) -> DbResult<bool> {
        let mut url = self.table_url(table, None);

        let prefer = if let Some(conflict_column) = ignore_duplicates {
            url = format!("{}?on_conflict={}", url, conflict_column);
            "resolution=ignore-duplicates,return=representation"
        } else {
            "return=representation"
        };

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
            .json(row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, &url, response).await);
        }

        // With ignore-duplicates, a swallowed conflict returns an empty set.
        let written: Vec<serde_json::Value> = response.json().await?;
        Ok(!written.is_empty())
    }

    /// Update rows matching `column = value`.
    pub async fn update<T: Serialize>(
        &self,
        table: &str,
        column: &str,
        value: &str,
        changes: &T,
    ) -> DbResult<()> {
        let url = self.table_url(table, Some((column, value)));

        let response = self
            .http
            .patch(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(changes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, &url, response).await);
        }

        Ok(())
    }

    async fn error_for_status(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> DbError {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => DbError::not_found(url.to_string()),
            StatusCode::TOO_MANY_REQUESTS => DbError::RateLimited,
            _ => DbError::request_failed(format!("{} returned {}: {}", url, status, body)),
        }
    }
}
