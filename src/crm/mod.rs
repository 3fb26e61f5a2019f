//! CRM data-API client
//!
//! Thin client over the hosted CRM data API. All tool handlers perform
//! their reads and writes through this client; each call is one generic
//! table operation (`read`, `create`, `update`, `delete`) plus the
//! current-user lookup the auth layer uses.
//!
//! Authentication: requests forward the caller's session cookie. Calls
//! made without a cookie (tables lacking per-user ownership columns) fall
//! back to the configured service token as a bearer credential.

use crate::config::CrmConfig;
use crate::error::{Result, VoxcrmError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// The authenticated CRM user resolved from a session cookie
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    /// Stable user identifier
    pub id: String,
    /// Display name used for attribution
    pub name: String,
    /// Preferred language flag, if the profile carries one
    #[serde(default)]
    pub language: Option<String>,
}

/// Client for the CRM data API
pub struct CrmClient {
    client: Client,
    config: CrmConfig,
}

impl CrmClient {
    /// Creates a new CRM data-API client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: CrmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("voxcrm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VoxcrmError::Crm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Resolves the current user from a forwarded session cookie
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Auth` when the API answers 401/403, and
    /// `VoxcrmError::Crm` for any other failure.
    pub async fn current_user(&self, cookie: &str) -> Result<CurrentUser> {
        let url = format!("{}/api/me", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .map_err(|e| VoxcrmError::Crm(format!("current-user request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(VoxcrmError::Auth("session cookie rejected".to_string()).into());
        }
        if !status.is_success() {
            return Err(
                VoxcrmError::Crm(format!("current-user request returned {}", status)).into(),
            );
        }

        let user = response
            .json::<CurrentUser>()
            .await
            .map_err(|e| VoxcrmError::Crm(format!("invalid current-user response: {}", e)))?;
        Ok(user)
    }

    /// Reads rows from a table, optionally filtered
    ///
    /// # Arguments
    ///
    /// * `table` - Table name, e.g. `contacts`
    /// * `filters` - Query-string filter pairs
    /// * `cookie` - Caller's session cookie, when the table is user-owned
    pub async fn read(
        &self,
        table: &str,
        filters: &[(&str, String)],
        cookie: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}/api/{}", self.config.api_base, table);
        let request = self.client.get(&url).query(filters);
        self.dispatch(request, cookie, table).await
    }

    /// Creates a row in a table
    pub async fn create(&self, table: &str, payload: &Value, cookie: Option<&str>) -> Result<Value> {
        let url = format!("{}/api/{}", self.config.api_base, table);
        let request = self.client.post(&url).json(payload);
        self.dispatch(request, cookie, table).await
    }

    /// Updates a row by id
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        payload: &Value,
        cookie: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}/api/{}/{}", self.config.api_base, table, id);
        let request = self.client.patch(&url).json(payload);
        self.dispatch(request, cookie, table).await
    }

    /// Deletes a row by id
    pub async fn delete(&self, table: &str, id: &str, cookie: Option<&str>) -> Result<Value> {
        let url = format!("{}/api/{}/{}", self.config.api_base, table, id);
        let request = self.client.delete(&url);
        self.dispatch(request, cookie, table).await
    }

    /// Attaches credentials, sends, and decodes one table operation
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        cookie: Option<&str>,
        table: &str,
    ) -> Result<Value> {
        let request = match cookie {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => match &self.config.service_token {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
        };

        let response = request
            .send()
            .await
            .map_err(|e| VoxcrmError::Crm(format!("{} request failed: {}", table, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoxcrmError::Crm(format!(
                "{} request returned {}: {}",
                table, status, body
            ))
            .into());
        }

        // DELETE and some writes answer 204 with an empty body
        let body = response
            .text()
            .await
            .map_err(|e| VoxcrmError::Crm(format!("{} response read failed: {}", table, e)))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| VoxcrmError::Crm(format!("invalid {} response: {}", table, e)).into())
    }
}
