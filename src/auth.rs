//! Cookie-based authentication for the chat endpoint
//!
//! The CRM product keeps its own session management; this service only
//! forwards the session cookie to the data API's current-user endpoint and
//! carries the resolved identity through the turn.

use crate::crm::CrmClient;
use crate::error::{Result, VoxcrmError};

/// Name of the CRM session cookie
pub const SESSION_COOKIE: &str = "crm_session";

/// Identity and credentials resolved for one request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Stable user identifier
    pub user_id: String,
    /// Display name used for attribution
    pub display_name: String,
    /// The full cookie header value, forwarded to the data API
    pub cookie: String,
}

/// Actor identity handed to write tools for attribution
#[derive(Debug, Clone)]
pub struct Actor {
    /// Stable user identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl AuthContext {
    /// Returns the actor identity for write-tool attribution
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// Extracts the CRM session cookie from a Cookie header value
///
/// Returns `None` when the header is absent or does not carry the
/// `crm_session` cookie.
pub fn session_cookie(cookie_header: Option<&str>) -> Option<String> {
    let header = cookie_header?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(format!("{}={}", SESSION_COOKIE, value))
        } else {
            None
        }
    })
}

/// Authenticates a request from its Cookie header
///
/// # Errors
///
/// Returns `VoxcrmError::Auth` when the cookie is missing or the data API
/// rejects it.
pub async fn authenticate(crm: &CrmClient, cookie_header: Option<&str>) -> Result<AuthContext> {
    let cookie = session_cookie(cookie_header)
        .ok_or_else(|| VoxcrmError::Auth("missing session cookie".to_string()))?;

    let user = crm.current_user(&cookie).await?;
    Ok(AuthContext {
        user_id: user.id,
        display_name: user.name,
        cookie,
    })
}
