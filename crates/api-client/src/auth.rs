//! Access token acquisition
//!
//! Exchanges the configured credentials for an access token. The token is
//! read from the `okapiToken` body field in [`AuthMode::Legacy`], or from the
//! `folioAccessToken` cookie in [`AuthMode::Expiry`]. The authenticator never
//! stores the token itself; that is the client's job.

use crate::client::{endpoint_url, X_REQUEST_ID};
use crate::config::{AuthMode, ClientConfig};
use crate::error::{FolioError, FolioResult, UnexpectedResponse};
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Cookie carrying the access token in expiry-aware mode
pub const ACCESS_TOKEN_COOKIE: &str = "folioAccessToken";

#[derive(Deserialize)]
struct LegacyLoginResponse {
    #[serde(rename = "okapiToken")]
    okapi_token: Option<String>,
}

/// Fetches fresh access tokens from the login endpoint
pub struct Authenticator<'a> {
    http: &'a Client,
    config: &'a ClientConfig,
}

impl<'a> Authenticator<'a> {
    /// Create an authenticator over an HTTP client and configuration
    pub fn new(http: &'a Client, config: &'a ClientConfig) -> Self {
        Self { http, config }
    }

    /// Request a new access token
    ///
    /// # Errors
    ///
    /// A non-success login status is classified into [`UnexpectedResponse`];
    /// a success without the token artifact is [`FolioError::MissingToken`].
    #[instrument(skip(self), fields(mode = ?self.config.auth_mode))]
    pub async fn token(&self) -> FolioResult<String> {
        let url = endpoint_url(&self.config.base_url, self.config.auth_mode.login_path());
        let response = self
            .http
            .post(&url)
            .header(X_REQUEST_ID, Uuid::new_v4().to_string())
            .json(&self.config.login)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UnexpectedResponse::from_status(status.as_u16(), body).into());
        }

        let token = match self.config.auth_mode {
            AuthMode::Legacy => {
                let body: LegacyLoginResponse = response.json().await?;
                body.okapi_token.filter(|token| !token.is_empty()).ok_or_else(|| {
                    FolioError::MissingToken(format!(
                        "login response ({status}) has no okapiToken field"
                    ))
                })?
            }
            AuthMode::Expiry => cookie_value(response.headers(), ACCESS_TOKEN_COOKIE)
                .ok_or_else(|| {
                    FolioError::MissingToken(format!(
                        "login response ({status}) did not set the {ACCESS_TOKEN_COOKIE} cookie"
                    ))
                })?,
        };

        debug!("Obtained access token");
        Ok(token)
    }
}

/// Find a cookie by name among all `Set-Cookie` headers and return its value
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            Some((key.trim(), value.trim()))
        })
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}
