//! Main FOLIO client implementation
//!
//! Every request goes through [`FolioClient::with_token_refresh`]: the request
//! is sent with the token currently stored on the client; if the server answers
//! 401 or 403 the client logs in again, stores the new token and sends the
//! request exactly once more. A second authentication failure is returned to
//! the caller.
//!
//! The stored token is shared by every clone of the client. Refreshes are
//! serialised, and a caller whose request failed with a token that another
//! caller already replaced reuses the replacement instead of logging in again.

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::endpoints::{
    DataImportApi, HoldingsApi, InventoryApi, JobStatus, OrganizationsApi, RecordsEditorApi,
    SourceStorageApi, UsersApi,
};
use crate::error::{is_auth_failure_status, FolioError, FolioResult, UnexpectedResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
pub const X_REQUEST_ID: &str = "X-Request-ID";

/// Header carrying the access token
pub const OKAPI_TOKEN_HEADER: &str = "x-okapi-token";

/// Empty query string for requests without parameters
pub const NO_QUERY: &[(&str, &str)] = &[];

/// Token stored until the first real login.
///
/// Configuring a client must not touch the network, and an empty token header
/// makes a malformed request, so a placeholder is sent instead. The first
/// request is rejected with 401 and triggers the real login.
const PLACEHOLDER_TOKEN: &str = "a temporary dummy token to avoid hitting the API before it is needed";

/// Access token shared by all clones of a client
struct TokenStore {
    current: RwLock<String>,
    refresh: Mutex<()>,
}

impl TokenStore {
    fn new(token: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(token.into()),
            refresh: Mutex::new(()),
        }
    }

    fn get(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: String) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("current", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// FOLIO API client
///
/// Cheap to clone; clones share the HTTP connection pool, configuration and
/// access token.
#[derive(Clone, Debug)]
pub struct FolioClient {
    inner: Client,
    config: Arc<ClientConfig>,
    token: Arc<TokenStore>,
}

impl FolioClient {
    /// Create a client from a configuration
    ///
    /// No request is made; the first call authenticates lazily.
    pub fn with_config(config: ClientConfig) -> FolioResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain"));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("folio-client/", env!("CARGO_PKG_VERSION"))),
        );

        for (name, value) in &config.okapi_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FolioError::config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FolioError::config(format!("invalid value for header {name}: {e}")))?;
            default_headers.insert(name, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(FolioError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            token: Arc::new(TokenStore::new(PLACEHOLDER_TOKEN)),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Access token currently stored on the client
    #[must_use]
    pub fn current_token(&self) -> String {
        self.token.get()
    }

    /// Log in now and store the token, instead of waiting for the first 401
    pub async fn login(&self) -> FolioResult<()> {
        let _guard = self.token.refresh.lock().await;
        let token = self.authenticator().token().await?;
        self.token.set(token);
        info!("Logged in to FOLIO");
        Ok(())
    }

    fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(&self.inner, &self.config)
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access inventory lookups
    #[must_use]
    pub fn inventory(&self) -> InventoryApi {
        InventoryApi::new(self.clone())
    }

    /// Access source record storage
    #[must_use]
    pub fn source_storage(&self) -> SourceStorageApi {
        SourceStorageApi::new(self.clone())
    }

    /// Access data import
    #[must_use]
    pub fn data_import(&self) -> DataImportApi {
        DataImportApi::new(self.clone())
    }

    /// Access the MARC records editor
    #[must_use]
    pub fn records_editor(&self) -> RecordsEditorApi {
        RecordsEditorApi::new(self.clone())
    }

    /// Access organization records
    #[must_use]
    pub fn organizations(&self) -> OrganizationsApi {
        OrganizationsApi::new(self.clone())
    }

    /// Access user records
    #[must_use]
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Access holdings records of one instance
    #[must_use]
    pub fn holdings(&self, instance_id: impl Into<String>) -> HoldingsApi {
        HoldingsApi::new(self.clone(), instance_id.into())
    }

    /// Track an existing data import job
    #[must_use]
    pub fn job_status(&self, job_execution_id: impl Into<String>) -> JobStatus {
        JobStatus::new(self.clone(), job_execution_id.into())
    }

    // -------------------------------------------------------------------------
    // Authenticated HTTP methods
    // -------------------------------------------------------------------------

    /// Send an authenticated GET request
    ///
    /// Returns `None` when the response body is empty.
    #[instrument(skip(self, query), fields(request_id = tracing::field::Empty))]
    pub async fn get<Q>(&self, path: &str, query: &Q) -> FolioResult<Option<Value>>
    where
        Q: Serialize + ?Sized,
    {
        let response = self
            .with_token_refresh(|token| {
                self.request_builder(Method::GET, path)
                    .query(query)
                    .header(OKAPI_TOKEN_HEADER, token)
                    .send()
            })
            .await?;
        parse_body(response).await
    }

    /// Send an authenticated POST request with a JSON body
    #[instrument(skip(self, body), fields(request_id = tracing::field::Empty))]
    pub async fn post<B>(&self, path: &str, body: &B) -> FolioResult<Option<Value>>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .with_token_refresh(|token| {
                self.request_builder(Method::POST, path)
                    .header(OKAPI_TOKEN_HEADER, token)
                    .json(body)
                    .send()
            })
            .await?;
        parse_body(response).await
    }

    /// Send an authenticated PUT request with a JSON body
    #[instrument(skip(self, body), fields(request_id = tracing::field::Empty))]
    pub async fn put<B>(&self, path: &str, body: &B) -> FolioResult<Option<Value>>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .with_token_refresh(|token| {
                self.request_builder(Method::PUT, path)
                    .header(OKAPI_TOKEN_HEADER, token)
                    .json(body)
                    .send()
            })
            .await?;
        parse_body(response).await
    }

    /// Send an authenticated POST request with a raw body
    #[instrument(skip(self, bytes), fields(request_id = tracing::field::Empty, len = bytes.len()))]
    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> FolioResult<Option<Value>> {
        let response = self
            .with_token_refresh(|token| {
                self.request_builder(Method::POST, path)
                    .header(OKAPI_TOKEN_HEADER, token)
                    .header(CONTENT_TYPE, content_type)
                    .body(bytes.to_vec())
                    .send()
            })
            .await?;
        parse_body(response).await
    }

    /// Build an unauthenticated request for a path under the base URL
    pub fn request_builder(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        self.inner
            .request(method, endpoint_url(&self.config.base_url, path))
            .header(X_REQUEST_ID, request_id)
    }

    /// Run a single HTTP request with one-shot token recovery
    ///
    /// `send` receives the token to use and must perform exactly one request.
    /// It is called with the stored token; if that is rejected with 401 or
    /// 403, it is called once more with a freshly obtained token. Any other
    /// non-success status, including a second rejection, is classified and
    /// returned as an error.
    pub async fn with_token_refresh<F, Fut>(&self, mut send: F) -> FolioResult<Response>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let start = Instant::now();
        let token = self.token.get();
        let response = send(token.clone()).await?;

        if !is_auth_failure_status(response.status().as_u16()) {
            return check_status(response, start).await;
        }

        debug!(status = response.status().as_u16(), "Access token rejected, refreshing");
        let fresh = self.refresh_token(&token).await?;
        let response = send(fresh).await?;
        check_status(response, start).await
    }

    /// Replace `stale` with a new token, unless another caller already did
    async fn refresh_token(&self, stale: &str) -> FolioResult<String> {
        let _guard = self.token.refresh.lock().await;

        let current = self.token.get();
        if current != stale {
            debug!("Access token already refreshed by another request");
            return Ok(current);
        }

        let fresh = self.authenticator().token().await?;
        self.token.set(fresh.clone());
        metrics::counter!("folio.token_refresh").increment(1);
        info!("Access token refreshed");
        Ok(fresh)
    }
}

/// Join a base URL and a path with exactly one slash between them
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pass success responses through; classify everything else
async fn check_status(response: Response, start: Instant) -> FolioResult<Response> {
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_success() {
        debug!(status = status.as_u16(), elapsed_ms, "Request succeeded");
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(status = status.as_u16(), elapsed_ms, "Request failed");
    Err(UnexpectedResponse::from_status(status.as_u16(), body).into())
}

/// Parse a JSON body, treating a blank body as `None`
async fn parse_body(response: Response) -> FolioResult<Option<Value>> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&text)?))
}
