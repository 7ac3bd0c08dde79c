//! User records
//!
//! See the mod-users API docs.

use super::{require_body, ListParams};
use crate::client::FolioClient;
use crate::error::FolioResult;
use serde_json::Value;
use tracing::instrument;

/// Users API interface
#[derive(Clone)]
pub struct UsersApi {
    client: FolioClient,
}

impl UsersApi {
    /// Create a new users API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// List users
    ///
    /// GET /users
    #[instrument(skip(self))]
    pub async fn fetch_list(&self, params: &ListParams) -> FolioResult<Value> {
        let path = "users";
        require_body(self.client.get(path, params).await?, path)
    }

    /// Details of one user
    ///
    /// GET /users/{id}
    #[instrument(skip(self))]
    pub async fn fetch_user_details(&self, id: &str, lang: &str) -> FolioResult<Value> {
        let path = format!("users/{id}");
        require_body(self.client.get(&path, &[("lang", lang)]).await?, &path)
    }
}
