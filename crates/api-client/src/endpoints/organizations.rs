//! Organization records
//!
//! See the mod-organizations and mod-organizations-storage API docs.

use super::{require_body, ListParams};
use crate::client::FolioClient;
use crate::error::FolioResult;
use serde_json::Value;
use tracing::instrument;

/// Organizations API interface
#[derive(Clone)]
pub struct OrganizationsApi {
    client: FolioClient,
}

impl OrganizationsApi {
    /// Create a new organizations API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// List organizations
    ///
    /// GET /organizations/organizations
    #[instrument(skip(self))]
    pub async fn fetch_list(&self, params: &ListParams) -> FolioResult<Value> {
        let path = "organizations/organizations";
        require_body(self.client.get(path, params).await?, path)
    }

    /// List organization interfaces
    ///
    /// GET /organizations-storage/interfaces
    #[instrument(skip(self))]
    pub async fn fetch_interface_list(&self, params: &ListParams) -> FolioResult<Value> {
        let path = "organizations-storage/interfaces";
        require_body(self.client.get(path, params).await?, path)
    }

    /// Details of one organization interface
    ///
    /// GET /organizations-storage/interfaces/{id}
    #[instrument(skip(self))]
    pub async fn fetch_interface_details(&self, id: &str, lang: &str) -> FolioResult<Value> {
        let path = format!("organizations-storage/interfaces/{id}");
        require_body(self.client.get(&path, &[("lang", lang)]).await?, &path)
    }
}
