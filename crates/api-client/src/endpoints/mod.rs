//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one group of FOLIO endpoints.
//! All of them send their requests through [`FolioClient`](crate::FolioClient)
//! and so share its token refresh behaviour.
//!
//! ## Mapping to FOLIO modules
//!
//! | Module | FOLIO paths | Description |
//! |--------|-------------|-------------|
//! | `inventory` | `/search/instances`, `/inventory/instances` | HRID, barcode and status lookups |
//! | `source_storage` | `/source-storage/source-records` | MARC records as JSON or MARCXML |
//! | `data_import` | `/data-import/uploadDefinitions`, `/data-import-profiles/jobProfiles` | MARC import submission |
//! | `job_status` | `/metadata-provider/jobSummary`, `/metadata-provider/journalRecords` | Import job polling |
//! | `records_editor` | `/records-editor/records` | MARC edits with optimistic locking |
//! | `organizations` | `/organizations/organizations`, `/organizations-storage/interfaces` | Vendor records |
//! | `users` | `/users` | User records |
//! | `holdings` | `/holdings-storage/holdings` | Holdings creation (deprecated) |

pub mod data_import;
pub mod holdings;
pub mod inventory;
pub mod job_status;
pub mod organizations;
pub mod records_editor;
pub mod source_storage;
pub mod users;

pub use data_import::DataImportApi;
pub use holdings::HoldingsApi;
pub use inventory::InventoryApi;
pub use job_status::{JobFailure, JobResult, JobStatus};
pub use organizations::OrganizationsApi;
pub use records_editor::RecordsEditorApi;
pub use source_storage::SourceStorageApi;
pub use users::UsersApi;

use crate::error::{FolioError, FolioResult};
use serde::Serialize;
use serde_json::Value;

/// Default language for list and detail queries
pub const DEFAULT_LANG: &str = "en";

/// Paging and filtering for list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
    /// CQL query limiting the results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Maximum number of results
    pub limit: u32,
    /// Offset of the first result
    pub offset: u32,
    /// Language code for returned results
    pub lang: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            query: None,
            limit: 10_000,
            offset: 0,
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

impl ListParams {
    /// Create params with default paging
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CQL query
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the result limit
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the result offset
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the language code
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

/// Body of a response the operation cannot do without
pub(crate) fn require_body(body: Option<Value>, path: &str) -> FolioResult<Value> {
    body.ok_or_else(|| FolioError::unexpected_body(format!("empty response from {path}")))
}

/// `totalRecords` of a search response
pub(crate) fn total_records(body: &Value) -> FolioResult<u64> {
    body.get("totalRecords")
        .and_then(Value::as_u64)
        .ok_or_else(|| FolioError::unexpected_body("search response has no totalRecords"))
}

/// String field at a JSON pointer
pub(crate) fn string_at(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
