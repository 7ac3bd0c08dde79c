//! Client for FOLIO library services platform APIs
//!
//! This crate wraps the Okapi gateway of a FOLIO tenant: inventory lookups,
//! source record storage, MARC import and editing, and organization and user
//! records.
//!
//! # Features
//!
//! - **Self-healing authentication**: a rejected token (401 or 403) triggers
//!   one login and one retry of the request, transparently to the caller
//! - **Two login flows**: legacy body tokens and expiry-aware cookie tokens
//! - **Typed errors**: non-success responses are classified into
//!   [`UnexpectedResponse`] variants
//! - **Bounded job polling**: data import jobs are waited on with a timeout
//!   and a tolerance for the job not being visible yet
//! - **Request correlation**: every request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_client::{ClientConfig, FolioClient, LoginParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(
//!         "https://okapi.example.edu",
//!         LoginParams::new("app_user", "secret"),
//!     )
//!     .with_tenant("diku");
//!     let client = FolioClient::with_config(config)?;
//!
//!     let hrid = client.inventory().fetch_hrid("36105010101010").await?;
//!     if let Some(hrid) = hrid {
//!         let xml = client.source_storage().fetch_marc_xml(Some(&hrid), None).await?;
//!         println!("{xml}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod marc;

pub use client::FolioClient;
pub use config::{AuthMode, ClientConfig, LoginParams};
pub use endpoints::{JobFailure, JobResult, JobStatus, ListParams};
pub use error::{FolioError, FolioResult, UnexpectedResponse};
pub use folio_core::{PollConfig, PollOutcome, RetryPolicy};
pub use marc::MarcRecord;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::FolioClient;
    pub use crate::config::{AuthMode, ClientConfig, LoginParams};
    pub use crate::endpoints::{
        DataImportApi, HoldingsApi, InventoryApi, JobFailure, JobResult, JobStatus, ListParams,
        OrganizationsApi, RecordsEditorApi, SourceStorageApi, UsersApi,
    };
    pub use crate::error::{FolioError, FolioResult, UnexpectedResponse};
    pub use crate::marc::MarcRecord;
    pub use folio_core::{PollConfig, PollOutcome, RetryPolicy};
}
