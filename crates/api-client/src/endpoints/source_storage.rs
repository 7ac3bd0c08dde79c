//! Source record storage
//!
//! MARC records as stored by FOLIO, either as MARC-in-JSON or converted to
//! MARCXML with FOLIO's identifiers stamped into 001 and 003.

use super::{require_body, total_records};
use crate::client::FolioClient;
use crate::error::{FolioError, FolioResult};
use crate::marc::MarcRecord;
use serde_json::Value;
use tracing::instrument;

/// Control fields replaced before MARCXML export
const FIELDS_TO_REMOVE: [&str; 2] = ["001", "003"];

/// Value written to 003 on export
pub const FOLIO_ORG_CODE: &str = "FOLIO";

/// Source storage API interface
#[derive(Clone)]
pub struct SourceStorageApi {
    client: FolioClient,
}

impl SourceStorageApi {
    /// Create a new source storage API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// MARC-in-JSON for an instance HRID
    ///
    /// # Errors
    ///
    /// [`FolioError::ResourceNotFound`] when no source record exists and
    /// [`FolioError::MultipleResourcesFound`] when several do.
    #[instrument(skip(self))]
    pub async fn fetch_marc_hash(&self, instance_hrid: &str) -> FolioResult<Value> {
        let path = "source-storage/source-records";
        let response = require_body(
            self.client
                .get(path, &[("instanceHrid", instance_hrid)])
                .await?,
            path,
        )?;

        match total_records(&response)? {
            0 => Err(FolioError::ResourceNotFound(format!(
                "No records found for {instance_hrid}"
            ))),
            1 => response
                .pointer("/sourceRecords/0/parsedRecord/content")
                .cloned()
                .ok_or_else(|| {
                    FolioError::unexpected_body(format!(
                        "source record for {instance_hrid} has no parsed content"
                    ))
                }),
            count => Err(FolioError::MultipleResourcesFound(format!(
                "Expected 1 record for {instance_hrid}, but found {count}"
            ))),
        }
    }

    /// MARCXML for an instance, by HRID or item barcode
    ///
    /// Any existing 001 and 003 are dropped; 001 is set to the instance HRID
    /// and 003 to `FOLIO`.
    ///
    /// # Errors
    ///
    /// [`FolioError::InvalidArgument`] when neither identifier is given and
    /// [`FolioError::ResourceNotFound`] when the barcode resolves to nothing.
    #[instrument(skip(self))]
    pub async fn fetch_marc_xml(
        &self,
        instance_hrid: Option<&str>,
        barcode: Option<&str>,
    ) -> FolioResult<String> {
        let instance_hrid = match (instance_hrid, barcode) {
            (Some(hrid), _) => Some(hrid.to_string()),
            (None, Some(barcode)) => self.client.inventory().fetch_hrid(barcode).await?,
            (None, None) => {
                return Err(FolioError::invalid_argument(
                    "Either a barcode or a Folio instance HRID must be provided",
                ));
            }
        };

        let Some(instance_hrid) = instance_hrid.filter(|hrid| !hrid.is_empty()) else {
            return Err(FolioError::ResourceNotFound(format!(
                "Catalog record not found. Barcode: {}",
                barcode.unwrap_or_default()
            )));
        };

        let marc = self.fetch_marc_hash(&instance_hrid).await?;
        let mut record = MarcRecord::from_marc_json(&marc)?.without_tags(&FIELDS_TO_REMOVE);
        record.set_control_field("001", instance_hrid);
        record.set_control_field("003", FOLIO_ORG_CODE);
        record.to_marcxml()
    }
}
