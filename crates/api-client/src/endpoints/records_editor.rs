//! MARC records editor
//!
//! Edits go through optimistic locking: the instance `_version` read before
//! the edit is sent back as `relatedRecordVersion`, so a save over a newer
//! version is rejected instead of silently overwriting it.
//!
//! When two edits collide FOLIO does not always answer 409. The losing writer
//! may instead get a database error containing "duplicate key value violates
//! unique constraint". That error, and only that one, restarts the whole
//! read-edit-save cycle under the client's duplicate-key retry policy. Other
//! conflicts are returned to the caller.

use super::require_body;
use crate::client::FolioClient;
use crate::error::{FolioError, FolioResult};
use folio_core::retry_when;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// Records editor API interface
#[derive(Clone)]
pub struct RecordsEditorApi {
    client: FolioClient,
}

impl RecordsEditorApi {
    /// Create a new records editor API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// Edit the MARC JSON of the instance with `hrid` and save it
    ///
    /// `edit` receives the editor's JSON for the record and may change it in
    /// place. It runs once per attempt, so it is called again on freshly
    /// fetched JSON when the save hits the duplicate-key race; state it
    /// captures carries over between attempts.
    ///
    /// # Errors
    ///
    /// Lookup errors from the inventory and any classified save failure,
    /// including [`UnexpectedResponse::Conflict`](crate::UnexpectedResponse::Conflict)
    /// for a stale version.
    #[instrument(skip(self, edit))]
    pub async fn edit_marc_json<F>(&self, hrid: &str, edit: F) -> FolioResult<()>
    where
        F: FnMut(&mut Value),
    {
        let edit = Mutex::new(edit);
        retry_when(
            &self.client.config().duplicate_key_retry,
            FolioError::is_duplicate_key,
            || self.edit_once(hrid, &edit),
        )
        .await
    }

    async fn edit_once<F>(&self, hrid: &str, edit: &Mutex<F>) -> FolioResult<()>
    where
        F: FnMut(&mut Value),
    {
        let instance = self
            .client
            .inventory()
            .fetch_instance_info(None, Some(hrid))
            .await?;
        let external_id = instance
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| FolioError::unexpected_body(format!("instance {hrid} has no id")))?;
        let version = instance.get("_version").cloned().unwrap_or(Value::Null);

        let path = "records-editor/records";
        let mut record = require_body(
            self.client.get(path, &[("externalId", external_id)]).await?,
            path,
        )?;
        let parsed_record_id = record
            .get("parsedRecordId")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                FolioError::unexpected_body(format!("editor record for {hrid} has no parsedRecordId"))
            })?;

        let fields = record.as_object_mut().ok_or_else(|| {
            FolioError::unexpected_body(format!("editor record for {hrid} is not an object"))
        })?;
        fields.insert("relatedRecordVersion".to_string(), version);
        fields.insert("_actionType".to_string(), Value::from("edit"));

        (edit.lock().unwrap_or_else(PoisonError::into_inner))(&mut record);

        self.client
            .put(&format!("{path}/{parsed_record_id}"), &record)
            .await?;
        debug!(%parsed_record_id, "MARC record saved");
        Ok(())
    }
}
