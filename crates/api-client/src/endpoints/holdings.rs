//! Holdings records
//!
//! Kept for callers that still create holdings directly; new integrations
//! should not need it.

use crate::client::FolioClient;
use crate::error::FolioResult;
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

/// Holdings API interface, bound to one instance
#[derive(Clone)]
pub struct HoldingsApi {
    client: FolioClient,
    instance_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewHoldings<'a> {
    instance_id: &'a str,
    permanent_location_id: &'a str,
    holdings_type_id: &'a str,
}

impl HoldingsApi {
    /// Create a new holdings API interface for an instance
    pub(crate) fn new(client: FolioClient, instance_id: String) -> Self {
        Self {
            client,
            instance_id,
        }
    }

    /// UUID of the instance the holdings belong to
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Create a holdings record for the instance
    ///
    /// POST /holdings-storage/holdings
    #[deprecated(note = "holdings records no longer need to be created by clients")]
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn create(
        &self,
        holdings_type_id: &str,
        permanent_location_id: &str,
    ) -> FolioResult<Option<Value>> {
        warn!("[DEPRECATION] Holdings records no longer need to be created by clients");
        self.client
            .post(
                "holdings-storage/holdings",
                &NewHoldings {
                    instance_id: &self.instance_id,
                    permanent_location_id,
                    holdings_type_id,
                },
            )
            .await
    }
}
