//! Inventory lookups
//!
//! Resolves barcodes and HRIDs to instance records.

use super::{require_body, string_at, total_records};
use crate::client::{FolioClient, NO_QUERY};
use crate::error::{FolioError, FolioResult};
use serde_json::Value;
use tracing::{debug, instrument};

/// Inventory API interface
#[derive(Clone)]
pub struct InventoryApi {
    client: FolioClient,
}

impl InventoryApi {
    /// Create a new inventory API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// Instance HRID for an item barcode
    ///
    /// Returns `None` when no instance holds an item with that barcode.
    #[instrument(skip(self))]
    pub async fn fetch_hrid(&self, barcode: &str) -> FolioResult<Option<String>> {
        let query = format!("items.barcode=={barcode}");
        let search = self
            .client
            .get("search/instances", &[("query", query.as_str())])
            .await?;

        let Some(instance_id) = search.as_ref().and_then(|body| string_at(body, "/instances/0/id"))
        else {
            debug!("No instance found for barcode");
            return Ok(None);
        };

        let instance = self
            .client
            .get(&format!("inventory/instances/{instance_id}"), NO_QUERY)
            .await?;
        Ok(instance.and_then(|body| string_at(&body, "/hrid")))
    }

    /// Instance UUID for an HRID
    ///
    /// # Errors
    ///
    /// [`FolioError::ResourceNotFound`] when nothing matches and
    /// [`FolioError::MultipleResourcesFound`] when more than one instance does.
    #[instrument(skip(self))]
    pub async fn fetch_external_id(&self, hrid: &str) -> FolioResult<String> {
        let query = format!("hrid=={hrid}");
        let path = "search/instances";
        let search = require_body(
            self.client.get(path, &[("query", query.as_str())]).await?,
            path,
        )?;

        match total_records(&search)? {
            0 => Err(FolioError::ResourceNotFound(format!(
                "No matching instance found for {hrid}"
            ))),
            1 => string_at(&search, "/instances/0/id").ok_or_else(|| {
                FolioError::unexpected_body(format!("search result for {hrid} has no instance id"))
            }),
            count => Err(FolioError::MultipleResourcesFound(format!(
                "Expected 1 record for {hrid}, but found {count}"
            ))),
        }
    }

    /// Full instance record, by external ID or HRID
    ///
    /// Exactly one of the identifiers must be given; empty strings count as
    /// absent. Useful for reading `id` and `_version` before an update.
    ///
    /// # Errors
    ///
    /// [`FolioError::InvalidArgument`] unless exactly one identifier is given.
    #[instrument(skip(self))]
    pub async fn fetch_instance_info(
        &self,
        external_id: Option<&str>,
        hrid: Option<&str>,
    ) -> FolioResult<Value> {
        let external_id = external_id.filter(|id| !id.is_empty());
        let hrid = hrid.filter(|hrid| !hrid.is_empty());

        let external_id = match (external_id, hrid) {
            (Some(id), None) => id.to_string(),
            (None, Some(hrid)) => self.fetch_external_id(hrid).await?,
            _ => {
                return Err(FolioError::invalid_argument(
                    "must pass exactly one of external_id or HRID",
                ));
            }
        };

        let path = format!("inventory/instances/{external_id}");
        require_body(self.client.get(&path, NO_QUERY).await?, &path)
    }

    /// Whether the instance with `hrid` has the instance status `status_id`
    ///
    /// # Errors
    ///
    /// [`FolioError::ResourceNotFound`] when no instance has that HRID.
    #[instrument(skip(self))]
    pub async fn has_instance_status(&self, hrid: &str, status_id: &str) -> FolioResult<bool> {
        let query = format!("hrid=={hrid}");
        let path = "inventory/instances";
        let instances = require_body(
            self.client.get(path, &[("query", query.as_str())]).await?,
            path,
        )?;

        if total_records(&instances)? == 0 {
            return Err(FolioError::ResourceNotFound(format!(
                "No matching instance found for {hrid}"
            )));
        }

        Ok(string_at(&instances, "/instances/0/statusId").as_deref() == Some(status_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::logged_in_client;
    use crate::error::{FolioError, UnexpectedResponse};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_search(server: &MockServer, query: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search/instances"))
            .and(query_param("query", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_hrid_by_barcode() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        mount_search(
            &server,
            "items.barcode==123456",
            json!({"totalRecords": 1, "instances": [{"id": "some_uuid"}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances/some_uuid"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "some_uuid", "hrid": "in56789"})),
            )
            .mount(&server)
            .await;

        let hrid = client.inventory().fetch_hrid("123456").await.unwrap();
        assert_eq!(hrid.as_deref(), Some("in56789"));
    }

    #[tokio::test]
    async fn test_fetch_hrid_unknown_barcode_is_none() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        mount_search(
            &server,
            "items.barcode==nope",
            json!({"totalRecords": 0, "instances": []}),
        )
        .await;

        assert_eq!(client.inventory().fetch_hrid("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_external_id() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        mount_search(
            &server,
            "hrid==in00000000067",
            json!({"totalRecords": 1, "instances": [{"id": "some_uuid"}]}),
        )
        .await;

        let id = client
            .inventory()
            .fetch_external_id("in00000000067")
            .await
            .unwrap();
        assert_eq!(id, "some_uuid");
    }

    #[tokio::test]
    async fn test_fetch_external_id_zero_and_many() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        mount_search(&server, "hrid==missing", json!({"totalRecords": 0, "instances": []})).await;
        mount_search(
            &server,
            "hrid==dupe",
            json!({"totalRecords": 2, "instances": [{"id": "a"}, {"id": "b"}]}),
        )
        .await;

        let err = client.inventory().fetch_external_id("missing").await.unwrap_err();
        assert!(matches!(err, FolioError::ResourceNotFound(ref msg) if msg.contains("missing")));

        let err = client.inventory().fetch_external_id("dupe").await.unwrap_err();
        assert!(
            matches!(err, FolioError::MultipleResourcesFound(ref msg) if msg == "Expected 1 record for dupe, but found 2")
        );
    }

    #[tokio::test]
    async fn test_fetch_instance_info_by_hrid() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        mount_search(
            &server,
            "hrid==in1",
            json!({"totalRecords": 1, "instances": [{"id": "uuid-1"}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances/uuid-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "uuid-1", "hrid": "in1", "_version": "3"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let inventory = client.inventory();
        let by_hrid = inventory.fetch_instance_info(None, Some("in1")).await.unwrap();
        let by_id = inventory
            .fetch_instance_info(Some("uuid-1"), None)
            .await
            .unwrap();
        assert_eq!(by_hrid, by_id);
        assert_eq!(by_hrid["_version"], "3");
    }

    #[tokio::test]
    async fn test_fetch_instance_info_needs_exactly_one_identifier() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        let inventory = client.inventory();

        for (external_id, hrid) in [(None, None), (Some("a"), Some("b")), (Some(""), None)] {
            let err = inventory
                .fetch_instance_info(external_id, hrid)
                .await
                .unwrap_err();
            assert!(matches!(err, FolioError::InvalidArgument(_)));
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_has_instance_status() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances"))
            .and(query_param("query", "hrid==in1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"totalRecords": 1, "instances": [{"id": "uuid-1", "statusId": "status-uuid"}]}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances"))
            .and(query_param("query", "hrid==in2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"totalRecords": 0, "instances": []})),
            )
            .mount(&server)
            .await;

        let inventory = client.inventory();
        assert!(inventory.has_instance_status("in1", "status-uuid").await.unwrap());
        assert!(!inventory.has_instance_status("in1", "other-uuid").await.unwrap());
        assert!(matches!(
            inventory.has_instance_status("in2", "status-uuid").await,
            Err(FolioError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_http_errors_propagate() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        Mock::given(method("GET"))
            .and(path("/search/instances"))
            .respond_with(ResponseTemplate::new(500).set_body_string("search is down"))
            .mount(&server)
            .await;

        let err = client.inventory().fetch_external_id("in1").await.unwrap_err();
        assert!(matches!(
            err,
            FolioError::Response(UnexpectedResponse::ServiceUnavailable { .. })
        ));
    }
}
