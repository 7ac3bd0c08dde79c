//! Data import
//!
//! Submitting a MARC file is three requests: create an upload definition,
//! upload the file into it, then start processing with a job profile. The
//! returned [`JobStatus`] tracks the resulting job execution.

use super::{require_body, string_at, JobStatus, ListParams};
use crate::client::FolioClient;
use crate::error::{FolioError, FolioResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

/// Content type of the uploaded MARC file
const MARC_CONTENT_TYPE: &str = "application/octet-stream";

/// Data import API interface
#[derive(Clone)]
pub struct DataImportApi {
    client: FolioClient,
}

impl DataImportApi {
    /// Create a new data import API interface
    pub(crate) fn new(client: FolioClient) -> Self {
        Self { client }
    }

    /// Submit binary MARC (ISO 2709) records for import
    ///
    /// Waits `import_step_delay` between steps so FOLIO can settle the upload
    /// definition before the next request touches it.
    ///
    /// # Errors
    ///
    /// [`FolioError::UnexpectedBody`] if the upload definition response lacks
    /// the identifiers the later steps need.
    #[instrument(skip(self, marc), fields(bytes = marc.len()))]
    pub async fn import(
        &self,
        marc: &[u8],
        job_profile_id: &str,
        job_profile_name: &str,
    ) -> FolioResult<JobStatus> {
        let step_delay = self.client.config().import_step_delay;

        let path = "data-import/uploadDefinitions";
        let definition = require_body(
            self.client
                .post(path, &json!({ "fileDefinitions": [{ "name": marc_filename() }] }))
                .await?,
            path,
        )?;
        tokio::time::sleep(step_delay).await;

        let field = |name: &str| {
            string_at(&definition, &format!("/fileDefinitions/0/{name}")).ok_or_else(|| {
                FolioError::unexpected_body(format!("upload definition response has no {name}"))
            })
        };
        let upload_definition_id = field("uploadDefinitionId")?;
        let job_execution_id = field("jobExecutionId")?;
        let file_definition_id = field("id")?;
        debug!(%upload_definition_id, %job_execution_id, "Upload definition created");

        let path = format!("{path}/{upload_definition_id}/files/{file_definition_id}");
        let upload_definition = self
            .client
            .post_bytes(&path, marc, MARC_CONTENT_TYPE)
            .await?
            .unwrap_or(Value::Null);
        tokio::time::sleep(step_delay).await;

        self.client
            .post(
                &format!("data-import/uploadDefinitions/{upload_definition_id}/processFiles"),
                &json!({
                    "uploadDefinition": upload_definition,
                    "jobProfileInfo": {
                        "id": job_profile_id,
                        "name": job_profile_name,
                        "dataType": "MARC"
                    }
                }),
            )
            .await?;

        info!(%job_execution_id, "Data import submitted");
        Ok(self.client.job_status(job_execution_id))
    }

    /// Job profiles available for imports
    #[instrument(skip(self))]
    pub async fn job_profiles(&self, params: &ListParams) -> FolioResult<Value> {
        let path = "data-import-profiles/jobProfiles";
        require_body(self.client.get(path, params).await?, path)
    }
}

/// Upload file name, the current UTC time in RFC 3339
fn marc_filename() -> String {
    format!("{}.marc", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::logged_in_client;
    use wiremock::matchers::{body_bytes, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_marc_filename() {
        let name = marc_filename();
        assert!(name.ends_with("Z.marc"), "{name}");
        let stamp = name.trim_end_matches(".marc");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_import_runs_three_steps() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        Mock::given(method("POST"))
            .and(path("/data-import/uploadDefinitions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "upload-def",
                "fileDefinitions": [{
                    "id": "file-def",
                    "uploadDefinitionId": "upload-def",
                    "jobExecutionId": "job-exec"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-import/uploadDefinitions/upload-def/files/file-def"))
            .and(header("content-type", MARC_CONTENT_TYPE))
            .and(body_bytes(b"00042nam a2200037 a 4500".to_vec()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "upload-def", "status": "LOADED"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-import/uploadDefinitions/upload-def/processFiles"))
            .and(body_partial_json(json!({
                "uploadDefinition": {"id": "upload-def", "status": "LOADED"},
                "jobProfileInfo": {"id": "profile-id", "name": "profile name", "dataType": "MARC"}
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let job = client
            .data_import()
            .import(b"00042nam a2200037 a 4500", "profile-id", "profile name")
            .await
            .unwrap();
        assert_eq!(job.job_execution_id(), "job-exec");
    }

    #[tokio::test]
    async fn test_import_without_identifiers_fails() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        Mock::given(method("POST"))
            .and(path("/data-import/uploadDefinitions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"fileDefinitions": []})))
            .mount(&server)
            .await;

        let err = client
            .data_import()
            .import(b"marc", "profile-id", "profile name")
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::UnexpectedBody(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_job_profiles() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server, "tok").await;
        Mock::given(method("GET"))
            .and(path("/data-import-profiles/jobProfiles"))
            .and(query_param("query", "name==\"Default*\""))
            .and(query_param("limit", "5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jobProfiles": [{"id": "p1"}], "totalRecords": 1})),
            )
            .mount(&server)
            .await;

        let params = ListParams::new()
            .with_query("name==\"Default*\"")
            .with_limit(5);
        let profiles = client.data_import().job_profiles(&params).await.unwrap();
        assert_eq!(profiles["totalRecords"], 1);
    }
}
