//! Data import job status
//!
//! A [`JobStatus`] is a handle on one job execution. Probing and waiting use
//! the bounded poller from `folio-core`; the client's configured
//! [`PollConfig`] supplies the defaults.
//!
//! Outcomes a caller should branch on are returned as [`JobResult`] values.
//! Only transport errors and a job that is never found are errors.

use super::require_body;
use crate::client::{FolioClient, NO_QUERY};
use crate::error::FolioResult;
use folio_core::{wait_for, wait_until_complete, PollConfig, PollOutcome, WaitOutcome, Waited};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Why a job has no usable result (yet)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobFailure {
    /// The job is still running
    #[error("job is still pending")]
    Pending,
    /// The job finished with errors
    #[error("job finished with errors")]
    Error,
    /// The job is not visible to the status endpoint
    #[error("job not found")]
    NotFound,
    /// Waiting for the job took longer than the configured timeout
    #[error("timed out waiting for job")]
    Timeout,
}

/// Success value or the reason there is none
pub type JobResult<T = ()> = Result<T, JobFailure>;

/// Handle on a data import job execution
#[derive(Clone, Debug)]
pub struct JobStatus {
    client: FolioClient,
    job_execution_id: String,
}

impl JobStatus {
    /// Create a handle for an existing job execution
    pub(crate) fn new(client: FolioClient, job_execution_id: String) -> Self {
        Self {
            client,
            job_execution_id,
        }
    }

    /// ID of the tracked job execution
    #[must_use]
    pub fn job_execution_id(&self) -> &str {
        &self.job_execution_id
    }

    /// Probe the job summary once
    ///
    /// A summary with errors is [`PollOutcome::Error`]; one with no created and
    /// no updated entities is [`PollOutcome::Pending`]. A 404, common right
    /// after submission, is [`PollOutcome::NotFound`].
    #[instrument(skip(self), fields(job_execution_id = %self.job_execution_id))]
    pub async fn status(&self) -> FolioResult<PollOutcome> {
        let path = format!("metadata-provider/jobSummary/{}", self.job_execution_id);
        let summary = match self.client.get(&path, NO_QUERY).await {
            Ok(body) => require_body(body, &path)?,
            Err(e) if e.is_not_found() => return Ok(PollOutcome::NotFound),
            Err(e) => return Err(e),
        };

        let count = |pointer: &str| summary.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);

        let outcome = if count("/totalErrors") > 0 {
            PollOutcome::Error
        } else if count("/sourceRecordSummary/totalCreatedEntities") == 0
            && count("/sourceRecordSummary/totalUpdatedEntities") == 0
        {
            PollOutcome::Pending
        } else {
            PollOutcome::Success
        };

        debug!(outcome = ?outcome, "Job summary checked");
        Ok(outcome)
    }

    /// Wait for the job using the client's polling configuration
    pub async fn wait_until_complete(&self) -> FolioResult<JobResult> {
        let config = self.client.config().poll.clone();
        self.wait_until_complete_with(&config).await
    }

    /// Wait for the job to succeed or fail
    ///
    /// # Errors
    ///
    /// [`FolioError::ResourceNotFound`](crate::FolioError::ResourceNotFound)
    /// when the job stays invisible past `config.not_found_tolerance`.
    #[instrument(skip(self, config), fields(job_execution_id = %self.job_execution_id))]
    pub async fn wait_until_complete_with(&self, config: &PollConfig) -> FolioResult<JobResult> {
        let outcome = wait_until_complete(config, move || self.status()).await?;
        info!(outcome = ?outcome, "Finished waiting for job");

        Ok(match outcome {
            WaitOutcome::Completed => Ok(()),
            WaitOutcome::Failed => Err(JobFailure::Error),
            WaitOutcome::TimedOut => Err(JobFailure::Timeout),
        })
    }

    /// HRIDs of the instances the job created, using the client's polling configuration
    pub async fn instance_hrids(&self) -> FolioResult<JobResult<Vec<String>>> {
        let config = self.client.config().poll.clone();
        self.instance_hrids_with(&config).await
    }

    /// HRIDs of the instances the job created
    ///
    /// The job must already have succeeded; otherwise its current state is
    /// returned as the failure. The journal is filled in after the job is
    /// marked complete, so it is polled until a completed instance entry
    /// appears or `config.timeout` elapses.
    #[instrument(skip(self, config), fields(job_execution_id = %self.job_execution_id))]
    pub async fn instance_hrids_with(
        &self,
        config: &PollConfig,
    ) -> FolioResult<JobResult<Vec<String>>> {
        match self.status().await? {
            PollOutcome::Success => {}
            PollOutcome::Pending => return Ok(Err(JobFailure::Pending)),
            PollOutcome::Error => return Ok(Err(JobFailure::Error)),
            PollOutcome::NotFound => return Ok(Err(JobFailure::NotFound)),
        }

        let waited = wait_for(config, move || self.completed_instance_hrids()).await?;
        Ok(match waited {
            Waited::Ready(hrids) => Ok(hrids),
            Waited::TimedOut => Err(JobFailure::Timeout),
        })
    }

    /// Completed instance entries in the job journal, `None` while there are none
    async fn completed_instance_hrids(&self) -> FolioResult<Option<Vec<String>>> {
        let path = format!("metadata-provider/journalRecords/{}", self.job_execution_id);
        let journal = require_body(self.client.get(&path, NO_QUERY).await?, &path)?;

        let mut hrids: Vec<String> = Vec::new();
        let records = journal
            .get("journalRecords")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for record in records {
            let is_completed_instance = record.get("entityType").and_then(Value::as_str)
                == Some("INSTANCE")
                && record.get("actionStatus").and_then(Value::as_str) == Some("COMPLETED");
            if !is_completed_instance {
                continue;
            }
            if let Some(hrid) = record.get("entityHrId").and_then(Value::as_str) {
                if !hrids.iter().any(|seen| seen == hrid) {
                    hrids.push(hrid.to_string());
                }
            }
        }

        debug!(count = hrids.len(), "Journal checked for created instances");
        Ok((!hrids.is_empty()).then_some(hrids))
    }
}
