/*!
 * Native document translation: submit, poll until done, download.
 *
 * Polling is an explicit state machine with a deadline measured on the
 * injected clock, so timeouts and cancellation can be exercised without
 * real delays.
 */

use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::document::Document;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{DocumentTranslator, JobHandle, JobStatus};

use super::clock::Clock;
use super::retry::{RetryPolicy, retry_with_backoff};
use super::until_cancelled;

/// States of a document job on our side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling,
    Done,
    Error,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted | Self::Polling)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Done => "done",
            Self::Error => "error",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Bookkeeping for one in-flight document job
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub job_id: String,
    pub source_lang: String,
    pub target_lang: String,
    pub status: JobState,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
    /// Number of status requests made
    pub polls: u32,
}

impl TranslationJob {
    fn new(handle: &JobHandle, source_lang: &str, target_lang: &str) -> Self {
        Self {
            job_id: handle.id.clone(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            status: JobState::Submitted,
            submitted_at: Utc::now(),
            completed_at: None,
            error_detail: None,
            polls: 0,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug!("Job {}: {} -> {}", self.job_id, self.status, next);
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        self.status = next;
    }
}

/// A finished job together with the document it produced
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub job: TranslationJob,
    pub content: Bytes,
}

/// Drives a document job from submission to download
#[derive(Debug, Clone)]
pub struct JobPoller {
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    /// Pause between status requests
    interval: Duration,
    /// Maximum time spent polling
    timeout: Duration,
}

impl JobPoller {
    pub fn new(clock: Arc<dyn Clock>, policy: RetryPolicy, interval: Duration, timeout: Duration) -> Self {
        Self {
            clock,
            policy,
            interval,
            timeout,
        }
    }

    /// Submit `document`, wait for the job and download the result
    pub async fn run(
        &self,
        provider: &dyn DocumentTranslator,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<CompletedJob, TranslationError> {
        let label = format!("{} submit", provider.name());
        let submit = retry_with_backoff(&self.policy, self.clock.as_ref(), &label, || {
            provider.submit_document(document, source_lang, target_lang)
        });
        let handle = until_cancelled(cancel, submit).await.ok_or(TranslationError::Cancelled)??;

        let mut job = TranslationJob::new(&handle, source_lang, target_lang);
        info!("Submitted document job {} to {}", job.job_id, provider.name());

        self.wait(provider, &handle, &mut job, cancel).await?;

        let label = format!("{} download {}", provider.name(), job.job_id);
        let download = retry_with_backoff(&self.policy, self.clock.as_ref(), &label, || {
            provider.download_result(&handle)
        });
        let content = until_cancelled(cancel, download).await.ok_or(TranslationError::Cancelled)??;

        info!("Downloaded {} bytes for job {} after {} polls", content.len(), job.job_id, job.polls);
        Ok(CompletedJob { job, content })
    }

    /// Poll until the job is done, failed, timed out or cancelled
    async fn wait(
        &self,
        provider: &dyn DocumentTranslator,
        handle: &JobHandle,
        job: &mut TranslationJob,
        cancel: &CancellationToken,
    ) -> Result<(), TranslationError> {
        let started = self.clock.elapsed();
        let deadline = started + self.timeout;
        job.transition(JobState::Polling);

        loop {
            let label = format!("{} status {}", provider.name(), job.job_id);
            let poll = retry_with_backoff(&self.policy, self.clock.as_ref(), &label, || {
                provider.poll_status(handle)
            });
            let status = match until_cancelled(cancel, poll).await {
                Some(status) => status?,
                None => return self.abandon(provider, handle, job).await,
            };
            job.polls += 1;

            match status {
                JobStatus::Done => {
                    job.transition(JobState::Done);
                    return Ok(());
                }
                JobStatus::Error(detail) => {
                    warn!("Job {} reported an error: {}", job.job_id, detail);
                    job.error_detail = Some(detail.clone());
                    job.transition(JobState::Error);
                    return Err(ProviderError::JobFailed {
                        job_id: job.job_id.clone(),
                        detail,
                    }
                    .into());
                }
                JobStatus::Queued | JobStatus::Translating => {}
            }

            let now = self.clock.elapsed();
            if now >= deadline {
                job.transition(JobState::TimedOut);
                return Err(TranslationError::Timeout {
                    job_id: job.job_id.clone(),
                    waited: now.saturating_sub(started),
                });
            }

            let pause = self.interval.min(deadline - now);
            if until_cancelled(cancel, self.clock.sleep(pause)).await.is_none() {
                return self.abandon(provider, handle, job).await;
            }
        }
    }

    /// Stop polling after cancellation and release the remote job when possible
    async fn abandon(
        &self,
        provider: &dyn DocumentTranslator,
        handle: &JobHandle,
        job: &mut TranslationJob,
    ) -> Result<(), TranslationError> {
        match provider.cancel_job(handle).await {
            Ok(true) => info!("Cancelled remote job {}", job.job_id),
            Ok(false) => debug!("{} cannot cancel jobs; job {} will expire", provider.name(), job.job_id),
            Err(e) => warn!("Failed to cancel job {}: {}", job.job_id, e),
        }
        job.transition(JobState::Cancelled);
        Err(TranslationError::Cancelled)
    }
}
