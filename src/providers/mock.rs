/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockTranslator::working()` - Prefixes every translated piece
 * - `MockTranslator::dropping_separators()` - Loses the separator lines
 * - `MockTranslator::fail_times()` - Fails with a status a few times, then works
 * - `MockTranslator::failing()` - Always fails with a status
 * - `MockDocumentTranslator` - Plays back a scripted list of job statuses
 */

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::document::Document;
use crate::errors::ProviderError;
use crate::providers::{DocumentTranslator, JobHandle, JobStatus, TextTranslator};

/// A line that holds nothing but a separator marker
static MARKER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<<[^<>]*>>\s*$").expect("marker line pattern"));

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Prefix every non-marker line and keep marker lines intact
    Working { prefix: String },
    /// Prefix the text but drop marker lines, only for texts containing `needle` when set
    DropSeparators { prefix: String, needle: Option<String> },
    /// Rewrite markers as `<< seg >>`-style variants with extra whitespace and lower case
    MangleSeparators { prefix: String },
    /// Fail with `status` for the first `times` calls, then behave like `Working`
    FailTimes { status: u16, times: usize, prefix: String },
    /// Always fail with `status`
    Failing { status: u16 },
}

/// Mock text translator for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Calls made so far, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts received, in call order
    requests: Arc<Mutex<Vec<String>>>,
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() || MARKER_LINE.is_match(line) {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Translator that prefixes every piece with `prefix`
    pub fn working(prefix: &str) -> Self {
        Self::new(MockBehavior::Working { prefix: prefix.to_string() })
    }

    /// Translator that drops separator lines from every response
    pub fn dropping_separators(prefix: &str) -> Self {
        Self::new(MockBehavior::DropSeparators {
            prefix: prefix.to_string(),
            needle: None,
        })
    }

    /// Translator that drops separator lines only from texts containing `needle`
    pub fn dropping_separators_when(prefix: &str, needle: &str) -> Self {
        Self::new(MockBehavior::DropSeparators {
            prefix: prefix.to_string(),
            needle: Some(needle.to_string()),
        })
    }

    pub fn mangling_separators(prefix: &str) -> Self {
        Self::new(MockBehavior::MangleSeparators { prefix: prefix.to_string() })
    }

    pub fn fail_times(status: u16, times: usize, prefix: &str) -> Self {
        Self::new(MockBehavior::FailTimes {
            status,
            times,
            prefix: prefix.to_string(),
        })
    }

    pub fn failing(status: u16) -> Self {
        Self::new(MockBehavior::Failing { status })
    }

    /// Number of `translate` calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every text received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn respond(&self, text: &str, call: usize, source_lang: &str, target_lang: &str) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Working { prefix } => Ok(prefix_lines(text, prefix)),
            MockBehavior::DropSeparators { prefix, needle } => {
                let applies = needle.as_ref().is_none_or(|needle| text.contains(needle.as_str()));
                if !applies {
                    return Ok(prefix_lines(text, prefix));
                }
                let kept: Vec<String> = text
                    .split('\n')
                    .filter(|line| !MARKER_LINE.is_match(line) && !line.trim().is_empty())
                    .map(|line| format!("{}{}", prefix, line))
                    .collect();
                Ok(kept.join(" "))
            }
            MockBehavior::MangleSeparators { prefix } => {
                let translated = prefix_lines(text, prefix);
                Ok(translated
                    .split('\n')
                    .map(|line| {
                        if MARKER_LINE.is_match(line) {
                            let inner = line.trim().trim_start_matches("<<").trim_end_matches(">>");
                            format!("  << {} >>  ", inner.to_lowercase())
                        } else {
                            line.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            MockBehavior::FailTimes { status, times, prefix } => {
                if call < *times {
                    Err(ProviderError::from_status(
                        *status,
                        format!("Simulated failure (request #{})", call + 1),
                        source_lang,
                        target_lang,
                    ))
                } else {
                    Ok(prefix_lines(text, prefix))
                }
            }
            MockBehavior::Failing { status } => Err(ProviderError::from_status(
                *status,
                "Simulated provider failure",
                source_lang,
                target_lang,
            )),
        }
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().extend(texts.iter().cloned());
        texts
            .iter()
            .map(|text| self.respond(text, call, source_lang, target_lang))
            .collect()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock document translator that replays scripted job statuses
#[derive(Debug)]
pub struct MockDocumentTranslator {
    /// Statuses returned by successive polls; the last one repeats
    statuses: Vec<JobStatus>,
    /// Bytes returned by `download_result`; the submitted bytes when unset
    result: Option<Bytes>,
    supports_cancel: bool,
    poll_count: AtomicUsize,
    cancelled: AtomicBool,
    submitted: Mutex<Option<Bytes>>,
}

impl MockDocumentTranslator {
    pub fn new(statuses: Vec<JobStatus>) -> Self {
        Self {
            statuses,
            result: None,
            supports_cancel: false,
            poll_count: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            submitted: Mutex::new(None),
        }
    }

    /// Return `result` instead of echoing the submitted document
    pub fn with_result(mut self, result: impl Into<Bytes>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_cancel_support(mut self) -> Self {
        self.supports_cancel = true;
        self
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    /// Whether a supported cancellation request reached the provider
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentTranslator for MockDocumentTranslator {
    async fn submit_document(
        &self,
        document: &Document,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<JobHandle, ProviderError> {
        *self.submitted.lock() = Some(document.content());
        Ok(JobHandle {
            id: format!("mock-{}", Uuid::new_v4()),
            key: Some(Uuid::new_v4().simple().to_string()),
        })
    }

    async fn poll_status(&self, _job: &JobHandle) -> Result<JobStatus, ProviderError> {
        let poll = self.poll_count.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .get(poll)
            .or_else(|| self.statuses.last())
            .cloned()
            .unwrap_or(JobStatus::Done);
        Ok(status)
    }

    async fn download_result(&self, job: &JobHandle) -> Result<Bytes, ProviderError> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }
        self.submitted.lock().clone().ok_or_else(|| ProviderError::ApiError {
            status_code: 404,
            message: format!("no document for job {}", job.id),
        })
    }

    async fn cancel_job(&self, _job: &JobHandle) -> Result<bool, ProviderError> {
        if self.supports_cancel {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        Ok(self.supports_cancel)
    }

    fn name(&self) -> &str {
        "mock-document"
    }
}
