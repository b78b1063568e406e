/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported providers:
 * - DeepL: text and native document translation
 * - Anthropic: LLM text translation
 * - Mock: scripted providers for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::document::Document;
use crate::errors::ProviderError;

/// A provider that translates plain strings
///
/// Implementations must return exactly one translation per input, in order.
#[async_trait]
pub trait TextTranslator: Send + Sync + Debug {
    /// Translate `texts` from `source_lang` to `target_lang`
    ///
    /// # Arguments
    /// * `texts` - Ordered texts to translate
    /// * `source_lang` - ISO 639-1 code of the source language
    /// * `target_lang` - ISO 639-1 code of the target language
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translation per input
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Reference to a document job on the provider side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    /// Secret some providers require alongside the id
    pub key: Option<String>,
}

/// Status of a document job as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Translating,
    Done,
    Error(String),
}

/// A provider that translates whole documents asynchronously
#[async_trait]
pub trait DocumentTranslator: Send + Sync + Debug {
    /// Upload a document and start a translation job
    async fn submit_document(
        &self,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<JobHandle, ProviderError>;

    /// Current status of a job
    async fn poll_status(&self, job: &JobHandle) -> Result<JobStatus, ProviderError>;

    /// Translated document bytes of a finished job
    async fn download_result(&self, job: &JobHandle) -> Result<Bytes, ProviderError>;

    /// Ask the provider to drop a job. Returns false when cancellation is unsupported.
    async fn cancel_job(&self, _job: &JobHandle) -> Result<bool, ProviderError> {
        Ok(false)
    }

    /// Provider name for logs
    fn name(&self) -> &str;
}

pub mod anthropic;
pub mod deepl;
pub mod mock;
