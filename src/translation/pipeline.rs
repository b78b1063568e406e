/*!
 * Document translation pipeline.
 *
 * A run goes Extractor → Chunker → provider → Reinsertion → Validator in
 * text-batch mode, or straight to the provider's document endpoint and then
 * the Validator in native-document mode. Runs share no mutable state.
 */

use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::document::{ArchiveLimits, Document};
use crate::errors::{ErrorKind, TranslationError, WarningKind};
use crate::providers::{DocumentTranslator, TextTranslator};
use crate::validation::{ContainerValidator, StructureProfile};

use super::batch::BatchTranslator;
use super::chunking::{self, DEFAULT_MAX_CHARS, SeparatorToken};
use super::clock::{Clock, SystemClock};
use super::extraction::{self, Extraction};
use super::native::JobPoller;
use super::reinsertion;
use super::retry::RetryPolicy;

/// The provider a pipeline talks to, and how
#[derive(Debug, Clone)]
pub enum TranslationBackend {
    /// Segments are chunked and sent as text
    TextBatch(Arc<dyn TextTranslator>),
    /// The whole document is uploaded as a job
    NativeDocument(Arc<dyn DocumentTranslator>),
}

/// Tunables of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Character budget of one chunk
    pub max_chars: usize,
    pub max_concurrent_requests: usize,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub limits: ArchiveLimits,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_concurrent_requests: 4,
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(300),
            limits: ArchiveLimits::default(),
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_chars: config.chunking.max_chars,
            max_concurrent_requests: config.translation.optimal_concurrent_requests(),
            retry: RetryPolicy::from(&config.translation.common),
            poll_interval: config.polling.interval(),
            poll_timeout: config.polling.timeout(),
            limits: config.archive_limits(),
        }
    }
}

/// Non-fatal condition of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub detail: String,
}

/// Failure of a run as it appears in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<&TranslationError> for ReportError {
    fn from(error: &TranslationError) -> Self {
        Self {
            kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

/// Structured result record of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationReport {
    pub success: bool,
    pub segments_translated: usize,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
}

impl TranslationReport {
    pub fn failure(error: &TranslationError) -> Self {
        Self {
            success: false,
            segments_translated: 0,
            warnings: Vec::new(),
            error: Some(ReportError::from(error)),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|warning| warning.kind == kind)
    }
}

/// Translated document plus the record describing how it was produced
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub document: Document,
    pub report: TranslationReport,
}

/// Translates documents while keeping their structure intact
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    backend: TranslationBackend,
    options: PipelineOptions,
    clock: Arc<dyn Clock>,
    validator: ContainerValidator,
}

impl DocumentPipeline {
    pub fn new(backend: TranslationBackend, options: PipelineOptions) -> Self {
        Self::with_clock(backend, options, Arc::new(SystemClock::new()))
    }

    /// Pipeline whose sleeps and deadlines run on `clock`
    pub fn with_clock(backend: TranslationBackend, options: PipelineOptions, clock: Arc<dyn Clock>) -> Self {
        let validator = ContainerValidator::new(options.limits);
        Self {
            backend,
            options,
            clock,
            validator,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate `document` from `source_lang` to `target_lang`
    pub async fn translate(
        &self,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslationOutcome, TranslationError> {
        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let start_time = Instant::now();
        info!(
            "Translating {} document ({} bytes) from {} to {}",
            document.kind,
            document.len(),
            source_lang,
            target_lang
        );

        let outcome = match &self.backend {
            TranslationBackend::TextBatch(translator) => {
                self.translate_text_batch(translator.clone(), document, source_lang, target_lang, cancel)
                    .await?
            }
            TranslationBackend::NativeDocument(provider) => {
                self.translate_native(provider.as_ref(), document, source_lang, target_lang, cancel)
                    .await?
            }
        };

        info!(
            "Translated {} segments in {:.1}s ({} warnings)",
            outcome.report.segments_translated,
            start_time.elapsed().as_secs_f64(),
            outcome.report.warnings.len()
        );
        Ok(outcome)
    }

    /// Like `translate`, but failures are folded into the report
    pub async fn run(
        &self,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> (Option<Document>, TranslationReport) {
        match self.translate(document, source_lang, target_lang, cancel).await {
            Ok(outcome) => (Some(outcome.document), outcome.report),
            Err(e) => {
                error!("Translation failed: {}", e);
                (None, TranslationReport::failure(&e))
            }
        }
    }

    async fn translate_text_batch(
        &self,
        translator: Arc<dyn TextTranslator>,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslationOutcome, TranslationError> {
        let Extraction {
            mut container,
            segments,
        } = extraction::extract(document, &self.options.limits)?;
        let profile = StructureProfile::of(&container);

        let separator = SeparatorToken::choose(&segments);
        let chunks = chunking::chunk(&segments, self.options.max_chars, &separator);
        debug!(
            "{} segments in {} chunks, separator {}",
            segments.len(),
            chunks.len(),
            separator.token()
        );

        let batch = BatchTranslator::new(
            translator,
            self.options.retry.clone(),
            self.clock.clone(),
            self.options.max_concurrent_requests,
        );
        let translations = batch.translate_chunks(&chunks, source_lang, target_lang, cancel).await?;

        let summary = reinsertion::reinsert(&mut container, &segments, &chunks, &translations, &separator)?;
        self.validator.validate_segment_count(segments.len(), summary.outputs.len())?;

        let output = container.serialize(document)?;
        self.validator.validate_reconstruction(&profile, &output)?;

        let mut warnings = Vec::new();
        if !summary.degraded_chunks.is_empty() {
            let untranslated: usize = summary
                .degraded_chunks
                .iter()
                .filter_map(|index| chunks.get(*index))
                .map(|chunk| chunk.len())
                .sum();
            let names = summary
                .degraded_chunks
                .iter()
                .map(|index| (index + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(
                "{} of {} segments left untranslated (chunks {})",
                untranslated,
                segments.len(),
                names
            );
            warnings.push(Warning {
                kind: WarningKind::PartialTranslation,
                detail: format!(
                    "separator lost in chunks {} of {}; {} segments kept their original text",
                    names,
                    chunks.len(),
                    untranslated
                ),
            });
        }

        Ok(TranslationOutcome {
            document: output,
            report: TranslationReport {
                success: true,
                segments_translated: summary.translated,
                warnings,
                error: None,
            },
        })
    }

    async fn translate_native(
        &self,
        provider: &dyn DocumentTranslator,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslationOutcome, TranslationError> {
        // fail early on input the provider would reject anyway
        let segments_in = extraction::extract(document, &self.options.limits)?.segments.len();

        let poller = JobPoller::new(
            self.clock.clone(),
            self.options.retry.clone(),
            self.options.poll_interval,
            self.options.poll_timeout,
        );
        let completed = poller.run(provider, document, source_lang, target_lang, cancel).await?;

        let output = document.with_content(completed.content);
        self.validator.validate_standalone(document.kind, &output)?;
        debug!(
            "Job {} finished in {} polls",
            completed.job.job_id, completed.job.polls
        );

        Ok(TranslationOutcome {
            document: output,
            report: TranslationReport {
                success: true,
                segments_translated: segments_in,
                warnings: Vec::new(),
                error: None,
            },
        })
    }
}
