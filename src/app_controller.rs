use anyhow::{Result, anyhow};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::{Config, TranslationMode, TranslationProvider};
use crate::file_utils::FileManager;
use crate::providers::anthropic::Anthropic;
use crate::providers::deepl::DeepL;
use crate::translation::{DocumentPipeline, PipelineOptions, TranslationBackend, TranslationReport};

// @module: Application controller for document translation

/// What happened to one input file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub output_path: PathBuf,
    /// Absent when the file was skipped
    pub report: Option<TranslationReport>,
}

impl FileOutcome {
    pub fn skipped(&self) -> bool {
        self.report.is_none()
    }

    pub fn succeeded(&self) -> bool {
        self.report.as_ref().is_none_or(|report| report.success)
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline built from the configured provider
    pipeline: DocumentPipeline,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let pipeline = Self::build_pipeline(&config)?;
        Ok(Self { config, pipeline })
    }

    /// Controller running an already assembled pipeline
    pub fn with_pipeline(config: Config, pipeline: DocumentPipeline) -> Self {
        Self { config, pipeline }
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    // @creates: Provider client and pipeline for the configured provider and mode
    pub fn build_pipeline(config: &Config) -> Result<DocumentPipeline> {
        let translation = &config.translation;
        let api_key = translation.get_api_key();
        let endpoint = translation.get_endpoint();
        let timeout = translation.get_timeout();

        let backend = match (&translation.provider, translation.mode) {
            (TranslationProvider::DeepL, TranslationMode::TextBatch) => {
                TranslationBackend::TextBatch(Arc::new(DeepL::new(api_key, endpoint, timeout)?))
            }
            (TranslationProvider::DeepL, TranslationMode::NativeDocument) => {
                TranslationBackend::NativeDocument(Arc::new(DeepL::new(api_key, endpoint, timeout)?))
            }
            (TranslationProvider::Anthropic, TranslationMode::TextBatch) => {
                let anthropic = Anthropic::new(api_key, endpoint, translation.get_model(), timeout)?
                    .with_system_prompt(translation.common.system_prompt.clone())
                    .with_temperature(translation.common.temperature);
                TranslationBackend::TextBatch(Arc::new(anthropic))
            }
            (TranslationProvider::Anthropic, TranslationMode::NativeDocument) => {
                return Err(anyhow!("Anthropic provider does not support native document translation"));
            }
        };

        info!(
            "Using {} in {} mode",
            translation.provider.display_name(),
            translation.mode
        );
        Ok(DocumentPipeline::new(backend, PipelineOptions::from(config)))
    }

    /// Translate one file into `output_dir`.
    ///
    /// Pipeline failures are returned in the report, nothing is written then.
    pub async fn run(
        &self,
        input_file: &Path,
        output_dir: &Path,
        force_overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = FileManager::generate_output_path(input_file, output_dir, &self.config.target_language);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(FileOutcome {
                output_path,
                report: None,
            });
        }

        let document = FileManager::read_document(input_file)?;
        info!("Translating {:?} ({})", input_file, document.kind);

        let (translated, report) = self
            .pipeline
            .run(
                &document,
                &self.config.source_language,
                &self.config.target_language,
                cancel,
            )
            .await;

        if let Some(translated) = translated {
            FileManager::write_document(&output_path, &translated)?;
            info!(
                "Success: {} in {}",
                output_path.display(),
                Self::format_duration(start_time.elapsed())
            );
        }

        Ok(FileOutcome {
            output_path,
            report: Some(report),
        })
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
