/*!
 * Controller runs against files on disk
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use doctrans::app_config::{Config, TranslationMode, TranslationProvider};
use doctrans::app_controller::Controller;
use doctrans::errors::ErrorKind;
use doctrans::providers::mock::MockTranslator;
use doctrans::translation::{DocumentPipeline, PipelineOptions, TranslationBackend, VirtualClock};

use crate::common;

fn controller(translator: MockTranslator) -> Controller {
    common::init_logging();
    let mut config = common::config_with_key();
    config.target_language = "es".to_string();
    let pipeline = DocumentPipeline::with_clock(
        TranslationBackend::TextBatch(Arc::new(translator)),
        PipelineOptions::from(&config),
        Arc::new(VirtualClock::new()),
    );
    Controller::with_pipeline(config, pipeline)
}

#[tokio::test]
async fn test_run_withHtmlFile_shouldWriteTranslation() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "page.html", "<p>Hello</p>")?;
    let output_dir = temp_dir.path().join("out");

    let outcome = controller(MockTranslator::working("[ES] "))
        .run(&input, &output_dir, false, &CancellationToken::new())
        .await?;

    assert_eq!(outcome.output_path, output_dir.join("page.es.html"));
    assert!(outcome.succeeded());
    assert!(!outcome.skipped());
    assert_eq!(std::fs::read_to_string(&outcome.output_path)?, "<p>[ES] Hello</p>");
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.txt", "Hello\n")?;
    common::create_test_file(temp_dir.path(), "notes.es.txt", "old\n")?;

    let translator = MockTranslator::working("[ES] ");
    let controller = controller(translator.clone());

    let outcome = controller
        .run(&input, temp_dir.path(), false, &CancellationToken::new())
        .await?;
    assert!(outcome.skipped());
    assert_eq!(translator.request_count(), 0);
    assert_eq!(std::fs::read_to_string(&outcome.output_path)?, "old\n");

    let outcome = controller
        .run(&input, temp_dir.path(), true, &CancellationToken::new())
        .await?;
    assert!(outcome.succeeded());
    assert_eq!(std::fs::read_to_string(&outcome.output_path)?, "[ES] Hello\n");
    Ok(())
}

#[tokio::test]
async fn test_run_withDocx_shouldWriteArchive() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "report.docx", common::sample_docx())?;

    let outcome = controller(MockTranslator::working("[ES] "))
        .run(&input, temp_dir.path(), false, &CancellationToken::new())
        .await?;

    let report = outcome.report.unwrap();
    assert!(report.success);
    assert_eq!(report.segments_translated, 3);
    let written = std::fs::read(temp_dir.path().join("report.es.docx"))?;
    assert_eq!(&written[..2], b"PK");
    Ok(())
}

#[tokio::test]
async fn test_run_whenProviderFails_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "page.html", "<p>Hello</p>")?;

    let outcome = controller(MockTranslator::failing(403))
        .run(&input, temp_dir.path(), false, &CancellationToken::new())
        .await?;

    assert!(!outcome.succeeded());
    assert_eq!(
        outcome.report.and_then(|r| r.error).map(|e| e.kind),
        Some(ErrorKind::ProviderUnauthorized)
    );
    assert!(!outcome.output_path.exists());
    Ok(())
}

#[test]
fn test_run_withMissingInput_shouldError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(MockTranslator::working(""));

    let result = tokio_test::block_on(controller.run(
        &temp_dir.path().join("missing.html"),
        temp_dir.path(),
        false,
        &CancellationToken::new(),
    ));
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_build_pipeline_shouldFollowProviderAndMode() {
    let mut config = common::config_with_key();
    config.translation.mode = TranslationMode::NativeDocument;
    assert!(Controller::build_pipeline(&config).is_ok());

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.mode = TranslationMode::NativeDocument;
    assert!(Controller::build_pipeline(&config).is_err());
}

#[test]
fn test_format_duration_shouldPickLargestUnit() {
    assert_eq!(Controller::format_duration(Duration::from_millis(1500)), "1.500s");
    assert_eq!(Controller::format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(Controller::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
}
