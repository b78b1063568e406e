/*!
 * Native document mode: job submission, polling and result validation
 */

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use doctrans::document::{ContainerKind, Document};
use doctrans::errors::ErrorKind;
use doctrans::providers::JobStatus;
use doctrans::providers::mock::MockDocumentTranslator;
use doctrans::translation::{DocumentPipeline, PipelineOptions, TranslationBackend, VirtualClock};

use crate::common;

fn native_pipeline(provider: Arc<MockDocumentTranslator>, clock: Arc<VirtualClock>) -> DocumentPipeline {
    common::init_logging();
    let options = PipelineOptions {
        poll_interval: Duration::from_secs(2),
        poll_timeout: Duration::from_secs(20),
        ..PipelineOptions::default()
    };
    DocumentPipeline::with_clock(TranslationBackend::NativeDocument(provider), options, clock)
}

#[tokio::test]
async fn test_native_withTranslatedArchive_shouldReturnProviderBytes() {
    let translated = common::build_zip(&[
        ("[Content_Types].xml", common::CONTENT_TYPES.as_bytes()),
        ("word/document.xml", common::word_document_xml().replace("Annual report", "Jahresbericht").as_bytes()),
    ]);
    let provider = Arc::new(
        MockDocumentTranslator::new(vec![JobStatus::Queued, JobStatus::Translating, JobStatus::Done])
            .with_result(translated.clone()),
    );
    let clock = Arc::new(VirtualClock::new());
    let document = Document::new(ContainerKind::ArchiveXml, common::sample_docx()).with_name("report.docx");

    let outcome = native_pipeline(provider.clone(), clock.clone())
        .translate(&document, "en", "de", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.document.bytes(), translated.as_slice());
    assert_eq!(outcome.document.name(), Some("report.docx"));
    assert_eq!(outcome.report.segments_translated, 3);
    assert_eq!(provider.poll_count(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(2), Duration::from_secs(2)]);
}

#[tokio::test]
async fn test_native_withErrorOnThirdPoll_shouldFailWithProviderDetail() {
    let provider = Arc::new(MockDocumentTranslator::new(vec![
        JobStatus::Queued,
        JobStatus::Translating,
        JobStatus::Error("Source document is password protected".to_string()),
    ]));
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let (output, report) = native_pipeline(provider.clone(), Arc::new(VirtualClock::new()))
        .run(&document, "en", "de", &CancellationToken::new())
        .await;

    assert!(output.is_none());
    assert_eq!(provider.poll_count(), 3);
    let error = report.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ProviderFailure);
    assert!(error.detail.contains("password protected"));
}

#[tokio::test]
async fn test_native_whenJobNeverFinishes_shouldTimeOut() {
    let provider = Arc::new(MockDocumentTranslator::new(vec![JobStatus::Translating]));
    let clock = Arc::new(VirtualClock::new());
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let (output, report) = native_pipeline(provider.clone(), clock.clone())
        .run(&document, "en", "de", &CancellationToken::new())
        .await;

    assert!(output.is_none());
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::Timeout));
    // one poll at the start and one after each of the ten pauses
    assert_eq!(provider.poll_count(), 11);
    assert_eq!(clock.sleeps().iter().sum::<Duration>(), Duration::from_secs(20));
}

#[tokio::test]
async fn test_native_withCorruptResult_shouldFailValidation() {
    let provider = Arc::new(MockDocumentTranslator::new(vec![JobStatus::Done]).with_result("not a zip archive"));
    let document = Document::new(ContainerKind::ArchiveXml, common::sample_docx());

    let (output, report) = native_pipeline(provider, Arc::new(VirtualClock::new()))
        .run(&document, "en", "de", &CancellationToken::new())
        .await;

    assert!(output.is_none());
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::ReconstructionInvalid));
}

#[tokio::test]
async fn test_native_withMalformedInput_shouldNotSubmit() {
    let provider = Arc::new(MockDocumentTranslator::new(vec![JobStatus::Done]));
    let document = Document::new(ContainerKind::ArchiveXml, "definitely not an archive");

    let (_, report) = native_pipeline(provider.clone(), Arc::new(VirtualClock::new()))
        .run(&document, "en", "de", &CancellationToken::new())
        .await;

    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::MalformedDocument));
    assert_eq!(provider.poll_count(), 0);
}

#[tokio::test]
async fn test_native_whenCancelledDuringPolling_shouldReleaseJob() {
    let provider = Arc::new(MockDocumentTranslator::new(vec![JobStatus::Translating]).with_cancel_support());
    let cancel = CancellationToken::new();
    let pipeline = native_pipeline(provider.clone(), Arc::new(VirtualClock::new()));
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.run(&document, "en", "de", &cancel).await })
    };
    while provider.poll_count() == 0 {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    let (output, report) = task.await.unwrap();
    assert!(output.is_none());
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::Cancelled));
    assert!(provider.was_cancelled());
}
