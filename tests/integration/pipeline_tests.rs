/*!
 * End-to-end pipeline scenarios with scripted providers
 */

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use doctrans::document::archive::{self, ArchiveLimits};
use doctrans::document::{ContainerKind, Document};
use doctrans::errors::{ErrorKind, WarningKind};
use doctrans::providers::mock::MockTranslator;
use doctrans::translation::{DocumentPipeline, PipelineOptions, TranslationBackend, VirtualClock};

use crate::common;

fn pipeline_with(translator: MockTranslator, clock: Arc<VirtualClock>, max_chars: usize) -> DocumentPipeline {
    common::init_logging();
    let options = PipelineOptions {
        max_chars,
        ..PipelineOptions::default()
    };
    DocumentPipeline::with_clock(TranslationBackend::TextBatch(Arc::new(translator)), options, clock)
}

fn pipeline(translator: MockTranslator) -> DocumentPipeline {
    pipeline_with(translator, Arc::new(VirtualClock::new()), 4500)
}

fn entry(document: &Document, name: &str) -> Vec<u8> {
    archive::read_entry(document.bytes(), name, &ArchiveLimits::default()).unwrap()
}

#[tokio::test]
async fn test_html_withPrefixTranslator_shouldKeepElements() {
    let document = Document::new(ContainerKind::HtmlFragment, "<p>Hello</p><h1>World</h1>");
    let outcome = pipeline(MockTranslator::working("[ES] "))
        .translate(&document, "en", "es", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(outcome.document.bytes().to_vec()).unwrap(),
        "<p>[ES] Hello</p><h1>[ES] World</h1>"
    );
    assert_eq!(outcome.report.segments_translated, 2);
}

#[tokio::test]
async fn test_html_withContextSensitiveMarkup_shouldKeepEveryNode() {
    let cases = [
        ("<tr><td>Hi</td></tr>", "<tr><td>[ES] Hi</td></tr>"),
        ("<!-- keep --><p>Hi</p>", "<!-- keep --><p>[ES] Hi</p>"),
        (
            "<template><p>Hi</p></template><p>x</p>",
            "<template><p>Hi</p></template><p>[ES] x</p>",
        ),
        (
            r##"<svg><use xlink:href="#a"></use></svg><p>Hi</p>"##,
            r##"<svg><use xlink:href="#a"></use></svg><p>[ES] Hi</p>"##,
        ),
    ];

    for (source, expected) in cases {
        let document = Document::new(ContainerKind::HtmlFragment, source);
        let outcome = pipeline(MockTranslator::working("[ES] "))
            .translate(&document, "en", "es", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(String::from_utf8(outcome.document.bytes().to_vec()).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_docx_withPrefixTranslator_shouldOnlyRewriteText() {
    let original = Document::new(ContainerKind::ArchiveXml, common::sample_docx());
    let outcome = pipeline(MockTranslator::working("[DE] "))
        .translate(&original, "en", "de", &CancellationToken::new())
        .await
        .unwrap();
    let output = &outcome.document;

    let body = String::from_utf8(entry(output, "word/document.xml")).unwrap();
    assert!(body.contains("<w:t>[DE] Annual report</w:t>"));
    assert!(body.contains(r#"<w:t xml:space="preserve">[DE] Revenue grew </w:t>"#));
    assert!(body.contains("<w:t>[DE] strongly</w:t>"));
    assert!(body.contains(r#"<w:pStyle w:val="Heading1"/>"#));
    assert!(body.contains(r#"<w:t xml:space="preserve">   </w:t>"#));

    // everything that is not the document body is untouched
    for name in ["[Content_Types].xml", "_rels/.rels", "word/styles.xml", "word/media/image1.png"] {
        assert_eq!(entry(output, name), entry(&original, name), "{} changed", name);
    }
    assert_eq!(outcome.report.segments_translated, 3);
}

#[tokio::test]
async fn test_docx_withIdentityTranslator_shouldRoundTripEveryEntry() {
    let original = Document::new(ContainerKind::ArchiveXml, common::sample_docx());
    let outcome = pipeline(MockTranslator::working(""))
        .translate(&original, "en", "de", &CancellationToken::new())
        .await
        .unwrap();

    let limits = ArchiveLimits::default();
    let names = archive::entry_names(original.bytes(), &limits).unwrap();
    assert_eq!(archive::entry_names(outcome.document.bytes(), &limits).unwrap(), names);
    for name in &names {
        assert_eq!(entry(&outcome.document, name), entry(&original, name), "{} changed", name);
    }
}

#[tokio::test]
async fn test_pptx_shouldTranslateSlidesButNotLayouts() {
    let original = Document::new(ContainerKind::ArchiveXml, common::sample_pptx());
    let outcome = pipeline(MockTranslator::working("[FR] "))
        .translate(&original, "en", "fr", &CancellationToken::new())
        .await
        .unwrap();

    let slide = String::from_utf8(entry(&outcome.document, "ppt/slides/slide1.xml")).unwrap();
    assert!(slide.contains("<a:t>[FR] Quarterly review</a:t>"));
    assert!(slide.contains("<a:t>[FR] Sales &amp; marketing</a:t>"));
    assert_eq!(
        entry(&outcome.document, "ppt/slideLayouts/slideLayout1.xml"),
        entry(&original, "ppt/slideLayouts/slideLayout1.xml")
    );
}

#[tokio::test]
async fn test_separatorDroppedInOneChunk_shouldDegradeOnlyThatChunk() {
    // 4 paragraphs, 2 per chunk; the provider loses the separator for the second chunk
    let document = Document::new(
        ContainerKind::HtmlFragment,
        "<p>Alpha one</p><p>Alpha two</p><p>Gamma one</p><p>Gamma two</p>",
    );
    let translator = MockTranslator::dropping_separators_when("[ES] ", "Gamma");
    let outcome = pipeline_with(translator.clone(), Arc::new(VirtualClock::new()), 30)
        .translate(&document, "en", "es", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translator.request_count(), 2);
    assert_eq!(
        String::from_utf8(outcome.document.bytes().to_vec()).unwrap(),
        "<p>[ES] Alpha one</p><p>[ES] Alpha two</p><p>Gamma one</p><p>Gamma two</p>"
    );

    let report = &outcome.report;
    assert!(report.success);
    assert_eq!(report.segments_translated, 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::PartialTranslation);
    assert!(report.warnings[0].detail.contains("chunks 2"));
}

#[tokio::test]
async fn test_separatorDroppedEverywhere_shouldWarnOnlyOnce() {
    let text: String = (0..12).map(|i| format!("<p>Paragraph {}</p>", i)).collect();
    let document = Document::new(ContainerKind::HtmlFragment, text);
    let outcome = pipeline_with(MockTranslator::dropping_separators("[IT] "), Arc::new(VirtualClock::new()), 40)
        .translate(&document, "en", "it", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.has_warning(WarningKind::PartialTranslation));
    // untranslated output is still a valid copy of the input
    assert_eq!(outcome.document.bytes(), document.bytes());
}

#[tokio::test]
async fn test_alteredSeparator_shouldStillAlign() {
    let document = Document::new(ContainerKind::HtmlFragment, "<li>One</li><li>Two</li><li>Three</li>");
    let outcome = pipeline(MockTranslator::mangling_separators("[NL] "))
        .translate(&document, "en", "nl", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(outcome.document.bytes().to_vec()).unwrap(),
        "<li>[NL] One</li><li>[NL] Two</li><li>[NL] Three</li>"
    );
    assert!(outcome.report.warnings.is_empty());
}

#[tokio::test]
async fn test_sourceContainingSeparator_shouldPickAnotherMarker() {
    let document = Document::new(ContainerKind::PlainText, "keep <<SEG>> literally\nsecond line\n");
    let translator = MockTranslator::working("> ");
    let outcome = pipeline(translator.clone())
        .translate(&document, "en", "fr", &CancellationToken::new())
        .await
        .unwrap();

    assert!(translator.requests()[0].contains("<<SEG1>>"));
    assert_eq!(
        String::from_utf8(outcome.document.bytes().to_vec()).unwrap(),
        "> keep <<SEG>> literally\n> second line\n"
    );
}

#[tokio::test]
async fn test_transientFailures_shouldBackOffThenSucceed() {
    let clock = Arc::new(VirtualClock::new());
    let translator = MockTranslator::fail_times(503, 2, "[ES] ");
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let outcome = pipeline_with(translator.clone(), clock.clone(), 4500)
        .translate(&document, "en", "es", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.document.bytes(), b"[ES] Hello\n");
    assert_eq!(translator.request_count(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(1000), Duration::from_millis(2000)]);
}

#[tokio::test]
async fn test_notFound_shouldFailWithoutRetry() {
    let clock = Arc::new(VirtualClock::new());
    let translator = MockTranslator::failing(404);
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let (output, report) = pipeline_with(translator.clone(), clock.clone(), 4500)
        .run(&document, "en", "es", &CancellationToken::new())
        .await;

    assert!(output.is_none());
    assert!(!report.success);
    assert_eq!(report.error.as_ref().map(|e| e.kind), Some(ErrorKind::ProviderFailure));
    assert_eq!(translator.request_count(), 1);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_quotaExceeded_shouldBeClassified() {
    let document = Document::new(ContainerKind::PlainText, "Hello\n");
    let (_, report) = pipeline(MockTranslator::failing(456))
        .run(&document, "en", "es", &CancellationToken::new())
        .await;
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::ProviderQuotaExceeded));
}

#[tokio::test]
async fn test_unauthorized_shouldBeClassified() {
    let document = Document::new(ContainerKind::PlainText, "Hello\n");
    let (_, report) = pipeline(MockTranslator::failing(401))
        .run(&document, "en", "es", &CancellationToken::new())
        .await;
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::ProviderUnauthorized));
}

#[tokio::test]
async fn test_emptyDocument_shouldReportNoTranslatableContent() {
    let translator = MockTranslator::working("");
    let document = Document::new(ContainerKind::HtmlFragment, "<div><img src=\"a.png\"><script>var x = 1;</script></div>");
    let (output, report) = pipeline(translator.clone())
        .run(&document, "en", "es", &CancellationToken::new())
        .await;

    assert!(output.is_none());
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::NoTranslatableContent));
    assert_eq!(translator.request_count(), 0);
}

#[tokio::test]
async fn test_cancelledRun_shouldNotCallProvider() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let translator = MockTranslator::working("");
    let document = Document::new(ContainerKind::PlainText, "Hello\n");

    let (output, report) = pipeline(translator.clone()).run(&document, "en", "es", &cancel).await;

    assert!(output.is_none());
    assert_eq!(report.error.map(|e| e.kind), Some(ErrorKind::Cancelled));
    assert_eq!(translator.request_count(), 0);
}

#[tokio::test]
async fn test_report_shouldSerializeToJson() {
    let document = Document::new(ContainerKind::HtmlFragment, "<p>Hello</p>");
    let outcome = pipeline(MockTranslator::working("[ES] "))
        .translate(&document, "en", "es", &CancellationToken::new())
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&outcome.report.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["segments_translated"], 1);
    assert_eq!(json["warnings"], serde_json::json!([]));
    assert!(json.get("error").is_none());
}
