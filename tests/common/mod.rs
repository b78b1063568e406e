/*!
 * Common test utilities for the doctrans test suite
 */

use anyhow::Result;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use doctrans::app_config::Config;

pub const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Route library logs to the test output; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Default config with an API key for the active provider, so it validates
pub fn config_with_key() -> Config {
    let mut config = Config::default();
    let provider = config.translation.provider.to_lowercase_string();
    if let Some(provider_config) = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == provider)
    {
        provider_config.api_key = "test-key:fx".to_string();
    }
    config
}

/// Zip the given entries in order; `.png` entries are stored, the rest deflated
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        let method = if name.ends_with(".png") {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        writer
            .start_file(*name, FileOptions::default().compression_method(method))
            .expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/></Types>"#;

pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d, 1, 2, 3];

/// Word document body with a bold heading and a paragraph of two runs
pub fn word_document_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{ns}"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Annual report</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Revenue grew </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>strongly</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#,
        ns = WORD_NS
    )
}

pub fn word_styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{ns}"><w:style w:styleId="Heading1"><w:name w:val="heading 1"/></w:style></w:styles>"#,
        ns = WORD_NS
    )
}

/// A small docx: content types, relationships, document, styles and an image
pub fn sample_docx() -> Vec<u8> {
    let document = word_document_xml();
    let styles = word_styles_xml();
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", b"<?xml version=\"1.0\"?><Relationships/>".as_slice()),
        ("word/document.xml", document.as_bytes()),
        ("word/styles.xml", styles.as_bytes()),
        ("word/media/image1.png", FAKE_PNG),
    ])
}

pub fn slide_xml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Body"/><p:nvPr/></p:nvSpPr><p:txBody><a:p><a:r><a:t>{body}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        title = title,
        body = body
    )
}

/// A small pptx with one slide and a layout whose placeholder text must stay
pub fn sample_pptx() -> Vec<u8> {
    let slide = slide_xml("Quarterly review", "Sales &amp; marketing");
    let layout = r#"<?xml version="1.0"?><p:sldLayout xmlns:a="a" xmlns:p="p"><a:t>Click to edit title</a:t></p:sldLayout>"#;
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("ppt/presentation.xml", b"<?xml version=\"1.0\"?><p:presentation xmlns:p=\"p\"/>".as_slice()),
        ("ppt/slides/slide1.xml", slide.as_bytes()),
        ("ppt/slideLayouts/slideLayout1.xml", layout.as_bytes()),
    ])
}
