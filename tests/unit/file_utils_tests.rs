/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;

use doctrans::document::{ContainerKind, Document};
use doctrans::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "notes.txt", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.txt")));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}

/// Test that generate_output_path keeps the extension after the language
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/report.docx"), Path::new("/tmp/output"), "fr");
    assert_eq!(output_path, Path::new("/tmp/output/report.fr.docx"));

    let output_path = FileManager::generate_output_path(Path::new("README"), Path::new("out"), "de");
    assert_eq!(output_path, Path::new("out/README.de"));
}

#[test]
fn test_container_kind_from_path_shouldMapExtensions() {
    let kind = |name: &str| FileManager::container_kind_from_path(name).ok();

    assert_eq!(kind("a.docx"), Some(ContainerKind::ArchiveXml));
    assert_eq!(kind("a.PPTX"), Some(ContainerKind::ArchiveXml));
    assert_eq!(kind("a.xlsx"), Some(ContainerKind::ArchiveXml));
    assert_eq!(kind("a.htm"), Some(ContainerKind::HtmlFragment));
    assert_eq!(kind("a.xhtml"), Some(ContainerKind::HtmlFragment));
    assert_eq!(kind("a.md"), Some(ContainerKind::PlainText));
    assert_eq!(kind("a.pdf"), None);
    assert_eq!(kind("no_extension"), None);
}

#[test]
fn test_read_then_write_document_shouldKeepBytesAndName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "page.html", "<p>Hi</p>")?;

    let document = FileManager::read_document(&input)?;
    assert_eq!(document.kind, ContainerKind::HtmlFragment);
    assert_eq!(document.name(), Some("page.html"));

    let output = temp_dir.path().join("nested").join("page.fr.html");
    FileManager::write_document(&output, &Document::new(ContainerKind::HtmlFragment, "<p>Salut</p>"))?;
    assert_eq!(std::fs::read_to_string(output)?, "<p>Salut</p>");
    Ok(())
}
