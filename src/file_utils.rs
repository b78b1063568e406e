use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{ContainerKind, Document};

// @module: File and directory utilities

/// Extensions read as zip archives of XML parts
const ARCHIVE_EXTENSIONS: [&str; 3] = ["docx", "pptx", "xlsx"];
const HTML_EXTENSIONS: [&str; 3] = ["html", "htm", "xhtml"];
const PLAIN_EXTENSIONS: [&str; 2] = ["txt", "md"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @returns: Container kind implied by the file extension
    pub fn container_kind_from_path<P: AsRef<Path>>(path: P) -> Result<ContainerKind> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .ok_or_else(|| anyhow!("File has no extension: {:?}", path))?;

        if ARCHIVE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(ContainerKind::ArchiveXml)
        } else if HTML_EXTENSIONS.contains(&extension.as_str()) {
            Ok(ContainerKind::HtmlFragment)
        } else if PLAIN_EXTENSIONS.contains(&extension.as_str()) {
            Ok(ContainerKind::PlainText)
        } else {
            Err(anyhow!("Unsupported file type: .{}", extension))
        }
    }

    // @generates: Output path for a translated document
    // @params: input_file, output_dir, target_language
    // @returns: <output_dir>/<stem>.<target_language>.<ext>
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        // Get the file stem (filename without extension)
        let stem = input_file.file_stem().unwrap_or_default();

        // Create the output filename with language code and extension
        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(target_language);
        if let Some(extension) = input_file.extension() {
            output_filename.push('.');
            output_filename.push_str(&extension.to_string_lossy());
        }

        // Join with the output directory
        output_dir.join(output_filename)
    }

    /// Read a document, inferring its container kind from the extension
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
        let path = path.as_ref();
        let kind = Self::container_kind_from_path(path)?;
        let content = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;

        let document = Document::new(kind, content);
        Ok(match path.file_name() {
            Some(name) => document.with_name(name.to_string_lossy()),
            None => document,
        })
    }

    /// Write document bytes, creating the parent directory
    pub fn write_document<P: AsRef<Path>>(path: P, document: &Document) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, document.bytes())
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
