/*!
 * Zip archives of XML parts (word-processing, presentation and spreadsheet files).
 *
 * Only the parts that carry user text are parsed. Everything else, including
 * masters, layouts, relationships and media, is copied raw from the source
 * archive when the package is written back.
 */

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::TranslationError;

use super::tree::{ElementNode, Tree};
use super::xml;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

static WORD_TEXT_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes|comments)\.xml$")
        .expect("word part pattern")
});

static PRESENTATION_TEXT_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ppt/(slides/slide\d+|notesSlides/notesSlide\d+)\.xml$")
        .expect("presentation part pattern")
});

/// Guards against archives that expand far beyond their size on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_entries: usize,
    pub max_part_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_part_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Application family of an archive, decided by its main part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFlavor {
    Word,
    Presentation,
    Spreadsheet,
    Generic,
}

impl ArchiveFlavor {
    pub fn detect<S: AsRef<str>>(entry_names: &[S]) -> Self {
        let has = |part: &str| entry_names.iter().any(|name| name.as_ref() == part);
        if has("word/document.xml") {
            Self::Word
        } else if has("ppt/presentation.xml") {
            Self::Presentation
        } else if has("xl/workbook.xml") {
            Self::Spreadsheet
        } else {
            Self::Generic
        }
    }

    /// Part that must exist for the archive to open in its application
    pub fn main_part(self) -> Option<&'static str> {
        match self {
            Self::Word => Some("word/document.xml"),
            Self::Presentation => Some("ppt/presentation.xml"),
            Self::Spreadsheet => Some("xl/workbook.xml"),
            Self::Generic => None,
        }
    }

    /// Parts every archive of this flavor must contain
    pub fn mandatory_parts(self) -> Vec<&'static str> {
        match self.main_part() {
            Some(main) => vec![CONTENT_TYPES_PART, main],
            None => Vec::new(),
        }
    }

    /// Whether `name` holds translatable text
    pub fn is_textual_part(self, name: &str) -> bool {
        match self {
            Self::Word => WORD_TEXT_PART.is_match(name),
            Self::Presentation => PRESENTATION_TEXT_PART.is_match(name),
            Self::Spreadsheet => name == "xl/sharedStrings.xml",
            Self::Generic => {
                name.ends_with(".xml") && name != CONTENT_TYPES_PART && !name.contains("_rels/")
            }
        }
    }

    /// Whether `element` is a text run container.
    ///
    /// Generic archives have no run markup, so every text node counts.
    pub fn is_run_text(self, element: &ElementNode) -> bool {
        match self {
            Self::Word => element.name == "w:t",
            Self::Presentation => element.name == "a:t",
            Self::Spreadsheet => element.local_name() == "t",
            Self::Generic => true,
        }
    }
}

/// A parsed textual part
#[derive(Debug, Clone)]
pub struct XmlPart {
    pub name: String,
    pub tree: Tree,
    /// Set once reinsertion changed any text in the part
    pub dirty: bool,
}

/// An opened archive: entry names in order and the parsed textual parts
#[derive(Debug, Clone)]
pub struct ArchivePackage {
    pub flavor: ArchiveFlavor,
    pub entry_names: Vec<String>,
    pub parts: Vec<XmlPart>,
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, TranslationError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read one entry without trusting the size its header claims
fn read_limited(entry: impl Read, name: &str, limit: u64) -> Result<Vec<u8>, TranslationError> {
    let mut buffer = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut buffer)
        .map_err(|e| TranslationError::MalformedDocument(format!("{}: {}", name, e)))?;
    if buffer.len() as u64 > limit {
        return Err(TranslationError::MalformedDocument(format!(
            "{} expands beyond {} bytes",
            name, limit
        )));
    }
    Ok(buffer)
}

/// Entry names of a zip archive in central-directory order
pub fn entry_names(bytes: &[u8], limits: &ArchiveLimits) -> Result<Vec<String>, TranslationError> {
    let mut archive = open_archive(bytes)?;
    if archive.len() > limits.max_entries {
        return Err(TranslationError::MalformedDocument(format!(
            "archive has {} entries, limit is {}",
            archive.len(),
            limits.max_entries
        )));
    }
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index_raw(index)?.name().to_string());
    }
    Ok(names)
}

/// Decompressed bytes of a single entry
pub fn read_entry(bytes: &[u8], name: &str, limits: &ArchiveLimits) -> Result<Vec<u8>, TranslationError> {
    let mut archive = open_archive(bytes)?;
    let entry = archive.by_name(name)?;
    read_limited(entry, name, limits.max_part_bytes)
}

impl ArchivePackage {
    /// Open an archive and parse its textual parts
    pub fn open(bytes: &[u8], limits: &ArchiveLimits) -> Result<Self, TranslationError> {
        let entry_names = entry_names(bytes, limits)?;
        let flavor = ArchiveFlavor::detect(&entry_names);

        let mut archive = open_archive(bytes)?;
        let mut parts = Vec::new();
        for (index, name) in entry_names.iter().enumerate() {
            if !flavor.is_textual_part(name) {
                continue;
            }
            let entry = archive.by_index(index)?;
            if entry.size() > limits.max_part_bytes {
                return Err(TranslationError::MalformedDocument(format!(
                    "{} declares {} bytes, limit is {}",
                    name,
                    entry.size(),
                    limits.max_part_bytes
                )));
            }
            let content = read_limited(entry, name, limits.max_part_bytes)?;
            let tree = xml::parse(name, &content)?;
            parts.push(XmlPart {
                name: name.clone(),
                tree,
                dirty: false,
            });
        }

        debug!(
            "Opened {:?} archive: {} entries, {} textual parts",
            flavor,
            entry_names.len(),
            parts.len()
        );

        Ok(Self {
            flavor,
            entry_names,
            parts,
        })
    }

    /// Write the package, copying every untouched entry raw from `original`
    pub fn write(&self, original: &[u8]) -> Result<Vec<u8>, TranslationError> {
        let dirty: HashSet<&str> = self
            .parts
            .iter()
            .filter(|part| part.dirty)
            .map(|part| part.name.as_str())
            .collect();

        let mut source = open_archive(original)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..source.len() {
            let entry = source.by_index_raw(index)?;
            let name = entry.name().to_string();
            if !dirty.contains(name.as_str()) {
                writer.raw_copy_file(entry)?;
                continue;
            }

            let method = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let mut options = FileOptions::default()
                .compression_method(method)
                .last_modified_time(entry.last_modified());
            if let Some(mode) = entry.unix_mode() {
                options = options.unix_permissions(mode);
            }
            drop(entry);

            let part = self
                .parts
                .iter()
                .find(|part| part.name == name)
                .ok_or_else(|| TranslationError::MalformedDocument(format!("{} vanished", name)))?;
            writer.start_file(name.as_str(), options)?;
            writer
                .write_all(&xml::serialize(&part.tree))
                .map_err(|e| TranslationError::MalformedDocument(format!("{}: {}", name, e)))?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
