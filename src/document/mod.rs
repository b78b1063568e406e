/*!
 * Document containers and the data model shared by the pipeline stages.
 *
 * - `tree`: arena of nodes every container is parsed into
 * - `xml`: byte-preserving XML parts
 * - `html`: HTML fragments and documents
 * - `plain`: plain text, one node per line
 * - `archive`: zip archives of XML parts
 */

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;

pub mod archive;
pub mod html;
pub mod plain;
pub mod tree;
pub mod xml;

pub use archive::{ArchiveFlavor, ArchiveLimits, ArchivePackage};
pub use html::{HtmlDocument, HtmlShape};
pub use tree::{ElementNode, NodeId, NodeKind, TextNode, Tree, TreeVisitor};

/// Structural format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    /// Zip archive of XML parts (docx, pptx, xlsx)
    ArchiveXml,
    HtmlFragment,
    PlainText,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArchiveXml => write!(f, "archive-xml"),
            Self::HtmlFragment => write!(f, "html-fragment"),
            Self::PlainText => write!(f, "plain-text"),
        }
    }
}

/// Immutable document bytes plus their declared container kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: ContainerKind,
    content: Bytes,
    /// File name used when uploading to a provider
    name: Option<String>,
}

impl Document {
    pub fn new(kind: ContainerKind, content: impl Into<Bytes>) -> Self {
        Self {
            kind,
            content: content.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Same kind and name, different bytes
    pub fn with_content(&self, content: impl Into<Bytes>) -> Self {
        Self {
            kind: self.kind,
            content: content.into(),
            name: self.name.clone(),
        }
    }

    /// The declared name, or one derived from the container kind
    pub fn file_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.suggested_file_name())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    /// Cheap clone of the underlying buffer
    pub fn content(&self) -> Bytes {
        self.content.clone()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// A file name whose extension tells a remote service what the bytes are
    pub fn suggested_file_name(&self) -> String {
        let extension = match self.kind {
            ContainerKind::HtmlFragment => "html",
            ContainerKind::PlainText => "txt",
            ContainerKind::ArchiveXml => {
                match archive::entry_names(self.bytes(), &ArchiveLimits::default()) {
                    Ok(names) => match ArchiveFlavor::detect(&names) {
                        ArchiveFlavor::Word => "docx",
                        ArchiveFlavor::Presentation => "pptx",
                        ArchiveFlavor::Spreadsheet => "xlsx",
                        ArchiveFlavor::Generic => "zip",
                    },
                    Err(_) => "zip",
                }
            }
        };
        format!("document.{}", extension)
    }
}

/// Where a segment came from: a tree of the container and a text node inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginRef {
    /// Index of the tree (archive part) inside the container
    pub part: usize,
    pub node: NodeId,
}

/// Formatting inferred from the markup around a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StyleHints {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub heading_level: Option<u8>,
}

/// One unit of translatable text
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Ordinal in document order, the only join key with the translations
    pub id: usize,
    /// Text with surrounding whitespace removed
    pub text: String,
    pub origin: OriginRef,
    pub style: StyleHints,
    leading: String,
    trailing: String,
}

impl Segment {
    /// Build a segment from the full text of its node
    pub fn from_node_text(id: usize, raw: &str, origin: OriginRef, style: StyleHints) -> Self {
        let text = raw.trim();
        let start = raw.len() - raw.trim_start().len();
        let end = start + text.len();
        Self {
            id,
            text: text.to_string(),
            origin,
            style,
            leading: raw[..start].to_string(),
            trailing: raw[end..].to_string(),
        }
    }

    /// Put the original surrounding whitespace back around `translated`
    pub fn restore(&self, translated: &str) -> String {
        format!("{}{}{}", self.leading, translated.trim(), self.trailing)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A document parsed into mutable trees
#[derive(Debug, Clone)]
pub enum ParsedContainer {
    Archive(ArchivePackage),
    Html(HtmlDocument),
    Plain(Tree),
}

impl ParsedContainer {
    pub fn parse(document: &Document, limits: &ArchiveLimits) -> Result<Self, TranslationError> {
        match document.kind {
            ContainerKind::ArchiveXml => Ok(Self::Archive(ArchivePackage::open(document.bytes(), limits)?)),
            ContainerKind::HtmlFragment => Ok(Self::Html(html::parse(document.bytes())?)),
            ContainerKind::PlainText => Ok(Self::Plain(plain::parse(document.bytes())?)),
        }
    }

    pub fn tree_count(&self) -> usize {
        match self {
            Self::Archive(package) => package.parts.len(),
            Self::Html(_) | Self::Plain(_) => 1,
        }
    }

    pub fn tree(&self, part: usize) -> Option<&Tree> {
        match self {
            Self::Archive(package) => package.parts.get(part).map(|p| &p.tree),
            Self::Html(document) if part == 0 => Some(&document.tree),
            Self::Plain(tree) if part == 0 => Some(tree),
            _ => None,
        }
    }

    /// Replace the text behind `origin`, marking its archive part as changed
    pub fn replace_text(&mut self, origin: OriginRef, text: &str) -> bool {
        match self {
            Self::Archive(package) => match package.parts.get_mut(origin.part) {
                Some(part) => {
                    let changed = part.tree.replace_text(origin.node, text);
                    part.dirty |= changed;
                    changed
                }
                None => false,
            },
            Self::Html(document) if origin.part == 0 => document.tree.replace_text(origin.node, text),
            Self::Plain(tree) if origin.part == 0 => tree.replace_text(origin.node, text),
            _ => false,
        }
    }

    /// Serialize back into the container format of `original`
    pub fn serialize(&self, original: &Document) -> Result<Document, TranslationError> {
        let bytes = match self {
            Self::Archive(package) => package.write(original.bytes())?,
            Self::Html(document) => html::serialize(&document.tree),
            Self::Plain(tree) => plain::serialize(tree),
        };
        Ok(original.with_content(bytes))
    }
}
