/*!
 * Structural validation of reconstructed documents.
 *
 * A `StructureProfile` is taken from the container right after parsing and
 * compared with the profile of the re-parsed output. Any difference is a
 * hard failure: a document that does not validate is never returned.
 */

use log::debug;

use crate::document::{ArchiveFlavor, ArchiveLimits, ContainerKind, Document, ParsedContainer, html, plain};
use crate::errors::TranslationError;

/// Structure of a parsed container, with text left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureProfile {
    Archive {
        flavor: ArchiveFlavor,
        entry_names: Vec<String>,
        /// Element count of every textual part, by part name
        part_elements: Vec<(String, usize)>,
    },
    Html {
        /// Element names and attributes in document order
        elements: Vec<String>,
        comments: usize,
    },
    Plain {
        lines: usize,
    },
}

impl StructureProfile {
    pub fn of(container: &ParsedContainer) -> Self {
        match container {
            ParsedContainer::Archive(package) => Self::Archive {
                flavor: package.flavor,
                entry_names: package.entry_names.clone(),
                part_elements: package
                    .parts
                    .iter()
                    .map(|part| (part.name.clone(), part.tree.element_count()))
                    .collect(),
            },
            ParsedContainer::Html(document) => Self::Html {
                elements: document.tree.element_signatures(),
                comments: html::comment_count(&document.tree),
            },
            ParsedContainer::Plain(tree) => Self::Plain {
                lines: plain::line_count(tree),
            },
        }
    }
}

fn invalid(message: impl Into<String>) -> TranslationError {
    TranslationError::ReconstructionInvalid(message.into())
}

/// Checks reconstructed containers against the structure of their source
#[derive(Debug, Clone, Default)]
pub struct ContainerValidator {
    limits: ArchiveLimits,
}

impl ContainerValidator {
    pub fn new(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    /// Parse `output`, turning any parse failure into `ReconstructionInvalid`
    fn reparse(&self, output: &Document) -> Result<ParsedContainer, TranslationError> {
        ParsedContainer::parse(output, &self.limits).map_err(|e| match e {
            TranslationError::MalformedDocument(detail) => invalid(format!("output does not parse: {}", detail)),
            other => other,
        })
    }

    /// Validate text-batch output against the profile of its source
    pub fn validate_reconstruction(
        &self,
        expected: &StructureProfile,
        output: &Document,
    ) -> Result<(), TranslationError> {
        let actual = StructureProfile::of(&self.reparse(output)?);

        match (expected, &actual) {
            (
                StructureProfile::Archive {
                    flavor,
                    entry_names,
                    part_elements,
                },
                StructureProfile::Archive {
                    entry_names: out_names,
                    part_elements: out_elements,
                    ..
                },
            ) => {
                check_mandatory_parts(*flavor, out_names)?;
                if entry_names != out_names {
                    return Err(invalid("archive entries differ from the source"));
                }
                for ((name, count), (_, out_count)) in part_elements.iter().zip(out_elements) {
                    if count != out_count {
                        return Err(invalid(format!(
                            "{} has {} elements, source had {}",
                            name, out_count, count
                        )));
                    }
                }
                if part_elements.len() != out_elements.len() {
                    return Err(invalid("number of textual parts changed"));
                }
            }
            (
                StructureProfile::Html { elements, comments },
                StructureProfile::Html {
                    elements: out_elements,
                    comments: out_comments,
                },
            ) => {
                if comments != out_comments {
                    return Err(invalid(format!(
                        "output has {} HTML comments, source had {}",
                        out_comments, comments
                    )));
                }
                if elements != out_elements {
                    let position = elements
                        .iter()
                        .zip(out_elements)
                        .position(|(a, b)| a != b)
                        .unwrap_or_else(|| elements.len().min(out_elements.len()));
                    return Err(invalid(format!(
                        "HTML element sequence differs at position {} ({} vs {} elements)",
                        position,
                        out_elements.len(),
                        elements.len()
                    )));
                }
            }
            (StructureProfile::Plain { lines }, StructureProfile::Plain { lines: out_lines }) => {
                if lines != out_lines {
                    return Err(invalid(format!("output has {} lines, source had {}", out_lines, lines)));
                }
            }
            _ => return Err(invalid("container kind changed")),
        }

        debug!("Reconstructed {} document is structurally valid", output.kind);
        Ok(())
    }

    /// Validate a document returned whole by a provider
    pub fn validate_standalone(&self, expected_kind: ContainerKind, output: &Document) -> Result<(), TranslationError> {
        if output.kind != expected_kind {
            return Err(invalid(format!("expected {}, got {}", expected_kind, output.kind)));
        }
        if output.is_empty() {
            return Err(invalid("provider returned an empty document"));
        }
        if let ParsedContainer::Archive(package) = self.reparse(output)? {
            check_mandatory_parts(package.flavor, &package.entry_names)?;
        }
        Ok(())
    }

    /// One output per extracted segment
    pub fn validate_segment_count(&self, expected: usize, actual: usize) -> Result<(), TranslationError> {
        if expected != actual {
            return Err(invalid(format!("{} segment outputs for {} segments", actual, expected)));
        }
        Ok(())
    }
}

fn check_mandatory_parts(flavor: ArchiveFlavor, entry_names: &[String]) -> Result<(), TranslationError> {
    for part in flavor.mandatory_parts() {
        if !entry_names.iter().any(|name| name == part) {
            return Err(invalid(format!("mandatory part {} is missing", part)));
        }
    }
    Ok(())
}
