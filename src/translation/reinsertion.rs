/*!
 * Reinsertion of translated chunks into the parsed container.
 *
 * Each translated chunk is split back into per-segment texts. The exact
 * separator is tried first, then a whitespace and case tolerant variant. When
 * neither yields one part per segment, the chunk keeps its original text so
 * translations never land on the wrong segment.
 */

use log::{debug, warn};

use crate::document::{ParsedContainer, Segment};
use crate::errors::TranslationError;

use super::chunking::{Chunk, SeparatorToken};

/// How a translated chunk was split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Split on the exact separator
    Strict(Vec<String>),
    /// Split on a variant of the separator the provider altered
    Fuzzy(Vec<String>),
    /// Separator lost or segment count changed: keep the source text
    Fallback,
}

/// Split `translated` into `expected` parts
pub fn split_translation(translated: &str, expected: usize, separator: &SeparatorToken) -> SplitOutcome {
    let owned = |parts: Vec<&str>| parts.into_iter().map(str::to_string).collect::<Vec<_>>();

    let strict = separator.split_strict(translated).unwrap_or_else(|| vec![translated]);
    if strict.len() == expected {
        return SplitOutcome::Strict(owned(strict));
    }

    match separator.split_fuzzy(translated) {
        Some(parts) if parts.len() == expected => SplitOutcome::Fuzzy(owned(parts)),
        _ => SplitOutcome::Fallback,
    }
}

/// What reinsertion did to a container
#[derive(Debug, Clone, Default)]
pub struct ReinsertionSummary {
    /// Final text of every segment, indexed by segment id
    pub outputs: Vec<String>,
    /// Segments that received a translation
    pub translated: usize,
    /// Chunks that needed the fuzzy separator
    pub fuzzy_chunks: Vec<usize>,
    /// Chunks that kept their original text
    pub degraded_chunks: Vec<usize>,
}

/// Write the translated chunks back into `container`.
///
/// `translations` must hold one response per chunk, in chunk order.
pub fn reinsert(
    container: &mut ParsedContainer,
    segments: &[Segment],
    chunks: &[Chunk],
    translations: &[String],
    separator: &SeparatorToken,
) -> Result<ReinsertionSummary, TranslationError> {
    if translations.len() != chunks.len() {
        return Err(TranslationError::ReconstructionInvalid(format!(
            "{} translations for {} chunks",
            translations.len(),
            chunks.len()
        )));
    }

    let mut summary = ReinsertionSummary {
        outputs: segments.iter().map(|segment| segment.text.clone()).collect(),
        ..Default::default()
    };

    for (chunk, translated) in chunks.iter().zip(translations) {
        let parts = match split_translation(translated, chunk.len(), separator) {
            SplitOutcome::Strict(parts) => parts,
            SplitOutcome::Fuzzy(parts) => {
                debug!("Chunk {} split on an altered separator", chunk.index + 1);
                summary.fuzzy_chunks.push(chunk.index);
                parts
            }
            SplitOutcome::Fallback => {
                warn!(
                    "Chunk {}: separator did not survive translation, keeping {} segments untranslated",
                    chunk.index + 1,
                    chunk.len()
                );
                summary.degraded_chunks.push(chunk.index);
                continue;
            }
        };

        for (segment_id, part) in chunk.segment_ids.iter().zip(parts) {
            let segment = segments.get(*segment_id).ok_or_else(|| {
                TranslationError::ReconstructionInvalid(format!("chunk {} names unknown segment {}", chunk.index, segment_id))
            })?;
            container.replace_text(segment.origin, &segment.restore(&part));
            summary.outputs[*segment_id] = part.trim().to_string();
            summary.translated += 1;
        }
    }

    Ok(summary)
}
