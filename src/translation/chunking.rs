/*!
 * Chunking of segments into bounded translation requests.
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::document::Segment;

/// Default character budget of a chunk
pub const DEFAULT_MAX_CHARS: usize = 4500;

const BASE_MARKER: &str = "SEG";

/// Any separator marker, with whatever whitespace or case a provider introduced
static FUZZY_MARKER: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\s*<<\s*SEG(\d*)\s*>>\s*")
        .case_insensitive(true)
        .build()
        .expect("separator pattern")
});

/// The marker placed between segments of a chunk.
///
/// The marker is chosen per run so it never occurs in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorToken {
    token: String,
    joiner: String,
    suffix: String,
}

impl SeparatorToken {
    /// `<<SEG>>`, or `<<SEG1>>`, `<<SEG2>>`... when a segment already contains it
    pub fn choose(segments: &[Segment]) -> Self {
        let mut counter = 0usize;
        loop {
            let suffix = if counter == 0 { String::new() } else { counter.to_string() };
            let candidate = Self::with_suffix(suffix);
            if !segments.iter().any(|segment| segment.text.contains(&candidate.token)) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn with_suffix(suffix: String) -> Self {
        let token = format!("<<{}{}>>", BASE_MARKER, suffix);
        Self {
            joiner: format!("\n{}\n", token),
            token,
            suffix,
        }
    }

    /// The bare marker, e.g. `<<SEG>>`
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The marker with the line breaks used when joining segments
    pub fn joiner(&self) -> &str {
        &self.joiner
    }

    /// Split on the exact marker. `None` when the marker does not occur.
    pub fn split_strict<'t>(&self, text: &'t str) -> Option<Vec<&'t str>> {
        text.contains(&self.token)
            .then(|| text.split(self.token.as_str()).collect())
    }

    /// Split on variants of the marker with extra whitespace or changed case
    pub fn split_fuzzy<'t>(&self, text: &'t str) -> Option<Vec<&'t str>> {
        let mut parts = Vec::new();
        let mut last = 0;
        for captures in FUZZY_MARKER.captures_iter(text) {
            let (Some(whole), Some(suffix)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if suffix.as_str() != self.suffix {
                continue;
            }
            parts.push(&text[last..whole.start()]);
            last = whole.end();
        }
        if parts.is_empty() {
            return None;
        }
        parts.push(&text[last..]);
        Some(parts)
    }

    fn joiner_chars(&self) -> usize {
        self.joiner.chars().count()
    }
}

impl Default for SeparatorToken {
    fn default() -> Self {
        Self::with_suffix(String::new())
    }
}

/// A batch of consecutive segments sent in a single translation call
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position of the chunk in the run
    pub index: usize,
    /// Ids of the segments, in document order
    pub segment_ids: Vec<usize>,
    /// Segment texts joined with the separator
    pub combined_text: String,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.combined_text.chars().count()
    }
}

/// Group `segments` into chunks of at most `max_chars` characters.
///
/// A segment is never split. One that alone exceeds the budget becomes a chunk
/// of its own.
pub fn chunk(segments: &[Segment], max_chars: usize, separator: &SeparatorToken) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<&Segment> = Vec::new();
    let mut current_chars = 0usize;

    for segment in segments {
        let cost = if current.is_empty() {
            segment.char_len()
        } else {
            segment.char_len() + separator.joiner_chars()
        };
        if !current.is_empty() && current_chars + cost > max_chars {
            chunks.push(build_chunk(chunks.len(), &current, separator));
            current.clear();
            current_chars = segment.char_len();
        } else {
            current_chars += cost;
        }
        current.push(segment);
    }

    if !current.is_empty() {
        chunks.push(build_chunk(chunks.len(), &current, separator));
    }
    chunks
}

fn build_chunk(index: usize, segments: &[&Segment], separator: &SeparatorToken) -> Chunk {
    let combined_text = segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(separator.joiner());
    Chunk {
        index,
        segment_ids: segments.iter().map(|segment| segment.id).collect(),
        combined_text,
    }
}
