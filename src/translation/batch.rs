/*!
 * Batch translation processing.
 *
 * This module sends chunks to a text translator concurrently, retrying each
 * call with backoff, and hands the responses back in chunk order. The first
 * chunk that still fails after its retries aborts the whole batch.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::TextTranslator;

use super::chunking::Chunk;
use super::clock::Clock;
use super::retry::{RetryPolicy, retry_with_backoff};
use super::until_cancelled;

/// Batch translator for dispatching chunks to a text provider
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The provider to call
    translator: Arc<dyn TextTranslator>,

    /// Retry policy applied to every call
    policy: RetryPolicy,

    /// Time source for backoff sleeps
    clock: Arc<dyn Clock>,

    /// Maximum number of concurrent requests
    max_concurrent_requests: usize,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(
        translator: Arc<dyn TextTranslator>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            translator,
            policy,
            clock,
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Translate one chunk, retrying retryable failures
    async fn translate_chunk(
        &self,
        chunk: &Chunk,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let label = format!("{} chunk {}", self.translator.name(), chunk.index + 1);
        let input = std::slice::from_ref(&chunk.combined_text);

        let mut translations = retry_with_backoff(&self.policy, self.clock.as_ref(), &label, || {
            self.translator.translate(input, source_language, target_language)
        })
        .await?;

        if translations.len() != 1 {
            return Err(ProviderError::ParseError(format!(
                "expected 1 translation for {}, got {}",
                label,
                translations.len()
            )));
        }
        Ok(translations.remove(0))
    }

    /// Translate every chunk and return one response per chunk, in chunk order
    pub async fn translate_chunks(
        &self,
        chunks: &[Chunk],
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        let total_chunks = chunks.len();
        let start_time = Instant::now();

        let dispatch = stream::iter(chunks.iter())
            .map(|chunk| async move {
                debug!("Dispatching chunk {} of {} ({} chars)", chunk.index + 1, total_chunks, chunk.char_len());
                match self.translate_chunk(chunk, source_language, target_language).await {
                    Ok(text) => Ok((chunk.index, text)),
                    Err(e) => {
                        error!("Chunk {} failed: {}", chunk.index + 1, e);
                        Err(TranslationError::from(e))
                    }
                }
            })
            .boxed()
            .buffer_unordered(self.max_concurrent_requests)
            .try_collect::<Vec<_>>();

        let mut results = until_cancelled(cancel, dispatch)
            .await
            .ok_or(TranslationError::Cancelled)??;

        // Sort results by chunk index to maintain original order
        results.sort_by_key(|(index, _)| *index);

        debug!("Translated {} chunks in {:?}", total_chunks, start_time.elapsed());
        Ok(results.into_iter().map(|(_, text)| text).collect())
    }
}
