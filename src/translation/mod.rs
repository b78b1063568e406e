/*!
 * Structure-preserving translation pipeline.
 *
 * The stages, in the order a run goes through them:
 *
 * - `extraction`: parse a container and list its translatable segments
 * - `chunking`: group segments into bounded requests joined by a separator
 * - `batch`: send chunks to a text provider concurrently
 * - `native`: submit a whole document and poll the provider's job
 * - `reinsertion`: split translated chunks and write them back into the tree
 * - `pipeline`: runs the stages and validates the result
 *
 * `retry` and `clock` are shared by every network call.
 */

use std::future::Future;

use tokio_util::sync::CancellationToken;

// Re-export main types for easier usage
pub use self::batch::BatchTranslator;
pub use self::chunking::{Chunk, SeparatorToken};
pub use self::clock::{Clock, SystemClock, VirtualClock};
pub use self::extraction::{Extraction, extract};
pub use self::native::{JobPoller, JobState, TranslationJob};
pub use self::pipeline::{
    DocumentPipeline, PipelineOptions, ReportError, TranslationBackend, TranslationOutcome, TranslationReport, Warning,
};
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod chunking;
pub mod clock;
pub mod extraction;
pub mod native;
pub mod pipeline;
pub mod reinsertion;
pub mod retry;

/// Run `fut` unless `cancel` fires first; `None` means cancelled
pub(crate) async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
