/*!
 * Validation of translated documents.
 *
 * - `container`: structural checks of reconstructed and provider-returned
 *   containers (mandatory archive parts, balanced XML, element counts,
 *   HTML element sequence, plain-text line count)
 */

pub mod container;

// Re-export main types
pub use container::{ContainerValidator, StructureProfile};
