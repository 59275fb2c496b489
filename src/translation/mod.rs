/*!
 * Batch translation of confirmed transcript segments.
 *
 * Segments are packed into a single marker-delimited prompt per batch, sent
 * through a provider fallback chain, parsed back per segment and scored for
 * confidence.
 *
 * # Architecture
 *
 * - `prompts`: marker serialization and prompt construction
 * - `batch`: the batch engine with fallback, parsing and scoring
 */

pub mod batch;
pub mod prompts;

// Re-export main types
pub use batch::{BatchOutcome, BatchTranslationEngine, SegmentTranslation, SourceSegment};
