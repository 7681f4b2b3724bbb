//! Cross-cutting, shared constants.
//!
//! Decision constants that are fixed by policy rather than configured per publisher live here.
//! Thresholds that vary per publisher/content type are constructor parameters on the
//! extractors instead.

use chrono::Duration;

/// Tolerance applied to both edges of a broadcast interval when checking containment.
pub const BROADCAST_TIME_FLEXIBILITY_MINUTES: i64 = 5;

/// Maximum distance from the top score for a candidate to join a multiple-candidate selection.
pub const MULTIPLE_CANDIDATE_SCORE_WINDOW: f64 = 0.3;

/// A lone positive music candidate must score strictly above this.
pub const MUSIC_SINGLE_CANDIDATE_THRESHOLD: f64 = 0.2;

/// With several positive music candidates, the top one must score strictly above this.
pub const MUSIC_MULTIPLE_CANDIDATE_THRESHOLD: f64 = 0.7;

/// Default worker bound for the per-publisher extraction stage.
pub const DEFAULT_EXTRACTION_CONCURRENCY: usize = 4;

/// Default worker bound across subjects in a batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Source name given to the combination of an empty source list.
pub const EMPTY_COMBINATION_SOURCE: &str = "empty combination";

/// Returns [`BROADCAST_TIME_FLEXIBILITY_MINUTES`] as a duration.
pub fn broadcast_time_flexibility() -> Duration {
    Duration::minutes(BROADCAST_TIME_FLEXIBILITY_MINUTES)
}
