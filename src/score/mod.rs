//! Scores and scored candidates.

pub mod candidates;
pub mod types;


pub use candidates::{ScoredCandidate, ScoredCandidates, sort_descending};
pub use types::Score;
