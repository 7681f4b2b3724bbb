use crate::constants::{MUSIC_MULTIPLE_CANDIDATE_THRESHOLD, MUSIC_SINGLE_CANDIDATE_THRESHOLD};
use crate::content::EquivalenceContent;
use crate::score::ScoredCandidate;
use crate::trace::TraceResult;

use super::{EquivalenceExtractor, recorded};

const NAME: &str = "Music";

/// Music track selection: a lone positive candidate needs a modest score, the top of several
/// positive candidates needs a much stronger one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicExtractor;

impl MusicExtractor {
    fn select<T: EquivalenceContent>(
        candidates: &[ScoredCandidate<T>],
    ) -> Option<ScoredCandidate<T>> {
        let positive: Vec<&ScoredCandidate<T>> =
            candidates.iter().filter(|c| c.score.above(0.0)).collect();

        match positive.as_slice() {
            [] => None,
            [only] => only
                .score
                .above(MUSIC_SINGLE_CANDIDATE_THRESHOLD)
                .then(|| (*only).clone()),
            [top, ..] => top
                .score
                .above(MUSIC_MULTIPLE_CANDIDATE_THRESHOLD)
                .then(|| (*top).clone()),
        }
    }
}

impl<T: EquivalenceContent> EquivalenceExtractor<T> for MusicExtractor {
    fn name(&self) -> &str {
        NAME
    }

    fn extract(
        &self,
        candidates: &[ScoredCandidate<T>],
        _subject: &T,
        trace: &mut TraceResult,
    ) -> Vec<ScoredCandidate<T>> {
        let selected = Self::select(candidates).into_iter().collect();
        recorded(trace, NAME, selected)
    }
}
