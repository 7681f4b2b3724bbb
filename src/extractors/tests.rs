use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;
use crate::content::{Broadcast, Content, ContentId, Publisher};
use crate::score::Score;
use crate::trace::{StageKind, TraceResult};

fn subject() -> Content {
    Content::item("subject", "bbc.co.uk")
}

fn scored(id: &str, score: f64) -> ScoredCandidate<Content> {
    ScoredCandidate::new(Content::item(id, "pa"), Score::value(score))
}

fn scored_null(id: &str) -> ScoredCandidate<Content> {
    ScoredCandidate::new(Content::item(id, "pa"), Score::Null)
}

fn list(scores: &[f64]) -> Vec<ScoredCandidate<Content>> {
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| scored(&format!("c{}", i), *s))
        .collect()
}

fn run<E: EquivalenceExtractor<Content>>(
    extractor: &E,
    candidates: &[ScoredCandidate<Content>],
) -> Vec<ScoredCandidate<Content>> {
    let mut trace = TraceResult::new();
    extractor.extract(candidates, &subject(), &mut trace)
}

fn ids(selected: &[ScoredCandidate<Content>]) -> Vec<&str> {
    selected.iter().map(|c| c.id().as_str()).collect()
}

fn all_strategies() -> Vec<SharedExtractor<Content>> {
    vec![
        Arc::new(TopExtractor),
        Arc::new(NothingExtractor),
        Arc::new(AllOverOrEqThreshold::new(1.0)),
        Arc::new(AllOverOrEqHighestMatchingThreshold::new([10.0, 4.0])),
        Arc::new(MultiStageAllOverOrEqThreshold::new([10.0, 4.0])),
        Arc::new(AllTiedAtTop::any_publisher(1.0)),
        Arc::new(AllTiedAtTop::subject_publisher(1.0)),
        Arc::new(MultipleCandidateExtractor::new()),
        Arc::new(MusicExtractor),
        Arc::new(PercentOfTotal::new(0.5)),
        Arc::new(PercentAboveNextBest::new(1.5)),
        Arc::new(ExcludePublisherThenExtract::<Content>::new(
            [Publisher::new("pa")],
            Arc::new(TopExtractor),
        )),
        Arc::new(RemoveAndCombine::<Content>::new(
            Arc::new(TopExtractor),
            Arc::new(TopExtractor),
        )),
        Arc::new(ContinueUntilOneWorks::<Content>::new(vec![Arc::new(TopExtractor)])),
    ]
}

#[test]
fn test_every_strategy_returns_empty_for_empty_input() {
    for extractor in all_strategies() {
        let mut trace = TraceResult::new();
        let selected = extractor.extract(&[], &subject(), &mut trace);
        assert!(selected.is_empty(), "{} selected from nothing", extractor.name());
    }
}

#[test]
fn test_every_invocation_records_a_component() {
    for extractor in all_strategies() {
        let mut trace = TraceResult::new();
        extractor.extract(&list(&[3.0, 1.0]), &subject(), &mut trace);
        assert!(
            trace
                .stage(StageKind::Extractor)
                .any(|c| c.name == extractor.name()),
            "{} left no trace",
            extractor.name()
        );
    }
}

#[test]
fn test_top_selects_exactly_the_first() {
    assert_eq!(ids(&run(&TopExtractor, &list(&[5.0, 5.0, 1.0]))), vec!["c0"]);
    let nulls = vec![scored_null("n")];
    assert_eq!(ids(&run(&TopExtractor, &nulls)), vec!["n"]);
}

#[test]
fn test_nothing_selects_nothing() {
    assert!(run(&NothingExtractor, &list(&[100.0])).is_empty());
}

#[test]
fn test_all_over_or_eq_threshold_is_inclusive() {
    let selected = run(&AllOverOrEqThreshold::new(2.0), &list(&[3.0, 2.0, 1.9]));
    assert_eq!(ids(&selected), vec!["c0", "c1"]);
}

#[test]
fn test_all_over_or_eq_threshold_skips_null() {
    let candidates = vec![scored("a", 1.0), scored_null("b")];
    let selected = run(&AllOverOrEqThreshold::new(f64::MIN), &candidates);
    assert_eq!(ids(&selected), vec!["a"]);
}

#[test]
fn test_highest_matching_threshold_falls_to_lower_threshold() {
    let extractor = AllOverOrEqHighestMatchingThreshold::new([4.0, 10.0]);
    assert_eq!(extractor.thresholds(), &[10.0, 4.0]);

    let selected = run(&extractor, &list(&[6.0, 4.0, 3.9]));
    assert_eq!(ids(&selected), vec!["c0", "c1"]);
}

#[test]
fn test_highest_matching_threshold_uses_top_threshold_when_reached() {
    let extractor = AllOverOrEqHighestMatchingThreshold::new([10.0, 4.0]);
    let selected = run(&extractor, &list(&[11.0, 6.0, 4.0]));
    assert_eq!(ids(&selected), vec!["c0"]);
}

#[test]
fn test_highest_matching_threshold_empty_when_nothing_reached() {
    let extractor = AllOverOrEqHighestMatchingThreshold::new([10.0, 4.0]);
    assert!(run(&extractor, &list(&[3.0, 2.0])).is_empty());
    assert!(run(&extractor, &[scored_null("n")]).is_empty());
}

#[test]
fn test_multi_stage_takes_first_non_empty_stage() {
    let extractor = MultiStageAllOverOrEqThreshold::new([5.0, 3.0, 1.0]);
    let selected = run(&extractor, &list(&[4.9, 4.0, 3.0, 1.0, 0.0]));
    assert_eq!(ids(&selected), vec!["c0", "c1", "c2"]);

    let selected = run(&extractor, &list(&[10.0, 5.0, 4.9]));
    assert_eq!(ids(&selected), vec!["c0", "c1"]);

    assert!(run(&extractor, &list(&[0.9, 0.0])).is_empty());
}

#[test]
fn test_tied_at_top_selects_genuine_tie() {
    let selected = run(&AllTiedAtTop::any_publisher(4.0), &list(&[5.0, 5.0, 5.0, 3.0, 1.0]));
    assert_eq!(ids(&selected), vec!["c0", "c1", "c2"]);
}

#[test]
fn test_tied_at_top_rejects_single_top() {
    assert!(run(&AllTiedAtTop::any_publisher(4.0), &list(&[5.0, 3.0, 1.0])).is_empty());
}

#[test]
fn test_tied_at_top_requires_threshold() {
    assert!(run(&AllTiedAtTop::any_publisher(6.0), &list(&[5.0, 5.0])).is_empty());
    let nulls = vec![scored_null("a"), scored_null("b")];
    assert!(run(&AllTiedAtTop::any_publisher(f64::MIN), &nulls).is_empty());
}

#[test]
fn test_tied_at_top_subject_publisher_scope() {
    let subject = Content::item("subject", "amazon");
    let candidates = vec![
        ScoredCandidate::new(Content::item("other", "pa"), Score::value(5.0)),
        ScoredCandidate::new(Content::item("amz-1", "amazon"), Score::value(3.0)),
        ScoredCandidate::new(Content::item("pa-tie", "pa"), Score::value(3.0)),
        ScoredCandidate::new(Content::item("amz-2", "amazon"), Score::value(3.0)),
        ScoredCandidate::new(Content::item("amz-3", "amazon"), Score::value(2.0)),
    ];
    let mut trace = TraceResult::new();
    let selected =
        AllTiedAtTop::subject_publisher(2.0).extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["amz-1", "amz-2"]);

    let mut trace = TraceResult::new();
    let selected =
        AllTiedAtTop::subject_publisher(3.5).extract(&candidates, &subject, &mut trace);
    assert!(selected.is_empty());
}

#[test]
fn test_tied_at_top_subject_publisher_accepts_lone_high_score() {
    let subject = Content::item("subject", "amazon");
    let candidates = vec![
        ScoredCandidate::new(Content::item("amz-1", "amazon"), Score::value(3.0)),
        ScoredCandidate::new(Content::item("amz-2", "amazon"), Score::value(2.0)),
    ];
    let mut trace = TraceResult::new();
    let selected =
        AllTiedAtTop::subject_publisher(2.0).extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["amz-1"]);
}

#[test]
fn test_tied_at_top_subject_publisher_without_match() {
    let mut trace = TraceResult::new();
    let selected = AllTiedAtTop::subject_publisher(0.0).extract(
        &list(&[5.0, 5.0]),
        &subject(),
        &mut trace,
    );
    assert!(selected.is_empty());
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn slot(start: DateTime<Utc>, minutes: i64) -> Broadcast {
    Broadcast::new(start, start + Duration::minutes(minutes))
}

fn broadcast_item(id: &str, broadcast: Broadcast) -> Content {
    Content::item(id, "pa").with_broadcast(broadcast)
}

#[test]
fn test_multiple_candidate_groups_close_scores_in_same_slot() {
    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 0), 60));
    let candidates = vec![
        ScoredCandidate::new(broadcast_item("a", slot(at(20, 0), 30)), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("b", slot(at(20, 30), 30)), Score::value(2.8)),
        ScoredCandidate::new(broadcast_item("far", slot(at(22, 0), 30)), Score::value(2.9)),
        ScoredCandidate::new(broadcast_item("low", slot(at(20, 0), 30)), Score::value(2.5)),
    ];
    let mut trace = TraceResult::new();
    let selected = MultipleCandidateExtractor::new().extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["a", "b"]);
}

#[test]
fn test_multiple_candidate_tolerates_five_minutes_either_side() {
    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 0), 60));
    let early = Broadcast::new(at(19, 56), at(21, 4));
    let too_early = Broadcast::new(at(19, 55), at(20, 30));
    let candidates = vec![
        ScoredCandidate::new(broadcast_item("top", slot(at(20, 0), 60)), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("early", early), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("too-early", too_early), Score::value(3.0)),
    ];
    let mut trace = TraceResult::new();
    let selected = MultipleCandidateExtractor::new().extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["top", "early"]);
}

#[test]
fn test_multiple_candidate_matches_when_candidate_contains_subject() {
    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 15), 15));
    let candidates = vec![
        ScoredCandidate::new(broadcast_item("top", slot(at(20, 0), 60)), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("wide", slot(at(20, 0), 60)), Score::value(2.9)),
    ];
    let mut trace = TraceResult::new();
    let selected = MultipleCandidateExtractor::new().extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["top", "wide"]);
}

#[test]
fn test_multiple_candidate_requires_more_than_top() {
    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 0), 60));
    let candidates = vec![
        ScoredCandidate::new(broadcast_item("top", slot(at(20, 0), 60)), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("gap", slot(at(20, 0), 60)), Score::value(2.5)),
    ];
    let mut trace = TraceResult::new();
    let selected = MultipleCandidateExtractor::new().extract(&candidates, &subject, &mut trace);
    assert!(selected.is_empty());
    assert_eq!(trace.len(), 1);

    // The kept set is still recorded, so the trail shows the lone top candidate.
    let kept: Vec<&str> = trace.components()[0]
        .entries
        .iter()
        .map(|e| e.candidate.as_str())
        .collect();
    assert_eq!(kept, vec!["top"]);
}

#[test]
fn test_multiple_candidate_score_window_is_strict() {
    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 0), 60));
    let candidates = vec![
        ScoredCandidate::new(broadcast_item("top", slot(at(20, 0), 60)), Score::value(1.0)),
        ScoredCandidate::new(broadcast_item("near", slot(at(20, 0), 60)), Score::value(0.75)),
        ScoredCandidate::new(broadcast_item("outside", slot(at(20, 0), 60)), Score::value(0.625)),
    ];
    let mut trace = TraceResult::new();
    let selected = MultipleCandidateExtractor::new().extract(&candidates, &subject, &mut trace);
    assert_eq!(ids(&selected), vec!["top", "near"]);
}

#[test]
fn test_multiple_candidate_ignores_containers() {
    let brand_subject = Content::brand("subject", "bbc.co.uk");
    let candidates = list(&[3.0, 3.0]);
    let mut trace = TraceResult::new();
    assert!(
        MultipleCandidateExtractor::new()
            .extract(&candidates, &brand_subject, &mut trace)
            .is_empty()
    );

    let subject = Content::item("subject", "bbc.co.uk").with_broadcast(slot(at(20, 0), 60));
    let candidates = vec![
        ScoredCandidate::new(Content::brand("brand", "pa"), Score::value(3.0)),
        ScoredCandidate::new(broadcast_item("a", slot(at(20, 0), 60)), Score::value(3.0)),
    ];
    assert!(
        MultipleCandidateExtractor::new()
            .extract(&candidates, &subject, &mut trace)
            .is_empty()
    );
}

#[test]
fn test_music_single_candidate_threshold() {
    assert_eq!(ids(&run(&MusicExtractor, &list(&[0.25, 0.0, -1.0]))), vec!["c0"]);
    assert!(run(&MusicExtractor, &list(&[0.2])).is_empty());
}

#[test]
fn test_music_multiple_candidates_need_strong_top() {
    assert_eq!(ids(&run(&MusicExtractor, &list(&[0.8, 0.5]))), vec!["c0"]);
    assert!(run(&MusicExtractor, &list(&[0.7, 0.5])).is_empty());
}

#[test]
fn test_music_drops_non_positive_and_null() {
    let candidates = vec![scored_null("n"), scored("z", 0.0)];
    assert!(run(&MusicExtractor, &candidates).is_empty());
}

#[test]
fn test_percent_of_total_is_strict() {
    assert_eq!(ids(&run(&PercentOfTotal::new(0.5), &list(&[6.0, 3.0, 1.0]))), vec!["c0"]);
    assert!(run(&PercentOfTotal::new(0.6), &list(&[6.0, 3.0, 1.0])).is_empty());
}

#[test]
fn test_percent_of_total_ignores_negative_scores() {
    assert_eq!(
        ids(&run(&PercentOfTotal::new(0.9), &list(&[6.0, -3.0]))),
        vec!["c0"]
    );
}

#[test]
fn test_percent_of_total_rejects_null_top_and_zero_total() {
    assert!(run(&PercentOfTotal::new(0.0), &[scored_null("n")]).is_empty());
    assert!(run(&PercentOfTotal::new(0.0), &list(&[0.0, 0.0])).is_empty());
}

#[test]
fn test_percent_above_next_best() {
    let extractor = PercentAboveNextBest::new(3.0);
    assert_eq!(ids(&run(&extractor, &list(&[8.0, 2.0]))), vec!["c0"]);
    assert!(run(&extractor, &list(&[8.0, 4.0])).is_empty());
    assert_eq!(ids(&run(&extractor, &list(&[0.1]))), vec!["c0"]);
}

#[test]
fn test_percent_above_next_best_null_handling() {
    let extractor = PercentAboveNextBest::new(3.0);
    let null_top = vec![scored_null("a"), scored_null("b")];
    assert!(run(&extractor, &null_top).is_empty());

    let null_second = vec![scored("a", 1.0), scored_null("b")];
    assert_eq!(ids(&run(&extractor, &null_second)), vec!["a"]);

    let single_null = vec![scored_null("a")];
    assert_eq!(ids(&run(&extractor, &single_null)), vec!["a"]);
}

#[test]
fn test_exclude_publisher_then_delegate() {
    let candidates = vec![
        ScoredCandidate::new(Content::item("barb", "barb"), Score::value(9.0)),
        ScoredCandidate::new(Content::item("pa", "pa"), Score::value(5.0)),
        ScoredCandidate::new(Content::item("pa-low", "pa"), Score::value(1.0)),
    ];
    let extractor = ExcludePublisherThenExtract::<Content>::new(
        [Publisher::new("barb")],
        Arc::new(AllOverOrEqThreshold::new(4.0)),
    );
    assert_eq!(ids(&run(&extractor, &candidates)), vec!["pa"]);
    assert!(extractor.excluded().contains(&Publisher::new("barb")));
}

#[test]
fn test_remove_and_combine_unions_both_selections() {
    let extractor = RemoveAndCombine::<Content>::new(
        Arc::new(AllTiedAtTop::any_publisher(2.0)),
        Arc::new(PercentAboveNextBest::new(1.5)),
    );
    let selected = run(&extractor, &list(&[5.0, 5.0, 3.0, 1.0]));
    assert_eq!(ids(&selected), vec!["c0", "c1", "c2"]);
}

#[test]
fn test_remove_and_combine_second_sees_remainder_only() {
    let extractor = RemoveAndCombine::<Content>::new(Arc::new(TopExtractor), Arc::new(TopExtractor));
    let selected = run(&extractor, &list(&[5.0, 4.0, 3.0]));
    assert_eq!(ids(&selected), vec!["c0", "c1"]);
}

#[test]
fn test_continue_until_one_works_short_circuits() {
    let fallback = ContinueUntilOneWorks::<Content>::new(vec![
        Arc::new(NothingExtractor),
        Arc::new(TopExtractor),
    ]);
    assert_eq!(ids(&run(&fallback, &list(&[2.0, 1.0]))), vec!["c0"]);

    let first_wins = ContinueUntilOneWorks::<Content>::new(vec![
        Arc::new(TopExtractor),
        Arc::new(AllOverOrEqThreshold::new(0.0)),
    ]);
    let mut trace = TraceResult::new();
    let selected = first_wins.extract(&list(&[2.0, 1.0]), &subject(), &mut trace);
    assert_eq!(ids(&selected), vec!["c0"]);
    assert!(!trace.components().iter().any(|c| c.name.starts_with("All over")));
}

#[test]
fn test_continue_until_one_works_all_empty() {
    let extractor = ContinueUntilOneWorks::<Content>::new(vec![
        Arc::new(AllOverOrEqThreshold::new(2.9)),
        Arc::new(AllOverOrEqThreshold::new(0.9)),
    ]);
    assert!(run(&extractor, &list(&[0.5])).is_empty());
    assert_eq!(ids(&run(&extractor, &list(&[1.0]))), vec!["c0"]);
}

#[test]
fn test_extractor_config_builds_nested_chain() {
    let config: ExtractorConfig = toml::from_str(
        r#"
        type = "remove_and_combine"
        first = { type = "all_tied_at_top", threshold = 2.0, scope = "subject_publisher" }
        second = { type = "percent_above_next_best", multiplier = 1.5 }
        "#,
    )
    .expect("config should parse");

    let extractor = config.build::<Content>().expect("config should build");
    assert!(extractor.name().starts_with("Remove All tied at top with subject publisher"));
}

#[test]
fn test_extractor_config_rejects_invalid_parameters() {
    let empty_chain = ExtractorConfig::ContinueUntilOneWorks { delegates: vec![] };
    assert!(empty_chain.build::<Content>().is_err());

    let empty_set = ExtractorConfig::AllOverOrEqHighestMatchingThreshold { thresholds: vec![] };
    assert!(empty_set.build::<Content>().is_err());

    let nan = ExtractorConfig::AllOverOrEqThreshold { threshold: f64::NAN };
    assert!(nan.build::<Content>().is_err());

    let nested = ExtractorConfig::ExcludePublisher {
        publishers: vec![Publisher::new("barb")],
        delegate: Box::new(ExtractorConfig::PercentOfTotal {
            threshold: f64::INFINITY,
        }),
    };
    assert!(nested.build::<Content>().is_err());
}

#[test]
fn test_selection_is_deterministic() {
    let candidates = list(&[5.0, 5.0, 4.0, 1.0]);
    for extractor in all_strategies() {
        let mut first = TraceResult::new();
        let mut second = TraceResult::new();
        let a = extractor.extract(&candidates, &subject(), &mut first);
        let b = extractor.extract(&candidates, &subject(), &mut second);
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(first, second);
    }
}

#[test]
fn test_selected_candidates_keep_identity() {
    let selected = run(&TopExtractor, &list(&[1.0]));
    assert_eq!(selected[0].id(), &ContentId::new("c0"));
}
