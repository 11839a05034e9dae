//! Annotation Graph Scenarios
//!
//! End-to-end construction, lookup, and persistence of annotation graphs.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use spangraph_core::prelude::*;
use spangraph_core::{SpanText, TransitionTable, NO_RELATION};
use spangraph_test_utils::capture_logs;
use std::sync::Arc;

fn label(begin: usize, end: usize, role: &str, text: &str) -> SpanLabel {
    SpanLabel::new(SpanText::new(Span::new(begin, end).unwrap(), text), role)
}

fn relation(source: (usize, usize, &str), target: (usize, usize, &str)) -> RawRelation {
    RawRelation::between(source, target).unwrap()
}

fn essay() -> Vec<SpanLabel> {
    vec![
        label(0, 20, "MajorClaim", "School uniforms help"),
        label(22, 40, "Claim", "They reduce bullying"),
        label(42, 60, "Premise", "Nobody sees brands"),
        label(62, 80, "Premise", "Mornings are faster"),
    ]
}

#[test]
fn test_matrix_cells_are_vector_instances() {
    let graph = AnnotationGraph::build(essay(), &[], &GraphConfig::default());

    for annotation in essay() {
        let id = graph.id_of(&annotation).unwrap();
        let span = annotation.span();
        let cell = graph
            .matrix()
            .get_value(span.begin(), span.end(), annotation.label())
            .unwrap();
        assert!(Arc::ptr_eq(cell, graph.annotation(id).unwrap()));
    }
}

#[test]
fn test_relation_round_trip() {
    let relations = vec![
        relation((22, 40, "Claim"), (0, 20, "MajorClaim")),
        relation((42, 60, "Premise"), (22, 40, "Claim")),
    ];
    let graph = AnnotationGraph::build(essay(), &relations, &GraphConfig::default());
    let [major, claim, premise, unrelated] = <[SpanLabel; 4]>::try_from(essay()).unwrap();

    assert_eq!(graph.relation_target_of(&claim).unwrap(), Some(&major));
    assert_eq!(graph.relation_target_of(&premise).unwrap(), Some(&claim));
    assert_eq!(graph.relation_target_of(&major).unwrap(), None);
    assert_eq!(graph.relation_target_of(&unrelated).unwrap(), None);
    assert_eq!(graph.relations().as_slice(), &[NO_RELATION, 0, 1, NO_RELATION]);
}

#[test]
fn test_overwrite_keeps_second_payload() {
    let first = label(0, 5, "Claim", "first");
    let second = label(0, 5, "Claim", "second");

    let (graph, stats) = AnnotationGraph::build_with_stats(
        vec![first.clone(), second.clone()],
        &[],
        &GraphConfig::default(),
    );

    assert_eq!(stats.cells_overwritten, 1);
    assert_eq!(graph.len(), 2);
    let labels = graph.labels_at(Span::new(0, 5).unwrap()).unwrap();
    assert_eq!(labels.get("Claim").map(AsRef::as_ref), Some(&second));
    assert!(graph.contains(&first));
    assert!(graph.is_coherent());
}

#[test]
fn test_overwrite_logs_warning() {
    let first = label(0, 5, "Claim", "first");
    let second = label(0, 5, "Claim", "second");

    let (graph, logs) =
        capture_logs(|| AnnotationGraph::build(vec![first, second], &[], &GraphConfig::default()));

    assert_eq!(graph.len(), 2);
    assert!(logs.contains("WARN"), "no warning in {logs:?}");
    assert!(logs.contains("overwriting"), "no overwrite warning in {logs:?}");
}

#[test]
fn test_duplicate_record_is_dropped() {
    let claim = label(0, 5, "Claim", "Cats!");
    let (graph, stats) = AnnotationGraph::build_with_stats(
        vec![claim.clone(), claim.clone()],
        &[],
        &GraphConfig::default(),
    );

    assert_eq!(graph.len(), 1);
    assert_eq!(stats.duplicates_dropped, 1);
    assert_eq!(graph.relations().len(), 1);
}

#[test]
fn test_unresolved_relation_is_skipped() {
    let relations = vec![
        relation((10, 20, "Premise"), (0, 20, "MajorClaim")),
        relation((22, 40, "Claim"), (0, 20, "MajorClaim")),
    ];
    let (graph, stats) = AnnotationGraph::build_with_stats(essay(), &relations, &GraphConfig::default());

    assert_eq!(stats.relations_skipped, 1);
    assert_eq!(stats.relations_resolved, 1);
    assert_eq!(graph.relation_target_by_id(1), Some(0));
    assert_eq!(graph.relations().pairs().count(), 1);
    assert_eq!(graph.relation_target_by_id(2), None);
}

#[test]
fn test_unresolved_relation_logs_error() {
    let relations = vec![relation((10, 20, "Premise"), (0, 20, "MajorClaim"))];
    let config = GraphConfig::default().with_parallel_relations(false);

    let ((graph, stats), logs) = capture_logs(|| AnnotationGraph::build_with_stats(essay(), &relations, &config));

    assert_eq!(stats.relations_skipped, 1);
    assert!(graph.relations().pairs().next().is_none());
    assert!(logs.contains("ERROR"), "no error in {logs:?}");
    assert!(logs.contains("skipping unresolvable relation"), "no diagnostic in {logs:?}");
    assert!(logs.contains("Premise [10, 20]"), "source not named in {logs:?}");
    assert!(!logs.contains("overwriting"));
}

#[test]
fn test_last_relation_for_a_source_wins() {
    let relations = vec![
        relation((42, 60, "Premise"), (22, 40, "Claim")),
        relation((42, 60, "Premise"), (0, 20, "MajorClaim")),
    ];
    let (graph, stats) = AnnotationGraph::build_with_stats(essay(), &relations, &GraphConfig::default());

    assert_eq!(graph.relation_target_by_id(2), Some(0));
    assert_eq!(stats.relation_slots_overwritten, 1);
}

#[test]
fn test_persisted_form_rebuilds_equal_graph() {
    let relations = vec![
        relation((22, 40, "Claim"), (0, 20, "MajorClaim")),
        relation((62, 80, "Premise"), (22, 40, "Claim")),
    ];
    let graph = AnnotationGraph::build(essay(), &relations, &GraphConfig::default());

    let json = serde_json::to_string(&graph).unwrap();
    assert!(json.starts_with(r#"{"spanAnnotations":[{"textSpan":"#));
    assert!(json.ends_with(r#""relations":[-1,0,-1,1]}"#));

    let restored: AnnotationGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, graph);
    assert_eq!(
        restored.relation_pairs().map(|(s, t)| (s.label(), t.label())).collect::<Vec<_>>(),
        vec![("Claim", "MajorClaim"), ("Premise", "Claim")]
    );
}

#[test]
fn test_incoming_relations() {
    let relations = vec![
        relation((42, 60, "Premise"), (22, 40, "Claim")),
        relation((62, 80, "Premise"), (22, 40, "Claim")),
    ];
    let graph = AnnotationGraph::build(essay(), &relations, &GraphConfig::default());
    let claim = graph.get(1).unwrap();

    let sources: Vec<_> = graph
        .sources_of(claim)
        .unwrap()
        .into_iter()
        .map(SpanLabel::covered_text)
        .collect();
    assert_eq!(sources, vec!["Nobody sees brands", "Mornings are faster"]);
}

#[test]
fn test_from_parts_rejects_dangling_target() {
    let result = AnnotationGraph::from_parts(essay(), TransitionTable::from_slots(vec![-1, 7, -1, -1]));
    assert_eq!(
        result.unwrap_err(),
        GraphError::InvalidRelationTarget {
            source_id: 1,
            target_id: 7
        }
    );
}

fn annotations_strategy() -> impl Strategy<Value = Vec<SpanLabel>> {
    proptest::collection::vec((0usize..40, 0usize..6, prop_oneof!["Claim", "Premise"]), 1..60).prop_map(
        |cells| {
            cells
                .into_iter()
                .map(|(begin, len, role)| label(begin, begin + len, &role, "x"))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn prop_parallel_build_matches_sequential(
        annotations in annotations_strategy(),
        picks in proptest::collection::vec((0usize..80, 0usize..80), 0..300),
    ) {
        let keys: Vec<SpanKey> = annotations.iter().map(LabelledSpan::key).collect();
        let mut relations: Vec<RawRelation> = picks
            .iter()
            .map(|&(s, t)| RawRelation::new(keys[s % keys.len()].clone(), keys[t % keys.len()].clone()))
            .collect();
        relations.push(relation((100, 101, "Claim"), (0, 1, "Claim")));

        let sequential = GraphConfig::default().with_parallel_relations(false);
        let parallel = GraphConfig::default().with_parallel_threshold(0);

        let (seq_graph, seq_stats) = AnnotationGraph::build_with_stats(annotations.clone(), &relations, &sequential);
        let (par_graph, par_stats) = AnnotationGraph::build_with_stats(annotations, &relations, &parallel);

        prop_assert_eq!(par_graph.relations(), seq_graph.relations());
        prop_assert_eq!(par_stats, seq_stats);
        prop_assert!(par_stats.relations_skipped >= 1);
    }

    #[test]
    fn prop_build_keeps_matrix_coherent(annotations in annotations_strategy()) {
        let graph = AnnotationGraph::build(annotations.clone(), &[], &GraphConfig::default());

        prop_assert!(graph.is_coherent());
        prop_assert_eq!(graph.relations().len(), graph.len());
        for annotation in &annotations {
            prop_assert!(graph.id_of(annotation).is_some());
        }
    }
}
