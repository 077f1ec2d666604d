//! Pattern-learning gate and routing hint tests

use execution_router::evolution::EvolutionEngine;
use execution_router::models::ExecutionMode;

use super::common::outcome;

#[test]
fn test_four_successes_never_learn_a_pattern() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..4 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }

    assert!(engine.patterns().is_empty());
}

#[test]
fn test_fifth_success_materializes_the_pattern() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }

    let patterns = engine.patterns();
    assert_eq!(patterns.len(), 1);
    let pattern = &patterns[0];
    assert_eq!(pattern.pattern_key, "15-rag");
    assert_eq!(pattern.mode, ExecutionMode::SkillAgent);
    assert_eq!(pattern.sample_count, 5);
    assert!((pattern.success_rate - 1.0).abs() < 1e-9);
    assert!(pattern.keywords.contains("rag"));
}

#[test]
fn test_pattern_key_sorts_document_ids() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("학습 데이터 준비", &["15-rag", "03-fine-tuning"]), "", 5)
            .unwrap();
    }

    assert_eq!(engine.patterns()[0].pattern_key, "03-fine-tuning|15-rag");
}

#[test]
fn test_later_successes_merge_into_existing_pattern() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }
    engine
        .record_feedback(&outcome("rag 검색 인덱스 개선", &["15-rag"]), "", 4)
        .unwrap();

    let patterns = engine.patterns();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].sample_count, 6);
    // Keywords from the merged query join the set.
    assert!(patterns[0].keywords.contains("인덱스"));
}

#[test]
fn test_distinct_document_sets_learn_separately() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 질문", &["15-rag"]), "", 5)
            .unwrap();
        engine
            .record_feedback(&outcome("파인튜닝 질문", &["03-fine-tuning"]), "", 5)
            .unwrap();
    }

    assert_eq!(engine.patterns().len(), 2);
}

#[test]
fn test_low_scores_do_not_feed_learning() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..10 {
        engine
            .record_feedback(&outcome("rag 질문", &["15-rag"]), "", 3)
            .unwrap();
    }

    assert!(engine.patterns().is_empty());
}

#[test]
fn test_hint_for_similar_query() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }

    let hint = engine.get_routing_hints("rag 파이프라인 구축");
    assert!(hint.confidence > 0.8);
    assert!(hint.confidence <= 0.95);
    assert_eq!(hint.documents, vec!["15-rag".to_string()]);
    assert_eq!(hint.mode, Some(ExecutionMode::SkillAgent));
    assert_eq!(hint.matched_pattern.as_deref(), Some("15-rag"));
}

#[test]
fn test_hint_for_dissimilar_query_is_empty() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }

    let hint = engine.get_routing_hints("프론트엔드 화면 구성");
    assert_eq!(hint.confidence, 0.0);
    assert!(hint.documents.is_empty());
    assert_eq!(hint.mode, None);
}

#[test]
fn test_hint_confidence_is_capped() {
    let mut engine = EvolutionEngine::new();
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("짧은 질의", &["15-rag"]), "", 5)
            .unwrap();
    }

    // Identical keyword set: Jaccard 1.0 x success 1.0, scaled then capped.
    let hint = engine.get_routing_hints("짧은 질의");
    assert!((hint.confidence - 0.95).abs() < 1e-9);
}
