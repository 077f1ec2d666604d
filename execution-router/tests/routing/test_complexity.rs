//! Complexity analyzer scenario tests

use execution_router::router::ComplexityAnalyzer;

#[test]
fn test_what_is_question_scores_low() {
    let analyzer = ComplexityAnalyzer::new();
    let analysis = analyzer.analyze("LoRA가 뭐야?");

    assert!(analysis.score <= 0.25);
    assert!(!analysis.is_parallel);
    assert!(!analysis.is_collaborative);
}

#[test]
fn test_english_what_is_question_scores_low() {
    let analyzer = ComplexityAnalyzer::new();
    let analysis = analyzer.analyze("what is quantization?");

    assert!(analysis.score <= 0.25);
}

#[test]
fn test_three_chained_tasks_are_parallel() {
    let analyzer = ComplexityAnalyzer::new();
    let analysis = analyzer.analyze("API 만들어 하고 테스트 작성 하고 문서화도 해");

    assert!(analysis.is_parallel);
    assert!(!analysis.is_collaborative);
}

#[test]
fn test_design_plus_review_is_collaborative() {
    let analyzer = ComplexityAnalyzer::new();
    let analysis = analyzer.analyze("시스템 설계하고 보안 검토해줘");

    assert!(analysis.is_collaborative);
    assert!(!analysis.is_parallel);
    assert!(analysis.indicators["design"] > 0);
    assert!(analysis.indicators["collaboration"] > 0);
}

#[test]
fn test_analysis_is_byte_for_byte_deterministic() {
    let analyzer = ComplexityAnalyzer::new();
    let query = "분산학습 구성하고 평가 벤치마크 돌려줘";

    let first = serde_json::to_string(&analyzer.analyze(query)).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(query)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_score_always_in_unit_interval() {
    let analyzer = ComplexityAnalyzer::new();
    for query in [
        "",
        "간단한 질문",
        "구현 build create 개발 그리고 하고 and 설계 검토 아키텍처 동시에 병렬로",
        "what is x",
    ] {
        let analysis = analyzer.analyze(query);
        assert!((0.0..=1.0).contains(&analysis.score), "query: {query}");
    }
}
