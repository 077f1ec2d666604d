//! Keyword matcher ranking and determinism tests

use execution_router::router::KeywordMatcher;

#[test]
fn test_korean_query_matches_document() {
    let matcher = KeywordMatcher::new();
    let ids = matcher.match_ids("파인튜닝 어떻게 해?", 3);
    assert_eq!(ids.first().map(String::as_str), Some("03-fine-tuning"));
}

#[test]
fn test_english_query_matches_document() {
    let matcher = KeywordMatcher::new();
    let ids = matcher.match_ids("set up rag with vector embeddings", 3);
    assert_eq!(ids.first().map(String::as_str), Some("15-rag"));
}

#[test]
fn test_scores_are_descending() {
    let matcher = KeywordMatcher::new();
    let results = matcher.matches("vllm 추론 서빙 배포", 5);
    assert!(!results.is_empty());
    for pair in results.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
}

#[test]
fn test_unrelated_query_matches_nothing() {
    let matcher = KeywordMatcher::new();
    assert!(matcher.matches("오늘 저녁 메뉴 추천", 3).is_empty());
}

#[test]
fn test_output_is_byte_for_byte_deterministic() {
    let matcher = KeywordMatcher::new();
    let first = serde_json::to_string(&matcher.matches("모델 양자화 경량화", 5)).unwrap();
    let second = serde_json::to_string(&matcher.matches("모델 양자화 경량화", 5)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_keywords_accessors() {
    let matcher = KeywordMatcher::new();
    let keywords = matcher.keywords_for("15-rag").unwrap();
    assert!(keywords.iter().any(|k| k == "rag"));

    assert!(matcher.keywords_for("99-unknown").is_none());
    assert_eq!(matcher.table().len(), 20);
}
