//! Structural complexity analysis for incoming queries.
//!
//! Pure and deterministic: the same query always produces the same
//! [`ComplexityAnalysis`], and analysis never fails.

use std::collections::BTreeMap;

use regex::Regex;

use crate::models::ComplexityAnalysis;

/// Keyword sets per indicator category, in evaluation order
const COMPLEXITY_INDICATORS: &[(&str, &[&str])] = &[
    (
        "implementation",
        &["구현", "implement", "만들어", "작성", "build", "create", "개발", "develop", "코드"],
    ),
    ("parallel", &["그리고", "하고", "and", "또한", "동시에", "병렬로"]),
    (
        "collaboration",
        &["검토", "review", "확인", "validate", "후에", "다음에", "then"],
    ),
    ("design", &["설계", "design", "아키텍처", "architecture", "구조"]),
];

/// Patterns that mark a query as a plain "what is X" question
const SIMPLE_PATTERNS: &[&str] = &[
    r"뭐야\??$",
    r"뭔가요\??$",
    r"what is",
    r"알려줘$",
    r"설명해줘$",
    r"explain",
    r"tell me",
];

/// Connectives that chain independent clauses
const PARALLEL_CONNECTIVES: &[&str] = &["하고", "그리고", " and "];

/// Per-keyword score contribution within a category
const CATEGORY_WEIGHT: f64 = 0.15;

/// Flat bonus when any implementation keyword is present
const IMPLEMENTATION_BONUS: f64 = 0.2;

/// Bonus for detected parallel or collaborative structure
const STRUCTURE_BONUS: f64 = 0.3;

/// Ceiling for simple questions without parallel/collaborative structure
const SIMPLE_CEILING: f64 = 0.25;

/// Scores query complexity and detects parallel/collaborative intent
pub struct ComplexityAnalyzer {
    simple_patterns: Vec<Regex>,
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self {
            simple_patterns: SIMPLE_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("static regex"))
                .collect(),
        }
    }

    /// Analyze a query. Pure function of the input string.
    pub fn analyze(&self, query: &str) -> ComplexityAnalysis {
        let query_lower = query.to_lowercase();

        let is_simple = self
            .simple_patterns
            .iter()
            .any(|pattern| pattern.is_match(&query_lower));

        // Count keywords present per category; each one adds to the score.
        let mut indicators = BTreeMap::new();
        let mut score = 0.0;
        for (category, keywords) in COMPLEXITY_INDICATORS {
            let count = keywords
                .iter()
                .filter(|kw| query_lower.contains(*kw))
                .count();
            indicators.insert((*category).to_string(), count);
            score += count as f64 * CATEGORY_WEIGHT;
        }

        // Connective occurrences, not distinct keywords: two connectives
        // chain three clauses, which is the parallel threshold.
        let parallel_count: usize = PARALLEL_CONNECTIVES
            .iter()
            .map(|conn| query_lower.matches(conn).count())
            .sum();
        let is_parallel = parallel_count >= 2;

        // Review without a design component is not collaboration.
        let is_collaborative =
            indicators["collaboration"] >= 1 && indicators["design"] > 0;

        if indicators["implementation"] > 0 {
            score += IMPLEMENTATION_BONUS;
        }
        if is_parallel {
            score += STRUCTURE_BONUS;
        }
        if is_collaborative {
            score += STRUCTURE_BONUS;
        }

        if is_simple && !is_parallel && !is_collaborative {
            score = score.min(SIMPLE_CEILING);
        }

        ComplexityAnalysis {
            score: score.min(1.0),
            is_parallel,
            is_collaborative,
            indicators,
        }
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
