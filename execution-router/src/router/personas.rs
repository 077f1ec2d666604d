//! Persona selection rule tables.
//!
//! Every selection path is an ordered rule table evaluated top to bottom, so
//! precedence is explicit and each table can be tested in isolation.

/// Maximum personas for a parallel run
const MAX_PARALLEL_PERSONAS: usize = 4;

/// Fallback pool when fewer than two parallel rules match
const PARALLEL_FALLBACK: &[&str] = &["backend-developer", "qa-expert", "tech-writer"];

/// Domain-cue rules for parallel work; every matching rule contributes
const PARALLEL_RULES: &[(&str, &[&str])] = &[
    ("backend-developer", &["api", "backend", "서버", "데이터베이스"]),
    ("frontend-developer", &["ui", "frontend", "프론트"]),
    ("qa-expert", &["test", "테스트", "qa", "검증"]),
    ("tech-writer", &["문서", "doc", "documentation"]),
    ("devops-engineer", &["배포", "deploy", "ci/cd"]),
];

/// Ordered pair rules for sequential collaboration; first match wins
const COLLABORATION_RULES: &[(&[&str], &[&str])] = &[
    (&["설계", "검토"], &["system-architect", "security-reviewer"]),
    (&["구현", "테스트"], &["backend-developer", "qa-expert"]),
];

/// Default collaboration pair when no rule matches
const COLLABORATION_FALLBACK: &[&str] = &["system-architect", "backend-developer"];

/// Single-persona rules for focused work; first match wins
const PRIMARY_RULES: &[(&str, &[&str])] = &[
    ("backend-developer", &["api", "backend", "서버", "서빙"]),
    ("frontend-developer", &["ui", "frontend", "프론트"]),
    ("ml-engineer", &["ml", "ai", "모델", "학습"]),
];

/// Default single persona
const PRIMARY_FALLBACK: &str = "backend-developer";

/// Select up to four personas for independent parallel tasks
pub fn select_for_parallel(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();

    let mut personas: Vec<String> = PARALLEL_RULES
        .iter()
        .filter(|(_, cues)| cues.iter().any(|cue| query_lower.contains(cue)))
        .map(|(persona, _)| (*persona).to_string())
        .collect();

    if personas.len() < 2 {
        personas = PARALLEL_FALLBACK.iter().map(|p| (*p).to_string()).collect();
    }

    personas.truncate(MAX_PARALLEL_PERSONAS);
    personas
}

/// Select an ordered persona pair for sequential collaboration
pub fn select_for_collaboration(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();

    for (cues, personas) in COLLABORATION_RULES {
        if cues.iter().all(|cue| query_lower.contains(cue)) {
            return personas.iter().map(|p| (*p).to_string()).collect();
        }
    }

    COLLABORATION_FALLBACK
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

/// Select exactly one persona for a focused task
pub fn select_primary(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();

    for (persona, cues) in PRIMARY_RULES {
        if cues.iter().any(|cue| query_lower.contains(cue)) {
            return vec![(*persona).to_string()];
        }
    }

    vec![PRIMARY_FALLBACK.to_string()]
}
