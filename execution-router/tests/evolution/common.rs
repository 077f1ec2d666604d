//! Common test utilities for evolution tests

use execution_router::models::{ExecutionMode, ExecutionOutcome};

/// Outcome for a skill-agent execution over the given documents
pub fn outcome(query: &str, documents: &[&str]) -> ExecutionOutcome {
    ExecutionOutcome {
        query: query.to_string(),
        mode: ExecutionMode::SkillAgent,
        documents_used: documents.iter().map(|d| d.to_string()).collect(),
        personas_used: vec!["backend-developer".to_string()],
    }
}
