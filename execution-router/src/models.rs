//! Data types shared across the routing, planning, and evolution modules.
//!
//! This module defines the structures that flow between components:
//!
//! 1. **Routing** - Execution modes, complexity analysis, routing decisions
//! 2. **Execution feedback** - Outcome summaries and scored feedback records
//! 3. **Learning** - Routing hints and improvement suggestions

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================================
// Routing Types
// ============================================================================

/// Execution strategy selected for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Answer directly from a knowledge document
    SkillOnly,

    /// Knowledge document plus a single specialist persona
    SkillAgent,

    /// Independent tasks executed by multiple personas at once
    Parallel,

    /// Sequential collaboration between multiple personas
    MultiAgent,
}

impl ExecutionMode {
    /// Stable string form used in persisted records and LLM replies
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::SkillOnly => "skill_only",
            ExecutionMode::SkillAgent => "skill_agent",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::MultiAgent => "multi_agent",
        }
    }

    /// Parse the string form; `None` for anything unrecognized
    pub fn parse(s: &str) -> Option<ExecutionMode> {
        match s {
            "skill_only" => Some(ExecutionMode::SkillOnly),
            "skill_agent" => Some(ExecutionMode::SkillAgent),
            "parallel" => Some(ExecutionMode::Parallel),
            "multi_agent" => Some(ExecutionMode::MultiAgent),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of structural complexity analysis for a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    /// Complexity score in [0.0, 1.0]
    pub score: f64,

    /// Three or more chained independent clauses detected
    pub is_parallel: bool,

    /// Collaboration keywords together with a design component
    pub is_collaborative: bool,

    /// Matched keyword count per indicator category
    pub indicators: BTreeMap<String, usize>,
}

impl ComplexityAnalysis {
    /// Whether any indicator category matched at all
    pub fn has_indicators(&self) -> bool {
        self.indicators.values().any(|&count| count > 0)
    }
}

/// Routing decision for a single query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected execution mode
    pub mode: ExecutionMode,

    /// Selected knowledge-document ids, best match first
    pub documents: Vec<String>,

    /// Selected persona ids in execution order
    pub personas: Vec<String>,

    /// Human-readable explanation of the choice
    pub reason: String,

    /// Routing confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Complexity analysis backing the decision, when one was run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityAnalysis>,
}

impl RoutingDecision {
    /// Build a decision, deduplicating documents and personas order-stably
    /// (first occurrence wins).
    pub fn new(
        mode: ExecutionMode,
        documents: Vec<String>,
        personas: Vec<String>,
        reason: String,
        confidence: f64,
        complexity: Option<ComplexityAnalysis>,
    ) -> Self {
        Self {
            mode,
            documents: dedup_stable(documents),
            personas: dedup_stable(personas),
            reason,
            confidence,
            complexity,
        }
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "Mode: {}, Documents: {:?}, Personas: {:?}, Confidence: {:.2}",
            self.mode, self.documents, self.personas, self.confidence
        )
    }
}

/// Remove duplicates while preserving first-occurrence order
pub fn dedup_stable(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// ============================================================================
// Execution Feedback Types
// ============================================================================

/// Summary of a completed execution, as handed back by the execution layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// The original query
    pub query: String,

    /// Execution mode that was used
    pub mode: ExecutionMode,

    /// Knowledge documents that were used
    pub documents_used: Vec<String>,

    /// Personas that were used
    pub personas_used: Vec<String>,
}

/// A single scored feedback entry; append-only once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// When the feedback was recorded
    pub timestamp: DateTime<Local>,

    /// The original query
    pub query: String,

    /// Execution mode that was rated
    pub mode: ExecutionMode,

    /// Documents involved in the rated execution
    pub documents: Vec<String>,

    /// Personas involved in the rated execution
    pub personas: Vec<String>,

    /// Free-form comment from the user
    pub comment: String,

    /// Rating from 1 (poor) to 5 (excellent)
    pub score: u8,
}

impl FeedbackRecord {
    /// Score of 4 or above counts as a success
    pub fn is_positive(&self) -> bool {
        self.score >= 4
    }

    /// Score of 2 or below flags the execution for review
    pub fn is_negative(&self) -> bool {
        self.score <= 2
    }
}

// ============================================================================
// Learning Types
// ============================================================================

/// Routing hint derived from learned patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingHint {
    /// Hint confidence in [0.0, 1.0]; 0.0 means "no usable hint"
    pub confidence: f64,

    /// Suggested knowledge documents
    pub documents: Vec<String>,

    /// Suggested execution mode, if the pattern recorded one
    pub mode: Option<ExecutionMode>,

    /// Suggested personas
    pub personas: Vec<String>,

    /// Key of the pattern that produced the hint
    pub matched_pattern: Option<String>,
}

impl RoutingHint {
    /// Hint carrying no suggestion at all
    pub fn empty() -> Self {
        Self {
            confidence: 0.0,
            documents: Vec::new(),
            mode: None,
            personas: Vec::new(),
            matched_pattern: None,
        }
    }
}

/// Structured review suggestion returned for low-scoring feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    /// The query whose execution scored low
    pub query: String,

    /// Documents that were involved
    pub documents: Vec<String>,

    /// The low score that triggered the suggestion
    pub score: u8,

    /// What the operator should do about it
    pub suggestion: String,
}
