//! Hybrid routing engine.
//!
//! Keyword matching decides first, for free; an external LLM router is only
//! consulted when confidence is low. The decision path is an explicit chain
//! of strategies tried in order:
//!
//! 1. `try_learned_pattern` - a high-confidence hint from the evolution
//!    engine short-circuits everything else
//! 2. the keyword/complexity decision - always applicable
//! 3. `try_llm_fallback` - replaces the decision when keyword confidence is
//!    low and a collaborator is wired in
//!
//! Each strategy returns "not applicable" instead of failing, so `route`
//! never errors for a normal query.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::evolution::EvolutionEngine;
use crate::models::{ComplexityAnalysis, ExecutionMode, RoutingDecision};
use crate::router::complexity::ComplexityAnalyzer;
use crate::router::keyword_matcher::KeywordMatcher;
use crate::router::personas;
use crate::stores::{DocumentStore, LlmRouteReply, LlmRouter};

/// Below this confidence the LLM fallback is consulted
const LLM_ROUTING_THRESHOLD: f64 = 0.5;

/// Fixed trust level for a successfully parsed LLM decision
const LLM_DECISION_CONFIDENCE: f64 = 0.8;

/// A learned-pattern hint must exceed this to short-circuit routing
const HINT_SHORT_CIRCUIT_CONFIDENCE: f64 = 0.8;

/// Complexity score at which a single specialist persona is attached
const SKILL_AGENT_THRESHOLD: f64 = 0.3;

/// Documents requested from the matcher and the store fallback
const MAX_DOCUMENT_MATCHES: usize = 3;

/// Hybrid router: keyword matching first, LLM fallback on low confidence
pub struct HybridRouter {
    analyzer: ComplexityAnalyzer,
    matcher: KeywordMatcher,
    documents: Arc<dyn DocumentStore>,
    llm: Option<Arc<dyn LlmRouter>>,
    evolution: Option<Arc<RwLock<EvolutionEngine>>>,
}

impl HybridRouter {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            analyzer: ComplexityAnalyzer::new(),
            matcher: KeywordMatcher::new(),
            documents,
            llm: None,
            evolution: None,
        }
    }

    /// Use a caller-supplied keyword matcher instead of the built-in table
    pub fn with_matcher(mut self, matcher: KeywordMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Wire in the LLM routing collaborator
    pub fn with_llm(mut self, llm: Arc<dyn LlmRouter>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Wire in the evolution engine for learned-pattern shortcuts.
    ///
    /// The router only ever takes read locks and never holds one across an
    /// await; feedback writes stay with the session owner.
    pub fn with_evolution(mut self, evolution: Arc<RwLock<EvolutionEngine>>) -> Self {
        self.evolution = Some(evolution);
        self
    }

    /// Route a query to an execution mode, documents, and personas.
    ///
    /// Never fails: an absent collaborator or an unparseable LLM reply only
    /// disables the corresponding fallback step.
    pub async fn route(&self, query: &str) -> RoutingDecision {
        if let Some(decision) = self.try_learned_pattern(query) {
            return decision;
        }

        let complexity = self.analyzer.analyze(query);

        let mut documents = self.matcher.match_ids(query, MAX_DOCUMENT_MATCHES);
        if documents.is_empty() {
            documents = self
                .documents
                .search(query, MAX_DOCUMENT_MATCHES)
                .await
                .into_iter()
                .map(|hit| hit.id)
                .collect();
        }

        let (mode, personas, reason) = decide_mode(query, &complexity);
        let confidence = calculate_confidence(&documents, &complexity);

        if confidence < LLM_ROUTING_THRESHOLD {
            info!(confidence, "Low routing confidence, trying LLM fallback");
            if let Some(decision) = self
                .try_llm_fallback(query, &documents, &personas, &complexity)
                .await
            {
                return decision;
            }
        }

        RoutingDecision::new(mode, documents, personas, reason, confidence, Some(complexity))
    }

    /// Strategy 1: a sufficiently confident learned pattern wins outright
    fn try_learned_pattern(&self, query: &str) -> Option<RoutingDecision> {
        let evolution = self.evolution.as_ref()?;
        let hint = evolution.read().ok()?.get_routing_hints(query);

        if hint.confidence <= HINT_SHORT_CIRCUIT_CONFIDENCE {
            return None;
        }

        debug!(
            pattern = hint.matched_pattern.as_deref().unwrap_or("?"),
            confidence = hint.confidence,
            "Routing via learned pattern"
        );

        Some(RoutingDecision::new(
            hint.mode.unwrap_or(ExecutionMode::SkillOnly),
            hint.documents,
            hint.personas,
            format!("Learned pattern match (confidence: {:.2})", hint.confidence),
            hint.confidence,
            None,
        ))
    }

    /// Strategy 3: replace the keyword decision with a parsed LLM decision
    async fn try_llm_fallback(
        &self,
        query: &str,
        keyword_documents: &[String],
        keyword_personas: &[String],
        complexity: &ComplexityAnalysis,
    ) -> Option<RoutingDecision> {
        let llm = self.llm.as_ref()?;
        let index = self.documents.compressed_index();

        let response = match llm.route(query, &index).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "LLM routing call failed, keeping keyword decision");
                return None;
            }
        };

        let reply = match LlmRouteReply::from_response_text(&response) {
            Some(reply) => reply,
            None => {
                warn!("LLM routing reply unparseable, keeping keyword decision");
                return None;
            }
        };

        // An unknown mode string means the reply cannot be trusted at all.
        let mode = match reply.mode() {
            Some(mode) => mode,
            None => {
                warn!(mode = %reply.mode, "LLM proposed unknown mode, keeping keyword decision");
                return None;
            }
        };

        let documents = if reply.documents.is_empty() {
            keyword_documents.to_vec()
        } else {
            reply.documents
        };
        let personas = if reply.personas.is_empty() {
            keyword_personas.to_vec()
        } else {
            reply.personas
        };

        Some(RoutingDecision::new(
            mode,
            documents,
            personas,
            format!("LLM routing: {}", reply.reason),
            LLM_DECISION_CONFIDENCE,
            Some(complexity.clone()),
        ))
    }
}

/// Pick mode, personas, and reason from the complexity analysis.
///
/// Priority: parallel, then collaborative, then the skill-agent threshold,
/// then plain knowledge lookup.
fn decide_mode(
    query: &str,
    complexity: &ComplexityAnalysis,
) -> (ExecutionMode, Vec<String>, String) {
    if complexity.is_parallel {
        let personas = personas::select_for_parallel(query);
        let reason = format!(
            "Detected {} independent tasks suitable for parallel execution",
            personas.len()
        );
        return (ExecutionMode::Parallel, personas, reason);
    }

    if complexity.is_collaborative {
        return (
            ExecutionMode::MultiAgent,
            personas::select_for_collaboration(query),
            "Sequential collaboration between specialists required".to_string(),
        );
    }

    if complexity.score >= SKILL_AGENT_THRESHOLD {
        return (
            ExecutionMode::SkillAgent,
            personas::select_primary(query),
            format!("Technical implementation work (complexity: {:.2})", complexity.score),
        );
    }

    (
        ExecutionMode::SkillOnly,
        Vec::new(),
        format!("Simple knowledge lookup (complexity: {:.2})", complexity.score),
    )
}

/// Confidence: 0.5 base, +0.2 for document matches, +0.1 for any complexity
/// indicator, +0.1 for detected parallel/collaborative structure; capped at 1.
fn calculate_confidence(documents: &[String], complexity: &ComplexityAnalysis) -> f64 {
    let mut confidence: f64 = 0.5;

    if !documents.is_empty() {
        confidence += 0.2;
    }
    if complexity.has_indicators() {
        confidence += 0.1;
    }
    if complexity.is_parallel || complexity.is_collaborative {
        confidence += 0.1;
    }

    confidence.min(1.0)
}
