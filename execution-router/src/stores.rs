//! Collaborator contracts the routing core is wired against.
//!
//! The core never talks to a vector database, persona registry, or language
//! model directly; it goes through the traits defined here. The in-memory
//! implementations below back the CLI demo and the test suite, and double as
//! the reference for the scoring the store-level fallback search performs.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ExecutionMode;

// ============================================================================
// Contracts
// ============================================================================

/// A knowledge document surfaced by the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    /// Document id
    pub id: String,

    /// Topic tags
    pub tags: Vec<String>,

    /// Short description
    pub description: String,
}

/// Knowledge-document store the router falls back to when keyword matching
/// finds nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Similarity search over the document corpus, best match first
    async fn search(&self, query: &str, k: usize) -> Vec<DocumentHit>;

    /// Flat `id|tags|description` table used as LLM-routing context
    fn compressed_index(&self) -> String;
}

/// A persona profile usable to answer or act on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Persona id
    pub id: String,

    /// What the persona is good at
    pub description: String,

    /// System prompt the execution layer hands to the model
    pub system_prompt: String,
}

/// Persona registry
pub trait PersonaStore: Send + Sync {
    /// Look up a persona by id
    fn get(&self, id: &str) -> Option<PersonaProfile>;
}

/// External LLM-backed router consulted when keyword confidence is low.
///
/// Implementations return the raw model text; the core parses it tolerantly
/// via [`LlmRouteReply::from_response_text`] and treats anything unparseable
/// as a soft failure.
#[async_trait]
pub trait LlmRouter: Send + Sync {
    /// Ask the model to pick a mode/documents/personas for the query
    async fn route(&self, query: &str, compressed_index: &str) -> anyhow::Result<String>;
}

// ============================================================================
// LLM Reply Parsing
// ============================================================================

/// Structured routing reply extracted from LLM output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LlmRouteReply {
    /// Execution mode as a string; validated by [`LlmRouteReply::mode`]
    #[serde(default)]
    pub mode: String,

    /// Suggested document ids
    #[serde(default, alias = "skills")]
    pub documents: Vec<String>,

    /// Suggested persona ids
    #[serde(default, alias = "agents")]
    pub personas: Vec<String>,

    /// Model's explanation
    #[serde(default)]
    pub reason: String,
}

impl LlmRouteReply {
    /// Extract a structured reply from raw model text.
    ///
    /// Tries, in order: a ```json fenced block, any fenced block, then a bare
    /// `{ ... "mode" ... }` object anywhere in the text. Returns `None` when
    /// no candidate parses.
    pub fn from_response_text(text: &str) -> Option<LlmRouteReply> {
        let candidate = if let Some(rest) = text.split("```json").nth(1) {
            rest.split("```").next().unwrap_or("")
        } else if let Some(rest) = text.split("```").nth(1) {
            rest
        } else {
            text
        };

        if let Ok(reply) = serde_json::from_str::<LlmRouteReply>(candidate.trim()) {
            return Some(reply);
        }

        // Last resort: pull the first object mentioning "mode" out of prose.
        let object_re = Regex::new(r#"(?s)\{[^{}]*"mode"[^{}]*\}"#).expect("static regex");
        let object = object_re.find(text)?;
        serde_json::from_str::<LlmRouteReply>(object.as_str()).ok()
    }

    /// The validated execution mode; `None` when the string is unrecognized
    pub fn mode(&self) -> Option<ExecutionMode> {
        ExecutionMode::parse(&self.mode)
    }
}

// ============================================================================
// In-memory Implementations
// ============================================================================

/// Document store backed by a static catalogue.
///
/// Search scoring: query substring inside the document id +10, inside the
/// description +8, tag/query containment either way +5 plus +2 per query
/// word inside a tag, +1 per query word inside the description. Documents
/// scoring zero are dropped.
pub struct InMemoryDocumentStore {
    documents: Vec<DocumentHit>,
}

impl InMemoryDocumentStore {
    pub fn new(documents: Vec<DocumentHit>) -> Self {
        Self { documents }
    }

    /// Catalogue matching the keyword matcher's built-in table
    pub fn with_default_catalogue() -> Self {
        Self::new(default_catalogue())
    }

    pub fn documents(&self) -> &[DocumentHit] {
        &self.documents
    }

    fn score(&self, doc: &DocumentHit, query_lower: &str, query_words: &[&str]) -> f64 {
        let mut score = 0.0;

        if doc.id.to_lowercase().contains(query_lower) {
            score += 10.0;
        }

        let desc_lower = doc.description.to_lowercase();
        if desc_lower.contains(query_lower) {
            score += 8.0;
        }

        for tag in &doc.tags {
            let tag_lower = tag.to_lowercase();
            if query_lower.contains(&tag_lower) || tag_lower.contains(query_lower) {
                score += 5.0;
            }
            for word in query_words {
                if tag_lower.contains(word) {
                    score += 2.0;
                }
            }
        }

        for word in query_words {
            if desc_lower.contains(word) {
                score += 1.0;
            }
        }

        score
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn search(&self, query: &str, k: usize) -> Vec<DocumentHit> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<(f64, &DocumentHit)> = self
            .documents
            .iter()
            .map(|doc| (self.score(doc, &query_lower, &query_words), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, doc)| doc.clone()).collect()
    }

    fn compressed_index(&self) -> String {
        let mut lines = vec!["id|keywords|description".to_string()];
        for doc in &self.documents {
            let tags: Vec<&str> = doc.tags.iter().take(5).map(String::as_str).collect();
            let desc: String = doc.description.chars().take(100).collect();
            lines.push(format!(
                "{}|{}|{}",
                doc.id,
                tags.join(","),
                desc.replace('|', " ")
            ));
        }
        lines.join("\n")
    }
}

/// Persona registry backed by a static profile list
pub struct InMemoryPersonaStore {
    personas: Vec<PersonaProfile>,
}

impl InMemoryPersonaStore {
    pub fn new(personas: Vec<PersonaProfile>) -> Self {
        Self { personas }
    }

    /// Profiles for every persona the routing rule tables can select
    pub fn with_default_profiles() -> Self {
        let profile = |id: &str, description: &str| PersonaProfile {
            id: id.to_string(),
            description: description.to_string(),
            system_prompt: format!("You are a {}. {}", id.replace('-', " "), description),
        };

        Self::new(vec![
            profile("backend-developer", "Designs and implements APIs, services, and data layers."),
            profile("frontend-developer", "Builds user interfaces and client-side behavior."),
            profile("ml-engineer", "Trains, tunes, and serves machine-learning models."),
            profile("qa-expert", "Writes test plans and verifies behavior against requirements."),
            profile("tech-writer", "Produces developer documentation and guides."),
            profile("devops-engineer", "Handles deployment, CI/CD, and infrastructure."),
            profile("system-architect", "Shapes system structure, boundaries, and trade-offs."),
            profile("security-reviewer", "Audits designs and code for security issues."),
        ])
    }
}

impl PersonaStore for InMemoryPersonaStore {
    fn get(&self, id: &str) -> Option<PersonaProfile> {
        self.personas.iter().find(|p| p.id == id).cloned()
    }
}

/// Default document catalogue for the demo binary and tests
pub fn default_catalogue() -> Vec<DocumentHit> {
    let doc = |id: &str, tags: &[&str], description: &str| DocumentHit {
        id: id.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: description.to_string(),
    };

    vec![
        doc("01-model-architecture", &["transformer", "attention", "architecture"], "Model architectures: transformers, SSMs, attention variants."),
        doc("02-tokenization", &["tokenizer", "bpe", "vocabulary"], "Tokenizer training and vocabulary design."),
        doc("03-fine-tuning", &["fine-tuning", "lora", "peft"], "Fine-tuning recipes: LoRA, QLoRA, instruction tuning."),
        doc("05-data-processing", &["data", "dedup", "preprocessing"], "Dataset curation, deduplication, and filtering."),
        doc("06-post-training", &["dpo", "rlhf", "preference"], "Post-training: DPO, RLHF, and preference optimization."),
        doc("07-safety-alignment", &["safety", "alignment", "guardrails"], "Safety guardrails, red-teaming, and alignment."),
        doc("08-distributed-training", &["deepspeed", "fsdp", "distributed"], "Multi-GPU and multi-node training setups."),
        doc("10-optimization", &["quantization", "pruning", "compression"], "Model compression: quantization, pruning, distillation."),
        doc("11-evaluation", &["benchmark", "evaluation", "metrics"], "Evaluation harnesses and benchmark design."),
        doc("12-inference-serving", &["vllm", "inference", "serving"], "Inference serving and deployment stacks."),
        doc("13-mlops", &["wandb", "mlflow", "tracking"], "Experiment tracking and MLOps tooling."),
        doc("14-agents", &["agent", "tool", "function"], "Agent frameworks and tool calling."),
        doc("15-rag", &["rag", "retrieval", "embedding"], "Retrieval-augmented generation and vector search."),
        doc("16-prompt-engineering", &["prompt", "structured", "few-shot"], "Prompting techniques and structured output."),
        doc("17-observability", &["observability", "tracing", "monitoring"], "Observability for model-backed systems."),
        doc("18-multimodal", &["multimodal", "vision", "audio"], "Multimodal models: vision, audio, and beyond."),
        doc("19-emerging-techniques", &["moe", "state-space", "emerging"], "Emerging techniques: MoE, state-space models."),
        doc("20-trading", &["trading", "backtest", "quant"], "Quantitative trading and backtesting."),
        doc("23-frontend-design-architect", &["frontend", "ui", "design"], "Frontend design systems and component architecture."),
        doc("24-spec-driven-planner", &["spec", "planning", "task"], "Spec-driven planning and task decomposition."),
    ]
}
