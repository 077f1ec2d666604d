//! Feedback-driven learning: record scored feedback, track per-document
//! success statistics, learn reusable routing patterns, and hand hints back
//! to the router.
//!
//! ## Module Structure
//!
//! - `persistence` - Versioned snapshot save/load/backup/restore
//!
//! The engine assumes a single logical writer: read paths take `&self` and
//! are safe alongside each other, but concurrent `record_feedback` calls
//! must be serialized by the caller (e.g. one engine per session, or an
//! outer lock).

pub mod persistence;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    dedup_stable, ExecutionMode, ExecutionOutcome, FeedbackRecord, ImprovementSuggestion,
    RoutingHint,
};

/// Samples required before a pending pattern is evaluated
const LEARNING_THRESHOLD: usize = 5;

/// Score at which an execution counts as a success
const SUCCESS_SCORE: u8 = 4;

/// Score at which an execution is flagged for review
const REVIEW_SCORE: u8 = 2;

/// Minimum aggregate success rate to materialize a pattern
const PATTERN_SUCCESS_RATE: f64 = 0.8;

/// Minimum weighted similarity for a hint to be usable
const HINT_MIN_SCORE: f64 = 0.3;

/// Hint confidence scale and cap
const HINT_SCALE: f64 = 1.5;
const HINT_CAP: f64 = 0.95;

/// Minimum feedback count before a document enters the top ranking
const RANKING_MIN_TOTAL: u32 = 3;

/// Tokens dropped during query keyword extraction
const STOP_WORDS: &[&str] = &[
    "을", "를", "이", "가", "은", "는", "에", "의", "로", "해", "해줘", "알려줘", "방법", "뭐",
];

// ============================================================================
// State Types
// ============================================================================

/// Per-document routing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Times the document was part of a rated execution
    pub total: u32,

    /// Times that execution scored as a success
    pub success: u32,

    /// Every score received, in order
    pub scores: Vec<u8>,

    /// Rated executions per execution mode
    pub modes: HashMap<String, u32>,
}

/// A reusable routing pattern learned from repeated successes
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedPattern {
    /// Sorted, "|"-joined document ids
    pub pattern_key: String,

    /// Documents the pattern routes to
    pub documents: Vec<String>,

    /// Execution mode that succeeded
    pub mode: ExecutionMode,

    /// Personas that were involved
    pub personas: Vec<String>,

    /// Union of query keywords across the learning samples
    pub keywords: HashSet<String>,

    /// Number of samples the pattern has absorbed
    pub sample_count: usize,

    /// Success rate at learning time
    pub success_rate: f64,

    /// Scores of the absorbed samples
    pub success_scores: Vec<u8>,

    /// When the pattern was materialized
    pub learned_at: DateTime<Local>,
}

/// A buffered candidate sample awaiting the learning threshold
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSample {
    pub query: String,
    pub keywords: HashSet<String>,
    pub score: u8,
    pub mode: ExecutionMode,
    pub personas: Vec<String>,
}

/// Aggregate feedback statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStats {
    pub total_feedbacks: usize,
    pub positive_feedbacks: usize,
    pub negative_feedbacks: usize,
    pub average_score: f64,
    pub learned_patterns: usize,
    pub documents_tracked: usize,
}

/// Per-document performance view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPerformance {
    pub total: u32,
    pub success: u32,
    pub average_score: f64,
    pub success_rate: f64,
    pub modes: HashMap<String, u32>,
}

/// Entry in the top-performing ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRanking {
    pub document_id: String,
    pub success_rate: f64,
    pub total: u32,
}

// ============================================================================
// Engine
// ============================================================================

/// Feedback-driven learning engine
pub struct EvolutionEngine {
    feedback_log: Vec<FeedbackRecord>,
    document_stats: HashMap<String, DocumentStats>,
    learned_patterns: Vec<LearnedPattern>,
    pending_patterns: HashMap<String, Vec<PatternSample>>,
    state_path: Option<PathBuf>,
    auto_save: bool,
    dirty: bool,
    token_re: Regex,
}

impl EvolutionEngine {
    /// In-memory engine without persistence
    pub fn new() -> Self {
        Self {
            feedback_log: Vec::new(),
            document_stats: HashMap::new(),
            learned_patterns: Vec::new(),
            pending_patterns: HashMap::new(),
            state_path: None,
            auto_save: false,
            dirty: false,
            token_re: Regex::new(r"\w+").expect("static regex"),
        }
    }

    /// Persist state at the given path; call [`Self::load`] to pick up an
    /// existing file.
    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    /// Persist automatically after every feedback write
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// Record scored feedback for a completed execution.
    ///
    /// Updates per-document statistics, feeds pattern learning on success,
    /// and returns a review suggestion for low scores. The score must be in
    /// 1..=5; anything else is caller misuse.
    pub fn record_feedback(
        &mut self,
        outcome: &ExecutionOutcome,
        comment: &str,
        score: u8,
    ) -> Result<Option<ImprovementSuggestion>> {
        if !(1..=5).contains(&score) {
            return Err(Error::InvalidFeedbackScore(score));
        }

        let record = FeedbackRecord {
            timestamp: Local::now(),
            query: outcome.query.clone(),
            mode: outcome.mode,
            documents: outcome.documents_used.clone(),
            personas: outcome.personas_used.clone(),
            comment: comment.to_string(),
            score,
        };

        self.update_document_stats(&record);

        if record.is_positive() {
            self.learn_success_pattern(&record);
        }

        let suggestion = if record.is_negative() {
            Some(ImprovementSuggestion {
                query: record.query.clone(),
                documents: record.documents.clone(),
                score,
                suggestion: "Consider reviewing document content or routing rules".to_string(),
            })
        } else {
            None
        };

        debug!(score, documents = ?record.documents, "Feedback recorded");
        self.feedback_log.push(record);
        self.dirty = true;
        self.maybe_auto_save();

        Ok(suggestion)
    }

    fn update_document_stats(&mut self, record: &FeedbackRecord) {
        for document_id in &record.documents {
            let stats = self.document_stats.entry(document_id.clone()).or_default();
            stats.total += 1;
            stats.scores.push(record.score);
            if record.is_positive() {
                stats.success += 1;
            }
            *stats.modes.entry(record.mode.as_str().to_string()).or_insert(0) += 1;
        }
    }

    /// Feed a successful execution into pattern learning.
    ///
    /// An existing pattern for the document set absorbs the sample. A new
    /// candidate is buffered; once the buffer reaches the threshold it is
    /// evaluated exactly once and then consumed, materialized or not.
    fn learn_success_pattern(&mut self, record: &FeedbackRecord) {
        if record.documents.is_empty() {
            return;
        }

        let mut sorted_documents = record.documents.clone();
        sorted_documents.sort();
        let pattern_key = sorted_documents.join("|");

        let keywords = self.extract_keywords(&record.query);

        if let Some(pattern) = self
            .learned_patterns
            .iter_mut()
            .find(|p| p.pattern_key == pattern_key)
        {
            pattern.sample_count += 1;
            pattern.keywords.extend(keywords);
            pattern.success_scores.push(record.score);
            return;
        }

        let samples = self.pending_patterns.entry(pattern_key.clone()).or_default();
        samples.push(PatternSample {
            query: record.query.clone(),
            keywords,
            score: record.score,
            mode: record.mode,
            personas: record.personas.clone(),
        });

        if samples.len() < LEARNING_THRESHOLD {
            return;
        }

        // One-shot gate: the buffer is consumed whether or not it qualifies.
        let samples = self
            .pending_patterns
            .remove(&pattern_key)
            .unwrap_or_default();

        let success_count = samples.iter().filter(|s| s.score >= SUCCESS_SCORE).count();
        let success_rate = success_count as f64 / samples.len() as f64;

        if success_rate < PATTERN_SUCCESS_RATE {
            debug!(%pattern_key, success_rate, "Candidate pattern discarded");
            return;
        }

        let mut keywords = HashSet::new();
        let mut success_scores = Vec::new();
        let mut personas = Vec::new();
        for sample in &samples {
            keywords.extend(sample.keywords.iter().cloned());
            success_scores.push(sample.score);
            personas.extend(sample.personas.iter().cloned());
        }

        info!(%pattern_key, success_rate, "Learned routing pattern");
        self.learned_patterns.push(LearnedPattern {
            pattern_key,
            documents: record.documents.clone(),
            mode: record.mode,
            personas: dedup_stable(personas),
            keywords,
            sample_count: samples.len(),
            success_rate,
            success_scores,
            learned_at: Local::now(),
        });
    }

    /// Best learned-pattern hint for a query.
    ///
    /// Jaccard similarity between the query's keywords and each pattern's,
    /// weighted by the pattern's success rate; only a weighted score above
    /// 0.3 produces a usable hint.
    pub fn get_routing_hints(&self, query: &str) -> RoutingHint {
        if self.learned_patterns.is_empty() {
            return RoutingHint::empty();
        }

        let query_keywords = self.extract_keywords(query);
        if query_keywords.is_empty() {
            return RoutingHint::empty();
        }

        let mut best: Option<(&LearnedPattern, f64)> = None;
        for pattern in &self.learned_patterns {
            if pattern.keywords.is_empty() {
                continue;
            }

            let common = query_keywords.intersection(&pattern.keywords).count();
            if common == 0 {
                continue;
            }

            let union = query_keywords.union(&pattern.keywords).count();
            let similarity = common as f64 / union as f64;
            let weighted = similarity * pattern.success_rate;

            if best.map(|(_, score)| weighted > score).unwrap_or(true) {
                best = Some((pattern, weighted));
            }
        }

        match best {
            Some((pattern, weighted)) if weighted > HINT_MIN_SCORE => RoutingHint {
                confidence: (weighted * HINT_SCALE).min(HINT_CAP),
                documents: pattern.documents.clone(),
                mode: Some(pattern.mode),
                personas: pattern.personas.clone(),
                matched_pattern: Some(pattern.pattern_key.clone()),
            },
            _ => RoutingHint::empty(),
        }
    }

    /// Performance view for one document; zeros when untracked
    pub fn document_performance(&self, document_id: &str) -> DocumentPerformance {
        match self.document_stats.get(document_id) {
            Some(stats) => {
                let average_score = if stats.scores.is_empty() {
                    0.0
                } else {
                    stats.scores.iter().map(|&s| s as f64).sum::<f64>() / stats.scores.len() as f64
                };
                DocumentPerformance {
                    total: stats.total,
                    success: stats.success,
                    average_score,
                    success_rate: if stats.total > 0 {
                        stats.success as f64 / stats.total as f64
                    } else {
                        0.0
                    },
                    modes: stats.modes.clone(),
                }
            }
            None => DocumentPerformance {
                total: 0,
                success: 0,
                average_score: 0.0,
                success_rate: 0.0,
                modes: HashMap::new(),
            },
        }
    }

    /// Documents with at least three rated executions, best success rate
    /// first
    pub fn top_performing_documents(&self, n: usize) -> Vec<DocumentRanking> {
        let mut rankings: Vec<DocumentRanking> = self
            .document_stats
            .iter()
            .filter(|(_, stats)| stats.total >= RANKING_MIN_TOTAL)
            .map(|(id, stats)| DocumentRanking {
                document_id: id.clone(),
                success_rate: stats.success as f64 / stats.total as f64,
                total: stats.total,
            })
            .collect();

        rankings.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        rankings.truncate(n);
        rankings
    }

    /// Aggregate statistics over the whole feedback log
    pub fn stats(&self) -> EvolutionStats {
        let total = self.feedback_log.len();
        EvolutionStats {
            total_feedbacks: total,
            positive_feedbacks: self.feedback_log.iter().filter(|f| f.is_positive()).count(),
            negative_feedbacks: self.feedback_log.iter().filter(|f| f.is_negative()).count(),
            average_score: if total == 0 {
                0.0
            } else {
                self.feedback_log.iter().map(|f| f.score as f64).sum::<f64>() / total as f64
            },
            learned_patterns: self.learned_patterns.len(),
            documents_tracked: self.document_stats.len(),
        }
    }

    /// The most recent `n` feedback records, oldest first
    pub fn recent_feedback(&self, n: usize) -> &[FeedbackRecord] {
        let start = self.feedback_log.len().saturating_sub(n);
        &self.feedback_log[start..]
    }

    /// Full feedback log, in recording order
    pub fn feedback_log(&self) -> &[FeedbackRecord] {
        &self.feedback_log
    }

    /// Learned patterns, in learning order
    pub fn patterns(&self) -> &[LearnedPattern] {
        &self.learned_patterns
    }

    /// Drop all learned state; persisted files are untouched
    pub fn clear(&mut self) {
        self.feedback_log.clear();
        self.document_stats.clear();
        self.learned_patterns.clear();
        self.pending_patterns.clear();
        self.dirty = true;
        info!("Evolution state cleared");
    }

    /// Tokenize a query into lower-cased keywords, dropping stop words and
    /// single characters.
    fn extract_keywords(&self, query: &str) -> HashSet<String> {
        self.token_re
            .find_iter(&query.to_lowercase())
            .map(|m| m.as_str().to_string())
            .filter(|word| word.chars().count() > 1 && !STOP_WORDS.contains(&word.as_str()))
            .collect()
    }

    fn maybe_auto_save(&mut self) {
        if self.auto_save && self.state_path.is_some() {
            self.save();
        }
    }

    // State accessors shared with the persistence module.
    pub(crate) fn state_path(&self) -> Option<&PathBuf> {
        self.state_path.as_ref()
    }

    pub(crate) fn state_mut(
        &mut self,
    ) -> (
        &mut Vec<FeedbackRecord>,
        &mut HashMap<String, DocumentStats>,
        &mut Vec<LearnedPattern>,
        &mut HashMap<String, Vec<PatternSample>>,
    ) {
        (
            &mut self.feedback_log,
            &mut self.document_stats,
            &mut self.learned_patterns,
            &mut self.pending_patterns,
        )
    }

    pub(crate) fn state(
        &self,
    ) -> (
        &Vec<FeedbackRecord>,
        &HashMap<String, DocumentStats>,
        &Vec<LearnedPattern>,
        &HashMap<String, Vec<PatternSample>>,
    ) {
        (
            &self.feedback_log,
            &self.document_stats,
            &self.learned_patterns,
            &self.pending_patterns,
        )
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Whether in-memory state has unsaved mutations
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Default for EvolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
