//! Versioned snapshot persistence for the evolution engine.
//!
//! The on-disk record is a single JSON document tagged with a schema
//! version. Keyword sets live as `HashSet` in memory and are converted to
//! sorted lists here, at the serialization boundary, and nowhere else.
//!
//! Failure semantics: a missing or corrupt file makes `load` return `false`
//! and leaves in-memory state untouched; save failures are logged and
//! reported as `false` without losing in-memory state. Nothing in this
//! module panics or propagates I/O errors.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::evolution::{
    DocumentStats, EvolutionEngine, LearnedPattern, PatternSample,
};
use crate::models::{ExecutionMode, FeedbackRecord};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "1.0";

// ============================================================================
// Snapshot Records
// ============================================================================

/// The complete persisted record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    /// Schema version tag
    pub version: String,

    /// When the snapshot was written
    pub saved_at: DateTime<Local>,

    pub feedback_log: Vec<FeedbackRecord>,
    pub document_stats: HashMap<String, DocumentStats>,
    pub learned_patterns: Vec<LearnedPatternRecord>,
    pub pending_patterns: HashMap<String, Vec<PatternSampleRecord>>,
}

/// [`LearnedPattern`] with the keyword set flattened for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPatternRecord {
    pub pattern_key: String,
    pub documents: Vec<String>,
    pub mode: ExecutionMode,
    pub personas: Vec<String>,
    pub keywords: Vec<String>,
    pub sample_count: usize,
    pub success_rate: f64,
    pub success_scores: Vec<u8>,
    pub learned_at: DateTime<Local>,
}

impl LearnedPatternRecord {
    fn from_pattern(pattern: &LearnedPattern) -> Self {
        Self {
            pattern_key: pattern.pattern_key.clone(),
            documents: pattern.documents.clone(),
            mode: pattern.mode,
            personas: pattern.personas.clone(),
            keywords: sorted_keywords(&pattern.keywords),
            sample_count: pattern.sample_count,
            success_rate: pattern.success_rate,
            success_scores: pattern.success_scores.clone(),
            learned_at: pattern.learned_at,
        }
    }

    fn into_pattern(self) -> LearnedPattern {
        LearnedPattern {
            pattern_key: self.pattern_key,
            documents: self.documents,
            mode: self.mode,
            personas: self.personas,
            keywords: self.keywords.into_iter().collect(),
            sample_count: self.sample_count,
            success_rate: self.success_rate,
            success_scores: self.success_scores,
            learned_at: self.learned_at,
        }
    }
}

/// [`PatternSample`] with the keyword set flattened for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSampleRecord {
    pub query: String,
    pub keywords: Vec<String>,
    pub score: u8,
    pub mode: ExecutionMode,
    pub personas: Vec<String>,
}

impl PatternSampleRecord {
    fn from_sample(sample: &PatternSample) -> Self {
        Self {
            query: sample.query.clone(),
            keywords: sorted_keywords(&sample.keywords),
            score: sample.score,
            mode: sample.mode,
            personas: sample.personas.clone(),
        }
    }

    fn into_sample(self) -> PatternSample {
        PatternSample {
            query: self.query,
            keywords: self.keywords.into_iter().collect(),
            score: self.score,
            mode: self.mode,
            personas: self.personas,
        }
    }
}

fn sorted_keywords(keywords: &HashSet<String>) -> Vec<String> {
    let mut list: Vec<String> = keywords.iter().cloned().collect();
    list.sort();
    list
}

// ============================================================================
// Engine Persistence
// ============================================================================

impl EvolutionEngine {
    /// Default state location under the user's home directory
    pub fn default_state_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".execution-router").join("evolution.json"))
    }

    /// Persist the current state to the configured path.
    ///
    /// Returns `false` (after logging) when no path is configured or the
    /// write fails; in-memory state is unaffected either way.
    pub fn save(&mut self) -> bool {
        let path = match self.state_path() {
            Some(path) => path.clone(),
            None => {
                warn!("No state path configured, skipping save");
                return false;
            }
        };

        if self.write_snapshot(&path) {
            self.set_dirty(false);
            debug!(path = %path.display(), "Evolution state saved");
            true
        } else {
            false
        }
    }

    /// Load state from the configured path, replacing in-memory state.
    ///
    /// Returns `false` (after logging) when the file is missing, unreadable,
    /// unparseable, or carries an unknown schema version; in-memory state is
    /// left untouched in every failure case.
    pub fn load(&mut self) -> bool {
        let path = match self.state_path() {
            Some(path) => path.clone(),
            None => {
                warn!("No state path configured, skipping load");
                return false;
            }
        };
        self.load_snapshot_from(&path, false)
    }

    /// Write a timestamped snapshot next to the configured state file.
    ///
    /// Returns the snapshot path, or `None` when no path is configured or
    /// the write fails.
    pub fn backup(&self) -> Option<PathBuf> {
        let state_path = self.state_path()?.clone();
        let dir = state_path.parent().unwrap_or_else(|| Path::new("."));
        let backup_path = dir.join(format!(
            "evolution_backup_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        ));

        if self.write_snapshot(&backup_path) {
            debug!(path = %backup_path.display(), "Evolution backup written");
            Some(backup_path)
        } else {
            None
        }
    }

    /// Load state from an arbitrary snapshot path.
    ///
    /// On success the restored state is marked dirty, since it has not been
    /// written back to the primary state file yet.
    pub fn restore_from_backup(&mut self, path: &Path) -> bool {
        self.load_snapshot_from(path, true)
    }

    /// Build the snapshot of the current state
    pub fn snapshot(&self) -> EvolutionSnapshot {
        let (feedback_log, document_stats, learned_patterns, pending_patterns) = self.state();
        EvolutionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            saved_at: Local::now(),
            feedback_log: feedback_log.clone(),
            document_stats: document_stats.clone(),
            learned_patterns: learned_patterns
                .iter()
                .map(LearnedPatternRecord::from_pattern)
                .collect(),
            pending_patterns: pending_patterns
                .iter()
                .map(|(key, samples)| {
                    (
                        key.clone(),
                        samples.iter().map(PatternSampleRecord::from_sample).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Learned patterns in their serialized form
    pub fn export_patterns(&self) -> Vec<LearnedPatternRecord> {
        self.patterns()
            .iter()
            .map(LearnedPatternRecord::from_pattern)
            .collect()
    }

    fn write_snapshot(&self, path: &Path) -> bool {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "Failed to serialize evolution state");
                return false;
            }
        };

        if let Some(parent) = path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(%error, path = %parent.display(), "Failed to create state directory");
                return false;
            }
        }

        if let Err(error) = fs::write(path, json) {
            warn!(%error, path = %path.display(), "Failed to write evolution state");
            return false;
        }

        true
    }

    fn load_snapshot_from(&mut self, path: &Path, mark_dirty: bool) -> bool {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                warn!(%error, path = %path.display(), "Failed to read evolution state");
                return false;
            }
        };

        let snapshot: EvolutionSnapshot = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, path = %path.display(), "Failed to parse evolution state");
                return false;
            }
        };

        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                version = %snapshot.version,
                expected = SNAPSHOT_VERSION,
                "Unknown evolution snapshot version"
            );
            return false;
        }

        let (feedback_log, document_stats, learned_patterns, pending_patterns) = self.state_mut();
        *feedback_log = snapshot.feedback_log;
        *document_stats = snapshot.document_stats;
        *learned_patterns = snapshot
            .learned_patterns
            .into_iter()
            .map(LearnedPatternRecord::into_pattern)
            .collect();
        *pending_patterns = snapshot
            .pending_patterns
            .into_iter()
            .map(|(key, samples)| {
                (
                    key,
                    samples.into_iter().map(PatternSampleRecord::into_sample).collect(),
                )
            })
            .collect();

        self.set_dirty(mark_dirty);
        debug!(path = %path.display(), "Evolution state loaded");
        true
    }
}
