//! Data types for the task planning workflow.
//!
//! This module defines the structures produced by the planner:
//!
//! 1. **Workflow selection** - Which of six planning strategies applies
//! 2. **Tasks** - Executable units with category, persona, and estimates
//! 3. **Phases** - Ordered task groups with phase-level dependencies
//! 4. **Execution plans** - The complete dependency-ordered plan

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Enums
// ============================================================================

/// Planning strategy, from immediate answer to full decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Answer immediately, no planning
    SimpleQuery,

    /// Single knowledge-document lookup
    SkillLookup,

    /// One task for one persona
    SingleTask,

    /// Ordered chain of dependent tasks
    Sequential,

    /// Independent tasks executed at once
    Parallel,

    /// Full multi-phase decomposition
    SpecDriven,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::SimpleQuery => "simple_query",
            WorkflowType::SkillLookup => "skill_lookup",
            WorkflowType::SingleTask => "single_task",
            WorkflowType::Sequential => "sequential",
            WorkflowType::Parallel => "parallel",
            WorkflowType::SpecDriven => "spec_driven",
        }
    }
}

/// Task lifecycle state, advanced by the execution layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Failed,
}

/// What kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Investigation,
    Implementation,
    Refactoring,
    Testing,
    Documentation,
    Decision,
    Research,
}

// ============================================================================
// Task and Phase
// ============================================================================

/// An executable task extracted from the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id, unique within its plan
    pub id: String,

    /// Short title (truncated segment text)
    pub title: String,

    /// Full segment text
    pub description: String,

    /// Detected work category
    pub category: TaskCategory,

    /// Lifecycle state
    pub status: TaskStatus,

    /// Persona assigned to execute the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,

    /// Knowledge documents attached to the task
    #[serde(default)]
    pub document_ids: Vec<String>,

    /// Task ids that must complete before this one starts; fixed once the
    /// plan is built
    #[serde(default)]
    pub blocked_by: Vec<String>,

    /// Effort estimate in minutes
    pub estimated_minutes: u32,

    /// 1 = high, 2 = normal, 3 = low
    pub priority: u8,
}

/// An ordered group of tasks within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase id, unique within its plan
    pub id: String,

    /// Display name
    pub name: String,

    /// What the phase accomplishes
    pub description: String,

    /// Tasks in this phase
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Ids of phases that must complete first
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Phase {
    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    /// Completed fraction in [0.0, 1.0]; 0.0 for an empty phase
    pub fn progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_tasks() as f64 / self.total_tasks() as f64
    }
}

// ============================================================================
// Execution Plan
// ============================================================================

/// A complete dependency-ordered execution plan.
///
/// Immutable once created, except for task status updates via
/// [`ExecutionPlan::set_task_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Deterministic id derived from the query prefix and creation time
    pub id: String,

    /// The original query
    pub query: String,

    /// Selected planning strategy
    pub workflow: WorkflowType,

    /// Ordered phases
    #[serde(default)]
    pub phases: Vec<Phase>,

    /// Personas assigned across the plan, in assignment order
    #[serde(default)]
    pub selected_personas: Vec<String>,

    /// Knowledge documents the plan draws on
    #[serde(default)]
    pub selected_documents: Vec<String>,

    /// Complexity score the plan was built from
    pub complexity_score: f64,

    /// Sum of all task estimates in minutes
    pub estimated_minutes: u32,

    /// Creation timestamp
    pub created_at: DateTime<Local>,
}

impl ExecutionPlan {
    /// Derive the plan id from the query prefix and creation instant.
    ///
    /// Re-planning the identical request at the identical instant yields the
    /// identical id, making plan creation idempotent.
    pub fn derive_id(query: &str, created_at: &DateTime<Local>) -> String {
        let prefix: String = query.chars().take(50).collect();
        let digest = Sha256::digest(format!("{}_{}", prefix, created_at.to_rfc3339()));
        format!("plan-{}", &hex::encode(digest)[..8])
    }

    pub fn total_tasks(&self) -> usize {
        self.phases.iter().map(Phase::total_tasks).sum()
    }

    pub fn completed_tasks(&self) -> usize {
        self.phases.iter().map(Phase::completed_tasks).sum()
    }

    /// Completed fraction across all phases
    pub fn progress(&self) -> f64 {
        let total = self.total_tasks();
        if total == 0 {
            return 0.0;
        }
        self.completed_tasks() as f64 / total as f64
    }

    /// All pending tasks whose blockers are complete, sorted by priority
    /// then estimate.
    ///
    /// This is the scheduling primitive executors poll; it mutates nothing
    /// and is safe to call repeatedly.
    pub fn get_next_tasks(&self) -> Vec<&Task> {
        let completed: std::collections::HashSet<&str> = self
            .phases
            .iter()
            .flat_map(|p| &p.tasks)
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.id.as_str())
            .collect();

        let mut ready: Vec<&Task> = self
            .phases
            .iter()
            .flat_map(|p| &p.tasks)
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| t.blocked_by.iter().all(|dep| completed.contains(dep.as_str())))
            .collect();

        ready.sort_by_key(|t| (t.priority, t.estimated_minutes));
        ready
    }

    /// Look up a task by id
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.phases
            .iter()
            .flat_map(|p| &p.tasks)
            .find(|t| t.id == task_id)
    }

    /// Advance a task's status; returns false for an unknown id
    pub fn set_task_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        for phase in &mut self.phases {
            for task in &mut phase.tasks {
                if task.id == task_id {
                    task.status = status;
                    return true;
                }
            }
        }
        false
    }

    /// Render a Markdown summary of the plan
    pub fn render_summary(&self) -> String {
        let mut lines = vec![
            format!("# Execution plan: {}", self.id),
            String::new(),
            format!("**Query**: {}", truncate_chars(&self.query, 100)),
            format!("**Workflow**: {}", self.workflow.as_str()),
            format!("**Complexity**: {:.2}", self.complexity_score),
            format!("**Estimated time**: ~{} min", self.estimated_minutes),
            format!(
                "**Progress**: {:.0}% ({}/{})",
                self.progress() * 100.0,
                self.completed_tasks(),
                self.total_tasks()
            ),
            String::new(),
            "## Phases".to_string(),
        ];

        for phase in &self.phases {
            lines.push(String::new());
            lines.push(format!(
                "### {} ({}/{})",
                phase.name,
                phase.completed_tasks(),
                phase.total_tasks()
            ));
            lines.push(phase.description.clone());
            lines.push(String::new());

            for task in &phase.tasks {
                let marker = match task.status {
                    TaskStatus::Completed => "[x]",
                    TaskStatus::InProgress => "[~]",
                    TaskStatus::Blocked => "[B]",
                    TaskStatus::Failed => "[!]",
                    TaskStatus::Pending => "[ ]",
                };
                let persona = task
                    .persona_id
                    .as_deref()
                    .map(|p| format!(" [{}]", p))
                    .unwrap_or_default();
                lines.push(format!("- {} {}{}", marker, task.title, persona));
            }
        }

        lines.push(String::new());
        lines.push("## Personas".to_string());
        for persona in &self.selected_personas {
            lines.push(format!("- {}", persona));
        }

        lines.join("\n")
    }
}

/// Truncate on a char boundary; queries are frequently multi-byte
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
