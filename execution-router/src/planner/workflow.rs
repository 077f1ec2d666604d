//! Task planning workflow: decompose a complex request into a
//! dependency-ordered plan of phases and tasks.
//!
//! Planning is fully synchronous and CPU-bound; it performs no I/O. The
//! planner owns a bounded cache of the plans it has produced, keyed by the
//! deterministic plan id.

use chrono::{DateTime, Local};
use tracing::info;

use crate::planner::cache::{PlanCache, DEFAULT_CAPACITY};
use crate::planner::types::{
    truncate_chars, ExecutionPlan, Phase, Task, TaskCategory, TaskStatus, WorkflowType,
};

/// Complexity thresholds for workflow selection, highest first
const SPEC_DRIVEN_THRESHOLD: f64 = 0.7;
const SEQUENTIAL_THRESHOLD: f64 = 0.5;
const SINGLE_TASK_THRESHOLD: f64 = 0.35;
const SKILL_LOOKUP_THRESHOLD: f64 = 0.2;

/// Parallel/collaborative structure overrides the table at this complexity
const STRUCTURE_OVERRIDE_THRESHOLD: f64 = 0.5;

/// Connectives that separate a request into task segments
const SEGMENT_DELIMITERS: &[&str] = &[
    "하고", "그리고", "그 다음", "그다음", "다음에", "그 후", "후에", " and ", ", ",
];

/// Category keyword table, in detection order; first match wins
const CATEGORY_KEYWORDS: &[(TaskCategory, &[&str])] = &[
    (TaskCategory::Investigation, &["분석", "조사", "확인", "검토", "살펴", "analyze"]),
    (TaskCategory::Implementation, &["구현", "만들", "작성", "개발", "build", "create"]),
    (TaskCategory::Refactoring, &["리팩", "개선", "최적화", "수정", "refactor"]),
    (TaskCategory::Testing, &["테스트", "검증", "확인", "test", "verify"]),
    (TaskCategory::Documentation, &["문서", "doc", "README", "설명"]),
    (TaskCategory::Research, &["연구", "찾아", "search", "research"]),
    (TaskCategory::Decision, &["선택", "결정", "decide", "choose"]),
];

/// Segments longer than this get a 1.5x estimate multiplier
const LONG_SEGMENT_CHARS: usize = 100;

/// Persona role a task resolves to before picking a concrete persona
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaRole {
    Architect,
    Backend,
    Frontend,
    Data,
    Devops,
    Qa,
    Docs,
}

impl PersonaRole {
    /// Candidate personas for the role, preferred first
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            PersonaRole::Architect => &["system-architect", "solution-architect", "api-designer"],
            PersonaRole::Backend => &["backend-developer", "api-developer", "python-pro"],
            PersonaRole::Frontend => &["frontend-developer", "ui-designer", "react-developer"],
            PersonaRole::Data => &["data-analyst", "data-scientist", "ml-engineer"],
            PersonaRole::Devops => &["devops-engineer", "sre-engineer", "deployment-engineer"],
            PersonaRole::Qa => &["qa-expert", "test-engineer", "security-reviewer"],
            PersonaRole::Docs => &["tech-writer", "documentation-engineer", "api-documenter"],
        }
    }
}

/// Query-level cues that override the per-category role default, evaluated
/// top to bottom
const ROLE_OVERRIDE_RULES: &[(PersonaRole, &[&str])] = &[
    (PersonaRole::Frontend, &["frontend", "ui", "프론트", "화면"]),
    (PersonaRole::Data, &["ml", "ai", "머신러닝", "모델"]),
    (PersonaRole::Devops, &["deploy", "배포", "ci/cd", "인프라"]),
];

/// Decomposes complex requests into dependency-ordered execution plans
pub struct TaskPlanner {
    plans: PlanCache,
}

impl TaskPlanner {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            plans: PlanCache::new(capacity),
        }
    }

    /// Build a plan for the query at the current instant
    pub fn create_plan(
        &mut self,
        query: &str,
        complexity_score: f64,
        matched_documents: &[String],
        is_parallel: bool,
        is_collaborative: bool,
    ) -> ExecutionPlan {
        self.create_plan_at(
            query,
            complexity_score,
            matched_documents,
            is_parallel,
            is_collaborative,
            Local::now(),
        )
    }

    /// Build a plan with an explicit creation timestamp.
    ///
    /// Identical arguments at an identical instant produce a plan with the
    /// identical id.
    pub fn create_plan_at(
        &mut self,
        query: &str,
        complexity_score: f64,
        matched_documents: &[String],
        is_parallel: bool,
        is_collaborative: bool,
        created_at: DateTime<Local>,
    ) -> ExecutionPlan {
        let workflow = select_workflow(complexity_score, is_parallel, is_collaborative);
        info!(
            workflow = workflow.as_str(),
            complexity = complexity_score,
            "Selected workflow"
        );

        let mut tasks = extract_tasks(query, matched_documents);
        let personas = assign_personas(&mut tasks, query);
        let mut phases = create_phases(tasks, workflow);
        wire_dependencies(&mut phases);

        let estimated_minutes = phases
            .iter()
            .flat_map(|p| &p.tasks)
            .map(|t| t.estimated_minutes)
            .sum();

        let plan = ExecutionPlan {
            id: ExecutionPlan::derive_id(query, &created_at),
            query: query.to_string(),
            workflow,
            phases,
            selected_personas: personas,
            selected_documents: matched_documents.to_vec(),
            complexity_score,
            estimated_minutes,
            created_at,
        };

        info!(
            plan_id = %plan.id,
            tasks = plan.total_tasks(),
            estimated_minutes,
            "Plan created"
        );

        self.plans.insert(plan.clone());
        plan
    }

    /// Cached plan by id (marks it recently used)
    pub fn plan(&mut self, plan_id: &str) -> Option<&ExecutionPlan> {
        self.plans.get(plan_id)
    }

    /// Mutable cached plan, for task-status updates
    pub fn plan_mut(&mut self, plan_id: &str) -> Option<&mut ExecutionPlan> {
        self.plans.get_mut(plan_id)
    }

    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }
}

impl Default for TaskPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Map complexity (and detected structure) onto a workflow
pub fn select_workflow(
    complexity: f64,
    is_parallel: bool,
    is_collaborative: bool,
) -> WorkflowType {
    if is_parallel && complexity >= STRUCTURE_OVERRIDE_THRESHOLD {
        return WorkflowType::Parallel;
    }
    if is_collaborative && complexity >= STRUCTURE_OVERRIDE_THRESHOLD {
        return WorkflowType::Sequential;
    }

    if complexity >= SPEC_DRIVEN_THRESHOLD {
        WorkflowType::SpecDriven
    } else if complexity >= SEQUENTIAL_THRESHOLD {
        WorkflowType::Sequential
    } else if complexity >= SINGLE_TASK_THRESHOLD {
        WorkflowType::SingleTask
    } else if complexity >= SKILL_LOOKUP_THRESHOLD {
        WorkflowType::SkillLookup
    } else {
        WorkflowType::SimpleQuery
    }
}

/// Split the query on connective delimiters and turn each segment into a task
fn extract_tasks(query: &str, documents: &[String]) -> Vec<Task> {
    let mut segments = vec![query.to_string()];
    for delimiter in SEGMENT_DELIMITERS {
        let mut next = Vec::new();
        for segment in &segments {
            for part in segment.split(delimiter) {
                let trimmed = part.trim();
                if !trimmed.is_empty() {
                    next.push(trimmed.to_string());
                }
            }
        }
        segments = next;
    }

    let mut tasks: Vec<Task> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let category = detect_category(segment);
            let segment_lower = segment.to_lowercase();

            // Attach documents whose id fragments relate to the segment;
            // fall back to the best overall match.
            let mut document_ids: Vec<String> = documents
                .iter()
                .filter(|doc| {
                    doc.split('-')
                        .any(|fragment| !fragment.is_empty() && segment_lower.contains(fragment))
                })
                .cloned()
                .collect();
            if document_ids.is_empty() {
                document_ids = documents.iter().take(1).cloned().collect();
            }

            Task {
                id: format!("task-{}", i + 1),
                title: truncate_chars(segment, 100),
                description: segment.clone(),
                category,
                status: TaskStatus::Pending,
                persona_id: None,
                document_ids,
                blocked_by: Vec::new(),
                estimated_minutes: estimate_minutes(segment, category),
                priority: if i == 0 { 1 } else { 2 },
            }
        })
        .collect();

    if tasks.is_empty() {
        tasks.push(Task {
            id: "task-1".to_string(),
            title: truncate_chars(query, 100),
            description: query.to_string(),
            category: TaskCategory::Investigation,
            status: TaskStatus::Pending,
            persona_id: None,
            document_ids: documents.to_vec(),
            blocked_by: Vec::new(),
            estimated_minutes: 15,
            priority: 1,
        });
    }

    tasks
}

/// First category whose keywords appear in the text; implementation otherwise
pub fn detect_category(text: &str) -> TaskCategory {
    let text_lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| text_lower.contains(&kw.to_lowercase())) {
            return *category;
        }
    }
    TaskCategory::Implementation
}

/// Base minutes per category, scaled up for long segments
fn estimate_minutes(text: &str, category: TaskCategory) -> u32 {
    let base = match category {
        TaskCategory::Investigation => 10,
        TaskCategory::Implementation => 30,
        TaskCategory::Refactoring => 20,
        TaskCategory::Testing => 15,
        TaskCategory::Documentation => 15,
        TaskCategory::Research => 20,
        TaskCategory::Decision => 5,
    };

    if text.chars().count() > LONG_SEGMENT_CHARS {
        (base as f64 * 1.5) as u32
    } else {
        base
    }
}

/// Resolve the persona role for a task: query-level override rules first,
/// then the per-category default.
pub fn resolve_role(category: TaskCategory, query_lower: &str) -> PersonaRole {
    for (role, cues) in ROLE_OVERRIDE_RULES {
        if cues.iter().any(|cue| query_lower.contains(cue)) {
            return *role;
        }
    }

    match category {
        TaskCategory::Investigation | TaskCategory::Research | TaskCategory::Decision => {
            PersonaRole::Architect
        }
        TaskCategory::Implementation | TaskCategory::Refactoring => PersonaRole::Backend,
        TaskCategory::Testing => PersonaRole::Qa,
        TaskCategory::Documentation => PersonaRole::Docs,
    }
}

/// Assign a persona to every task; returns the distinct personas in
/// assignment order.
fn assign_personas(tasks: &mut [Task], query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut assigned = Vec::new();

    for task in tasks.iter_mut() {
        let role = resolve_role(task.category, &query_lower);
        let persona = role.candidates()[0].to_string();
        if !assigned.contains(&persona) {
            assigned.push(persona.clone());
        }
        task.persona_id = Some(persona);
    }

    assigned
}

/// Group tasks into phases according to the workflow
fn create_phases(tasks: Vec<Task>, workflow: WorkflowType) -> Vec<Phase> {
    let single_phase = |name: &str, description: &str, tasks: Vec<Task>| {
        vec![Phase {
            id: "phase-1".to_string(),
            name: name.to_string(),
            description: description.to_string(),
            tasks,
            dependencies: Vec::new(),
        }]
    };

    match workflow {
        WorkflowType::SimpleQuery => {
            single_phase("Immediate response", "Answer the question directly", tasks)
        }
        WorkflowType::Parallel => single_phase(
            "Parallel execution",
            "Run independent tasks concurrently",
            tasks,
        ),
        WorkflowType::Sequential | WorkflowType::SpecDriven => {
            let mut phases: Vec<Phase> = Vec::new();
            let push_bucket = |phases: &mut Vec<Phase>, name: &str, description: &str, bucket: Vec<Task>, depends: bool| {
                if bucket.is_empty() {
                    return;
                }
                let dependencies = if depends {
                    phases.last().map(|p: &Phase| vec![p.id.clone()]).unwrap_or_default()
                } else {
                    Vec::new()
                };
                phases.push(Phase {
                    id: format!("phase-{}", phases.len() + 1),
                    name: name.to_string(),
                    description: description.to_string(),
                    tasks: bucket,
                    dependencies,
                });
            };

            let bucket = |tasks: &[Task], categories: &[TaskCategory]| -> Vec<Task> {
                tasks
                    .iter()
                    .filter(|t| categories.contains(&t.category))
                    .cloned()
                    .collect()
            };

            let analysis = bucket(
                &tasks,
                &[TaskCategory::Investigation, TaskCategory::Research, TaskCategory::Decision],
            );
            let implementation = bucket(
                &tasks,
                &[TaskCategory::Implementation, TaskCategory::Refactoring],
            );
            let verification = bucket(
                &tasks,
                &[TaskCategory::Testing, TaskCategory::Documentation],
            );

            push_bucket(
                &mut phases,
                "Analysis",
                "Requirements analysis and investigation",
                analysis,
                false,
            );
            push_bucket(
                &mut phases,
                "Implementation",
                "Core feature implementation",
                implementation,
                true,
            );
            push_bucket(
                &mut phases,
                "Verification",
                "Testing and documentation",
                verification,
                true,
            );

            // Anything the three buckets did not claim trails the plan.
            let placed: Vec<&str> = phases
                .iter()
                .flat_map(|p| &p.tasks)
                .map(|t| t.id.as_str())
                .collect();
            let remaining: Vec<Task> = tasks
                .iter()
                .filter(|t| !placed.contains(&t.id.as_str()))
                .cloned()
                .collect();
            push_bucket(&mut phases, "Additional work", "Remaining tasks", remaining, false);

            if phases.is_empty() {
                return single_phase("Execution", "Execute the tasks", tasks);
            }
            phases
        }
        WorkflowType::SkillLookup | WorkflowType::SingleTask => {
            single_phase("Execution", "Execute the tasks", tasks)
        }
    }
}

/// Phase gating: every task in phase i>0 without explicit blockers is
/// blocked by all task ids of the immediately preceding phase.
fn wire_dependencies(phases: &mut [Phase]) {
    for i in 1..phases.len() {
        let previous_ids: Vec<String> = phases[i - 1].tasks.iter().map(|t| t.id.clone()).collect();
        if previous_ids.is_empty() {
            continue;
        }
        for task in &mut phases[i].tasks {
            if task.blocked_by.is_empty() {
                task.blocked_by = previous_ids.clone();
            }
        }
    }
}
