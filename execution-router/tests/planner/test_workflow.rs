//! Workflow selection and phase construction tests

use execution_router::planner::{TaskPlanner, WorkflowType};

use super::common::three_bucket_plan;

#[test]
fn test_parallel_workflow_yields_single_phase() {
    let mut planner = TaskPlanner::new();
    let plan = planner.create_plan(
        "API 만들어 하고 테스트 작성 하고 문서화도 해",
        0.9,
        &["24-spec-driven-planner".to_string()],
        true,
        false,
    );

    assert_eq!(plan.workflow, WorkflowType::Parallel);
    assert_eq!(plan.phases.len(), 1);
    assert_eq!(plan.phases[0].total_tasks(), 3);
    // Parallel tasks carry no blockers.
    assert!(plan.phases[0].tasks.iter().all(|t| t.blocked_by.is_empty()));
}

#[test]
fn test_collaborative_request_plans_sequentially() {
    let mut planner = TaskPlanner::new();
    let plan = planner.create_plan("시스템 설계하고 보안 검토해줘", 0.75, &[], false, true);

    assert_eq!(plan.workflow, WorkflowType::Sequential);
}

#[test]
fn test_spec_driven_builds_three_gated_phases() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);

    assert_eq!(plan.workflow, WorkflowType::SpecDriven);
    assert_eq!(plan.phases.len(), 3);
    assert_eq!(plan.phases[0].name, "Analysis");
    assert_eq!(plan.phases[1].name, "Implementation");
    assert_eq!(plan.phases[2].name, "Verification");

    // Phase-level dependency chain.
    assert!(plan.phases[0].dependencies.is_empty());
    assert_eq!(plan.phases[1].dependencies, vec![plan.phases[0].id.clone()]);
    assert_eq!(plan.phases[2].dependencies, vec![plan.phases[1].id.clone()]);

    // Every task in phase i is blocked by all task ids of phase i-1.
    for i in 1..plan.phases.len() {
        let previous_ids: Vec<String> = plan.phases[i - 1]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        for task in &plan.phases[i].tasks {
            assert_eq!(task.blocked_by, previous_ids);
        }
    }
}

#[test]
fn test_first_phase_tasks_are_immediately_ready() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);

    let ready: Vec<&str> = plan.get_next_tasks().iter().map(|t| t.id.as_str()).collect();
    let first_phase_ids: Vec<&str> = plan.phases[0].tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ready, first_phase_ids);
}

#[test]
fn test_simple_query_workflow_single_phase() {
    let mut planner = TaskPlanner::new();
    let plan = planner.create_plan("LoRA가 뭐야?", 0.1, &["03-fine-tuning".to_string()], false, false);

    assert_eq!(plan.workflow, WorkflowType::SimpleQuery);
    assert_eq!(plan.phases.len(), 1);
    assert_eq!(plan.phases[0].name, "Immediate response");
}

#[test]
fn test_spec_driven_skips_empty_buckets() {
    let mut planner = TaskPlanner::new();
    // Both segments land in the analysis bucket (investigation + research).
    let plan = planner.create_plan("코드 분석 하고 자료 찾아줘", 0.8, &[], false, false);

    assert_eq!(plan.workflow, WorkflowType::SpecDriven);
    let names: Vec<&str> = plan.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Analysis"]);
    assert_eq!(plan.phases[0].total_tasks(), 2);
}

#[test]
fn test_persona_override_applies_to_whole_query() {
    let mut planner = TaskPlanner::new();
    let plan = planner.create_plan("ui 화면 분석 하고 기능 구현", 0.6, &[], false, false);

    // The frontend cue overrides every task's category default.
    assert_eq!(plan.selected_personas, vec!["frontend-developer".to_string()]);
    for task in plan.phases.iter().flat_map(|p| &p.tasks) {
        assert_eq!(task.persona_id.as_deref(), Some("frontend-developer"));
    }
}
