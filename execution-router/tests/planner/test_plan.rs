//! Plan identity, caching, and scheduling tests

use chrono::Local;
use execution_router::planner::{TaskPlanner, TaskStatus};

use super::common::{three_bucket_plan, THREE_BUCKET_QUERY};

#[test]
fn test_identical_inputs_at_identical_instant_share_id() {
    let mut planner = TaskPlanner::new();
    let created_at = Local::now();
    let docs = vec!["15-rag".to_string()];

    let first = planner.create_plan_at("rag 시스템 구축", 0.7, &docs, false, false, created_at);
    let second = planner.create_plan_at("rag 시스템 구축", 0.7, &docs, false, false, created_at);

    assert_eq!(first.id, second.id);
}

#[test]
fn test_different_queries_get_different_ids() {
    let mut planner = TaskPlanner::new();
    let created_at = Local::now();

    let first = planner.create_plan_at("rag 시스템 구축", 0.7, &[], false, false, created_at);
    let second = planner.create_plan_at("api 서버 구축", 0.7, &[], false, false, created_at);

    assert_ne!(first.id, second.id);
}

#[test]
fn test_created_plan_is_cached() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);

    let cached = planner.plan(&plan.id).expect("plan is cached");
    assert_eq!(cached.query, THREE_BUCKET_QUERY);
    assert!(planner.plan("plan-missing").is_none());
}

#[test]
fn test_cache_capacity_evicts_oldest() {
    let mut planner = TaskPlanner::with_cache_capacity(2);
    let created_at = Local::now();

    let first = planner.create_plan_at("첫번째 작업", 0.3, &[], false, false, created_at);
    let second = planner.create_plan_at("두번째 작업", 0.3, &[], false, false, created_at);
    let third = planner.create_plan_at("세번째 작업", 0.3, &[], false, false, created_at);

    assert_eq!(planner.cached_plans(), 2);
    assert!(planner.plan(&first.id).is_none());
    assert!(planner.plan(&second.id).is_some());
    assert!(planner.plan(&third.id).is_some());
}

#[test]
fn test_status_updates_through_cache_unblock_tasks() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);

    let cached = planner.plan_mut(&plan.id).unwrap();
    let first_id = cached.get_next_tasks()[0].id.clone();
    assert!(cached.set_task_status(&first_id, TaskStatus::Completed));

    let next: Vec<String> = cached
        .get_next_tasks()
        .iter()
        .map(|t| t.id.clone())
        .collect();
    assert!(!next.contains(&first_id));
    assert!(!next.is_empty());
}

#[test]
fn test_estimated_minutes_sums_task_estimates() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);

    // investigation 10 + implementation 30 + testing 15
    assert_eq!(plan.estimated_minutes, 55);

    let summed: u32 = plan
        .phases
        .iter()
        .flat_map(|p| &p.tasks)
        .map(|t| t.estimated_minutes)
        .sum();
    assert_eq!(plan.estimated_minutes, summed);
}

#[test]
fn test_render_summary_mentions_phases_and_personas() {
    let mut planner = TaskPlanner::new();
    let plan = three_bucket_plan(&mut planner);
    let summary = plan.render_summary();

    assert!(summary.contains(&plan.id));
    assert!(summary.contains("## Phases"));
    assert!(summary.contains("Analysis"));
    assert!(summary.contains("## Personas"));
}
