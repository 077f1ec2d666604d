//! Common test utilities for planner tests

use execution_router::planner::{ExecutionPlan, TaskPlanner};

/// A query whose segments span the analysis, implementation, and
/// verification buckets
pub const THREE_BUCKET_QUERY: &str = "코드 분석 하고 기능 구현 하고 통합 테스트 진행";

/// Build a spec-driven plan for the three-bucket query
pub fn three_bucket_plan(planner: &mut TaskPlanner) -> ExecutionPlan {
    planner.create_plan(
        THREE_BUCKET_QUERY,
        0.8,
        &["24-spec-driven-planner".to_string()],
        false,
        false,
    )
}
