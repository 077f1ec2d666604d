//! CLI demo: route a query and optionally expand it into an execution plan.
//!
//! Uses the built-in document catalogue and persona profiles, so it runs
//! without any external collaborators; learned routing state is picked up
//! from (and saved back to) the evolution state file when one exists.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use clap::Parser;

use execution_router::evolution::EvolutionEngine;
use execution_router::planner::TaskPlanner;
use execution_router::router::HybridRouter;
use execution_router::stores::{InMemoryDocumentStore, InMemoryPersonaStore, PersonaStore};

/// Route a natural-language request to an execution strategy
#[derive(Parser, Debug)]
#[command(name = "route-query")]
#[command(about = "Route a natural-language request to an execution strategy")]
#[command(version)]
struct Args {
    /// The query to route
    query: String,

    /// Also expand the decision into an execution plan
    #[arg(long)]
    plan: bool,

    /// Evolution state file
    ///
    /// Defaults to ~/.execution-router/evolution.json.
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let state_path = args
        .state
        .or_else(EvolutionEngine::default_state_path);

    let mut engine = EvolutionEngine::new();
    if let Some(path) = state_path {
        let exists = path.exists();
        engine = engine.with_state_path(path);
        if exists {
            engine.load();
        }
    }
    let evolution = Arc::new(RwLock::new(engine));

    let documents = Arc::new(InMemoryDocumentStore::with_default_catalogue());
    let router = HybridRouter::new(documents).with_evolution(evolution.clone());

    let decision = router.route(&args.query).await;

    println!("{}", decision.summary());
    println!("Reason: {}", decision.reason);

    let personas = InMemoryPersonaStore::with_default_profiles();
    for persona_id in &decision.personas {
        if let Some(profile) = personas.get(persona_id) {
            println!("  {} - {}", profile.id, profile.description);
        }
    }

    if args.plan {
        let complexity = decision.complexity.as_ref();
        let mut planner = TaskPlanner::new();
        let plan = planner.create_plan(
            &args.query,
            complexity.map(|c| c.score).unwrap_or(0.0),
            &decision.documents,
            complexity.map(|c| c.is_parallel).unwrap_or(false),
            complexity.map(|c| c.is_collaborative).unwrap_or(false),
        );

        println!();
        println!("{}", plan.render_summary());
    }

    Ok(())
}
