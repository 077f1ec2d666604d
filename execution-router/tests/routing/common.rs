//! Common test utilities for routing tests

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use execution_router::evolution::EvolutionEngine;
use execution_router::models::{ExecutionMode, ExecutionOutcome};
use execution_router::router::HybridRouter;
use execution_router::stores::{DocumentHit, DocumentStore, InMemoryDocumentStore};

/// Document store that never matches anything
pub struct EmptyDocumentStore;

#[async_trait]
impl DocumentStore for EmptyDocumentStore {
    async fn search(&self, _query: &str, _k: usize) -> Vec<DocumentHit> {
        Vec::new()
    }

    fn compressed_index(&self) -> String {
        "id|keywords|description".to_string()
    }
}

/// Router over the default in-memory catalogue
pub fn default_router() -> HybridRouter {
    HybridRouter::new(Arc::new(InMemoryDocumentStore::with_default_catalogue()))
}

/// Router whose document-store fallback finds nothing
pub fn empty_store_router() -> HybridRouter {
    HybridRouter::new(Arc::new(EmptyDocumentStore))
}

/// Engine taught a pattern for the given query by five top-scored feedbacks
pub fn engine_with_learned_pattern(
    query: &str,
    documents: &[&str],
    mode: ExecutionMode,
) -> Arc<RwLock<EvolutionEngine>> {
    let mut engine = EvolutionEngine::new();
    let outcome = ExecutionOutcome {
        query: query.to_string(),
        mode,
        documents_used: documents.iter().map(|d| d.to_string()).collect(),
        personas_used: vec!["backend-developer".to_string()],
    };

    for _ in 0..5 {
        engine
            .record_feedback(&outcome, "worked well", 5)
            .expect("valid score");
    }

    Arc::new(RwLock::new(engine))
}
