//! Snapshot persistence, backup, and restore tests

use std::fs;

use execution_router::evolution::persistence::SNAPSHOT_VERSION;
use execution_router::evolution::EvolutionEngine;

use super::common::outcome;

fn temp_state_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("evolution.json")
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);

    let mut engine = EvolutionEngine::new().with_state_path(path.clone());
    engine.record_feedback(&outcome("rag 질문", &["15-rag"]), "good", 5).unwrap();
    engine.record_feedback(&outcome("별로", &["03-fine-tuning"]), "bad", 2).unwrap();
    assert!(engine.is_dirty());
    assert!(engine.save());
    assert!(!engine.is_dirty());

    let mut restored = EvolutionEngine::new().with_state_path(path);
    assert!(restored.load());
    assert_eq!(restored.feedback_log(), engine.feedback_log());
    assert_eq!(restored.stats(), engine.stats());
}

#[test]
fn test_learned_patterns_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);

    let mut engine = EvolutionEngine::new().with_state_path(path.clone());
    for _ in 0..5 {
        engine
            .record_feedback(&outcome("rag 파이프라인 구축", &["15-rag"]), "", 5)
            .unwrap();
    }
    assert!(engine.save());

    let mut restored = EvolutionEngine::new().with_state_path(path);
    assert!(restored.load());
    assert_eq!(restored.patterns(), engine.patterns());

    // The keyword set works after its list round-trip.
    let hint = restored.get_routing_hints("rag 파이프라인 구축");
    assert!(hint.confidence > 0.8);
}

#[test]
fn test_backup_then_clear_then_restore_reproduces_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);

    let mut engine = EvolutionEngine::new().with_state_path(path);
    engine.record_feedback(&outcome("첫 질문", &["15-rag"]), "", 5).unwrap();
    engine.record_feedback(&outcome("둘째 질문", &["15-rag"]), "", 3).unwrap();
    let original_log = engine.feedback_log().to_vec();

    let backup_path = engine.backup().expect("backup written");
    engine.clear();
    assert!(engine.feedback_log().is_empty());

    assert!(engine.restore_from_backup(&backup_path));
    assert_eq!(engine.feedback_log(), original_log.as_slice());
    // Restored state has not been written back to the primary file yet.
    assert!(engine.is_dirty());
}

#[test]
fn test_missing_file_load_fails_without_touching_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = EvolutionEngine::new().with_state_path(temp_state_path(&dir));
    engine.record_feedback(&outcome("질문", &["15-rag"]), "", 4).unwrap();

    assert!(!engine.load());
    assert_eq!(engine.feedback_log().len(), 1);
}

#[test]
fn test_corrupt_file_load_fails_without_touching_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);
    fs::write(&path, "{ not valid json").unwrap();

    let mut engine = EvolutionEngine::new().with_state_path(path);
    engine.record_feedback(&outcome("질문", &["15-rag"]), "", 4).unwrap();

    assert!(!engine.load());
    assert_eq!(engine.feedback_log().len(), 1);
}

#[test]
fn test_unknown_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);

    let mut engine = EvolutionEngine::new().with_state_path(path.clone());
    engine.record_feedback(&outcome("질문", &["15-rag"]), "", 4).unwrap();
    assert!(engine.save());

    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace(&format!("\"{}\"", SNAPSHOT_VERSION), "\"9.9\"");
    fs::write(&path, tampered).unwrap();

    let mut restored = EvolutionEngine::new().with_state_path(path);
    assert!(!restored.load());
    assert!(restored.feedback_log().is_empty());
}

#[test]
fn test_save_without_path_reports_false() {
    let mut engine = EvolutionEngine::new();
    engine.record_feedback(&outcome("질문", &["15-rag"]), "", 4).unwrap();
    assert!(!engine.save());
    assert!(engine.is_dirty());
}

#[test]
fn test_auto_save_persists_each_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_state_path(&dir);

    let mut engine = EvolutionEngine::new()
        .with_state_path(path.clone())
        .with_auto_save(true);
    engine.record_feedback(&outcome("질문", &["15-rag"]), "", 4).unwrap();
    assert!(!engine.is_dirty());

    let mut restored = EvolutionEngine::new().with_state_path(path);
    assert!(restored.load());
    assert_eq!(restored.feedback_log().len(), 1);
}
