//! End-to-end pipeline scenarios
//!
//! Each test drives one blueprint through the full sequence with scripted
//! collaborators and asserts the aggregated outcome: levels passed, healing
//! applied, and the failure message a caller would branch on.

use forge_pipeline::{Collaborators, GenerationPipeline, PipelineConfig};
use forge_test_utils::{
    colliding_ports_blueprint, empty_blueprint, init_test_logging, wired_blueprint,
    IntentRevisingSemanticHealer, PatchingAstHealer, PortReassigningRegenerator,
    ScriptedFactory, ScriptedReasoningService, StaticCredentialProbe, StaticReachabilityProbe,
};
use forge_validation::{SemanticAssessment, SemanticFinding};
use std::sync::Arc;

fn clean_collaborators() -> Collaborators {
    Collaborators {
        factory: Arc::new(ScriptedFactory::clean()),
        ast_healer: Arc::new(PatchingAstHealer::new()),
        regenerator: Arc::new(PortReassigningRegenerator::new()),
        semantic_healer: Arc::new(IntentRevisingSemanticHealer::new()),
        reasoning: Arc::new(ScriptedReasoningService::always_coherent()),
        credential_probe: Arc::new(StaticCredentialProbe::present()),
        reachability_probe: Arc::new(StaticReachabilityProbe::reachable()),
    }
}

fn pipeline(collaborators: Collaborators) -> GenerationPipeline {
    init_test_logging();
    GenerationPipeline::new(PipelineConfig::new(), collaborators)
}

fn dangling_sink_finding() -> SemanticFinding {
    SemanticFinding {
        description: "sink 'archive' has no upstream producer".to_string(),
        component: Some("archive".to_string()),
        healable: true,
    }
}

#[tokio::test]
async fn flawless_blueprint_passes_all_four_levels() {
    let pipeline = pipeline(clean_collaborators());

    let result = pipeline.run(wired_blueprint()).await.unwrap();

    assert!(result.successful, "summary: {}", result.generation_summary());
    assert_eq!(result.validation_levels_passed, 4);
    assert!(!result.healing_applied);
    assert!(result.error_message.is_none());
    assert!(result.generated_system.is_some());

    // The audit trail carries per-level timings and attempt counts.
    for level in 1..=4u8 {
        assert!(result
            .metadata
            .contains_key(&format!("level{level}_execution_time_ms")));
        assert!(result
            .metadata
            .contains_key(&format!("level{level}_healing_attempts")));
    }
}

#[tokio::test]
async fn empty_blueprint_stops_at_level_two() {
    let pipeline = pipeline(clean_collaborators());

    let result = pipeline.run(empty_blueprint()).await.unwrap();

    assert!(!result.successful);
    assert_eq!(result.validation_levels_passed, 1);
    assert!(!result.healing_applied);
    let message = result.error_message.as_deref().unwrap();
    assert!(message.contains("non-healable"), "message: {message}");
    assert_eq!(
        result.metadata.get("first_failing_level"),
        Some(&serde_json::json!(2))
    );
}

#[tokio::test]
async fn healable_field_typo_is_patched_and_the_run_succeeds() {
    let healer = Arc::new(PatchingAstHealer::new());
    let collaborators = Collaborators {
        factory: Arc::new(ScriptedFactory::with_localized_defect("enrich")),
        ast_healer: healer.clone(),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let result = pipeline.run(wired_blueprint()).await.unwrap();

    assert!(result.successful, "summary: {}", result.generation_summary());
    assert_eq!(result.validation_levels_passed, 4);
    assert!(result.healing_applied);
    assert_eq!(healer.call_count(), 1);
    assert_eq!(
        result.metadata.get("level2_healing_attempts"),
        Some(&serde_json::json!(1))
    );
}

#[tokio::test]
async fn port_collision_is_regenerated_and_the_run_succeeds() {
    let regenerator = Arc::new(PortReassigningRegenerator::new());
    let collaborators = Collaborators {
        regenerator: regenerator.clone(),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let result = pipeline.run(colliding_ports_blueprint()).await.unwrap();

    assert!(result.successful, "summary: {}", result.generation_summary());
    assert!(result.healing_applied);
    assert_eq!(regenerator.call_count(), 1);

    // The shipped candidate carries the regenerated blueprint, not the
    // original conflicting one.
    let shipped = result.generated_system.unwrap();
    let ports: Vec<_> = shipped
        .blueprint
        .components
        .iter()
        .filter_map(|c| c.claimed_network_port())
        .collect();
    assert_eq!(ports.len(), 2);
    assert_ne!(ports[0], ports[1]);
}

#[tokio::test]
async fn missing_reasoning_credential_fails_before_any_level() {
    let collaborators = Collaborators {
        credential_probe: Arc::new(StaticCredentialProbe::missing()),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let result = pipeline.run(wired_blueprint()).await.unwrap();

    assert!(!result.successful);
    assert_eq!(result.validation_levels_passed, 0);
    let message = result.error_message.as_deref().unwrap();
    assert!(
        message.contains("REASONING_SERVICE_API_KEY"),
        "message: {message}"
    );
    // Fail-fast: no level ever produced a result.
    for level in 1..=4u8 {
        assert!(!result
            .metadata
            .contains_key(&format!("level{level}_result")));
    }
}

#[tokio::test]
async fn unresolved_semantic_incoherence_exhausts_healing() {
    let healer = Arc::new(IntentRevisingSemanticHealer::new());
    let collaborators = Collaborators {
        semantic_healer: healer.clone(),
        reasoning: Arc::new(ScriptedReasoningService::replaying(vec![
            SemanticAssessment::incoherent(vec![dangling_sink_finding()]),
        ])),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let result = pipeline.run(wired_blueprint()).await.unwrap();

    assert!(!result.successful);
    assert_eq!(result.validation_levels_passed, 3);
    let message = result.error_message.as_deref().unwrap();
    assert!(
        message.contains("semantic healing exhausted after 2 attempts"),
        "message: {message}"
    );
    assert_eq!(healer.call_count(), 2);
    assert_eq!(
        result.metadata.get("level4_healing_attempts"),
        Some(&serde_json::json!(2))
    );
    assert_eq!(
        result.metadata.get("first_failing_level"),
        Some(&serde_json::json!(4))
    );
}

#[tokio::test]
async fn semantic_incoherence_resolved_by_one_revision_succeeds() {
    let collaborators = Collaborators {
        reasoning: Arc::new(ScriptedReasoningService::replaying(vec![
            SemanticAssessment::incoherent(vec![dangling_sink_finding()]),
            SemanticAssessment::coherent(),
        ])),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let result = pipeline.run(wired_blueprint()).await.unwrap();

    assert!(result.successful, "summary: {}", result.generation_summary());
    assert!(result.healing_applied);
    assert_eq!(result.validation_levels_passed, 4);
}

#[tokio::test]
async fn unchanged_blueprint_reruns_identically() {
    let first = pipeline(clean_collaborators())
        .run(wired_blueprint())
        .await
        .unwrap();
    let second = pipeline(clean_collaborators())
        .run(wired_blueprint())
        .await
        .unwrap();

    assert_eq!(first.successful, second.successful);
    assert_eq!(
        first.validation_levels_passed,
        second.validation_levels_passed
    );
    assert_eq!(first.healing_applied, second.healing_applied);
}

#[tokio::test]
async fn unreachable_database_fails_the_dependency_check() {
    let collaborators = Collaborators {
        reachability_probe: Arc::new(StaticReachabilityProbe::unreachable()),
        ..clean_collaborators()
    };
    let pipeline = pipeline(collaborators);

    let blueprint = wired_blueprint().with_component(
        forge_blueprint::ComponentSpec::new("archive-db", forge_blueprint::ComponentKind::Store)
            .with_config("connection", serde_json::json!("db.internal:5432")),
    );
    let result = pipeline.run(blueprint).await.unwrap();

    assert!(!result.successful);
    assert_eq!(result.validation_levels_passed, 0);
    assert!(result
        .error_message
        .as_deref()
        .unwrap()
        .contains("unreachable"));
}

#[tokio::test]
async fn summary_line_reflects_the_outcome() {
    let result = pipeline(clean_collaborators())
        .run(wired_blueprint())
        .await
        .unwrap();
    assert_eq!(
        result.generation_summary(),
        "generation succeeded: 4/4 levels passed"
    );
}
