//! Run orchestration
//!
//! [`GenerationPipeline`] owns explicitly constructed validator and healer
//! instances (no process-wide singletons) and drives one blueprint through
//! the full sequence: dependency check, level 1, then levels 2–4 under the
//! healing coordinator. Levels are strictly sequential; the run stops at the
//! first unhealed failure and aggregates everything into one
//! [`SystemGenerationResult`].
//!
//! Collaborator faults are converted to terminal results at each boundary;
//! only [`SequenceError`] escapes `run`, because it signals misuse of the
//! orchestration machinery itself rather than a validation outcome.

use crate::coordinator::{HealingCoordinator, LevelFailed, LevelReport};
use crate::state::{self, PipelineState};
use chrono::Utc;
use forge_blueprint::{Blueprint, Candidate};
use forge_validation::{
    AstHealer, ComponentFactory, ComponentLogicValidator, ConfigurationRegenerator,
    CredentialProbe, DependencyChecker, DependencyReport, FrameworkError, FrameworkValidator,
    HealableLevel, ReachabilityProbe, ReasoningService, SemanticHealer, SemanticValidator,
    SequenceError, SystemIntegrationValidator, ValidationError, ValidationResult,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ulid::Ulid;

/// Unique pipeline run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate a new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Hard bound on healing attempts per level per run
    pub max_healing_attempts: u32,
    /// Deadline for one full level (validation plus healing cycles)
    pub level_timeout: Duration,
    /// Deadline for one dependency/resource probe
    pub probe_timeout: Duration,
    /// Deadline for one healing call
    pub healing_timeout: Duration,
}

impl PipelineConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a healing-attempt bound
    #[inline]
    #[must_use]
    pub fn with_max_healing_attempts(mut self, max: u32) -> Self {
        self.max_healing_attempts = max;
        self
    }

    /// With a per-level deadline
    #[inline]
    #[must_use]
    pub fn with_level_timeout(mut self, timeout: Duration) -> Self {
        self.level_timeout = timeout;
        self
    }

    /// With a per-probe deadline
    #[inline]
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// With a per-healing-call deadline
    #[inline]
    #[must_use]
    pub fn with_healing_timeout(mut self, timeout: Duration) -> Self {
        self.healing_timeout = timeout;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_healing_attempts: 2,
            level_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
            healing_timeout: Duration::from_secs(30),
        }
    }
}

/// External collaborators injected at construction time
///
/// Every seam the pipeline blocks on is an explicit trait object supplied
/// here; presence is a construction-time guarantee, never a runtime guess.
pub struct Collaborators {
    /// Component scaffold generator and contract verifier (levels 2)
    pub factory: Arc<dyn ComponentFactory>,
    /// AST healer for localized code defects (level 2)
    pub ast_healer: Arc<dyn AstHealer>,
    /// Configuration regenerator for wiring conflicts (level 3)
    pub regenerator: Arc<dyn ConfigurationRegenerator>,
    /// Blueprint reviser for semantic incoherence (level 4)
    pub semantic_healer: Arc<dyn SemanticHealer>,
    /// Reasoning service for semantic judgment (level 4)
    pub reasoning: Arc<dyn ReasoningService>,
    /// Reasoning-service credential probe (pre-flight)
    pub credential_probe: Arc<dyn CredentialProbe>,
    /// Database/resource reachability probe (pre-flight and level 3)
    pub reachability_probe: Arc<dyn ReachabilityProbe>,
}

/// Aggregated outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemGenerationResult {
    /// Whether the candidate is fit to ship
    pub successful: bool,
    /// The validated candidate system, present on success
    pub generated_system: Option<Candidate>,
    /// Levels that passed before the first terminal failure (0..=4)
    pub validation_levels_passed: u8,
    /// Whether any level needed healing
    pub healing_applied: bool,
    /// Wall-clock time for the whole run
    pub total_execution_time: Duration,
    /// Cause of failure, always present when unsuccessful
    pub error_message: Option<String>,
    /// Per-level timings, attempt counts, and audit payloads
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl SystemGenerationResult {
    /// One-line human-readable status for logs and CLI surfaces
    #[must_use]
    pub fn generation_summary(&self) -> String {
        let status = if self.successful { "succeeded" } else { "failed" };
        let healing = if self.healing_applied {
            ", healing applied"
        } else {
            ""
        };
        match &self.error_message {
            Some(message) => format!(
                "generation {status}: {}/4 levels passed{healing}: {message}",
                self.validation_levels_passed
            ),
            None => format!(
                "generation {status}: {}/4 levels passed{healing}",
                self.validation_levels_passed
            ),
        }
    }
}

/// Outcome of driving one healable level, normalized for aggregation
enum LevelRun {
    Passed {
        result: ValidationResult,
        candidate: Candidate,
        attempts: u32,
    },
    Failed {
        message: String,
        last_result: Option<ValidationResult>,
        attempts: u32,
    },
}

/// The top-level pipeline: sequences levels 1–4 over one blueprint
pub struct GenerationPipeline {
    config: PipelineConfig,
    dependency_checker: DependencyChecker,
    framework: FrameworkValidator,
    component_logic: ComponentLogicValidator,
    integration: SystemIntegrationValidator,
    semantic: SemanticValidator,
    coordinator: HealingCoordinator,
}

impl GenerationPipeline {
    /// Construct a pipeline owning its validators and healers
    #[must_use]
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        let mut framework = FrameworkValidator::new();
        framework.register_check(
            "pipeline_transition_table",
            state::transition_table_self_check,
        );

        let dependency_checker = DependencyChecker::new(
            collaborators.credential_probe,
            Arc::clone(&collaborators.reachability_probe),
        )
        .with_probe_timeout(config.probe_timeout);

        let component_logic =
            ComponentLogicValidator::new(collaborators.factory, collaborators.ast_healer);
        let integration = SystemIntegrationValidator::new(
            collaborators.reachability_probe,
            collaborators.regenerator,
        )
        .with_probe_timeout(config.probe_timeout);
        let semantic = SemanticValidator::new(collaborators.reasoning, collaborators.semantic_healer);

        let coordinator = HealingCoordinator::new(config.max_healing_attempts)
            .with_healing_timeout(config.healing_timeout);

        Self {
            config,
            dependency_checker,
            framework,
            component_logic,
            integration,
            semantic,
            coordinator,
        }
    }

    /// The pipeline configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Drive one blueprint through the full validation sequence
    ///
    /// Every validation outcome, including dependency absence and healing
    /// exhaustion, returns as a
    /// [`SystemGenerationResult`]. The only `Err` is [`SequenceError`],
    /// which indicates misuse of the orchestration machinery itself.
    pub async fn run(&self, blueprint: Blueprint) -> Result<SystemGenerationResult, SequenceError> {
        let run_id = RunId::new();
        let started = Instant::now();
        let mut pipeline_state = PipelineState::Init;
        let mut metadata: IndexMap<String, serde_json::Value> = IndexMap::new();
        metadata.insert("run_id".to_string(), serde_json::json!(run_id.to_string()));
        metadata.insert(
            "started_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );

        tracing::info!(%run_id, system = %blueprint.name, "pipeline run starting");

        // Pre-flight: every required capability must be live before level 1.
        advance(&mut pipeline_state, PipelineState::DependencyCheck)?;
        let dependency_report = match self
            .dependency_checker
            .validate_all_dependencies_configured(&blueprint)
            .await
        {
            Ok(report) => report,
            Err(err) => {
                metadata.insert("first_failing_stage".to_string(), serde_json::json!("dependency_check"));
                advance(&mut pipeline_state, PipelineState::Failed)?;
                let message = ValidationError::from(err).to_string();
                return Ok(failure_result(0, false, message, started, metadata));
            }
        };
        metadata.insert(
            "dependency_status".to_string(),
            serde_json::json!(dependency_report.status_map()),
        );

        // Level 1: framework self-test, never healable.
        advance(&mut pipeline_state, PipelineState::Level1)?;
        let level1 = self.framework.validate_framework_environment();
        record_level(&mut metadata, &level1, 0);
        if !level1.passed {
            let total = level1
                .metadata
                .get("test_count")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(level1.failures.len() as u64) as usize;
            let message = ValidationError::from(FrameworkError {
                failed: level1.failures.len(),
                total,
            })
            .to_string();
            metadata.insert("first_failing_level".to_string(), serde_json::json!(1));
            advance(&mut pipeline_state, PipelineState::Failed)?;
            return Ok(failure_result(0, false, message, started, metadata));
        }

        // Levels 2–4 under the healing coordinator, strictly in order.
        let mut candidate = Candidate::new(blueprint);
        let mut predecessor = level1;
        let mut levels_passed: u8 = 1;
        let mut healing_applied = false;

        let healables: [(&dyn HealableLevel, PipelineState); 3] = [
            (&self.component_logic, PipelineState::Level2),
            (&self.integration, PipelineState::Level3),
            (&self.semantic, PipelineState::Level4),
        ];

        for (level, level_state) in healables {
            advance(&mut pipeline_state, level_state)?;
            let number = level.level().number();
            match self
                .drive_level(level, &candidate, &predecessor, &dependency_report)
                .await?
            {
                LevelRun::Passed {
                    result,
                    candidate: next,
                    attempts,
                } => {
                    record_level(&mut metadata, &result, attempts);
                    healing_applied |= result.healing_applied;
                    levels_passed += 1;
                    candidate = next;
                    predecessor = result;
                }
                LevelRun::Failed {
                    message,
                    last_result,
                    attempts,
                } => {
                    if let Some(result) = &last_result {
                        record_level(&mut metadata, result, attempts);
                        healing_applied |= result.healing_applied;
                    } else {
                        metadata.insert(
                            format!("level{number}_healing_attempts"),
                            serde_json::json!(attempts),
                        );
                    }
                    metadata.insert(
                        "first_failing_level".to_string(),
                        serde_json::json!(number),
                    );
                    advance(&mut pipeline_state, PipelineState::Failed)?;
                    return Ok(failure_result(
                        levels_passed,
                        healing_applied,
                        message,
                        started,
                        metadata,
                    ));
                }
            }
        }

        advance(&mut pipeline_state, PipelineState::Done)?;
        let result = SystemGenerationResult {
            successful: true,
            generated_system: Some(candidate),
            validation_levels_passed: 4,
            healing_applied,
            total_execution_time: started.elapsed(),
            error_message: None,
            metadata,
        };
        tracing::info!(%run_id, summary = %result.generation_summary(), "pipeline run finished");
        Ok(result)
    }

    async fn drive_level(
        &self,
        level: &dyn HealableLevel,
        candidate: &Candidate,
        predecessor: &ValidationResult,
        dependencies: &DependencyReport,
    ) -> Result<LevelRun, SequenceError> {
        let driven = tokio::time::timeout(
            self.config.level_timeout,
            self.coordinator
                .drive(level, candidate.clone(), predecessor, dependencies),
        )
        .await;

        match driven {
            Err(_) => Ok(LevelRun::Failed {
                message: ValidationError::LevelTimeout {
                    level: level.level(),
                    timeout_secs: self.config.level_timeout.as_secs(),
                }
                .to_string(),
                last_result: None,
                attempts: 0,
            }),
            Ok(Ok(LevelReport {
                result,
                candidate,
                attempts,
            })) => Ok(LevelRun::Passed {
                result,
                candidate,
                attempts,
            }),
            Ok(Err(LevelFailed {
                error,
                last_result,
                attempts,
            })) => match error {
                ValidationError::Sequence(sequence) => Err(sequence),
                other => Ok(LevelRun::Failed {
                    message: other.to_string(),
                    last_result,
                    attempts,
                }),
            },
        }
    }
}

fn advance(state: &mut PipelineState, to: PipelineState) -> Result<(), SequenceError> {
    state::validate_transition(*state, to)?;
    tracing::debug!(from = %state, to = %to, "pipeline transition");
    *state = to;
    Ok(())
}

fn record_level(
    metadata: &mut IndexMap<String, serde_json::Value>,
    result: &ValidationResult,
    attempts: u32,
) {
    let number = result.level.number();
    metadata.insert(
        format!("level{number}_execution_time_ms"),
        serde_json::json!(result.execution_time.as_millis() as u64),
    );
    metadata.insert(
        format!("level{number}_healing_attempts"),
        serde_json::json!(attempts),
    );
    metadata.insert(
        format!("level{number}_result"),
        serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
    );
}

fn failure_result(
    validation_levels_passed: u8,
    healing_applied: bool,
    error_message: String,
    started: Instant,
    metadata: IndexMap<String, serde_json::Value>,
) -> SystemGenerationResult {
    let result = SystemGenerationResult {
        successful: false,
        generated_system: None,
        validation_levels_passed,
        healing_applied,
        total_execution_time: started.elapsed(),
        error_message: Some(error_message),
        metadata,
    };
    tracing::warn!(summary = %result.generation_summary(), "pipeline run failed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_success_shape() {
        let result = SystemGenerationResult {
            successful: true,
            generated_system: None,
            validation_levels_passed: 4,
            healing_applied: true,
            total_execution_time: Duration::from_millis(5),
            error_message: None,
            metadata: IndexMap::new(),
        };
        assert_eq!(
            result.generation_summary(),
            "generation succeeded: 4/4 levels passed, healing applied"
        );
    }

    #[test]
    fn summary_reports_failure_cause() {
        let result = SystemGenerationResult {
            successful: false,
            generated_system: None,
            validation_levels_passed: 1,
            healing_applied: false,
            total_execution_time: Duration::from_millis(5),
            error_message: Some("component logic validation failed: 1 non-healable component defects".to_string()),
            metadata: IndexMap::new(),
        };
        let summary = result.generation_summary();
        assert!(summary.starts_with("generation failed: 1/4 levels passed"));
        assert!(summary.contains("non-healable"));
    }

    #[test]
    fn config_builders() {
        let config = PipelineConfig::new()
            .with_max_healing_attempts(3)
            .with_level_timeout(Duration::from_secs(10))
            .with_probe_timeout(Duration::from_secs(1))
            .with_healing_timeout(Duration::from_secs(2));

        assert_eq!(config.max_healing_attempts, 3);
        assert_eq!(config.level_timeout, Duration::from_secs(10));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
