//! Level 4: semantic validation
//!
//! Judges holistic coherence that no structural check can catch: does the
//! assembled system plausibly match its stated natural-language intent. The
//! oracle is an external reasoning service whose availability was confirmed
//! by the pre-flight dependency check; it is never probed lazily here.
//! Because the oracle is inherently probabilistic, its verdicts are always
//! blocking once healing is exhausted.

use crate::error::{SequenceError, ValidationError};
use crate::healing::{HealedArtifact, HealerError, SemanticHealer};
use crate::levels::{require_predecessor, HealableLevel, LevelContext};
use crate::result::{FailureKind, Level, ValidationFailure, ValidationResult};
use async_trait::async_trait;
use forge_blueprint::{Blueprint, Candidate};
use std::sync::Arc;
use std::time::Instant;

/// Faults raised by the reasoning-service collaborator
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReasoningError {
    /// The service call itself failed (transport, quota, malformed reply)
    #[error("reasoning service call failed: {0}")]
    CallFailed(String),
}

/// One incoherence reported by the reasoning service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticFinding {
    /// What is incoherent about the assembled system
    pub description: String,
    /// Component the finding centers on, if the service named one
    pub component: Option<String>,
    /// Whether the service believes a blueprint revision can resolve it
    pub healable: bool,
}

/// The reasoning service's overall judgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticAssessment {
    /// Whether the system coheres with its stated intent
    pub coherent: bool,
    /// Specific incoherences, empty when coherent
    pub findings: Vec<SemanticFinding>,
}

impl SemanticAssessment {
    /// A fully coherent assessment
    #[must_use]
    pub fn coherent() -> Self {
        Self {
            coherent: true,
            findings: Vec::new(),
        }
    }

    /// An incoherent assessment with findings
    #[must_use]
    pub fn incoherent(findings: Vec<SemanticFinding>) -> Self {
        Self {
            coherent: false,
            findings,
        }
    }
}

/// External reasoning service used for semantic judgment (black box)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Assess whether the blueprint's assembled behavior matches its intent
    async fn assess(&self, blueprint: &Blueprint) -> Result<SemanticAssessment, ReasoningError>;
}

/// Level 4 validator
pub struct SemanticValidator {
    reasoning: Arc<dyn ReasoningService>,
    healer: Arc<dyn SemanticHealer>,
}

impl SemanticValidator {
    /// Create a validator with its reasoning and healer collaborators
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningService>, healer: Arc<dyn SemanticHealer>) -> Self {
        Self { reasoning, healer }
    }
}

#[async_trait]
impl HealableLevel for SemanticValidator {
    fn level(&self) -> Level {
        Level::Semantic
    }

    async fn validate(
        &self,
        candidate: &Candidate,
        ctx: &LevelContext<'_>,
    ) -> Result<(ValidationResult, Candidate), ValidationError> {
        let started = Instant::now();
        require_predecessor(Level::Semantic, ctx.predecessor)?;
        if !ctx.dependencies.confirms_reasoning_service() {
            return Err(SequenceError::DependencyUnconfirmed.into());
        }

        let failures = match self.reasoning.assess(&candidate.blueprint).await {
            Ok(assessment) if assessment.coherent => Vec::new(),
            Ok(assessment) => assessment
                .findings
                .into_iter()
                .map(|finding| {
                    let mut failure = ValidationFailure::error(
                        FailureKind::SemanticIncoherence,
                        finding.description,
                    );
                    if let Some(component) = finding.component {
                        failure = failure.for_component(component);
                    }
                    if finding.healable {
                        failure = failure.healable();
                    }
                    failure
                })
                .collect(),
            // Collaborator faults are converted at the level boundary, never
            // allowed to escape as raw errors.
            Err(err) => vec![ValidationFailure::error(
                FailureKind::CollaboratorFailure,
                err.to_string(),
            )],
        };

        tracing::debug!(failures = failures.len(), "semantic assessment complete");

        let result = ValidationResult::from_failures(Level::Semantic, failures, started.elapsed())
            .with_metadata("intent", serde_json::json!(candidate.blueprint.intent.clone()));
        Ok((result, candidate.clone()))
    }

    async fn heal(
        &self,
        candidate: &Candidate,
        failure: &ValidationFailure,
    ) -> Result<Candidate, HealerError> {
        let outcome = self
            .healer
            .heal_blueprint(&candidate.blueprint, failure)
            .await?;
        if !outcome.healing_successful {
            return Err(HealerError::Rejected(
                outcome
                    .error_message
                    .unwrap_or_else(|| "healer reported failure without a reason".to_string()),
            ));
        }
        match outcome.healed_artifact {
            Some(HealedArtifact::Blueprint(revised)) => {
                tracing::info!(system = %revised.name, "applied semantic revision");
                Ok(candidate.with_blueprint(revised))
            }
            Some(HealedArtifact::Component(_)) => Err(HealerError::CallFailed(
                "semantic healer returned component code instead of a blueprint".to_string(),
            )),
            None => Err(HealerError::CallFailed(
                "semantic healer reported success without an artifact".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{Capability, DependencyReport, DependencyStatus};
    use crate::healing::{HealingResult, HealingType, MockSemanticHealer};
    use crate::result::Severity;
    use std::time::Duration;

    fn confirmed_dependencies() -> DependencyReport {
        DependencyReport::from_statuses(vec![DependencyStatus {
            capability: Capability::ReasoningService,
            available: true,
            detail: "live".to_string(),
        }])
    }

    fn passing_level3() -> ValidationResult {
        ValidationResult::passing(Level::Integration, Duration::ZERO)
    }

    fn candidate() -> Candidate {
        Candidate::new(Blueprint::new("sys", "collect events and archive them"))
    }

    #[tokio::test]
    async fn coherent_assessment_passes() {
        let mut reasoning = MockReasoningService::new();
        reasoning
            .expect_assess()
            .returning(|_| Ok(SemanticAssessment::coherent()));
        let v = SemanticValidator::new(Arc::new(reasoning), Arc::new(MockSemanticHealer::new()));

        let level3 = passing_level3();
        let deps = confirmed_dependencies();
        let (result, _) = v
            .validate(
                &candidate(),
                &LevelContext {
                    predecessor: &level3,
                    dependencies: &deps,
                },
            )
            .await
            .unwrap();

        assert!(result.passed);
    }

    #[tokio::test]
    async fn unconfirmed_reasoning_dependency_is_misuse() {
        let v = SemanticValidator::new(
            Arc::new(MockReasoningService::new()),
            Arc::new(MockSemanticHealer::new()),
        );
        let level3 = passing_level3();
        let deps = DependencyReport::default();

        let err = v
            .validate(
                &candidate(),
                &LevelContext {
                    predecessor: &level3,
                    dependencies: &deps,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_sequence_error());
    }

    #[tokio::test]
    async fn findings_map_to_incoherence_failures() {
        let mut reasoning = MockReasoningService::new();
        reasoning.expect_assess().returning(|_| {
            Ok(SemanticAssessment::incoherent(vec![SemanticFinding {
                description: "sink 'archive' has no upstream producer".to_string(),
                component: Some("archive".to_string()),
                healable: true,
            }]))
        });
        let v = SemanticValidator::new(Arc::new(reasoning), Arc::new(MockSemanticHealer::new()));

        let level3 = passing_level3();
        let deps = confirmed_dependencies();
        let (result, _) = v
            .validate(
                &candidate(),
                &LevelContext {
                    predecessor: &level3,
                    dependencies: &deps,
                },
            )
            .await
            .unwrap();

        assert!(!result.passed);
        let failure = &result.failures[0];
        assert_eq!(failure.kind, FailureKind::SemanticIncoherence);
        assert_eq!(failure.severity, Severity::Error);
        assert!(failure.healing_candidate);
        assert_eq!(failure.component.as_deref(), Some("archive"));
    }

    #[tokio::test]
    async fn service_fault_is_converted_not_propagated() {
        let mut reasoning = MockReasoningService::new();
        reasoning
            .expect_assess()
            .returning(|_| Err(ReasoningError::CallFailed("quota exhausted".to_string())));
        let v = SemanticValidator::new(Arc::new(reasoning), Arc::new(MockSemanticHealer::new()));

        let level3 = passing_level3();
        let deps = confirmed_dependencies();
        let (result, _) = v
            .validate(
                &candidate(),
                &LevelContext {
                    predecessor: &level3,
                    dependencies: &deps,
                },
            )
            .await
            .unwrap();

        assert!(!result.passed);
        assert_eq!(result.failures[0].kind, FailureKind::CollaboratorFailure);
        assert!(!result.failures[0].healing_candidate);
    }

    #[tokio::test]
    async fn heal_applies_revised_blueprint() {
        let mut healer = MockSemanticHealer::new();
        healer.expect_heal_blueprint().returning(|blueprint, _| {
            let mut revised = blueprint.clone();
            revised.intent = format!("{} (revised)", blueprint.intent);
            Ok(HealingResult::success(
                HealingType::SemanticHealing,
                HealedArtifact::Blueprint(revised),
            ))
        });
        let v = SemanticValidator::new(Arc::new(MockReasoningService::new()), Arc::new(healer));

        let failure =
            ValidationFailure::error(FailureKind::SemanticIncoherence, "dangling sink").healable();
        let healed = v.heal(&candidate(), &failure).await.unwrap();
        assert!(healed.blueprint.intent.ends_with("(revised)"));
    }
}
