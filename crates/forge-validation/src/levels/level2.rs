//! Level 2: component logic validation
//!
//! For every declared component: shape/required-field checks on the
//! declaration itself, then scaffold generation and contract verification
//! through the external component factory. Contract findings that are
//! deterministic, localized code defects are healing candidates for the AST
//! healer; declaration contradictions are not.
//!
//! Per-component checks run concurrently over one immutable candidate
//! snapshot and never short-circuit: the full failure set is collected so
//! healing sees one complete batch.

use crate::error::ValidationError;
use crate::healing::{AstHealer, HealedArtifact, HealerError};
use crate::levels::{require_predecessor, HealableLevel, LevelContext};
use crate::result::{FailureKind, Level, ValidationFailure, ValidationResult};
use async_trait::async_trait;
use forge_blueprint::{Candidate, ComponentSpec, GeneratedComponent, PortSpec};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Faults raised by the component factory collaborator
#[derive(Debug, Clone, thiserror::Error)]
pub enum FactoryError {
    /// Scaffold generation failed outright
    #[error("scaffold failed: {0}")]
    Scaffold(String),

    /// Contract verification could not run
    #[error("contract verification failed: {0}")]
    Verification(String),
}

/// One contract-check finding from the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFinding {
    /// What the generated logic got wrong
    pub message: String,
    /// Whether the defect is deterministic and localized (a wrong field
    /// name, a missing guard) rather than a structural contradiction
    pub localized: bool,
}

/// External generator/verifier for component code (black box)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    /// Generate the component's code artifact from its declaration
    async fn scaffold(&self, spec: &ComponentSpec) -> Result<GeneratedComponent, FactoryError>;

    /// Check the generated logic against the component's stated contract
    async fn verify_contract(
        &self,
        artifact: &GeneratedComponent,
        spec: &ComponentSpec,
    ) -> Result<Vec<ContractFinding>, FactoryError>;
}

/// Level 2 validator
pub struct ComponentLogicValidator {
    factory: Arc<dyn ComponentFactory>,
    healer: Arc<dyn AstHealer>,
}

impl ComponentLogicValidator {
    /// Create a validator with its factory and healer collaborators
    #[must_use]
    pub fn new(factory: Arc<dyn ComponentFactory>, healer: Arc<dyn AstHealer>) -> Self {
        Self { factory, healer }
    }

    async fn check_component(
        &self,
        candidate: &Candidate,
        spec: &ComponentSpec,
    ) -> (Vec<ValidationFailure>, Option<GeneratedComponent>) {
        let mut failures = declaration_failures(spec);
        if !failures.is_empty() {
            return (failures, None);
        }

        // Re-validation after healing must exercise the patched artifact,
        // not a fresh scaffold.
        let artifact = match candidate.artifact(&spec.name) {
            Some(existing) => existing.clone(),
            None => match self.factory.scaffold(spec).await {
                Ok(generated) => generated,
                Err(err) => {
                    failures.push(
                        ValidationFailure::error(FailureKind::CollaboratorFailure, err.to_string())
                            .for_component(&spec.name),
                    );
                    return (failures, None);
                }
            },
        };

        match self.factory.verify_contract(&artifact, spec).await {
            Ok(findings) => {
                for finding in findings {
                    let mut failure =
                        ValidationFailure::error(FailureKind::ContractViolation, finding.message)
                            .for_component(&spec.name);
                    if finding.localized {
                        failure = failure.healable();
                    }
                    failures.push(failure);
                }
            }
            Err(err) => {
                failures.push(
                    ValidationFailure::error(FailureKind::CollaboratorFailure, err.to_string())
                        .for_component(&spec.name),
                );
            }
        }

        (failures, Some(artifact))
    }
}

#[async_trait]
impl HealableLevel for ComponentLogicValidator {
    fn level(&self) -> Level {
        Level::ComponentLogic
    }

    async fn validate(
        &self,
        candidate: &Candidate,
        ctx: &LevelContext<'_>,
    ) -> Result<(ValidationResult, Candidate), ValidationError> {
        let started = Instant::now();
        require_predecessor(Level::ComponentLogic, ctx.predecessor)?;

        let blueprint = &candidate.blueprint;
        if blueprint.components.is_empty() {
            let failure = ValidationFailure::error(
                FailureKind::NoComponents,
                "blueprint declares no components",
            );
            let result =
                ValidationResult::from_failures(Level::ComponentLogic, vec![failure], started.elapsed())
                    .with_metadata("components_checked", serde_json::json!(0));
            return Ok((result, candidate.clone()));
        }

        let mut failures = Vec::new();
        let mut seen = HashSet::new();
        for component in &blueprint.components {
            if !seen.insert(component.name.as_str()) {
                failures.push(
                    ValidationFailure::error(
                        FailureKind::InvalidComponent,
                        format!("duplicate component name '{}'", component.name),
                    )
                    .for_component(&component.name),
                );
            }
        }

        let checks = blueprint
            .components
            .iter()
            .map(|spec| self.check_component(candidate, spec));
        let outcomes = join_all(checks).await;

        let mut next = candidate.clone();
        for (component_failures, artifact) in outcomes {
            failures.extend(component_failures);
            if let Some(artifact) = artifact {
                next = next.with_artifact(artifact);
            }
        }

        tracing::debug!(
            components = blueprint.components.len(),
            failures = failures.len(),
            "component logic checks complete"
        );

        let result =
            ValidationResult::from_failures(Level::ComponentLogic, failures, started.elapsed())
                .with_metadata(
                    "components_checked",
                    serde_json::json!(blueprint.components.len()),
                );
        Ok((result, next))
    }

    async fn heal(
        &self,
        candidate: &Candidate,
        failure: &ValidationFailure,
    ) -> Result<Candidate, HealerError> {
        let component = failure.component.as_deref().ok_or_else(|| {
            HealerError::Rejected("failure carries no component attribution".to_string())
        })?;
        let artifact = candidate.artifact(component).ok_or_else(|| {
            HealerError::Rejected(format!("no generated artifact for component '{component}'"))
        })?;

        let outcome = self.healer.heal_component(artifact, failure).await?;
        if !outcome.healing_successful {
            return Err(HealerError::Rejected(
                outcome
                    .error_message
                    .unwrap_or_else(|| "healer reported failure without a reason".to_string()),
            ));
        }

        match outcome.healed_artifact {
            Some(HealedArtifact::Component(patched)) if patched.component == component => {
                tracing::info!(component, hash = %patched.hash.short(), "applied AST patch");
                Ok(candidate.with_artifact(patched))
            }
            Some(_) => Err(HealerError::CallFailed(
                "AST healer returned an artifact for the wrong target".to_string(),
            )),
            None => Err(HealerError::CallFailed(
                "AST healer reported success without an artifact".to_string(),
            )),
        }
    }
}

fn declaration_failures(spec: &ComponentSpec) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    if spec.name.trim().is_empty() {
        failures.push(ValidationFailure::error(
            FailureKind::InvalidComponent,
            "component has an empty name",
        ));
        return failures;
    }

    for key in spec.kind.required_config_keys() {
        if !spec.config.contains_key(*key) {
            failures.push(
                ValidationFailure::error(
                    FailureKind::MissingConfigField,
                    format!(
                        "component '{}' ({:?}) missing required config '{key}'",
                        spec.name, spec.kind
                    ),
                )
                .for_component(&spec.name),
            );
        }
    }

    for (direction, ports) in [("input", &spec.inputs), ("output", &spec.outputs)] {
        for port in ports {
            failures.extend(port_shape_failures(spec, direction, port));
        }
    }

    failures
}

fn port_shape_failures(
    spec: &ComponentSpec,
    direction: &str,
    port: &PortSpec,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    if port.name.trim().is_empty() {
        failures.push(
            ValidationFailure::error(
                FailureKind::PortShapeMismatch,
                format!("component '{}' declares an unnamed {direction} port", spec.name),
            )
            .for_component(&spec.name),
        );
        return failures;
    }

    let mut seen = HashSet::new();
    for field in &port.fields {
        if field.name.trim().is_empty() {
            failures.push(
                ValidationFailure::error(
                    FailureKind::PortShapeMismatch,
                    format!(
                        "port '{}.{}' declares an unnamed field",
                        spec.name, port.name
                    ),
                )
                .for_component(&spec.name),
            );
        } else if !seen.insert(field.name.as_str()) {
            failures.push(
                ValidationFailure::error(
                    FailureKind::PortShapeMismatch,
                    format!(
                        "port '{}.{}' declares duplicate field '{}'",
                        spec.name, port.name, field.name
                    ),
                )
                .for_component(&spec.name),
            );
        }
    }

    failures
}
