//! Level 3: system integration validation
//!
//! Validates cross-component wiring against one immutable candidate
//! snapshot: binding resolution, exclusive network-port claims, graph
//! well-formedness (dangling edges, dependency cycles), and live
//! reachability of declared external resources. Healable conflicts (a port
//! collision, a binding resolvable by inference) go to the configuration
//! regenerator, which answers with a complete new blueprint.

use crate::error::ValidationError;
use crate::healing::{ConfigurationRegenerator, HealerError};
use crate::dependency::ReachabilityProbe;
use crate::levels::{require_predecessor, HealableLevel, LevelContext};
use crate::result::{FailureKind, Level, ValidationFailure, ValidationResult};
use async_trait::async_trait;
use forge_blueprint::{BindingSpec, Blueprint, Candidate};
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Level 3 validator
pub struct SystemIntegrationValidator {
    reachability: Arc<dyn ReachabilityProbe>,
    regenerator: Arc<dyn ConfigurationRegenerator>,
    probe_timeout: Duration,
}

impl SystemIntegrationValidator {
    /// Create a validator with its probe and regenerator collaborators
    #[must_use]
    pub fn new(
        reachability: Arc<dyn ReachabilityProbe>,
        regenerator: Arc<dyn ConfigurationRegenerator>,
    ) -> Self {
        Self {
            reachability,
            regenerator,
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// With a per-resource probe deadline
    #[must_use]
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    async fn check_resource(&self, component: &str, address: &str) -> Option<ValidationFailure> {
        let probed =
            tokio::time::timeout(self.probe_timeout, self.reachability.probe(address)).await;
        let reason = match probed {
            Ok(Ok(())) => return None,
            Ok(Err(reason)) => reason,
            Err(_) => format!("probe timed out after {:?}", self.probe_timeout),
        };
        Some(
            ValidationFailure::error(
                FailureKind::ResourceUnreachable,
                format!("declared resource at {address} unreachable: {reason}"),
            )
            .for_component(component),
        )
    }
}

#[async_trait]
impl HealableLevel for SystemIntegrationValidator {
    fn level(&self) -> Level {
        Level::Integration
    }

    async fn validate(
        &self,
        candidate: &Candidate,
        ctx: &LevelContext<'_>,
    ) -> Result<(ValidationResult, Candidate), ValidationError> {
        let started = Instant::now();
        require_predecessor(Level::Integration, ctx.predecessor)?;

        let blueprint = &candidate.blueprint;
        let mut failures = Vec::new();

        for binding in &blueprint.bindings {
            failures.extend(binding_failures(blueprint, binding));
        }
        failures.extend(port_collision_failures(blueprint));
        failures.extend(ordering_failures(blueprint));

        let resource_checks = blueprint.storage_components().filter_map(|component| {
            component
                .storage_connection()
                .map(|address| self.check_resource(&component.name, address))
        });
        failures.extend(join_all(resource_checks).await.into_iter().flatten());

        tracing::debug!(
            bindings = blueprint.bindings.len(),
            failures = failures.len(),
            "integration checks complete"
        );

        let result = ValidationResult::from_failures(Level::Integration, failures, started.elapsed())
            .with_metadata("bindings_checked", serde_json::json!(blueprint.bindings.len()));
        Ok((result, candidate.clone()))
    }

    async fn heal(
        &self,
        candidate: &Candidate,
        failure: &ValidationFailure,
    ) -> Result<Candidate, HealerError> {
        let outcome = self
            .regenerator
            .regenerate(&candidate.blueprint, failure)
            .await?;
        if !outcome.regeneration_successful {
            return Err(HealerError::Rejected(
                outcome
                    .error_message
                    .unwrap_or_else(|| "regenerator reported failure without a reason".to_string()),
            ));
        }
        match outcome.updated_blueprint {
            Some(updated) => {
                tracing::info!(system = %updated.name, "applied regenerated configuration");
                Ok(candidate.with_blueprint(updated))
            }
            None => Err(HealerError::CallFailed(
                "regenerator reported success without a blueprint".to_string(),
            )),
        }
    }
}

fn binding_failures(blueprint: &Blueprint, binding: &BindingSpec) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    let source = blueprint.component(&binding.source.component);
    let target = blueprint.component(&binding.target.component);

    match source {
        None => failures.push(ValidationFailure::error(
            FailureKind::UnresolvedBinding,
            format!("binding '{binding}' names unknown source component"),
        )),
        Some(component) if component.output(&binding.source.port).is_none() => {
            // A missing port on an existing component is inferable when
            // exactly one declared port could have been meant.
            let mut failure = ValidationFailure::error(
                FailureKind::UnresolvedBinding,
                format!(
                    "binding '{binding}' names unknown output port '{}'",
                    binding.source.port
                ),
            )
            .for_component(&component.name);
            if component.outputs.len() == 1 {
                failure = failure.healable();
            }
            failures.push(failure);
        }
        Some(_) => {}
    }

    match target {
        None => failures.push(ValidationFailure::error(
            FailureKind::UnresolvedBinding,
            format!("binding '{binding}' names unknown target component"),
        )),
        Some(component) if component.input(&binding.target.port).is_none() => {
            let mut failure = ValidationFailure::error(
                FailureKind::UnresolvedBinding,
                format!(
                    "binding '{binding}' names unknown input port '{}'",
                    binding.target.port
                ),
            )
            .for_component(&component.name);
            if component.inputs.len() == 1 {
                failure = failure.healable();
            }
            failures.push(failure);
        }
        Some(_) => {}
    }

    failures
}

fn port_collision_failures(blueprint: &Blueprint) -> Vec<ValidationFailure> {
    // BTreeMap keeps the failure batch deterministic across runs.
    let mut claims: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
    for component in &blueprint.components {
        if let Some(port) = component.claimed_network_port() {
            claims.entry(port).or_default().push(&component.name);
        }
    }

    let mut failures = Vec::new();
    for (port, claimants) in claims {
        for claimant in claimants.iter().skip(1) {
            failures.push(
                ValidationFailure::error(
                    FailureKind::PortCollision,
                    format!(
                        "port {port} already claimed by '{}', also claimed by '{claimant}'",
                        claimants[0]
                    ),
                )
                .for_component(*claimant)
                .healable(),
            );
        }
    }
    failures
}

fn ordering_failures(blueprint: &Blueprint) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    let names: HashSet<&str> = blueprint.components.iter().map(|c| c.name.as_str()).collect();
    for component in &blueprint.components {
        for upstream in &component.depends_on {
            if !names.contains(upstream.as_str()) {
                failures.push(
                    ValidationFailure::error(
                        FailureKind::OrderingViolation,
                        format!(
                            "component '{}' depends on undeclared component '{upstream}'",
                            component.name
                        ),
                    )
                    .for_component(&component.name),
                );
            }
        }
    }

    if let Some(cycle_member) = find_cycle_member(blueprint) {
        failures.push(
            ValidationFailure::error(
                FailureKind::OrderingViolation,
                format!("component wiring contains a dependency cycle through '{cycle_member}'"),
            )
            .for_component(cycle_member),
        );
    }

    failures
}

/// DFS cycle detection over binding edges plus declared dependencies
fn find_cycle_member(blueprint: &Blueprint) -> Option<String> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for binding in &blueprint.bindings {
        adjacency
            .entry(binding.source.component.as_str())
            .or_default()
            .push(binding.target.component.as_str());
    }
    for component in &blueprint.components {
        for upstream in &component.depends_on {
            adjacency
                .entry(upstream.as_str())
                .or_default()
                .push(component.name.as_str());
        }
    }

    fn dfs<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, Vec<&'a str>>,
        visiting: &mut HashSet<&'a str>,
        visited: &mut HashSet<&'a str>,
    ) -> Option<&'a str> {
        if visiting.contains(node) {
            return Some(node);
        }
        if visited.contains(node) {
            return None;
        }

        visiting.insert(node);
        if let Some(neighbors) = adjacency.get(node) {
            for neighbor in neighbors {
                if let Some(member) = dfs(neighbor, adjacency, visiting, visited) {
                    return Some(member);
                }
            }
        }
        visiting.remove(node);
        visited.insert(node);
        None
    }

    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    for component in &blueprint.components {
        if let Some(member) = dfs(&component.name, &adjacency, &mut visiting, &mut visited) {
            return Some(member.to_string());
        }
    }
    None
}
