//! Testing utilities for the Forge workspace
//!
//! Scripted collaborator implementations and blueprint fixtures shared by
//! unit and integration tests. These are test doubles only; the pipeline
//! itself never falls back to them.

#![allow(missing_docs)]

use async_trait::async_trait;
use forge_blueprint::{
    BindingSpec, Blueprint, ComponentKind, ComponentSpec, GeneratedComponent, PortRef, PortSpec,
};
use forge_validation::{
    AstHealer, ComponentFactory, ConfigurationRegenerator, ContractFinding, CredentialProbe,
    FactoryError, HealedArtifact, HealerError, HealingResult, HealingType, ReachabilityProbe,
    ReasoningError, ReasoningService, RegenerationResult, SemanticAssessment, SemanticHealer,
    ValidationFailure,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, Once};

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging once per process (RUST_LOG-driven)
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Marker planted into defective scaffolds and removed by the patching healer
pub const DEFECT_MARKER: &str = "order_idd";
const DEFECT_FIX: &str = "order_id";

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Scripted component factory
///
/// Generates a trivial artifact per component. Optionally plants a localized
/// defect (a wrong output-field name) into one named component's scaffold;
/// contract verification flags the defect for as long as the marker is
/// present, so an applied patch makes re-validation pass.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    defect_component: Option<String>,
    structural_component: Option<String>,
    scaffolds: AtomicU32,
}

impl ScriptedFactory {
    pub fn clean() -> Self {
        Self::default()
    }

    /// Plant a healable output-field typo into `component`'s scaffold
    pub fn with_localized_defect(component: impl Into<String>) -> Self {
        Self {
            defect_component: Some(component.into()),
            ..Self::default()
        }
    }

    /// Plant a non-healable structural contradiction into `component`
    pub fn with_structural_defect(component: impl Into<String>) -> Self {
        Self {
            structural_component: Some(component.into()),
            ..Self::default()
        }
    }

    pub fn scaffold_count(&self) -> u32 {
        self.scaffolds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComponentFactory for ScriptedFactory {
    async fn scaffold(&self, spec: &ComponentSpec) -> Result<GeneratedComponent, FactoryError> {
        self.scaffolds.fetch_add(1, Ordering::SeqCst);
        let field = if self.defect_component.as_deref() == Some(spec.name.as_str()) {
            DEFECT_MARKER
        } else {
            DEFECT_FIX
        };
        let source = format!("fn {}() {{ emit(\"{field}\"); }}", spec.name.replace('-', "_"));
        Ok(GeneratedComponent::new(&spec.name, source))
    }

    async fn verify_contract(
        &self,
        artifact: &GeneratedComponent,
        spec: &ComponentSpec,
    ) -> Result<Vec<ContractFinding>, FactoryError> {
        let mut findings = Vec::new();
        if artifact.source.contains(DEFECT_MARKER) {
            findings.push(ContractFinding {
                message: format!(
                    "output field '{DEFECT_MARKER}' not declared by '{}' (expected '{DEFECT_FIX}')",
                    spec.name
                ),
                localized: true,
            });
        }
        if self.structural_component.as_deref() == Some(spec.name.as_str()) {
            findings.push(ContractFinding {
                message: format!(
                    "component '{}' contract contradicts its declared shape",
                    spec.name
                ),
                localized: false,
            });
        }
        Ok(findings)
    }
}

// ---------------------------------------------------------------------------
// Healers
// ---------------------------------------------------------------------------

/// AST healer that rewrites the planted defect marker into the fixed field
#[derive(Debug, Default)]
pub struct PatchingAstHealer {
    calls: AtomicU32,
}

impl PatchingAstHealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AstHealer for PatchingAstHealer {
    async fn heal_component(
        &self,
        artifact: &GeneratedComponent,
        _failure: &ValidationFailure,
    ) -> Result<HealingResult, HealerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !artifact.source.contains(DEFECT_MARKER) {
            return Err(HealerError::Rejected(
                "artifact carries no recognizable defect".to_string(),
            ));
        }
        let patched = artifact.with_source(artifact.source.replace(DEFECT_MARKER, DEFECT_FIX));
        Ok(
            HealingResult::success(HealingType::AstHealing, HealedArtifact::Component(patched))
                .with_detail("replaced", json!(DEFECT_MARKER)),
        )
    }
}

/// AST healer that always declines
#[derive(Debug, Default)]
pub struct RejectingAstHealer;

#[async_trait]
impl AstHealer for RejectingAstHealer {
    async fn heal_component(
        &self,
        _artifact: &GeneratedComponent,
        _failure: &ValidationFailure,
    ) -> Result<HealingResult, HealerError> {
        Ok(HealingResult::failure(
            HealingType::AstHealing,
            "no patch available",
        ))
    }
}

/// Regenerator that reassigns the colliding component's network port
#[derive(Debug, Default)]
pub struct PortReassigningRegenerator {
    calls: AtomicU32,
}

impl PortReassigningRegenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigurationRegenerator for PortReassigningRegenerator {
    async fn regenerate(
        &self,
        blueprint: &Blueprint,
        failure: &ValidationFailure,
    ) -> Result<RegenerationResult, HealerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let component = failure
            .component
            .as_deref()
            .and_then(|name| blueprint.component(name))
            .ok_or_else(|| HealerError::Rejected("failure names no known component".to_string()))?;
        let port = component
            .claimed_network_port()
            .ok_or_else(|| HealerError::Rejected("component claims no port".to_string()))?;

        let taken: Vec<u64> = blueprint
            .components
            .iter()
            .filter_map(ComponentSpec::claimed_network_port)
            .collect();
        let mut reassigned = port + 1;
        while taken.contains(&reassigned) {
            reassigned += 1;
        }

        let patched = component.clone().with_config("port", json!(reassigned));
        Ok(
            RegenerationResult::success(blueprint.replacing_component(patched))
                .with_detail("reassigned_port", json!(reassigned)),
        )
    }
}

/// Regenerator that never produces a new blueprint
#[derive(Debug, Default)]
pub struct StalledRegenerator;

#[async_trait]
impl ConfigurationRegenerator for StalledRegenerator {
    async fn regenerate(
        &self,
        _blueprint: &Blueprint,
        _failure: &ValidationFailure,
    ) -> Result<RegenerationResult, HealerError> {
        Ok(RegenerationResult::failure("no viable rewiring found"))
    }
}

/// Semantic healer that appends a clarifying revision note to the intent
///
/// Whether the revision resolves anything is decided by the scripted
/// reasoning service, which makes exhaustion scenarios easy to stage.
#[derive(Debug, Default)]
pub struct IntentRevisingSemanticHealer {
    calls: AtomicU32,
}

impl IntentRevisingSemanticHealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticHealer for IntentRevisingSemanticHealer {
    async fn heal_blueprint(
        &self,
        blueprint: &Blueprint,
        incoherence: &ValidationFailure,
    ) -> Result<HealingResult, HealerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut revised = blueprint.clone();
        revised.intent = format!("{} [revised: {}]", blueprint.intent, incoherence.message);
        Ok(HealingResult::success(
            HealingType::SemanticHealing,
            HealedArtifact::Blueprint(revised),
        ))
    }
}

// ---------------------------------------------------------------------------
// Reasoning service
// ---------------------------------------------------------------------------

/// Reasoning service that replays a scripted assessment sequence
///
/// Returns queued assessments in order, repeating the last one once the
/// queue drains.
pub struct ScriptedReasoningService {
    queue: Mutex<VecDeque<SemanticAssessment>>,
    last: Mutex<SemanticAssessment>,
}

impl ScriptedReasoningService {
    pub fn replaying(assessments: Vec<SemanticAssessment>) -> Self {
        let last = assessments
            .last()
            .cloned()
            .unwrap_or_else(SemanticAssessment::coherent);
        Self {
            queue: Mutex::new(assessments.into()),
            last: Mutex::new(last),
        }
    }

    /// Always judges the system coherent
    pub fn always_coherent() -> Self {
        Self::replaying(vec![SemanticAssessment::coherent()])
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoningService {
    async fn assess(&self, _blueprint: &Blueprint) -> Result<SemanticAssessment, ReasoningError> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| ReasoningError::CallFailed("assessment queue poisoned".to_string()))?;
        match queue.pop_front() {
            Some(assessment) => {
                let mut last = self
                    .last
                    .lock()
                    .map_err(|_| ReasoningError::CallFailed("assessment queue poisoned".to_string()))?;
                *last = assessment.clone();
                Ok(assessment)
            }
            None => Ok(self
                .last
                .lock()
                .map_err(|_| ReasoningError::CallFailed("assessment queue poisoned".to_string()))?
                .clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// Credential probe with a fixed verdict
#[derive(Debug, Clone)]
pub struct StaticCredentialProbe {
    present: bool,
    var: String,
}

impl StaticCredentialProbe {
    pub fn present() -> Self {
        Self {
            present: true,
            var: "REASONING_SERVICE_API_KEY".to_string(),
        }
    }

    pub fn missing() -> Self {
        Self {
            present: false,
            var: "REASONING_SERVICE_API_KEY".to_string(),
        }
    }
}

#[async_trait]
impl CredentialProbe for StaticCredentialProbe {
    async fn probe(&self) -> Result<(), String> {
        if self.present {
            Ok(())
        } else {
            Err(format!("{} is not set", self.var))
        }
    }

    fn describe(&self) -> String {
        self.var.clone()
    }
}

/// Reachability probe with a fixed verdict
#[derive(Debug, Clone)]
pub struct StaticReachabilityProbe {
    reachable: bool,
}

impl StaticReachabilityProbe {
    pub fn reachable() -> Self {
        Self { reachable: true }
    }

    pub fn unreachable() -> Self {
        Self { reachable: false }
    }
}

#[async_trait]
impl ReachabilityProbe for StaticReachabilityProbe {
    async fn probe(&self, address: &str) -> Result<(), String> {
        if self.reachable {
            Ok(())
        } else {
            Err(format!("connect to {address} refused"))
        }
    }
}

// ---------------------------------------------------------------------------
// Blueprint fixtures
// ---------------------------------------------------------------------------

/// A well-formed source → transform → endpoint blueprint
pub fn wired_blueprint() -> Blueprint {
    Blueprint::new("orders", "ingest orders, enrich them, serve them over http")
        .with_component(
            ComponentSpec::new("ingest", ComponentKind::Source)
                .with_output(PortSpec::new("events").with_field("order_id", "string")),
        )
        .with_component(
            ComponentSpec::new("enrich", ComponentKind::Transform)
                .with_input(PortSpec::new("raw").with_field("order_id", "string"))
                .with_output(PortSpec::new("enriched").with_field("order_id", "string")),
        )
        .with_component(
            ComponentSpec::new("api", ComponentKind::Endpoint)
                .with_config("port", json!(8080))
                .with_input(PortSpec::new("data").with_field("order_id", "string")),
        )
        .with_binding(BindingSpec::new(
            PortRef::new("ingest", "events"),
            PortRef::new("enrich", "raw"),
        ))
        .with_binding(BindingSpec::new(
            PortRef::new("enrich", "enriched"),
            PortRef::new("api", "data"),
        ))
}

/// A blueprint with zero components
pub fn empty_blueprint() -> Blueprint {
    Blueprint::new("hollow", "a system that declares nothing")
}

/// A blueprint whose two endpoints claim the same network port
pub fn colliding_ports_blueprint() -> Blueprint {
    Blueprint::new("collide", "serve two apis")
        .with_component(
            ComponentSpec::new("api-a", ComponentKind::Endpoint).with_config("port", json!(8080)),
        )
        .with_component(
            ComponentSpec::new("api-b", ComponentKind::Endpoint).with_config("port", json!(8080)),
        )
}
