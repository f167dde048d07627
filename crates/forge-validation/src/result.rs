//! Validation result model
//!
//! Shared result/failure types used by every validation level:
//! - [`ValidationFailure`]: one finding, immutable once created
//! - [`ValidationResult`]: the outcome of one level execution
//! - [`FrameworkTestResult`]: the level-1 self-test battery outcome
//!
//! The result invariant is enforced at construction: a result is `passed`
//! exactly when none of its failures carry `Severity::Error`.

use crate::healing::HealingType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Failure severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Blocks the level from passing
    Error,
    /// Reported but does not block
    Warning,
    /// Informational only
    Info,
}

/// The four escalating validation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Level 1: framework self-test
    Framework,
    /// Level 2: per-component generated logic
    ComponentLogic,
    /// Level 3: cross-component wiring and live integration
    Integration,
    /// Level 4: holistic coherence against stated intent
    Semantic,
}

impl Level {
    /// Numeric level (1..=4)
    #[inline]
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Level::Framework => 1,
            Level::ComponentLogic => 2,
            Level::Integration => 3,
            Level::Semantic => 4,
        }
    }

    /// The healing strategy for failures at this level
    ///
    /// Level 1 is never healable: a broken framework is an orchestrator
    /// defect, not a fixable blueprint.
    #[inline]
    #[must_use]
    pub fn healing_type(&self) -> Option<HealingType> {
        match self {
            Level::Framework => None,
            Level::ComponentLogic => Some(HealingType::AstHealing),
            Level::Integration => Some(HealingType::ConfigurationRegeneration),
            Level::Semantic => Some(HealingType::SemanticHealing),
        }
    }

    /// The level that must have passed before this one may run
    #[inline]
    #[must_use]
    pub fn predecessor(&self) -> Option<Level> {
        match self {
            Level::Framework => None,
            Level::ComponentLogic => Some(Level::Framework),
            Level::Integration => Some(Level::ComponentLogic),
            Level::Semantic => Some(Level::Integration),
        }
    }

    /// All levels in execution order
    #[must_use]
    pub fn all() -> [Level; 4] {
        [
            Level::Framework,
            Level::ComponentLogic,
            Level::Integration,
            Level::Semantic,
        ]
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.number())
    }
}

/// Failure classification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// A framework self-test failed
    FrameworkTest,
    /// The blueprint declares no components at all
    NoComponents,
    /// Component declaration is malformed (empty name, duplicate name)
    InvalidComponent,
    /// A kind-mandated configuration key is absent
    MissingConfigField,
    /// A declared port shape is malformed
    PortShapeMismatch,
    /// Generated logic violates the component's stated contract
    ContractViolation,
    /// A binding endpoint does not resolve to a component/port
    UnresolvedBinding,
    /// Two components claim the same exclusive network port
    PortCollision,
    /// Declared ordering dependencies are unsatisfied or cyclic
    OrderingViolation,
    /// A declared external resource is not reachable
    ResourceUnreachable,
    /// The assembled system does not match its stated intent
    SemanticIncoherence,
    /// An external collaborator call failed outright
    CollaboratorFailure,
    /// A healing call exceeded its deadline
    HealingTimeout,
}

/// One validation finding
///
/// Immutable once created; construct through [`ValidationFailure::error`] /
/// [`ValidationFailure::warning`] and the builder methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Component the finding is attached to, if any
    pub component: Option<String>,
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
    /// Whether this failure is a deterministic, localized defect that a
    /// healer can attempt to repair
    pub healing_candidate: bool,
    /// Severity of the finding
    pub severity: Severity,
}

impl ValidationFailure {
    /// Create an error-severity failure (non-healable by default)
    #[must_use]
    pub fn error(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            component: None,
            kind,
            message: message.into(),
            healing_candidate: false,
            severity: Severity::Error,
        }
    }

    /// Create a warning-severity failure
    #[must_use]
    pub fn warning(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            component: None,
            kind,
            message: message.into(),
            healing_candidate: false,
            severity: Severity::Warning,
        }
    }

    /// Attach the failure to a component
    #[must_use]
    pub fn for_component(mut self, name: impl Into<String>) -> Self {
        self.component = Some(name.into());
        self
    }

    /// Mark the failure as a healing candidate
    #[must_use]
    pub fn healable(mut self) -> Self {
        self.healing_candidate = true;
        self
    }

    /// Whether this failure blocks the level
    #[inline]
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of one validation level execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the level passed
    pub passed: bool,
    /// Which level produced this result
    pub level: Level,
    /// Findings, in discovery order
    pub failures: Vec<ValidationFailure>,
    /// Whether healing contributed to this result
    pub healing_applied: bool,
    /// Wall-clock time the level spent
    pub execution_time: Duration,
    /// Open metadata for aggregation and audit
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl ValidationResult {
    /// Build a result from the collected failures
    ///
    /// `passed` is derived, never supplied: a result passes exactly when no
    /// failure carries `Severity::Error`.
    #[must_use]
    pub fn from_failures(
        level: Level,
        failures: Vec<ValidationFailure>,
        execution_time: Duration,
    ) -> Self {
        let passed = !failures.iter().any(ValidationFailure::is_blocking);
        Self {
            passed,
            level,
            failures,
            healing_applied: false,
            execution_time,
            metadata: IndexMap::new(),
        }
    }

    /// A passing result with no findings
    #[must_use]
    pub fn passing(level: Level, execution_time: Duration) -> Self {
        Self::from_failures(level, Vec::new(), execution_time)
    }

    /// Mark that healing contributed to this result
    #[must_use]
    pub fn with_healing_applied(mut self) -> Self {
        self.healing_applied = true;
        self
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Blocking failures only
    pub fn blocking_failures(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.failures.iter().filter(|f| f.is_blocking())
    }

    /// Blocking failures a healer may attempt
    pub fn healable_failures(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.blocking_failures().filter(|f| f.healing_candidate)
    }

    /// Whether any blocking failure is beyond healing
    #[must_use]
    pub fn has_unhealable_errors(&self) -> bool {
        self.blocking_failures().any(|f| !f.healing_candidate)
    }
}

/// Outcome of the level-1 self-test battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkTestResult {
    /// Whether every self-test passed
    pub all_passed: bool,
    /// Number of self-tests executed
    pub test_count: usize,
    /// Names/messages of failing self-tests
    pub failures: Vec<String>,
    /// Wall-clock time the battery spent
    pub execution_time: Duration,
}

impl FrameworkTestResult {
    /// Fraction of self-tests that passed
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.test_count == 0 {
            return 0.0;
        }
        (self.test_count - self.failures.len()) as f64 / self.test_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_numbers_and_order() {
        let numbers: Vec<u8> = Level::all().iter().map(Level::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn healing_type_mapping_is_fixed() {
        assert_eq!(Level::Framework.healing_type(), None);
        assert_eq!(
            Level::ComponentLogic.healing_type(),
            Some(HealingType::AstHealing)
        );
        assert_eq!(
            Level::Integration.healing_type(),
            Some(HealingType::ConfigurationRegeneration)
        );
        assert_eq!(Level::Semantic.healing_type(), Some(HealingType::SemanticHealing));
    }

    #[test]
    fn predecessors_form_a_chain() {
        assert_eq!(Level::Framework.predecessor(), None);
        assert_eq!(Level::Semantic.predecessor(), Some(Level::Integration));
    }

    #[test]
    fn passed_iff_no_error_failures() {
        let warn = ValidationFailure::warning(FailureKind::ContractViolation, "minor drift");
        let result =
            ValidationResult::from_failures(Level::ComponentLogic, vec![warn], Duration::ZERO);
        assert!(result.passed);

        let err = ValidationFailure::error(FailureKind::ContractViolation, "wrong field");
        let result =
            ValidationResult::from_failures(Level::ComponentLogic, vec![err], Duration::ZERO);
        assert!(!result.passed);
    }

    #[test]
    fn healable_failures_excludes_non_candidates() {
        let healable = ValidationFailure::error(FailureKind::ContractViolation, "typo")
            .healable()
            .for_component("api");
        let structural = ValidationFailure::error(FailureKind::NoComponents, "empty");

        let result = ValidationResult::from_failures(
            Level::ComponentLogic,
            vec![healable, structural],
            Duration::ZERO,
        );

        assert_eq!(result.healable_failures().count(), 1);
        assert!(result.has_unhealable_errors());
    }

    #[test]
    fn framework_success_rate() {
        let result = FrameworkTestResult {
            all_passed: false,
            test_count: 4,
            failures: vec!["serde".into()],
            execution_time: Duration::from_millis(3),
        };
        assert!((result.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn result_serialization_round_trip() {
        let result = ValidationResult::passing(Level::Integration, Duration::from_millis(12))
            .with_metadata("bindings_checked", serde_json::json!(3));
        let json = serde_json::to_string(&result).unwrap();
        let back: ValidationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
