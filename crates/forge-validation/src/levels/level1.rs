//! Level 1: framework self-test
//!
//! Validates the orchestrator's own machinery before any blueprint check
//! runs: core type construction, result serialization, the failure/severity
//! invariant, the fixed healing-type mapping, and dependency-checker
//! instantiation. A failure here indicates an orchestrator defect, not a
//! fixable blueprint, so every finding is marked non-healable and the
//! pipeline aborts.

use crate::dependency::DependencyChecker;
use crate::probes::{EnvCredentialProbe, TcpReachabilityProbe};
use crate::result::{
    FailureKind, FrameworkTestResult, Level, Severity, ValidationFailure, ValidationResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

type CheckFn = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Level 1 validator: a fixed battery of orchestrator self-tests
pub struct FrameworkValidator {
    extra_checks: Vec<(String, CheckFn)>,
}

impl FrameworkValidator {
    /// Create a validator with the built-in battery
    #[must_use]
    pub fn new() -> Self {
        Self {
            extra_checks: Vec::new(),
        }
    }

    /// Register an additional self-test
    ///
    /// Higher layers register checks for machinery this crate cannot see
    /// (the pipeline state machine registers its transition-table check).
    pub fn register_check(
        &mut self,
        name: impl Into<String>,
        check: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.extra_checks.push((name.into(), Box::new(check)));
    }

    /// Execute the self-test battery
    pub fn run_framework_tests(&self) -> FrameworkTestResult {
        let started = Instant::now();
        let mut test_count = 0usize;
        let mut failures = Vec::new();

        let built_in: [(&str, fn() -> Result<(), String>); 5] = [
            ("core_type_construction", check_core_type_construction),
            ("result_serialization", check_result_serialization),
            ("severity_invariant", check_severity_invariant),
            ("healing_type_mapping", check_healing_type_mapping),
            ("dependency_checker_construction", check_dependency_checker),
        ];

        for (name, check) in built_in {
            test_count += 1;
            if let Err(reason) = check() {
                failures.push(format!("{name}: {reason}"));
            }
        }

        for (name, check) in &self.extra_checks {
            test_count += 1;
            if let Err(reason) = check() {
                failures.push(format!("{name}: {reason}"));
            }
        }

        let result = FrameworkTestResult {
            all_passed: failures.is_empty(),
            test_count,
            failures,
            execution_time: started.elapsed(),
        };
        tracing::debug!(
            test_count = result.test_count,
            success_rate = result.success_rate(),
            "framework self-tests complete"
        );
        result
    }

    /// Run the battery and wrap it as a level result
    ///
    /// Every failing self-test maps to a non-healable error failure,
    /// unconditionally.
    pub fn validate_framework_environment(&self) -> ValidationResult {
        let tests = self.run_framework_tests();
        let failures = tests
            .failures
            .iter()
            .map(|message| ValidationFailure::error(FailureKind::FrameworkTest, message.clone()))
            .collect();

        ValidationResult::from_failures(Level::Framework, failures, tests.execution_time)
            .with_metadata("test_count", serde_json::json!(tests.test_count))
            .with_metadata("success_rate", serde_json::json!(tests.success_rate()))
    }
}

impl Default for FrameworkValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_core_type_construction() -> Result<(), String> {
    let failure = ValidationFailure::error(FailureKind::FrameworkTest, "probe").for_component("c");
    if failure.severity != Severity::Error {
        return Err("error constructor produced wrong severity".to_string());
    }
    if failure.component.as_deref() != Some("c") {
        return Err("component attribution lost".to_string());
    }
    Ok(())
}

fn check_result_serialization() -> Result<(), String> {
    let result = ValidationResult::passing(Level::Framework, Duration::from_millis(1));
    let json = serde_json::to_string(&result).map_err(|e| e.to_string())?;
    let back: ValidationResult = serde_json::from_str(&json).map_err(|e| e.to_string())?;
    if back != result {
        return Err("serialization round-trip altered the result".to_string());
    }
    Ok(())
}

fn check_severity_invariant() -> Result<(), String> {
    let warned = ValidationResult::from_failures(
        Level::Framework,
        vec![ValidationFailure::warning(FailureKind::FrameworkTest, "w")],
        Duration::ZERO,
    );
    let errored = ValidationResult::from_failures(
        Level::Framework,
        vec![ValidationFailure::error(FailureKind::FrameworkTest, "e")],
        Duration::ZERO,
    );
    if !warned.passed || errored.passed {
        return Err("passed flag does not track error severity".to_string());
    }
    Ok(())
}

fn check_healing_type_mapping() -> Result<(), String> {
    if Level::Framework.healing_type().is_some() {
        return Err("level 1 must not be healable".to_string());
    }
    for level in [Level::ComponentLogic, Level::Integration, Level::Semantic] {
        if level.healing_type().is_none() {
            return Err(format!("{level} lost its healing type"));
        }
    }
    Ok(())
}

fn check_dependency_checker() -> Result<(), String> {
    let checker = DependencyChecker::new(
        Arc::new(EnvCredentialProbe::reasoning_service()),
        Arc::new(TcpReachabilityProbe::new()),
    );
    let required = checker.required_capabilities(&forge_blueprint::Blueprint::new("probe", ""));
    if required.is_empty() {
        return Err("checker derived no capabilities for a minimal blueprint".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_battery_passes() {
        let validator = FrameworkValidator::new();
        let tests = validator.run_framework_tests();

        assert!(tests.all_passed, "failures: {:?}", tests.failures);
        assert_eq!(tests.test_count, 5);
        assert!((tests.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn environment_validation_passes_on_healthy_framework() {
        let validator = FrameworkValidator::new();
        let result = validator.validate_framework_environment();

        assert!(result.passed);
        assert_eq!(result.level, Level::Framework);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn registered_failure_maps_to_non_healable_error() {
        let mut validator = FrameworkValidator::new();
        validator.register_check("injected", || Err("simulated defect".to_string()));

        let result = validator.validate_framework_environment();

        assert!(!result.passed);
        let failure = &result.failures[0];
        assert_eq!(failure.kind, FailureKind::FrameworkTest);
        assert!(!failure.healing_candidate);
        assert!(failure.message.contains("injected"));
    }

    #[test]
    fn registered_checks_extend_the_battery() {
        let mut validator = FrameworkValidator::new();
        validator.register_check("extra_ok", || Ok(()));

        let tests = validator.run_framework_tests();
        assert_eq!(tests.test_count, 6);
        assert!(tests.all_passed);
    }
}
