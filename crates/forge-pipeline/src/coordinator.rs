//! Healing coordinator
//!
//! The bounded-retry loop shared by levels 2–4. One invocation drives a
//! single level to a verdict:
//!
//! 1. run the level's full check set against the current candidate snapshot
//! 2. passed → done
//! 3. any non-healable blocking failure → escalate immediately, no healing
//! 4. otherwise heal the complete failure batch (each call bounded by the
//!    healing timeout), derive the next snapshot, and re-validate from
//!    scratch, never a resumption mid-check
//!
//! The loop is a plain counted loop with early exit on success. Attempts are
//! hard-bounded: exceeding `max_attempts` is always an explicitly reported
//! failure, never a silent pass-through. A healing call that times out or is
//! declined leaves its failure in place; the failure resurfaces at the next
//! re-validation and the bound still applies.

use forge_blueprint::Candidate;
use forge_validation::{
    DependencyReport, HealableLevel, LevelContext, LevelFailureReason, ValidationError,
    ValidationFailure, ValidationResult,
};
use std::time::Duration;

/// Outcome of a successfully driven level
#[derive(Debug, Clone)]
pub struct LevelReport {
    /// The passing (post-healing) result
    pub result: ValidationResult,
    /// The candidate snapshot the next level should validate
    pub candidate: Candidate,
    /// Healing attempts consumed
    pub attempts: u32,
}

/// Terminal failure of a driven level
#[derive(Debug)]
pub struct LevelFailed {
    /// The normalized error for this level
    pub error: ValidationError,
    /// The last failing result, when validation itself completed
    pub last_result: Option<ValidationResult>,
    /// Healing attempts consumed before giving up
    pub attempts: u32,
}

/// Generic bounded-retry healing loop shared by levels 2–4
#[derive(Debug, Clone)]
pub struct HealingCoordinator {
    max_attempts: u32,
    healing_timeout: Duration,
}

impl HealingCoordinator {
    /// Create a coordinator with the given attempt bound
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            healing_timeout: Duration::from_secs(30),
        }
    }

    /// With a per-healing-call deadline
    #[must_use]
    pub fn with_healing_timeout(mut self, healing_timeout: Duration) -> Self {
        self.healing_timeout = healing_timeout;
        self
    }

    /// The configured attempt bound
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Drive one level to a verdict
    pub async fn drive(
        &self,
        level: &dyn HealableLevel,
        candidate: Candidate,
        predecessor: &ValidationResult,
        dependencies: &DependencyReport,
    ) -> Result<LevelReport, LevelFailed> {
        let mut attempts = 0u32;
        let mut healing_applied = false;
        let mut current = candidate;

        loop {
            let ctx = LevelContext {
                predecessor,
                dependencies,
            };
            // Always a fresh, full re-run against the new snapshot.
            let (mut result, next) = match level.validate(&current, &ctx).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    return Err(LevelFailed {
                        error,
                        last_result: None,
                        attempts,
                    })
                }
            };
            current = next;
            if healing_applied {
                result = result.with_healing_applied();
            }

            if result.passed {
                tracing::info!(level = %level.level(), attempts, "level passed");
                return Ok(LevelReport {
                    result,
                    candidate: current,
                    attempts,
                });
            }

            if result.has_unhealable_errors() {
                let count = result
                    .blocking_failures()
                    .filter(|f| !f.healing_candidate)
                    .count();
                tracing::warn!(level = %level.level(), count, "non-healable failures, escalating");
                return Err(LevelFailed {
                    error: ValidationError::level_failure(
                        level.level(),
                        LevelFailureReason::NotHealable { count },
                    ),
                    last_result: Some(result),
                    attempts,
                });
            }

            if attempts >= self.max_attempts {
                let unresolved = result.blocking_failures().count();
                tracing::warn!(
                    level = %level.level(),
                    attempts,
                    unresolved,
                    "healing bound exhausted"
                );
                return Err(LevelFailed {
                    error: ValidationError::level_failure(
                        level.level(),
                        LevelFailureReason::HealingExhausted {
                            attempts,
                            unresolved,
                        },
                    ),
                    last_result: Some(result),
                    attempts,
                });
            }

            attempts += 1;
            let batch: Vec<ValidationFailure> = result.healable_failures().cloned().collect();
            tracing::info!(
                level = %level.level(),
                attempt = attempts,
                batch = batch.len(),
                "healing failure batch"
            );
            let (next, any_healed) = self.heal_batch(level, current.clone(), &batch).await;
            current = next;
            healing_applied |= any_healed;
        }
    }

    /// Heal every failure in the batch, folding the candidate forward
    ///
    /// A call that times out or is declined leaves the candidate unchanged
    /// for that failure; the attempt is still consumed by the outer loop.
    async fn heal_batch(
        &self,
        level: &dyn HealableLevel,
        mut candidate: Candidate,
        batch: &[ValidationFailure],
    ) -> (Candidate, bool) {
        let mut any_healed = false;
        for failure in batch {
            match tokio::time::timeout(self.healing_timeout, level.heal(&candidate, failure)).await
            {
                Ok(Ok(healed)) => {
                    candidate = healed;
                    any_healed = true;
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        level = %level.level(),
                        component = failure.component.as_deref().unwrap_or("<none>"),
                        error = %err,
                        "healing call failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        level = %level.level(),
                        component = failure.component.as_deref().unwrap_or("<none>"),
                        timeout = ?self.healing_timeout,
                        "healing call timed out"
                    );
                }
            }
        }
        (candidate, any_healed)
    }
}

impl Default for HealingCoordinator {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forge_blueprint::Blueprint;
    use forge_validation::{
        FailureKind, HealerError, Level, SequenceError, ValidationFailure, ValidationResult,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration as StdDuration;

    /// Scripted level: carries `defects` sequential defects; validation
    /// fails until each has been healed away, one per successful heal call.
    struct ScriptedLevel {
        validations: AtomicU32,
        heals: AtomicU32,
        defects: u32,
        healable: bool,
        heal_succeeds: bool,
        heal_delay: Option<StdDuration>,
    }

    impl ScriptedLevel {
        fn new(defects: u32) -> Self {
            Self {
                validations: AtomicU32::new(0),
                heals: AtomicU32::new(0),
                defects,
                healable: true,
                heal_succeeds: true,
                heal_delay: None,
            }
        }

        fn non_healable(mut self) -> Self {
            self.healable = false;
            self
        }

        fn heal_never_lands(mut self) -> Self {
            self.heal_succeeds = false;
            self
        }

        fn slow_heal(mut self, delay: StdDuration) -> Self {
            self.heal_delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl HealableLevel for ScriptedLevel {
        fn level(&self) -> Level {
            Level::ComponentLogic
        }

        async fn validate(
            &self,
            candidate: &Candidate,
            _ctx: &LevelContext<'_>,
        ) -> Result<(ValidationResult, Candidate), ValidationError> {
            self.validations.fetch_add(1, Ordering::SeqCst);
            let still_failing = self.heals.load(Ordering::SeqCst) < self.defects;
            let failures = if still_failing {
                let mut failure =
                    ValidationFailure::error(FailureKind::ContractViolation, "scripted defect")
                        .for_component("worker");
                if self.healable {
                    failure = failure.healable();
                }
                vec![failure]
            } else {
                vec![]
            };
            Ok((
                ValidationResult::from_failures(
                    Level::ComponentLogic,
                    failures,
                    StdDuration::ZERO,
                ),
                candidate.clone(),
            ))
        }

        async fn heal(
            &self,
            candidate: &Candidate,
            _failure: &ValidationFailure,
        ) -> Result<Candidate, HealerError> {
            if let Some(delay) = self.heal_delay {
                tokio::time::sleep(delay).await;
            }
            if !self.heal_succeeds {
                return Err(HealerError::Rejected("scripted rejection".to_string()));
            }
            self.heals.fetch_add(1, Ordering::SeqCst);
            Ok(candidate.clone())
        }
    }

    fn candidate() -> Candidate {
        Candidate::new(Blueprint::new("sys", "scripted"))
    }

    fn predecessor() -> ValidationResult {
        ValidationResult::passing(Level::Framework, StdDuration::ZERO)
    }

    #[tokio::test]
    async fn passing_level_needs_no_healing() {
        let level = ScriptedLevel::new(0);
        let coordinator = HealingCoordinator::default();

        let report = coordinator
            .drive(&level, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap();

        assert!(report.result.passed);
        assert_eq!(report.attempts, 0);
        assert!(!report.result.healing_applied);
    }

    #[tokio::test]
    async fn one_heal_cycle_recovers() {
        let level = ScriptedLevel::new(1);
        let coordinator = HealingCoordinator::default();

        let report = coordinator
            .drive(&level, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap();

        assert!(report.result.passed);
        assert_eq!(report.attempts, 1);
        assert!(report.result.healing_applied);
        assert_eq!(level.validations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_healable_escalates_without_healing() {
        let level = ScriptedLevel::new(1).non_healable();
        let coordinator = HealingCoordinator::default();

        let failed = coordinator
            .drive(&level, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap_err();

        assert_eq!(failed.attempts, 0);
        assert_eq!(level.heals.load(Ordering::SeqCst), 0);
        assert!(failed.error.to_string().contains("non-healable"));
        assert!(failed.last_result.is_some());
    }

    #[tokio::test]
    async fn exhaustion_is_reported_at_the_bound() {
        let level = ScriptedLevel::new(10).heal_never_lands();
        let coordinator = HealingCoordinator::new(2);

        let failed = coordinator
            .drive(&level, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap_err();

        assert_eq!(failed.attempts, 2);
        assert!(failed.error.to_string().contains("exhausted after 2 attempts"));
        // initial validation + one re-validation per attempt
        assert_eq!(level.validations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_heal_call_consumes_the_attempt() {
        let level = ScriptedLevel::new(10).slow_heal(StdDuration::from_secs(120));
        let coordinator = HealingCoordinator::new(1).with_healing_timeout(StdDuration::from_secs(1));

        let failed = coordinator
            .drive(&level, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap_err();

        assert_eq!(failed.attempts, 1);
        assert_eq!(level.heals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sequence_error_passes_through() {
        struct MisusedLevel;

        #[async_trait]
        impl HealableLevel for MisusedLevel {
            fn level(&self) -> Level {
                Level::Integration
            }

            async fn validate(
                &self,
                _candidate: &Candidate,
                _ctx: &LevelContext<'_>,
            ) -> Result<(ValidationResult, Candidate), ValidationError> {
                Err(SequenceError::PredecessorNotPassed {
                    requested: Level::Integration,
                    required: Level::ComponentLogic,
                }
                .into())
            }

            async fn heal(
                &self,
                _candidate: &Candidate,
                _failure: &ValidationFailure,
            ) -> Result<Candidate, HealerError> {
                Err(HealerError::Rejected("unreachable".to_string()))
            }
        }

        let coordinator = HealingCoordinator::default();
        let failed = coordinator
            .drive(&MisusedLevel, candidate(), &predecessor(), &DependencyReport::default())
            .await
            .unwrap_err();

        assert!(failed.error.is_sequence_error());
    }
}
