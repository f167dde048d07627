//! Error taxonomy for the validation pipeline
//!
//! Expected validation outcomes travel as result values
//! ([`crate::result::ValidationResult`]); the types here are reserved for
//! outcomes that stop the pipeline:
//! - environment failure before any level runs ([`DependencyError`])
//! - an orchestrator self-test failure ([`FrameworkError`])
//! - healing exhaustion at levels 2–4
//! - API misuse ([`SequenceError`]), the only error allowed to escape the
//!   orchestrator, because it signals a caller bug rather than a
//!   validation outcome

use crate::result::Level;

/// Umbrella error for everything a pipeline run can surface
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    /// Required external capability absent; never healed or retried
    #[error("dependency check failed: {0}")]
    Dependency(#[from] DependencyError),

    /// Orchestrator self-test failed; indicates an internal defect
    #[error("framework validation failed: {0}")]
    Framework(#[from] FrameworkError),

    /// Level 2 could not be healed within the bound
    #[error("component logic validation failed: {0}")]
    ComponentLogic(#[from] ComponentLogicError),

    /// Level 3 could not be healed within the bound
    #[error("system integration validation failed: {0}")]
    Integration(#[from] SystemIntegrationError),

    /// Level 4 could not be healed within the bound
    #[error("semantic validation failed: {0}")]
    Semantic(#[from] SemanticValidationError),

    /// A level ran past its deadline
    #[error("level {level} timed out after {timeout_secs}s")]
    LevelTimeout {
        /// The level that ran past its deadline
        level: Level,
        /// The configured deadline
        timeout_secs: u64,
    },

    /// Orchestration API misuse; propagates instead of being normalized
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl ValidationError {
    /// Build the level-appropriate terminal error for an unhealed level
    ///
    /// Level 1 never reaches the healing coordinator; its arm exists only
    /// to keep the mapping total.
    #[must_use]
    pub fn level_failure(level: Level, reason: LevelFailureReason) -> Self {
        match level {
            Level::Framework => ValidationError::Framework(FrameworkError {
                failed: 0,
                total: 0,
            }),
            Level::ComponentLogic => ValidationError::ComponentLogic(reason.into()),
            Level::Integration => ValidationError::Integration(reason.into()),
            Level::Semantic => ValidationError::Semantic(reason.into()),
        }
    }

    /// Whether this error is a program-misuse signal rather than a
    /// validation outcome
    #[inline]
    #[must_use]
    pub fn is_sequence_error(&self) -> bool {
        matches!(self, ValidationError::Sequence(_))
    }
}

/// Why a healable level ultimately failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFailureReason {
    /// The level produced blocking failures no healer can attempt
    NotHealable {
        /// Number of non-healable blocking failures
        count: usize,
    },
    /// Healing ran to its bound without a passing re-validation
    HealingExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Blocking failures still present after the last attempt
        unresolved: usize,
    },
}

/// Required external capability absent (pre-flight, fatal)
#[derive(Debug, Clone, thiserror::Error)]
pub enum DependencyError {
    /// The reasoning-service credential is not configured
    #[error("reasoning service credential missing: {0}")]
    MissingCredential(String),

    /// A declared database is not reachable
    #[error("database for component '{component}' unreachable at {address}: {reason}")]
    DatabaseUnreachable {
        /// Component declaring the database
        component: String,
        /// Declared connection address
        address: String,
        /// Probe failure detail
        reason: String,
    },

    /// A dependency probe ran past its deadline
    #[error("dependency probe for {capability} timed out")]
    ProbeTimeout {
        /// Description of the probed capability
        capability: String,
    },
}

/// Orchestrator self-test failure (level 1, fatal, never healed)
#[derive(Debug, Clone, thiserror::Error)]
#[error("{failed}/{total} framework self-tests failing")]
pub struct FrameworkError {
    /// Number of failing self-tests
    pub failed: usize,
    /// Number of self-tests executed
    pub total: usize,
}

/// Level 2 terminal failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComponentLogicError {
    /// Non-healable component defects
    #[error("{count} non-healable component defects")]
    NotHealable {
        /// Number of non-healable blocking failures
        count: usize,
    },
    /// AST healing exhausted its bound
    #[error("AST healing exhausted after {attempts} attempts ({unresolved} unresolved)")]
    HealingExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Blocking failures still present
        unresolved: usize,
    },
}

/// Level 3 terminal failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum SystemIntegrationError {
    /// Non-healable wiring defects
    #[error("{count} non-healable integration defects")]
    NotHealable {
        /// Number of non-healable blocking failures
        count: usize,
    },
    /// Configuration regeneration exhausted its bound
    #[error("configuration regeneration exhausted after {attempts} attempts ({unresolved} unresolved)")]
    HealingExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Blocking failures still present
        unresolved: usize,
    },
}

/// Level 4 terminal failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum SemanticValidationError {
    /// Non-healable semantic incoherence
    #[error("{count} non-healable semantic incoherences")]
    NotHealable {
        /// Number of non-healable blocking failures
        count: usize,
    },
    /// Semantic healing exhausted its bound
    #[error("semantic healing exhausted after {attempts} attempts ({unresolved} unresolved)")]
    HealingExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Blocking failures still present
        unresolved: usize,
    },
}

macro_rules! level_failure_from {
    ($target:ty) => {
        impl From<LevelFailureReason> for $target {
            fn from(reason: LevelFailureReason) -> Self {
                match reason {
                    LevelFailureReason::NotHealable { count } => Self::NotHealable { count },
                    LevelFailureReason::HealingExhausted {
                        attempts,
                        unresolved,
                    } => Self::HealingExhausted {
                        attempts,
                        unresolved,
                    },
                }
            }
        }
    };
}

level_failure_from!(ComponentLogicError);
level_failure_from!(SystemIntegrationError);
level_failure_from!(SemanticValidationError);

/// A level was invoked out of order (caller/integration misuse)
#[derive(Debug, Clone, thiserror::Error)]
pub enum SequenceError {
    /// The predecessor level did not produce a passing result
    #[error("{requested} requires a passing {required} result")]
    PredecessorNotPassed {
        /// The level that was invoked
        requested: Level,
        /// The level that must have passed first
        required: Level,
    },

    /// The wrong predecessor result was supplied
    #[error("{requested} was handed a {supplied} result, expected {required}")]
    WrongPredecessor {
        /// The level that was invoked
        requested: Level,
        /// The level of the supplied result
        supplied: Level,
        /// The level that was expected
        required: Level,
    },

    /// Semantic validation invoked without a confirmed reasoning service
    #[error("semantic validation requires a confirmed reasoning-service dependency")]
    DependencyUnconfirmed,

    /// The pipeline state machine was driven through an illegal transition
    #[error("illegal pipeline transition {from} -> {to}")]
    IllegalTransition {
        /// State the pipeline was in
        from: String,
        /// State that was requested
        to: String,
    },
}
