//! The four validation levels
//!
//! Level 1 is a self-test of the pipeline itself and is never healable.
//! Levels 2–4 implement [`HealableLevel`], the explicit validate/heal
//! interface the healing coordinator drives. Presence of these operations is
//! a construction-time guarantee, never a runtime capability guess.

pub mod level1;
pub mod level2;
pub mod level3;
pub mod level4;

use crate::dependency::DependencyReport;
use crate::error::{SequenceError, ValidationError};
use crate::healing::HealerError;
use crate::result::{Level, ValidationFailure, ValidationResult};
use async_trait::async_trait;
use forge_blueprint::Candidate;

pub use level1::FrameworkValidator;
pub use level2::{ComponentFactory, ComponentLogicValidator, ContractFinding, FactoryError};
pub use level3::SystemIntegrationValidator;
pub use level4::{ReasoningError, ReasoningService, SemanticAssessment, SemanticFinding, SemanticValidator};

/// Per-run context handed to a level validation
///
/// Groups the predecessor result and the pre-flight dependency report so
/// levels can enforce their sequencing contracts without reaching into
/// orchestrator state.
pub struct LevelContext<'a> {
    /// The immediately preceding level's result
    pub predecessor: &'a ValidationResult,
    /// Read-only dependency statuses computed before level 1
    pub dependencies: &'a DependencyReport,
}

/// A validation level the healing coordinator can drive
#[async_trait]
pub trait HealableLevel: Send + Sync {
    /// Which level this validator implements
    fn level(&self) -> Level;

    /// Run the full check set against one immutable candidate snapshot
    ///
    /// Returns the level result plus the (possibly enriched) candidate:
    /// level 2 attaches generated artifacts, levels 3 and 4 pass the
    /// snapshot through unchanged.
    async fn validate(
        &self,
        candidate: &Candidate,
        ctx: &LevelContext<'_>,
    ) -> Result<(ValidationResult, Candidate), ValidationError>;

    /// Attempt to repair one failure, deriving a new candidate snapshot
    async fn heal(
        &self,
        candidate: &Candidate,
        failure: &ValidationFailure,
    ) -> Result<Candidate, HealerError>;
}

/// Enforce that `supplied` is the passing result of `requested`'s predecessor
pub(crate) fn require_predecessor(
    requested: Level,
    supplied: &ValidationResult,
) -> Result<(), SequenceError> {
    let required = match requested.predecessor() {
        Some(level) => level,
        None => return Ok(()),
    };
    if supplied.level != required {
        return Err(SequenceError::WrongPredecessor {
            requested,
            supplied: supplied.level,
            required,
        });
    }
    if !supplied.passed {
        return Err(SequenceError::PredecessorNotPassed {
            requested,
            required,
        });
    }
    Ok(())
}
