//! Forge Validation
//!
//! The four escalating validation levels and everything they share:
//! - **Result model**: [`ValidationResult`], [`ValidationFailure`], severity
//!   and level types with their invariants enforced at construction
//! - **DependencyChecker**: fail-hard pre-flight probing of required
//!   external capabilities; no mock or default substitute, ever
//! - **FrameworkValidator** (level 1): self-test of the pipeline itself,
//!   never healable
//! - **ComponentLogicValidator** (level 2), **SystemIntegrationValidator**
//!   (level 3), **SemanticValidator** (level 4): the healable levels,
//!   each behind the explicit [`HealableLevel`] validate/heal interface
//! - **Healing contracts**: the AST healer, configuration regenerator, and
//!   semantic healer collaborator traits

pub mod dependency;
pub mod error;
pub mod healing;
pub mod levels;
pub mod probes;
pub mod result;

// Re-exports for convenience
pub use dependency::{
    Capability, CredentialProbe, DependencyChecker, DependencyReport, DependencyStatus,
    ReachabilityProbe,
};
pub use error::{
    ComponentLogicError, DependencyError, FrameworkError, LevelFailureReason, SemanticValidationError,
    SequenceError, SystemIntegrationError, ValidationError,
};
pub use healing::{
    AstHealer, ConfigurationRegenerator, HealedArtifact, HealerError, HealingResult, HealingType,
    RegenerationResult, SemanticHealer,
};
pub use levels::{
    ComponentFactory, ComponentLogicValidator, ContractFinding, FactoryError, FrameworkValidator,
    HealableLevel, LevelContext, ReasoningError, ReasoningService, SemanticAssessment,
    SemanticFinding, SemanticValidator, SystemIntegrationValidator,
};
pub use probes::{EnvCredentialProbe, TcpReachabilityProbe, REASONING_CREDENTIAL_VAR};
pub use result::{
    FailureKind, FrameworkTestResult, Level, Severity, ValidationFailure, ValidationResult,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the validation levels
    pub use crate::{
        DependencyChecker, DependencyReport, FrameworkValidator, HealableLevel, Level,
        LevelContext, Severity, ValidationError, ValidationFailure, ValidationResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
