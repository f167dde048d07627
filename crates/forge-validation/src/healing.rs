//! Healing contracts
//!
//! Levels 2–4 each delegate repair to an external collaborator behind an
//! explicit trait: the AST healer patches component code, the configuration
//! regenerator rewrites the blueprint, the semantic healer revises the
//! blueprint against its stated intent. The pipeline never inspects how a
//! fix was produced; only the subsequent re-validation decides whether it
//! took.

use crate::result::ValidationFailure;
use async_trait::async_trait;
use forge_blueprint::{Blueprint, GeneratedComponent};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which repair strategy produced a healing result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealingType {
    /// Localized patch of generated component code (level 2)
    AstHealing,
    /// Blueprint revision against stated intent (level 4)
    SemanticHealing,
    /// Blueprint rewrite resolving a wiring/configuration conflict (level 3)
    ConfigurationRegeneration,
}

/// The value a healer produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HealedArtifact {
    /// A patched component artifact
    Component(GeneratedComponent),
    /// A revised blueprint
    Blueprint(Blueprint),
}

/// Outcome of one healing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingResult {
    /// Whether the healer claims to have repaired the failure
    pub healing_successful: bool,
    /// Strategy that produced this result
    pub healing_type: HealingType,
    /// The healed value, present on success
    pub healed_artifact: Option<HealedArtifact>,
    /// Free-form detail map from the healer
    pub details: IndexMap<String, serde_json::Value>,
    /// Failure description when unsuccessful
    pub error_message: Option<String>,
}

impl HealingResult {
    /// A successful healing outcome
    #[must_use]
    pub fn success(healing_type: HealingType, artifact: HealedArtifact) -> Self {
        Self {
            healing_successful: true,
            healing_type,
            healed_artifact: Some(artifact),
            details: IndexMap::new(),
            error_message: None,
        }
    }

    /// An unsuccessful healing outcome
    #[must_use]
    pub fn failure(healing_type: HealingType, message: impl Into<String>) -> Self {
        Self {
            healing_successful: false,
            healing_type,
            healed_artifact: None,
            details: IndexMap::new(),
            error_message: Some(message.into()),
        }
    }

    /// Attach a detail entry
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Outcome of one configuration regeneration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationResult {
    /// Whether a new blueprint was produced
    pub regeneration_successful: bool,
    /// The rewritten blueprint, present on success
    pub updated_blueprint: Option<Blueprint>,
    /// Free-form detail map from the regenerator
    pub details: IndexMap<String, serde_json::Value>,
    /// Failure description when unsuccessful
    pub error_message: Option<String>,
}

impl RegenerationResult {
    /// A successful regeneration outcome
    #[must_use]
    pub fn success(updated_blueprint: Blueprint) -> Self {
        Self {
            regeneration_successful: true,
            updated_blueprint: Some(updated_blueprint),
            details: IndexMap::new(),
            error_message: None,
        }
    }

    /// An unsuccessful regeneration outcome
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            regeneration_successful: false,
            updated_blueprint: None,
            details: IndexMap::new(),
            error_message: Some(message.into()),
        }
    }

    /// Attach a detail entry
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Faults raised by healer collaborators
#[derive(Debug, Clone, thiserror::Error)]
pub enum HealerError {
    /// The healer call itself failed (transport, crash, malformed reply)
    #[error("healer call failed: {0}")]
    CallFailed(String),

    /// The healer declined the failure as outside its repair class
    #[error("healer rejected failure: {0}")]
    Rejected(String),
}

/// Patches generated component code for one localized defect
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AstHealer: Send + Sync {
    /// Attempt to repair `failure` in `artifact`, returning a patched copy
    async fn heal_component(
        &self,
        artifact: &GeneratedComponent,
        failure: &ValidationFailure,
    ) -> Result<HealingResult, HealerError>;
}

/// Rewrites the blueprint to resolve a wiring/configuration conflict
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigurationRegenerator: Send + Sync {
    /// Produce a new blueprint with the conflict resolved
    async fn regenerate(
        &self,
        blueprint: &Blueprint,
        failure: &ValidationFailure,
    ) -> Result<RegenerationResult, HealerError>;
}

/// Revises the blueprint to restore coherence with its stated intent
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SemanticHealer: Send + Sync {
    /// Produce a revised blueprint addressing the described incoherence
    async fn heal_blueprint(
        &self,
        blueprint: &Blueprint,
        incoherence: &ValidationFailure,
    ) -> Result<HealingResult, HealerError>;
}
