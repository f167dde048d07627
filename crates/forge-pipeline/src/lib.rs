//! Forge Pipeline
//!
//! The staged, fail-hard orchestration layer:
//! - **PipelineState**: the run state machine (dependency check, levels
//!   1–4, done/failed) with a validated transition table
//! - **HealingCoordinator**: the bounded-retry loop shared by levels 2–4
//! - **GenerationPipeline**: sequences one blueprint through the full run
//!   and aggregates a [`SystemGenerationResult`]
//!
//! # Example
//!
//! ```rust,ignore
//! use forge_pipeline::{Collaborators, GenerationPipeline, PipelineConfig};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = GenerationPipeline::new(PipelineConfig::new(), collaborators);
//! let result = pipeline.run(blueprint).await?;
//!
//! println!("{}", result.generation_summary());
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod orchestrator;
pub mod state;

// Re-exports for convenience
pub use coordinator::{HealingCoordinator, LevelFailed, LevelReport};
pub use orchestrator::{
    Collaborators, GenerationPipeline, PipelineConfig, RunId, SystemGenerationResult,
};
pub use state::{allowed_transitions, validate_transition, PipelineState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the pipeline
    pub use crate::{
        Collaborators, GenerationPipeline, HealingCoordinator, PipelineConfig, PipelineState,
        RunId, SystemGenerationResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
