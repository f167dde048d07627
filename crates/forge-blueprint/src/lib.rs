//! Forge Blueprint
//!
//! Value types for the validation pipeline:
//! - **Blueprint**: declarative components, configuration, and bindings
//! - **Candidate**: immutable blueprint + generated-artifact snapshot
//! - **GeneratedComponent**: content-hashed generated code artifact
//!
//! Everything in this crate is an immutable value. Healing and
//! regeneration derive new values; nothing is edited in place.
//!
//! # Example
//!
//! ```rust
//! use forge_blueprint::{Blueprint, BindingSpec, ComponentKind, ComponentSpec, PortRef, PortSpec};
//!
//! let blueprint = Blueprint::new("orders", "ingest orders, store them, serve them")
//!     .with_component(
//!         ComponentSpec::new("ingest", ComponentKind::Source)
//!             .with_output(PortSpec::new("events").with_field("order_id", "string")),
//!     )
//!     .with_component(
//!         ComponentSpec::new("archive", ComponentKind::Sink)
//!             .with_input(PortSpec::new("events").with_field("order_id", "string")),
//!     )
//!     .with_binding(BindingSpec::new(
//!         PortRef::new("ingest", "events"),
//!         PortRef::new("archive", "events"),
//!     ));
//!
//! assert!(blueprint.component("ingest").is_some());
//! ```

pub mod artifact;
pub mod binding;
pub mod blueprint;
pub mod candidate;
pub mod component;
pub mod hash;

// Re-exports for convenience
pub use artifact::GeneratedComponent;
pub use binding::{BindingSpec, PortRef};
pub use blueprint::Blueprint;
pub use candidate::Candidate;
pub use component::{ComponentKind, ComponentSpec, FieldSpec, PortSpec};
pub use hash::ContentHash;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
