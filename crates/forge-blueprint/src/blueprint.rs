//! The blueprint value
//!
//! A blueprint is the declarative description of the target system:
//! components, their configuration, and the bindings between them. It arrives
//! here already syntax-validated by an external parser. Blueprints are
//! immutable values; every healing or regeneration step produces a new
//! blueprint rather than editing one in place, so concurrent checks within a
//! validation level always read a single consistent snapshot.

use crate::binding::BindingSpec;
use crate::component::ComponentSpec;
use serde::{Deserialize, Serialize};

/// Declarative description of a candidate system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// System name
    pub name: String,
    /// Stated natural-language intent of the whole system
    pub intent: String,
    /// Declared components
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    /// Declared data-flow bindings
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
}

impl Blueprint {
    /// Create an empty blueprint
    #[must_use]
    pub fn new(name: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intent: intent.into(),
            components: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// With a component appended
    #[must_use]
    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    /// With a binding appended
    #[must_use]
    pub fn with_binding(mut self, binding: BindingSpec) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Look up a component by name
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Components that declare external storage
    pub fn storage_components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.iter().filter(|c| c.kind.needs_storage())
    }

    /// A copy of this blueprint with one component replaced by name
    ///
    /// The original value is untouched; callers that regenerate
    /// configuration use this to produce the next blueprint snapshot.
    #[must_use]
    pub fn replacing_component(&self, component: ComponentSpec) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.components.iter_mut().find(|c| c.name == component.name) {
            *slot = component;
        } else {
            next.components.push(component);
        }
        next
    }

    /// A copy of this blueprint with one binding replaced
    #[must_use]
    pub fn replacing_binding(&self, index: usize, binding: BindingSpec) -> Self {
        let mut next = self.clone();
        if index < next.bindings.len() {
            next.bindings[index] = binding;
        }
        next
    }
}
