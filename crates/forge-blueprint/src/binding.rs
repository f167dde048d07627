//! Data-flow bindings between component ports

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Reference to a named port on a named component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Component name
    pub component: String,
    /// Port name on that component
    pub port: String,
}

impl PortRef {
    /// Create a new port reference
    #[inline]
    #[must_use]
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }
}

impl Display for PortRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// A directed data-flow connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    /// Producing side (an output port)
    pub source: PortRef,
    /// Consuming side (an input port)
    pub target: PortRef,
}

impl BindingSpec {
    /// Create a new binding
    #[inline]
    #[must_use]
    pub fn new(source: PortRef, target: PortRef) -> Self {
        Self { source, target }
    }
}

impl Display for BindingSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
