//! Component declarations
//!
//! A component is one unit of the target system: a name, a kind, its
//! configuration, declared input/output ports, and explicit ordering
//! dependencies on other components.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Component kind
///
/// The kind determines which configuration keys are mandatory and which
/// external capabilities the component requires at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Produces data without consuming any
    Source,
    /// Consumes and produces data
    Transform,
    /// Consumes data without producing any
    Sink,
    /// Persists data; requires a reachable database
    Store,
    /// Serves data over the network; claims an exclusive port
    Endpoint,
}

impl ComponentKind {
    /// Configuration keys that must be present for this kind
    #[must_use]
    pub fn required_config_keys(&self) -> &'static [&'static str] {
        match self {
            ComponentKind::Store => &["connection"],
            ComponentKind::Endpoint => &["port"],
            _ => &[],
        }
    }

    /// Whether components of this kind persist data externally
    #[inline]
    #[must_use]
    pub fn needs_storage(&self) -> bool {
        matches!(self, ComponentKind::Store)
    }
}

/// One field of a port schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Field type tag (opaque to the pipeline, compared verbatim)
    pub field_type: String,
}

impl FieldSpec {
    /// Create a new field spec
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// A named input or output port with its declared shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique within the component and direction
    pub name: String,
    /// Declared fields carried by this port
    pub fields: Vec<FieldSpec>,
}

impl PortSpec {
    /// Create a new port spec
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// With a declared field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::new(name, field_type));
        self
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declarative description of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Component name, unique within the blueprint
    pub name: String,
    /// Component kind
    pub kind: ComponentKind,
    /// Configuration values (kind-specific keys plus free-form extras)
    #[serde(default)]
    pub config: IndexMap<String, serde_json::Value>,
    /// Declared input ports
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    /// Declared output ports
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    /// Names of components that must be wired upstream of this one
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ComponentSpec {
    /// Create a new component spec
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: IndexMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// With a configuration value
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// With an input port
    #[must_use]
    pub fn with_input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    /// With an output port
    #[must_use]
    pub fn with_output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    /// With an ordering dependency on another component
    #[must_use]
    pub fn with_dependency(mut self, upstream: impl Into<String>) -> Self {
        self.depends_on.push(upstream.into());
        self
    }

    /// Look up an input port by name
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Look up an output port by name
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// The network port claimed by this component, if any
    #[must_use]
    pub fn claimed_network_port(&self) -> Option<u64> {
        if self.kind != ComponentKind::Endpoint {
            return None;
        }
        self.config.get("port").and_then(serde_json::Value::as_u64)
    }

    /// The database connection string declared by this component, if any
    #[must_use]
    pub fn storage_connection(&self) -> Option<&str> {
        if !self.kind.needs_storage() {
            return None;
        }
        self.config.get("connection").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_keys_per_kind() {
        assert_eq!(ComponentKind::Store.required_config_keys(), ["connection"]);
        assert_eq!(ComponentKind::Endpoint.required_config_keys(), ["port"]);
        assert!(ComponentKind::Transform.required_config_keys().is_empty());
    }

    #[test]
    fn component_builder() {
        let spec = ComponentSpec::new("orders-api", ComponentKind::Endpoint)
            .with_config("port", json!(8080))
            .with_input(PortSpec::new("requests").with_field("order_id", "string"))
            .with_dependency("orders-store");

        assert_eq!(spec.claimed_network_port(), Some(8080));
        assert_eq!(spec.depends_on, vec!["orders-store"]);
        assert!(spec.input("requests").unwrap().field("order_id").is_some());
    }

    #[test]
    fn storage_connection_only_for_store() {
        let store = ComponentSpec::new("db", ComponentKind::Store)
            .with_config("connection", json!("localhost:5432"));
        let sink = ComponentSpec::new("log", ComponentKind::Sink)
            .with_config("connection", json!("localhost:5432"));

        assert_eq!(store.storage_connection(), Some("localhost:5432"));
        assert_eq!(sink.storage_connection(), None);
    }

    #[test]
    fn network_port_requires_endpoint_kind() {
        let transform = ComponentSpec::new("enrich", ComponentKind::Transform)
            .with_config("port", json!(9090));
        assert_eq!(transform.claimed_network_port(), None);
    }
}
