//! Candidate system snapshots
//!
//! A [`Candidate`] is the value threaded between validation levels: the
//! blueprint plus whatever component artifacts have been generated so far.
//! It is the only state shared across levels, and it is never mutated:
//! every healing or regeneration step derives a fresh snapshot, so
//! concurrent sub-checks within a level always read one consistent value.

use crate::artifact::GeneratedComponent;
use crate::blueprint::Blueprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable snapshot of a candidate system under validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The blueprint this candidate was generated from
    pub blueprint: Blueprint,
    /// Generated artifacts, keyed by component name
    #[serde(default)]
    pub artifacts: BTreeMap<String, GeneratedComponent>,
}

impl Candidate {
    /// Create a candidate with no generated artifacts yet
    #[inline]
    #[must_use]
    pub fn new(blueprint: Blueprint) -> Self {
        Self {
            blueprint,
            artifacts: BTreeMap::new(),
        }
    }

    /// Look up a generated artifact by component name
    #[must_use]
    pub fn artifact(&self, component: &str) -> Option<&GeneratedComponent> {
        self.artifacts.get(component)
    }

    /// A new snapshot with one artifact added or replaced
    #[must_use]
    pub fn with_artifact(&self, artifact: GeneratedComponent) -> Self {
        let mut next = self.clone();
        next.artifacts.insert(artifact.component.clone(), artifact);
        next
    }

    /// A new snapshot carrying a regenerated blueprint
    ///
    /// Artifacts are kept: configuration regeneration rewires the system
    /// but does not invalidate already-generated component code. The next
    /// re-validation decides whether the kept artifacts still hold up.
    #[must_use]
    pub fn with_blueprint(&self, blueprint: Blueprint) -> Self {
        Self {
            blueprint,
            artifacts: self.artifacts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentSpec};

    fn candidate() -> Candidate {
        Candidate::new(
            Blueprint::new("sys", "do things")
                .with_component(ComponentSpec::new("a", ComponentKind::Source)),
        )
    }

    #[test]
    fn with_artifact_derives_new_snapshot() {
        let base = candidate();
        let next = base.with_artifact(GeneratedComponent::new("a", "fn a() {}"));

        assert!(base.artifact("a").is_none());
        assert!(next.artifact("a").is_some());
    }

    #[test]
    fn with_blueprint_keeps_artifacts() {
        let base = candidate().with_artifact(GeneratedComponent::new("a", "fn a() {}"));
        let rewired = base.with_blueprint(Blueprint::new("sys", "do things differently"));

        assert!(rewired.artifact("a").is_some());
        assert_eq!(rewired.blueprint.intent, "do things differently");
    }
}
