//! Generated component artifacts
//!
//! The scaffold generator hands back one [`GeneratedComponent`] per
//! component. The pipeline treats the source as opaque; only the content
//! hash matters for tracking whether healing replaced an artifact.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};

/// Generated code artifact for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedComponent {
    /// Name of the component this artifact implements
    pub component: String,
    /// Generated source (opaque to the pipeline)
    pub source: String,
    /// Content hash of the source
    pub hash: ContentHash,
}

impl GeneratedComponent {
    /// Create a new artifact, computing its content hash
    #[must_use]
    pub fn new(component: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let hash = ContentHash::compute(source.as_bytes());
        Self {
            component: component.into(),
            source,
            hash,
        }
    }

    /// A new artifact for the same component with patched source
    ///
    /// Used by healing: the original artifact value is never modified.
    #[must_use]
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self::new(self.component.clone(), source)
    }
}
