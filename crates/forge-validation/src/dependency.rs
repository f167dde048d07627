//! Pre-flight dependency checking
//!
//! Before any validation level runs, every external capability the blueprint
//! requires must be live: the reasoning service used by level 4, and each
//! database a storage component declares. Absence is always fatal; there is
//! no mock or default substitute under any circumstance. The status map is
//! computed once per run and read-only afterward.

use crate::error::DependencyError;
use async_trait::async_trait;
use forge_blueprint::Blueprint;
use futures::future::join_all;
use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// An external capability the blueprint requires
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The reasoning service used for semantic validation
    ReasoningService,
    /// A database declared by a storage component
    Database {
        /// Component declaring the database
        component: String,
        /// Declared connection address
        address: String,
    },
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReasoningService => write!(f, "reasoning-service"),
            Capability::Database { component, address } => {
                write!(f, "database[{component}@{address}]")
            }
        }
    }
}

/// Probes whether the reasoning-service credential is configured
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    /// Ok when the credential is present and plausibly usable
    async fn probe(&self) -> Result<(), String>;

    /// Which credential this probe checks (for error messages)
    fn describe(&self) -> String;
}

/// Probes whether a network address is reachable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Ok when `address` accepts a connection
    async fn probe(&self, address: &str) -> Result<(), String>;
}

/// One probed capability with its outcome
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    /// The probed capability
    pub capability: Capability,
    /// Whether the capability is live
    pub available: bool,
    /// Probe detail (error reason when unavailable)
    pub detail: String,
}

/// Read-only outcome of one pre-flight dependency check
#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    statuses: Vec<DependencyStatus>,
}

impl DependencyReport {
    /// Build a report from already-probed statuses
    #[must_use]
    pub fn from_statuses(statuses: Vec<DependencyStatus>) -> Self {
        Self { statuses }
    }

    /// All probed statuses, in probe order
    #[must_use]
    pub fn statuses(&self) -> &[DependencyStatus] {
        &self.statuses
    }

    /// Whether every probed capability is live
    #[must_use]
    pub fn all_available(&self) -> bool {
        self.statuses.iter().all(|s| s.available)
    }

    /// Whether the reasoning service was probed and confirmed live
    #[must_use]
    pub fn confirms_reasoning_service(&self) -> bool {
        self.statuses
            .iter()
            .any(|s| s.capability == Capability::ReasoningService && s.available)
    }

    /// Capability-name → availability map for observability
    #[must_use]
    pub fn status_map(&self) -> IndexMap<String, bool> {
        self.statuses
            .iter()
            .map(|s| (s.capability.to_string(), s.available))
            .collect()
    }

    /// One-line rendering for logs
    #[must_use]
    pub fn status_summary(&self) -> String {
        let live = self.statuses.iter().filter(|s| s.available).count();
        format!("{live}/{} dependencies live", self.statuses.len())
    }
}

/// Pre-flight checker for blueprint-required external capabilities
pub struct DependencyChecker {
    credential: Arc<dyn CredentialProbe>,
    reachability: Arc<dyn ReachabilityProbe>,
    probe_timeout: Duration,
}

impl DependencyChecker {
    /// Create a checker with the given probes
    #[must_use]
    pub fn new(
        credential: Arc<dyn CredentialProbe>,
        reachability: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        Self {
            credential,
            reachability,
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// With a per-probe deadline
    #[must_use]
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Capabilities this blueprint requires
    ///
    /// The reasoning service is always required: every run that survives to
    /// level 4 will call it, and lazily discovering it missing there would
    /// waste the preceding levels.
    #[must_use]
    pub fn required_capabilities(&self, blueprint: &Blueprint) -> Vec<Capability> {
        let mut capabilities = vec![Capability::ReasoningService];
        for component in blueprint.storage_components() {
            if let Some(address) = component.storage_connection() {
                capabilities.push(Capability::Database {
                    component: component.name.clone(),
                    address: address.to_string(),
                });
            }
        }
        capabilities
    }

    /// Probe every required capability; fail hard on the first absence
    ///
    /// All probes run concurrently, each bounded by the probe timeout. The
    /// returned report covers every capability so observability does not
    /// depend on success.
    pub async fn validate_all_dependencies_configured(
        &self,
        blueprint: &Blueprint,
    ) -> Result<DependencyReport, DependencyError> {
        let capabilities = self.required_capabilities(blueprint);
        tracing::debug!(count = capabilities.len(), "probing required dependencies");

        let probes = capabilities.iter().map(|capability| async {
            let outcome = tokio::time::timeout(self.probe_timeout, self.probe(capability)).await;
            match outcome {
                Ok(Ok(())) => DependencyStatus {
                    capability: capability.clone(),
                    available: true,
                    detail: "live".to_string(),
                },
                Ok(Err(reason)) => DependencyStatus {
                    capability: capability.clone(),
                    available: false,
                    detail: reason,
                },
                Err(_) => DependencyStatus {
                    capability: capability.clone(),
                    available: false,
                    detail: format!("probe timed out after {:?}", self.probe_timeout),
                },
            }
        });

        let statuses = join_all(probes).await;
        let report = DependencyReport { statuses };

        for status in report.statuses().iter().filter(|s| !s.available) {
            tracing::error!(
                capability = %status.capability,
                detail = %status.detail,
                "required dependency absent"
            );
        }

        match report.statuses().iter().find(|s| !s.available) {
            None => {
                tracing::info!(summary = %report.status_summary(), "dependency check passed");
                Ok(report)
            }
            Some(missing) => Err(Self::to_error(missing)),
        }
    }

    async fn probe(&self, capability: &Capability) -> Result<(), String> {
        match capability {
            Capability::ReasoningService => self.credential.probe().await,
            Capability::Database { address, .. } => self.reachability.probe(address).await,
        }
    }

    fn to_error(status: &DependencyStatus) -> DependencyError {
        if status.detail.starts_with("probe timed out") {
            return DependencyError::ProbeTimeout {
                capability: status.capability.to_string(),
            };
        }
        match &status.capability {
            Capability::ReasoningService => {
                DependencyError::MissingCredential(status.detail.clone())
            }
            Capability::Database { component, address } => DependencyError::DatabaseUnreachable {
                component: component.clone(),
                address: address.clone(),
                reason: status.detail.clone(),
            },
        }
    }
}
