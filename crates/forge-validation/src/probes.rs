//! Live dependency probes
//!
//! Real probe implementations used outside tests: a credential check against
//! the process environment and a TCP reachability check. Both report absence
//! verbatim; neither ever substitutes a stand-in.

use crate::dependency::{CredentialProbe, ReachabilityProbe};
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Default environment variable holding the reasoning-service credential
pub const REASONING_CREDENTIAL_VAR: &str = "REASONING_SERVICE_API_KEY";

/// Checks that a credential environment variable is set and non-empty
#[derive(Debug, Clone)]
pub struct EnvCredentialProbe {
    var: String,
}

impl EnvCredentialProbe {
    /// Probe the default reasoning-service credential variable
    #[must_use]
    pub fn reasoning_service() -> Self {
        Self::new(REASONING_CREDENTIAL_VAR)
    }

    /// Probe a specific environment variable
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProbe for EnvCredentialProbe {
    async fn probe(&self) -> Result<(), String> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(()),
            Ok(_) => Err(format!("{} is set but empty", self.var)),
            Err(_) => Err(format!("{} is not set", self.var)),
        }
    }

    fn describe(&self) -> String {
        self.var.clone()
    }
}

/// Checks that a `host:port` address accepts a TCP connection
#[derive(Debug, Clone, Default)]
pub struct TcpReachabilityProbe;

impl TcpReachabilityProbe {
    /// Create a new probe
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReachabilityProbe for TcpReachabilityProbe {
    async fn probe(&self, address: &str) -> Result<(), String> {
        if !address.contains(':') {
            return Err(format!("malformed address '{address}', expected host:port"));
        }
        match TcpStream::connect(address).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("connect to {address} failed: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_probe_reports_missing_variable() {
        let probe = EnvCredentialProbe::new("FORGE_TEST_CREDENTIAL_THAT_DOES_NOT_EXIST");
        let err = probe.probe().await.unwrap_err();
        assert!(err.contains("is not set"));
    }

    #[tokio::test]
    async fn env_probe_accepts_present_variable() {
        // Set-and-probe within one test to avoid cross-test env races.
        std::env::set_var("FORGE_TEST_CREDENTIAL_PRESENT", "token-123");
        let probe = EnvCredentialProbe::new("FORGE_TEST_CREDENTIAL_PRESENT");
        assert!(probe.probe().await.is_ok());
        std::env::remove_var("FORGE_TEST_CREDENTIAL_PRESENT");
    }

    #[tokio::test]
    async fn tcp_probe_rejects_malformed_address() {
        let probe = TcpReachabilityProbe::new();
        let err = probe.probe("not-an-address").await.unwrap_err();
        assert!(err.contains("malformed address"));
    }

    #[tokio::test]
    async fn tcp_probe_connects_to_live_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let probe = TcpReachabilityProbe::new();
        assert!(probe.probe(&address).await.is_ok());
    }
}
