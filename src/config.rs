//! Environment configuration for the policy installer
//!
//! The two CIDR ranges arrive through the container environment. They are
//! resolved and validated in a single explicit loading step at startup; the
//! resulting [`Config`] is immutable and passed explicitly to the installer,
//! so the missing-variable failure path is one testable function and no
//! kernel state is touched before validation succeeds.

use crate::core::error::{Error, Result};
use crate::core::policy::NamespacePolicy;
use ipnetwork::IpNetwork;

/// Environment variable holding the cluster-wide CIDR range.
pub const ENV_CLUSTER_RANGE: &str = "ip_range_cluster";

/// Environment variable holding the namespace-local CIDR range.
pub const ENV_NAMESPACE_RANGE: &str = "ip_range_ns";

/// Validated policy configuration, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub cluster_range: IpNetwork,
    pub namespace_range: IpNetwork,
}

impl Config {
    /// Loads and validates the configuration from the process environment.
    ///
    /// An unset or empty variable is a configuration error naming the
    /// variable; a malformed CIDR is a validation error naming the variable
    /// and the offending value. Either is fatal to the caller.
    pub fn from_env() -> Result<Self> {
        let cluster_range = range_from_env(ENV_CLUSTER_RANGE)?;
        let namespace_range = range_from_env(ENV_NAMESPACE_RANGE)?;
        Ok(Self {
            cluster_range,
            namespace_range,
        })
    }

    /// The two-rule policy described by this configuration.
    pub fn policy(&self) -> NamespacePolicy {
        NamespacePolicy::new(self.cluster_range, self.namespace_range)
    }
}

/// Resolves one CIDR range from the environment. Empty values count as
/// unset, since an empty CIDR can never be valid and failing early names
/// the variable instead of surfacing a parser error later.
fn range_from_env(var: &str) -> Result<IpNetwork> {
    let value = std::env::var(var).unwrap_or_default();
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::MissingEnv {
            var: var.to_string(),
        });
    }

    value.parse().map_err(|source| Error::InvalidCidr {
        var: var.to_string(),
        value: value.to_string(),
        source,
    })
}
