//! Filter-table chain access
//!
//! Defines [`ChainOps`], the seam between the policy installer and the
//! kernel packet-filter interface. Production code uses [`KernelChains`],
//! which drives the system `iptables` binary via the `iptables` crate;
//! tests substitute stateful in-memory implementations.

use crate::core::error::{Error, Result};
use crate::core::policy::{Chain, PolicyRule, FILTER_TABLE};

/// Abstraction over mutations of the filter table's chains.
///
/// All methods are synchronous, matching the underlying `iptables` crate.
/// Only the filter table is reachable through this trait; NAT and mangle
/// stay untouched.
pub trait ChainOps {
    /// Removes every rule from the chain. Flushing an already-empty chain
    /// succeeds.
    fn flush(&self, chain: Chain) -> Result<()>;

    /// Inserts a rule at the head of the chain (position 1).
    fn insert_head(&self, chain: Chain, rule: &PolicyRule) -> Result<()>;

    /// Lists the chain in iptables-save format. The leading `-P` policy
    /// line is part of the listing but is not a rule; see [`rule_entries`].
    fn rules(&self, chain: Chain) -> Result<Vec<String>>;
}

/// Production [`ChainOps`] backed by the `iptables` crate.
pub struct KernelChains {
    inner: iptables::IPTables,
}

impl KernelChains {
    /// Opens the IPv4 filter table.
    pub fn new() -> Result<Self> {
        let inner = iptables::new(false).map_err(Error::iptables)?;
        Ok(Self { inner })
    }
}

impl ChainOps for KernelChains {
    fn flush(&self, chain: Chain) -> Result<()> {
        self.inner
            .flush_chain(FILTER_TABLE, chain.as_str())
            .map_err(Error::iptables)
    }

    fn insert_head(&self, chain: Chain, rule: &PolicyRule) -> Result<()> {
        self.inner
            .insert(FILTER_TABLE, chain.as_str(), &rule.match_args(), 1)
            .map_err(Error::iptables)
    }

    fn rules(&self, chain: Chain) -> Result<Vec<String>> {
        self.inner
            .list(FILTER_TABLE, chain.as_str())
            .map_err(Error::iptables)
    }
}

/// Filters an iptables-save listing down to its rule entries (`-A` lines),
/// dropping the chain policy line.
pub fn rule_entries(listing: &[String]) -> Vec<String> {
    listing
        .iter()
        .filter(|line| line.starts_with("-A "))
        .cloned()
        .collect()
}
