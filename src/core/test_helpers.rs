//! Shared test utilities for core module tests
//!
//! Provides common test helpers to avoid duplication across test suites.
//! This module is only compiled in test mode.

use crate::core::chains::ChainOps;
use crate::core::error::Result;
use crate::core::policy::{Chain, NamespacePolicy, PolicyRule};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mutex for tests that need exclusive access to environment variables.
///
/// Use this when your test needs to:
/// 1. Temporarily change env vars to different values
/// 2. Restore env vars after the test
/// 3. Test behavior when env vars are absent
pub static ENV_VAR_MUTEX: Mutex<()> = Mutex::new(());

/// The canonical test policy: cluster 10.0.0.0/8, namespace 10.1.2.0/24.
pub fn test_policy() -> NamespacePolicy {
    NamespacePolicy::new(
        "10.0.0.0/8".parse().unwrap(),
        "10.1.2.0/24".parse().unwrap(),
    )
}

/// Stateful in-memory [`ChainOps`] with an operation journal.
///
/// Mirrors the observable semantics of the real backend: `insert_head`
/// prepends, `flush` empties, and `rules` returns an iptables-save style
/// listing whose first line is the chain policy.
///
/// Available for library tests; `integration_tests.rs` has its own copy.
#[derive(Default)]
pub struct MemoryChains {
    chains: RefCell<HashMap<&'static str, Vec<String>>>,
    journal: RefCell<Vec<String>>,
}

impl MemoryChains {
    /// Seeds a chain with pre-existing rule entries.
    pub fn seed(&self, chain: Chain, rules: &[&str]) {
        self.chains
            .borrow_mut()
            .entry(chain.as_str())
            .or_default()
            .extend(rules.iter().map(ToString::to_string));
    }

    /// Number of rules currently in the chain.
    pub fn rule_count(&self, chain: Chain) -> usize {
        self.chains
            .borrow()
            .get(chain.as_str())
            .map_or(0, Vec::len)
    }

    /// Copy of the recorded operation journal.
    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }
}

impl ChainOps for MemoryChains {
    fn flush(&self, chain: Chain) -> Result<()> {
        self.journal
            .borrow_mut()
            .push(format!("flush {}", chain.as_str()));
        self.chains
            .borrow_mut()
            .entry(chain.as_str())
            .or_default()
            .clear();
        Ok(())
    }

    fn insert_head(&self, chain: Chain, rule: &PolicyRule) -> Result<()> {
        self.journal
            .borrow_mut()
            .push(format!("insert {} {}", chain.as_str(), rule.match_args()));
        self.chains
            .borrow_mut()
            .entry(chain.as_str())
            .or_default()
            .insert(0, format!("-A {} {}", chain.as_str(), rule.match_args()));
        Ok(())
    }

    fn rules(&self, chain: Chain) -> Result<Vec<String>> {
        let mut listing = vec![format!("-P {} ACCEPT", chain.as_str())];
        listing.extend(
            self.chains
                .borrow()
                .get(chain.as_str())
                .cloned()
                .unwrap_or_default(),
        );
        Ok(listing)
    }
}
