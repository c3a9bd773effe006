//! One-shot policy installation
//!
//! Replaces the contents of the INPUT and OUTPUT chains with the two-rule
//! namespace policy and reports the resulting chain contents for
//! observability.

use crate::core::chains::{rule_entries, ChainOps};
use crate::core::error::Result;
use crate::core::policy::{Chain, NamespacePolicy};
use serde::Serialize;
use tracing::info;

/// Final contents of one chain after installation.
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub chain: Chain,
    pub rules: Vec<String>,
}

/// Final contents of both chains after installation.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub chains: Vec<ChainReport>,
}

impl InstallReport {
    /// Plain-text listing of each chain's final rules, one chain per block.
    pub fn to_listing(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for report in &self.chains {
            let _ = writeln!(out, "{} chain rules:", report.chain);
            if report.rules.is_empty() {
                let _ = writeln!(out, "  (none)");
            }
            for rule in &report.rules {
                let _ = writeln!(out, "  {rule}");
            }
        }
        out
    }
}

/// Replaces the INPUT and OUTPUT chain contents with the policy rules.
///
/// Each chain is handled as one flush-then-insert transaction: flush, insert
/// the cluster DROP rule at the head, insert the namespace ACCEPT rule at
/// the head. The ACCEPT rule therefore sits first in evaluation order.
///
/// The first failing operation aborts the install and propagates. No
/// recovery is attempted: the supervisor restarts the sidecar and the whole
/// sequence is re-run, which converges to the same two-rule state.
pub fn install<B: ChainOps>(backend: &B, policy: &NamespacePolicy) -> Result<InstallReport> {
    info!(
        cluster = %policy.cluster_range,
        namespace = %policy.namespace_range,
        "installing namespace policy"
    );

    let mut chains = Vec::with_capacity(Chain::ALL.len());
    for chain in Chain::ALL {
        let rules = configure_chain(backend, policy, chain)?;
        chains.push(ChainReport { chain, rules });
    }

    info!("namespace policy installed");
    Ok(InstallReport { chains })
}

/// Flushes one chain and inserts the policy rules, returning the resulting
/// rule entries.
fn configure_chain<B: ChainOps>(
    backend: &B,
    policy: &NamespacePolicy,
    chain: Chain,
) -> Result<Vec<String>> {
    info!(%chain, "flushing existing rules");
    backend.flush(chain)?;

    for rule in policy.rules() {
        info!(%chain, %rule, "inserting rule");
        backend.insert_head(chain, &rule)?;
    }

    Ok(rule_entries(&backend.rules(chain)?))
}
