//! Policy rule data structures and iptables match-argument generation
//!
//! This module defines the two-rule namespace policy: a DROP rule covering
//! the cluster-wide CIDR range and an ACCEPT rule covering the namespace
//! CIDR range, installed symmetrically (src = dst) into the INPUT and OUTPUT
//! chains of the kernel filter table.
//!
//! # Rule ordering
//!
//! Rules are evaluated first-match-wins. [`NamespacePolicy::rules`] returns
//! the rules in head-insertion order, which leaves the namespace ACCEPT rule
//! first in evaluation order; see its documentation for the invariant.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kernel packet-filter table this sidecar manages. The NAT and mangle
/// tables are never touched.
pub const FILTER_TABLE: &str = "filter";

/// Traffic-direction chain in the filter table
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Chain {
    /// Incoming traffic
    #[strum(serialize = "INPUT")]
    Input,
    /// Outgoing traffic
    #[strum(serialize = "OUTPUT")]
    Output,
}

impl Chain {
    /// Both chains managed by the installer, in configuration order.
    pub const ALL: [Chain; 2] = [Chain::Input, Chain::Output];

    /// Returns the kernel chain name as a static string
    pub const fn as_str(self) -> &'static str {
        match self {
            Chain::Input => "INPUT",
            Chain::Output => "OUTPUT",
        }
    }
}

/// Rule target action (Accept or Drop)
///
/// Controls the terminal disposition of a packet matching the rule.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Action {
    /// Accept the packet (allow it through)
    #[strum(serialize = "ACCEPT")]
    Accept,
    /// Drop the packet silently (no response sent)
    #[strum(serialize = "DROP")]
    Drop,
}

impl Action {
    /// Returns the iptables target name as a static string
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Accept => "ACCEPT",
            Action::Drop => "DROP",
        }
    }
}

/// A single filter rule: source range, destination range, and target action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRule {
    pub source: IpNetwork,
    pub destination: IpNetwork,
    pub action: Action,
}

impl PolicyRule {
    /// Creates a rule matching traffic that stays within a single range
    /// (source and destination are the same CIDR).
    pub const fn symmetric(range: IpNetwork, action: Action) -> Self {
        Self {
            source: range,
            destination: range,
            action,
        }
    }

    /// Renders the iptables match specification for this rule,
    /// e.g. `-s 10.1.2.0/24 -d 10.1.2.0/24 -j ACCEPT`.
    pub fn match_args(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-s {} -d {} -j {}",
            self.source,
            self.destination,
            self.action.as_str()
        )
    }
}

/// The two-rule policy installed into each chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespacePolicy {
    /// Cluster-wide address space; traffic within it is dropped
    pub cluster_range: IpNetwork,
    /// Namespace-local address space; traffic within it is accepted
    pub namespace_range: IpNetwork,
}

impl NamespacePolicy {
    pub const fn new(cluster_range: IpNetwork, namespace_range: IpNetwork) -> Self {
        Self {
            cluster_range,
            namespace_range,
        }
    }

    /// The policy rules in head-insertion order: cluster DROP first, then
    /// namespace ACCEPT.
    ///
    /// Each rule is inserted at the head of its chain, so the later entry
    /// ends up first in evaluation order. Invariant: the namespace ACCEPT
    /// rule takes evaluation precedence over the cluster DROP rule, keeping
    /// intra-namespace traffic flowing when the namespace range is contained
    /// in the cluster range.
    pub fn rules(&self) -> [PolicyRule; 2] {
        [
            PolicyRule::symmetric(self.cluster_range, Action::Drop),
            PolicyRule::symmetric(self.namespace_range, Action::Accept),
        ]
    }
}
