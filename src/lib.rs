//! nspolicy - Namespace Network Policy Sidecar
//!
//! A one-shot sidecar that partitions pod traffic by CIDR range: it rewrites
//! the kernel filter table's INPUT and OUTPUT chains so intra-namespace
//! traffic is accepted while wider intra-cluster traffic is dropped.
//!
//! # Architecture
//!
//! - [`config`] - Environment configuration (the two CIDR ranges)
//! - [`core`] - Policy model, chain backend, and installation sequence
//! - [`keepalive`] - Signal-interruptible wait that keeps the container alive
//!
//! # Behavior
//!
//! - Configuration is resolved and validated before the filter table is touched
//! - Both chains are flushed and rebuilt on every start; any failure exits
//!   non-zero so the container supervisor can restart the sidecar
//! - The namespace ACCEPT rule always precedes the cluster DROP rule in
//!   evaluation order, so overlapping ranges keep namespace traffic flowing

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod core;
pub mod keepalive;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::policy::{Action, Chain, NamespacePolicy, PolicyRule};
