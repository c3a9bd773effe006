//! Integration tests for nspolicy
//!
//! These tests drive the full install sequence (config load, chain flush,
//! rule insertion, report generation) against a stateful in-memory chain
//! backend, so they run without privileges and never touch the real filter
//! table.
//!
//! ```bash
//! cargo test --test integration_tests
//! ```

use nspolicy::config::{ENV_CLUSTER_RANGE, ENV_NAMESPACE_RANGE};
use nspolicy::core::chains::ChainOps;
use nspolicy::core::installer::{self, InstallReport};
use nspolicy::{Chain, Config, Error, PolicyRule, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serializes tests that mutate the process environment.
static ENV_VAR_MUTEX: Mutex<()> = Mutex::new(());

/// Stateful in-memory chain backend (integration-test copy of the library
/// test helper): `insert_head` prepends, `flush` empties, `rules` returns
/// an iptables-save style listing led by the chain policy line.
#[derive(Default)]
struct MemoryChains {
    chains: RefCell<HashMap<&'static str, Vec<String>>>,
}

impl MemoryChains {
    fn seed(&self, chain: Chain, rules: &[&str]) {
        self.chains
            .borrow_mut()
            .entry(chain.as_str())
            .or_default()
            .extend(rules.iter().map(ToString::to_string));
    }

    fn snapshot(&self) -> HashMap<&'static str, Vec<String>> {
        self.chains.borrow().clone()
    }
}

impl ChainOps for MemoryChains {
    fn flush(&self, chain: Chain) -> Result<()> {
        self.chains
            .borrow_mut()
            .entry(chain.as_str())
            .or_default()
            .clear();
        Ok(())
    }

    fn insert_head(&self, chain: Chain, rule: &PolicyRule) -> Result<()> {
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

/// Mirrors the main binary's startup gating: config first, install only
/// when the config loaded.
fn run_from_env(backend: &MemoryChains) -> std::result::Result<InstallReport, Error> {
    let config = Config::from_env()?;
    installer::install(backend, &config.policy())
}

fn set_env(cluster: Option<&str>, namespace: Option<&str>) {
    match cluster {
        Some(v) => std::env::set_var(ENV_CLUSTER_RANGE, v),
        None => std::env::remove_var(ENV_CLUSTER_RANGE),
    }
    match namespace {
        Some(v) => std::env::set_var(ENV_NAMESPACE_RANGE, v),
        None => std::env::remove_var(ENV_NAMESPACE_RANGE),
    }
}

#[test]
fn end_to_end_install_from_env() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("10.0.0.0/8"), Some("10.1.2.0/24"));

    let backend = MemoryChains::default();
    let report = run_from_env(&backend).unwrap();

    set_env(None, None);

    assert_eq!(report.chains.len(), 2);
    for chain_report in &report.chains {
        let chain = chain_report.chain;
        assert_eq!(
            chain_report.rules,
            vec![
                format!("-A {} -s 10.1.2.0/24 -d 10.1.2.0/24 -j ACCEPT", chain),
                format!("-A {} -s 10.0.0.0/8 -d 10.0.0.0/8 -j DROP", chain),
            ],
            "{chain} must hold the ACCEPT rule before the DROP rule"
        );
    }
}

#[test]
fn install_replaces_arbitrary_prior_state() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("10.0.0.0/8"), Some("10.1.2.0/24"));

    let backend = MemoryChains::default();
    backend.seed(
        Chain::Input,
        &[
            "-A INPUT -s 172.16.0.0/12 -j ACCEPT",
            "-A INPUT -p tcp --dport 22 -j ACCEPT",
            "-A INPUT -j DROP",
        ],
    );
    backend.seed(Chain::Output, &["-A OUTPUT -j ACCEPT"]);

    let report = run_from_env(&backend).unwrap();
    set_env(None, None);

    for chain_report in &report.chains {
        assert_eq!(chain_report.rules.len(), 2);
        assert!(chain_report.rules.iter().all(|r| !r.contains("172.16")));
    }
}

#[test]
fn install_twice_is_idempotent() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("10.0.0.0/8"), Some("10.1.2.0/24"));

    let backend = MemoryChains::default();
    let first = run_from_env(&backend).unwrap();
    let second = run_from_env(&backend).unwrap();

    set_env(None, None);

    for (a, b) in first.chains.iter().zip(&second.chains) {
        assert_eq!(a.rules, b.rules);
        assert_eq!(a.rules.len(), 2);
    }
}

#[test]
fn missing_namespace_range_leaves_chains_untouched() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("10.0.0.0/8"), None);

    let backend = MemoryChains::default();
    backend.seed(Chain::Input, &["-A INPUT -s 192.168.0.0/16 -j ACCEPT"]);
    let before = backend.snapshot();

    let err = run_from_env(&backend).unwrap_err();
    set_env(None, None);

    match err {
        Error::MissingEnv { var } => assert_eq!(var, ENV_NAMESPACE_RANGE),
        other => panic!("expected MissingEnv, got {other}"),
    }
    assert_eq!(backend.snapshot(), before, "filter state must be unchanged");
}

#[test]
fn malformed_cidr_leaves_chains_untouched() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("not-a-cidr"), Some("10.1.2.0/24"));

    let backend = MemoryChains::default();
    let before = backend.snapshot();

    let err = run_from_env(&backend).unwrap_err();
    set_env(None, None);

    assert!(matches!(err, Error::InvalidCidr { .. }));
    assert_eq!(backend.snapshot(), before);
}

#[test]
fn json_report_round_trips_chain_names() {
    let _guard = ENV_VAR_MUTEX.lock().unwrap();
    set_env(Some("10.0.0.0/8"), Some("10.1.2.0/24"));

    let backend = MemoryChains::default();
    let report = run_from_env(&backend).unwrap();
    set_env(None, None);

    let json = serde_json::to_value(&report).unwrap();
    let chains = json["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 2);
    assert_eq!(chains[0]["chain"], "Input");
    assert_eq!(chains[1]["chain"], "Output");
    assert_eq!(chains[0]["rules"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn keepalive_elapses_and_returns() {
    use nspolicy::keepalive::{self, KeepaliveOutcome};
    use std::time::{Duration, Instant};

    let start = Instant::now();
    let outcome = keepalive::wait(Duration::from_millis(50)).await.unwrap();

    assert_eq!(outcome, KeepaliveOutcome::Elapsed);
    assert!(start.elapsed() >= Duration::from_millis(50));
}
