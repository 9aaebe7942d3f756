//! Failure-driven retry governor.
//!
//! Pollers record query failures and successes here; before retrying a
//! previously failing device, they ask whether the retry is due. Every
//! failure doubles a per-entity penalty interval (bounded by the configured
//! maximum), a success deletes the record entirely, and a retry is due once
//! more time than the current penalty has passed since the last failure.
//!
//! Entities live in two independent keyspaces per query type - host address
//! and network prefix - each behind its own lock, so parallel pollers
//! updating different query types never contend.
//!
//! Positive feasibility answers are damped: half of them, chosen
//! pseudo-randomly, come back negative anyway. Without this, every poller
//! sharing a governor would retry a recovering backbone segment in the same
//! tick.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query classes governed independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryType {
    /// Wireless signal (RSSI) polling.
    RssiQuery,
    /// BGP peering polling.
    BgpQuery,
}

impl QueryType {
    /// All governed query types, in store order.
    pub const ALL: [QueryType; 2] = [QueryType::RssiQuery, QueryType::BgpQuery];

    fn index(self) -> usize {
        match self {
            Self::RssiQuery => 0,
            Self::BgpQuery => 1,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RssiQuery => write!(f, "rssi"),
            Self::BgpQuery => write!(f, "bgp"),
        }
    }
}

/// A governed entity: one host or one network prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureEntity {
    /// A single device address.
    Host(IpAddr),
    /// A network prefix (typically the link net both ends sit in).
    Net(IpNet),
}

impl std::fmt::Display for FailureEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(addr) => write!(f, "{addr}"),
            Self::Net(net) => write!(f, "{net}"),
        }
    }
}

/// Failure history of one entity under one query type.
#[derive(Debug, Clone, Copy)]
pub struct SingleFailureInfo {
    /// How many failures have been recorded.
    pub occurrences: u64,
    /// When the first failure was recorded.
    pub first_seen: Instant,
    /// When the most recent failure was recorded.
    pub last_seen: Instant,
    /// Current penalty interval; a retry is due once more than this has
    /// elapsed since `last_seen`.
    pub penalty: Duration,
}

impl SingleFailureInfo {
    fn record(&mut self, now: Instant, maximum: Duration) {
        self.occurrences += 1;
        self.last_seen = now;
        self.penalty = (self.penalty * 2).min(maximum);
    }

    fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) > self.penalty
    }
}

/// Penalty bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Penalty assigned before the first doubling.
    pub minimum_penalty: Duration,
    /// Cap the doubling stops at.
    pub maximum_penalty: Duration,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            minimum_penalty: Duration::from_secs(60),
            maximum_penalty: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Default)]
struct TypeStore {
    hosts: Mutex<HashMap<IpAddr, SingleFailureInfo>>,
    nets: Mutex<HashMap<IpNet, SingleFailureInfo>>,
}

/// The retry governor. One instance is shared by all pollers.
pub struct RetryGovernor {
    config: GovernorConfig,
    stores: [TypeStore; QueryType::ALL.len()],
    damping: bool,
    damping_counter: AtomicU64,
}

impl Default for RetryGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

impl RetryGovernor {
    /// Governor with the given penalty bounds and damping enabled.
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            stores: Default::default(),
            damping: true,
            damping_counter: AtomicU64::new(0),
        }
    }

    /// Enable or disable the 50% damping of positive answers.
    ///
    /// Tests disable it to get deterministic feasibility.
    pub fn with_damping(mut self, damping: bool) -> Self {
        self.damping = damping;
        self
    }

    /// The configured penalty bounds.
    pub fn config(&self) -> GovernorConfig {
        self.config
    }

    /// Record a failed query against the named entities.
    pub fn record_failure(
        &self,
        query: QueryType,
        addresses: &[IpAddr],
        network: Option<IpNet>,
    ) {
        self.record_failure_at(query, addresses, network, Instant::now());
    }

    /// [`record_failure`](Self::record_failure) with an explicit clock.
    pub fn record_failure_at(
        &self,
        query: QueryType,
        addresses: &[IpAddr],
        network: Option<IpNet>,
        now: Instant,
    ) {
        let store = &self.stores[query.index()];
        let fresh = SingleFailureInfo {
            occurrences: 0,
            first_seen: now,
            last_seen: now,
            penalty: self.config.minimum_penalty,
        };
        {
            let mut hosts = store.hosts.lock().unwrap();
            for &addr in addresses {
                let info = hosts.entry(addr).or_insert(fresh);
                info.record(now, self.config.maximum_penalty);
                debug!(
                    target: "radioquery::governor",
                    query = %query,
                    entity = %addr,
                    occurrences = info.occurrences,
                    penalty_secs = info.penalty.as_secs(),
                    "failure recorded"
                );
            }
        }
        if let Some(net) = network {
            let mut nets = store.nets.lock().unwrap();
            let info = nets.entry(net).or_insert(fresh);
            info.record(now, self.config.maximum_penalty);
            debug!(
                target: "radioquery::governor",
                query = %query,
                entity = %net,
                occurrences = info.occurrences,
                penalty_secs = info.penalty.as_secs(),
                "failure recorded"
            );
        }
    }

    /// Record a successful query: the named entities' failure records are
    /// deleted outright, so a later failure starts over at the minimum
    /// penalty.
    pub fn record_success(
        &self,
        query: QueryType,
        addresses: &[IpAddr],
        network: Option<IpNet>,
    ) {
        let store = &self.stores[query.index()];
        {
            let mut hosts = store.hosts.lock().unwrap();
            for addr in addresses {
                if hosts.remove(addr).is_some() {
                    debug!(
                        target: "radioquery::governor",
                        query = %query,
                        entity = %addr,
                        "failure record cleared"
                    );
                }
            }
        }
        if let Some(net) = network {
            store.nets.lock().unwrap().remove(&net);
        }
    }

    /// Whether a retry against the given keys is due.
    ///
    /// `None` means "no opinion": no key was given, or a given key has no
    /// failure record on either side of the combination. With both keys
    /// given, both entities must be due. A positive answer may still come
    /// back `Some(false)` from damping.
    pub fn is_retry_feasible(
        &self,
        query: QueryType,
        address: Option<IpAddr>,
        network: Option<IpNet>,
    ) -> Option<bool> {
        self.is_retry_feasible_at(query, address, network, Instant::now())
    }

    /// [`is_retry_feasible`](Self::is_retry_feasible) with an explicit
    /// clock.
    pub fn is_retry_feasible_at(
        &self,
        query: QueryType,
        address: Option<IpAddr>,
        network: Option<IpNet>,
        now: Instant,
    ) -> Option<bool> {
        let store = &self.stores[query.index()];

        let host_due = match address {
            None => None,
            Some(addr) => Some(store.hosts.lock().unwrap().get(&addr).map(|i| i.is_due(now))?),
        };
        let net_due = match network {
            None => None,
            Some(net) => Some(store.nets.lock().unwrap().get(&net).map(|i| i.is_due(now))?),
        };

        let feasible = match (host_due, net_due) {
            (None, None) => return None,
            (Some(host), None) => host,
            (None, Some(net)) => net,
            (Some(host), Some(net)) => host && net,
        };
        if feasible && self.damping && self.damp() {
            debug!(
                target: "radioquery::governor",
                query = %query,
                "positive feasibility damped"
            );
            return Some(false);
        }
        Some(feasible)
    }

    // Multiplicative-hash coin flip over a shared counter.
    fn damp(&self) -> bool {
        let tick = self.damping_counter.fetch_add(1, Ordering::Relaxed);
        tick.wrapping_mul(0x5851_f42d_4c95_7f2d) >> 63 == 1
    }

    /// Snapshot of every failure record under a query type.
    pub fn query_details(&self, query: QueryType) -> Vec<(FailureEntity, SingleFailureInfo)> {
        let store = &self.stores[query.index()];
        let mut details: Vec<(FailureEntity, SingleFailureInfo)> = store
            .hosts
            .lock()
            .unwrap()
            .iter()
            .map(|(addr, info)| (FailureEntity::Host(*addr), *info))
            .collect();
        details.extend(
            store
                .nets
                .lock()
                .unwrap()
                .iter()
                .map(|(net, info)| (FailureEntity::Net(*net), *info)),
        );
        details
    }
}
