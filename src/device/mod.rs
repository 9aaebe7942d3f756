//! Device handlers.
//!
//! A [`DeviceHandler`] bundles a detected device's identity, its resolved
//! identifier set, and four lazily-backed facets - system data, interfaces,
//! wireless peers, BGP peers - plus the eager traceroute operation. Vendor
//! variance lives in a [`VendorStrategy`] object; the handler itself is a
//! single concrete type.
//!
//! # Session lifetime (critical)
//!
//! A handler owns its transport session and must keep it open until every
//! lazy value that will ever be read has been read or force-evaluated.
//! [`DeviceHandler::close`] seals all still-pending cells to "not available"
//! - indistinguishable from real absence - so callers that need results
//! beyond the session call [`force_evaluate_all`](DeviceHandler::force_evaluate_all)
//! (or [`detach`](DeviceHandler::detach), which forces first) before closing.

pub mod facets;
mod mikrotik;
mod snapshot;
mod snmp;
mod strategy;

pub use facets::{
    BgpPeer, InterfaceDetail, InterfaceType, SystemData, TracerouteHop, TracerouteResult,
    TracerouteSpec, WirelessPeer,
};
pub use mikrotik::MikrotikStrategy;
pub use snapshot::DeviceSnapshot;
pub use snmp::SnmpStrategy;
pub use strategy::VendorStrategy;

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lazy::{LazyCell, QueryMeter};
use crate::table::ResolvedIdentifierSet;

/// One of the handler's externally visible facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    /// MIB-2 system group.
    SystemData,
    /// Interface list.
    Interfaces,
    /// Wireless peer (registration) list.
    WirelessPeers,
    /// BGP peer list.
    BgpPeers,
    /// Eager traceroute probe.
    Traceroute,
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SystemData => write!(f, "system data"),
            Self::Interfaces => write!(f, "interfaces"),
            Self::WirelessPeers => write!(f, "wireless peers"),
            Self::BgpPeers => write!(f, "BGP peers"),
            Self::Traceroute => write!(f, "traceroute"),
        }
    }
}

/// Which facets a detected device supports.
///
/// Populated once at detection from the device class and its resolved
/// identifier set; immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// RX/TX signal measurements are available.
    pub rssi: bool,
    /// The wireless peer facet can be asked.
    pub wireless_peers: bool,
    /// The BGP peer facet can be asked.
    pub bgp_peers: bool,
    /// Traceroute probes can be launched.
    pub traceroute: bool,
}

impl FeatureSet {
    /// Whether the given facet can be asked on this device.
    ///
    /// System data and interfaces are universal; the rest depend on class.
    pub fn supports(&self, facet: Facet) -> bool {
        match facet {
            Facet::SystemData | Facet::Interfaces => true,
            Facet::WirelessPeers => self.wireless_peers,
            Facet::BgpPeers => self.bgp_peers,
            Facet::Traceroute => self.traceroute,
        }
    }
}

/// Immutable identity of a successfully detected device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Device address.
    pub address: IpAddr,
    /// Device family name (resolution table key).
    pub family: String,
    /// Hardware model string.
    pub model: String,
    /// Detected firmware version, when the device reports a parseable one.
    pub version: Option<semver::Version>,
    /// Supported feature flags.
    pub features: FeatureSet,
}

/// Per-session facade over one detected device.
pub struct DeviceHandler {
    identity: DeviceIdentity,
    resolved: Arc<ResolvedIdentifierSet>,
    strategy: Box<dyn VendorStrategy>,
    meter: QueryMeter,
    system: LazyCell<SystemData>,
    interfaces: LazyCell<Vec<InterfaceDetail>>,
    wireless_peers: LazyCell<Vec<WirelessPeer>>,
    bgp_peers: LazyCell<Vec<BgpPeer>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for DeviceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandler")
            .field("identity", &self.identity)
            .field("mapping", &self.resolved.mapping())
            .finish_non_exhaustive()
    }
}

impl DeviceHandler {
    /// Assemble a handler from a detected identity, its resolved identifier
    /// set, and a vendor strategy. Called by probe candidates.
    pub fn new(
        identity: DeviceIdentity,
        resolved: Arc<ResolvedIdentifierSet>,
        strategy: Box<dyn VendorStrategy>,
    ) -> Self {
        Self {
            identity,
            resolved,
            strategy,
            meter: QueryMeter::new(),
            system: LazyCell::new(),
            interfaces: LazyCell::new(),
            wireless_peers: LazyCell::new(),
            bgp_peers: LazyCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// The device's immutable identity.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// The device address.
    pub fn address(&self) -> IpAddr {
        self.identity.address
    }

    /// The resolved identifier set this handler queries through.
    pub fn resolved(&self) -> &ResolvedIdentifierSet {
        &self.resolved
    }

    /// Total wire time spent by queries this handler's values triggered.
    ///
    /// Additive: reading an already-evaluated value adds nothing.
    pub fn query_duration(&self) -> Duration {
        self.meter.total()
    }

    fn ensure_supported(&self, facet: Facet) -> Result<()> {
        if self.identity.features.supports(facet) {
            Ok(())
        } else {
            Err(Error::FacetUnsupported {
                addr: self.identity.address,
                model: self.identity.model.clone(),
                facet,
            }
            .boxed())
        }
    }

    /// System data facet. `None` when the device resolves no system group
    /// identifiers at all.
    pub async fn system_data(&self) -> Result<Option<SystemData>> {
        self.system
            .get_or_eval(&self.meter, || self.strategy.fetch_system())
            .await
    }

    /// Interface list facet.
    pub async fn interfaces(&self) -> Result<Option<Vec<InterfaceDetail>>> {
        self.interfaces
            .get_or_eval(&self.meter, || self.strategy.fetch_interfaces())
            .await
    }

    /// Wireless peer facet.
    ///
    /// [`Error::FacetUnsupported`] when this device class has no wireless
    /// instrumentation - distinct from `Ok(Some(vec![]))`, which means "no
    /// peers right now".
    pub async fn wireless_peers(&self) -> Result<Option<Vec<WirelessPeer>>> {
        self.ensure_supported(Facet::WirelessPeers)?;
        self.wireless_peers
            .get_or_eval(&self.meter, || self.strategy.fetch_wireless_peers())
            .await
    }

    /// BGP peer facet, optionally filtered by remote peer address.
    ///
    /// The full list is fetched and cached once; the filter applies on read.
    pub async fn bgp_peers(&self, remote_filter: Option<IpAddr>) -> Result<Option<Vec<BgpPeer>>> {
        self.ensure_supported(Facet::BgpPeers)?;
        let peers = self
            .bgp_peers
            .get_or_eval(&self.meter, || self.strategy.fetch_bgp_peers())
            .await?;
        Ok(peers.map(|peers| match remote_filter {
            None => peers,
            Some(addr) => peers
                .into_iter()
                .filter(|peer| peer.remote_address == Some(addr))
                .collect(),
        }))
    }

    /// Run a traceroute probe from this device.
    ///
    /// Eager and uncached: every call is a fresh probe.
    pub async fn traceroute(
        &self,
        target: IpAddr,
        count: u32,
        timeout: Duration,
        max_hops: u32,
    ) -> Result<TracerouteResult> {
        self.ensure_supported(Facet::Traceroute)?;
        let spec = TracerouteSpec {
            target,
            count,
            timeout,
            max_hops,
        };
        let start = std::time::Instant::now();
        let result = self.strategy.traceroute(&spec).await;
        self.meter.add(start.elapsed());
        result
    }

    /// Evaluate every lazy property of the result graph.
    ///
    /// Idempotent: already-evaluated cells are untouched and add no wire
    /// time. Facets the device class does not support are skipped; transport
    /// faults propagate.
    pub async fn force_evaluate_all(&self) -> Result<()> {
        self.system_data().await?;
        self.interfaces().await?;
        if self.identity.features.supports(Facet::WirelessPeers) {
            self.wireless_peers().await?;
        }
        if self.identity.features.supports(Facet::BgpPeers) {
            self.bgp_peers(None).await?;
        }
        Ok(())
    }

    /// Force-evaluate the graph and copy it into a transport-independent
    /// [`DeviceSnapshot`], ready for the session to be closed.
    pub async fn detach(&self) -> Result<DeviceSnapshot> {
        self.force_evaluate_all().await?;
        Ok(DeviceSnapshot {
            identity: self.identity.clone(),
            system: self.system.peek().await.flatten(),
            interfaces: self.interfaces.peek().await.flatten(),
            wireless_peers: self.wireless_peers.peek().await.flatten(),
            bgp_peers: self.bgp_peers.peek().await.flatten(),
            query_duration: self.meter.total(),
        })
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release the transport session.
    ///
    /// Any still-pending lazy value is sealed to "not available" first -
    /// permanently, and indistinguishably from real absence. Detach before
    /// closing if the results are still needed.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.system.seal_absent().await;
        self.interfaces.seal_absent().await;
        self.wireless_peers.seal_absent().await;
        self.bgp_peers.seal_absent().await;
        tracing::debug!(
            target: "radioquery::device",
            addr = %self.identity.address,
            wire_ms = self.meter.total().as_millis() as u64,
            "closing device session"
        );
        self.strategy.close().await
    }
}
