//! Vendor strategy trait.
//!
//! Vendor variants differ only in *how* each facet is populated (SNMP walks
//! vs. vendor-API list calls) and in which facets exist at all. Composition
//! keeps that variance in one strategy object per handler instead of a
//! handler class hierarchy.

use crate::device::facets::{
    BgpPeer, InterfaceDetail, SystemData, TracerouteResult, TracerouteSpec, WirelessPeer,
};
use crate::device::FeatureSet;
use crate::error::Result;
use crate::transport::BoxFuture;

/// Populates a device handler's facets for one vendor dialect.
///
/// Each fetch resolves to `Ok(Some(_))` with data, `Ok(None)` when the
/// capability is not in the device's resolved identifier set ("not
/// available"), or `Err` on a transport fault. A facet the device *class*
/// cannot answer at all is gated off by [`features`](Self::features) before
/// the strategy is even asked.
pub trait VendorStrategy: Send + Sync {
    /// Which facets this device class supports.
    fn features(&self) -> FeatureSet;

    /// Populate the system data facet.
    fn fetch_system(&self) -> BoxFuture<'_, Result<Option<SystemData>>>;

    /// Populate the interface list facet.
    fn fetch_interfaces(&self) -> BoxFuture<'_, Result<Option<Vec<InterfaceDetail>>>>;

    /// Populate the wireless peer list facet.
    fn fetch_wireless_peers(&self) -> BoxFuture<'_, Result<Option<Vec<WirelessPeer>>>>;

    /// Populate the BGP peer list facet (unfiltered; the handler filters).
    fn fetch_bgp_peers(&self) -> BoxFuture<'_, Result<Option<Vec<BgpPeer>>>>;

    /// Run a fresh traceroute probe.
    fn traceroute<'a>(&'a self, spec: &'a TracerouteSpec) -> BoxFuture<'a, Result<TracerouteResult>>;

    /// Release the underlying session(s).
    fn close(&self) -> BoxFuture<'_, Result<()>>;
}
