//! Transport-independent result snapshots.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::facets::{BgpPeer, InterfaceDetail, SystemData, WirelessPeer};
use super::DeviceIdentity;

/// A device handler's fully evaluated result graph, detached from its
/// transport session.
///
/// Produced by [`DeviceHandler::detach`](super::DeviceHandler::detach):
/// plain data, safe to hand to another thread, serialize, or keep after the
/// session is closed. `None` facets were "not available" on this
/// device/version (or unsupported by its class).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// The device's identity as detected.
    pub identity: DeviceIdentity,
    /// System group data.
    pub system: Option<SystemData>,
    /// Interface list.
    pub interfaces: Option<Vec<InterfaceDetail>>,
    /// Wireless peer list.
    pub wireless_peers: Option<Vec<WirelessPeer>>,
    /// BGP peer list.
    pub bgp_peers: Option<Vec<BgpPeer>>,
    /// Total wire time the evaluation of this graph cost.
    pub query_duration: Duration,
}

impl DeviceSnapshot {
    /// Wireless interfaces only (IANA ieee80211).
    pub fn wireless_interfaces(&self) -> impl Iterator<Item = &InterfaceDetail> {
        self.interfaces
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|i| i.is_wireless())
    }
}
