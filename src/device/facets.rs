//! Facet data types: what a device handler's four lazily-backed facets and
//! the eager traceroute operation resolve to.
//!
//! All types here are plain data - no transport references - so they can be
//! copied into a [`DeviceSnapshot`](super::DeviceSnapshot) and outlive the
//! session that produced them.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::oid::Oid;
use crate::value::MacAddress;

/// MIB-2 system group data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    /// sysDescr.
    pub description: Option<String>,
    /// sysName.
    pub name: Option<String>,
    /// sysLocation.
    pub location: Option<String>,
    /// sysContact.
    pub contact: Option<String>,
    /// sysUptime.
    pub uptime: Option<Duration>,
    /// sysObjectID.
    pub object_id: Option<Oid>,
}

/// IANA interface type (RFC 2863 ifType).
///
/// Only the values the engine dispatches on get their own variant; everything
/// else is carried through as [`Other`](Self::Other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    /// ethernetCsmacd (6)
    Ethernet,
    /// softwareLoopback (24)
    Loopback,
    /// ieee80211 (71) - the wireless tag the link detector filters on
    Ieee80211,
    /// bridge (209)
    Bridge,
    /// Any other IANA ifType value.
    Other(u32),
}

impl InterfaceType {
    /// Map a raw ifType value.
    pub fn from_iana(value: u32) -> Self {
        match value {
            6 => Self::Ethernet,
            24 => Self::Loopback,
            71 => Self::Ieee80211,
            209 => Self::Bridge,
            other => Self::Other(other),
        }
    }

    /// Whether this is a wireless interface.
    pub fn is_wireless(&self) -> bool {
        matches!(self, Self::Ieee80211)
    }
}

/// One row of the interface table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDetail {
    /// ifIndex, the row key.
    pub index: u32,
    /// ifDescr.
    pub name: Option<String>,
    /// IANA ifType.
    pub interface_type: Option<InterfaceType>,
    /// ifPhysAddress.
    pub mac: Option<MacAddress>,
}

impl InterfaceDetail {
    /// Whether the interface is tagged wireless.
    pub fn is_wireless(&self) -> bool {
        self.interface_type.is_some_and(|t| t.is_wireless())
    }
}

/// One row of the wireless registration/station table: a remote radio peer
/// as seen from this device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessPeer {
    /// Remote MAC address, the cross-device join key.
    pub remote_mac: MacAddress,
    /// ifIndex of the local interface the peer is registered on.
    pub interface_index: Option<u32>,
    /// RX signal strength in dBm (signal received *from* the peer).
    pub rx_signal_dbm: Option<i32>,
    /// TX signal strength in dBm (our signal as reported back by the peer).
    pub tx_signal_dbm: Option<i32>,
    /// How long the registration has been up.
    pub link_uptime: Option<Duration>,
}

/// One BGP peering as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpPeer {
    /// Peer name as configured on the device.
    pub name: Option<String>,
    /// Remote peer address.
    pub remote_address: Option<IpAddr>,
    /// Remote AS number.
    pub remote_as: Option<u32>,
    /// Session state string (e.g. "established").
    pub state: Option<String>,
    /// Session uptime as reported (vendor-formatted, e.g. "4d11h23m2s").
    pub uptime: Option<String>,
    /// Prefixes received from the peer.
    pub prefix_count: Option<u64>,
}

impl BgpPeer {
    /// Whether the session is established.
    pub fn is_established(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("established"))
    }
}

/// One traceroute hop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracerouteHop {
    /// Responding address, if the hop answered.
    pub address: Option<IpAddr>,
    /// Packet loss percentage at this hop.
    pub loss_percent: Option<f64>,
    /// Probes sent to this hop.
    pub sent: Option<u32>,
    /// Last round-trip time.
    pub last_rtt: Option<Duration>,
    /// Average round-trip time.
    pub average_rtt: Option<Duration>,
}

/// Result of the eager traceroute operation.
///
/// Inherently a fresh probe: never cached, never part of the lazy graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerouteResult {
    /// Probed target.
    pub target: IpAddr,
    /// Hops in path order.
    pub hops: Vec<TracerouteHop>,
}

/// Parameters of a traceroute probe.
#[derive(Debug, Clone)]
pub struct TracerouteSpec {
    /// Address to trace.
    pub target: IpAddr,
    /// Probes per hop.
    pub count: u32,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Hop limit.
    pub max_hops: u32,
}
