//! Cross-device link detection.
//!
//! Given handlers for the two ends of a point-to-point radio link,
//! correlates side one's wireless interfaces with side two's wireless peer
//! registrations by MAC address. The MAC is the only join key the two
//! devices share; [`MacAddress`] stores raw octets, so the match is
//! case-insensitive by construction regardless of how either vendor formats
//! the address.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::device::{DeviceHandler, InterfaceDetail, WirelessPeer};
use crate::error::{Error, Result};
use crate::value::MacAddress;

/// One detected directional pairing between two devices.
///
/// "Side one" and "side two" follow the argument order of [`detect_link`];
/// the pairing itself is bidirectional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDetail {
    /// Address of the side-one device.
    pub side_one_address: IpAddr,
    /// Address of the side-two device.
    pub side_two_address: IpAddr,
    /// MAC of the side-one wireless interface, the join key.
    pub side_one_mac: MacAddress,
    /// MAC of the side-two interface carrying the registration, when the
    /// peer row names its interface and that interface reports a MAC.
    pub side_two_mac: Option<MacAddress>,
    /// The side-one wireless interface.
    pub side_one_interface: InterfaceDetail,
    /// The side-two interface carrying the registration, when resolvable.
    pub side_two_interface: Option<InterfaceDetail>,
    /// Side one's signal as measured by side two, in dBm.
    pub rx_one_at_two_dbm: Option<i32>,
    /// Side two's signal as measured by side one, in dBm.
    pub rx_two_at_one_dbm: Option<i32>,
    /// Registration uptime, from whichever side reports one.
    pub link_uptime: Option<Duration>,
}

/// The peer list, with "this device class has no wireless instrumentation"
/// flattened to an empty list. A board without a radio terminates no link.
async fn peer_list(handler: &DeviceHandler) -> Result<Vec<WirelessPeer>> {
    match handler.wireless_peers().await {
        Ok(list) => Ok(list.unwrap_or_default()),
        Err(err) if matches!(*err, Error::FacetUnsupported { .. }) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

/// Detect the radio link(s) between two devices.
///
/// Emits one [`LinkDetail`] per (side-one wireless interface, side-two peer
/// registration) pair with matching MACs. Several peers sharing a MAC all
/// produce their own pair - nothing is deduplicated. No match is an empty
/// list, not an error; whether that means "link down" is the caller's call.
#[instrument(level = "debug", skip(one, two), fields(one = %one.address(), two = %two.address()))]
pub async fn detect_link(one: &DeviceHandler, two: &DeviceHandler) -> Result<Vec<LinkDetail>> {
    let one_interfaces = one.interfaces().await?.unwrap_or_default();
    let wireless: Vec<&InterfaceDetail> = one_interfaces
        .iter()
        .filter(|iface| iface.is_wireless() && iface.mac.is_some())
        .collect();
    if wireless.is_empty() {
        debug!(
            target: "radioquery::link",
            one = %one.address(),
            "side one has no wireless interfaces with a MAC"
        );
        return Ok(Vec::new());
    }

    let two_peers = peer_list(two).await?;
    let two_interfaces = two.interfaces().await?.unwrap_or_default();
    let one_peers = peer_list(one).await?;

    let mut links = Vec::new();
    for iface in wireless {
        let Some(mac) = iface.mac else { continue };
        for peer in two_peers.iter().filter(|peer| peer.remote_mac == mac) {
            let side_two_interface = peer
                .interface_index
                .and_then(|index| two_interfaces.iter().find(|i| i.index == index))
                .cloned();
            let side_two_mac = side_two_interface.as_ref().and_then(|i| i.mac);

            // The reverse level comes from side one's own registration of
            // side two when available, falling back to the TX level side
            // two reports for us.
            let reverse = side_two_mac
                .and_then(|mac| one_peers.iter().find(|p| p.remote_mac == mac));
            let rx_two_at_one = reverse
                .and_then(|p| p.rx_signal_dbm)
                .or(peer.tx_signal_dbm);

            links.push(LinkDetail {
                side_one_address: one.address(),
                side_two_address: two.address(),
                side_one_mac: mac,
                side_two_mac,
                side_one_interface: iface.clone(),
                side_two_interface,
                rx_one_at_two_dbm: peer.rx_signal_dbm,
                rx_two_at_one_dbm: rx_two_at_one,
                link_uptime: peer.link_uptime.or_else(|| reverse.and_then(|p| p.link_uptime)),
            });
        }
    }
    debug!(
        target: "radioquery::link",
        one = %one.address(),
        two = %two.address(),
        links = links.len(),
        "link detection complete"
    );
    Ok(links)
}
