//! Capability vocabulary.
//!
//! [`CapabilityKey`] is the vendor-neutral name for a measurable concept,
//! shared between the identifier resolution table and every device handler.
//! Vendors differ in *which* protocol identifier answers a capability, never
//! in what the capability means.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic meaning of a retrievable value, stable across vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum CapabilityKey {
    /// MIB-2 sysDescr, the primary probe-time fingerprint.
    SysDescription,
    /// MIB-2 sysObjectID (vendor enterprise arc).
    SysObjectId,
    /// MIB-2 sysUptime.
    SysUptime,
    /// MIB-2 sysName.
    SysName,
    /// MIB-2 sysLocation.
    SysLocation,
    /// MIB-2 sysContact.
    SysContact,
    /// Hardware model string (vendor-specific identifier).
    Model,
    /// Firmware version string (vendor-specific identifier).
    FirmwareVersion,
    /// Interface table root (walked; rows keyed by ifIndex).
    InterfaceTable,
    /// IANA ifType column.
    InterfaceType,
    /// ifDescr / interface name column.
    InterfaceName,
    /// ifPhysAddress column.
    InterfaceMac,
    /// Wireless registration table root (walked; rows keyed by remote MAC).
    WirelessPeerTable,
    /// Remote MAC column of the registration table.
    WirelessPeerMac,
    /// RX signal strength column (dBm).
    RxSignalStrength,
    /// TX signal strength column (dBm).
    TxSignalStrength,
    /// Link uptime column.
    LinkUptime,
    /// Column naming the local interface a peer is registered on.
    WirelessPeerInterfaceId,
    /// BGP peer table (vendor API record kind for API-backed devices).
    BgpPeerTable,
}

impl CapabilityKey {
    /// Every capability enumerant, for the offline table consistency check.
    pub const ALL: [CapabilityKey; 19] = [
        Self::SysDescription,
        Self::SysObjectId,
        Self::SysUptime,
        Self::SysName,
        Self::SysLocation,
        Self::SysContact,
        Self::Model,
        Self::FirmwareVersion,
        Self::InterfaceTable,
        Self::InterfaceType,
        Self::InterfaceName,
        Self::InterfaceMac,
        Self::WirelessPeerTable,
        Self::WirelessPeerMac,
        Self::RxSignalStrength,
        Self::TxSignalStrength,
        Self::LinkUptime,
        Self::WirelessPeerInterfaceId,
        Self::BgpPeerTable,
    ];

    /// Stable string name (kebab-case, matching the serde form).
    pub fn name(&self) -> &'static str {
        match self {
            Self::SysDescription => "sys-description",
            Self::SysObjectId => "sys-object-id",
            Self::SysUptime => "sys-uptime",
            Self::SysName => "sys-name",
            Self::SysLocation => "sys-location",
            Self::SysContact => "sys-contact",
            Self::Model => "model",
            Self::FirmwareVersion => "firmware-version",
            Self::InterfaceTable => "interface-table",
            Self::InterfaceType => "interface-type",
            Self::InterfaceName => "interface-name",
            Self::InterfaceMac => "interface-mac",
            Self::WirelessPeerTable => "wireless-peer-table",
            Self::WirelessPeerMac => "wireless-peer-mac",
            Self::RxSignalStrength => "rx-signal-strength",
            Self::TxSignalStrength => "tx-signal-strength",
            Self::LinkUptime => "link-uptime",
            Self::WirelessPeerInterfaceId => "wireless-peer-interface-id",
            Self::BgpPeerTable => "bgp-peer-table",
        }
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Data type tag of an identifier table row.
///
/// The tag is advisory: it documents what type the device is expected to
/// answer with, and lets the offline consistency check catch rows whose tag
/// disagrees with how the engine consumes the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataKind {
    /// OCTET STRING consumed as text.
    String,
    /// Signed INTEGER.
    Integer,
    /// Gauge32 / Unsigned32.
    Gauge,
    /// TimeTicks.
    TimeTicks,
    /// 6-octet OCTET STRING consumed as a MAC address.
    MacAddress,
    /// OBJECT IDENTIFIER.
    Oid,
    /// Subtree root meant to be walked, not fetched.
    Table,
    /// Vendor API record kind (no SNMP identifier).
    ApiRecord,
}
