//! Built-in identifier dataset for the supported device families.
//!
//! Families and version splits mirror the hardware actually deployed in the
//! Hamnet: MikroTik RouterOS (v5 and v6+ differ in the wireless registration
//! table), Ubiquiti AirOS (the pre-5.6 firmwares speak a quirky SNMPv1-only
//! dialect and lack several columns), Ubiquiti AirFiber, and ALIX Linux
//! boards (plain MIB-2, no wireless instrumentation over SNMP).
//!
//! Deployments with additional hardware load an extended dataset through
//! [`IdentifierTable::from_dataset`](super::IdentifierTable::from_dataset);
//! this module is the always-available baseline.

use semver::Version;

use super::{IdentifierEntry, IdentifierTable, VersionRange};
use crate::caps::{CapabilityKey, DataKind};
use crate::oid;
use crate::oid::Oid;

/// Well-known family name constants.
pub mod family {
    /// MikroTik RouterOS devices.
    pub const MIKROTIK: &str = "mikrotik";
    /// Ubiquiti AirOS devices (NanoStation, PowerBeam, ...).
    pub const UBIQUITI_AIROS: &str = "ubiquiti-airos";
    /// Ubiquiti AirFiber backhauls.
    pub const UBIQUITI_AIRFIBER: &str = "ubiquiti-airfiber";
    /// ALIX/APU Linux boards.
    pub const ALIX: &str = "alix";
}

fn ver(major: u64, minor: u64, patch: u64) -> Version {
    Version::new(major, minor, patch)
}

/// MIB-2 system and interface rows shared by every SNMP-speaking family.
fn mib2_rows() -> Vec<IdentifierEntry> {
    use CapabilityKey::*;
    vec![
        IdentifierEntry::oid_row(SysDescription, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), DataKind::String),
        IdentifierEntry::oid_row(SysObjectId, oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), DataKind::Oid),
        IdentifierEntry::oid_row(SysUptime, oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), DataKind::TimeTicks),
        IdentifierEntry::oid_row(SysContact, oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), DataKind::String),
        IdentifierEntry::oid_row(SysName, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), DataKind::String),
        IdentifierEntry::oid_row(SysLocation, oid!(1, 3, 6, 1, 2, 1, 1, 6, 0), DataKind::String),
        IdentifierEntry::oid_row(InterfaceTable, oid!(1, 3, 6, 1, 2, 1, 2, 2), DataKind::Table),
        IdentifierEntry::oid_row(
            InterfaceName,
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            InterfaceType,
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3),
            DataKind::Integer,
        ),
        IdentifierEntry::oid_row(
            InterfaceMac,
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6),
            DataKind::MacAddress,
        ),
    ]
}

/// MikroTik enterprise arc: 1.3.6.1.4.1.14988.
fn mikrotik_rows(with_tx_strength: bool) -> Vec<IdentifierEntry> {
    use CapabilityKey::*;
    // mtxrWlRtab: registration table keyed by (remote MAC, local ifIndex).
    let rtab = |col: u32| -> Oid { oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 1, 2, 1).with_suffix(&[col]) };

    let mut rows = mib2_rows();
    rows.extend([
        IdentifierEntry::oid_row(
            Model,
            oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 7, 8, 0),
            DataKind::String,
        ),
        // mtxrLicVersion: the RouterOS version string.
        IdentifierEntry::oid_row(
            FirmwareVersion,
            oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 4, 4, 0),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            WirelessPeerTable,
            oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 1, 2),
            DataKind::Table,
        ),
        IdentifierEntry::oid_row(WirelessPeerMac, rtab(1), DataKind::MacAddress),
        IdentifierEntry::oid_row(RxSignalStrength, rtab(3), DataKind::Integer),
        IdentifierEntry::oid_row(LinkUptime, rtab(11), DataKind::TimeTicks),
        IdentifierEntry::api_row(BgpPeerTable, "routing/bgp/peer"),
    ]);
    if with_tx_strength {
        rows.push(IdentifierEntry::oid_row(
            TxSignalStrength,
            rtab(19),
            DataKind::Integer,
        ));
    }
    rows
}

/// Ubiquiti enterprise arc: 1.3.6.1.4.1.41112.
fn airos_rows(with_station_ifindex: bool) -> Vec<IdentifierEntry> {
    use CapabilityKey::*;
    // ubntStaTable: station table keyed by remote MAC.
    let sta = |col: u32| -> Oid { oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 7, 1).with_suffix(&[col]) };

    let mut rows = mib2_rows();
    rows.extend([
        IdentifierEntry::oid_row(
            Model,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 1, 1, 2, 1),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            FirmwareVersion,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 1, 1, 4, 1),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            WirelessPeerTable,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 7),
            DataKind::Table,
        ),
        IdentifierEntry::oid_row(WirelessPeerMac, sta(1), DataKind::MacAddress),
        IdentifierEntry::oid_row(RxSignalStrength, sta(3), DataKind::Integer),
        IdentifierEntry::oid_row(LinkUptime, sta(6), DataKind::TimeTicks),
    ]);
    if with_station_ifindex {
        rows.push(IdentifierEntry::oid_row(
            WirelessPeerInterfaceId,
            sta(2),
            DataKind::Integer,
        ));
    }
    rows
}

/// AirFiber arc, parallel to AirOS but with its own table layout.
fn airfiber_rows() -> Vec<IdentifierEntry> {
    use CapabilityKey::*;
    let af = |col: u32| -> Oid { oid!(1, 3, 6, 1, 4, 1, 41112, 1, 3, 2, 1).with_suffix(&[col]) };

    let mut rows = mib2_rows();
    rows.extend([
        IdentifierEntry::oid_row(
            Model,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 3, 1, 1, 2, 1),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            FirmwareVersion,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 3, 1, 1, 3, 1),
            DataKind::String,
        ),
        IdentifierEntry::oid_row(
            WirelessPeerTable,
            oid!(1, 3, 6, 1, 4, 1, 41112, 1, 3, 2),
            DataKind::Table,
        ),
        IdentifierEntry::oid_row(WirelessPeerMac, af(4), DataKind::MacAddress),
        IdentifierEntry::oid_row(RxSignalStrength, af(5), DataKind::Integer),
        IdentifierEntry::oid_row(TxSignalStrength, af(6), DataKind::Integer),
        IdentifierEntry::oid_row(LinkUptime, af(7), DataKind::TimeTicks),
        IdentifierEntry::oid_row(WirelessPeerInterfaceId, af(2), DataKind::Integer),
    ]);
    rows
}

/// ALIX boards expose plain MIB-2 only.
fn alix_rows() -> Vec<IdentifierEntry> {
    mib2_rows()
}

/// Build the built-in table.
///
/// The result is read-only by construction; wrap it in an `Arc` and share it
/// across pollers.
pub fn builtin_table() -> IdentifierTable {
    let mut table = IdentifierTable::new();

    // MikroTik: v5 lacks the TX-strength column of the registration table.
    table.add_range(
        family::MIKROTIK,
        VersionRange {
            lower: Some(ver(6, 0, 0)),
            upper: None,
            mapping: "mikrotik-v6".into(),
        },
    );
    table.add_range(
        family::MIKROTIK,
        VersionRange {
            lower: None,
            upper: Some(ver(6, 0, 0)),
            mapping: "mikrotik-v5".into(),
        },
    );
    table.add_rows("mikrotik-v6", mikrotik_rows(true));
    table.add_rows("mikrotik-v5", mikrotik_rows(false));

    // AirOS: pre-5.6 firmwares miss the station ifIndex column.
    table.add_range(
        family::UBIQUITI_AIROS,
        VersionRange {
            lower: Some(ver(5, 6, 0)),
            upper: None,
            mapping: "airos-xm".into(),
        },
    );
    table.add_range(
        family::UBIQUITI_AIROS,
        VersionRange {
            lower: None,
            upper: Some(ver(5, 6, 0)),
            mapping: "airos-legacy".into(),
        },
    );
    table.add_rows("airos-xm", airos_rows(true));
    table.add_rows("airos-legacy", airos_rows(false));

    table.add_range(
        family::UBIQUITI_AIRFIBER,
        VersionRange {
            lower: None,
            upper: None,
            mapping: "airfiber".into(),
        },
    );
    table.add_rows("airfiber", airfiber_rows());

    table.add_range(
        family::ALIX,
        VersionRange {
            lower: None,
            upper: None,
            mapping: "alix-linux".into(),
        },
    );
    table.add_rows("alix-linux", alix_rows());

    table
}
