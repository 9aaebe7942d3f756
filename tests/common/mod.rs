//! Shared test fixtures: programmed mock devices for the supported
//! families.

// Not every test file uses every fixture.
#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use radioquery::oid;
use radioquery::oid::Oid;
use radioquery::table::builtin::builtin_table;
use radioquery::transport::mock::{MockSnmp, MockSnmpFactory, MockVendorApi, MockVendorApiFactory};
use radioquery::transport::ApiRecord;
use radioquery::value::{MacAddress, WireValue};
use radioquery::{IdentifierTable, ProbeChain, ProbeContext, QuerierOptions};

pub fn addr(last: u8) -> IpAddr {
    IpAddr::from([44, 0, 0, last])
}

pub fn mac(s: &str) -> MacAddress {
    s.parse().expect("fixture MAC")
}

fn mac_value(mac: MacAddress) -> WireValue {
    WireValue::OctetString(Bytes::copy_from_slice(&mac.octets()))
}

/// A RouterOS v6 device with system identity programmed.
pub fn routeros(addr: IpAddr, name: &str) -> MockSnmp {
    let mock = MockSnmp::new(addr);
    mock.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
        WireValue::from("RouterOS RB912UAG-5HPnD"),
    );
    mock.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        WireValue::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 14988, 1)),
    );
    mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), WireValue::TimeTicks(4_320_000));
    mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), WireValue::from(name));
    mock.insert(
        oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 7, 8, 0),
        WireValue::from("RB912UAG-5HPnD"),
    );
    mock.insert(
        oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 4, 4, 0),
        WireValue::from("6.48.6 (stable)"),
    );
    mock
}

/// An AirOS device (NanoStation class) with system identity programmed.
pub fn airos(addr: IpAddr, name: &str) -> MockSnmp {
    let mock = MockSnmp::new(addr);
    mock.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
        WireValue::from("Linux NanoStation 2.6.32 #1"),
    );
    mock.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        WireValue::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4)),
    );
    mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), WireValue::from(name));
    mock.insert(
        oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 1, 1, 2, 1),
        WireValue::from("NanoStation M5"),
    );
    mock.insert(
        oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 1, 1, 4, 1),
        WireValue::from("XM.ar7240.v5.6.15.30572.160219.1543"),
    );
    mock
}

/// A plain Linux board: MIB-2 only.
pub fn alix(addr: IpAddr, name: &str) -> MockSnmp {
    let mock = MockSnmp::new(addr);
    mock.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
        WireValue::from(format!("Linux {name} 4.19.0-amd64 #1 SMP x86_64").as_str()),
    );
    mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), WireValue::from(name));
    mock
}

/// Program one ifTable row.
pub fn add_interface(mock: &MockSnmp, index: u32, name: &str, iftype: i32, mac: Option<MacAddress>) {
    let entry = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
    mock.insert(entry.with_suffix(&[2, index]), WireValue::from(name));
    mock.insert(entry.with_suffix(&[3, index]), WireValue::Integer(iftype));
    if let Some(mac) = mac {
        mock.insert(entry.with_suffix(&[6, index]), mac_value(mac));
    }
}

/// Program one RouterOS registration-table row (key: MAC arcs + ifIndex).
pub fn add_routeros_peer(
    mock: &MockSnmp,
    remote: MacAddress,
    ifindex: u32,
    rx_dbm: i32,
    tx_dbm: i32,
    uptime_ticks: u32,
) {
    let rtab = oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 1, 2, 1);
    let mut key: Vec<u32> = remote.octets().iter().map(|&o| u32::from(o)).collect();
    key.push(ifindex);
    let row = |col: u32| -> Oid { rtab.with_suffix(&[col]).with_suffix(&key) };
    mock.insert(row(1), mac_value(remote));
    mock.insert(row(3), WireValue::Integer(rx_dbm));
    mock.insert(row(11), WireValue::TimeTicks(uptime_ticks));
    mock.insert(row(19), WireValue::Integer(tx_dbm));
}

/// Program one AirOS station-table row (key: MAC arcs).
pub fn add_airos_peer(
    mock: &MockSnmp,
    remote: MacAddress,
    ifindex: u32,
    rx_dbm: i32,
    uptime_ticks: u32,
) {
    let sta = oid!(1, 3, 6, 1, 4, 1, 41112, 1, 4, 7, 1);
    let key: Vec<u32> = remote.octets().iter().map(|&o| u32::from(o)).collect();
    let row = |col: u32| -> Oid { sta.with_suffix(&[col]).with_suffix(&key) };
    mock.insert(row(1), mac_value(remote));
    mock.insert(row(2), WireValue::Integer(ifindex as i32));
    mock.insert(row(3), WireValue::Integer(rx_dbm));
    mock.insert(row(6), WireValue::TimeTicks(uptime_ticks));
}

/// BGP peer record in RouterOS API form.
pub fn bgp_record(name: &str, remote: &str, remote_as: u32, state: &str) -> ApiRecord {
    let mut record = ApiRecord::new();
    record.insert("name".into(), name.into());
    record.insert("remote-address".into(), remote.into());
    record.insert("remote-as".into(), remote_as.to_string());
    record.insert("state".into(), state.into());
    record.insert("prefix-count".into(), "42".into());
    record
}

/// A probe context over mock factories, with the built-in table.
pub fn context(
    addr: IpAddr,
    options: QuerierOptions,
    snmp: Option<MockSnmp>,
    api: Option<MockVendorApi>,
) -> ProbeContext {
    let snmp_factory = MockSnmpFactory::new();
    if let Some(snmp) = snmp {
        snmp_factory.register(addr, snmp);
    }
    let api_factory = MockVendorApiFactory::new();
    if let Some(api) = api {
        api_factory.register(addr, api);
    }
    ProbeContext::new(
        addr,
        options,
        Arc::new(snmp_factory),
        Arc::new(api_factory),
        Arc::new(builtin_table()),
    )
}

/// Context over an arbitrary table, for construction-failure scenarios.
pub fn context_with_table(
    addr: IpAddr,
    options: QuerierOptions,
    snmp: Option<MockSnmp>,
    table: IdentifierTable,
) -> ProbeContext {
    let snmp_factory = MockSnmpFactory::new();
    if let Some(snmp) = snmp {
        snmp_factory.register(addr, snmp);
    }
    ProbeContext::new(
        addr,
        options,
        Arc::new(snmp_factory),
        Arc::new(MockVendorApiFactory::new()),
        Arc::new(table),
    )
}

/// Detect with the built-in chain.
pub async fn detect(
    ctx: &ProbeContext,
) -> radioquery::Result<radioquery::DeviceHandler> {
    ProbeChain::new().detect(ctx).await
}
