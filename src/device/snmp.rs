//! Generic SNMP facet population.
//!
//! Covers every family whose facets are answerable over plain SNMP walks:
//! Ubiquiti AirOS/AirFiber, ALIX, and the SNMP side of MikroTik. Which
//! identifiers exist for the concrete device/version is entirely driven by
//! its [`ResolvedIdentifierSet`]; this strategy contains no per-family
//! branching.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::Arc;

use tracing::instrument;

use super::facets::{
    BgpPeer, InterfaceDetail, SystemData, TracerouteResult, TracerouteSpec,
    WirelessPeer,
};
use super::strategy::VendorStrategy;
use super::{Facet, FeatureSet};
use crate::caps::CapabilityKey;
use crate::error::{Error, Result};
use crate::table::ResolvedIdentifierSet;
use crate::transport::{BoxFuture, SnmpTransport};
use crate::value::{MacAddress, WireValue};

/// Facet population over SNMP get/walk.
pub struct SnmpStrategy {
    addr: IpAddr,
    model: String,
    resolved: Arc<ResolvedIdentifierSet>,
    session: Arc<dyn SnmpTransport>,
}

impl SnmpStrategy {
    /// Wrap an open SNMP session for the given resolved identifier set.
    pub fn new(
        addr: IpAddr,
        model: impl Into<String>,
        resolved: Arc<ResolvedIdentifierSet>,
        session: Arc<dyn SnmpTransport>,
    ) -> Self {
        Self {
            addr,
            model: model.into(),
            resolved,
            session,
        }
    }

    /// Feature flags derivable from the resolved set alone.
    pub fn derived_features(resolved: &ResolvedIdentifierSet) -> FeatureSet {
        FeatureSet {
            rssi: resolved.get(CapabilityKey::RxSignalStrength).is_some(),
            wireless_peers: resolved.get(CapabilityKey::WirelessPeerMac).is_some(),
            bgp_peers: false,
            traceroute: false,
        }
    }

    /// Walk one table column; rows keyed by the OID suffix past the column.
    ///
    /// `Ok(None)` when the capability has no row in the resolved set.
    async fn walk_column(
        &self,
        capability: CapabilityKey,
    ) -> Result<Option<HashMap<Vec<u32>, WireValue>>> {
        let Some(column) = self.resolved.oid_for(capability) else {
            return Ok(None);
        };
        let bindings = self.session.walk(column).await?;
        let mut rows = HashMap::with_capacity(bindings.len());
        for (oid, value) in bindings {
            if let Some(suffix) = oid.suffix_after(column) {
                rows.insert(suffix.to_vec(), value);
            }
        }
        Ok(Some(rows))
    }

    #[instrument(level = "debug", skip(self), fields(addr = %self.addr))]
    async fn system(&self) -> Result<Option<SystemData>> {
        use CapabilityKey::*;
        let wanted = [
            SysDescription,
            SysName,
            SysLocation,
            SysContact,
            SysUptime,
            SysObjectId,
        ];
        let present: Vec<_> = wanted
            .iter()
            .filter_map(|&cap| self.resolved.oid_for(cap).map(|oid| (cap, oid.clone())))
            .collect();
        if present.is_empty() {
            return Ok(None);
        }

        let oids: Vec<_> = present.iter().map(|(_, oid)| oid.clone()).collect();
        let bindings = self.session.get(&oids).await?;

        let mut data = SystemData::default();
        for ((cap, _), (_, value)) in present.iter().zip(bindings) {
            if value.is_absent() {
                continue;
            }
            match cap {
                SysDescription => data.description = value.as_str(),
                SysName => data.name = value.as_str(),
                SysLocation => data.location = value.as_str(),
                SysContact => data.contact = value.as_str(),
                SysUptime => data.uptime = value.as_ticks_duration(),
                SysObjectId => data.object_id = value.as_oid().cloned(),
                _ => {}
            }
        }
        Ok(Some(data))
    }

    #[instrument(level = "debug", skip(self), fields(addr = %self.addr))]
    async fn interfaces(&self) -> Result<Option<Vec<InterfaceDetail>>> {
        use CapabilityKey::*;
        if self.resolved.get(InterfaceTable).is_none()
            && self.resolved.get(InterfaceName).is_none()
        {
            return Ok(None);
        }

        let names = self.walk_column(InterfaceName).await?.unwrap_or_default();
        let types = self.walk_column(InterfaceType).await?.unwrap_or_default();
        let macs = self.walk_column(InterfaceMac).await?.unwrap_or_default();

        // Rows keyed by ifIndex; BTreeMap for stable index order.
        let mut rows: BTreeMap<u32, InterfaceDetail> = BTreeMap::new();
        let indices = names.keys().chain(types.keys()).chain(macs.keys());
        for suffix in indices {
            let &[index] = suffix.as_slice() else { continue };
            rows.entry(index).or_insert_with(|| InterfaceDetail {
                index,
                name: None,
                interface_type: None,
                mac: None,
            });
        }
        for (suffix, detail) in rows.iter_mut().map(|(i, d)| (vec![*i], d)) {
            detail.name = names.get(&suffix).and_then(WireValue::as_str);
            detail.interface_type = types
                .get(&suffix)
                .and_then(WireValue::as_u32)
                .map(super::facets::InterfaceType::from_iana);
            detail.mac = macs.get(&suffix).and_then(WireValue::as_mac);
        }
        Ok(Some(rows.into_values().collect()))
    }

    #[instrument(level = "debug", skip(self), fields(addr = %self.addr))]
    async fn wireless_peers(&self) -> Result<Option<Vec<WirelessPeer>>> {
        use CapabilityKey::*;
        let Some(mac_rows) = self.walk_column(WirelessPeerMac).await? else {
            return Ok(None);
        };

        let rx = self.walk_column(RxSignalStrength).await?.unwrap_or_default();
        let tx = self.walk_column(TxSignalStrength).await?.unwrap_or_default();
        let uptime = self.walk_column(LinkUptime).await?.unwrap_or_default();
        let ifindex = self
            .walk_column(WirelessPeerInterfaceId)
            .await?
            .unwrap_or_default();

        let mut peers = Vec::with_capacity(mac_rows.len());
        let mut keys: Vec<_> = mac_rows.keys().cloned().collect();
        keys.sort_unstable();
        for key in keys {
            let value = &mac_rows[&key];
            // The remote MAC comes from the column value, or from the row
            // key itself - registration tables encode it as six arcs.
            let remote_mac = value
                .as_mac()
                .or_else(|| MacAddress::from_arcs(key.get(..6)?));
            let Some(remote_mac) = remote_mac else {
                tracing::warn!(
                    target: "radioquery::device",
                    addr = %self.addr,
                    row = ?key,
                    "wireless peer row without a decodable MAC, skipping"
                );
                continue;
            };

            // MikroTik-style row keys carry the local ifIndex as a seventh
            // arc; AirOS-style tables expose it as a column instead.
            let interface_index = match key.len() {
                7 => Some(key[6]),
                _ => ifindex.get(&key).and_then(WireValue::as_u32),
            };

            peers.push(WirelessPeer {
                remote_mac,
                interface_index,
                rx_signal_dbm: rx.get(&key).and_then(WireValue::as_i32),
                tx_signal_dbm: tx.get(&key).and_then(WireValue::as_i32),
                link_uptime: uptime.get(&key).and_then(WireValue::as_ticks_duration),
            });
        }
        Ok(Some(peers))
    }
}

impl VendorStrategy for SnmpStrategy {
    fn features(&self) -> FeatureSet {
        Self::derived_features(&self.resolved)
    }

    fn fetch_system(&self) -> BoxFuture<'_, Result<Option<SystemData>>> {
        Box::pin(self.system())
    }

    fn fetch_interfaces(&self) -> BoxFuture<'_, Result<Option<Vec<InterfaceDetail>>>> {
        Box::pin(self.interfaces())
    }

    fn fetch_wireless_peers(&self) -> BoxFuture<'_, Result<Option<Vec<WirelessPeer>>>> {
        Box::pin(self.wireless_peers())
    }

    fn fetch_bgp_peers(&self) -> BoxFuture<'_, Result<Option<Vec<BgpPeer>>>> {
        Box::pin(async move {
            Err(Error::FacetUnsupported {
                addr: self.addr,
                model: self.model.clone(),
                facet: Facet::BgpPeers,
            }
            .boxed())
        })
    }

    fn traceroute<'a>(
        &'a self,
        _spec: &'a TracerouteSpec,
    ) -> BoxFuture<'a, Result<TracerouteResult>> {
        Box::pin(async move {
            Err(Error::FacetUnsupported {
                addr: self.addr,
                model: self.model.clone(),
                facet: Facet::Traceroute,
            }
            .boxed())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        self.session.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::builtin::{builtin_table, family};
    use crate::transport::mock::MockSnmp;
    use crate::{oid, value::WireValue};
    use bytes::Bytes;

    fn addr() -> IpAddr {
        "44.0.0.1".parse().unwrap()
    }

    fn mikrotik_strategy(mock: &MockSnmp) -> SnmpStrategy {
        let resolved = builtin_table().resolve(family::MIKROTIK, None).unwrap();
        SnmpStrategy::new(
            addr(),
            "RB912UAG",
            resolved,
            Arc::new(mock.clone()) as Arc<dyn SnmpTransport>,
        )
    }

    #[tokio::test]
    async fn system_data_single_get() {
        let mock = MockSnmp::new(addr());
        mock.insert(
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            WireValue::from("RouterOS RB912UAG-5HPnD"),
        );
        mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), WireValue::from("db0xyz-hub"));
        mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), WireValue::TimeTicks(360_000));

        let strategy = mikrotik_strategy(&mock);
        let system = strategy.system().await.unwrap().unwrap();
        assert_eq!(system.description.as_deref(), Some("RouterOS RB912UAG-5HPnD"));
        assert_eq!(system.name.as_deref(), Some("db0xyz-hub"));
        assert_eq!(system.uptime, Some(std::time::Duration::from_secs(3600)));
        assert_eq!(system.location, None);
        // All identity fields ride a single wire round trip.
        assert_eq!(mock.round_trips(), 1);
    }

    #[tokio::test]
    async fn interface_rows_join_across_columns() {
        let mock = MockSnmp::new(addr());
        let name_col = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        let type_col = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3);
        let mac_col = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 6);
        mock.insert(name_col.with_suffix(&[1]), WireValue::from("ether1"));
        mock.insert(name_col.with_suffix(&[5]), WireValue::from("wlan1"));
        mock.insert(type_col.with_suffix(&[1]), WireValue::Integer(6));
        mock.insert(type_col.with_suffix(&[5]), WireValue::Integer(71));
        mock.insert(
            mac_col.with_suffix(&[5]),
            WireValue::OctetString(Bytes::from_static(&[0, 0x0C, 0x42, 1, 2, 3])),
        );

        let strategy = mikrotik_strategy(&mock);
        let interfaces = strategy.interfaces().await.unwrap().unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].index, 1);
        assert!(!interfaces[0].is_wireless());
        assert_eq!(interfaces[0].mac, None);
        assert_eq!(interfaces[1].index, 5);
        assert!(interfaces[1].is_wireless());
        assert_eq!(
            interfaces[1].mac,
            Some("00:0C:42:01:02:03".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn wireless_rows_decode_mac_and_ifindex_from_row_key() {
        let mock = MockSnmp::new(addr());
        let rtab = oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 1, 2, 1);
        let key = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 7];
        mock.insert(
            rtab.with_suffix(&[1]).with_suffix(&key),
            WireValue::OctetString(Bytes::from_static(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])),
        );
        mock.insert(rtab.with_suffix(&[3]).with_suffix(&key), WireValue::Integer(-61));
        mock.insert(
            rtab.with_suffix(&[11]).with_suffix(&key),
            WireValue::TimeTicks(8_640_000),
        );
        mock.insert(rtab.with_suffix(&[19]).with_suffix(&key), WireValue::Integer(-58));

        let strategy = mikrotik_strategy(&mock);
        let peers = strategy.wireless_peers().await.unwrap().unwrap();
        assert_eq!(peers.len(), 1);
        let peer = &peers[0];
        assert_eq!(peer.remote_mac.to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(peer.interface_index, Some(7));
        assert_eq!(peer.rx_signal_dbm, Some(-61));
        assert_eq!(peer.tx_signal_dbm, Some(-58));
        assert_eq!(
            peer.link_uptime,
            Some(std::time::Duration::from_secs(86_400))
        );
    }

    #[tokio::test]
    async fn missing_wireless_capability_is_absent() {
        let mock = MockSnmp::new(addr());
        let resolved = builtin_table().resolve(family::ALIX, None).unwrap();
        let strategy = SnmpStrategy::new(
            addr(),
            "alix2d13",
            resolved,
            Arc::new(mock.clone()) as Arc<dyn SnmpTransport>,
        );
        assert!(strategy.wireless_peers().await.unwrap().is_none());
        assert_eq!(mock.round_trips(), 0, "absence needs no wire traffic");
    }

    #[tokio::test]
    async fn bgp_over_snmp_is_a_typed_error() {
        let mock = MockSnmp::new(addr());
        let strategy = mikrotik_strategy(&mock);
        let err = strategy.fetch_bgp_peers().await.unwrap_err();
        assert!(matches!(
            *err,
            Error::FacetUnsupported {
                facet: Facet::BgpPeers,
                ..
            }
        ));
    }
}
