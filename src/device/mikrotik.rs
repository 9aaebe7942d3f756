//! MikroTik facet population.
//!
//! RouterOS devices answer system, interface, and wireless data over SNMP
//! like everyone else; BGP peering and traceroute are only reachable through
//! the RouterOS control API. This strategy composes the generic
//! [`SnmpStrategy`] with an optional API session - when the caller's options
//! exclude the vendor-API transport, the handler degrades to SNMP-only and
//! the API-backed facets report unsupported.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use super::facets::{
    BgpPeer, InterfaceDetail, SystemData, TracerouteHop, TracerouteResult, TracerouteSpec,
    WirelessPeer,
};
use super::snmp::SnmpStrategy;
use super::strategy::VendorStrategy;
use super::{Facet, FeatureSet};
use crate::caps::CapabilityKey;
use crate::error::{Error, Result};
use crate::table::ResolvedIdentifierSet;
use crate::transport::{ApiRecord, BoxFuture, SnmpTransport, VendorApiTransport};

/// Facet population for RouterOS: SNMP plus the vendor control API.
pub struct MikrotikStrategy {
    addr: IpAddr,
    model: String,
    snmp: SnmpStrategy,
    resolved: Arc<ResolvedIdentifierSet>,
    api: Option<Arc<dyn VendorApiTransport>>,
}

impl MikrotikStrategy {
    /// Compose the strategy from an open SNMP session and an optional
    /// authenticated API session.
    pub fn new(
        addr: IpAddr,
        model: impl Into<String>,
        resolved: Arc<ResolvedIdentifierSet>,
        snmp_session: Arc<dyn SnmpTransport>,
        api: Option<Arc<dyn VendorApiTransport>>,
    ) -> Self {
        let model = model.into();
        Self {
            addr,
            model: model.clone(),
            snmp: SnmpStrategy::new(addr, model, Arc::clone(&resolved), snmp_session),
            resolved,
            api,
        }
    }

    fn api(&self) -> Result<&Arc<dyn VendorApiTransport>> {
        self.api.as_ref().ok_or_else(|| {
            Error::FacetUnsupported {
                addr: self.addr,
                model: self.model.clone(),
                facet: Facet::BgpPeers,
            }
            .boxed()
        })
    }

    #[instrument(level = "debug", skip(self), fields(addr = %self.addr))]
    async fn bgp_peers(&self) -> Result<Option<Vec<BgpPeer>>> {
        let Some(path) = self.resolved.api_path_for(CapabilityKey::BgpPeerTable) else {
            return Ok(None);
        };
        let api = self.api()?;
        let records = api.list(path, &[]).await?;
        Ok(Some(records.iter().map(parse_bgp_record).collect()))
    }

    #[instrument(level = "debug", skip(self, spec), fields(addr = %self.addr, target = %spec.target))]
    async fn run_traceroute(&self, spec: &TracerouteSpec) -> Result<TracerouteResult> {
        let api = self.api.as_ref().ok_or_else(|| {
            Error::FacetUnsupported {
                addr: self.addr,
                model: self.model.clone(),
                facet: Facet::Traceroute,
            }
            .boxed()
        })?;
        let filters = [
            ("address", spec.target.to_string()),
            ("count", spec.count.to_string()),
            ("timeout", format!("{}ms", spec.timeout.as_millis())),
            ("max-hops", spec.max_hops.to_string()),
        ];
        let records = api.list("tool/traceroute", &filters).await?;
        Ok(TracerouteResult {
            target: spec.target,
            hops: records.iter().map(parse_traceroute_record).collect(),
        })
    }
}

/// Map one `routing/bgp/peer` API record.
fn parse_bgp_record(record: &ApiRecord) -> BgpPeer {
    BgpPeer {
        name: record.get("name").cloned(),
        remote_address: record
            .get("remote-address")
            .and_then(|s| s.parse().ok()),
        remote_as: record.get("remote-as").and_then(|s| s.parse().ok()),
        state: record.get("state").cloned(),
        uptime: record.get("uptime").cloned(),
        prefix_count: record.get("prefix-count").and_then(|s| s.parse().ok()),
    }
}

/// Map one `tool/traceroute` API record.
fn parse_traceroute_record(record: &ApiRecord) -> TracerouteHop {
    TracerouteHop {
        address: record.get("address").and_then(|s| s.parse().ok()),
        loss_percent: record.get("loss").and_then(|s| s.trim_end_matches('%').parse().ok()),
        sent: record.get("sent").and_then(|s| s.parse().ok()),
        last_rtt: record.get("last").and_then(|s| parse_rtt_ms(s)),
        average_rtt: record.get("avg").and_then(|s| parse_rtt_ms(s)),
    }
}

/// RouterOS reports RTTs as fractional milliseconds, e.g. "2.8" or "12.4ms".
fn parse_rtt_ms(s: &str) -> Option<Duration> {
    let trimmed = s.trim().trim_end_matches("ms");
    let millis: f64 = trimmed.parse().ok()?;
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_micros((millis * 1000.0).round() as u64))
}

impl VendorStrategy for MikrotikStrategy {
    fn features(&self) -> FeatureSet {
        let has_api = self.api.is_some();
        FeatureSet {
            bgp_peers: has_api
                && self
                    .resolved
                    .get(CapabilityKey::BgpPeerTable)
                    .is_some(),
            traceroute: has_api,
            ..SnmpStrategy::derived_features(&self.resolved)
        }
    }

    fn fetch_system(&self) -> BoxFuture<'_, Result<Option<SystemData>>> {
        self.snmp.fetch_system()
    }

    fn fetch_interfaces(&self) -> BoxFuture<'_, Result<Option<Vec<InterfaceDetail>>>> {
        self.snmp.fetch_interfaces()
    }

    fn fetch_wireless_peers(&self) -> BoxFuture<'_, Result<Option<Vec<WirelessPeer>>>> {
        self.snmp.fetch_wireless_peers()
    }

    fn fetch_bgp_peers(&self) -> BoxFuture<'_, Result<Option<Vec<BgpPeer>>>> {
        Box::pin(self.bgp_peers())
    }

    fn traceroute<'a>(
        &'a self,
        spec: &'a TracerouteSpec,
    ) -> BoxFuture<'a, Result<TracerouteResult>> {
        Box::pin(self.run_traceroute(spec))
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            // Close both sessions; the first error wins but both get closed.
            let snmp_result = self.snmp.close().await;
            if let Some(api) = &self.api {
                api.close().await?;
            }
            snmp_result
        })
    }
}
