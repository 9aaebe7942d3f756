//! # radioquery
//!
//! Device-abstraction and query engine for radio network monitoring.
//!
//! Hamnet backbone links are built from heterogeneous hardware - MikroTik
//! RouterOS, Ubiquiti AirOS and AirFiber, plain Linux boards - that all
//! answer the same operational questions through different identifiers and
//! protocols. This crate hides that variance behind a uniform
//! [`DeviceHandler`]:
//!
//! - a [probe chain](probe) detects what kind of device an address is and
//!   which features it supports
//! - a versioned [identifier resolution table](table) maps abstract
//!   capabilities to the concrete OIDs or API paths of the detected
//!   family/firmware
//! - handler facets evaluate [lazily](lazy), cache their results for the
//!   session, and meter the wire time they cost
//! - [link detection](link) correlates two handlers' wireless data into
//!   bidirectional link records
//! - a [retry governor](governor) tracks per-host and per-network failure
//!   penalties so pollers back off of broken devices
//!
//! The crate deliberately contains no SNMP or vendor-protocol wire codec;
//! callers supply [`SnmpTransportFactory`] and [`VendorApiFactory`]
//! implementations and run their own scheduling.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use radioquery::{detect_and_open, QuerierOptions};
//! use radioquery::table::builtin::builtin_table;
//! # async fn run(
//! #     snmp: Arc<dyn radioquery::transport::SnmpTransportFactory>,
//! #     api: Arc<dyn radioquery::transport::VendorApiFactory>,
//! # ) -> radioquery::Result<()> {
//! let table = Arc::new(builtin_table());
//! let options = QuerierOptions::default().community("public");
//!
//! let handler = detect_and_open("44.0.0.1".parse().unwrap(), options, snmp, api, table).await?;
//! println!("detected: {:?}", handler.identity());
//!
//! if let Some(peers) = handler.wireless_peers().await? {
//!     for peer in peers {
//!         println!("{} rx {:?} dBm", peer.remote_mac, peer.rx_signal_dbm);
//!     }
//! }
//! handler.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod caps;
pub mod device;
pub mod error;
pub mod governor;
pub mod lazy;
pub mod link;
pub mod oid;
pub mod options;
pub mod probe;
pub mod table;
pub mod transport;
pub mod value;

pub use caps::{CapabilityKey, DataKind};
pub use device::{
    BgpPeer, DeviceHandler, DeviceIdentity, DeviceSnapshot, Facet, FeatureSet, InterfaceDetail,
    InterfaceType, SystemData, TracerouteResult, WirelessPeer,
};
pub use error::{Error, ProbeAttempt, Result};
pub use governor::{FailureEntity, GovernorConfig, QueryType, RetryGovernor, SingleFailureInfo};
pub use link::{detect_link, LinkDetail};
pub use oid::Oid;
pub use options::QuerierOptions;
pub use probe::{ProbeCandidate, ProbeChain, ProbeContext};
pub use table::{IdentifierTable, ResolvedIdentifierSet};
pub use transport::{
    SnmpTransport, SnmpTransportFactory, SnmpVersion, TransportClass, VendorApiFactory,
    VendorApiTransport,
};
pub use value::{MacAddress, WireValue};

use std::net::IpAddr;
use std::sync::Arc;

/// Detect the device at `address` and open a handler for it.
///
/// Runs the built-in [`ProbeChain`] over a fresh [`ProbeContext`]. Callers
/// with custom probe candidates build the chain and context themselves.
pub async fn detect_and_open(
    address: IpAddr,
    options: QuerierOptions,
    snmp_factory: Arc<dyn SnmpTransportFactory>,
    api_factory: Arc<dyn VendorApiFactory>,
    table: Arc<IdentifierTable>,
) -> Result<DeviceHandler> {
    options.validate()?;
    let ctx = ProbeContext::new(address, options, snmp_factory, api_factory, table);
    ProbeChain::new().detect(&ctx).await
}
