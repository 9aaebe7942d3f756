//! Transport layer abstraction.
//!
//! This crate does not implement SNMP or vendor-protocol wire encoding. It
//! consumes two primitives from its collaborators:
//!
//! - [`SnmpTransport`] - "get one or more identifiers" and "walk a subtree"
//!   against an open session
//! - [`VendorApiTransport`] - "list records of kind K, optionally filtered"
//!   against an authenticated vendor control-API session
//!
//! Both are object-safe (methods return [`BoxFuture`]) so probe candidates
//! and vendor strategies can hold `Arc<dyn ...>` without generics leaking
//! into the handler type. Mock implementations live in [`mock`] and back the
//! integration tests.

pub mod mock;

use std::collections::BTreeMap;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::oid::Oid;
use crate::value::WireValue;

/// Owned future type used by the object-safe transport and strategy traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which transport a probe candidate or session requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportClass {
    /// SNMP get/walk sessions.
    Snmp,
    /// Vendor control-API sessions (list/authenticate).
    VendorApi,
}

impl std::fmt::Display for TransportClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snmp => write!(f, "snmp"),
            Self::VendorApi => write!(f, "vendor-api"),
        }
    }
}

/// SNMP protocol version requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnmpVersion {
    /// SNMPv1 (some AirOS firmwares answer v2c walks incorrectly).
    V1,
    /// SNMPv2c (default).
    #[default]
    V2c,
}

/// Options for opening one session, derived from the caller's
/// [`QuerierOptions`](crate::options::QuerierOptions) per target.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Target device address.
    pub addr: IpAddr,
    /// Target port (161 for SNMP, vendor-specific for control APIs).
    pub port: u16,
    /// SNMP community string.
    pub community: String,
    /// Vendor API login, if any.
    pub api_user: Option<String>,
    /// Vendor API password, if any.
    pub api_password: Option<String>,
    /// Protocol version for SNMP sessions.
    pub version: SnmpVersion,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Transport-level retry count for lossy transports.
    pub retries: u32,
}

/// One walked or fetched binding: full identifier plus its value.
pub type Binding = (Oid, WireValue);

/// A record returned by a vendor control API: ordered field name/value map.
///
/// Ordered so record output is stable in logs and tests.
pub type ApiRecord = BTreeMap<String, String>;

/// Client-side SNMP session.
///
/// An implementation wraps an already-open session; `get` and `walk` each
/// perform one blocking network round trip bounded by the session timeout.
/// Timeouts surface as [`Error::Timeout`](crate::Error::Timeout), never as
/// silent retries above the transport's own retry budget.
pub trait SnmpTransport: Send + Sync {
    /// Fetch the values of one or more identifiers.
    ///
    /// The result carries one binding per requested identifier; identifiers
    /// the device cannot answer come back as absence exceptions, not errors.
    fn get<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<Binding>>>;

    /// Walk the subtree rooted at `root`, returning bindings in identifier
    /// order.
    fn walk<'a>(&'a self, root: &'a Oid) -> BoxFuture<'a, Result<Vec<Binding>>>;

    /// The device this session talks to.
    fn peer(&self) -> IpAddr;

    /// Release the session.
    ///
    /// Pending lazy values backed by this session evaluate to "not
    /// available" after close; see the crate-level ordering constraint.
    fn close<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

/// Opens SNMP sessions.
pub trait SnmpTransportFactory: Send + Sync {
    /// Open (and for v3-style transports, verify) a session.
    fn open<'a>(
        &'a self,
        options: &'a SessionOptions,
    ) -> BoxFuture<'a, Result<Arc<dyn SnmpTransport>>>;
}

/// Client-side vendor control-API session (e.g. the RouterOS API).
pub trait VendorApiTransport: Send + Sync {
    /// List records of the given kind, with optional `field=value` filters.
    ///
    /// Kinds are vendor-defined paths such as `"routing/bgp/peer"` or
    /// `"tool/traceroute"`.
    fn list<'a>(
        &'a self,
        kind: &'a str,
        filters: &'a [(&'a str, String)],
    ) -> BoxFuture<'a, Result<Vec<ApiRecord>>>;

    /// The device this session talks to.
    fn peer(&self) -> IpAddr;

    /// Release the session.
    fn close<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

/// Opens and authenticates vendor control-API sessions.
pub trait VendorApiFactory: Send + Sync {
    /// Open a session and authenticate with the credentials in `options`.
    ///
    /// A refused login is [`Error::Auth`](crate::Error::Auth), which probe
    /// candidates treat as "not my kind of device" rather than a fault.
    fn open<'a>(
        &'a self,
        options: &'a SessionOptions,
    ) -> BoxFuture<'a, Result<Arc<dyn VendorApiTransport>>>;
}

/// Fetch a single identifier and unwrap the binding.
///
/// Convenience used by probe candidates, which typically read one or two
/// identity fields.
pub async fn get_one(transport: &dyn SnmpTransport, oid: &Oid) -> Result<WireValue> {
    let mut bindings = transport.get(std::slice::from_ref(oid)).await?;
    match bindings.pop() {
        Some((_, value)) => Ok(value),
        None => Ok(WireValue::NoSuchValue),
    }
}
