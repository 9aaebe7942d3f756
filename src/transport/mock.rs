//! Mock transports for testing.
//!
//! Programmable SNMP and vendor-API transports that simulate devices without
//! a network. Values are held in a `BTreeMap` keyed by OID so walks return
//! subtree bindings in identifier order, like a well-behaved agent.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    ApiRecord, Binding, BoxFuture, SessionOptions, SnmpTransport, SnmpTransportFactory,
    VendorApiFactory, VendorApiTransport,
};
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::WireValue;

/// A programmed fault injected ahead of normal responses.
#[derive(Clone, Debug)]
pub enum MockFault {
    /// Simulate a timeout on the next operation.
    Timeout,
    /// Simulate an IO error on the next operation.
    Io(String),
    /// Simulate an agent-reported protocol error.
    Agent(String),
}

struct MockSnmpInner {
    addr: IpAddr,
    values: BTreeMap<Oid, WireValue>,
    faults: VecDeque<MockFault>,
    gets: Vec<Vec<Oid>>,
    walks: Vec<Oid>,
    closed: bool,
}

/// Programmable SNMP session.
///
/// # Example
///
/// ```
/// use radioquery::transport::mock::MockSnmp;
/// use radioquery::{oid, value::WireValue};
///
/// let mock = MockSnmp::new("44.0.0.1".parse().unwrap());
/// mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), WireValue::from("RouterOS RB912"));
/// ```
#[derive(Clone)]
pub struct MockSnmp {
    inner: Arc<Mutex<MockSnmpInner>>,
}

impl MockSnmp {
    /// Create an empty mock session for the given device address.
    pub fn new(addr: IpAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockSnmpInner {
                addr,
                values: BTreeMap::new(),
                faults: VecDeque::new(),
                gets: Vec::new(),
                walks: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Program a value for an identifier.
    pub fn insert(&self, oid: Oid, value: WireValue) {
        self.inner.lock().unwrap().values.insert(oid, value);
    }

    /// Program a fault to be raised before the next normal response.
    pub fn push_fault(&self, fault: MockFault) {
        self.inner.lock().unwrap().faults.push_back(fault);
    }

    /// Identifiers requested through `get`, in call order.
    pub fn recorded_gets(&self) -> Vec<Vec<Oid>> {
        self.inner.lock().unwrap().gets.clone()
    }

    /// Subtree roots walked, in call order.
    pub fn recorded_walks(&self) -> Vec<Oid> {
        self.inner.lock().unwrap().walks.clone()
    }

    /// Total number of wire round trips (gets + walks) performed.
    pub fn round_trips(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.gets.len() + inner.walks.len()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    fn take_fault(inner: &mut MockSnmpInner) -> Option<Box<Error>> {
        let fault = inner.faults.pop_front()?;
        let addr = inner.addr;
        Some(match fault {
            MockFault::Timeout => Error::Timeout {
                addr,
                elapsed: Duration::from_secs(1),
                retries: 0,
            }
            .boxed(),
            MockFault::Io(msg) => Error::Network {
                addr,
                source: std::io::Error::other(msg),
            }
            .boxed(),
            MockFault::Agent(message) => Error::Agent { addr, message }.boxed(),
        })
    }
}

impl SnmpTransport for MockSnmp {
    fn get<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<Binding>>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            inner.gets.push(oids.to_vec());
            if let Some(err) = Self::take_fault(&mut inner) {
                return Err(err);
            }
            if inner.closed {
                let addr = inner.addr;
                return Err(Error::Network {
                    addr,
                    source: std::io::Error::other("session closed"),
                }
                .boxed());
            }
            Ok(oids
                .iter()
                .map(|oid| {
                    let value = inner
                        .values
                        .get(oid)
                        .cloned()
                        .unwrap_or(WireValue::NoSuchValue);
                    (oid.clone(), value)
                })
                .collect())
        })
    }

    fn walk<'a>(&'a self, root: &'a Oid) -> BoxFuture<'a, Result<Vec<Binding>>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            inner.walks.push(root.clone());
            if let Some(err) = Self::take_fault(&mut inner) {
                return Err(err);
            }
            if inner.closed {
                let addr = inner.addr;
                return Err(Error::Network {
                    addr,
                    source: std::io::Error::other("session closed"),
                }
                .boxed());
            }
            Ok(inner
                .values
                .range(root.clone()..)
                .take_while(|(oid, _)| oid.starts_with(root))
                .map(|(oid, value)| (oid.clone(), value.clone()))
                .collect())
        })
    }

    fn peer(&self) -> IpAddr {
        self.inner.lock().unwrap().addr
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.inner.lock().unwrap().closed = true;
            Ok(())
        })
    }
}

/// Factory returning pre-built [`MockSnmp`] sessions per address.
#[derive(Clone, Default)]
pub struct MockSnmpFactory {
    sessions: Arc<Mutex<HashMap<IpAddr, MockSnmp>>>,
}

impl MockSnmpFactory {
    /// Create an empty factory; unknown addresses open as timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the session served for `addr`.
    pub fn register(&self, addr: IpAddr, session: MockSnmp) {
        self.sessions.lock().unwrap().insert(addr, session);
    }
}

impl SnmpTransportFactory for MockSnmpFactory {
    fn open<'a>(
        &'a self,
        options: &'a SessionOptions,
    ) -> BoxFuture<'a, Result<Arc<dyn SnmpTransport>>> {
        Box::pin(async move {
            match self.sessions.lock().unwrap().get(&options.addr) {
                Some(session) => Ok(Arc::new(session.clone()) as Arc<dyn SnmpTransport>),
                None => Err(Error::Timeout {
                    addr: options.addr,
                    elapsed: options.timeout,
                    retries: options.retries,
                }
                .boxed()),
            }
        })
    }
}

struct MockVendorApiInner {
    addr: IpAddr,
    records: HashMap<String, Vec<ApiRecord>>,
    faults: VecDeque<MockFault>,
    lists: Vec<(String, Vec<(String, String)>)>,
    closed: bool,
}

/// Programmable vendor control-API session.
#[derive(Clone)]
pub struct MockVendorApi {
    inner: Arc<Mutex<MockVendorApiInner>>,
}

impl MockVendorApi {
    /// Create an empty mock API session for the given device address.
    pub fn new(addr: IpAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockVendorApiInner {
                addr,
                records: HashMap::new(),
                faults: VecDeque::new(),
                lists: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Program the records served for a kind.
    pub fn insert(&self, kind: impl Into<String>, records: Vec<ApiRecord>) {
        self.inner.lock().unwrap().records.insert(kind.into(), records);
    }

    /// Program a fault to be raised before the next list call.
    pub fn push_fault(&self, fault: MockFault) {
        self.inner.lock().unwrap().faults.push_back(fault);
    }

    /// Recorded list calls: (kind, filters).
    pub fn recorded_lists(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.inner.lock().unwrap().lists.clone()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

impl VendorApiTransport for MockVendorApi {
    fn list<'a>(
        &'a self,
        kind: &'a str,
        filters: &'a [(&'a str, String)],
    ) -> BoxFuture<'a, Result<Vec<ApiRecord>>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            inner.lists.push((
                kind.to_string(),
                filters
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            if let Some(fault) = inner.faults.pop_front() {
                let addr = inner.addr;
                return Err(match fault {
                    MockFault::Timeout => Error::Timeout {
                        addr,
                        elapsed: Duration::from_secs(1),
                        retries: 0,
                    }
                    .boxed(),
                    MockFault::Io(msg) => Error::Network {
                        addr,
                        source: std::io::Error::other(msg),
                    }
                    .boxed(),
                    MockFault::Agent(message) => Error::Agent { addr, message }.boxed(),
                });
            }
            if inner.closed {
                let addr = inner.addr;
                return Err(Error::Network {
                    addr,
                    source: std::io::Error::other("session closed"),
                }
                .boxed());
            }
            let all = inner.records.get(kind).cloned().unwrap_or_default();
            // Apply field filters the way the RouterOS API does: exact match
            // on every given field.
            Ok(all
                .into_iter()
                .filter(|record| {
                    filters
                        .iter()
                        .all(|(k, v)| record.get(*k).is_some_and(|have| have == v))
                })
                .collect())
        })
    }

    fn peer(&self) -> IpAddr {
        self.inner.lock().unwrap().addr
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.inner.lock().unwrap().closed = true;
            Ok(())
        })
    }
}

/// Factory returning pre-built [`MockVendorApi`] sessions per address.
///
/// Addresses without a registered session refuse authentication, which is
/// how a device without the vendor API behaves.
#[derive(Clone, Default)]
pub struct MockVendorApiFactory {
    sessions: Arc<Mutex<HashMap<IpAddr, MockVendorApi>>>,
}

impl MockVendorApiFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the session served for `addr`.
    pub fn register(&self, addr: IpAddr, session: MockVendorApi) {
        self.sessions.lock().unwrap().insert(addr, session);
    }
}

impl VendorApiFactory for MockVendorApiFactory {
    fn open<'a>(
        &'a self,
        options: &'a SessionOptions,
    ) -> BoxFuture<'a, Result<Arc<dyn VendorApiTransport>>> {
        Box::pin(async move {
            match self.sessions.lock().unwrap().get(&options.addr) {
                Some(session) => Ok(Arc::new(session.clone()) as Arc<dyn VendorApiTransport>),
                None => Err(Error::Auth { addr: options.addr }.boxed()),
            }
        })
    }
}
