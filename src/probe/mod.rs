//! Device capability probe chain.
//!
//! Detection runs a fixed-priority list of [`ProbeCandidate`]s against an
//! unknown address. Each candidate answers a cheap "is this device of your
//! kind" question - a description-string match or a control-API login - and
//! the first positive answer gets to resolve the firmware version and build
//! the [`DeviceHandler`]. Negative and faulting probes are recorded but do
//! not abort the chain; only once every candidate has rejected the device
//! does detection fail, with an aggregate error listing every rejection
//! reason.
//!
//! Identity fields read during probing (sysDescr, sysObjectID) are cached on
//! the [`ProbeContext`] so the chain costs one wire round trip per field, no
//! matter how many candidates look at them.

mod candidates;

pub use candidates::{AlixCandidate, MikrotikCandidate, UbiquitiCandidate};

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::device::DeviceHandler;
use crate::error::{Error, ProbeAttempt, Result};
use crate::oid;
use crate::oid::Oid;
use crate::options::QuerierOptions;
use crate::table::IdentifierTable;
use crate::transport::{
    get_one, BoxFuture, SnmpTransport, SnmpTransportFactory, TransportClass, VendorApiFactory,
    VendorApiTransport,
};

/// One vendor detector in the probe chain.
pub trait ProbeCandidate: Send + Sync {
    /// Stable candidate name, used in attempt records and logs.
    fn name(&self) -> &'static str;

    /// Chain position; higher probes first.
    fn priority(&self) -> u32;

    /// Which transport class this candidate needs to probe and build.
    fn transport_class(&self) -> TransportClass;

    /// Cheap applicability test. Must not mutate device state.
    fn matches<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<bool>>;

    /// Resolve version and identifiers and assemble the handler.
    ///
    /// Only called after [`matches`](Self::matches) answered positively.
    fn build<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<DeviceHandler>>;
}

/// Shared state for one detection run against one address.
///
/// Opens at most one SNMP session and caches the identity fields candidates
/// pattern-match on.
pub struct ProbeContext {
    addr: IpAddr,
    options: QuerierOptions,
    snmp_factory: Arc<dyn SnmpTransportFactory>,
    api_factory: Arc<dyn VendorApiFactory>,
    table: Arc<IdentifierTable>,
    snmp: Mutex<Option<Arc<dyn SnmpTransport>>>,
    sys_descr: Mutex<Option<Option<String>>>,
    sys_object_id: Mutex<Option<Option<Oid>>>,
}

impl ProbeContext {
    /// Set up a detection run against `addr`.
    pub fn new(
        addr: IpAddr,
        options: QuerierOptions,
        snmp_factory: Arc<dyn SnmpTransportFactory>,
        api_factory: Arc<dyn VendorApiFactory>,
        table: Arc<IdentifierTable>,
    ) -> Self {
        Self {
            addr,
            options,
            snmp_factory,
            api_factory,
            table,
            snmp: Mutex::new(None),
            sys_descr: Mutex::new(None),
            sys_object_id: Mutex::new(None),
        }
    }

    /// The probed address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The caller's options.
    pub fn options(&self) -> &QuerierOptions {
        &self.options
    }

    /// The identifier resolution table for this run.
    pub fn table(&self) -> &IdentifierTable {
        &self.table
    }

    /// The run's SNMP session, opened on first use.
    pub async fn snmp_session(&self) -> Result<Arc<dyn SnmpTransport>> {
        let mut slot = self.snmp.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = self
            .snmp_factory
            .open(&self.options.snmp_session(self.addr))
            .await?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// sysDescr, fetched once and cached. `None` if the device holds no
    /// value for it.
    pub async fn sys_description(&self) -> Result<Option<String>> {
        let mut slot = self.sys_descr.lock().await;
        if let Some(cached) = slot.as_ref() {
            return Ok(cached.clone());
        }
        let session = self.snmp_session().await?;
        let value = get_one(session.as_ref(), &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
        let descr = value.as_str();
        *slot = Some(descr.clone());
        Ok(descr)
    }

    /// sysObjectID, fetched once and cached.
    pub async fn sys_object_id(&self) -> Result<Option<Oid>> {
        let mut slot = self.sys_object_id.lock().await;
        if let Some(cached) = slot.as_ref() {
            return Ok(cached.clone());
        }
        let session = self.snmp_session().await?;
        let value = get_one(session.as_ref(), &oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)).await?;
        let id = value.as_oid().cloned();
        *slot = Some(id.clone());
        Ok(id)
    }

    /// Open and authenticate a vendor API session, if the caller's options
    /// allow the vendor-API transport at all.
    ///
    /// `Ok(None)` when the transport class is excluded; an allowed but
    /// refused login is an error the caller may choose to degrade on.
    pub async fn open_api(&self) -> Result<Option<Arc<dyn VendorApiTransport>>> {
        if !self.options.allows(TransportClass::VendorApi) {
            return Ok(None);
        }
        let session = self
            .api_factory
            .open(&self.options.api_session(self.addr))
            .await?;
        Ok(Some(session))
    }
}

/// Detection progress for one run. Terminal states carry no data here;
/// the chain returns the handler or the aggregate error directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeState {
    Unprobed,
    Probing(usize),
    Matched,
    Exhausted,
}

/// The ordered set of probe candidates.
pub struct ProbeChain {
    candidates: Vec<Arc<dyn ProbeCandidate>>,
}

impl Default for ProbeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeChain {
    /// Chain with the built-in candidates registered.
    pub fn new() -> Self {
        let mut chain = Self::empty();
        chain.register(Arc::new(MikrotikCandidate));
        chain.register(Arc::new(UbiquitiCandidate));
        chain.register(Arc::new(AlixCandidate));
        chain
    }

    /// Chain with no candidates; register your own.
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Register a candidate, keeping the chain in descending priority order.
    pub fn register(&mut self, candidate: Arc<dyn ProbeCandidate>) {
        self.candidates.push(candidate);
        self.candidates
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Candidate names in probing order.
    pub fn candidate_names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    /// Run the chain against the context's address.
    ///
    /// Returns the first matching candidate's handler. A positive match
    /// whose build fails is terminal: no further candidates are tried, and
    /// the build error comes back wrapped with the address. Full rejection
    /// yields [`Error::DetectionExhausted`] listing every candidate's
    /// reason.
    pub async fn detect(&self, ctx: &ProbeContext) -> Result<DeviceHandler> {
        let mut state = ProbeState::Unprobed;
        let mut attempts = Vec::with_capacity(self.candidates.len());
        debug!(target: "radioquery::probe", addr = %ctx.addr(), state = ?state, "starting detection");

        for (index, candidate) in self.candidates.iter().enumerate() {
            state = ProbeState::Probing(index);
            let class = candidate.transport_class();
            if !ctx.options().allows(class) {
                debug!(
                    target: "radioquery::probe",
                    addr = %ctx.addr(),
                    candidate = candidate.name(),
                    transport = %class,
                    state = ?state,
                    "skipping candidate, transport class not allowed"
                );
                attempts.push(ProbeAttempt {
                    candidate: candidate.name(),
                    reason: format!("transport class {class} not allowed by options"),
                });
                continue;
            }

            match candidate.matches(ctx).await {
                Ok(false) => {
                    debug!(
                        target: "radioquery::probe",
                        addr = %ctx.addr(),
                        candidate = candidate.name(),
                        state = ?state,
                        "candidate does not match"
                    );
                    attempts.push(ProbeAttempt {
                        candidate: candidate.name(),
                        reason: "device did not match".to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        target: "radioquery::probe",
                        addr = %ctx.addr(),
                        candidate = candidate.name(),
                        error = %err,
                        state = ?state,
                        "candidate probe faulted"
                    );
                    attempts.push(ProbeAttempt {
                        candidate: candidate.name(),
                        reason: err.to_string(),
                    });
                }
                Ok(true) => {
                    state = ProbeState::Matched;
                    info!(
                        target: "radioquery::probe",
                        addr = %ctx.addr(),
                        candidate = candidate.name(),
                        state = ?state,
                        "candidate matched, building handler"
                    );
                    return candidate.build(ctx).await.map_err(|source| {
                        Error::HandlerConstruction {
                            addr: ctx.addr(),
                            source,
                        }
                        .boxed()
                    });
                }
            }
        }

        state = ProbeState::Exhausted;
        debug!(
            target: "radioquery::probe",
            addr = %ctx.addr(),
            state = ?state,
            rejected = attempts.len(),
            "no candidate matched"
        );
        Err(Error::DetectionExhausted {
            addr: ctx.addr(),
            attempts,
        }
        .boxed())
    }
}
