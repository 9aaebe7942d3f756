//! Caller-supplied querier options.
//!
//! [`QuerierOptions`] is handed to [`detect_and_open`](crate::detect_and_open)
//! by the scheduling collaborator. It scopes which transport classes may be
//! tried, carries credentials, and bounds every blocking operation.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{SessionOptions, SnmpVersion, TransportClass};

/// Options controlling how a device is probed and queried.
///
/// # Example
///
/// ```
/// use radioquery::QuerierOptions;
/// use std::time::Duration;
///
/// let options = QuerierOptions::default()
///     .community("public")
///     .timeout(Duration::from_secs(2))
///     .retries(1);
/// ```
#[derive(Debug, Clone)]
pub struct QuerierOptions {
    /// Transport classes probe candidates may use (default: both).
    pub allowed_transports: Vec<TransportClass>,
    /// SNMP community string (default: "public").
    pub community: String,
    /// Vendor API login (default: none; API-backed facets need it).
    pub api_user: Option<String>,
    /// Vendor API password.
    pub api_password: Option<String>,
    /// SNMP protocol version (default: v2c).
    pub version: SnmpVersion,
    /// Per-query timeout (default: 5 seconds).
    pub timeout: Duration,
    /// Transport-level retry count (default: 1).
    pub retries: u32,
    /// SNMP port (default: 161).
    pub snmp_port: u16,
    /// Vendor API port (default: 8728, the RouterOS API port).
    pub api_port: u16,
    /// Whether detection results may be reused between polling runs.
    ///
    /// The engine itself holds no cache; this flag is carried to the caller's
    /// handler cache so a single option set drives both layers.
    pub allow_caching: bool,
}

impl Default for QuerierOptions {
    fn default() -> Self {
        Self {
            allowed_transports: vec![TransportClass::Snmp, TransportClass::VendorApi],
            community: "public".to_string(),
            api_user: None,
            api_password: None,
            version: SnmpVersion::V2c,
            timeout: Duration::from_secs(5),
            retries: 1,
            snmp_port: 161,
            api_port: 8728,
            allow_caching: true,
        }
    }
}

impl QuerierOptions {
    /// Restrict probing to the given transport classes.
    pub fn allowed_transports(mut self, classes: impl Into<Vec<TransportClass>>) -> Self {
        self.allowed_transports = classes.into();
        self
    }

    /// Set the SNMP community string.
    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    /// Set vendor API credentials.
    pub fn api_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.api_user = Some(user.into());
        self.api_password = Some(password.into());
        self
    }

    /// Set the SNMP protocol version.
    pub fn version(mut self, version: SnmpVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the per-query timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the transport-level retry count.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Disable reuse of detection results between polling runs.
    pub fn no_caching(mut self) -> Self {
        self.allow_caching = false;
        self
    }

    /// Whether the given transport class may be used.
    pub fn allows(&self, class: TransportClass) -> bool {
        self.allowed_transports.contains(&class)
    }

    /// Check the option set for contradictions.
    ///
    /// Run once before detection; fields are public, so a caller assembling
    /// the struct by hand can produce combinations the builder methods never
    /// would.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_transports.is_empty() {
            return Err(Error::Config("no transport classes allowed".into()).boxed());
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()).boxed());
        }
        if self.api_user.is_some() != self.api_password.is_some() {
            return Err(
                Error::Config("vendor API credentials require both user and password".into())
                    .boxed(),
            );
        }
        Ok(())
    }

    /// Session options for an SNMP session to `addr`.
    pub fn snmp_session(&self, addr: IpAddr) -> SessionOptions {
        SessionOptions {
            addr,
            port: self.snmp_port,
            community: self.community.clone(),
            api_user: None,
            api_password: None,
            version: self.version,
            timeout: self.timeout,
            retries: self.retries,
        }
    }

    /// Session options for a vendor API session to `addr`.
    pub fn api_session(&self, addr: IpAddr) -> SessionOptions {
        SessionOptions {
            addr,
            port: self.api_port,
            community: String::new(),
            api_user: self.api_user.clone(),
            api_password: self.api_password.clone(),
            version: self.version,
            timeout: self.timeout,
            retries: self.retries,
        }
    }
}
