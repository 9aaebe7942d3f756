//! Error types for radioquery.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type covering transport faults, capability
//!   absence that blocks handler construction, and detection exhaustion
//! - [`ProbeAttempt`] - One candidate's rejection reason inside a
//!   [`Error::DetectionExhausted`] aggregate
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! Transport faults (timeout, refused connection, malformed response) are
//! always surfaced to the caller; this crate never retries them internally.
//! The outer scheduler decides whether a retry is worthwhile, informed by
//! [`RetryGovernor`](crate::governor::RetryGovernor).
//!
//! ```rust
//! use radioquery::{Error, Result};
//!
//! fn is_transport_fault(result: &Result<()>) -> bool {
//!     match result {
//!         Err(e) => matches!(
//!             &**e,
//!             Error::Timeout { .. } | Error::Network { .. } | Error::MalformedResponse { .. }
//!         ),
//!         Ok(()) => false,
//!     }
//! }
//! ```

use std::net::IpAddr;
use std::time::Duration;

use crate::device::Facet;

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// One probe candidate's outcome, collected into
/// [`Error::DetectionExhausted`] when no candidate matches.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    /// Candidate detector name (e.g. `"mikrotik"`).
    pub candidate: &'static str,
    /// Why this candidate rejected the device, or what failed while asking.
    pub reason: String,
}

impl std::fmt::Display for ProbeAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.candidate, self.reason)
    }
}

/// The main error type for all radioquery operations.
///
/// Errors are boxed (via [`Result`]) to keep the size small on the stack.
///
/// # Taxonomy
///
/// - *Transport faults*: [`Network`](Self::Network), [`Timeout`](Self::Timeout),
///   [`Auth`](Self::Auth), [`MalformedResponse`](Self::MalformedResponse),
///   [`Agent`](Self::Agent). Surfaced as-is, never silently retried.
/// - *Capability absence that blocks construction*:
///   [`UnknownFamily`](Self::UnknownFamily), [`NoVersionMatch`](Self::NoVersionMatch).
///   Absence of an *individual* capability is not an error; it evaluates to
///   "not available" in the lazy result model.
/// - *Facet unsupported*: [`FacetUnsupported`](Self::FacetUnsupported) lets
///   callers distinguish "no peers" from "can't ask this device class".
/// - *Detection exhaustion*: [`DetectionExhausted`](Self::DetectionExhausted)
///   aggregates every candidate's rejection reason in one structured error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Network failure (connection refused, unreachable, etc.)
    #[error("network error communicating with {addr}: {source}")]
    Network {
        addr: IpAddr,
        #[source]
        source: std::io::Error,
    },

    /// Request timed out after transport-level retries.
    #[error("timeout after {elapsed:?} waiting for {addr} ({retries} retries)")]
    Timeout {
        addr: IpAddr,
        elapsed: Duration,
        retries: u32,
    },

    /// Protocol-level error reported by the remote agent.
    #[error("agent error from {addr}: {message}")]
    Agent { addr: IpAddr, message: String },

    /// Authentication/authorization failed (SNMP community or API login).
    #[error("authentication failed for {addr}")]
    Auth { addr: IpAddr },

    /// Malformed response from the device.
    #[error("malformed response from {addr}: {detail}")]
    MalformedResponse { addr: IpAddr, detail: String },

    /// Device family name not present in the identifier resolution table.
    #[error("unknown device family '{family}'")]
    UnknownFamily { family: String },

    /// No version range of the family covers the requested firmware version.
    ///
    /// Hard failure: without a matching range no identifiers can be produced
    /// and no handler can be built.
    #[error("no applicable version range for family '{family}' version {version:?}")]
    NoVersionMatch {
        family: String,
        version: Option<semver::Version>,
    },

    /// The facet is not supported by this device class.
    ///
    /// Distinguishable from an empty facet: "no peers" is `Ok(vec![])`,
    /// "can't ask" is this error.
    #[error("{facet} not supported for {addr} ({model})")]
    FacetUnsupported {
        addr: IpAddr,
        model: String,
        facet: Facet,
    },

    /// Every probe candidate rejected the device.
    ///
    /// The attempts list every candidate's individual reason, which is
    /// essential for diagnosing unknown hardware in the field.
    #[error("no detector matched {addr}: [{}]", format_attempts(.attempts))]
    DetectionExhausted {
        addr: IpAddr,
        attempts: Vec<ProbeAttempt>,
    },

    /// A candidate positively matched but constructing the handler failed.
    ///
    /// Terminal for the probe attempt; no further candidates are tried.
    #[error("handler construction failed for {addr}")]
    HandlerConstruction {
        addr: IpAddr,
        #[source]
        source: Box<Error>,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Invalid OID format.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Whether this error is a transport fault the retry governor should
    /// record against the device.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::Auth { .. }
                | Self::MalformedResponse { .. }
                | Self::Agent { .. }
        )
    }
}

fn format_attempts(attempts: &[ProbeAttempt]) -> String {
    attempts
        .iter()
        .map(ProbeAttempt::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_stays_small_enough_to_box() {
        // Error size should stay bounded to avoid bloating Result types.
        assert!(
            std::mem::size_of::<Error>() <= 136,
            "Error grew to {} bytes",
            std::mem::size_of::<Error>()
        );

        // Result<(), Box<Error>> should be pointer-sized (8 bytes on 64-bit).
        assert_eq!(
            std::mem::size_of::<Result<()>>(),
            std::mem::size_of::<*const ()>(),
            "Result<()> should be pointer-sized"
        );
    }

    #[test]
    fn detection_exhausted_lists_every_candidate() {
        let err = Error::DetectionExhausted {
            addr: "44.0.0.1".parse().unwrap(),
            attempts: vec![
                ProbeAttempt {
                    candidate: "mikrotik",
                    reason: "sysDescr does not mention RouterOS".into(),
                },
                ProbeAttempt {
                    candidate: "ubiquiti",
                    reason: "sysObjectID outside Ubiquiti arc".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("mikrotik"), "{msg}");
        assert!(msg.contains("ubiquiti"), "{msg}");
        assert!(msg.contains("RouterOS"), "{msg}");
    }

    #[test]
    fn transport_fault_classification() {
        let timeout = Error::Timeout {
            addr: "44.0.0.1".parse().unwrap(),
            elapsed: Duration::from_secs(2),
            retries: 1,
        };
        assert!(timeout.is_transport_fault());

        let unknown = Error::UnknownFamily {
            family: "frobnicator".into(),
        };
        assert!(!unknown.is_transport_fault());
    }
}
