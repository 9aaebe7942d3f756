//! Wire values and domain scalars.
//!
//! [`WireValue`] is the subset of SNMP data types the query engine consumes;
//! the transport primitive is responsible for producing them from whatever
//! encoding it speaks. [`MacAddress`] is the join key of the link detector.

use bytes::Bytes;
use std::fmt;

use crate::oid::Oid;

/// A value retrieved from a device.
///
/// Typed accessors return `Option` instead of panicking, so a device
/// answering with an unexpected type degrades to "not available" rather
/// than aborting a polling run.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WireValue {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING (arbitrary bytes)
    OctetString(Bytes),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),
    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks (hundredths of seconds)
    TimeTicks(u32),
    /// Counter64 (SNMPv2c/v3 only)
    Counter64(u64),
    /// noSuchObject / noSuchInstance exception - the identifier has no value
    /// on this device. Evaluates to "not available" in the lazy model.
    NoSuchValue,
    /// endOfMibView exception (walk termination)
    EndOfMibView,
}

impl WireValue {
    /// Whether this value is an exception (absence marker).
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NoSuchValue | Self::EndOfMibView)
    }

    /// UTF-8 string view of an OCTET STRING (lossy for non-UTF-8 content).
    pub fn as_str(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Raw octets of an OCTET STRING.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::OctetString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Signed integer view.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned view of Integer / Counter32 / Gauge32 / TimeTicks.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Integer(v) if *v >= 0 => Some(*v as u32),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }

    /// Widening unsigned view (also covers Counter64).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Counter64(v) => Some(*v),
            other => other.as_u32().map(u64::from),
        }
    }

    /// OBJECT IDENTIFIER view.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Self::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// TimeTicks as a [`std::time::Duration`] (hundredths of seconds).
    pub fn as_ticks_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::TimeTicks(ticks) => Some(std::time::Duration::from_millis(*ticks as u64 * 10)),
            _ => None,
        }
    }

    /// MAC address view of a 6-octet OCTET STRING.
    pub fn as_mac(&self) -> Option<MacAddress> {
        match self {
            Self::OctetString(bytes) if bytes.len() == 6 => {
                let mut octets = [0u8; 6];
                octets.copy_from_slice(bytes);
                Some(MacAddress::new(octets))
            }
            _ => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => write!(f, "{s}"),
                Err(_) => {
                    for b in bytes.iter() {
                        write!(f, "{b:02X}")?;
                    }
                    Ok(())
                }
            },
            Self::Null => write!(f, "null"),
            Self::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Self::IpAddress(o) => write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3]),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => write!(f, "{v}"),
            Self::Counter64(v) => write!(f, "{v}"),
            Self::NoSuchValue => write!(f, "noSuchValue"),
            Self::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        Self::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<i32> for WireValue {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

/// A 48-bit MAC address.
///
/// Equality is byte-wise, which makes MAC comparison inherently
/// case-insensitive; parsing accepts colon, dash, and bare-hex notation in
/// either case. Display is uppercase colon-separated.
///
/// # Examples
///
/// ```
/// use radioquery::value::MacAddress;
///
/// let a: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// let b: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "AA:BB:CC:DD:EE:FF");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

/// Error parsing a MAC address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address '{0}'")]
pub struct ParseMacError(pub String);

impl MacAddress {
    /// Construct from raw octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Construct from six OID arcs (registration-table row keys encode the
    /// remote MAC as six arcs). Arcs above 255 are rejected.
    pub fn from_arcs(arcs: &[u32]) -> Option<Self> {
        if arcs.len() != 6 || arcs.iter().any(|&a| a > 0xFF) {
            return None;
        }
        let mut octets = [0u8; 6];
        for (o, &a) in octets.iter_mut().zip(arcs) {
            *o = a as u8;
        }
        Some(Self(octets))
    }
}

impl std::str::FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.' | ' '))
            .collect();
        if cleaned.len() != 12 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseMacError(s.to_string()));
        }
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&cleaned[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseMacError(s.to_string()))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl serde::Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
