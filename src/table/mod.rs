//! Identifier Resolution Table.
//!
//! Maps (device family, firmware version) to the set of protocol identifiers
//! answering each [`CapabilityKey`] on that exact hardware/firmware
//! combination. Pure lookup, no I/O; read-only after load and safe for
//! unsynchronized concurrent reads.
//!
//! # Version range selection
//!
//! Ranges are `[lower, upper)` with either bound optionally open. Resolution
//! picks the range with the *highest* lower bound whose interval contains the
//! requested version, or the highest range outright when no version is
//! given. A family with no containing range is a hard failure - without it
//! no identifiers can be produced at all. A *capability* missing from the
//! selected mapping is not an error: that feature is unsupported for this
//! device/version and evaluates to "not available" downstream.

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::caps::{CapabilityKey, DataKind};
use crate::error::{Error, Result};
use crate::oid::Oid;

/// A protocol-level identifier: an SNMP OID or a vendor API record path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolIdentifier {
    /// SNMP object identifier.
    Oid(Oid),
    /// Vendor control-API record kind (e.g. `"routing/bgp/peer"`).
    ApiPath(String),
}

/// One immutable row of the resolution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierEntry {
    /// The semantic meaning this row answers.
    pub capability: CapabilityKey,
    /// The wire-level identifier.
    pub identifier: ProtocolIdentifier,
    /// Expected data type, advisory.
    pub kind: DataKind,
}

impl IdentifierEntry {
    /// Row with an OID identifier.
    pub fn oid_row(capability: CapabilityKey, oid: Oid, kind: DataKind) -> Self {
        Self {
            capability,
            identifier: ProtocolIdentifier::Oid(oid),
            kind,
        }
    }

    /// Row with a vendor API path identifier.
    pub fn api_row(capability: CapabilityKey, path: impl Into<String>) -> Self {
        Self {
            capability,
            identifier: ProtocolIdentifier::ApiPath(path.into()),
            kind: DataKind::ApiRecord,
        }
    }

    /// The OID, if this row is SNMP-backed.
    pub fn oid(&self) -> Option<&Oid> {
        match &self.identifier {
            ProtocolIdentifier::Oid(oid) => Some(oid),
            ProtocolIdentifier::ApiPath(_) => None,
        }
    }

    /// The API path, if this row is API-backed.
    pub fn api_path(&self) -> Option<&str> {
        match &self.identifier {
            ProtocolIdentifier::ApiPath(path) => Some(path),
            ProtocolIdentifier::Oid(_) => None,
        }
    }
}

/// A firmware version range owning one identifier mapping.
///
/// `lower` is inclusive, `upper` exclusive; `None` means unbounded on that
/// side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// Inclusive lower bound.
    pub lower: Option<Version>,
    /// Exclusive upper bound.
    pub upper: Option<Version>,
    /// Opaque mapping id the range's identifier rows are filed under.
    pub mapping: String,
}

impl VersionRange {
    /// Whether `version` falls inside `[lower, upper)`.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            if version < lower {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            if version >= upper {
                return false;
            }
        }
        true
    }
}

/// The read-only map a handler carries for its lifetime: capability to
/// identifier row, computed once per (family, version) pair.
#[derive(Debug, Clone)]
pub struct ResolvedIdentifierSet {
    family: String,
    mapping: String,
    entries: HashMap<CapabilityKey, IdentifierEntry>,
}

impl ResolvedIdentifierSet {
    /// The device family this set was resolved for.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The mapping id of the selected version range.
    pub fn mapping(&self) -> &str {
        &self.mapping
    }

    /// Look up the row for a capability; `None` means the feature is
    /// unsupported for this device/version, not a fault.
    pub fn get(&self, capability: CapabilityKey) -> Option<&IdentifierEntry> {
        self.entries.get(&capability)
    }

    /// The OID answering a capability, if SNMP-backed and present.
    pub fn oid_for(&self, capability: CapabilityKey) -> Option<&Oid> {
        self.get(capability).and_then(IdentifierEntry::oid)
    }

    /// The API path answering a capability, if API-backed and present.
    pub fn api_path_for(&self, capability: CapabilityKey) -> Option<&str> {
        self.get(capability).and_then(IdentifierEntry::api_path)
    }

    /// Whether the set carries any row at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of resolved capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Consistency findings from the offline [`IdentifierTable::verify_consistency`]
/// check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Capabilities with no row in any mapping - silent data loss waiting to
    /// happen.
    pub uncovered_capabilities: Vec<CapabilityKey>,
    /// Mapping ids referenced by version ranges but carrying no rows.
    pub dangling_mappings: Vec<String>,
    /// Mapping ids with rows but referenced by no version range.
    pub orphaned_mappings: Vec<String>,
}

impl ConsistencyReport {
    /// Whether table and vocabulary agree.
    pub fn is_clean(&self) -> bool {
        self.uncovered_capabilities.is_empty()
            && self.dangling_mappings.is_empty()
            && self.orphaned_mappings.is_empty()
    }
}

/// The versioned identifier lookup table.
///
/// Built either programmatically (see [`builtin::builtin_table`]) or loaded
/// from a serde dataset via [`IdentifierTable::from_dataset`].
#[derive(Debug, Default)]
pub struct IdentifierTable {
    /// Per family name, its ranges sorted by descending lower bound
    /// (unbounded lower sorts last).
    families: HashMap<String, Vec<VersionRange>>,
    /// Rows per mapping id.
    mappings: HashMap<String, Vec<IdentifierEntry>>,
}

/// Serde form of the table, the on-disk layout of the versioned dataset.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableDataset {
    /// Family name to version ranges.
    pub families: HashMap<String, Vec<VersionRange>>,
    /// Mapping id to rows.
    pub mappings: HashMap<String, Vec<IdentifierEntry>>,
}

impl IdentifierTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a deserialized dataset.
    pub fn from_dataset(dataset: TableDataset) -> Self {
        let mut table = Self {
            families: dataset.families,
            mappings: dataset.mappings,
        };
        for ranges in table.families.values_mut() {
            sort_ranges(ranges);
        }
        table
    }

    /// Add a version range for a family, keeping ranges ordered.
    pub fn add_range(&mut self, family: impl Into<String>, range: VersionRange) {
        let ranges = self.families.entry(family.into()).or_default();
        ranges.push(range);
        sort_ranges(ranges);
    }

    /// Add identifier rows under a mapping id.
    pub fn add_rows(&mut self, mapping: impl Into<String>, rows: Vec<IdentifierEntry>) {
        self.mappings.entry(mapping.into()).or_default().extend(rows);
    }

    /// Family names known to the table.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Resolve the identifier set for a device.
    ///
    /// Fails with [`Error::UnknownFamily`] for an unknown family name and
    /// [`Error::NoVersionMatch`] when no range contains `version`. With
    /// `version = None` the highest range wins.
    pub fn resolve(
        &self,
        family: &str,
        version: Option<&Version>,
    ) -> Result<Arc<ResolvedIdentifierSet>> {
        let ranges = self.families.get(family).ok_or_else(|| {
            Error::UnknownFamily {
                family: family.to_string(),
            }
            .boxed()
        })?;

        let selected = match version {
            None => ranges.first(),
            Some(v) => ranges.iter().find(|range| range.contains(v)),
        }
        .ok_or_else(|| {
            Error::NoVersionMatch {
                family: family.to_string(),
                version: version.cloned(),
            }
            .boxed()
        })?;

        let rows = self
            .mappings
            .get(&selected.mapping)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let entries: HashMap<_, _> = rows
            .iter()
            .map(|row| (row.capability, row.clone()))
            .collect();

        tracing::debug!(
            target: "radioquery::table",
            family,
            mapping = %selected.mapping,
            capabilities = entries.len(),
            version = version.map(|v| v.to_string()),
            "resolved identifier set"
        );

        Ok(Arc::new(ResolvedIdentifierSet {
            family: family.to_string(),
            mapping: selected.mapping.clone(),
            entries,
        }))
    }

    /// Offline table/vocabulary drift check.
    ///
    /// Run once at startup, never per query. Findings are logged as errors
    /// and returned; they do not abort anything by themselves.
    pub fn verify_consistency(&self) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();

        for capability in CapabilityKey::ALL {
            let covered = self
                .mappings
                .values()
                .flatten()
                .any(|row| row.capability == capability);
            if !covered {
                report.uncovered_capabilities.push(capability);
            }
        }

        let mut referenced: Vec<&str> = self
            .families
            .values()
            .flatten()
            .map(|range| range.mapping.as_str())
            .collect();
        referenced.sort_unstable();
        referenced.dedup();

        for mapping in &referenced {
            if !self.mappings.contains_key(*mapping) {
                report.dangling_mappings.push((*mapping).to_string());
            }
        }
        for mapping in self.mappings.keys() {
            if referenced.binary_search(&mapping.as_str()).is_err() {
                report.orphaned_mappings.push(mapping.clone());
            }
        }
        report.orphaned_mappings.sort_unstable();

        if !report.is_clean() {
            tracing::error!(
                target: "radioquery::table",
                uncovered = ?report.uncovered_capabilities,
                dangling = ?report.dangling_mappings,
                orphaned = ?report.orphaned_mappings,
                "identifier table and capability vocabulary have drifted"
            );
        }
        report
    }
}

/// Descending by lower bound; unbounded-lower ranges sort last so the
/// "highest" range is first.
fn sort_ranges(ranges: &mut [VersionRange]) {
    ranges.sort_by(|a, b| match (&b.lower, &a.lower) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn sample_table() -> IdentifierTable {
        let mut table = IdentifierTable::new();
        table.add_range(
            "mikrotik",
            VersionRange {
                lower: Some(v("6.0.0")),
                upper: None,
                mapping: "mk-v6".into(),
            },
        );
        table.add_range(
            "mikrotik",
            VersionRange {
                lower: None,
                upper: Some(v("6.0.0")),
                mapping: "mk-v5".into(),
            },
        );
        table.add_rows(
            "mk-v6",
            vec![
                IdentifierEntry::oid_row(
                    CapabilityKey::SysDescription,
                    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                    DataKind::String,
                ),
                IdentifierEntry::oid_row(
                    CapabilityKey::RxSignalStrength,
                    oid!(1, 3, 6, 1, 4, 1, 14988, 1, 1, 1, 2, 1, 3),
                    DataKind::Integer,
                ),
            ],
        );
        table.add_rows(
            "mk-v5",
            vec![IdentifierEntry::oid_row(
                CapabilityKey::SysDescription,
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                DataKind::String,
            )],
        );
        table
    }

    #[test]
    fn resolve_picks_highest_containing_range() {
        let table = sample_table();
        let set = table.resolve("mikrotik", Some(&v("6.48.6"))).unwrap();
        assert_eq!(set.mapping(), "mk-v6");
        let set = table.resolve("mikrotik", Some(&v("5.26.0"))).unwrap();
        assert_eq!(set.mapping(), "mk-v5");
    }

    #[test]
    fn resolve_without_version_picks_highest_range() {
        let table = sample_table();
        let set = table.resolve("mikrotik", None).unwrap();
        assert_eq!(set.mapping(), "mk-v6");
    }

    #[test]
    fn lower_bound_is_inclusive_upper_exclusive() {
        let table = sample_table();
        let at_bound = table.resolve("mikrotik", Some(&v("6.0.0"))).unwrap();
        assert_eq!(at_bound.mapping(), "mk-v6");
        let below = table.resolve("mikrotik", Some(&v("5.99.9"))).unwrap();
        assert_eq!(below.mapping(), "mk-v5");
    }

    #[test]
    fn unknown_family_is_hard_error() {
        let table = sample_table();
        let err = table.resolve("frobnicator", None).unwrap_err();
        assert!(matches!(*err, Error::UnknownFamily { .. }));
    }

    #[test]
    fn uncontained_version_is_hard_error() {
        let mut table = IdentifierTable::new();
        table.add_range(
            "narrow",
            VersionRange {
                lower: Some(v("2.0.0")),
                upper: Some(v("3.0.0")),
                mapping: "n".into(),
            },
        );
        table.add_rows("n", vec![]);
        let err = table.resolve("narrow", Some(&v("4.0.0"))).unwrap_err();
        assert!(matches!(*err, Error::NoVersionMatch { .. }));
    }

    #[test]
    fn missing_capability_is_absent_not_error() {
        let table = sample_table();
        let set = table.resolve("mikrotik", Some(&v("5.0.0"))).unwrap();
        assert!(set.get(CapabilityKey::RxSignalStrength).is_none());
        assert!(set.get(CapabilityKey::SysDescription).is_some());
    }

    #[test]
    fn consistency_flags_drift() {
        let table = sample_table();
        let report = table.verify_consistency();
        // The sample table covers only two capabilities; the rest are drift.
        assert!(!report.is_clean());
        assert!(report
            .uncovered_capabilities
            .contains(&CapabilityKey::BgpPeerTable));
        assert!(report.dangling_mappings.is_empty());
        assert!(report.orphaned_mappings.is_empty());
    }

    #[test]
    fn consistency_flags_dangling_and_orphaned_mappings() {
        let mut table = IdentifierTable::new();
        table.add_range(
            "f",
            VersionRange {
                lower: None,
                upper: None,
                mapping: "referenced-but-empty".into(),
            },
        );
        table.add_rows(
            "never-referenced",
            vec![IdentifierEntry::oid_row(
                CapabilityKey::SysName,
                oid!(1, 3, 6, 1, 2, 1, 1, 5, 0),
                DataKind::String,
            )],
        );
        let report = table.verify_consistency();
        assert_eq!(report.dangling_mappings, vec!["referenced-but-empty"]);
        assert_eq!(report.orphaned_mappings, vec!["never-referenced"]);
    }

    #[test]
    fn dataset_round_trip() {
        let table = sample_table();
        let dataset = TableDataset {
            families: table.families.clone(),
            mappings: table.mappings.clone(),
        };
        let json = serde_json::to_string(&dataset).unwrap();
        let reloaded = IdentifierTable::from_dataset(serde_json::from_str(&json).unwrap());
        let set = reloaded.resolve("mikrotik", Some(&v("7.1.0"))).unwrap();
        assert_eq!(set.mapping(), "mk-v6");
    }
}
