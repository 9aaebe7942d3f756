//! Built-in probe candidates.
//!
//! Priorities leave room for deployment-specific candidates in between. The
//! ALIX candidate matches any Linux sysDescr, so it sits last.

use semver::Version;
use tracing::debug;

use super::{ProbeCandidate, ProbeContext};
use crate::caps::CapabilityKey;
use crate::device::{
    DeviceHandler, DeviceIdentity, MikrotikStrategy, SnmpStrategy, VendorStrategy,
};
use crate::error::{Error, Result};
use crate::oid;
use crate::table::builtin::family;
use crate::transport::{get_one, BoxFuture, TransportClass};

/// Pull a `major.minor[.patch]` version out of a vendor firmware string.
///
/// Vendor strings are messy: RouterOS reports `"6.48.6 (stable)"`, AirOS
/// something like `"XM.ar7240.v5.6.15.30572"`. The first dotted numeric run
/// wins; a bare number without a dot is not taken for a version.
pub(crate) fn extract_version(raw: &str) -> Option<Version> {
    fn parse_token(token: &str) -> Option<Version> {
        let token = token.trim_matches('.');
        if !token.contains('.') {
            return None;
        }
        let mut numbers = token.split('.').map(|part| part.parse::<u64>());
        let major = numbers.next()?.ok()?;
        let minor = numbers.next()?.ok()?;
        let patch = numbers.next().transpose().ok()?.unwrap_or(0);
        Some(Version::new(major, minor, patch))
    }

    raw.split(|c: char| !c.is_ascii_digit() && c != '.')
        .find_map(parse_token)
}

/// MikroTik RouterOS: matched on the sysDescr banner, queried over SNMP
/// with an optional control-API session for the API-only facets.
pub struct MikrotikCandidate;

impl MikrotikCandidate {
    async fn assemble(&self, ctx: &ProbeContext) -> Result<DeviceHandler> {
        let session = ctx.snmp_session().await?;
        // Version-independent rows (model, firmware) are identical across
        // every RouterOS mapping, so a version-less resolve bootstraps them.
        let bootstrap = ctx.table().resolve(family::MIKROTIK, None)?;

        let version = match bootstrap.oid_for(CapabilityKey::FirmwareVersion) {
            Some(oid) => get_one(session.as_ref(), oid)
                .await?
                .as_str()
                .as_deref()
                .and_then(extract_version),
            None => None,
        };
        let resolved = ctx.table().resolve(family::MIKROTIK, version.as_ref())?;

        let model = match resolved.oid_for(CapabilityKey::Model) {
            Some(oid) => get_one(session.as_ref(), oid).await?.as_str(),
            None => None,
        };
        let model = match model {
            Some(model) => model,
            None => ctx
                .sys_description()
                .await?
                .unwrap_or_else(|| "MikroTik".to_string()),
        };

        // Only try the control API when credentials are configured; a
        // refused or unreachable API degrades the handler to SNMP-only.
        let api = if ctx.options().api_user.is_some() {
            match ctx.open_api().await {
                Ok(api) => api,
                Err(err) => {
                    debug!(
                        target: "radioquery::probe",
                        addr = %ctx.addr(),
                        error = %err,
                        "vendor API unavailable, continuing SNMP-only"
                    );
                    None
                }
            }
        } else {
            None
        };

        let strategy = MikrotikStrategy::new(
            ctx.addr(),
            model.clone(),
            resolved.clone(),
            session,
            api,
        );
        let identity = DeviceIdentity {
            address: ctx.addr(),
            family: family::MIKROTIK.to_string(),
            model,
            version,
            features: strategy.features(),
        };
        Ok(DeviceHandler::new(identity, resolved, Box::new(strategy)))
    }
}

impl ProbeCandidate for MikrotikCandidate {
    fn name(&self) -> &'static str {
        "mikrotik"
    }

    fn priority(&self) -> u32 {
        300
    }

    fn transport_class(&self) -> TransportClass {
        TransportClass::Snmp
    }

    fn matches<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            Ok(ctx
                .sys_description()
                .await?
                .is_some_and(|descr| descr.contains("RouterOS")))
        })
    }

    fn build<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<DeviceHandler>> {
        Box::pin(self.assemble(ctx))
    }
}

/// Ubiquiti: matched on the enterprise arc of sysObjectID, then split into
/// AirOS and AirFiber by which model identifier the device answers.
pub struct UbiquitiCandidate;

impl UbiquitiCandidate {
    async fn assemble(&self, ctx: &ProbeContext) -> Result<DeviceHandler> {
        let session = ctx.snmp_session().await?;
        let airos = ctx.table().resolve(family::UBIQUITI_AIROS, None)?;
        let airfiber = ctx.table().resolve(family::UBIQUITI_AIRFIBER, None)?;

        let airfiber_model = match airfiber.oid_for(CapabilityKey::Model) {
            Some(oid) => get_one(session.as_ref(), oid).await?.as_str(),
            None => None,
        };
        let (family_name, bootstrap, model) = match airfiber_model {
            Some(model) => (family::UBIQUITI_AIRFIBER, airfiber, Some(model)),
            None => {
                let model = match airos.oid_for(CapabilityKey::Model) {
                    Some(oid) => get_one(session.as_ref(), oid).await?.as_str(),
                    None => None,
                };
                (family::UBIQUITI_AIROS, airos, model)
            }
        };
        let model = model.ok_or_else(|| {
            Error::MalformedResponse {
                addr: ctx.addr(),
                detail: "Ubiquiti device answers neither model identifier".to_string(),
            }
            .boxed()
        })?;

        let version = match bootstrap.oid_for(CapabilityKey::FirmwareVersion) {
            Some(oid) => get_one(session.as_ref(), oid)
                .await?
                .as_str()
                .as_deref()
                .and_then(extract_version),
            None => None,
        };
        let resolved = ctx.table().resolve(family_name, version.as_ref())?;

        let strategy = SnmpStrategy::new(ctx.addr(), model.clone(), resolved.clone(), session);
        let identity = DeviceIdentity {
            address: ctx.addr(),
            family: family_name.to_string(),
            model,
            version,
            features: strategy.features(),
        };
        Ok(DeviceHandler::new(identity, resolved, Box::new(strategy)))
    }
}

impl ProbeCandidate for UbiquitiCandidate {
    fn name(&self) -> &'static str {
        "ubiquiti"
    }

    fn priority(&self) -> u32 {
        200
    }

    fn transport_class(&self) -> TransportClass {
        TransportClass::Snmp
    }

    fn matches<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let ubnt_arc = oid!(1, 3, 6, 1, 4, 1, 41112);
            Ok(ctx
                .sys_object_id()
                .await?
                .is_some_and(|id| id.starts_with(&ubnt_arc)))
        })
    }

    fn build<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<DeviceHandler>> {
        Box::pin(self.assemble(ctx))
    }
}

/// ALIX/APU Linux boards: plain MIB-2, no wireless instrumentation. Matches
/// any Linux sysDescr, so this runs at the lowest built-in priority.
pub struct AlixCandidate;

impl AlixCandidate {
    async fn assemble(&self, ctx: &ProbeContext) -> Result<DeviceHandler> {
        let session = ctx.snmp_session().await?;
        let resolved = ctx.table().resolve(family::ALIX, None)?;

        // No vendor model identifier to ask; the hostname part of sysDescr
        // ("Linux db0xyz 4.19.0 ...") is the best label available.
        let model = ctx
            .sys_description()
            .await?
            .and_then(|descr| descr.split_whitespace().nth(1).map(str::to_string))
            .unwrap_or_else(|| "linux".to_string());

        let strategy = SnmpStrategy::new(ctx.addr(), model.clone(), resolved.clone(), session);
        let identity = DeviceIdentity {
            address: ctx.addr(),
            family: family::ALIX.to_string(),
            model,
            version: None,
            features: strategy.features(),
        };
        Ok(DeviceHandler::new(identity, resolved, Box::new(strategy)))
    }
}

impl ProbeCandidate for AlixCandidate {
    fn name(&self) -> &'static str {
        "alix"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn transport_class(&self) -> TransportClass {
        TransportClass::Snmp
    }

    fn matches<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            Ok(ctx
                .sys_description()
                .await?
                .is_some_and(|descr| descr.starts_with("Linux")))
        })
    }

    fn build<'a>(&'a self, ctx: &'a ProbeContext) -> BoxFuture<'a, Result<DeviceHandler>> {
        Box::pin(self.assemble(ctx))
    }
}
