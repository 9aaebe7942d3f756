//! Probe chain tests against programmed mock devices.
//!
//! Run with: `cargo test --test probe_detection`

mod common;

use common::{addr, airos, alix, bgp_record, context, context_with_table, detect, routeros};
use radioquery::table::builtin::family;
use radioquery::transport::mock::MockVendorApi;
use radioquery::transport::TransportClass;
use radioquery::{Error, IdentifierTable, ProbeChain, QuerierOptions};
use semver::Version;

#[tokio::test]
async fn detects_routeros_with_version_and_model() {
    let device = routeros(addr(1), "db0abc-hub");
    let ctx = context(addr(1), QuerierOptions::default(), Some(device), None);

    let handler = detect(&ctx).await.unwrap();
    let identity = handler.identity();
    assert_eq!(identity.family, family::MIKROTIK);
    assert_eq!(identity.model, "RB912UAG-5HPnD");
    assert_eq!(identity.version, Some(Version::new(6, 48, 6)));
    assert!(identity.features.rssi);
    assert!(identity.features.wireless_peers);
    // No API credentials configured: API-backed facets stay off.
    assert!(!identity.features.bgp_peers);
    assert!(!identity.features.traceroute);
}

#[tokio::test]
async fn routeros_with_api_credentials_gains_api_facets() {
    let device = routeros(addr(1), "db0abc-hub");
    let api = MockVendorApi::new(addr(1));
    api.insert(
        "routing/bgp/peer",
        vec![bgp_record("peer-one", "44.224.10.1", 64512, "established")],
    );
    let options = QuerierOptions::default().api_credentials("monitor", "secret");
    let ctx = context(addr(1), options, Some(device), Some(api));

    let handler = detect(&ctx).await.unwrap();
    assert!(handler.identity().features.bgp_peers);
    assert!(handler.identity().features.traceroute);

    let peers = handler.bgp_peers(None).await.unwrap().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].remote_as, Some(64512));
}

#[tokio::test]
async fn refused_api_login_degrades_to_snmp_only() {
    let device = routeros(addr(1), "db0abc-hub");
    // Credentials configured, but no API session registered for the
    // address: the factory refuses the login.
    let options = QuerierOptions::default().api_credentials("monitor", "wrong");
    let ctx = context(addr(1), options, Some(device), None);

    let handler = detect(&ctx).await.unwrap();
    assert_eq!(handler.identity().family, family::MIKROTIK);
    assert!(!handler.identity().features.bgp_peers);
}

#[tokio::test]
async fn detects_airos_by_enterprise_arc() {
    let device = airos(addr(2), "db0xyz-client");
    let ctx = context(addr(2), QuerierOptions::default(), Some(device), None);

    let handler = detect(&ctx).await.unwrap();
    let identity = handler.identity();
    assert_eq!(identity.family, family::UBIQUITI_AIROS);
    assert_eq!(identity.model, "NanoStation M5");
    assert_eq!(identity.version, Some(Version::new(5, 6, 15)));
    assert!(identity.features.wireless_peers);
}

#[tokio::test]
async fn plain_linux_falls_through_to_alix() {
    let device = alix(addr(3), "db0alx");
    let ctx = context(addr(3), QuerierOptions::default(), Some(device), None);

    let handler = detect(&ctx).await.unwrap();
    let identity = handler.identity();
    assert_eq!(identity.family, family::ALIX);
    assert_eq!(identity.model, "db0alx");
    assert_eq!(identity.version, None);
    assert!(!identity.features.wireless_peers);
}

#[tokio::test]
async fn exhaustion_lists_every_candidate_reason() {
    // A device answering SNMP but matching no vendor pattern.
    let device = routeros(addr(4), "odd");
    device.insert(
        radioquery::oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
        radioquery::WireValue::from("VendorX FancyRadio 9000"),
    );
    device.insert(
        radioquery::oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        radioquery::WireValue::ObjectIdentifier(radioquery::oid!(1, 3, 6, 1, 4, 1, 9999)),
    );
    let ctx = context(addr(4), QuerierOptions::default(), Some(device), None);

    let err = detect(&ctx).await.unwrap_err();
    let Error::DetectionExhausted { attempts, .. } = *err else {
        panic!("expected exhaustion, got {err}");
    };
    let names: Vec<_> = attempts.iter().map(|a| a.candidate).collect();
    assert_eq!(names, vec!["mikrotik", "ubiquiti", "alix"]);
    let rendered = format!(
        "{}",
        Error::DetectionExhausted {
            addr: addr(4),
            attempts,
        }
    );
    assert!(rendered.contains("mikrotik"), "{rendered}");
    assert!(rendered.contains("alix"), "{rendered}");
}

#[tokio::test]
async fn unreachable_device_is_exhausted_with_fault_reasons() {
    // Nothing registered for the address: every SNMP probe times out.
    let ctx = context(addr(5), QuerierOptions::default(), None, None);

    let err = detect(&ctx).await.unwrap_err();
    let Error::DetectionExhausted { attempts, .. } = *err else {
        panic!("expected exhaustion, got {err}");
    };
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|a| a.reason.contains("timeout")), "{attempts:?}");
}

#[tokio::test]
async fn transport_restriction_skips_all_snmp_candidates() {
    let device = routeros(addr(6), "db0abc");
    let options = QuerierOptions::default().allowed_transports(vec![TransportClass::VendorApi]);
    let ctx = context(addr(6), options, Some(device), None);

    let err = detect(&ctx).await.unwrap_err();
    let Error::DetectionExhausted { attempts, .. } = *err else {
        panic!("expected exhaustion, got {err}");
    };
    assert!(attempts.iter().all(|a| a.reason.contains("not allowed")), "{attempts:?}");
}

#[tokio::test]
async fn positive_match_with_failing_build_is_terminal() {
    // The device matches the RouterOS candidate, but the table knows no
    // mikrotik family, so handler construction fails. The chain must not
    // fall through to the ALIX candidate.
    let device = routeros(addr(7), "db0abc");
    let ctx = context_with_table(
        addr(7),
        QuerierOptions::default(),
        Some(device),
        IdentifierTable::new(),
    );

    let err = detect(&ctx).await.unwrap_err();
    let Error::HandlerConstruction { source, .. } = *err else {
        panic!("expected construction failure, got {err}");
    };
    assert!(matches!(*source, Error::UnknownFamily { .. }));
}

#[tokio::test]
async fn identity_fields_are_fetched_once_for_the_whole_chain() {
    let device = alix(addr(8), "db0alx");
    let ctx = context(addr(8), QuerierOptions::default(), Some(device.clone()), None);

    detect(&ctx).await.unwrap();
    // sysDescr is pattern-matched by the mikrotik and alix candidates,
    // sysObjectID by the ubiquiti one; each rides exactly one get.
    let descr_gets = device
        .recorded_gets()
        .iter()
        .flatten()
        .filter(|oid| *oid == &radioquery::oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))
        .count();
    assert_eq!(descr_gets, 1);
}

#[tokio::test]
async fn custom_candidates_probe_in_priority_order() {
    let chain = ProbeChain::new();
    assert_eq!(chain.candidate_names(), vec!["mikrotik", "ubiquiti", "alix"]);
}

#[tokio::test]
async fn contradictory_options_fail_before_any_probe() {
    use radioquery::transport::mock::{MockSnmpFactory, MockVendorApiFactory};
    use std::sync::Arc;

    let device = routeros(addr(9), "db0abc");
    let snmp_factory = MockSnmpFactory::new();
    snmp_factory.register(addr(9), device.clone());

    let options = QuerierOptions::default().allowed_transports(vec![]);
    let err = radioquery::detect_and_open(
        addr(9),
        options,
        Arc::new(snmp_factory),
        Arc::new(MockVendorApiFactory::new()),
        Arc::new(radioquery::table::builtin::builtin_table()),
    )
    .await
    .unwrap_err();

    assert!(matches!(*err, Error::Config(_)));
    assert_eq!(device.round_trips(), 0, "no session traffic expected");
}
