//! Link detection tests over two mock devices.
//!
//! Run with: `cargo test --test link_detection`

mod common;

use common::{
    add_airos_peer, add_interface, add_routeros_peer, addr, airos, alix, context, detect, mac,
    routeros,
};
use radioquery::{detect_link, QuerierOptions};
use std::time::Duration;

const MAC_ONE: &str = "00:0C:42:01:02:03";
const MAC_TWO: &str = "24:A4:3C:AA:BB:CC";

/// A RouterOS AP whose wlan1 sees the AirOS station, and the AirOS station
/// whose registration sees the AP back.
async fn hub_and_client() -> (radioquery::DeviceHandler, radioquery::DeviceHandler) {
    let hub = routeros(addr(1), "db0abc-hub");
    add_interface(&hub, 1, "ether1", 6, None);
    add_interface(&hub, 5, "wlan1", 71, Some(mac(MAC_ONE)));
    // The hub hears the client at -61 dBm.
    add_routeros_peer(&hub, mac(MAC_TWO), 5, -61, -58, 8_640_000);

    let client = airos(addr(2), "db0xyz-client");
    add_interface(&client, 3, "ath0", 71, Some(mac(MAC_TWO)));
    // The client hears the hub at -58 dBm on ath0.
    add_airos_peer(&client, mac(MAC_ONE), 3, -58, 8_640_000);

    let hub_ctx = context(addr(1), QuerierOptions::default(), Some(hub), None);
    let client_ctx = context(addr(2), QuerierOptions::default(), Some(client), None);
    (
        detect(&hub_ctx).await.unwrap(),
        detect(&client_ctx).await.unwrap(),
    )
}

#[tokio::test]
async fn joins_on_mac_across_vendors() {
    let (hub, client) = hub_and_client().await;

    let links = detect_link(&hub, &client).await.unwrap();
    assert_eq!(links.len(), 1);
    let link = &links[0];
    assert_eq!(link.side_one_address, addr(1));
    assert_eq!(link.side_two_address, addr(2));
    assert_eq!(link.side_one_mac, mac(MAC_ONE));
    assert_eq!(link.side_two_mac, Some(mac(MAC_TWO)));
    assert_eq!(link.side_one_interface.name.as_deref(), Some("wlan1"));
    assert_eq!(
        link.side_two_interface.as_ref().and_then(|i| i.name.as_deref()),
        Some("ath0")
    );
    // Hub's signal at the client, client's signal at the hub.
    assert_eq!(link.rx_one_at_two_dbm, Some(-58));
    assert_eq!(link.rx_two_at_one_dbm, Some(-61));
    assert_eq!(link.link_uptime, Some(Duration::from_secs(86_400)));
}

#[tokio::test]
async fn direction_swap_swaps_the_levels() {
    let (hub, client) = hub_and_client().await;

    let links = detect_link(&client, &hub).await.unwrap();
    assert_eq!(links.len(), 1);
    let link = &links[0];
    assert_eq!(link.side_one_mac, mac(MAC_TWO));
    assert_eq!(link.rx_one_at_two_dbm, Some(-61));
    assert_eq!(link.rx_two_at_one_dbm, Some(-58));
}

#[tokio::test]
async fn unrelated_devices_yield_an_empty_list() {
    let (hub, _) = hub_and_client().await;

    let stranger = routeros(addr(9), "db0far");
    add_interface(&stranger, 5, "wlan1", 71, Some(mac("02:00:00:00:00:09")));
    add_routeros_peer(&stranger, mac("02:00:00:00:00:10"), 5, -70, -70, 100);
    let ctx = context(addr(9), QuerierOptions::default(), Some(stranger), None);
    let stranger = detect(&ctx).await.unwrap();

    let links = detect_link(&hub, &stranger).await.unwrap();
    assert!(links.is_empty());
}

#[tokio::test]
async fn wired_only_side_yields_an_empty_list() {
    let (hub, _) = hub_and_client().await;

    let board = alix(addr(3), "db0alx");
    add_interface(&board, 1, "eth0", 6, Some(mac("02:00:00:00:00:03")));
    let ctx = context(addr(3), QuerierOptions::default(), Some(board), None);
    let board = detect(&ctx).await.unwrap();

    // Neither direction errors, even though the board has no wireless
    // facet at all.
    assert!(detect_link(&board, &hub).await.unwrap().is_empty());
    assert!(detect_link(&hub, &board).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_registrations_are_all_emitted() {
    let hub = routeros(addr(1), "db0abc-hub");
    add_interface(&hub, 5, "wlan1", 71, Some(mac(MAC_ONE)));

    // RouterOS keys registrations by (MAC, ifIndex), so the same remote
    // MAC can legitimately appear on two radios.
    let client = routeros(addr(2), "db0xyz");
    add_interface(&client, 5, "wlan1", 71, Some(mac(MAC_TWO)));
    add_interface(&client, 6, "wlan2", 71, Some(mac("24:A4:3C:AA:BB:CD")));
    add_routeros_peer(&client, mac(MAC_ONE), 5, -58, -60, 1_000);
    add_routeros_peer(&client, mac(MAC_ONE), 6, -75, -77, 1_000);

    let hub_ctx = context(addr(1), QuerierOptions::default(), Some(hub), None);
    let client_ctx = context(addr(2), QuerierOptions::default(), Some(client), None);
    let hub = detect(&hub_ctx).await.unwrap();
    let client = detect(&client_ctx).await.unwrap();

    let links = detect_link(&hub, &client).await.unwrap();
    assert_eq!(links.len(), 2, "no silent dedup of matching pairs");
}
