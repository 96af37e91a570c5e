//! E2E tests for the two-segment gateway.

mod helpers;

use std::time::Duration;

use tokio::sync::watch;

use helpers::{Network, drain, test_config};
use ve_node::{Dispatch, EcuNode};
use ve_protocol::ids::*;
use ve_protocol::{CanMessage, EcuRole, GatewayCode, RelayOutcome};

/// Relay one inner frame per step until the inner queue is empty.
async fn relay_inner(gateway: &mut EcuNode, now_us: u64) -> Vec<u32> {
    let mut relayed = Vec::new();
    loop {
        match gateway.step_at(now_us).await.dispatch {
            Dispatch::Relayed(id) => relayed.push(id),
            Dispatch::Idle => return relayed,
            other => panic!("unexpected dispatch {other:?}"),
        }
    }
}

/// Brake output never leaves the vehicle; the other powertrain frames do.
#[tokio::test]
async fn e2e_brake_output_is_read_blocked() {
    let net = Network::plaintext();
    let mut powertrain = net.node(EcuRole::Powertrain);
    let mut gateway = net.node(EcuRole::Gateway);
    let obd = net.obd_probe();

    powertrain.state_mut().brake_value = 20;
    powertrain.step_at(0).await;

    // 0x24 is the first periodic frame on the bus.
    gateway.step_at(0).await;
    let outcome = gateway.gateway().unwrap().last_outcome().await;
    assert_eq!(outcome, RelayOutcome::new(BRAKE_OUTPUT_IND_MSG, GatewayCode::ReadBlocked));
    assert_eq!(outcome.code.code(), 1);

    let relayed = relay_inner(&mut gateway, 0).await;
    assert_eq!(relayed.len(), 5);

    let seen: Vec<u32> = drain(&obd).await.iter().map(|m| m.id).collect();
    assert!(!seen.contains(&BRAKE_OUTPUT_IND_MSG));
    assert_eq!(
        seen,
        vec![
            ENGINE_RPM_MSG,
            POWER_STEERING_OUT_IND_MSG,
            SHIFT_POSITION_MSG,
            ENGINE_STATUS_MSG,
            PARKING_BRAKE_STATUS_MSG
        ]
    );
}

/// The main loop copies the latest verdict into state for the GUI.
#[tokio::test]
async fn e2e_gateway_verdict_reaches_telemetry() {
    let net = Network::plaintext();
    let mut gateway = net.node(EcuRole::Gateway);
    let probe = net.probe();

    probe
        .send(&CanMessage::with_data(BRAKE_OUTPUT_IND_MSG, &[0, 0x10]))
        .await
        .unwrap();
    gateway.step_at(0).await;

    let report = gateway.step_at(1_000).await;
    assert_eq!(
        gateway.state().gateway,
        RelayOutcome::new(BRAKE_OUTPUT_IND_MSG, GatewayCode::ReadBlocked)
    );
    assert_eq!(report.telemetry.as_deref(), Some("EXU 0024 011\n"));
}

/// OBD writes are blocked by default and flagged with code 2.
#[tokio::test]
async fn e2e_obd_write_is_blocked() {
    let net = Network::plaintext();
    let gateway = net.node(EcuRole::Gateway);
    let inner = net.probe();
    let obd = net.obd_probe();
    let (tx, rx) = watch::channel(false);
    let relay = gateway.spawn_outer_relay(rx).unwrap();

    obd.send(&CanMessage::with_data(BRAKE_OPERATION_MSG, &[0, 100]))
        .await
        .unwrap();

    let handle = gateway.gateway().unwrap().clone();
    let outcome = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let outcome = handle.last_outcome().await;
            if outcome.id == BRAKE_OPERATION_MSG {
                return outcome;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    tx.send(true).unwrap();
    relay.await.unwrap();

    assert_eq!(outcome.code, GatewayCode::WriteBlocked);
    assert_eq!(outcome.code.code(), 2);
    assert!(drain(&inner).await.is_empty());
}

/// A write allow-list entry lets the OBD port drive the vehicle bus.
#[tokio::test]
async fn e2e_allowed_obd_write_reaches_powertrain() {
    let net = Network::encrypted();
    let mut config = test_config();
    config.gateway.write_allow = vec![BRAKE_OPERATION_MSG];
    let gateway = net.node_with(EcuRole::Gateway, &config);
    let mut powertrain = net.node(EcuRole::Powertrain);
    let obd = net.obd_probe();
    let (tx, rx) = watch::channel(false);
    let relay = gateway.spawn_outer_relay(rx).unwrap();

    let mut msg = CanMessage::new(BRAKE_OPERATION_MSG, 16);
    msg.put_u16_be(0, 75);
    obd.send(&msg).await.unwrap();

    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while powertrain.state().brake_value != 75 {
            powertrain.step_at(0).await;
            tokio::task::yield_now().await;
        }
    })
    .await;

    tx.send(true).unwrap();
    relay.await.unwrap();

    assert!(reached.is_ok(), "forwarded brake frame never arrived");
    let outcome = gateway.gateway().unwrap().last_outcome().await;
    assert_eq!(outcome, RelayOutcome::new(BRAKE_OPERATION_MSG, GatewayCode::Ok));
}

/// Non-gateway roles have no outer relay to spawn.
#[tokio::test]
async fn e2e_only_gateway_has_outer_relay() {
    let net = Network::plaintext();
    let (_tx, rx) = watch::channel(false);
    for role in [EcuRole::Powertrain, EcuRole::Chassis, EcuRole::Body, EcuRole::Observer] {
        let node = net.node(role);
        assert!(node.gateway().is_none());
        assert!(node.spawn_outer_relay(rx.clone()).is_none());
    }
}
