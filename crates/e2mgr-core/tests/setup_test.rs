// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Setup request scenarios against the full component graph.

mod common;

use common::*;
use e2mgr_core::bus::MessageType;
use e2mgr_core::mock::{MockMessageSender, MockRouteRegistrar};
use e2mgr_core::store::StoreError;
use e2mgr_core::{ConnectionStatus, ErrorKind, ProtocolKind, SetupRequest};

// ============================================================================
// New RAN
// ============================================================================

#[tokio::test]
async fn test_new_ran_with_empty_pool_creates_nothing() {
    let ctx = TestContext::new(&[]).await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoInstanceAvailable);
    assert!(ctx.memory.ran("ran-1").await.is_none());
    assert!(ctx.memory.ran_writes().await.is_empty());
    assert!(ctx.registrar.associations().await.is_empty());
    assert!(ctx.sender.sent().await.is_empty());
}

#[tokio::test]
async fn test_new_ran_is_associated_and_setup_sent() {
    let ctx = TestContext::new(&[E2T_1]).await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    let ran = ctx.ran("ran-1").await;
    assert_eq!(ran.connection_status, ConnectionStatus::Connecting);
    assert_eq!(ran.associated_address(), Some(E2T_1));
    assert_eq!(ran.protocol, ProtocolKind::X2Setup);
    assert_eq!(ctx.instance_rans(E2T_1).await, vec!["ran-1"]);
    assert_eq!(
        ctx.registrar.associations().await,
        vec![(E2T_1.to_string(), "ran-1".to_string())]
    );

    let sent = ctx.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].msg_type, MessageType::X2SetupRequest);
    assert_eq!(sent[0].ran_name, "ran-1");
    assert!(sent[0].payload.starts_with(b"10.0.0.5|36422|ran-1|2|"));
}

#[tokio::test]
async fn test_new_ran_record_created_before_association() {
    let ctx = TestContext::new(&[E2T_1]).await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    let writes = ctx.memory.ran_writes().await;
    assert_eq!(writes.len(), 2);
    assert!(writes[0].associated_instance_address.is_none());
    assert_eq!(writes[1].associated_address(), Some(E2T_1));
    assert!(
        writes
            .iter()
            .all(|ran| ran.connection_status == ConnectionStatus::Connecting)
    );
}

#[tokio::test]
async fn test_endc_setup_uses_endc_message() {
    let ctx = TestContext::new(&[E2T_1]).await;

    ctx.manager
        .setup
        .handle(x2_request("gnb-1"), ProtocolKind::EndcX2Setup)
        .await
        .unwrap();

    assert_eq!(ctx.ran("gnb-1").await.protocol, ProtocolKind::EndcX2Setup);
    let sent = ctx.sender.sent_of_type(MessageType::EndcX2SetupRequest).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].payload.ends_with(&[0x00, 0x24]));
}

#[tokio::test]
async fn test_invalid_request_has_no_side_effects() {
    let ctx = TestContext::new(&[E2T_1]).await;

    for request in [
        SetupRequest::new("10.0.0.5", 0, "ran-1"),
        SetupRequest::new("10.0.0.x", 36422, "ran-1"),
        SetupRequest::new("10.0.0.5", 36422, ""),
    ] {
        let err = ctx
            .manager
            .setup
            .handle(request, ProtocolKind::X2Setup)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    assert!(ctx.memory.ran_writes().await.is_empty());
    assert!(ctx.instance_rans(E2T_1).await.is_empty());
    assert_eq!(ctx.memory.call_count("get_ran"), 0);
}

#[tokio::test]
async fn test_new_ran_goes_to_least_loaded_instance() {
    let ctx = TestContext::new(&[E2T_1, E2T_2]).await;
    ctx.seed_ran("ran-0", ConnectionStatus::Connected, Some(E2T_1))
        .await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    assert_eq!(ctx.ran("ran-1").await.associated_address(), Some(E2T_2));
    assert_eq!(ctx.instance_rans(E2T_2).await, vec!["ran-1"]);
}

// ============================================================================
// Existing RAN
// ============================================================================

#[tokio::test]
async fn test_shutting_down_ran_is_rejected_untouched() {
    let ctx = TestContext::new(&[E2T_1]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::ShuttingDown, None)
        .await;
    let before = ctx.ran("ran-1").await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::EndcX2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WrongState);
    assert!(err.to_string().contains("ENDC_SETUP"));
    assert_eq!(ctx.ran("ran-1").await, before);
    assert!(ctx.memory.ran_writes().await.is_empty());
    assert!(ctx.sender.sent().await.is_empty());
    assert!(ctx.instance_rans(E2T_1).await.is_empty());
}

#[tokio::test]
async fn test_associated_connected_ran_is_resent_without_reselection() {
    let ctx = TestContext::new(&[E2T_1, E2T_2]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Connected, Some(E2T_2))
        .await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    assert_eq!(
        ctx.memory.status_history("ran-1").await,
        vec![ConnectionStatus::Connected]
    );
    assert_eq!(ctx.ran("ran-1").await.associated_address(), Some(E2T_2));
    assert!(ctx.registrar.associations().await.is_empty());
    assert_eq!(ctx.memory.call_count("list_instance_addresses"), 0);
    assert_eq!(ctx.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_associated_disconnected_ran_moves_to_connecting() {
    let ctx = TestContext::new(&[E2T_1]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Disconnected, Some(E2T_1))
        .await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    assert_eq!(
        ctx.memory.status_history("ran-1").await,
        vec![ConnectionStatus::Connecting]
    );
    assert_eq!(ctx.instance_rans(E2T_1).await, vec!["ran-1"]);
    assert_eq!(ctx.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_unassociated_ran_is_reassociated() {
    let ctx = TestContext::new(&[E2T_1]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Disconnected, None)
        .await;

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    let ran = ctx.ran("ran-1").await;
    assert_eq!(ran.connection_status, ConnectionStatus::Connecting);
    assert_eq!(ran.associated_address(), Some(E2T_1));
    assert_eq!(ctx.instance_rans(E2T_1).await, vec!["ran-1"]);
    assert_eq!(ctx.registrar.associations().await.len(), 1);
    assert_eq!(ctx.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_unassociated_ran_without_instances_becomes_disconnected() {
    let ctx = TestContext::new(&[]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Connected, None)
        .await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoInstanceAvailable);
    assert_eq!(
        ctx.memory.status_history("ran-1").await,
        vec![ConnectionStatus::Disconnected]
    );
    assert!(ctx.sender.sent().await.is_empty());
}

#[tokio::test]
async fn test_disconnected_ran_without_instances_is_not_rewritten() {
    let ctx = TestContext::new(&[]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Disconnected, None)
        .await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoInstanceAvailable);
    assert!(ctx.memory.ran_writes().await.is_empty());
}

#[tokio::test]
async fn test_failed_disconnected_write_still_reports_no_instance() {
    let ctx = TestContext::new(&[]).await;
    ctx.seed_ran("ran-1", ConnectionStatus::Connected, None)
        .await;
    ctx.memory.fail_always(
        "update_ran",
        StoreError::Internal {
            operation: "update_ran",
            details: "read-only database".to_string(),
        },
    );

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoInstanceAvailable);
    assert_eq!(ctx.memory.call_count("update_ran"), 1);
    assert_eq!(
        ctx.ran("ran-1").await.connection_status,
        ConnectionStatus::Connected
    );
    assert!(ctx.sender.sent().await.is_empty());
}

// ============================================================================
// Collaborator failures
// ============================================================================

#[tokio::test]
async fn test_dispatch_failure_keeps_association_and_connecting() {
    let ctx = TestContext::with_collaborators(
        &[E2T_1],
        MockRouteRegistrar::new(),
        MockMessageSender::failing(),
    )
    .await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    let ran = ctx.ran("ran-1").await;
    assert_eq!(ran.connection_status, ConnectionStatus::Connecting);
    assert_eq!(ran.associated_address(), Some(E2T_1));
    assert_eq!(ctx.instance_rans(E2T_1).await, vec!["ran-1"]);
}

#[tokio::test]
async fn test_route_failure_is_reported_and_binding_kept() {
    let ctx = TestContext::with_collaborators(
        &[E2T_1],
        MockRouteRegistrar::failing(),
        MockMessageSender::new(),
    )
    .await;

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RouteRegistrar);
    assert_eq!(ctx.ran("ran-1").await.associated_address(), Some(E2T_1));
    assert_eq!(ctx.instance_rans(E2T_1).await, vec!["ran-1"]);
    assert!(ctx.sender.sent().await.is_empty());
}

#[tokio::test]
async fn test_failed_association_write_leaves_one_binding_after_retry() {
    let ctx = TestContext::new(&[E2T_1, E2T_2]).await;
    ctx.memory.fail_next(
        "update_ran",
        StoreError::Internal {
            operation: "update_ran",
            details: "disk full".to_string(),
        },
    );

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(!ctx.ran("ran-1").await.is_associated());
    assert!(ctx.instance_rans(E2T_1).await.is_empty());
    assert!(ctx.instance_rans(E2T_2).await.is_empty());
    assert!(ctx.registrar.associations().await.is_empty());

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    let address = ctx
        .ran("ran-1")
        .await
        .associated_instance_address
        .expect("retry associates the RAN");
    for candidate in [E2T_1, E2T_2] {
        let rans = ctx.instance_rans(candidate).await;
        if candidate == address {
            assert_eq!(rans, vec!["ran-1"]);
        } else {
            assert!(rans.is_empty(), "{candidate} still lists ran-1");
        }
    }
    assert_eq!(ctx.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn test_transient_store_errors_are_absorbed_by_gateway() {
    let ctx = TestContext::new(&[E2T_1]).await;
    ctx.memory.fail_next(
        "get_ran",
        StoreError::Connection {
            operation: "get_ran",
            details: "connection reset".to_string(),
        },
    );

    ctx.manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap();

    assert_eq!(ctx.memory.call_count("get_ran"), 2);
    assert_eq!(ctx.ran("ran-1").await.associated_address(), Some(E2T_1));
}

#[tokio::test]
async fn test_persistent_store_failure_is_store_error() {
    let ctx = TestContext::new(&[E2T_1]).await;
    ctx.memory.fail_always(
        "get_ran",
        StoreError::Connection {
            operation: "get_ran",
            details: "connection refused".to_string(),
        },
    );

    let err = ctx
        .manager
        .setup
        .handle(x2_request("ran-1"), ProtocolKind::X2Setup)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert_eq!(ctx.memory.call_count("get_ran"), 3);
    assert!(ctx.memory.ran_writes().await.is_empty());
}

// ============================================================================
// Concurrency and selection properties
// ============================================================================

#[tokio::test]
async fn test_concurrent_setups_for_different_rans() {
    let ctx = TestContext::new(&[E2T_1, E2T_2]).await;

    let (first, second) = tokio::join!(
        ctx.manager
            .setup
            .handle(x2_request("ran-1"), ProtocolKind::X2Setup),
        ctx.manager
            .setup
            .handle(x2_request("ran-2"), ProtocolKind::X2Setup),
    );
    first.unwrap();
    second.unwrap();

    // No per-RAN locking: instance RAN sets are last-write-wins, so only the
    // RAN side of each binding is asserted.
    for name in ["ran-1", "ran-2"] {
        let ran = ctx.ran(name).await;
        assert_eq!(ran.connection_status, ConnectionStatus::Connecting);
        let address = ran.associated_address().unwrap();
        assert!(address == E2T_1 || address == E2T_2);
    }
    assert_eq!(ctx.sender.sent().await.len(), 2);
}

#[tokio::test]
async fn test_selection_stays_within_address_list() {
    let ctx = TestContext::new(&[E2T_1, E2T_2]).await;

    for i in 0..6 {
        let name = format!("ran-{i}");
        ctx.manager
            .setup
            .handle(x2_request(&name), ProtocolKind::X2Setup)
            .await
            .unwrap();
        let address = ctx.ran(&name).await.associated_address().map(str::to_string);
        assert!(matches!(address.as_deref(), Some(E2T_1) | Some(E2T_2)));
    }

    // Least-associations keeps the two instances balanced.
    assert_eq!(ctx.instance_rans(E2T_1).await.len(), 3);
    assert_eq!(ctx.instance_rans(E2T_2).await.len(), 3);
}
