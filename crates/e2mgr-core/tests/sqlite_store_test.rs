// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Setup and shutdown over a file-backed SQLite store.

use std::sync::Arc;
use std::time::Duration;

use e2mgr_core::bus::MessageType;
use e2mgr_core::mock::{MockMessageSender, MockRouteRegistrar};
use e2mgr_core::setup_message::SetupPdus;
use e2mgr_core::store::{RanStore, RetryPolicy, RetryingStore, SqliteStore};
use e2mgr_core::{
    ConnectionStatus, E2Manager, ProtocolKind, SetupRequest, ShutdownOutcome, TerminationInstance,
};

const E2T: &str = "10.0.0.1:9999";

async fn open(path: &std::path::Path) -> SqliteStore {
    let url = format!("sqlite:{}", path.display());
    SqliteStore::connect(&url).await.unwrap()
}

#[tokio::test]
async fn test_lifecycle_persists_across_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("e2mgr.db");

    let backend = open(&path).await;
    backend
        .save_instance(&TerminationInstance::new(E2T))
        .await
        .unwrap();
    backend
        .save_instance_addresses(&[E2T.to_string()])
        .await
        .unwrap();

    let store: Arc<dyn RanStore> = Arc::new(RetryingStore::new(backend, RetryPolicy::default()));
    let sender = Arc::new(MockMessageSender::new());
    let manager = E2Manager::new(
        store,
        Arc::new(MockRouteRegistrar::new()),
        sender.clone(),
        SetupPdus::default(),
        Duration::from_millis(10),
    );

    manager
        .setup
        .handle(
            SetupRequest::new("10.0.0.5", 36422, "ran-1"),
            ProtocolKind::X2Setup,
        )
        .await
        .unwrap();

    // A fresh pool on the same file sees the association.
    let reopened = open(&path).await;
    let ran = reopened.get_ran("ran-1").await.unwrap();
    assert_eq!(ran.connection_status, ConnectionStatus::Connecting);
    assert_eq!(ran.associated_address(), Some(E2T));
    assert_eq!(
        reopened.get_instance(E2T).await.unwrap().associated_rans,
        vec!["ran-1"]
    );

    let outcome = manager.shutdown.shutdown().await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::Completed);

    let ran = reopened.get_ran("ran-1").await.unwrap();
    assert_eq!(ran.connection_status, ConnectionStatus::ShutDown);
    assert!(!ran.is_associated());
    assert!(
        reopened
            .get_instance(E2T)
            .await
            .unwrap()
            .associated_rans
            .is_empty()
    );
    assert_eq!(
        sender.sent_of_type(MessageType::SctpClearAll).await.len(),
        1
    );
}
