// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for e2mgr-core scenario tests.
//!
//! Provides TestContext: the full component graph over an in-memory store and
//! recording collaborators.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use e2mgr_core::mock::{MockMessageSender, MockRouteRegistrar};
use e2mgr_core::setup_message::SetupPdus;
use e2mgr_core::store::{MemoryStore, RanStore, RetryPolicy, RetryingStore};
use e2mgr_core::{
    ConnectionStatus, E2Manager, ProtocolKind, RanRecord, SetupRequest, TerminationInstance,
};

pub const E2T_1: &str = "10.0.0.1:9999";
pub const E2T_2: &str = "10.0.0.2:9999";
pub const GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Test context wiring the core components to recording fakes.
pub struct TestContext {
    pub memory: Arc<MemoryStore>,
    pub registrar: Arc<MockRouteRegistrar>,
    pub sender: Arc<MockMessageSender>,
    pub manager: E2Manager,
}

impl TestContext {
    /// Pool containing `instances` (empty RAN sets), collaborators succeeding.
    pub async fn new(instances: &[&str]) -> Self {
        Self::with_collaborators(
            instances,
            MockRouteRegistrar::new(),
            MockMessageSender::new(),
        )
        .await
    }

    pub async fn with_collaborators(
        instances: &[&str],
        registrar: MockRouteRegistrar,
        sender: MockMessageSender,
    ) -> Self {
        let memory = Arc::new(MemoryStore::with_history());
        for address in instances {
            memory
                .insert_instance(TerminationInstance::new(*address))
                .await;
        }

        let store: Arc<dyn RanStore> = Arc::new(RetryingStore::new(
            memory.clone(),
            RetryPolicy {
                max_attempts: 3,
                retry_interval: Duration::from_millis(10),
            },
        ));
        let registrar = Arc::new(registrar);
        let sender = Arc::new(sender);
        let manager = E2Manager::new(
            store,
            registrar.clone(),
            sender.clone(),
            SetupPdus::new(vec![0x00, 0x06], vec![0x00, 0x24]),
            GRACE_PERIOD,
        );

        Self {
            memory,
            registrar,
            sender,
            manager,
        }
    }

    /// Seed a RAN and, when associated, add it to that instance's RAN set.
    pub async fn seed_ran(&self, name: &str, status: ConnectionStatus, address: Option<&str>) {
        let mut ran = RanRecord::new_connecting(name, "10.0.0.5", 36422, ProtocolKind::X2Setup);
        ran.connection_status = status;
        ran.associated_instance_address = address.map(str::to_string);
        self.memory.insert_ran(ran).await;

        if let Some(address) = address {
            let mut instance = self
                .memory
                .instance(address)
                .await
                .unwrap_or_else(|| TerminationInstance::new(address));
            instance.add_rans(&[name.to_string()]);
            self.memory.insert_instance(instance).await;
        }
    }

    pub async fn ran(&self, name: &str) -> RanRecord {
        self.memory
            .ran(name)
            .await
            .unwrap_or_else(|| panic!("RAN {name} not persisted"))
    }

    pub async fn instance_rans(&self, address: &str) -> Vec<String> {
        self.memory
            .instance(address)
            .await
            .unwrap_or_else(|| panic!("instance {address} missing"))
            .associated_rans
    }
}

pub fn x2_request(name: &str) -> SetupRequest {
    SetupRequest::new("10.0.0.5", 36422, name)
}
