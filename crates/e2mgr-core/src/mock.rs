// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock collaborators for testing.
//!
//! Both mocks record every call and can be switched to fail, so tests can
//! assert on what was sent and drive the partial-failure paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::bus::{BusMessage, MessageSender, MessageType};
use crate::error::{E2MgrError, Result};
use crate::routing::RouteRegistrar;

/// Route registrar that records calls instead of talking to a routing manager.
#[derive(Default)]
pub struct MockRouteRegistrar {
    associations: Mutex<Vec<(String, String)>>,
    dissociations: Mutex<Vec<Vec<String>>>,
    fail_associate: AtomicBool,
    fail_dissociate: AtomicBool,
}

impl MockRouteRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails.
    pub fn failing() -> Self {
        let registrar = Self::default();
        registrar.fail_associate.store(true, Ordering::SeqCst);
        registrar.fail_dissociate.store(true, Ordering::SeqCst);
        registrar
    }

    /// Only `dissociate_all` fails.
    pub fn failing_dissociation() -> Self {
        let registrar = Self::default();
        registrar.fail_dissociate.store(true, Ordering::SeqCst);
        registrar
    }

    /// `(address, ran_name)` of every association request, failed ones included.
    pub async fn associations(&self) -> Vec<(String, String)> {
        self.associations.lock().await.clone()
    }

    /// Address lists of every dissociation request, failed ones included.
    pub async fn dissociations(&self) -> Vec<Vec<String>> {
        self.dissociations.lock().await.clone()
    }
}

#[async_trait]
impl RouteRegistrar for MockRouteRegistrar {
    async fn associate(&self, e2t_address: &str, ran_name: &str) -> Result<()> {
        self.associations
            .lock()
            .await
            .push((e2t_address.to_string(), ran_name.to_string()));
        if self.fail_associate.load(Ordering::SeqCst) {
            return Err(E2MgrError::RouteRegistrar {
                operation: "associate".to_string(),
                details: "mock routing manager unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn dissociate_all(&self, e2t_addresses: &[String]) -> Result<()> {
        self.dissociations.lock().await.push(e2t_addresses.to_vec());
        if self.fail_dissociate.load(Ordering::SeqCst) {
            return Err(E2MgrError::RouteRegistrar {
                operation: "dissociate_all".to_string(),
                details: "mock routing manager unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Message sender that keeps sent messages in memory.
#[derive(Default)]
pub struct MockMessageSender {
    sent: Mutex<Vec<BusMessage>>,
    fail: AtomicBool,
}

impl MockMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails; nothing is recorded.
    pub fn failing() -> Self {
        let sender = Self::default();
        sender.set_failing(true);
        sender
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<BusMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_of_type(&self, msg_type: MessageType) -> Vec<BusMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|message| message.msg_type == msg_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessageSender for MockMessageSender {
    async fn send(&self, message: BusMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(E2MgrError::Transport {
                msg_type: message.msg_type.name().to_string(),
                ran_name: message.ran_name,
                reason: "mock bus unavailable".to_string(),
            });
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}
