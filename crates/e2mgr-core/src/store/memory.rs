// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-process store backend.
//!
//! Backs the `memory` database URL and the test suites. Supports failure
//! injection per operation. A store built with [`MemoryStore::with_history`]
//! also keeps every RAN write so tests can assert on intermediate statuses,
//! not only final ones.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RanStore, StoreError};
use crate::model::{ConnectionStatus, RanIdentity, RanRecord, TerminationInstance};

#[derive(Default)]
struct MemoryState {
    rans: HashMap<String, RanRecord>,
    identities: Vec<RanIdentity>,
    instances: HashMap<String, TerminationInstance>,
    addresses: Vec<String>,
    /// `None` unless history was requested.
    ran_writes: Option<Vec<RanRecord>>,
}

impl MemoryState {
    fn record_write(&mut self, ran: &RanRecord) {
        if let Some(writes) = self.ran_writes.as_mut() {
            writes.push(ran.clone());
        }
    }
}

#[derive(Default)]
struct Faults {
    once: HashMap<&'static str, VecDeque<StoreError>>,
    always: HashMap<&'static str, StoreError>,
    instance_saves: HashSet<String>,
    calls: HashMap<&'static str, usize>,
}

/// Store backend holding everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that records every RAN write, for [`Self::ran_writes`] and
    /// [`Self::status_history`].
    pub fn with_history() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                ran_writes: Some(Vec::new()),
                ..MemoryState::default()
            }),
            faults: Mutex::default(),
        }
    }

    /// Make the next call of `operation` fail with `error`. Queues up.
    pub fn fail_next(&self, operation: &'static str, error: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.once.entry(operation).or_default().push_back(error);
        }
    }

    /// Make every call of `operation` fail until [`Self::clear_faults`].
    pub fn fail_always(&self, operation: &'static str, error: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.always.insert(operation, error);
        }
    }

    /// Make `save_instance` fail for one address only.
    pub fn fail_instance_save(&self, address: &str) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.instance_saves.insert(address.to_string());
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.once.clear();
            faults.always.clear();
            faults.instance_saves.clear();
        }
    }

    /// How many times `operation` was invoked, failed calls included.
    pub fn call_count(&self, operation: &str) -> usize {
        self.faults
            .lock()
            .map(|faults| faults.calls.get(operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Provision a termination instance and append it to the address list.
    pub async fn insert_instance(&self, instance: TerminationInstance) {
        let mut state = self.state.write().await;
        if !state.addresses.contains(&instance.address) {
            state.addresses.push(instance.address.clone());
        }
        state.instances.insert(instance.address.clone(), instance);
    }

    /// Seed a RAN record and its identity without recording a write.
    pub async fn insert_ran(&self, ran: RanRecord) {
        let mut state = self.state.write().await;
        if !state.rans.contains_key(&ran.ran_name) {
            state.identities.push(RanIdentity::new(&ran.ran_name));
        }
        state.rans.insert(ran.ran_name.clone(), ran);
    }

    pub async fn ran(&self, ran_name: &str) -> Option<RanRecord> {
        self.state.read().await.rans.get(ran_name).cloned()
    }

    pub async fn instance(&self, address: &str) -> Option<TerminationInstance> {
        self.state.read().await.instances.get(address).cloned()
    }

    /// Every RAN record persisted through `save_ran` or `update_ran`, in order.
    /// Always empty without [`Self::with_history`].
    pub async fn ran_writes(&self) -> Vec<RanRecord> {
        self.state
            .read()
            .await
            .ran_writes
            .clone()
            .unwrap_or_default()
    }

    /// Statuses persisted for one RAN, in write order.
    pub async fn status_history(&self, ran_name: &str) -> Vec<ConnectionStatus> {
        self.state
            .read()
            .await
            .ran_writes
            .iter()
            .flatten()
            .filter(|ran| ran.ran_name == ran_name)
            .map(|ran| ran.connection_status)
            .collect()
    }

    fn enter(&self, operation: &'static str) -> Result<(), StoreError> {
        let Ok(mut faults) = self.faults.lock() else {
            return Err(StoreError::Internal {
                operation,
                details: "fault registry poisoned".to_string(),
            });
        };
        *faults.calls.entry(operation).or_default() += 1;
        if let Some(error) = faults.once.get_mut(operation).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        if let Some(error) = faults.always.get(operation) {
            return Err(error.clone());
        }
        Ok(())
    }

    fn instance_save_blocked(&self, address: &str) -> bool {
        self.faults
            .lock()
            .map(|faults| faults.instance_saves.contains(address))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RanStore for MemoryStore {
    async fn get_ran(&self, ran_name: &str) -> Result<RanRecord, StoreError> {
        self.enter("get_ran")?;
        self.state
            .read()
            .await
            .rans
            .get(ran_name)
            .cloned()
            .ok_or_else(|| StoreError::ran_not_found(ran_name))
    }

    async fn save_ran(&self, identity: &RanIdentity, ran: &RanRecord) -> Result<(), StoreError> {
        self.enter("save_ran")?;
        let mut state = self.state.write().await;
        if !state
            .identities
            .iter()
            .any(|known| known.inventory_name == identity.inventory_name)
        {
            state.identities.push(identity.clone());
        }
        state.rans.insert(ran.ran_name.clone(), ran.clone());
        state.record_write(ran);
        Ok(())
    }

    async fn update_ran(&self, ran: &RanRecord) -> Result<(), StoreError> {
        self.enter("update_ran")?;
        let mut state = self.state.write().await;
        state.rans.insert(ran.ran_name.clone(), ran.clone());
        state.record_write(ran);
        Ok(())
    }

    async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>, StoreError> {
        self.enter("list_ran_identities")?;
        Ok(self.state.read().await.identities.clone())
    }

    async fn get_instance(&self, address: &str) -> Result<TerminationInstance, StoreError> {
        self.enter("get_instance")?;
        self.state
            .read()
            .await
            .instances
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::instance_not_found(address))
    }

    async fn get_instances(
        &self,
        addresses: &[String],
    ) -> Result<Vec<TerminationInstance>, StoreError> {
        self.enter("get_instances")?;
        let state = self.state.read().await;
        Ok(addresses
            .iter()
            .filter_map(|address| state.instances.get(address).cloned())
            .collect())
    }

    async fn list_instance_addresses(&self) -> Result<Vec<String>, StoreError> {
        self.enter("list_instance_addresses")?;
        Ok(self.state.read().await.addresses.clone())
    }

    async fn save_instance(&self, instance: &TerminationInstance) -> Result<(), StoreError> {
        self.enter("save_instance")?;
        if self.instance_save_blocked(&instance.address) {
            return Err(StoreError::Internal {
                operation: "save_instance",
                details: format!("write rejected for {}", instance.address),
            });
        }
        self.state
            .write()
            .await
            .instances
            .insert(instance.address.clone(), instance.clone());
        Ok(())
    }

    async fn save_instance_addresses(&self, addresses: &[String]) -> Result<(), StoreError> {
        self.enter("save_instance_addresses")?;
        self.state.write().await.addresses = addresses.to_vec();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter("ping")
    }
}
