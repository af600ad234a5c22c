// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Read-only views over RANs and the instance pool.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{RanIdentity, RanRecord, TerminationInstance};
use crate::pool::InstancePool;
use crate::store::RanStore;

pub struct RanQueries {
    store: Arc<dyn RanStore>,
    pool: Arc<InstancePool>,
}

impl RanQueries {
    pub fn new(store: Arc<dyn RanStore>, pool: Arc<InstancePool>) -> Self {
        Self { store, pool }
    }

    pub async fn get_ran(&self, ran_name: &str) -> Result<RanRecord> {
        Ok(self.store.get_ran(ran_name).await?)
    }

    pub async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>> {
        Ok(self.store.list_ran_identities().await?)
    }

    /// Every instance on the global address list, in list order.
    pub async fn list_instances(&self) -> Result<Vec<TerminationInstance>> {
        let addresses = self.pool.list_addresses().await?;
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        self.pool.list_instances(&addresses).await
    }

    /// Store reachability.
    pub async fn health(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}
