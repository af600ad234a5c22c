// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Termination instance pool.
//!
//! The pool holds no state of its own. Every call reads the global address
//! list and the instance records from the store, so instances provisioned or
//! removed by other processes are seen on the next call.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{E2MgrError, Result};
use crate::model::TerminationInstance;
use crate::store::RanStore;

/// Picks the instance that serves the next RAN.
pub trait SelectionPolicy: Send + Sync {
    /// `candidates` are in global address-list order and never empty.
    fn select<'a>(
        &self,
        candidates: &'a [TerminationInstance],
    ) -> Option<&'a TerminationInstance>;
}

/// Fewest associated RANs wins; ties go to the earliest address in the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastAssociations;

impl SelectionPolicy for LeastAssociations {
    fn select<'a>(
        &self,
        candidates: &'a [TerminationInstance],
    ) -> Option<&'a TerminationInstance> {
        // min_by_key keeps the first of equal minima.
        candidates
            .iter()
            .min_by_key(|instance| instance.associated_count())
    }
}

/// Pool manager over the instance records in the store.
pub struct InstancePool {
    store: Arc<dyn RanStore>,
    policy: Arc<dyn SelectionPolicy>,
}

impl InstancePool {
    pub fn new(store: Arc<dyn RanStore>) -> Self {
        Self::with_policy(store, Arc::new(LeastAssociations))
    }

    pub fn with_policy(store: Arc<dyn RanStore>, policy: Arc<dyn SelectionPolicy>) -> Self {
        Self { store, policy }
    }

    /// The global address list.
    pub async fn list_addresses(&self) -> Result<Vec<String>> {
        Ok(self.store.list_instance_addresses().await?)
    }

    /// Records for `addresses` that exist, in the order given.
    pub async fn list_instances(&self, addresses: &[String]) -> Result<Vec<TerminationInstance>> {
        let mut instances = self.store.get_instances(addresses).await?;
        sort_by_address_order(&mut instances, addresses);
        Ok(instances)
    }

    /// Choose an instance for a RAN that needs (re-)association.
    ///
    /// Only addresses on the global list whose record can be loaded are
    /// candidates.
    pub async fn select_instance(&self) -> Result<String> {
        let addresses = self.list_addresses().await.inspect_err(|e| {
            error!(error = %e, "Failed to read the instance address list");
        })?;
        if addresses.is_empty() {
            warn!("Instance selection failed: pool is empty");
            return Err(E2MgrError::no_instance("the termination instance pool is empty"));
        }

        let candidates = self.list_instances(&addresses).await?;
        let Some(selected) = self.policy.select(&candidates) else {
            warn!(
                listed = addresses.len(),
                "Instance selection failed: no listed instance record could be loaded"
            );
            return Err(E2MgrError::no_instance(
                "no listed termination instance record could be loaded",
            ));
        };

        info!(
            e2t_address = %selected.address,
            associated_rans = selected.associated_count(),
            "Selected termination instance"
        );
        Ok(selected.address.clone())
    }

    /// Add RAN names to the instance at `address`. Names already present are
    /// skipped.
    pub async fn add_rans(&self, address: &str, ran_names: &[String]) -> Result<()> {
        let mut instance = self.store.get_instance(address).await?;
        if !instance.add_rans(ran_names) {
            debug!(e2t_address = %address, ?ran_names, "RANs already associated");
            return Ok(());
        }

        self.store.save_instance(&instance).await.inspect_err(|e| {
            error!(e2t_address = %address, error = %e, "Failed to save instance");
        })?;
        info!(e2t_address = %address, ?ran_names, "Added RANs to instance");
        Ok(())
    }

    /// Remove `ran_name` from the instance at `address`. Absent names are a no-op.
    pub async fn remove_ran(&self, ran_name: &str, address: &str) -> Result<()> {
        let mut instance = self.store.get_instance(address).await?;
        if !instance.remove_ran(ran_name) {
            debug!(e2t_address = %address, ran_name, "RAN not associated, nothing to remove");
            return Ok(());
        }

        self.store.save_instance(&instance).await?;
        info!(e2t_address = %address, ran_name, "Removed RAN from instance");
        Ok(())
    }

    /// Empty the RAN set of every known instance.
    ///
    /// Every instance is attempted. If any save fails, the returned error
    /// names the instances that were not cleared.
    pub async fn clear_all_associations(&self) -> Result<()> {
        let addresses = self.list_addresses().await?;
        if addresses.is_empty() {
            return Ok(());
        }

        let instances = self.list_instances(&addresses).await?;
        let mut failed = Vec::new();
        for mut instance in instances {
            instance.associated_rans.clear();
            if let Err(e) = self.store.save_instance(&instance).await {
                error!(e2t_address = %instance.address, error = %e, "Failed to clear instance associations");
                failed.push(instance.address);
            }
        }

        if failed.is_empty() {
            info!(instances = addresses.len(), "Cleared associations of all instances");
            return Ok(());
        }

        Err(E2MgrError::Store {
            operation: "clear_all_associations".to_string(),
            details: format!(
                "{} of {} instances not cleared: {}",
                failed.len(),
                addresses.len(),
                failed.join(", ")
            ),
        })
    }
}

fn sort_by_address_order(instances: &mut [TerminationInstance], addresses: &[String]) {
    instances.sort_by_key(|instance| {
        addresses
            .iter()
            .position(|address| *address == instance.address)
            .unwrap_or(usize::MAX)
    });
}
