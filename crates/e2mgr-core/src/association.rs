// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Binding of a RAN to a termination instance.
//!
//! [`AssociationManager::associate`] is the only place that writes a RAN's
//! associated instance address. The store writes and the route registration
//! are not transactional: a failed registration leaves the binding in place
//! and is reported to the caller.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::model::RanRecord;
use crate::pool::InstancePool;
use crate::routing::RouteRegistrar;
use crate::store::RanStore;

pub struct AssociationManager {
    store: Arc<dyn RanStore>,
    pool: Arc<InstancePool>,
    registrar: Arc<dyn RouteRegistrar>,
}

impl AssociationManager {
    pub fn new(
        store: Arc<dyn RanStore>,
        pool: Arc<InstancePool>,
        registrar: Arc<dyn RouteRegistrar>,
    ) -> Self {
        Self {
            store,
            pool,
            registrar,
        }
    }

    /// Bind `ran` to the instance at `e2t_address`.
    ///
    /// Steps, in order: add the RAN to the instance's RAN set, persist the
    /// RAN record with the new address (and whatever status the caller set),
    /// register the route. A store failure stops before the route call, and a
    /// failed record write takes the RAN back out of the instance's set.
    pub async fn associate(&self, e2t_address: &str, ran: &mut RanRecord) -> Result<()> {
        info!(ran_name = %ran.ran_name, e2t_address, "Associating RAN");

        self.pool
            .add_rans(e2t_address, std::slice::from_ref(&ran.ran_name))
            .await
            .inspect_err(|e| {
                error!(ran_name = %ran.ran_name, e2t_address, error = %e, "Failed to add RAN to instance");
            })?;

        let previous = ran.associated_instance_address.replace(e2t_address.to_string());
        if let Err(e) = self.store.update_ran(ran).await {
            error!(ran_name = %ran.ran_name, e2t_address, error = %e, "Failed to persist RAN association");
            ran.associated_instance_address = previous;
            self.unlist(e2t_address, &ran.ran_name).await;
            return Err(e.into());
        }

        if let Err(e) = self.registrar.associate(e2t_address, &ran.ran_name).await {
            warn!(
                ran_name = %ran.ran_name,
                e2t_address,
                error = %e,
                "Route registration failed, association kept"
            );
            return Err(e);
        }

        info!(ran_name = %ran.ran_name, e2t_address, "RAN associated");
        Ok(())
    }

    /// Best effort: the instance must not list a RAN whose record does not
    /// point back at it.
    async fn unlist(&self, e2t_address: &str, ran_name: &str) {
        if let Err(e) = self.pool.remove_ran(ran_name, e2t_address).await {
            error!(ran_name, e2t_address, error = %e, "Failed to remove RAN from instance");
        }
    }
}
