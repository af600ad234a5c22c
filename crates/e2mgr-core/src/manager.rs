// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wiring of the core components over shared collaborators.

use std::sync::Arc;
use std::time::Duration;

use crate::association::AssociationManager;
use crate::bus::MessageSender;
use crate::pool::{InstancePool, SelectionPolicy};
use crate::queries::RanQueries;
use crate::routing::RouteRegistrar;
use crate::setup::SetupRequestHandler;
use crate::setup_message::SetupPdus;
use crate::shutdown::ShutdownOrchestrator;
use crate::store::RanStore;

/// The operations exposed to the API layer.
pub struct E2Manager {
    pub setup: SetupRequestHandler,
    pub shutdown: ShutdownOrchestrator,
    pub queries: RanQueries,
}

impl E2Manager {
    /// Build every component on one store, registrar and sender.
    ///
    /// `store` should already be the retrying gateway.
    pub fn new(
        store: Arc<dyn RanStore>,
        registrar: Arc<dyn RouteRegistrar>,
        sender: Arc<dyn MessageSender>,
        pdus: SetupPdus,
        shutdown_grace_period: Duration,
    ) -> Self {
        let pool = Arc::new(InstancePool::new(store.clone()));
        Self::with_pool(store, pool, registrar, sender, pdus, shutdown_grace_period)
    }

    /// Like [`Self::new`] with a custom instance selection policy.
    pub fn with_policy(
        store: Arc<dyn RanStore>,
        policy: Arc<dyn SelectionPolicy>,
        registrar: Arc<dyn RouteRegistrar>,
        sender: Arc<dyn MessageSender>,
        pdus: SetupPdus,
        shutdown_grace_period: Duration,
    ) -> Self {
        let pool = Arc::new(InstancePool::with_policy(store.clone(), policy));
        Self::with_pool(store, pool, registrar, sender, pdus, shutdown_grace_period)
    }

    fn with_pool(
        store: Arc<dyn RanStore>,
        pool: Arc<InstancePool>,
        registrar: Arc<dyn RouteRegistrar>,
        sender: Arc<dyn MessageSender>,
        pdus: SetupPdus,
        shutdown_grace_period: Duration,
    ) -> Self {
        let association = Arc::new(AssociationManager::new(
            store.clone(),
            pool.clone(),
            registrar.clone(),
        ));

        Self {
            setup: SetupRequestHandler::new(
                store.clone(),
                pool.clone(),
                association,
                sender.clone(),
                Arc::new(pdus),
            ),
            shutdown: ShutdownOrchestrator::new(
                store.clone(),
                pool.clone(),
                registrar,
                sender,
                shutdown_grace_period,
            ),
            queries: RanQueries::new(store, pool),
        }
    }
}
