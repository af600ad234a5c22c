// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shutdown orchestrator: the big red button.
//!
//! ```text
//!  list instance addresses ── empty ──► every RAN → SHUT_DOWN ──► done
//!          │
//!          ▼
//!  routing manager: dissociate all      (failure only downgrades the result)
//!          │
//!          ▼
//!  every RAN not SHUT_DOWN → SHUTTING_DOWN
//!          │
//!          ▼
//!  clear every instance's RAN set        (failure aborts)
//!          │
//!          ▼
//!  broadcast RIC_SCTP_CLEAR_ALL          (failure aborts)
//!          │
//!          ▼
//!  nothing updated? ── yes ──► done
//!          │
//!          ▼
//!  sleep grace period, then SHUTTING_DOWN → SHUT_DOWN
//! ```
//!
//! The grace period is a real sleep inside the call. The caller gets the
//! outcome only after the final re-scan.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::bus::{BusMessage, MessageSender};
use crate::error::Result;
use crate::model::{ConnectionStatus, RanRecord};
use crate::pool::InstancePool;
use crate::routing::RouteRegistrar;
use crate::store::{RanStore, StoreError};

/// Message returned when everything but the routing manager call succeeded.
pub const PARTIAL_SUCCESS_MESSAGE: &str =
    "Operation succeeded except for routing manager outbound call";

/// Result of a shutdown that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Completed,
    /// Store and bus steps succeeded, the routing manager call did not.
    PartialSuccess { message: String },
}

impl ShutdownOutcome {
    fn from_dissociation(dissociation_failed: bool) -> Self {
        if dissociation_failed {
            Self::PartialSuccess {
                message: PARTIAL_SUCCESS_MESSAGE.to_string(),
            }
        } else {
            Self::Completed
        }
    }
}

/// Per-RAN status change applied during one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Empty pool: straight to SHUT_DOWN.
    Force,
    /// Everything not yet SHUT_DOWN becomes SHUTTING_DOWN.
    Begin,
    /// After the grace period: SHUTTING_DOWN becomes SHUT_DOWN.
    Finish,
}

impl Transition {
    /// Apply to `ran`, returning whether the record must be persisted.
    fn apply(self, ran: &mut RanRecord) -> bool {
        let target = match self {
            Self::Force => ConnectionStatus::ShutDown,
            Self::Begin if ran.connection_status == ConnectionStatus::ShutDown => return false,
            Self::Begin => ConnectionStatus::ShuttingDown,
            Self::Finish if ran.connection_status == ConnectionStatus::ShuttingDown => {
                ConnectionStatus::ShutDown
            }
            Self::Finish => {
                if ran.connection_status != ConnectionStatus::ShutDown {
                    warn!(
                        ran_name = %ran.ran_name,
                        status = %ran.connection_status,
                        "RAN left SHUTTING_DOWN during the grace period, leaving it untouched"
                    );
                }
                return false;
            }
        };

        ran.connection_status = target;
        ran.associated_instance_address = None;
        true
    }
}

pub struct ShutdownOrchestrator {
    store: Arc<dyn RanStore>,
    pool: Arc<InstancePool>,
    registrar: Arc<dyn RouteRegistrar>,
    sender: Arc<dyn MessageSender>,
    grace_period: Duration,
}

impl ShutdownOrchestrator {
    pub fn new(
        store: Arc<dyn RanStore>,
        pool: Arc<InstancePool>,
        registrar: Arc<dyn RouteRegistrar>,
        sender: Arc<dyn MessageSender>,
        grace_period: Duration,
    ) -> Self {
        Self {
            store,
            pool,
            registrar,
            sender,
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Shut down every RAN and every termination instance association.
    ///
    /// Store and bus failures abort with no rollback. A routing manager
    /// failure is logged and turns the result into
    /// [`ShutdownOutcome::PartialSuccess`].
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<ShutdownOutcome> {
        info!("Shutdown requested");

        let addresses = self.pool.list_addresses().await?;
        if addresses.is_empty() {
            info!("No termination instances, forcing every RAN to SHUT_DOWN");
            self.update_all(Transition::Force).await?;
            return Ok(ShutdownOutcome::Completed);
        }

        let dissociation_failed = match self.registrar.dissociate_all(&addresses).await {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, "Routing manager dissociation failed, continuing shutdown");
                true
            }
        };

        let updated_at_least_once = self.update_all(Transition::Begin).await?;

        self.pool
            .clear_all_associations()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to clear instance associations"))?;

        self.sender
            .send(BusMessage::clear_all())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to broadcast clear-all"))?;

        if !updated_at_least_once {
            info!("No RAN was updated, skipping the grace period");
            return Ok(ShutdownOutcome::from_dissociation(dissociation_failed));
        }

        info!(grace_period_secs = self.grace_period.as_secs_f64(), "Waiting for RANs to disconnect");
        tokio::time::sleep(self.grace_period).await;

        self.update_all(Transition::Finish).await?;
        info!(dissociation_failed, "Shutdown completed");
        Ok(ShutdownOutcome::from_dissociation(dissociation_failed))
    }

    /// Apply `transition` to every known RAN. Returns whether any record changed.
    async fn update_all(&self, transition: Transition) -> Result<bool> {
        let identities = self.store.list_ran_identities().await?;
        let mut updated = false;

        for identity in identities {
            let mut ran = match self.store.get_ran(&identity.inventory_name).await {
                Ok(ran) => ran,
                Err(StoreError::NotFound { .. }) => {
                    warn!(ran_name = %identity.inventory_name, "Identity without RAN record, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if !transition.apply(&mut ran) {
                continue;
            }
            self.store.update_ran(&ran).await?;
            updated = true;
        }

        info!(?transition, updated, "RAN statuses updated");
        Ok(updated)
    }
}
