// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Setup handler: entry point of the per-RAN connection state machine.
//!
//! ```text
//!   absent ──────────────► CONNECTING   select, create, associate, dispatch
//!   SHUTTING_DOWN ───────► (rejected)   WrongState, record untouched
//!   associated ──────────► CONNECTED | CONNECTING
//!                                       persist status, re-dispatch
//!   not associated ──┬───► CONNECTING   select, associate, dispatch
//!                    └───► DISCONNECTED selection failed
//! ```
//!
//! No lock is taken per RAN name. Two concurrent requests for the same RAN
//! race on the store and the last write wins.

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::association::AssociationManager;
use crate::bus::MessageSender;
use crate::error::{E2MgrError, Result};
use crate::model::{ConnectionStatus, ProtocolKind, RanIdentity, RanRecord};
use crate::pool::InstancePool;
use crate::setup_message::{SetupPdus, SetupRequestMessage};
use crate::store::{RanStore, StoreError};

/// Inbound setup request for one RAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub ran_ip: String,
    pub ran_port: u16,
    pub ran_name: String,
}

impl SetupRequest {
    pub fn new(ran_ip: impl Into<String>, ran_port: u16, ran_name: impl Into<String>) -> Self {
        Self {
            ran_ip: ran_ip.into(),
            ran_port,
            ran_name: ran_name.into(),
        }
    }

    /// Reject zero ports, empty names and anything that is not an IP address.
    pub fn validate(&self) -> Result<()> {
        if self.ran_port == 0 {
            return Err(E2MgrError::validation("ranPort", "port must be non-zero"));
        }
        if self.ran_ip.trim().is_empty() {
            return Err(E2MgrError::validation("ranIp", "IP address is required"));
        }
        if self.ran_ip.parse::<IpAddr>().is_err() {
            return Err(E2MgrError::validation(
                "ranIp",
                format!("'{}' is not a valid IP address", self.ran_ip),
            ));
        }
        if self.ran_name.trim().is_empty() {
            return Err(E2MgrError::validation("ranName", "RAN name is required"));
        }
        Ok(())
    }
}

pub struct SetupRequestHandler {
    store: Arc<dyn RanStore>,
    pool: Arc<InstancePool>,
    association: Arc<AssociationManager>,
    sender: Arc<dyn MessageSender>,
    pdus: Arc<SetupPdus>,
}

impl SetupRequestHandler {
    pub fn new(
        store: Arc<dyn RanStore>,
        pool: Arc<InstancePool>,
        association: Arc<AssociationManager>,
        sender: Arc<dyn MessageSender>,
        pdus: Arc<SetupPdus>,
    ) -> Self {
        Self {
            store,
            pool,
            association,
            sender,
            pdus,
        }
    }

    /// Handle one setup request.
    #[instrument(skip(self, request, protocol), fields(ran_name = %request.ran_name, protocol = %protocol))]
    pub async fn handle(&self, request: SetupRequest, protocol: ProtocolKind) -> Result<()> {
        request.validate().inspect_err(|e| {
            warn!(error = %e, "Rejecting setup request");
        })?;

        match self.store.get_ran(&request.ran_name).await {
            Ok(ran) => self.connect_existing(ran, protocol).await,
            Err(StoreError::NotFound { .. }) => self.connect_new(&request, protocol).await,
            Err(e) => {
                error!(error = %e, "Failed to read RAN record");
                Err(e.into())
            }
        }
    }

    async fn connect_new(&self, request: &SetupRequest, protocol: ProtocolKind) -> Result<()> {
        info!("New RAN, selecting a termination instance");

        // Selection comes first so a failure leaves nothing behind.
        let address = self.pool.select_instance().await?;

        let mut ran = RanRecord::new_connecting(
            &request.ran_name,
            &request.ran_ip,
            request.ran_port,
            protocol,
        );
        self.store
            .save_ran(&RanIdentity::new(&ran.ran_name), &ran)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create RAN record"))?;

        self.association.associate(&address, &mut ran).await?;
        self.dispatch(&ran).await
    }

    async fn connect_existing(&self, mut ran: RanRecord, protocol: ProtocolKind) -> Result<()> {
        if ran.connection_status == ConnectionStatus::ShuttingDown {
            warn!(status = %ran.connection_status, "RAN is shutting down, rejecting setup");
            return Err(E2MgrError::WrongState {
                ran_name: ran.ran_name,
                activity: protocol.activity().to_string(),
                status: ConnectionStatus::ShuttingDown,
            });
        }

        if let Some(address) = ran.associated_address() {
            info!(e2t_address = %address, status = %ran.connection_status, "RAN already associated, re-sending setup");
            if ran.connection_status != ConnectionStatus::Connected {
                ran.connection_status = ConnectionStatus::Connecting;
            }
            self.store
                .update_ran(&ran)
                .await
                .inspect_err(|e| error!(error = %e, "Failed to persist RAN status"))?;
            return self.dispatch(&ran).await;
        }

        info!(status = %ran.connection_status, "RAN not associated, selecting a termination instance");
        let address = match self.pool.select_instance().await {
            Ok(address) => address,
            Err(e) => {
                self.mark_disconnected(&mut ran).await;
                return Err(e);
            }
        };

        ran.connection_status = ConnectionStatus::Connecting;
        self.association.associate(&address, &mut ran).await?;
        self.dispatch(&ran).await
    }

    /// Best effort: the selection error is what the caller gets.
    async fn mark_disconnected(&self, ran: &mut RanRecord) {
        if ran.connection_status == ConnectionStatus::Disconnected {
            return;
        }
        ran.connection_status = ConnectionStatus::Disconnected;
        if let Err(e) = self.store.update_ran(ran).await {
            error!(error = %e, "Failed to mark RAN as DISCONNECTED");
        }
    }

    async fn dispatch(&self, ran: &RanRecord) -> Result<()> {
        let message = SetupRequestMessage::for_ran(ran, &self.pdus).into_bus_message();
        let msg_type = message.msg_type.name();

        match self.sender.send(message).await {
            Ok(()) => {
                info!(msg_type, "Setup request sent");
                Ok(())
            }
            Err(e) => {
                error!(msg_type, error = %e, "Failed to send setup request");
                Err(e)
            }
        }
    }
}
