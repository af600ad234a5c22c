// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Records owned by the store: RAN nodes and termination instances.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection lifecycle status of a RAN node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Known, but not served by any termination instance.
    Disconnected,
    /// Setup request dispatched, response pending.
    Connecting,
    /// Setup completed.
    Connected,
    /// Marked by the big red button, waiting for the grace period.
    ShuttingDown,
    /// Terminal status after a global shutdown.
    ShutDown,
}

impl ConnectionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::ShutDown => "SHUT_DOWN",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Setup dialect of a RAN, fixed when the record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolKind {
    /// Plain X2 setup (eNB).
    X2Setup,
    /// EN-DC X2 setup (gNB attached to an eNB).
    EndcX2Setup,
}

impl ProtocolKind {
    /// Activity name used when a setup request is rejected.
    pub fn activity(&self) -> &'static str {
        match self {
            Self::X2Setup => "X2_SETUP",
            Self::EndcX2Setup => "ENDC_SETUP",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.activity())
    }
}

/// One managed RAN node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RanRecord {
    /// Unique, stable name; primary key.
    pub ran_name: String,
    pub connection_status: ConnectionStatus,
    /// Address of the serving termination instance, `None` when unassigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_instance_address: Option<String>,
    pub protocol: ProtocolKind,
    pub ip: String,
    pub port: u16,
}

impl RanRecord {
    /// A freshly seen RAN: `CONNECTING`, no association.
    pub fn new_connecting(
        ran_name: impl Into<String>,
        ip: impl Into<String>,
        port: u16,
        protocol: ProtocolKind,
    ) -> Self {
        Self {
            ran_name: ran_name.into(),
            connection_status: ConnectionStatus::Connecting,
            associated_instance_address: None,
            protocol,
            ip: ip.into(),
            port,
        }
    }

    /// The serving instance, treating an empty string as unassigned.
    pub fn associated_address(&self) -> Option<&str> {
        self.associated_instance_address
            .as_deref()
            .filter(|address| !address.is_empty())
    }

    pub fn is_associated(&self) -> bool {
        self.associated_address().is_some()
    }
}

/// Index entry for a RAN, used to enumerate every known node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RanIdentity {
    pub inventory_name: String,
}

impl RanIdentity {
    pub fn new(inventory_name: impl Into<String>) -> Self {
        Self {
            inventory_name: inventory_name.into(),
        }
    }
}

/// One replica of the termination service.
///
/// `keep_alive_timestamp` and `state` belong to the keep-alive subsystem. This
/// crate carries them through reads and writes untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationInstance {
    /// `host:port`, primary key.
    pub address: String,
    /// Names of the RANs served by this instance. Kept duplicate-free.
    #[serde(default)]
    pub associated_rans: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: String,
}

impl TerminationInstance {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            associated_rans: Vec::new(),
            keep_alive_timestamp: None,
            state: String::new(),
        }
    }

    pub fn associated_count(&self) -> usize {
        self.associated_rans.len()
    }

    pub fn serves(&self, ran_name: &str) -> bool {
        self.associated_rans.iter().any(|name| name == ran_name)
    }

    /// Adds names not already present. Returns whether anything changed.
    pub fn add_rans(&mut self, ran_names: &[String]) -> bool {
        let before = self.associated_rans.len();
        for name in ran_names {
            if !self.serves(name) {
                self.associated_rans.push(name.clone());
            }
        }
        self.associated_rans.len() != before
    }

    /// Removes `ran_name` if present. Returns whether anything changed.
    pub fn remove_ran(&mut self, ran_name: &str) -> bool {
        let before = self.associated_rans.len();
        self.associated_rans.retain(|name| name != ran_name);
        self.associated_rans.len() != before
    }
}
