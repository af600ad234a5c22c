// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Store gateway and backends.
//!
//! [`RanStore`] is the typed read/write surface for RAN and termination
//! instance records. The components of this crate consume it wrapped in a
//! [`RetryingStore`], which retries connection failures and nothing else.

pub mod memory;
pub mod retry;
pub mod sqlite;

pub use self::memory::MemoryStore;
pub use self::retry::{RetryPolicy, RetryingStore};
pub use self::sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{RanIdentity, RanRecord, TerminationInstance};

/// Resource name used in not-found errors for RAN records.
pub const RAN_RESOURCE: &str = "RAN";
/// Resource name used in not-found errors for termination instances.
pub const INSTANCE_RESOURCE: &str = "E2T instance";

/// Errors reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record under the given key.
    #[error("{resource} '{key}' not found")]
    NotFound {
        /// Record type.
        resource: &'static str,
        /// Primary key that was looked up.
        key: String,
    },
    /// The backend could not be reached. Retried by [`RetryingStore`].
    #[error("connection failure in {operation}: {details}")]
    Connection {
        /// The operation that failed.
        operation: &'static str,
        /// Error details.
        details: String,
    },
    /// Any other backend failure (bad data, constraint, serialization).
    #[error("internal failure in {operation}: {details}")]
    Internal {
        /// The operation that failed.
        operation: &'static str,
        /// Error details.
        details: String,
    },
}

impl StoreError {
    pub fn ran_not_found(ran_name: &str) -> Self {
        Self::NotFound {
            resource: RAN_RESOURCE,
            key: ran_name.to_string(),
        }
    }

    pub fn instance_not_found(address: &str) -> Self {
        Self::NotFound {
            resource: INSTANCE_RESOURCE,
            key: address.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Typed access to RAN and termination instance records.
#[async_trait]
pub trait RanStore: Send + Sync {
    /// Load a RAN record. Absence is [`StoreError::NotFound`].
    async fn get_ran(&self, ran_name: &str) -> Result<RanRecord, StoreError>;

    /// Create a RAN record together with its identity index entry.
    async fn save_ran(&self, identity: &RanIdentity, ran: &RanRecord) -> Result<(), StoreError>;

    /// Overwrite a RAN record by name.
    async fn update_ran(&self, ran: &RanRecord) -> Result<(), StoreError>;

    /// Every known RAN identity.
    async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>, StoreError>;

    /// Load one termination instance. Absence is [`StoreError::NotFound`].
    async fn get_instance(&self, address: &str) -> Result<TerminationInstance, StoreError>;

    /// Load the instances that exist among `addresses`; missing ones are skipped.
    async fn get_instances(
        &self,
        addresses: &[String],
    ) -> Result<Vec<TerminationInstance>, StoreError>;

    /// The global instance address list. Empty when nothing is provisioned.
    async fn list_instance_addresses(&self) -> Result<Vec<String>, StoreError>;

    async fn save_instance(&self, instance: &TerminationInstance) -> Result<(), StoreError>;

    async fn save_instance_addresses(&self, addresses: &[String]) -> Result<(), StoreError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RanStore + ?Sized> RanStore for Arc<T> {
    async fn get_ran(&self, ran_name: &str) -> Result<RanRecord, StoreError> {
        (**self).get_ran(ran_name).await
    }

    async fn save_ran(&self, identity: &RanIdentity, ran: &RanRecord) -> Result<(), StoreError> {
        (**self).save_ran(identity, ran).await
    }

    async fn update_ran(&self, ran: &RanRecord) -> Result<(), StoreError> {
        (**self).update_ran(ran).await
    }

    async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>, StoreError> {
        (**self).list_ran_identities().await
    }

    async fn get_instance(&self, address: &str) -> Result<TerminationInstance, StoreError> {
        (**self).get_instance(address).await
    }

    async fn get_instances(
        &self,
        addresses: &[String],
    ) -> Result<Vec<TerminationInstance>, StoreError> {
        (**self).get_instances(addresses).await
    }

    async fn list_instance_addresses(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_instance_addresses().await
    }

    async fn save_instance(&self, instance: &TerminationInstance) -> Result<(), StoreError> {
        (**self).save_instance(instance).await
    }

    async fn save_instance_addresses(&self, addresses: &[String]) -> Result<(), StoreError> {
        (**self).save_instance_addresses(addresses).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
