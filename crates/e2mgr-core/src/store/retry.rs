// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Connection-retry layer over any [`RanStore`] backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};

use super::{RanStore, StoreError};
use crate::model::{RanIdentity, RanRecord, TerminationInstance};

/// How often and how patiently connection failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_interval: Duration::from_millis(100),
        }
    }
}

/// Store gateway: retries [`StoreError::Connection`] up to the policy's
/// attempt budget. Not-found and internal errors are returned on first sight.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: RanStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_connection() && attempt < max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Store connection error, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_interval).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_connection() {
                        error!(operation, attempts = attempt, error = %err, "Store retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl<S: RanStore> RanStore for RetryingStore<S> {
    async fn get_ran(&self, ran_name: &str) -> Result<RanRecord, StoreError> {
        let inner = &self.inner;
        self.retry("get_ran", move || inner.get_ran(ran_name)).await
    }

    async fn save_ran(&self, identity: &RanIdentity, ran: &RanRecord) -> Result<(), StoreError> {
        let inner = &self.inner;
        self.retry("save_ran", move || inner.save_ran(identity, ran))
            .await
    }

    async fn update_ran(&self, ran: &RanRecord) -> Result<(), StoreError> {
        let inner = &self.inner;
        self.retry("update_ran", move || inner.update_ran(ran)).await
    }

    async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>, StoreError> {
        let inner = &self.inner;
        self.retry("list_ran_identities", move || inner.list_ran_identities())
            .await
    }

    async fn get_instance(&self, address: &str) -> Result<TerminationInstance, StoreError> {
        let inner = &self.inner;
        self.retry("get_instance", move || inner.get_instance(address))
            .await
    }

    async fn get_instances(
        &self,
        addresses: &[String],
    ) -> Result<Vec<TerminationInstance>, StoreError> {
        let inner = &self.inner;
        self.retry("get_instances", move || inner.get_instances(addresses))
            .await
    }

    async fn list_instance_addresses(&self) -> Result<Vec<String>, StoreError> {
        let inner = &self.inner;
        self.retry("list_instance_addresses", move || {
            inner.list_instance_addresses()
        })
        .await
    }

    async fn save_instance(&self, instance: &TerminationInstance) -> Result<(), StoreError> {
        let inner = &self.inner;
        self.retry("save_instance", move || inner.save_instance(instance))
            .await
    }

    async fn save_instance_addresses(&self, addresses: &[String]) -> Result<(), StoreError> {
        let inner = &self.inner;
        self.retry("save_instance_addresses", move || {
            inner.save_instance_addresses(addresses)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let inner = &self.inner;
        self.retry("ping", move || inner.ping()).await
    }
}
