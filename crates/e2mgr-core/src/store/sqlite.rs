// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed store.
//!
//! Records are JSON documents in a single key/value table:
//!
//! | key                    | value                        |
//! |------------------------|------------------------------|
//! | `RAN:<name>`           | [`RanRecord`]                |
//! | `IDENTITY:<name>`      | [`RanIdentity`]              |
//! | `E2TINSTANCE:<addr>`   | [`TerminationInstance`]      |
//! | `E2TADDRESSES`         | global address list          |

use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use super::{RanStore, StoreError};
use crate::model::{RanIdentity, RanRecord, TerminationInstance};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

const RAN_PREFIX: &str = "RAN:";
const IDENTITY_PREFIX: &str = "IDENTITY:";
const INSTANCE_PREFIX: &str = "E2TINSTANCE:";
const ADDRESSES_KEY: &str = "E2TADDRESSES";

fn ran_key(ran_name: &str) -> String {
    format!("{RAN_PREFIX}{ran_name}")
}

fn identity_key(ran_name: &str) -> String {
    format!("{IDENTITY_PREFIX}{ran_name}")
}

fn instance_key(address: &str) -> String {
    format!("{INSTANCE_PREFIX}{address}")
}

/// Classify a sqlx error: unreachable backends are retryable, the rest is not.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection {
                operation,
                details: err.to_string(),
            }
        }
        _ => StoreError::Internal {
            operation,
            details: err.to_string(),
        },
    }
}

fn encode<T: Serialize>(operation: &'static str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Internal {
        operation,
        details: format!("serialization failed: {e}"),
    })
}

fn decode<T: DeserializeOwned>(operation: &'static str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Internal {
        operation,
        details: format!("corrupt record: {e}"),
    })
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool. The schema must already exist, see [`Self::init_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the database file and schema when missing.
    ///
    /// In-memory URLs get a single connection, since every SQLite memory
    /// connection is its own database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Internal {
                operation: "connect",
                details: format!("invalid database URL: {e}"),
            })?
            .create_if_missing(true);

        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self { pool };
        store.init_schema().await?;
        info!(max_connections, "SQLite store ready");
        Ok(store)
    }

    /// Apply pending migrations from `migrations/sqlite`.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Internal {
                operation: "migrate",
                details: format!("Failed to run migrations: {e}"),
            })?;

        Ok(())
    }

    async fn get_value(&self, operation: &'static str, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM e2mgr_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn put_value(&self, operation: &'static str, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO e2mgr_kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        Ok(())
    }
}

#[async_trait]
impl RanStore for SqliteStore {
    async fn get_ran(&self, ran_name: &str) -> Result<RanRecord, StoreError> {
        match self.get_value("get_ran", &ran_key(ran_name)).await? {
            Some(raw) => decode("get_ran", &raw),
            None => Err(StoreError::ran_not_found(ran_name)),
        }
    }

    async fn save_ran(&self, identity: &RanIdentity, ran: &RanRecord) -> Result<(), StoreError> {
        const OP: &str = "save_ran";
        let ran_value = encode(OP, ran)?;
        let identity_value = encode(OP, identity)?;

        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(OP, e))?;
        for (key, value) in [
            (ran_key(&ran.ran_name), ran_value),
            (identity_key(&identity.inventory_name), identity_value),
        ] {
            sqlx::query(
                r#"
                INSERT INTO e2mgr_kv (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error(OP, e))?;

        Ok(())
    }

    async fn update_ran(&self, ran: &RanRecord) -> Result<(), StoreError> {
        let value = encode("update_ran", ran)?;
        self.put_value("update_ran", &ran_key(&ran.ran_name), &value)
            .await
    }

    async fn list_ran_identities(&self) -> Result<Vec<RanIdentity>, StoreError> {
        const OP: &str = "list_ran_identities";
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT value FROM e2mgr_kv WHERE key LIKE 'IDENTITY:%' ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;

        rows.iter().map(|raw| decode(OP, raw)).collect()
    }

    async fn get_instance(&self, address: &str) -> Result<TerminationInstance, StoreError> {
        match self
            .get_value("get_instance", &instance_key(address))
            .await?
        {
            Some(raw) => decode("get_instance", &raw),
            None => Err(StoreError::instance_not_found(address)),
        }
    }

    async fn get_instances(
        &self,
        addresses: &[String],
    ) -> Result<Vec<TerminationInstance>, StoreError> {
        let mut instances = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(raw) = self
                .get_value("get_instances", &instance_key(address))
                .await?
            {
                instances.push(decode("get_instances", &raw)?);
            }
        }
        Ok(instances)
    }

    async fn list_instance_addresses(&self) -> Result<Vec<String>, StoreError> {
        match self
            .get_value("list_instance_addresses", ADDRESSES_KEY)
            .await?
        {
            Some(raw) => decode("list_instance_addresses", &raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save_instance(&self, instance: &TerminationInstance) -> Result<(), StoreError> {
        let value = encode("save_instance", instance)?;
        self.put_value("save_instance", &instance_key(&instance.address), &value)
            .await
    }

    async fn save_instance_addresses(&self, addresses: &[String]) -> Result<(), StoreError> {
        let value = encode("save_instance_addresses", &addresses)?;
        self.put_value("save_instance_addresses", ADDRESSES_KEY, &value)
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}
