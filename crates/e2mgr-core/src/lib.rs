// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! E2 Manager Core - RAN Connection Lifecycle
//!
//! This crate decides which termination instance serves each RAN node, drives
//! every RAN through its connection state machine, and implements the global
//! "big red button" shutdown.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       e2mgr-server (HTTP API)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//!          │ setup                       │ shutdown                 │ reads
//!          ▼                             ▼                          ▼
//! ┌─────────────────────┐   ┌─────────────────────────┐   ┌─────────────────┐
//! │ SetupRequestHandler │   │  ShutdownOrchestrator   │   │   RanQueries    │
//! └─────────────────────┘   └─────────────────────────┘   └─────────────────┘
//!          │                             │
//!          ▼                             │
//! ┌─────────────────────┐                │
//! │ AssociationManager  │                │
//! └─────────────────────┘                │
//!          │                             │
//!          ▼                             ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InstancePool        RouteRegistrar        MessageSender                 │
//! │  (select, RAN sets)  (routing manager)     (message bus)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │        RetryingStore (store gateway) over MemoryStore | SqliteStore      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # RAN Status State Machine
//!
//! ```text
//!                  setup (new RAN)
//!                        │
//!                        ▼
//!   ┌──────────────┐  selection  ┌────────────┐   setup response  ┌───────────┐
//!   │ DISCONNECTED │◄── failed ──│ CONNECTING │ ─ (out of scope) ►│ CONNECTED │
//!   └──────────────┘             └────────────┘                   └───────────┘
//!          │                           │                                │
//!          └───────────────────────────┼────────────────────────────────┘
//!                                      │ big red button
//!                                      ▼
//!                              ┌───────────────┐
//!                              │ SHUTTING_DOWN │  setup rejected (WrongState)
//!                              └───────────────┘
//!                                      │ grace period
//!                                      ▼
//!                                ┌───────────┐
//!                                │ SHUT_DOWN │
//!                                └───────────┘
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `E2MGR_DATABASE_URL` | `sqlite::memory:` | `sqlite:` URL or `memory` |
//! | `E2MGR_HTTP_PORT` | `3800` | HTTP listen port |
//! | `E2MGR_BUS_ADDR` | `127.0.0.1:4560` | Message bus router |
//! | `E2MGR_ROUTING_MANAGER_URL` | `http://127.0.0.1:8080/ric/v1/handles/` | Routing manager base URL |
//! | `E2MGR_MAX_STORE_ATTEMPTS` | `3` | Store attempts per operation |
//! | `E2MGR_STORE_RETRY_INTERVAL_MS` | `100` | Sleep between store attempts |
//! | `E2MGR_SHUTDOWN_GRACE_SECS` | `10` | Shutdown grace period |
//! | `E2MGR_X2_SETUP_PDU` | empty | Base64 X2 setup request PDU |
//! | `E2MGR_ENDC_SETUP_PDU` | empty | Base64 EN-DC X2 setup request PDU |
//!
//! # Modules
//!
//! - [`pool`]: termination instance selection and RAN set bookkeeping
//! - [`association`]: binding a RAN to an instance and registering its route
//! - [`setup`]: setup request state machine
//! - [`shutdown`]: the big red button
//! - [`store`]: store gateway, retry layer and backends
//! - [`routing`], [`bus`]: outbound collaborators

/// Configuration loaded from environment variables.
pub mod config;

/// Error taxonomy shared by every component.
pub mod error;

/// RAN and termination instance records.
pub mod model;

/// Store gateway, retry layer, in-memory and SQLite backends.
pub mod store;

/// Routing manager client.
pub mod routing;

/// Message bus sender and frame format.
pub mod bus;

/// Setup request payload construction.
pub mod setup_message;

/// Termination instance pool manager.
pub mod pool;

/// Association manager.
pub mod association;

/// Setup request handler.
pub mod setup;

/// Shutdown orchestrator.
pub mod shutdown;

/// Read-only queries.
pub mod queries;

/// Component wiring.
pub mod manager;

/// Recording collaborators for tests and local runs.
pub mod mock;

pub use error::{E2MgrError, ErrorKind, Result};
pub use manager::E2Manager;
pub use model::{ConnectionStatus, ProtocolKind, RanIdentity, RanRecord, TerminationInstance};
pub use setup::SetupRequest;
pub use shutdown::{PARTIAL_SUCCESS_MESSAGE, ShutdownOutcome};
