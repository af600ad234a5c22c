// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Setup request payloads handed to the termination instance.
//!
//! The PDUs themselves come pre-encoded from configuration; this module only
//! prefixes them with the RAN endpoint so the termination instance knows where
//! to open the SCTP association:
//!
//! ```text
//! <ip>|<port>|<ran name>|<pdu length>|<pdu bytes>
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::bus::{BusMessage, MessageType};
use crate::model::{ProtocolKind, RanRecord};

/// Pre-encoded setup request PDUs, one per protocol kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupPdus {
    x2: Bytes,
    endc: Bytes,
}

impl SetupPdus {
    pub fn new(x2: impl Into<Bytes>, endc: impl Into<Bytes>) -> Self {
        Self {
            x2: x2.into(),
            endc: endc.into(),
        }
    }

    pub fn pdu_for(&self, protocol: ProtocolKind) -> &Bytes {
        match protocol {
            ProtocolKind::X2Setup => &self.x2,
            ProtocolKind::EndcX2Setup => &self.endc,
        }
    }
}

/// Setup request for one RAN.
#[derive(Debug, Clone)]
pub struct SetupRequestMessage<'a> {
    ip: &'a str,
    port: u16,
    ran_name: &'a str,
    protocol: ProtocolKind,
    pdu: &'a Bytes,
}

impl<'a> SetupRequestMessage<'a> {
    pub fn for_ran(ran: &'a RanRecord, pdus: &'a SetupPdus) -> Self {
        Self {
            ip: &ran.ip,
            port: ran.port,
            ran_name: &ran.ran_name,
            protocol: ran.protocol,
            pdu: pdus.pdu_for(ran.protocol),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let prefix = format!(
            "{}|{}|{}|{}|",
            self.ip,
            self.port,
            self.ran_name,
            self.pdu.len()
        );
        let mut buf = BytesMut::with_capacity(prefix.len() + self.pdu.len());
        buf.put_slice(prefix.as_bytes());
        buf.put(self.pdu.clone());
        buf.freeze()
    }

    /// Bus message addressed to the RAN; the RAN name doubles as transaction id.
    pub fn into_bus_message(self) -> BusMessage {
        BusMessage::new(
            MessageType::setup_request(self.protocol),
            self.ran_name,
            self.to_bytes(),
        )
    }
}
