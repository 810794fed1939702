/*
 * message.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Telegrafo, an SMS gateway for serial GSM modems.
 *
 * Telegrafo is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Telegrafo is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Telegrafo.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Message types, from raw listing record to assembled logical message.
//! All of these are built fresh per listing; the modem's storage is the
//! only durable state.

use chrono::{DateTime, Utc};

use crate::pdu::{self, ConcatInfo};

/// One record from an `AT+CMGL` listing: storage slot and hex payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPduRecord {
    pub index: u32,
    pub hex_payload: String,
}

/// A decoded stored SMS, still one PDU record (one part of a multipart
/// message, or a whole single-part one).
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub index: u32,
    pub sender: String,
    pub alphanumeric_sender: bool,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub concat: Option<ConcatInfo>,
}

/// Decode outcome for one raw record. Failures keep the slot index so the
/// record can still be deleted; they never abort the rest of the batch.
#[derive(Debug, Clone)]
pub enum DecodedRecord {
    Text(DecodedMessage),
    Failed { index: u32, reason: String },
}

impl DecodedRecord {
    /// Decodes one raw record, charset-validating the payload first.
    pub fn decode(record: &RawPduRecord) -> Self {
        if !pdu::is_valid_hex(&record.hex_payload) {
            return DecodedRecord::Failed {
                index: record.index,
                reason: "payload is not a hex string".to_string(),
            };
        }
        match pdu::decode_deliver(&record.hex_payload) {
            Ok(d) => DecodedRecord::Text(DecodedMessage {
                index: record.index,
                sender: d.sender,
                alphanumeric_sender: d.alphanumeric_sender,
                timestamp: d.timestamp,
                text: d.text,
                concat: d.concat,
            }),
            Err(e) => DecodedRecord::Failed {
                index: record.index,
                reason: e.to_string(),
            },
        }
    }
}

/// A logical, user-facing message. Single-part messages occupy one storage
/// slot; concatenated ones list every slot of the group, ordered by part
/// number, so deletion can clear the whole message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Single {
        index: u32,
        sender: String,
        timestamp: DateTime<Utc>,
        text: String,
    },
    Concatenated {
        part_indexes: Vec<u32>,
        sender: String,
        timestamp: DateTime<Utc>,
        text: String,
    },
}

impl Message {
    /// Primary storage slot: the single slot, or the first part's.
    pub fn index(&self) -> u32 {
        match self {
            Message::Single { index, .. } => *index,
            Message::Concatenated { part_indexes, .. } => part_indexes[0],
        }
    }

    /// Every slot that must be deleted to remove this message, ordered by
    /// part number.
    pub fn part_indexes(&self) -> Vec<u32> {
        match self {
            Message::Single { index, .. } => vec![*index],
            Message::Concatenated { part_indexes, .. } => part_indexes.clone(),
        }
    }

    pub fn contains_slot(&self, slot: u32) -> bool {
        match self {
            Message::Single { index, .. } => *index == slot,
            Message::Concatenated { part_indexes, .. } => part_indexes.contains(&slot),
        }
    }

    pub fn sender(&self) -> &str {
        match self {
            Message::Single { sender, .. } | Message::Concatenated { sender, .. } => sender,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Message::Single { timestamp, .. } | Message::Concatenated { timestamp, .. } => {
                *timestamp
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Single { text, .. } | Message::Concatenated { text, .. } => text,
        }
    }
}

/// A record that could not be decoded, surfaced with its slot so it can be
/// deleted via [`super::GsmModem::delete_slot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableRecord {
    pub index: u32,
    pub reason: String,
}

/// One listing snapshot: assembled messages plus any records that failed
/// to decode. Multipart groups with missing parts appear in neither — they
/// stay invisible until a later listing sees every part.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub messages: Vec<Message>,
    pub undecodable: Vec<UndecodableRecord>,
}
