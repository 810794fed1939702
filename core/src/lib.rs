/*
 * lib.rs
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

//! Telegrafo core: drives a GSM modem over a serial byte stream using the
//! Hayes AT command set in PDU mode. Commands are serialized onto the link
//! through a single queue; stored messages are listed, decoded, and
//! multipart SMS reassembled into logical messages; unsolicited `+CMTI`
//! indications surface completed messages on an event channel.
//!
//! The serial device itself is not opened here: [`store::GsmModem::open`]
//! takes any `AsyncRead + AsyncWrite` byte stream.

pub mod config;
pub mod pdu;
pub mod protocol;
pub mod store;

pub use config::{ModemConfig, SenderFormat};
pub use protocol::at::{AtCommand, CommandError, CommandQueue, CommandResponse};
pub use store::{GsmModem, Listing, Message, ModemError};
