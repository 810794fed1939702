/*
 * mod.rs
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

//! Message store: listing, decoding, and multipart reassembly of stored
//! SMS records, and the public modem operations.

mod error;
mod listing;
mod message;
mod modem;
mod reassembly;

pub use error::ModemError;
pub use message::{
    DecodedMessage, DecodedRecord, Listing, Message, RawPduRecord, UndecodableRecord,
};
pub use modem::GsmModem;
pub use reassembly::reassemble;
