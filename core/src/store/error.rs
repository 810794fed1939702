/*
 * error.rs
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

//! Errors for modem store operations.

use std::error::Error;
use std::fmt;

use crate::pdu::EncodeError;
use crate::protocol::at::CommandError;

/// Error performing a modem operation.
#[derive(Debug)]
pub enum ModemError {
    /// An AT command failed on the link.
    Command(CommandError),

    /// The outgoing message could not be encoded.
    Encode(EncodeError),
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModemError::Command(e) => write!(f, "{}", e),
            ModemError::Encode(e) => write!(f, "{}", e),
        }
    }
}

impl Error for ModemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModemError::Command(e) => Some(e),
            ModemError::Encode(e) => Some(e),
        }
    }
}

impl From<CommandError> for ModemError {
    fn from(e: CommandError) -> Self {
        ModemError::Command(e)
    }
}

impl From<EncodeError> for ModemError {
    fn from(e: EncodeError) -> Self {
        ModemError::Encode(e)
    }
}
