/*
 * config.rs
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

//! Modem engine configuration: command timeout, inbound fan-out capacity,
//! sender address display policy.

use std::time::Duration;

/// Configuration for [`crate::store::GsmModem`]. Serial device settings
/// (path, baud rate) belong to whatever opens the byte stream.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// Budget for one queued command, prompt steps included.
    pub command_timeout: Duration,
    /// Capacity of the broadcast channel fanning inbound chunks to the
    /// command in flight. Lagging receivers skip, they do not block reads.
    /// Clamped to at least 1 when the link is opened.
    pub chunk_capacity: usize,
    /// Display policy for decoded originating addresses.
    pub sender_format: SenderFormat,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            chunk_capacity: 64,
            sender_format: SenderFormat::default(),
        }
    }
}

impl ModemConfig {
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn sender_format(mut self, format: SenderFormat) -> Self {
        self.sender_format = format;
        self
    }
}

/// Policy for rendering a decoded originating address. Numeric addresses at
/// least `international_min_digits` long are taken to be full international
/// numbers and get a leading `+`; shorter digit strings are short codes and
/// alphanumeric senders are shown as decoded.
#[derive(Debug, Clone)]
pub struct SenderFormat {
    pub international_min_digits: usize,
}

impl Default for SenderFormat {
    fn default() -> Self {
        Self { international_min_digits: 10 }
    }
}

impl SenderFormat {
    pub fn display(&self, sender: &str, alphanumeric: bool) -> String {
        if alphanumeric || !sender.chars().all(|c| c.is_ascii_digit()) {
            return sender.to_string();
        }
        if sender.len() >= self.international_min_digits {
            format!("+{}", sender)
        } else {
            sender.to_string()
        }
    }
}
