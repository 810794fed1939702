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

//! Hayes AT command engine: queued execution of possibly multi-step
//! commands over one shared link, free-form response classification,
//! per-command timeout, CRLF line framing for unsolicited indications.
//!
//! The modem's reply grammar is line-oriented with no command tagging, so
//! at most one command may be on the link at any time; [`CommandQueue`]
//! enforces that by owning the write half and running jobs strictly in
//! submission order.

mod command;
mod executor;
mod framer;
mod queue;

pub use command::{AtCommand, CommandError, CommandResponse, CTRL_Z, DEFAULT_COMMAND_TIMEOUT};
pub use framer::LineFramer;
pub use queue::CommandQueue;
