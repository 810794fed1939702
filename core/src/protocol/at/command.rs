/*
 * command.rs
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

//! Command and response types for the AT engine.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::time::Duration;

/// SUB control character; terminates the PDU payload of an interactive
/// `AT+CMGS` instead of a carriage return.
pub const CTRL_Z: &str = "\x1a";

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// One logical command: ordered steps with their terminators. Most commands
/// are a single step terminated by CR; interactive commands (SMS send) have
/// a second step written once the modem holds the line open with a `>`
/// prompt.
#[derive(Debug, Clone)]
pub struct AtCommand {
    steps: Vec<String>,
    terminators: Vec<String>,
    timeout: Option<Duration>,
}

impl AtCommand {
    /// Single-step command terminated by CR.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            steps: vec![command.into()],
            terminators: vec!["\r".to_string()],
            timeout: None,
        }
    }

    /// Multi-step command. Each step is written with its own terminator;
    /// steps past the first go out when the modem prompts with `>`.
    /// `steps` and `terminators` must have the same length.
    pub fn interactive(steps: Vec<String>, terminators: Vec<String>) -> Self {
        debug_assert_eq!(steps.len(), terminators.len());
        debug_assert!(!steps.is_empty());
        Self {
            steps,
            terminators,
            timeout: None,
        }
    }

    /// Sets this command's timeout budget explicitly.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Supplies `timeout` only when none was set explicitly.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout.get_or_insert(timeout);
        self
    }

    /// The command name used in responses and errors (first step).
    pub fn name(&self) -> &str {
        &self.steps[0]
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Wire form of step `i`: the step text followed by its terminator.
    pub(crate) fn step(&self, i: usize) -> String {
        format!("{}{}", self.steps[i], self.terminators[i])
    }
}

/// Outcome of a successfully classified command: timing metadata and the
/// accumulated response text.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Every inbound chunk observed during execution, concatenated. For
    /// `AT+CMGL` this is the listing the store parses.
    pub response: String,
}

/// Per-command failure. A failed command never poisons the queue; the next
/// job runs regardless.
#[derive(Debug)]
pub enum CommandError {
    /// The modem answered with an `ERROR` substring.
    Rejected { command: String, response: String },
    /// No terminal response within the command's budget.
    Timeout { command: String },
    /// The link tasks are gone (stream closed or worker dropped).
    LinkClosed { command: String },
    /// Write failure on the transport.
    Io(io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Rejected { command, response } => {
                write!(f, "command {} rejected: {}", command, response.trim())
            }
            CommandError::Timeout { command } => write!(f, "command {} timed out", command),
            CommandError::LinkClosed { command } => {
                write!(f, "link closed while executing {}", command)
            }
            CommandError::Io(e) => write!(f, "link write failed: {}", e),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Io(e)
    }
}
