/*
 * executor.rs
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

//! Execution of one AT command: write, accumulate, classify.
//!
//! Classification is deliberately substring-based (`ERROR`, `OK`, `>`)
//! because the modem's free-form replies carry no framing that would align
//! message boundaries with anything stricter. ERROR wins over OK within a
//! chunk. A `>` prompt advances to the next step while steps remain.

use std::time::Instant;

use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

use super::command::{AtCommand, CommandError, CommandResponse};

/// Runs `command` against the link. The inbound listener is the
/// `broadcast::Receiver` subscribed here, before the first write; it is
/// dropped on every exit path (success, rejection, timeout), so no stale
/// listener can misclassify the next command's traffic.
pub(crate) async fn execute<W>(
    writer: &mut W,
    chunks: &broadcast::Sender<String>,
    command: &AtCommand,
) -> Result<CommandResponse, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let started_at = Utc::now();
    let start = Instant::now();

    let mut listener = chunks.subscribe();
    writer.write_all(command.step(0).as_bytes()).await?;
    writer.flush().await?;

    match tokio::time::timeout(command.timeout(), classify(writer, &mut listener, command)).await {
        Ok(result) => result.map(|response| CommandResponse {
            command: command.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            response,
        }),
        Err(_) => Err(CommandError::Timeout {
            command: command.name().to_string(),
        }),
    }
}

async fn classify<W>(
    writer: &mut W,
    listener: &mut broadcast::Receiver<String>,
    command: &AtCommand,
) -> Result<String, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let mut response = String::new();
    let mut step = 0usize;
    loop {
        let chunk = match listener.recv().await {
            Ok(chunk) => chunk,
            // Skipped chunks cannot be recovered; keep classifying what
            // still arrives and let the timeout decide otherwise.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => {
                return Err(CommandError::LinkClosed {
                    command: command.name().to_string(),
                })
            }
        };
        response.push_str(&chunk);

        if chunk.contains("ERROR") {
            return Err(CommandError::Rejected {
                command: command.name().to_string(),
                response,
            });
        }
        if chunk.contains("OK") {
            return Ok(response);
        }
        if chunk.contains('>') && step + 1 < command.step_count() {
            step += 1;
            writer.write_all(command.step(step).as_bytes()).await?;
            writer.flush().await?;
        }
    }
}
