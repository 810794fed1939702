/*
 * queue.rs
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

//! Command queue: the link is sequential, one command at a time.
//!
//! A spawned worker owns the transport write half and executes jobs in
//! strict FIFO order. Each job's outcome travels back on its own oneshot,
//! so a rejected or timed-out command never affects the jobs behind it.

use tokio::io::AsyncWrite;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::command::{AtCommand, CommandError, CommandResponse};
use super::executor;

struct Job {
    command: AtCommand,
    reply: oneshot::Sender<Result<CommandResponse, CommandError>>,
}

/// Handle to the link worker. Cheaply cloneable (channel sender).
#[derive(Clone)]
pub struct CommandQueue {
    jobs: mpsc::Sender<Job>,
}

impl CommandQueue {
    /// Spawns the worker task. `writer` is the only writer to the link from
    /// here on; `chunks` is the inbound fan-out the executor subscribes to
    /// for the duration of each command.
    pub fn spawn<W>(mut writer: W, chunks: broadcast::Sender<String>) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (jobs, mut rx) = mpsc::channel::<Job>(32);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = executor::execute(&mut writer, &chunks, &job.command).await;
                // Caller may have given up; its loss only.
                let _ = job.reply.send(result);
            }
        });
        Self { jobs }
    }

    /// Queues `command` and waits for its outcome. Jobs run in submission
    /// order; this call suspends until everything ahead has reached a
    /// terminal state.
    pub async fn submit(&self, command: AtCommand) -> Result<CommandResponse, CommandError> {
        let name = command.name().to_string();
        let (reply, outcome) = oneshot::channel();
        self.jobs
            .send(Job { command, reply })
            .await
            .map_err(|_| CommandError::LinkClosed {
                command: name.clone(),
            })?;
        outcome
            .await
            .unwrap_or(Err(CommandError::LinkClosed { command: name }))
    }

    pub fn is_alive(&self) -> bool {
        !self.jobs.is_closed()
    }
}
