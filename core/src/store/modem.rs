/*
 * modem.rs
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

//! The modem facade: high-level SMS operations over an AT command link.
//!
//! Two serialization layers stack here. The command queue makes the link
//! itself sequential; on top of it, an operation lock keeps compound
//! operations (reset + mode select + listing, or a multipart send) from
//! interleaving their commands. The lock is tokio's, so waiters are served
//! in order.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::config::ModemConfig;
use crate::pdu::encode_submit;
use crate::protocol::at::{AtCommand, CommandQueue, CommandResponse, LineFramer, CTRL_Z};

use super::error::ModemError;
use super::listing::parse_cmgl_response;
use super::message::{DecodedRecord, Listing, Message};
use super::reassembly::reassemble;

/// A GSM modem reachable over any duplex byte stream (a serial port,
/// usually). Cheaply cloneable; all clones share one link.
///
/// Opening the modem also yields a receiver of incoming [`Message`]s,
/// driven by `+CMTI` indications: each indication triggers a listing, and
/// the message containing the announced slot is delivered once complete.
#[derive(Clone)]
pub struct GsmModem {
    inner: Arc<ModemInner>,
}

struct ModemInner {
    queue: CommandQueue,
    ops: Mutex<()>,
    config: ModemConfig,
}

impl GsmModem {
    /// Takes ownership of the stream, spawns the link tasks, and resets the
    /// modem into a known state (ATZ, ringer off, PDU mode is selected per
    /// operation).
    pub async fn open<S>(
        stream: S,
        config: ModemConfig,
    ) -> Result<(Self, mpsc::Receiver<Message>), ModemError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        // broadcast::channel panics on capacity 0.
        let (chunks, _) = broadcast::channel::<String>(config.chunk_capacity.max(1));
        let (cmti_tx, mut cmti_rx) = mpsc::channel::<u32>(16);
        spawn_reader(read_half, chunks.clone(), cmti_tx);

        let queue = CommandQueue::spawn(write_half, chunks);
        let inner = Arc::new(ModemInner {
            queue,
            ops: Mutex::new(()),
            config,
        });

        let (events_tx, events_rx) = mpsc::channel::<Message>(16);
        let notifier = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(slot) = cmti_rx.recv().await {
                // An incomplete multipart group yields no message yet; the
                // indication for its final part will.
                if let Ok(Some(message)) = notifier.find_message(slot).await {
                    if events_tx.send(message).await.is_err() {
                        break;
                    }
                }
            }
        });

        let modem = Self { inner };
        modem.reset().await?;
        Ok((modem, events_rx))
    }

    /// Re-runs the initialization sequence.
    pub async fn reset(&self) -> Result<(), ModemError> {
        let _guard = self.inner.ops.lock().await;
        self.inner.reset_locked().await
    }

    /// Lists stored records and assembles them into logical messages.
    /// Multipart groups with missing parts are withheld; undecodable
    /// records are returned alongside with their slot indexes.
    pub async fn get_messages(&self) -> Result<Listing, ModemError> {
        let _guard = self.inner.ops.lock().await;
        self.inner.list_locked().await
    }

    /// The assembled message occupying `slot`, if the listing currently
    /// yields one containing it.
    pub async fn get_message(&self, slot: u32) -> Result<Option<Message>, ModemError> {
        self.inner.find_message(slot).await
    }

    /// Encodes `text` for `recipient` and sends it, as multiple
    /// concatenated parts when it does not fit one SMS. Encoding failures
    /// surface before anything touches the link.
    pub async fn send_message(&self, recipient: &str, text: &str) -> Result<(), ModemError> {
        let pdus = encode_submit(recipient, text)?;
        let _guard = self.inner.ops.lock().await;
        self.inner.reset_locked().await?;
        self.inner.set_pdu_mode().await?;
        for pdu in pdus {
            let command = AtCommand::interactive(
                vec![format!("AT+CMGS={}", pdu.tpdu_len), pdu.hex],
                vec!["\r".to_string(), CTRL_Z.to_string()],
            );
            self.inner.submit(command).await?;
        }
        Ok(())
    }

    /// Deletes every storage slot of `message`, lowest slot first.
    pub async fn delete_message(&self, message: &Message) -> Result<(), ModemError> {
        let mut slots = message.part_indexes();
        slots.sort_unstable();
        let _guard = self.inner.ops.lock().await;
        for slot in slots {
            self.inner.delete_slot_locked(slot).await?;
        }
        Ok(())
    }

    /// Deletes a single storage slot, assembled or not. This is the cleanup
    /// path for [`Listing::undecodable`] records.
    pub async fn delete_slot(&self, slot: u32) -> Result<(), ModemError> {
        let _guard = self.inner.ops.lock().await;
        self.inner.delete_slot_locked(slot).await
    }

    /// Clears the entire message store.
    pub async fn delete_all_messages(&self) -> Result<(), ModemError> {
        let _guard = self.inner.ops.lock().await;
        self.inner.submit(AtCommand::new("AT+CMGD=1,4")).await?;
        Ok(())
    }

    /// Runs an arbitrary AT command, serialized with the high-level
    /// operations.
    pub async fn command(&self, command: AtCommand) -> Result<CommandResponse, ModemError> {
        let _guard = self.inner.ops.lock().await;
        Ok(self.inner.submit(command).await?)
    }

    /// False once the link tasks have shut down (stream closed).
    pub fn is_alive(&self) -> bool {
        self.inner.queue.is_alive()
    }
}

impl ModemInner {
    async fn submit(&self, command: AtCommand) -> Result<CommandResponse, ModemError> {
        // The configured budget backs commands that carry none of their own.
        let command = command.with_default_timeout(self.config.command_timeout);
        Ok(self.queue.submit(command).await?)
    }

    async fn reset_locked(&self) -> Result<(), ModemError> {
        self.submit(AtCommand::new("ATZ")).await?;
        // No ringing through the audio path on incoming events.
        self.submit(AtCommand::new("AT+GSMBUSY=1")).await?;
        Ok(())
    }

    async fn set_pdu_mode(&self) -> Result<(), ModemError> {
        self.submit(AtCommand::new("AT+CMGF=0")).await?;
        Ok(())
    }

    async fn list_locked(&self) -> Result<Listing, ModemError> {
        self.reset_locked().await?;
        self.set_pdu_mode().await?;
        let response = self.submit(AtCommand::new("AT+CMGL=4")).await?;
        let records = parse_cmgl_response(&response.response);
        let decoded: Vec<DecodedRecord> = records.iter().map(DecodedRecord::decode).collect();
        Ok(reassemble(&decoded, &self.config.sender_format))
    }

    async fn find_message(&self, slot: u32) -> Result<Option<Message>, ModemError> {
        let _guard = self.ops.lock().await;
        let listing = self.list_locked().await?;
        Ok(listing
            .messages
            .into_iter()
            .find(|m| m.contains_slot(slot)))
    }

    async fn delete_slot_locked(&self, slot: u32) -> Result<(), ModemError> {
        self.submit(AtCommand::new(format!("AT+CMGD={}", slot)))
            .await?;
        Ok(())
    }
}

/// Reads the stream and fans chunks out: raw to the broadcast channel for
/// the command in flight, framed lines to the `+CMTI` detector. Exits when
/// the stream closes or errors.
fn spawn_reader<R>(mut reader: R, chunks: broadcast::Sender<String>, cmti: mpsc::Sender<u32>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let mut framer = LineFramer::new();
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
            for line in framer.push(&chunk) {
                if let Some(slot) = parse_cmti(&line) {
                    // Never block the reader; a full indication queue
                    // drops the oldest news, the next listing catches up.
                    let _ = cmti.try_send(slot);
                }
            }
            // No command in flight means no receivers; fine.
            let _ = chunks.send(chunk);
        }
    });
}

/// `+CMTI: "SM",4` → slot 4.
fn parse_cmti(line: &str) -> Option<u32> {
    let rest = line.trim().strip_prefix("+CMTI:")?;
    rest.split(',').nth(1)?.trim().parse().ok()
}
