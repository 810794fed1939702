/*
 * modem_link.rs
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

//! End-to-end tests over an in-memory duplex stream, with a scripted modem
//! on the far side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

use telegrafo_core::{AtCommand, CommandError, GsmModem, Message, ModemConfig, ModemError};

/// SMS-DELIVER from +31612345678, "hello", 2026-08-27 10:00:00 UTC.
const HELLO: &str = "00040B911316325476F800006280722100008005E8329BFD06";
/// Parts 1/2 ("AB") and 2/2 ("CD") of concatenation reference 0x42.
const PART_ONE: &str = "00440B911316325476F8000062807221000080090500034202018242";
const PART_TWO: &str = "00440B911316325476F8000062807221000080090500034202028644";

/// The far side of the link: splits inbound bytes into logical commands
/// (CR- or CTRL-Z-terminated), logs them, and answers via the responder.
/// Unsolicited traffic is injected through the returned sender.
struct MockModem {
    log: Arc<Mutex<Vec<String>>>,
    inject: mpsc::UnboundedSender<String>,
}

impl MockModem {
    fn spawn<F>(stream: DuplexStream, responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + 'static,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (inject, mut inject_rx) = mpsc::unbounded_channel::<String>();
        let task_log = Arc::clone(&log);
        tokio::spawn(async move {
            let (mut reader, mut writer) = tokio::io::split(stream);
            let mut buf = [0u8; 512];
            let mut pending = String::new();
            loop {
                tokio::select! {
                    n = reader.read(&mut buf) => {
                        let n = match n {
                            Ok(0) | Err(_) => break,
                            Ok(n) => n,
                        };
                        pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                        while let Some(pos) = pending.find(['\r', '\x1a']) {
                            let command = pending[..pos].trim().to_string();
                            pending.drain(..pos + 1);
                            if command.is_empty() {
                                continue;
                            }
                            let reply = responder(&command);
                            task_log.lock().unwrap().push(command);
                            if let Some(reply) = reply {
                                if writer.write_all(reply.as_bytes()).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Some(unsolicited) = inject_rx.recv() => {
                        if writer.write_all(unsolicited.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Self { log, inject }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn ok() -> Option<String> {
    Some("\r\nOK\r\n".to_string())
}

/// Answers every housekeeping command with OK and AT+CMGL=4 with the given
/// stored records.
fn stock_responder(records: Vec<(u32, &'static str)>) -> impl Fn(&str) -> Option<String> {
    move |command: &str| match command {
        "AT+CMGL=4" => {
            let mut reply = String::from("\r\n");
            for (index, payload) in &records {
                reply.push_str(&format!("+CMGL: {},1,,{}\r\n{}\r\n", index, payload.len() / 2, payload));
            }
            reply.push_str("\r\nOK\r\n");
            Some(reply)
        }
        c if c.starts_with("AT+CMGS=") => Some("\r\n> ".to_string()),
        c if c.chars().all(|ch| ch.is_ascii_hexdigit()) => {
            Some("\r\n+CMGS: 3\r\n\r\nOK\r\n".to_string())
        }
        _ => ok(),
    }
}

fn config() -> ModemConfig {
    ModemConfig::default().command_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn open_runs_the_reset_sequence() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![]));
    let (_modem, _events) = GsmModem::open(near, config()).await.unwrap();
    assert_eq!(mock.log(), vec!["ATZ", "AT+GSMBUSY=1"]);
}

#[tokio::test]
async fn send_message_writes_the_payload_once() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![]));
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    modem.send_message("+31612345678", "hello").await.unwrap();

    let log = mock.log();
    // Reset sequence at open, again before the send, then mode select,
    // the CMGS header, and the payload exactly once.
    assert_eq!(
        log,
        vec![
            "ATZ",
            "AT+GSMBUSY=1",
            "ATZ",
            "AT+GSMBUSY=1",
            "AT+CMGF=0",
            "AT+CMGS=18",
            "0001000B911316325476F8000005E8329BFD06",
        ]
    );
}

#[tokio::test]
async fn listing_assembles_singles_and_multipart() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(
        far,
        stock_responder(vec![(1, HELLO), (3, PART_TWO), (2, PART_ONE)]),
    );
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    let listing = modem.get_messages().await.unwrap();
    assert!(listing.undecodable.is_empty());
    assert_eq!(listing.messages.len(), 2);

    assert_eq!(listing.messages[0].index(), 1);
    assert_eq!(listing.messages[0].text(), "hello");
    assert_eq!(listing.messages[0].sender(), "+31612345678");

    // Parts listed out of order still merge by part number.
    assert_eq!(listing.messages[1].text(), "ABCD");
    assert_eq!(listing.messages[1].part_indexes(), vec![2, 3]);
}

#[tokio::test]
async fn incomplete_group_and_bad_records_are_reported() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(far, stock_responder(vec![(1, "ZZZZ"), (2, PART_ONE)]));
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    let listing = modem.get_messages().await.unwrap();
    // The orphan part stays invisible; the garbage record is reported with
    // its slot so it can be deleted.
    assert!(listing.messages.is_empty());
    assert_eq!(listing.undecodable.len(), 1);
    assert_eq!(listing.undecodable[0].index, 1);
}

#[tokio::test]
async fn delete_message_clears_every_part_slot() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![(3, PART_TWO), (2, PART_ONE)]));
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    let listing = modem.get_messages().await.unwrap();
    modem.delete_message(&listing.messages[0]).await.unwrap();
    modem.delete_all_messages().await.unwrap();

    let log = mock.log();
    assert_eq!(&log[log.len() - 3..], ["AT+CMGD=2", "AT+CMGD=3", "AT+CMGD=1,4"]);
}

#[tokio::test]
async fn rejected_command_does_not_poison_the_queue() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(far, |command| {
        if command == "AT+BOGUS" {
            Some("\r\nERROR\r\n".to_string())
        } else {
            ok()
        }
    });
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    let err = modem.command(AtCommand::new("AT+BOGUS")).await.unwrap_err();
    assert!(matches!(
        err,
        ModemError::Command(CommandError::Rejected { .. })
    ));

    // The next command goes through untouched.
    let response = modem.command(AtCommand::new("AT")).await.unwrap();
    assert!(response.response.contains("OK"));
}

#[tokio::test]
async fn timed_out_command_does_not_poison_the_queue() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(far, |command| {
        if command == "AT+SLOW" {
            None
        } else {
            ok()
        }
    });
    let cfg = ModemConfig::default().command_timeout(Duration::from_millis(100));
    let (modem, _events) = GsmModem::open(near, cfg).await.unwrap();

    let err = modem.command(AtCommand::new("AT+SLOW")).await.unwrap_err();
    assert!(matches!(
        err,
        ModemError::Command(CommandError::Timeout { .. })
    ));

    let response = modem.command(AtCommand::new("AT")).await.unwrap();
    assert!(response.response.contains("OK"));
}

#[tokio::test]
async fn explicit_command_timeout_overrides_the_configured_default() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(far, |command| {
        if command == "AT+SLOW" {
            None
        } else {
            ok()
        }
    });
    // Generous configured budget; the command brings its own short one.
    let cfg = ModemConfig::default().command_timeout(Duration::from_secs(10));
    let (modem, _events) = GsmModem::open(near, cfg).await.unwrap();

    let start = std::time::Instant::now();
    let err = modem
        .command(AtCommand::new("AT+SLOW").with_timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModemError::Command(CommandError::Timeout { .. })
    ));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn zero_chunk_capacity_still_opens() {
    let (near, far) = tokio::io::duplex(4096);
    let _mock = MockModem::spawn(far, stock_responder(vec![]));
    let mut cfg = config();
    cfg.chunk_capacity = 0;
    let (modem, _events) = GsmModem::open(near, cfg).await.unwrap();

    let response = modem.command(AtCommand::new("AT")).await.unwrap();
    assert!(response.response.contains("OK"));
}

#[tokio::test]
async fn concurrent_submissions_run_in_order() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![]));
    let (modem, _events) = GsmModem::open(near, config()).await.unwrap();

    let (a, b) = tokio::join!(
        modem.command(AtCommand::new("AT+FIRST")),
        modem.command(AtCommand::new("AT+SECOND")),
    );
    a.unwrap();
    b.unwrap();

    let log = mock.log();
    assert_eq!(&log[log.len() - 2..], ["AT+FIRST", "AT+SECOND"]);
}

#[tokio::test]
async fn cmti_indication_delivers_the_message() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![(1, HELLO)]));
    let (_modem, mut events) = GsmModem::open(near, config()).await.unwrap();

    mock.inject
        .send("\r\n+CMTI: \"SM\",1\r\n".to_string())
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no event before deadline")
        .expect("event channel closed");
    assert_eq!(message, Message::Single {
        index: 1,
        sender: "+31612345678".to_string(),
        timestamp: message.timestamp(),
        text: "hello".to_string(),
    });
}

#[tokio::test]
async fn cmti_for_an_incomplete_group_stays_silent() {
    let (near, far) = tokio::io::duplex(4096);
    let mock = MockModem::spawn(far, stock_responder(vec![(2, PART_ONE)]));
    let (_modem, mut events) = GsmModem::open(near, config()).await.unwrap();

    mock.inject
        .send("\r\n+CMTI: \"SM\",2\r\n".to_string())
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(300), events.recv()).await;
    assert!(outcome.is_err(), "orphan part must not produce an event");
}
