/*
 * listing.rs
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

//! `AT+CMGL` response parsing.
//!
//! A `+CMGL:` header line opens a record (slot index is the first
//! comma-separated, quote-stripped field); every following line is a
//! payload fragment appended whitespace-stripped until the next header.
//! Continuation lines before any header violate the record format and are
//! ignored rather than fatal.

use super::message::RawPduRecord;

const HEADER: &str = "+CMGL:";

pub(crate) fn parse_cmgl_response(response: &str) -> Vec<RawPduRecord> {
    let mut records = Vec::new();
    let mut current: Option<RawPduRecord> = None;

    for line in response.split("\r\n") {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(HEADER) {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let index_field = rest.split(',').next().unwrap_or("").trim().trim_matches('"');
            match index_field.parse::<u32>() {
                Ok(index) => {
                    current = Some(RawPduRecord {
                        index,
                        hex_payload: String::new(),
                    })
                }
                Err(_) => current = None,
            }
        } else if line == "OK" || line.contains("ERROR") || line.starts_with("AT+") {
            // Command echo and terminal status, not record data.
            continue;
        } else if let Some(record) = current.as_mut() {
            record
                .hex_payload
                .extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if let Some(record) = current.take() {
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_with_continuations() {
        let response = "AT+CMGL=4\r\n+CMGL: 1,1,,25\r\n0004AB\r\nCDEF\r\n+CMGL: 2,1,,25\r\n1234\r\nOK\r\n";
        let records = parse_cmgl_response(response);
        assert_eq!(
            records,
            vec![
                RawPduRecord { index: 1, hex_payload: "0004ABCDEF".to_string() },
                RawPduRecord { index: 2, hex_payload: "1234".to_string() },
            ]
        );
    }

    #[test]
    fn strips_quotes_from_index_field() {
        let records = parse_cmgl_response("+CMGL: \"3\",\"REC UNREAD\",,25\r\nAA\r\nOK\r\n");
        assert_eq!(records[0].index, 3);
    }

    #[test]
    fn continuation_before_header_is_ignored() {
        let records = parse_cmgl_response("DEADBEEF\r\n+CMGL: 1,1,,4\r\nAA\r\nOK\r\n");
        assert_eq!(
            records,
            vec![RawPduRecord { index: 1, hex_payload: "AA".to_string() }]
        );
    }

    #[test]
    fn interior_whitespace_is_stripped_from_payload() {
        let records = parse_cmgl_response("+CMGL: 1,1,,4\r\nAA BB\tCC\r\nOK\r\n");
        assert_eq!(records[0].hex_payload, "AABBCC");
    }

    #[test]
    fn unparsable_header_drops_following_continuations() {
        let records = parse_cmgl_response("+CMGL: x,1,,4\r\nAA\r\n+CMGL: 2,1,,4\r\nBB\r\nOK\r\n");
        assert_eq!(
            records,
            vec![RawPduRecord { index: 2, hex_payload: "BB".to_string() }]
        );
    }

    #[test]
    fn empty_listing_yields_no_records() {
        assert!(parse_cmgl_response("AT+CMGL=4\r\nOK\r\n").is_empty());
    }
}
