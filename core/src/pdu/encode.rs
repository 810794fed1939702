/*
 * encode.rs
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

//! SMS-SUBMIT encoding with multipart segmentation.
//!
//! Texts that fit the GSM 7-bit default alphabet go out as 7-bit (160
//! septets per single message, 153 per concatenated part); anything else
//! as UCS-2 (70 / 67 UTF-16 units). Segments never split an escape pair
//! or a surrogate pair.

use super::gsm7::{self, Gsm7Char};
use super::{bytes_to_hex, EncodeError};

const SINGLE_SEPTETS: usize = 160;
const PART_SEPTETS: usize = 153;
const SINGLE_UCS2_UNITS: usize = 70;
const PART_UCS2_UNITS: usize = 67;

/// One wire-ready PDU: hex string with the leading `00` default-SMSC
/// octet, plus the TPDU octet count `AT+CMGS=<n>` announces (the PDU
/// without its SMSC prefix).
#[derive(Debug, Clone)]
pub struct OutgoingPdu {
    pub hex: String,
    pub tpdu_len: usize,
}

enum Segment {
    Gsm7(Vec<u8>),
    Ucs2(Vec<u16>),
}

/// Encodes `text` for `recipient` into one or more SUBMIT PDUs, in send
/// order. Multipart sends share a random 8-bit concatenation reference.
pub fn encode_submit(recipient: &str, text: &str) -> Result<Vec<OutgoingPdu>, EncodeError> {
    let digits: String = recipient.trim().trim_start_matches('+').to_string();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(EncodeError::new(format!(
            "recipient {:?} is not a phone number",
            recipient
        )));
    }

    let segments = match encode_gsm7(text) {
        Some(septets) => split_gsm7(septets),
        None => split_ucs2(text),
    };

    let total = segments.len() as u8;
    let reference: u8 = rand::random();
    Ok(segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let udh = if total > 1 {
                Some((reference, total, (i + 1) as u8))
            } else {
                None
            };
            build_pdu(&digits, segment, udh)
        })
        .collect())
}

/// Per-character septet runs, or None when any character falls outside the
/// default alphabet.
fn encode_gsm7(text: &str) -> Option<Vec<Vec<u8>>> {
    text.chars()
        .map(|c| {
            gsm7::encode_char(c).map(|g| match g {
                Gsm7Char::Single(s) => vec![s],
                Gsm7Char::Extended(s) => vec![gsm7::ESCAPE, s],
            })
        })
        .collect()
}

fn split_gsm7(chars: Vec<Vec<u8>>) -> Vec<Segment> {
    let total: usize = chars.iter().map(Vec::len).sum();
    if total <= SINGLE_SEPTETS {
        return vec![Segment::Gsm7(chars.concat())];
    }
    let mut segments = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    for run in chars {
        if current.len() + run.len() > PART_SEPTETS {
            segments.push(Segment::Gsm7(std::mem::take(&mut current)));
        }
        current.extend(run);
    }
    if !current.is_empty() {
        segments.push(Segment::Gsm7(current));
    }
    segments
}

fn split_ucs2(text: &str) -> Vec<Segment> {
    let chars: Vec<Vec<u16>> = text
        .chars()
        .map(|c| {
            let mut buf = [0u16; 2];
            c.encode_utf16(&mut buf).to_vec()
        })
        .collect();
    let total: usize = chars.iter().map(Vec::len).sum();
    if total <= SINGLE_UCS2_UNITS {
        return vec![Segment::Ucs2(chars.concat())];
    }
    let mut segments = Vec::new();
    let mut current: Vec<u16> = Vec::new();
    for run in chars {
        if current.len() + run.len() > PART_UCS2_UNITS {
            segments.push(Segment::Ucs2(std::mem::take(&mut current)));
        }
        current.extend(run);
    }
    if !current.is_empty() {
        segments.push(Segment::Ucs2(current));
    }
    segments
}

fn build_pdu(digits: &str, segment: Segment, udh: Option<(u8, u8, u8)>) -> OutgoingPdu {
    let mut tpdu = Vec::with_capacity(140 + 16);
    // SMS-SUBMIT, no validity period; UDHI when concatenated.
    tpdu.push(0x01 | if udh.is_some() { 0x40 } else { 0x00 });
    // Message reference: let the modem assign one.
    tpdu.push(0x00);
    tpdu.push(digits.len() as u8);
    // Destination type: international E.164.
    tpdu.push(0x91);
    tpdu.extend(encode_semi_octets(digits));
    // Protocol identifier.
    tpdu.push(0x00);

    let header: Vec<u8> = match udh {
        Some((reference, count, part)) => vec![0x05, 0x00, 0x03, reference, count, part],
        None => Vec::new(),
    };

    match segment {
        Segment::Gsm7(septets) => {
            tpdu.push(0x00); // DCS: default alphabet
            let header_bits = header.len() * 8;
            let fill = (7 - header_bits % 7) % 7;
            let udl = (header_bits + fill) / 7 + septets.len();
            tpdu.push(udl as u8);
            tpdu.extend(&header);
            tpdu.extend(gsm7::pack(&septets, fill));
        }
        Segment::Ucs2(units) => {
            tpdu.push(0x08); // DCS: UCS-2
            let udl = header.len() + units.len() * 2;
            tpdu.push(udl as u8);
            tpdu.extend(&header);
            for unit in units {
                tpdu.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }

    let tpdu_len = tpdu.len();
    let mut pdu = Vec::with_capacity(tpdu_len + 1);
    // Default SMSC from the SIM.
    pdu.push(0x00);
    pdu.extend(tpdu);
    OutgoingPdu {
        hex: bytes_to_hex(&pdu),
        tpdu_len,
    }
}

/// Digits packed low-nibble-first, odd counts padded with 0xF.
fn encode_semi_octets(digits: &str) -> Vec<u8> {
    let nibbles: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let mut out = Vec::with_capacity((nibbles.len() + 1) / 2);
    for pair in nibbles.chunks(2) {
        let low = pair[0];
        let high = pair.get(1).copied().unwrap_or(0x0F);
        out.push((high << 4) | low);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_gsm7_message() {
        let pdus = encode_submit("+31612345678", "hello").unwrap();
        assert_eq!(pdus.len(), 1);
        // 00 | 01 00 0B 91 1316325476F8 00 00 05 E8329BFD06
        assert_eq!(pdus[0].hex, "0001000B911316325476F8000005E8329BFD06");
        assert_eq!(pdus[0].tpdu_len, 18);
    }

    #[test]
    fn ucs2_selected_for_non_gsm7_text() {
        let pdus = encode_submit("31612345678", "hi\u{4e2d}").unwrap();
        assert_eq!(pdus.len(), 1);
        // DCS 08, UDL 6, BE units 0068 0069 4E2D.
        assert_eq!(pdus[0].hex, "0001000B911316325476F8000806006800694E2D");
    }

    #[test]
    fn long_text_splits_with_concat_headers() {
        let text = "a".repeat(161);
        let pdus = encode_submit("+31612345678", &text).unwrap();
        assert_eq!(pdus.len(), 2);
        for (i, pdu) in pdus.iter().enumerate() {
            // UDHI set on every part.
            assert!(pdu.hex.starts_with("0041"));
            // 05 00 03 <ref> 02 <part> at the UDH position.
            let udh = &pdu.hex[28..40];
            assert_eq!(&udh[0..6], "050003");
            assert_eq!(&udh[8..10], "02");
            assert_eq!(udh[10..12].parse::<u8>().unwrap(), (i + 1) as u8);
        }
        // Part one carries 153 septets: UDL = 7 + 153 = 160 = 0xA0.
        assert_eq!(&pdus[0].hex[26..28], "A0");
        // Part two the remaining 8: UDL = 7 + 8 = 15.
        assert_eq!(&pdus[1].hex[26..28], "0F");
        // Same reference on both parts.
        assert_eq!(&pdus[0].hex[34..36], &pdus[1].hex[34..36]);
    }

    #[test]
    fn escape_pairs_are_not_split_across_parts() {
        // 152 'a', then '€' (an escape pair) that would land on the
        // 153-septet part boundary, then enough text to force multipart.
        let text = format!("{}€{}", "a".repeat(152), "b".repeat(10));
        let pdus = encode_submit("31612345678", &text).unwrap();
        assert_eq!(pdus.len(), 2);
        // The euro moved whole to part two: part one is 152 septets,
        // UDL = 7 + 152 = 159 = 0x9F.
        assert_eq!(&pdus[0].hex[26..28], "9F");
        // Part two: escape pair plus ten 'b', UDL = 7 + 12 = 19.
        assert_eq!(&pdus[1].hex[26..28], "13");
    }

    #[test]
    fn odd_digit_count_is_f_padded() {
        let pdus = encode_submit("316123456", "x").unwrap();
        // 09 digits, 91, then 13 16 32 54 F6.
        assert!(pdus[0].hex.starts_with("000100099113163254F6"));
    }

    #[test]
    fn bad_recipient_is_rejected() {
        assert!(encode_submit("", "hi").is_err());
        assert!(encode_submit("call-me", "hi").is_err());
    }

    #[test]
    fn tpdu_len_excludes_smsc_prefix() {
        let pdus = encode_submit("+31612345678", "hello").unwrap();
        assert_eq!(pdus[0].tpdu_len, pdus[0].hex.len() / 2 - 1);
    }
}
