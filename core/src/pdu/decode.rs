/*
 * decode.rs
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

//! SMS-DELIVER decoding: SMSC prefix, originating address, data coding
//! scheme, service centre timestamp, optional concatenation header, text.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use super::gsm7;
use super::{hex_to_bytes, ConcatInfo, DecodeError};

/// A decoded SMS-DELIVER TPDU.
#[derive(Debug, Clone)]
pub struct Deliver {
    /// Originating address: digit string, or decoded text for alphanumeric
    /// senders.
    pub sender: String,
    pub alphanumeric_sender: bool,
    /// Service centre timestamp, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    pub text: String,
    /// Present when this PDU is one part of a concatenated message.
    pub concat: Option<ConcatInfo>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| DecodeError::new("PDU truncated"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.bytes.len() {
            return Err(DecodeError::new("PDU truncated"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Decodes one hex SMS-DELIVER PDU as stored by the modem (SMSC prefix
/// included, the `AT+CMGL=4` record format).
pub fn decode_deliver(hex: &str) -> Result<Deliver, DecodeError> {
    let bytes = hex_to_bytes(hex)?;
    let mut c = Cursor::new(&bytes);

    let smsc_len = c.byte()? as usize;
    c.take(smsc_len)?;

    let first = c.byte()?;
    if first & 0x03 != 0x00 {
        return Err(DecodeError::new("not an SMS-DELIVER TPDU"));
    }
    let has_udh = first & 0x40 != 0;

    let addr_digits = c.byte()? as usize;
    let toa = c.byte()?;
    let addr_bytes = c.take((addr_digits + 1) / 2)?;
    // Type-of-number 101 is alphanumeric: the address field holds packed
    // septets, addr_digits counting semi-octets.
    let (sender, alphanumeric_sender) = if toa & 0x70 == 0x50 {
        let septet_count = addr_digits * 4 / 7;
        (gsm7::decode(&gsm7::unpack(addr_bytes, 0, septet_count)), true)
    } else {
        (decode_semi_octets(addr_bytes, addr_digits), false)
    };

    let _pid = c.byte()?;
    let dcs = c.byte()?;
    let timestamp = decode_timestamp(c.take(7)?)?;

    let udl = c.byte()? as usize;
    let ud = c.rest();
    let (concat, header_len) = if has_udh { parse_udh(ud)? } else { (None, 0) };
    let text = decode_user_data(ud, udl, dcs, header_len)?;

    Ok(Deliver {
        sender,
        alphanumeric_sender,
        timestamp,
        text,
        concat,
    })
}

/// Semi-octet digits: low nibble first within each octet, 0xF pads an odd
/// count.
fn decode_semi_octets(bytes: &[u8], digits: usize) -> String {
    let mut out = String::with_capacity(digits);
    for b in bytes {
        out.push(address_digit(b & 0x0F));
        out.push(address_digit(b >> 4));
    }
    out.truncate(digits);
    out
}

fn address_digit(nibble: u8) -> char {
    match nibble {
        0x0A => '*',
        0x0B => '#',
        0x0C => 'a',
        0x0D => 'b',
        0x0E => 'c',
        n => char::from_digit((n % 10) as u32, 10).unwrap_or('0'),
    }
}

fn semi_octet_value(b: u8) -> u32 {
    ((b & 0x0F) * 10 + (b >> 4)) as u32
}

/// Service centre timestamp: yy mm dd hh mm ss tz as swapped semi-octets;
/// the timezone counts quarter hours, sign in bit 3 of its first
/// semi-octet.
fn decode_timestamp(scts: &[u8]) -> Result<DateTime<Utc>, DecodeError> {
    let year = 2000 + semi_octet_value(scts[0]) as i32;
    let month = semi_octet_value(scts[1]);
    let day = semi_octet_value(scts[2]);
    let hour = semi_octet_value(scts[3]);
    let minute = semi_octet_value(scts[4]);
    let second = semi_octet_value(scts[5]);

    let tz = scts[6];
    let quarters = ((tz & 0x07) * 10 + (tz >> 4)) as i64;
    let offset_minutes = if tz & 0x08 != 0 { -quarters * 15 } else { quarters * 15 };

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| DecodeError::new("invalid service centre timestamp"))?;
    Ok(Utc.from_utc_datetime(&(naive - Duration::minutes(offset_minutes))))
}

/// Parses the user data header; returns the concatenation info (if any)
/// and the header length in octets, UDHL byte included.
fn parse_udh(ud: &[u8]) -> Result<(Option<ConcatInfo>, usize), DecodeError> {
    let udhl = *ud.first().ok_or_else(|| DecodeError::new("missing user data header"))? as usize;
    if 1 + udhl > ud.len() {
        return Err(DecodeError::new("user data header truncated"));
    }
    let mut concat = None;
    let mut i = 1;
    let end = 1 + udhl;
    while i + 1 < end {
        let iei = ud[i];
        let ie_len = ud[i + 1] as usize;
        if i + 2 + ie_len > end {
            return Err(DecodeError::new("information element overruns header"));
        }
        let data = &ud[i + 2..i + 2 + ie_len];
        match (iei, ie_len) {
            (0x00, 3) => {
                concat = Some(ConcatInfo {
                    reference: data[0] as u16,
                    part_count: data[1],
                    part_number: data[2],
                });
            }
            (0x08, 4) => {
                concat = Some(ConcatInfo {
                    reference: u16::from_be_bytes([data[0], data[1]]),
                    part_count: data[2],
                    part_number: data[3],
                });
            }
            // Other elements (ports, WAP, …) are not our business.
            _ => {}
        }
        i += 2 + ie_len;
    }
    Ok((concat, end))
}

fn decode_user_data(
    ud: &[u8],
    udl: usize,
    dcs: u8,
    header_len: usize,
) -> Result<String, DecodeError> {
    match dcs & 0x0C {
        // UCS-2: udl counts octets, header included.
        0x08 => {
            let body = ud
                .get(header_len..udl)
                .ok_or_else(|| DecodeError::new("user data truncated"))?;
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        }
        // 8-bit data: surfaced byte-per-char so nothing is lost silently.
        0x04 => {
            let body = ud
                .get(header_len..udl)
                .ok_or_else(|| DecodeError::new("user data truncated"))?;
            Ok(body.iter().map(|&b| char::from(b)).collect())
        }
        // Default 7-bit: udl counts septets, header and fill bits included.
        _ => {
            let header_bits = header_len * 8;
            let fill = (7 - header_bits % 7) % 7;
            let header_septets = (header_bits + fill) / 7;
            let count = udl
                .checked_sub(header_septets)
                .ok_or_else(|| DecodeError::new("user data length below header size"))?;
            let body = &ud[header_len.min(ud.len())..];
            let septets = gsm7::unpack(body, fill, count);
            if septets.len() < count {
                return Err(DecodeError::new("user data truncated"));
            }
            Ok(gsm7::decode(&septets))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hand-assembled DELIVER from +31612345678, 2026-08-27 12:00:00 +02:00,
    // GSM7 text "hello":
    //   00                SMSC: default
    //   04                first octet: DELIVER, no UDH
    //   0B 91             OA: 11 digits, international
    //   1316325476F8      31612345678 as swapped semi-octets
    //   00 00             PID, DCS (7-bit)
    //   62807221000080    SCTS: 26 08 27 12 00 00, +8 quarter hours
    //   05 E8329BFD06     UDL 5 septets, "hello"
    const HELLO: &str = "00040B911316325476F800006280722100008005E8329BFD06";

    #[test]
    fn decodes_plain_deliver() {
        let d = decode_deliver(HELLO).unwrap();
        assert_eq!(d.sender, "31612345678");
        assert!(!d.alphanumeric_sender);
        assert_eq!(d.text, "hello");
        assert!(d.concat.is_none());
        assert_eq!(
            d.timestamp,
            Utc.with_ymd_and_hms(2026, 8, 27, 10, 0, 0).unwrap()
        );
    }

    // Same envelope with UDHI set (0x44) and a 5-octet concat header
    // 00 03 42 02 01 (ref 0x42, part 1 of 2). The 48 header bits plus one
    // fill bit are 7 septets, so UDL is 9 for the two text septets "AB"
    // packed as 82 42.
    const PART_ONE: &str = "00440B911316325476F8000062807221000080090500034202018242";
    const PART_TWO: &str = "00440B911316325476F8000062807221000080090500034202028644";

    #[test]
    fn decodes_concatenated_parts() {
        let one = decode_deliver(PART_ONE).unwrap();
        assert_eq!(one.text, "AB");
        assert_eq!(
            one.concat,
            Some(ConcatInfo { reference: 0x42, part_count: 2, part_number: 1 })
        );

        let two = decode_deliver(PART_TWO).unwrap();
        assert_eq!(two.text, "CD");
        assert_eq!(two.concat.unwrap().part_number, 2);
    }

    // 16-bit reference variant: IEI 0x08, header 00 08 04 01 02 02 01 is
    // 7 octets (UDHL 6), 56 bits exactly 8 septets, no fill. UDL 10.
    #[test]
    fn decodes_sixteen_bit_reference() {
        let pdu = "00440B911316325476F80000628072210000800A060804010202014121";
        let d = decode_deliver(pdu).unwrap();
        assert_eq!(
            d.concat,
            Some(ConcatInfo { reference: 0x0102, part_count: 2, part_number: 1 })
        );
        assert_eq!(d.text, "AB");
    }

    // UCS-2: DCS 08, UDL 4 octets, "hi" as 0068 0069.
    #[test]
    fn decodes_ucs2_text() {
        let pdu = "00040B911316325476F80008628072210000800400680069";
        let d = decode_deliver(pdu).unwrap();
        assert_eq!(d.text, "hi");
    }

    // Alphanumeric sender: TON 101, 4 semi-octets of packed septets
    // ("AB" packs to 41 21).
    #[test]
    fn decodes_alphanumeric_sender() {
        let pdu = "000404D041210000628072210000800141";
        let d = decode_deliver(pdu).unwrap();
        assert_eq!(d.sender, "AB");
        assert!(d.alphanumeric_sender);
        assert_eq!(d.text, "A");
    }

    #[test]
    fn negative_timezone_moves_forward_to_utc() {
        // tz octet 0x48: sign bit set, 4 quarters = -1h; local 12:00 is
        // 13:00 UTC.
        let pdu = "00040B911316325476F800006280722100004805E8329BFD06";
        let d = decode_deliver(pdu).unwrap();
        assert_eq!(
            d.timestamp,
            Utc.with_ymd_and_hms(2026, 8, 27, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn truncated_pdu_is_an_error() {
        assert!(decode_deliver("00040B91").is_err());
    }

    // UDL overstating the data present is an error in every coding
    // scheme, never a silently shortened text.
    #[test]
    fn short_user_data_is_an_error_for_all_codings() {
        // UCS-2: UDL 6, four octets of data.
        assert!(decode_deliver("00040B911316325476F80008628072210000800600680069").is_err());
        // 8-bit: UDL 3, one octet of data.
        assert!(decode_deliver("00040B911316325476F80004628072210000800341").is_err());
        // 7-bit: UDL 5, one octet of data.
        assert!(decode_deliver("00040B911316325476F800006280722100008005E8").is_err());
    }

    #[test]
    fn submit_tpdu_is_rejected() {
        // First octet 0x01 is SMS-SUBMIT.
        assert!(decode_deliver("0001000B911316325476F8000005E8329BFD06").is_err());
    }
}
