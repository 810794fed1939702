/*
 * gsm7.rs
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

//! GSM 03.38 default 7-bit alphabet and septet packing.
//!
//! Septets are packed LSB-first; a user data header that is not a whole
//! number of septets long is followed by fill bits so the text starts on a
//! septet boundary.

pub const ESCAPE: u8 = 0x1B;

/// Default alphabet, septet value -> character. Position 27 is the escape
/// to the extension table and never decodes on its own.
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Extension table (escape-prefixed), septet value -> character.
const EXTENSION: &[(u8, char)] = &[
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Encoding of one character: a bare septet or an escape pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gsm7Char {
    Single(u8),
    Extended(u8),
}

impl Gsm7Char {
    /// Number of septets this character occupies.
    pub fn septets(self) -> usize {
        match self {
            Gsm7Char::Single(_) => 1,
            Gsm7Char::Extended(_) => 2,
        }
    }
}

/// Maps a character into the default alphabet, or None when the message
/// needs UCS-2.
pub fn encode_char(c: char) -> Option<Gsm7Char> {
    if c == '\u{1b}' {
        return None;
    }
    if let Some(pos) = BASIC.iter().position(|&b| b == c) {
        return Some(Gsm7Char::Single(pos as u8));
    }
    EXTENSION
        .iter()
        .find(|(_, ext)| *ext == c)
        .map(|(septet, _)| Gsm7Char::Extended(*septet))
}

/// Decodes a septet sequence, resolving escape pairs. An escape before an
/// unknown septet falls back to the basic table, an escape at the end of
/// the data is dropped.
pub fn decode(septets: &[u8]) -> String {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&s) = iter.next() {
        if s == ESCAPE {
            match iter.next() {
                Some(&ext) => match EXTENSION.iter().find(|(v, _)| *v == ext) {
                    Some((_, c)) => out.push(*c),
                    None => out.push(BASIC[(ext & 0x7F) as usize]),
                },
                None => {}
            }
        } else {
            out.push(BASIC[(s & 0x7F) as usize]);
        }
    }
    out
}

/// Packs septets LSB-first after `fill_bits` zero bits.
pub fn pack(septets: &[u8], fill_bits: usize) -> Vec<u8> {
    let total_bits = fill_bits + septets.len() * 7;
    let mut out = vec![0u8; (total_bits + 7) / 8];
    let mut bit = fill_bits;
    for &s in septets {
        let byte = bit / 8;
        let shift = bit % 8;
        out[byte] |= ((s as u16) << shift) as u8;
        if shift > 1 && byte + 1 < out.len() {
            out[byte + 1] |= s >> (8 - shift);
        }
        bit += 7;
    }
    out
}

/// Unpacks `count` septets starting `fill_bits` into `data`. Fails only by
/// returning fewer septets when the data runs short; the caller validates
/// lengths beforehand.
pub fn unpack(data: &[u8], fill_bits: usize, count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    let mut bit = fill_bits;
    for _ in 0..count {
        let byte = bit / 8;
        let shift = bit % 8;
        if byte >= data.len() {
            break;
        }
        let mut septet = (data[byte] as u16) >> shift;
        if shift > 1 {
            if let Some(&next) = data.get(byte + 1) {
                septet |= (next as u16) << (8 - shift);
            }
        }
        out.push((septet & 0x7F) as u8);
        bit += 7;
    }
    out
}
