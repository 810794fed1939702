/*
 * reassembly.rs
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

//! Multipart reassembly over one listing snapshot.
//!
//! Duplicate records (same sender, text and concatenation header) collapse
//! to the first seen. Concatenated parts group by reference; a group is
//! emitted only when every part number 1..=count is present, otherwise the
//! whole group is withheld until a later listing completes it. Records that
//! failed to decode ride along with their slot index.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::SenderFormat;

use super::message::{DecodedMessage, DecodedRecord, Listing, Message, UndecodableRecord};

/// Assembles one listing's decoded records into logical messages.
pub fn reassemble(records: &[DecodedRecord], sender_format: &SenderFormat) -> Listing {
    let mut listing = Listing::default();
    let mut seen: HashSet<(String, String, Option<(u16, u8, u8)>)> = HashSet::new();
    let mut unique: Vec<&DecodedMessage> = Vec::new();

    for record in records {
        match record {
            DecodedRecord::Failed { index, reason } => {
                listing.undecodable.push(UndecodableRecord {
                    index: *index,
                    reason: reason.clone(),
                });
            }
            DecodedRecord::Text(m) => {
                let key = (
                    m.sender.clone(),
                    m.text.clone(),
                    m.concat
                        .map(|c| (c.reference, c.part_count, c.part_number)),
                );
                if seen.insert(key) {
                    unique.push(m);
                }
            }
        }
    }

    // Parts keyed by reference, then part number; first record wins a
    // contested part number.
    let mut groups: HashMap<u16, BTreeMap<u8, &DecodedMessage>> = HashMap::new();
    for m in &unique {
        if let Some(concat) = m.concat {
            groups
                .entry(concat.reference)
                .or_default()
                .entry(concat.part_number)
                .or_insert(*m);
        }
    }

    let mut emitted_refs: HashSet<u16> = HashSet::new();
    for m in unique {
        let concat = match m.concat {
            None => {
                listing.messages.push(Message::Single {
                    index: m.index,
                    sender: sender_format.display(&m.sender, m.alphanumeric_sender),
                    timestamp: m.timestamp,
                    text: m.text.clone(),
                });
                continue;
            }
            Some(c) => c,
        };
        if !emitted_refs.insert(concat.reference) {
            continue;
        }
        let parts = &groups[&concat.reference];
        // Trust the first part's announced count where we have it.
        let count = parts
            .get(&1)
            .map(|p| p.concat.map(|c| c.part_count).unwrap_or(0))
            .unwrap_or(concat.part_count);
        if count == 0 || !(1..=count).all(|n| parts.contains_key(&n)) {
            continue;
        }
        let first = parts[&1];
        let mut text = String::new();
        let mut part_indexes = Vec::with_capacity(count as usize);
        for n in 1..=count {
            text.push_str(&parts[&n].text);
            part_indexes.push(parts[&n].index);
        }
        listing.messages.push(Message::Concatenated {
            part_indexes,
            sender: sender_format.display(&first.sender, first.alphanumeric_sender),
            timestamp: first.timestamp,
            text,
        });
    }
    listing
}
