/*
 * framer.rs
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

//! CRLF line framing over a chunk stream.
//!
//! Only the unsolicited-indication detector consumes framed lines; command
//! classification works on raw chunks, because the `>` prompt arrives with
//! no line terminator at all and would never leave a line framer.

/// Accumulates chunks and yields complete CRLF-terminated lines, carrying
/// any trailing partial line to the next push.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the complete lines it closed, without their
    /// CRLF.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buf.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find("\r\n") {
            lines.push(self.buf[..pos].to_string());
            self.buf.drain(..pos + 2);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_lines_per_chunk() {
        let mut f = LineFramer::new();
        assert_eq!(f.push("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn carries_partial_line_across_chunks() {
        let mut f = LineFramer::new();
        assert!(f.push("+CMTI: \"SM\"").is_empty());
        assert_eq!(f.push(",4\r\n"), vec!["+CMTI: \"SM\",4"]);
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut f = LineFramer::new();
        assert!(f.push("OK\r").is_empty());
        assert_eq!(f.push("\n"), vec!["OK"]);
    }

    #[test]
    fn prompt_without_terminator_stays_buffered() {
        let mut f = LineFramer::new();
        assert!(f.push("> ").is_empty());
    }
}
