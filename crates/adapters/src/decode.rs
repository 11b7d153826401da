// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental decoding of raw process output into display lines.
//!
//! Child processes write whatever their console encoding produces. The
//! decoder sniffs a byte-order mark on the first bytes of a stream:
//! UTF-16 LE/BE marks switch to UTF-16 decoding, anything else is read as
//! UTF-8 with invalid sequences replaced. Each emitted line has its line
//! terminator removed, ANSI escape sequences stripped and control
//! characters other than tab dropped. A bare `\r` starts a new line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Splits a byte stream into cleaned text lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    encoding: Option<Encoding>,
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns every line completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let Some(encoding) = self.sniff() else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        while let Some(raw) = self.take_line(encoding) {
            lines.extend(clean_line(&raw));
        }
        lines
    }

    /// Flush the trailing partial line at end of stream.
    pub fn finish(mut self) -> Vec<String> {
        let encoding = self.sniff().unwrap_or(Encoding::Utf8);
        let mut lines = Vec::new();
        while let Some(raw) = self.take_line(encoding) {
            lines.extend(clean_line(&raw));
        }
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            lines.extend(clean_line(&decode(encoding, &rest)));
        }
        lines
    }

    /// Detect the encoding once enough bytes have arrived to rule out a BOM.
    fn sniff(&mut self) -> Option<Encoding> {
        if let Some(encoding) = self.encoding {
            return Some(encoding);
        }
        let p = &self.pending;
        let encoding = if p.starts_with(UTF8_BOM) {
            self.pending.drain(..UTF8_BOM.len());
            Encoding::Utf8
        } else if p.starts_with(UTF16LE_BOM) {
            self.pending.drain(..UTF16LE_BOM.len());
            Encoding::Utf16Le
        } else if p.starts_with(UTF16BE_BOM) {
            self.pending.drain(..UTF16BE_BOM.len());
            Encoding::Utf16Be
        } else if p.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(p) {
            return None;
        } else if p.len() < UTF16LE_BOM.len()
            && (UTF16LE_BOM.starts_with(p) || UTF16BE_BOM.starts_with(p))
        {
            return None;
        } else {
            Encoding::Utf8
        };
        self.encoding = Some(encoding);
        Some(encoding)
    }

    /// Remove one `\n`-terminated line from the buffer, without the terminator.
    fn take_line(&mut self, encoding: Encoding) -> Option<String> {
        match encoding {
            Encoding::Utf8 => {
                let pos = self.pending.iter().position(|b| *b == b'\n')?;
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                Some(decode(encoding, &line[..pos]))
            }
            Encoding::Utf16Le | Encoding::Utf16Be => {
                let unit = self
                    .pending
                    .chunks_exact(2)
                    .position(|pair| to_u16(encoding, pair) == u16::from(b'\n'))?;
                let end = unit * 2;
                let line: Vec<u8> = self.pending.drain(..end + 2).collect();
                Some(decode(encoding, &line[..end]))
            }
        }
    }
}

fn to_u16(encoding: Encoding, pair: &[u8]) -> u16 {
    match (encoding, pair) {
        (Encoding::Utf16Be, [hi, lo]) => u16::from_be_bytes([*hi, *lo]),
        (_, [lo, hi]) => u16::from_le_bytes([*lo, *hi]),
        _ => 0,
    }
}

fn decode(encoding: Encoding, bytes: &[u8]) -> String {
    match encoding {
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| to_u16(encoding, pair))
                .collect();
            String::from_utf16_lossy(&units)
        }
    }
}

/// Normalize one decoded line into zero or more display lines.
fn clean_line(raw: &str) -> Vec<String> {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    raw.split('\r').map(strip_controls).collect()
}

/// Drop ANSI escape sequences and control characters other than tab.
pub fn strip_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.next() {
                // CSI: parameters and intermediates up to a final byte in @..~
                Some('[') => {
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: terminated by BEL or ST (ESC \)
                Some(']') => {
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if c == '\t' || !c.is_control() {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
