//! Textual form of a decoded property list and the scan for PNG byte strings.
//!
//! Byte strings are rendered as `b'...'` literals with backslash escapes, so
//! an embedded PNG shows up as `b'\x89PNG\r\n\x1a\n...'`. The scan is a
//! heuristic over that text: a candidate runs from the escaped signature up
//! to the first `\x82'`, the last byte of the IEND chunk CRC when the blob
//! ends with a complete PNG. Blobs that do not end there run on into the
//! next literal closing with `\x82'`, and the IEND chunk itself is never
//! checked, so a candidate is not guaranteed to be a whole PNG.
//!
//! Byte strings are always quoted with `'`, escaping any `'` inside. A
//! renderer that switched to `b"..."` for data holding `'` but no `"` would
//! hide such blobs from the scan; fixed quoting keeps them visible.

use crate::error::Result;
use chrono::{DateTime, Utc};
use plist::Value;
use regex::Regex;
use std::fmt::Write;
use std::time::SystemTime;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const FRAGMENT_PATTERN: &str = r"(?s)b'\\x89PNG\\r\\n\\x1a\\n.*?\\x82'";

pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Dictionary(dict) => {
            out.push('{');
            for (i, (key, item)) in dict.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_str(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Data(bytes) => write_data(out, bytes),
        Value::String(s) => write_str(out, s),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => {
            if let Some(signed) = n.as_signed() {
                let _ = write!(out, "{}", signed);
            } else if let Some(unsigned) = n.as_unsigned() {
                let _ = write!(out, "{}", unsigned);
            }
        }
        Value::Real(r) => {
            let _ = write!(out, "{:?}", r);
        }
        Value::Date(date) => {
            let time: SystemTime = date.clone().into();
            let _ = write!(out, "Date({})", DateTime::<Utc>::from(time).to_rfc3339());
        }
        Value::Uid(uid) => {
            let _ = write!(out, "Uid({})", uid.get());
        }
        _ => out.push_str("None"),
    }
}

fn write_data(out: &mut String, bytes: &[u8]) {
    out.push_str("b'");
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", byte);
            }
        }
    }
    out.push('\'');
}

fn write_str(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() && (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

pub struct FragmentMatcher {
    pattern: Regex,
}

impl FragmentMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(FRAGMENT_PATTERN)?,
        })
    }

    /// Non-overlapping candidates in the order they appear in `dump`, with
    /// their escape sequences intact.
    pub fn find_fragments<'a>(&self, dump: &'a str) -> Vec<&'a str> {
        self.pattern.find_iter(dump).map(|m| m.as_str()).collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    png.extend_from_slice(&[0, 0, 0, 13]);
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0, 0x1f, 0x15, 0xc4, 0x89]);
    png.extend_from_slice(&[0, 0, 0, 0]);
    png.extend_from_slice(b"IEND");
    png.extend_from_slice(&[0xae, 0x42, 0x60, 0x82]);
    png
}
