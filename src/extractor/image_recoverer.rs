use crate::error::{PlistPngError, Result};
use crate::extractor::text_dump::PNG_SIGNATURE;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the signature sits in a decoded fragment: right after the `b'`
/// that opens the literal.
pub const SIGNATURE_OFFSET: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Discarded { reason: String },
}

/// Reverses the backslash escaping of a fragment, one output byte per input
/// byte outside an escape.
///
/// Unknown escapes and escapes with missing digits are kept verbatim. An
/// escape above 0xFF has no single-byte form and makes the whole fragment
/// malformed.
pub fn decode_escaped(fragment: &str) -> Result<Vec<u8>> {
    let input = fragment.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'\\' || i + 1 >= input.len() {
            out.push(byte);
            i += 1;
            continue;
        }

        let escape = input[i + 1];
        let simple = match escape {
            b'\n' => Some(None),
            b'\\' => Some(Some(b'\\')),
            b'\'' => Some(Some(b'\'')),
            b'"' => Some(Some(b'"')),
            b'a' => Some(Some(0x07)),
            b'b' => Some(Some(0x08)),
            b'f' => Some(Some(0x0c)),
            b'n' => Some(Some(b'\n')),
            b'r' => Some(Some(b'\r')),
            b't' => Some(Some(b'\t')),
            b'v' => Some(Some(0x0b)),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.extend(decoded);
            i += 2;
            continue;
        }

        match escape {
            b'0'..=b'7' => {
                let digits = count_digits(&input[i + 1..], 3, |b| (b'0'..=b'7').contains(&b));
                let value = parse_radix(&input[i + 1..i + 1 + digits], 8);
                if value > 0xff {
                    return Err(wide_escape(i, value));
                }
                out.push(value as u8);
                i += 1 + digits;
            }
            b'x' | b'u' | b'U' => {
                let width = match escape {
                    b'x' => 2,
                    b'u' => 4,
                    _ => 8,
                };
                let start = i + 2;
                let digits = count_digits(&input[start..], width, |b| b.is_ascii_hexdigit());
                if digits < width {
                    out.push(byte);
                    i += 1;
                    continue;
                }

                let value = parse_radix(&input[start..start + width], 16);
                if value > 0xff {
                    return Err(wide_escape(i, value));
                }
                out.push(value as u8);
                i = start + width;
            }
            _ => {
                out.push(byte);
                i += 1;
            }
        }
    }

    Ok(out)
}

fn wide_escape(offset: usize, value: u32) -> PlistPngError {
    PlistPngError::MalformedFragment {
        reason: format!(
            "escape at offset {} encodes U+{:04X}, which does not fit in a byte",
            offset, value
        ),
    }
}

fn count_digits(input: &[u8], max: usize, is_digit: impl Fn(u8) -> bool) -> usize {
    input.iter().take(max).take_while(|&&b| is_digit(b)).count()
}

fn parse_radix(digits: &[u8], radix: u32) -> u32 {
    digits.iter().fold(0u32, |acc, &b| {
        acc * radix + (b as char).to_digit(radix).unwrap_or(0)
    })
}

pub fn has_png_signature(decoded: &[u8]) -> bool {
    decoded
        .get(SIGNATURE_OFFSET..)
        .is_some_and(|rest| rest.starts_with(&PNG_SIGNATURE))
}

/// Turns fragments back into image files. Fragments that do not decode to
/// a PNG signature are discarded, never reported as errors.
pub struct ImageRecoverer;

impl ImageRecoverer {
    pub fn new() -> Self {
        Self
    }

    pub fn output_name(base_name: &str, index: usize) -> String {
        format!("{}_output{}.png", base_name, index)
    }

    /// Writes every byte from the signature onward, the closing quote of the
    /// literal included, to `dest`.
    pub fn recover(&self, fragment: &str, dest: &Path) -> Result<RecoveryOutcome> {
        let decoded = match decode_escaped(fragment) {
            Ok(decoded) => decoded,
            Err(PlistPngError::MalformedFragment { reason }) => {
                return Ok(RecoveryOutcome::Discarded { reason });
            }
            Err(e) => return Err(e),
        };

        if !has_png_signature(&decoded) {
            return Ok(RecoveryOutcome::Discarded {
                reason: "decoded bytes do not start with the PNG signature".to_string(),
            });
        }

        let image = &decoded[SIGNATURE_OFFSET..];
        fs::write(dest, image)?;

        Ok(RecoveryOutcome::Saved {
            path: dest.to_path_buf(),
            bytes: image.len() as u64,
        })
    }
}

impl Default for ImageRecoverer {
    fn default() -> Self {
        Self::new()
    }
}
