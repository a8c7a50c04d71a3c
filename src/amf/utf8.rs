//! Modified UTF-8 string decoding
//!
//! AMF3 strings use the Java `DataInput` flavour of UTF-8: 1-, 2- and 3-byte
//! sequences only. Supplementary characters arrive as a surrogate pair, each
//! half encoded as its own 3-byte sequence, and overlong forms (notably
//! `0xC0 0x80` for NUL) are accepted. A surrogate without its other half
//! cannot be held in a `str` and decodes to U+FFFD.
//!
//! Byte patterns:
//! ```text
//! 0xxxxxxx                      U+0000 - U+007F
//! 110xxxxx 10xxxxxx             U+0000 - U+07FF
//! 1110xxxx 10xxxxxx 10xxxxxx    U+0000 - U+FFFF
//! 11110xxx 10xxxxxx 10xxxxxx 10xxxxxx  (only with `allow_four_byte`)
//! ```

use crate::error::AmfError;

/// Decode a modified UTF-8 byte run
///
/// A leading byte outside the accepted patterns, a continuation byte not
/// shaped `10xxxxxx` or a truncated sequence fails with
/// [`AmfError::InvalidUtf8`]. Nothing is returned on failure. Unpaired
/// surrogates become U+FFFD.
pub fn decode_modified_utf8(bytes: &[u8], allow_four_byte: bool) -> Result<String, AmfError> {
    // Pure ASCII is common enough to skip the per-byte loop
    if bytes.is_ascii() {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let mut out = String::with_capacity(bytes.len());
    let mut pending_high: Option<u32> = None;
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i] as u32;
        i += 1;

        let unit = match c >> 4 {
            0..=7 => c,
            12 | 13 => {
                let c2 = continuation(bytes, i, start)?;
                i += 1;
                ((c & 0x1F) << 6) | c2
            }
            14 => {
                let c2 = continuation(bytes, i, start)?;
                let c3 = continuation(bytes, i + 1, start)?;
                i += 2;
                ((c & 0x0F) << 12) | (c2 << 6) | c3
            }
            15 if allow_four_byte && c & 0x08 == 0 => {
                let c2 = continuation(bytes, i, start)?;
                let c3 = continuation(bytes, i + 1, start)?;
                let c4 = continuation(bytes, i + 2, start)?;
                i += 3;
                ((c & 0x07) << 18) | (c2 << 12) | (c3 << 6) | c4
            }
            _ => return Err(AmfError::InvalidUtf8 { offset: start }),
        };

        match (pending_high.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let code = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (previous, _) => {
                if previous.is_some() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                match unit {
                    0xD800..=0xDBFF => pending_high = Some(unit),
                    0xDC00..=0xDFFF => out.push(char::REPLACEMENT_CHARACTER),
                    _ => out.push(
                        char::from_u32(unit).ok_or(AmfError::InvalidUtf8 { offset: start })?,
                    ),
                }
            }
        }
    }

    if pending_high.is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }

    Ok(out)
}

/// Low six bits of the continuation byte at `index`
fn continuation(bytes: &[u8], index: usize, start: usize) -> Result<u32, AmfError> {
    match bytes.get(index) {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u32),
        _ => Err(AmfError::InvalidUtf8 { offset: start }),
    }
}
