//! AMF3 variable-length 29-bit integers
//!
//! ```text
//! 0x00000000 - 0x0000007F : 0xxxxxxx
//! 0x00000080 - 0x00003FFF : 1xxxxxxx 0xxxxxxx
//! 0x00004000 - 0x001FFFFF : 1xxxxxxx 1xxxxxxx 0xxxxxxx
//! 0x00200000 - 0x1FFFFFFF : 1xxxxxxx 1xxxxxxx 1xxxxxxx xxxxxxxx
//! ```
//!
//! The fourth byte, when present, carries a full 8 bits. The integer marker
//! treats the result as signed (bit 28 is the sign); every other use reads it
//! as an unsigned header.

use crate::error::AmfError;

use super::source::ByteSource;

/// Largest value representable by the signed form
pub const I29_MAX: i32 = (1 << 28) - 1;

/// Smallest value representable by the signed form
pub const I29_MIN: i32 = -(1 << 28);

/// Largest value representable by the unsigned form
pub const U29_MAX: u32 = (1 << 29) - 1;

/// Read an unsigned 29-bit value
pub fn read_u29<S: ByteSource + ?Sized>(src: &mut S) -> Result<u32, AmfError> {
    let mut result: u32 = 0;
    let mut n = 0;
    let mut b = src.read_u8()?;
    while b & 0x80 != 0 && n < 3 {
        result = (result << 7) | (b & 0x7F) as u32;
        b = src.read_u8()?;
        n += 1;
    }
    if n < 3 {
        result = (result << 7) | b as u32;
    } else {
        result = (result << 8) | b as u32;
    }
    Ok(result)
}

/// Read a signed 29-bit value
pub fn read_i29<S: ByteSource + ?Sized>(src: &mut S) -> Result<i32, AmfError> {
    Ok(sign_extend(read_u29(src)?))
}

/// Sign-extend bit 28 of a raw 29-bit value
///
/// Values below 2^21 (three bytes or fewer) never have bit 28 set, so this is
/// only observable for four-byte encodings.
pub fn sign_extend(raw: u32) -> i32 {
    ((raw << 3) as i32) >> 3
}

/// Decoded reference-or-inline header
///
/// Every complex AMF3 value starts with a U29 whose low bit selects between a
/// back-reference into a table and an inline value carrying 28 bits of
/// metadata (length, count or flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Index into the relevant reference table
    Reference(usize),
    /// Inline value follows; payload is the header shifted right by one
    Inline(u32),
}

impl Header {
    pub fn from_u29(raw: u32) -> Self {
        if raw & 0x01 == 0 {
            Header::Reference((raw >> 1) as usize)
        } else {
            Header::Inline(raw >> 1)
        }
    }

    pub fn read<S: ByteSource + ?Sized>(src: &mut S) -> Result<Self, AmfError> {
        Ok(Self::from_u29(read_u29(src)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::test_support::write_u29;
    use bytes::{Bytes, BytesMut};

    fn decode_i29(value: i32) -> i32 {
        let mut buf = BytesMut::new();
        write_u29(&mut buf, (value as u32) & U29_MAX);
        let mut bytes = buf.freeze();
        let decoded = read_i29(&mut bytes).unwrap();
        assert!(bytes.is_empty());
        decoded
    }

    #[test]
    fn test_single_byte() {
        let mut buf = Bytes::from_static(&[0x00]);
        assert_eq!(read_u29(&mut buf).unwrap(), 0);
        let mut buf = Bytes::from_static(&[0x7F]);
        assert_eq!(read_u29(&mut buf).unwrap(), 127);
    }

    #[test]
    fn test_multi_byte() {
        let mut buf = Bytes::from_static(&[0x81, 0x00]);
        assert_eq!(read_u29(&mut buf).unwrap(), 128);
        let mut buf = Bytes::from_static(&[0xFF, 0x7F]);
        assert_eq!(read_u29(&mut buf).unwrap(), 0x3FFF);
        let mut buf = Bytes::from_static(&[0x81, 0x80, 0x00]);
        assert_eq!(read_u29(&mut buf).unwrap(), 0x4000);
        let mut buf = Bytes::from_static(&[0x80, 0xC0, 0x80, 0x00]);
        assert_eq!(read_u29(&mut buf).unwrap(), 0x0020_0000);
    }

    #[test]
    fn test_four_byte_sign_extension() {
        // Bit 28 set: negative
        let mut buf = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(read_i29(&mut buf).unwrap(), -1);
        let mut buf = Bytes::from_static(&[0xC0, 0x80, 0x80, 0x00]);
        assert_eq!(read_i29(&mut buf).unwrap(), I29_MIN);

        // Bit 28 clear: positive
        let mut buf = Bytes::from_static(&[0xBF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(read_i29(&mut buf).unwrap(), I29_MAX);
    }

    #[test]
    fn test_fourth_byte_uses_all_bits() {
        // The high bit of the fourth byte is data, not a continuation flag
        let mut buf = Bytes::from_static(&[0x80, 0x80, 0x80, 0xFF, 0x01]);
        assert_eq!(read_u29(&mut buf).unwrap(), 0xFF);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_signed_roundtrip_across_range() {
        let boundaries = [
            0,
            1,
            -1,
            63,
            64,
            127,
            128,
            0x3FFF,
            0x4000,
            0x1F_FFFF,
            0x20_0000,
            -0x20_0000,
            I29_MAX,
            I29_MIN,
            I29_MIN + 1,
        ];
        for value in boundaries {
            assert_eq!(decode_i29(value), value, "value {}", value);
        }

        // Sweep the whole range with a coprime stride
        let mut value = I29_MIN as i64;
        while value <= I29_MAX as i64 {
            assert_eq!(decode_i29(value as i32), value as i32);
            value += 7919;
        }
    }

    #[test]
    fn test_truncated_input() {
        let mut buf = Bytes::from_static(&[0x81, 0x80]);
        assert!(matches!(read_u29(&mut buf), Err(AmfError::UnexpectedEof)));
    }

    #[test]
    fn test_header() {
        assert_eq!(Header::from_u29(0b1010), Header::Reference(5));
        assert_eq!(Header::from_u29(0b1011), Header::Inline(5));
        assert_eq!(Header::from_u29(0x01), Header::Inline(0));

        let mut buf = Bytes::from_static(&[0x0D]);
        assert_eq!(Header::read(&mut buf).unwrap(), Header::Inline(6));
    }
}
