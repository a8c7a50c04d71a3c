//! Primitive byte reading
//!
//! Fixed-width big-endian integers, IEEE 754 doubles and raw byte runs.
//! Nothing here knows about AMF markers or headers.
//!
//! Any in-memory [`bytes::Buf`] is a source. Blocking streams are wrapped in
//! [`IoSource`], which pulls from a [`std::io::BufRead`] on demand.

use std::io::{BufRead, Read};

use bytes::{Buf, Bytes};

use crate::error::AmfError;

/// Pull-based source of bytes for the decoder
pub trait ByteSource {
    /// Whether at least one more byte can be read
    fn has_remaining(&mut self) -> Result<bool, AmfError>;

    /// Read a single byte
    fn read_u8(&mut self) -> Result<u8, AmfError>;

    /// Read exactly `len` bytes
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, AmfError>;

    /// Read exactly `N` bytes into an array
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], AmfError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    fn read_u16(&mut self) -> Result<u16, AmfError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, AmfError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, AmfError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_f64(&mut self) -> Result<f64, AmfError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }
}

impl<B: Buf> ByteSource for B {
    fn has_remaining(&mut self) -> Result<bool, AmfError> {
        Ok(Buf::has_remaining(self))
    }

    fn read_u8(&mut self) -> Result<u8, AmfError> {
        if !Buf::has_remaining(self) {
            return Err(AmfError::UnexpectedEof);
        }
        Ok(self.get_u8())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, AmfError> {
        if self.remaining() < len {
            return Err(AmfError::UnexpectedEof);
        }
        Ok(self.copy_to_bytes(len))
    }

    fn read_f64(&mut self) -> Result<f64, AmfError> {
        if self.remaining() < 8 {
            return Err(AmfError::UnexpectedEof);
        }
        Ok(self.get_f64())
    }
}

/// Blocking byte source over a buffered reader
///
/// The decoder blocks on a read exactly as long as the reader does; timeouts
/// and cancellation belong to the reader.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    /// Bytes consumed so far
    position: u64,
}

impl<R: BufRead> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> ByteSource for IoSource<R> {
    fn has_remaining(&mut self) -> Result<bool, AmfError> {
        Ok(!self.inner.fill_buf()?.is_empty())
    }

    fn read_u8(&mut self) -> Result<u8, AmfError> {
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        self.position += 1;
        Ok(byte[0])
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, AmfError> {
        // Grow with the data actually delivered instead of trusting the
        // declared length for the allocation.
        let mut data = Vec::with_capacity(len.min(64 * 1024));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut data)?;
        self.position += read as u64;
        if read < len {
            return Err(AmfError::UnexpectedEof);
        }
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_buf_source_reads_big_endian() {
        let mut buf = Bytes::from_static(&[
            0x01, 0x02, 0x00, 0x00, 0x01, 0x00, 0x40, 0x45, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(ByteSource::read_u16(&mut buf).unwrap(), 0x0102);
        assert_eq!(ByteSource::read_u32(&mut buf).unwrap(), 256);
        assert_eq!(ByteSource::read_f64(&mut buf).unwrap(), 42.5);
        assert!(!ByteSource::has_remaining(&mut buf).unwrap());
    }

    #[test]
    fn test_buf_source_short_input() {
        let mut buf = Bytes::from_static(&[0x01, 0x02]);
        assert!(matches!(
            ByteSource::read_u32(&mut buf),
            Err(AmfError::UnexpectedEof)
        ));

        let mut empty = Bytes::new();
        assert!(matches!(
            ByteSource::read_u8(&mut empty),
            Err(AmfError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_slice_is_a_source() {
        let data = [0xAAu8, 0xBB, 0xCC];
        let mut slice = &data[..];
        assert_eq!(ByteSource::read_u8(&mut slice).unwrap(), 0xAA);
        assert_eq!(&ByteSource::read_bytes(&mut slice, 2).unwrap()[..], &[0xBB, 0xCC]);
    }

    #[test]
    fn test_io_source() {
        let mut source = IoSource::new(Cursor::new(vec![0x7F, 0x00, 0x00, 0x00, 0x2A, 0x01]));
        assert!(source.has_remaining().unwrap());
        assert_eq!(source.read_u8().unwrap(), 0x7F);
        assert_eq!(source.read_i32().unwrap(), 42);
        assert_eq!(source.position(), 5);
        assert_eq!(&source.read_bytes(1).unwrap()[..], &[0x01]);
        assert!(!source.has_remaining().unwrap());
    }

    #[test]
    fn test_io_source_short_input() {
        let mut source = IoSource::new(Cursor::new(vec![0x01, 0x02]));
        assert!(matches!(source.read_bytes(10), Err(AmfError::UnexpectedEof)));

        let mut source = IoSource::new(Cursor::new(Vec::new()));
        assert!(matches!(source.read_u8(), Err(AmfError::UnexpectedEof)));
    }
}
