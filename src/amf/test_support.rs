//! Test-only AMF3 byte builder
//!
//! Produces wire fixtures without going through a full encoder. Each method
//! writes exactly what its name says; tables and references are the caller's
//! responsibility.

use bytes::{BufMut, Bytes, BytesMut};

use super::amf3::{
    MARKER_ARRAY, MARKER_BYTE_ARRAY, MARKER_DATE, MARKER_DOUBLE, MARKER_FALSE, MARKER_INTEGER,
    MARKER_NULL, MARKER_OBJECT, MARKER_STRING, MARKER_TRUE, MARKER_UNDEFINED, MARKER_XML,
    MARKER_XML_DOC,
};
use super::class::Encoding;

/// Write an unsigned 29-bit value
pub(crate) fn write_u29(buf: &mut BytesMut, value: u32) {
    let value = value & 0x1FFF_FFFF;
    if value < 0x80 {
        buf.put_u8(value as u8);
    } else if value < 0x4000 {
        buf.put_u8(((value >> 7) | 0x80) as u8);
        buf.put_u8((value & 0x7F) as u8);
    } else if value < 0x20_0000 {
        buf.put_u8(((value >> 14) | 0x80) as u8);
        buf.put_u8(((value >> 7) & 0x7F | 0x80) as u8);
        buf.put_u8((value & 0x7F) as u8);
    } else {
        buf.put_u8(((value >> 22) | 0x80) as u8);
        buf.put_u8(((value >> 15) & 0x7F | 0x80) as u8);
        buf.put_u8(((value >> 8) & 0x7F | 0x80) as u8);
        buf.put_u8((value & 0xFF) as u8);
    }
}

/// Builder for AMF3 wire fixtures
pub(crate) struct Amf3Writer {
    buf: BytesMut,
}

impl Amf3Writer {
    pub(crate) fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    pub(crate) fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    pub(crate) fn u29(mut self, value: u32) -> Self {
        write_u29(&mut self.buf, value);
        self
    }

    pub(crate) fn undefined(self) -> Self {
        self.raw(&[MARKER_UNDEFINED])
    }

    pub(crate) fn null(self) -> Self {
        self.raw(&[MARKER_NULL])
    }

    pub(crate) fn boolean(self, value: bool) -> Self {
        self.raw(&[if value { MARKER_TRUE } else { MARKER_FALSE }])
    }

    pub(crate) fn integer(self, value: i32) -> Self {
        self.raw(&[MARKER_INTEGER]).u29(value as u32)
    }

    pub(crate) fn double(mut self, value: f64) -> Self {
        self.buf.put_u8(MARKER_DOUBLE);
        self.buf.put_f64(value);
        self
    }

    /// Inline string body, no marker
    pub(crate) fn str_body(self, value: &str) -> Self {
        self.u29(((value.len() as u32) << 1) | 1).raw(value.as_bytes())
    }

    /// String back-reference body, no marker
    pub(crate) fn str_ref(self, index: u32) -> Self {
        self.u29(index << 1)
    }

    pub(crate) fn string(self, value: &str) -> Self {
        self.raw(&[MARKER_STRING]).str_body(value)
    }

    pub(crate) fn string_ref(self, index: u32) -> Self {
        self.raw(&[MARKER_STRING]).str_ref(index)
    }

    pub(crate) fn xml_doc(self, value: &str) -> Self {
        self.raw(&[MARKER_XML_DOC]).str_body(value)
    }

    pub(crate) fn xml(self, value: &str) -> Self {
        self.raw(&[MARKER_XML]).str_body(value)
    }

    pub(crate) fn date(mut self, millis: f64) -> Self {
        self.buf.put_u8(MARKER_DATE);
        write_u29(&mut self.buf, 1);
        self.buf.put_f64(millis);
        self
    }

    pub(crate) fn byte_array(self, data: &[u8]) -> Self {
        self.raw(&[MARKER_BYTE_ARRAY])
            .u29(((data.len() as u32) << 1) | 1)
            .raw(data)
    }

    /// Header of an inline array; caller writes associative pairs, the empty
    /// key terminator and the dense elements
    pub(crate) fn array_header(self, dense_len: u32) -> Self {
        self.raw(&[MARKER_ARRAY]).u29((dense_len << 1) | 1)
    }

    /// Empty string key terminating associative/dynamic sections
    pub(crate) fn end_of_keys(self) -> Self {
        self.u29(0x01)
    }

    /// Marker plus back-reference for any object-table value
    pub(crate) fn object_ref(self, marker: u8, index: u32) -> Self {
        self.raw(&[marker]).u29(index << 1)
    }

    /// Header of an inline object with inline traits; caller writes the class
    /// name and property names next
    pub(crate) fn object_traits_header(self, encoding: Encoding, sealed_count: u32) -> Self {
        let header = (sealed_count << 4) | ((encoding as u32) << 2) | 0b11;
        self.raw(&[MARKER_OBJECT]).u29(header)
    }

    /// Header of an inline object whose traits are a back-reference
    pub(crate) fn object_traits_ref(self, traits_index: u32) -> Self {
        self.raw(&[MARKER_OBJECT]).u29((traits_index << 2) | 0b01)
    }
}
