//! AMF3 decoder
//!
//! AMF3 is the ActionScript 3.0 serialization format. Compared to AMF0 it
//! adds variable-length integers and three reference tables (strings,
//! objects, class traits) so repeated values are only sent once.
//!
//! Type Markers:
//! ```text
//! 0x00 - Undefined
//! 0x01 - Null
//! 0x02 - False
//! 0x03 - True
//! 0x04 - Integer (U29, signed)
//! 0x05 - Double (IEEE 754)
//! 0x06 - String (U29 length/reference + modified UTF-8)
//! 0x07 - XML Document
//! 0x08 - Date
//! 0x09 - Array (dense + associative)
//! 0x0A - Object (traits + sealed/dynamic/externalizable body)
//! 0x0B - XML
//! 0x0C - ByteArray
//! ```
//!
//! Object header (U29, after the inline bit):
//! ```text
//! xxxxxxx0 - traits reference, index in the remaining bits
//! ccccee01 - inline traits: encoding `ee`, `cccc` sealed property count
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use bytes::Bytes;

use crate::config::DecoderConfig;
use crate::error::{AmfError, Error, TableKind};

use super::class::{
    ClassDescriptor, ClassRegistry, DocumentBuilder, Encoding, Instance, RawXml, ValueReader,
};
use super::registry::{DynamicObject, DynamicRegistry};
use super::source::{ByteSource, IoSource};
use super::tables::{ObjectTable, ReferenceTable, Slot};
use super::utf8::decode_modified_utf8;
use super::value::{Amf3Value, ArrayKey, Complex, DocumentRef, ObjectRef};
use super::vlq::{self, Header};

// AMF3 type markers
pub(crate) const MARKER_UNDEFINED: u8 = 0x00;
pub(crate) const MARKER_NULL: u8 = 0x01;
pub(crate) const MARKER_FALSE: u8 = 0x02;
pub(crate) const MARKER_TRUE: u8 = 0x03;
pub(crate) const MARKER_INTEGER: u8 = 0x04;
pub(crate) const MARKER_DOUBLE: u8 = 0x05;
pub(crate) const MARKER_STRING: u8 = 0x06;
pub(crate) const MARKER_XML_DOC: u8 = 0x07;
pub(crate) const MARKER_DATE: u8 = 0x08;
pub(crate) const MARKER_ARRAY: u8 = 0x09;
pub(crate) const MARKER_OBJECT: u8 = 0x0A;
pub(crate) const MARKER_XML: u8 = 0x0B;
pub(crate) const MARKER_BYTE_ARRAY: u8 = 0x0C;

/// Everything a decoder built up, detached from the byte source
#[derive(Debug)]
pub struct Graph<O, D> {
    pub objects: ObjectTable<O>,
    pub documents: Vec<D>,
}

impl<O, D> Graph<O, D> {
    /// Finished value behind an object reference
    pub fn get(&self, r: ObjectRef) -> Option<&Complex<O>> {
        self.objects.get(r)
    }

    pub fn document(&self, r: DocumentRef) -> Option<&D> {
        self.documents.get(r.0)
    }
}

/// AMF3 decoder
///
/// One decoder reads one stream. Its reference tables span every value
/// decoded from it and are never cleared. A decoder that returned an error is
/// in an unspecified state and must be discarded.
pub struct Amf3Decoder<S, R = DynamicRegistry, X = RawXml>
where
    R: ClassRegistry,
    X: DocumentBuilder,
{
    source: S,
    registry: R,
    document_builder: X,
    config: DecoderConfig,
    strings: ReferenceTable<Rc<str>>,
    objects: ObjectTable<R::Object>,
    traits: ReferenceTable<Rc<R::Descriptor>>,
    documents: Vec<X::Document>,
    empty: Rc<str>,
    /// Current nesting depth
    depth: usize,
}

impl<S: ByteSource> Amf3Decoder<S> {
    /// Create a decoder with the default registry and settings
    pub fn new(source: S) -> Self {
        Self::build(source, DynamicRegistry::new(), RawXml, DecoderConfig::default())
    }

    /// Create a decoder with the default registry and explicit settings
    pub fn with_config(source: S, config: DecoderConfig) -> Result<Self, Error> {
        Self::with_parts(source, DynamicRegistry::new(), RawXml, config)
    }
}

impl<S: ByteSource, R: ClassRegistry> Amf3Decoder<S, R> {
    /// Create a decoder that builds objects through `registry`
    pub fn with_registry(source: S, registry: R) -> Self {
        Self::build(source, registry, RawXml, DecoderConfig::default())
    }
}

impl<S, R, X> Amf3Decoder<S, R, X>
where
    S: ByteSource,
    R: ClassRegistry,
    X: DocumentBuilder,
{
    /// Create a decoder from all of its collaborators
    pub fn with_parts(
        source: S,
        registry: R,
        document_builder: X,
        config: DecoderConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(source, registry, document_builder, config))
    }

    fn build(source: S, registry: R, document_builder: X, config: DecoderConfig) -> Self {
        let max = config.max_table_len;
        Self {
            source,
            registry,
            document_builder,
            strings: ReferenceTable::new(TableKind::String, max),
            objects: ObjectTable::new(max),
            traits: ReferenceTable::new(TableKind::Traits, max),
            documents: Vec::new(),
            empty: Rc::from(""),
            depth: 0,
            config,
        }
    }

    /// Decode the next top-level value
    pub fn decode(&mut self) -> Result<Amf3Value, AmfError> {
        let marker = self.source.read_u8()?;
        self.decode_value(marker)
    }

    /// Decode values until the source is exhausted
    pub fn decode_all(&mut self) -> Result<Vec<Amf3Value>, AmfError> {
        let mut values = Vec::new();
        while self.source.has_remaining()? {
            values.push(self.decode()?);
        }
        Ok(values)
    }

    /// Whether the source has more bytes
    pub fn has_remaining(&mut self) -> Result<bool, AmfError> {
        self.source.has_remaining()
    }

    pub fn objects(&self) -> &ObjectTable<R::Object> {
        &self.objects
    }

    /// Finished value behind an object reference
    pub fn object(&self, r: ObjectRef) -> Option<&Complex<R::Object>> {
        self.objects.get(r)
    }

    pub fn document(&self, r: DocumentRef) -> Option<&X::Document> {
        self.documents.get(r.0)
    }

    pub fn strings(&self) -> &ReferenceTable<Rc<str>> {
        &self.strings
    }

    /// Number of class traits defined so far
    pub fn traits_count(&self) -> usize {
        self.traits.len()
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Give up the byte source and keep the decoded graph
    pub fn into_parts(self) -> (S, Graph<R::Object, X::Document>) {
        (
            self.source,
            Graph {
                objects: self.objects,
                documents: self.documents,
            },
        )
    }

    fn decode_value(&mut self, marker: u8) -> Result<Amf3Value, AmfError> {
        self.depth += 1;
        if self.depth > self.config.max_nesting_depth {
            self.depth -= 1;
            return Err(AmfError::NestingTooDeep);
        }
        tracing::trace!(marker, depth = self.depth, "Decoding AMF3 value");
        let result = self.decode_marker(marker);
        self.depth -= 1;
        result
    }

    fn decode_marker(&mut self, marker: u8) -> Result<Amf3Value, AmfError> {
        match marker {
            MARKER_UNDEFINED | MARKER_NULL => Ok(Amf3Value::Null),
            MARKER_FALSE => Ok(Amf3Value::Boolean(false)),
            MARKER_TRUE => Ok(Amf3Value::Boolean(true)),
            MARKER_INTEGER => Ok(Amf3Value::Integer(vlq::read_i29(&mut self.source)?)),
            MARKER_DOUBLE => self.decode_double(),
            MARKER_STRING => Ok(Amf3Value::String(self.decode_string()?)),
            MARKER_XML_DOC => self.decode_xml_document(),
            MARKER_DATE => self.decode_date(),
            MARKER_ARRAY => self.decode_array(),
            MARKER_OBJECT => self.decode_object(),
            MARKER_XML => Ok(Amf3Value::XmlString(self.decode_xml_text()?)),
            MARKER_BYTE_ARRAY => self.decode_byte_array(),
            _ => Err(AmfError::UnknownMarker(marker)),
        }
    }

    fn decode_nested(&mut self) -> Result<Amf3Value, AmfError> {
        let marker = self.source.read_u8()?;
        self.decode_value(marker)
    }

    fn decode_double(&mut self) -> Result<Amf3Value, AmfError> {
        let n = self.source.read_f64()?;
        if n.is_nan() && self.config.nan_as_null {
            return Ok(Amf3Value::Null);
        }
        Ok(Amf3Value::Number(n))
    }

    /// String body: reference or inline modified UTF-8
    fn decode_string(&mut self) -> Result<Rc<str>, AmfError> {
        match Header::read(&mut self.source)? {
            Header::Reference(index) => Ok(self.strings.get(index)?.clone()),
            // Empty strings are never sent by reference, so never stored
            Header::Inline(0) => Ok(self.empty.clone()),
            Header::Inline(len) => {
                let bytes = self.source.read_bytes(len as usize)?;
                let s: Rc<str> =
                    Rc::from(decode_modified_utf8(&bytes, self.config.allow_four_byte_utf8)?);
                let index = self.strings.push(s.clone())?;
                tracing::trace!(index, len, "Stored string");
                Ok(s)
            }
        }
    }

    /// XML body: reference or inline UTF-8, stored in the string table
    fn decode_xml_text(&mut self) -> Result<Rc<str>, AmfError> {
        match Header::read(&mut self.source)? {
            Header::Reference(index) => Ok(self.strings.get(index)?.clone()),
            Header::Inline(len) => {
                let bytes = self.source.read_bytes(len as usize)?;
                let s: Rc<str> = Rc::from(String::from_utf8_lossy(&bytes));
                let index = self.strings.push(s.clone())?;
                tracing::trace!(index, len, "Stored XML text");
                Ok(s)
            }
        }
    }

    fn decode_xml_document(&mut self) -> Result<Amf3Value, AmfError> {
        let xml = self.decode_xml_text()?;
        let document = self
            .document_builder
            .build_document(&xml)
            .map_err(AmfError::Document)?;
        self.documents.push(document);
        Ok(Amf3Value::Xml(DocumentRef(self.documents.len() - 1)))
    }

    fn decode_date(&mut self) -> Result<Amf3Value, AmfError> {
        match Header::read(&mut self.source)? {
            Header::Reference(index) => {
                let r = self.typed_reference(index, |v| matches!(v, Complex::Date(_)))?;
                Ok(Amf3Value::Object(r))
            }
            Header::Inline(_) => {
                let millis = self.source.read_f64()?;
                let r = self.objects.insert(Complex::Date(millis))?;
                tracing::trace!(index = r.index(), millis, "Stored date");
                Ok(Amf3Value::Object(r))
            }
        }
    }

    fn decode_byte_array(&mut self) -> Result<Amf3Value, AmfError> {
        match Header::read(&mut self.source)? {
            Header::Reference(index) => {
                let r = self.typed_reference(index, |v| matches!(v, Complex::ByteArray(_)))?;
                Ok(Amf3Value::Object(r))
            }
            Header::Inline(len) => {
                let data = self.source.read_bytes(len as usize)?;
                let r = self.objects.insert(Complex::ByteArray(data))?;
                tracing::trace!(index = r.index(), len, "Stored byte array");
                Ok(Amf3Value::Object(r))
            }
        }
    }

    fn decode_array(&mut self) -> Result<Amf3Value, AmfError> {
        let dense_len = match Header::read(&mut self.source)? {
            Header::Reference(index) => return Ok(Amf3Value::Object(self.objects.reference(index)?)),
            Header::Inline(len) => len,
        };

        let mut key = self.decode_string()?;
        let r = self.objects.reserve()?;
        tracing::trace!(index = r.index(), dense_len, "Registered array");

        let value = if key.is_empty() {
            let mut items = Vec::with_capacity((dense_len as usize).min(1024)); // Cap initial allocation
            for _ in 0..dense_len {
                items.push(self.decode_nested()?);
            }
            Complex::Array(items)
        } else {
            let mut map = HashMap::new();
            while !key.is_empty() {
                let value = self.decode_nested()?;
                map.insert(ArrayKey::Name(key), value);
                key = self.decode_string()?;
            }
            for i in 0..dense_len {
                let value = self.decode_nested()?;
                map.insert(ArrayKey::Index(i), value);
            }
            Complex::AssocArray(map)
        };

        self.objects.finalize(r, value);
        Ok(Amf3Value::Object(r))
    }

    fn decode_object(&mut self) -> Result<Amf3Value, AmfError> {
        let flags = match Header::read(&mut self.source)? {
            Header::Reference(index) => return Ok(Amf3Value::Object(self.objects.reference(index)?)),
            Header::Inline(flags) => flags,
        };

        let descriptor = if flags & 0x01 != 0 {
            self.decode_traits(flags)?
        } else {
            self.traits.get((flags >> 1) as usize)?.clone()
        };

        // The externalizer creates the instance whatever the body encoding
        let externalizer = descriptor.externalizer();
        let mut instance = match &externalizer {
            Some(ext) => ext.construct(descriptor.class_name(), self),
            None => descriptor.new_instance(),
        }
        .map_err(|source| AmfError::Instantiation {
            class_name: descriptor.class_name().to_string(),
            source,
        })?;

        // Registered before the body so nested values can refer back to it
        let r = self.objects.reserve()?;
        tracing::trace!(
            index = r.index(),
            class_name = descriptor.class_name(),
            "Registered object"
        );

        match descriptor.encoding() {
            Encoding::Externalizable => {
                let result = match &externalizer {
                    Some(ext) => {
                        tracing::debug!(
                            class_name = descriptor.class_name(),
                            "Reading object with externalizer"
                        );
                        ext.read_content(&mut instance, self)
                    }
                    None => descriptor.read_external(&mut instance, self),
                };
                result.map_err(|e| e.into_amf(descriptor.class_name()))?;
            }
            encoding => {
                for index in 0..descriptor.property_count() {
                    let value = self.decode_nested()?;
                    set_sealed(&*descriptor, &mut instance, index, value)?;
                }
                if encoding == Encoding::Dynamic {
                    loop {
                        let name = self.decode_string()?;
                        if name.is_empty() {
                            break;
                        }
                        let value = self.decode_nested()?;
                        set_dynamic(&*descriptor, &mut instance, name, value)?;
                    }
                }
            }
        }

        let object = match instance {
            Instance::Ready(object) => object,
            Instance::Deferred(placeholder) => {
                tracing::trace!(index = r.index(), "Resolving deferred object");
                placeholder.resolve().map_err(|source| AmfError::Resolve {
                    class_name: descriptor.class_name().to_string(),
                    source,
                })?
            }
        };
        self.objects.finalize(r, Complex::Object(object));
        Ok(Amf3Value::Object(r))
    }

    /// Inline traits: class name and sealed property names
    fn decode_traits(&mut self, flags: u32) -> Result<Rc<R::Descriptor>, AmfError> {
        let encoding = Encoding::from_bits((flags >> 1) & 0x03);
        let property_count = flags >> 3;
        let class_name = self.decode_string()?;

        let mut descriptor = self.registry.descriptor(class_name, encoding);
        for _ in 0..property_count {
            let name = self.decode_string()?;
            descriptor.define_property(name);
        }

        let descriptor = Rc::new(descriptor);
        let index = self.traits.push(descriptor.clone())?;
        tracing::debug!(
            index,
            class_name = descriptor.class_name(),
            encoding = ?encoding,
            property_count,
            "Defined class traits"
        );
        Ok(descriptor)
    }

    /// Back-reference that must point at a finished value of a given kind
    fn typed_reference(
        &self,
        index: usize,
        expected: fn(&Complex<R::Object>) -> bool,
    ) -> Result<ObjectRef, AmfError> {
        match self.objects.slot(index)? {
            Slot::Finalized(value) if expected(value) => self.objects.reference(index),
            _ => Err(AmfError::InvalidReference {
                table: TableKind::Object,
                index,
            }),
        }
    }
}

fn set_sealed<D: ClassDescriptor>(
    descriptor: &D,
    instance: &mut Instance<D::Object>,
    index: usize,
    value: Amf3Value,
) -> Result<(), AmfError> {
    let result = match instance {
        Instance::Ready(object) => descriptor.set_property(object, index, value),
        Instance::Deferred(placeholder) => match descriptor.property_name(index) {
            Some(name) => placeholder.set_property(name, value),
            None => Err(format!("no sealed property at position {}", index).into()),
        },
    };
    result.map_err(|source| AmfError::Property {
        class_name: descriptor.class_name().to_string(),
        property: descriptor.property_name(index).unwrap_or_default().to_string(),
        source,
    })
}

fn set_dynamic<D: ClassDescriptor>(
    descriptor: &D,
    instance: &mut Instance<D::Object>,
    name: Rc<str>,
    value: Amf3Value,
) -> Result<(), AmfError> {
    let result = match instance {
        Instance::Ready(object) => descriptor.set_dynamic_property(object, name.clone(), value),
        Instance::Deferred(placeholder) => placeholder.set_property(&name, value),
    };
    result.map_err(|source| AmfError::Property {
        class_name: descriptor.class_name().to_string(),
        property: name.to_string(),
        source,
    })
}

impl<S, R, X> ValueReader for Amf3Decoder<S, R, X>
where
    S: ByteSource,
    R: ClassRegistry,
    X: DocumentBuilder,
{
    fn read_value(&mut self) -> Result<Amf3Value, AmfError> {
        self.decode_nested()
    }

    fn read_u8(&mut self) -> Result<u8, AmfError> {
        self.source.read_u8()
    }

    fn read_u16(&mut self) -> Result<u16, AmfError> {
        self.source.read_u16()
    }

    fn read_u32(&mut self) -> Result<u32, AmfError> {
        self.source.read_u32()
    }

    fn read_i32(&mut self) -> Result<i32, AmfError> {
        self.source.read_i32()
    }

    fn read_f64(&mut self) -> Result<f64, AmfError> {
        self.source.read_f64()
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, AmfError> {
        self.source.read_bytes(len)
    }

    fn read_u29(&mut self) -> Result<u32, AmfError> {
        vlq::read_u29(&mut self.source)
    }

    fn read_i29(&mut self) -> Result<i32, AmfError> {
        vlq::read_i29(&mut self.source)
    }

    fn read_string(&mut self) -> Result<Rc<str>, AmfError> {
        self.decode_string()
    }

    fn read_utf(&mut self) -> Result<String, AmfError> {
        let len = self.source.read_u16()? as usize;
        let bytes = self.source.read_bytes(len)?;
        decode_modified_utf8(&bytes, self.config.allow_four_byte_utf8)
    }
}

/// Decoded values plus the default graph they refer into
pub type DynamicGraph = Graph<DynamicObject, Rc<str>>;

/// Convenience function to decode a single value
pub fn decode(data: &[u8]) -> Result<(Amf3Value, DynamicGraph), AmfError> {
    let mut decoder = Amf3Decoder::new(Bytes::copy_from_slice(data));
    let value = decoder.decode()?;
    let (_, graph) = decoder.into_parts();
    Ok((value, graph))
}

/// Convenience function to decode all values
pub fn decode_all(data: &[u8]) -> Result<(Vec<Amf3Value>, DynamicGraph), AmfError> {
    let mut decoder = Amf3Decoder::new(Bytes::copy_from_slice(data));
    let values = decoder.decode_all()?;
    let (_, graph) = decoder.into_parts();
    Ok((values, graph))
}

/// Convenience function to decode every value from a blocking reader
pub fn decode_reader<T: std::io::BufRead>(
    reader: T,
) -> Result<(Vec<Amf3Value>, DynamicGraph), AmfError> {
    let mut decoder = Amf3Decoder::new(IoSource::new(reader));
    let values = decoder.decode_all()?;
    let (_, graph) = decoder.into_parts();
    Ok((values, graph))
}
