//! Host collaborator contracts
//!
//! The decoder never knows the host type system. It asks a [`ClassRegistry`]
//! for a [`ClassDescriptor`] per wire class, and the descriptor creates and
//! populates instances. Externalizable classes hand their body to an
//! [`Externalizer`], which reads through the [`ValueReader`] view of the
//! decoder. Typed XML goes to a [`DocumentBuilder`].

use std::rc::Rc;

use bytes::Bytes;

use crate::error::{AmfError, BoxError, ContentError};

use super::value::Amf3Value;

/// Object body encoding, bits 2-3 of an inline traits header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Sealed properties only
    Sealed = 0,
    /// Body is read entirely by an externalizer
    Externalizable = 1,
    /// Sealed properties followed by name/value pairs
    Dynamic = 2,
}

impl Encoding {
    /// Interpret the two encoding bits; the externalizable bit wins
    pub fn from_bits(bits: u32) -> Self {
        if bits & 0x01 != 0 {
            Encoding::Externalizable
        } else if bits & 0x03 == 0x02 {
            Encoding::Dynamic
        } else {
            Encoding::Sealed
        }
    }
}

/// Freshly created object, before its body has been decoded
pub enum Instance<O> {
    /// Populated in place; becomes the final value as-is
    Ready(O),
    /// Placeholder that gathers properties and produces the value afterwards
    Deferred(Box<dyn Deferred<O>>),
}

impl<O: std::fmt::Debug> std::fmt::Debug for Instance<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instance::Ready(o) => f.debug_tuple("Ready").field(o).finish(),
            Instance::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Two-phase construction for values that cannot exist until every property
/// is known
pub trait Deferred<O> {
    /// Record a property value
    fn set_property(&mut self, name: &str, value: Amf3Value) -> Result<(), BoxError>;

    /// Produce the final value once the object body has been read
    fn resolve(self: Box<Self>) -> Result<O, BoxError>;
}

/// Maps wire class names to descriptors
pub trait ClassRegistry {
    /// Host representation of a decoded object
    type Object;
    type Descriptor: ClassDescriptor<Object = Self::Object>;

    /// Create an empty descriptor for an inline traits definition
    fn descriptor(&mut self, class_name: Rc<str>, encoding: Encoding) -> Self::Descriptor;
}

/// Property layout and instantiation strategy for one wire class
pub trait ClassDescriptor {
    type Object;

    /// Wire class name, empty for anonymous objects
    fn class_name(&self) -> &str;

    fn encoding(&self) -> Encoding;

    /// Append a sealed property name, in wire order
    fn define_property(&mut self, name: Rc<str>);

    fn property_count(&self) -> usize;

    fn property_name(&self, index: usize) -> Option<&str>;

    /// Externalizer that takes over instantiation and body decoding
    fn externalizer(&self) -> Option<Rc<dyn Externalizer<Self::Object>>> {
        None
    }

    /// Create an unpopulated instance
    fn new_instance(&self) -> Result<Instance<Self::Object>, BoxError>;

    /// Assign the sealed property at `index`
    fn set_property(
        &self,
        instance: &mut Self::Object,
        index: usize,
        value: Amf3Value,
    ) -> Result<(), BoxError>;

    /// Assign a dynamic property by name
    fn set_dynamic_property(
        &self,
        instance: &mut Self::Object,
        name: Rc<str>,
        value: Amf3Value,
    ) -> Result<(), BoxError>;

    /// Externalizable body with no externalizer: the instance reads itself
    fn read_external(
        &self,
        _instance: &mut Instance<Self::Object>,
        _input: &mut dyn ValueReader,
    ) -> Result<(), ContentError> {
        Err(ContentError::Decode(AmfError::NotExternalizable {
            class_name: self.class_name().to_string(),
        }))
    }
}

/// Reads an externalizable object's body on its own terms
pub trait Externalizer<O> {
    /// Create the instance; may read from the stream
    fn construct(
        &self,
        class_name: &str,
        input: &mut dyn ValueReader,
    ) -> Result<Instance<O>, BoxError>;

    /// Read the object's content
    fn read_content(
        &self,
        instance: &mut Instance<O>,
        input: &mut dyn ValueReader,
    ) -> Result<(), ContentError>;
}

/// Delegated access to the decoder for externalizers
///
/// Values read here go through the same reference tables as the rest of the
/// stream.
pub trait ValueReader {
    /// Read a marker and the value it introduces
    fn read_value(&mut self) -> Result<Amf3Value, AmfError>;

    fn read_u8(&mut self) -> Result<u8, AmfError>;

    fn read_u16(&mut self) -> Result<u16, AmfError>;

    fn read_u32(&mut self) -> Result<u32, AmfError>;

    fn read_i32(&mut self) -> Result<i32, AmfError>;

    fn read_f64(&mut self) -> Result<f64, AmfError>;

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, AmfError>;

    /// Unsigned variable-length 29-bit integer
    fn read_u29(&mut self) -> Result<u32, AmfError>;

    /// Signed variable-length 29-bit integer
    fn read_i29(&mut self) -> Result<i32, AmfError>;

    /// AMF3 string body (reference or inline), without a marker
    fn read_string(&mut self) -> Result<Rc<str>, AmfError>;

    /// `DataInput`-style string: 16-bit length then modified UTF-8
    fn read_utf(&mut self) -> Result<String, AmfError>;
}

/// Builds a document from typed XML text
pub trait DocumentBuilder {
    type Document;

    fn build_document(&mut self, xml: &str) -> Result<Self::Document, BoxError>;
}

/// Document builder that keeps the XML text as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct RawXml;

impl DocumentBuilder for RawXml {
    type Document = Rc<str>;

    fn build_document(&mut self, xml: &str) -> Result<Self::Document, BoxError> {
        Ok(Rc::from(xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_bits() {
        assert_eq!(Encoding::from_bits(0), Encoding::Sealed);
        assert_eq!(Encoding::from_bits(1), Encoding::Externalizable);
        assert_eq!(Encoding::from_bits(2), Encoding::Dynamic);
        assert_eq!(Encoding::from_bits(3), Encoding::Externalizable);
    }

    #[test]
    fn test_raw_xml_builder() {
        let mut builder = RawXml;
        let doc = builder.build_document("<a/>").unwrap();
        assert_eq!(&*doc, "<a/>");
    }
}
